use crate::core::{
    DocumentContext, DocumentSource, NamePrompt, Notification, Notifier, PromptRequest,
    PublishReport, PublishRequest, PublishTarget, Severity, WorkflowTransport, TOAST_LIFE_MS,
};

/// When to show a toast after a write attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// Any HTTP response counts as saved; failures are only logged.
    #[default]
    SuccessOnResponse,
    /// Non-2xx responses and transport failures produce an error toast.
    ReportFailures,
}

pub struct EndpointPublisher<P, D, T, N> {
    prompt: P,
    source: D,
    transport: T,
    notifier: N,
    target: PublishTarget,
    api_prefix: String,
    policy: NotifyPolicy,
}

impl<P, D, T, N> EndpointPublisher<P, D, T, N>
where
    P: NamePrompt,
    D: DocumentSource,
    T: WorkflowTransport,
    N: Notifier,
{
    pub fn new(prompt: P, source: D, transport: T, notifier: N, target: PublishTarget) -> Self {
        Self {
            prompt,
            source,
            transport,
            notifier,
            target,
            api_prefix: "/api".to_string(),
            policy: NotifyPolicy::default(),
        }
    }

    /// Prefix shown in the saved endpoint path of the toast.
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_policy(mut self, policy: NotifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    /// Runs one publish. Nothing escapes: failures come back as a report.
    pub async fn publish(&self, context: &mut DocumentContext) -> PublishReport {
        let request = PromptRequest {
            title: "Endpoint Name".to_string(),
            message: "Type the endpoint name".to_string(),
            default_value: context.default_name().to_string(),
        };

        let name = match self.prompt.prompt(&request).await {
            Some(name) if !name.is_empty() => name,
            _ => {
                tracing::debug!("Endpoint name prompt cancelled");
                return PublishReport::Cancelled;
            }
        };

        context.endpoint_name = Some(name.clone());

        let workflow = match self.source.serialize().await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!("Failed to serialize document for '{}': {}", name, e);
                self.notify_failure(&name, &e.to_string());
                return PublishReport::Failed {
                    name,
                    reason: e.to_string(),
                };
            }
        };

        let body = PublishRequest {
            name: name.clone(),
            workflow,
        };

        tracing::info!(
            "{} {} - saving endpoint '{}'",
            self.target.method,
            self.target.path,
            name
        );

        match self.transport.write(&self.target, &body).await {
            Ok(response) => {
                tracing::debug!(
                    "Publish response: status={} body={}",
                    response.status,
                    response.body
                );
                if !response.is_success() {
                    tracing::warn!(
                        "Server answered {} while saving '{}'",
                        response.status,
                        name
                    );
                }

                if response.is_success() || self.policy == NotifyPolicy::SuccessOnResponse {
                    self.notifier.notify(&self.saved_notification(&name));
                } else {
                    self.notify_failure(&name, &format!("HTTP status {}", response.status));
                }

                PublishReport::Published {
                    name,
                    status: response.status,
                }
            }
            Err(e) => {
                tracing::error!("Error: {}", e);
                self.notify_failure(&name, &e.user_friendly_message());
                PublishReport::Failed {
                    name,
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn endpoint_path(&self, name: &str) -> String {
        format!("{}{}/{}", self.api_prefix, self.target.path, name)
    }

    fn saved_notification(&self, name: &str) -> Notification {
        Notification {
            severity: Severity::Success,
            summary: "API Endpoint Saved".to_string(),
            detail: format!(
                "The endpoint \"{}\" has been saved.",
                self.endpoint_path(name)
            ),
            life_ms: TOAST_LIFE_MS,
        }
    }

    fn notify_failure(&self, name: &str, reason: &str) {
        if self.policy != NotifyPolicy::ReportFailures {
            return;
        }
        self.notifier.notify(&Notification {
            severity: Severity::Error,
            summary: "API Endpoint Not Saved".to_string(),
            detail: format!(
                "The endpoint \"{}\" could not be saved: {}",
                self.endpoint_path(name),
                reason
            ),
            life_ms: TOAST_LIFE_MS,
        });
    }
}
