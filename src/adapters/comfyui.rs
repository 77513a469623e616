use crate::core::{NodeImages, PromptRunner};
use crate::utils::error::{ConnectError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

/// HTTP client for one ComfyUI instance.
#[derive(Debug, Clone)]
pub struct ComfyUiClient {
    client: Client,
    base_url: String,
    client_id: String,
    token: Option<String>,
    poll_interval: Duration,
}

impl ComfyUiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: uuid::Uuid::new_v4().to_string(),
            token: None,
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match token.or(self.token.as_deref()) {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    pub async fn queue_prompt(&self, prompt: &Value, token: Option<&str>) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&json!({"prompt": prompt, "client_id": self.client_id}));
        let response = self.authorize(request, token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectError::ComfyUiError {
                message: format!("prompt rejected with status {}: {}", status, body),
            });
        }

        let queued: QueueResponse = response.json().await?;
        tracing::debug!("Queued prompt {}", queued.prompt_id);
        Ok(queued.prompt_id)
    }

    /// History entry of a prompt, `None` while it is still running.
    pub async fn history(&self, prompt_id: &str, token: Option<&str>) -> Result<Option<Value>> {
        let request = self
            .client
            .get(format!("{}/history/{}", self.base_url, prompt_id));
        let response = self.authorize(request, token).send().await?;
        let mut history: Value = response.error_for_status()?.json().await?;
        Ok(history
            .get_mut(prompt_id)
            .map(Value::take)
            .filter(|entry| !entry.is_null()))
    }

    pub async fn image(
        &self,
        filename: &str,
        subfolder: &str,
        folder_type: &str,
        token: Option<&str>,
    ) -> Result<String> {
        let request = self
            .client
            .get(format!("{}/view", self.base_url))
            .query(&[
                ("filename", filename),
                ("subfolder", subfolder),
                ("type", folder_type),
            ]);
        let response = self.authorize(request, token).send().await?;
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(STANDARD.encode(bytes))
    }

    /// Queues the prompt, waits for its history entry and downloads every image.
    pub async fn run(&self, prompt: &Value, token: Option<&str>) -> Result<NodeImages> {
        let prompt_id = self.queue_prompt(prompt, token).await?;

        let entry = loop {
            if let Some(entry) = self.history(&prompt_id, token).await? {
                break entry;
            }
            tokio::time::sleep(self.poll_interval).await;
        };

        let mut images = NodeImages::new();
        let outputs = entry
            .get("outputs")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        for (node_id, output) in outputs {
            let mut node_images = Vec::new();
            for image in output
                .get("images")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                let filename = image.get("filename").and_then(Value::as_str).ok_or_else(|| {
                    ConnectError::ComfyUiError {
                        message: format!("image of node {} has no filename", node_id),
                    }
                })?;
                let subfolder = image.get("subfolder").and_then(Value::as_str).unwrap_or("");
                let folder_type = image.get("type").and_then(Value::as_str).unwrap_or("output");
                node_images.push(self.image(filename, subfolder, folder_type, token).await?);
            }
            images.insert(node_id, node_images);
        }

        Ok(images)
    }
}

#[async_trait]
impl PromptRunner for ComfyUiClient {
    async fn run_prompt(&self, prompt: &Value, token: Option<&str>) -> Result<NodeImages> {
        self.run(prompt, token).await
    }
}
