use crate::core::{
    ConfigProvider, PublishRequest, PublishTarget, TransportResponse, WorkflowTransport,
    WriteMethod,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;

/// Writes publish requests to the editor's HTTP server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    /// `base_url` already carries the API prefix, e.g. `http://127.0.0.1:8188/api`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let mut transport = Self::new(
            client,
            format!("{}{}", config.base_url(), config.api_prefix()),
        );
        transport.token = config.token().map(str::to_string);
        Ok(transport)
    }

    pub fn url_for(&self, target: &PublishTarget) -> String {
        format!("{}{}", self.base_url, target.path)
    }
}

#[async_trait]
impl WorkflowTransport for HttpTransport {
    async fn write(
        &self,
        target: &PublishTarget,
        request: &PublishRequest,
    ) -> Result<TransportResponse> {
        let url = self.url_for(target);
        tracing::debug!("{} {}", target.method, url);

        let builder = match target.method {
            WriteMethod::Put => self.client.put(&url),
            WriteMethod::Post => self.client.post(&url),
        };
        let mut builder = builder
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TargetKind;
    use httpmock::prelude::*;
    use serde_json::json;

    fn request() -> PublishRequest {
        PublishRequest {
            name: "render-pipeline".to_string(),
            workflow: json!({"nodes": [1, 2, 3]}),
        }
    }

    #[tokio::test]
    async fn test_put_connect_workflows() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/connect/workflows")
                .header("cache-control", "no-store")
                .json_body(json!({"name": "render-pipeline", "workflow": {"nodes": [1, 2, 3]}}));
            then.status(200)
                .json_body(json!({"status": "success", "message": "Workflow 'render-pipeline' saved."}));
        });

        let transport = HttpTransport::new(Client::new(), server.url("/api"));
        let response = transport
            .write(&TargetKind::Connect.target(), &request())
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
        assert!(response.body.contains("saved"));
    }

    #[tokio::test]
    async fn test_post_fast_api_workflows() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/fast_api/workflows");
            then.status(404).body("not found");
        });

        let transport = HttpTransport::new(Client::new(), server.base_url());
        let response = transport
            .write(&TargetKind::FastApi.target(), &request())
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let transport = HttpTransport::new(Client::new(), "http://127.0.0.1:1");
        let result = transport
            .write(&TargetKind::Connect.target(), &request())
            .await;
        assert!(result.is_err());
    }
}
