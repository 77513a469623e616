use crate::domain::model::{Document, Notification, PublishRequest, PublishTarget, TransportResponse};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// What the host shows when asking for an endpoint name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub title: String,
    pub message: String,
    pub default_value: String,
}

#[async_trait]
pub trait NamePrompt: Send + Sync {
    /// `None` or an empty string means the user cancelled.
    async fn prompt(&self, request: &PromptRequest) -> Option<String>;
}

#[async_trait]
impl<T: NamePrompt + ?Sized> NamePrompt for Box<T> {
    async fn prompt(&self, request: &PromptRequest) -> Option<String> {
        (**self).prompt(request).await
    }
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn serialize(&self) -> Result<Document>;
}

#[async_trait]
pub trait WorkflowTransport: Send + Sync {
    async fn write(&self, target: &PublishTarget, request: &PublishRequest)
        -> Result<TransportResponse>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn api_prefix(&self) -> &str;
    fn token(&self) -> Option<&str>;
    fn timeout(&self) -> Option<Duration>;

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host(), self.port())
    }
}

/// Base64 images per output node id.
pub type NodeImages = BTreeMap<String, Vec<String>>;

/// Executes a prepared API-format prompt on a ComfyUI instance.
#[async_trait]
pub trait PromptRunner: Send + Sync {
    async fn run_prompt(
        &self,
        prompt: &serde_json::Value,
        token: Option<&str>,
    ) -> Result<NodeImages>;
}
