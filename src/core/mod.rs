pub mod executor;
pub mod openapi;
pub mod publisher;
pub mod store;
pub mod workflow;

pub use crate::domain::model::{
    Document, DocumentContext, Notification, PublishReport, PublishRequest, PublishTarget,
    Severity, TargetKind, TransportResponse, WriteMethod, TOAST_LIFE_MS,
};
pub use crate::domain::ports::{
    ConfigProvider, DocumentSource, NamePrompt, NodeImages, Notifier, PromptRequest,
    PromptRunner, WorkflowTransport,
};
pub use crate::utils::error::Result;
