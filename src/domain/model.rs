use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque serialized graph prompt. Never inspected by the publisher.
pub type Document = serde_json::Value;

/// Last endpoint name used for one document, owned by whoever owns the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_name: Option<String>,
}

impl DocumentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            endpoint_name: Some(name.into()),
        }
    }

    pub fn default_name(&self) -> &str {
        self.endpoint_name.as_deref().unwrap_or("")
    }
}

/// Wire body of a publish call: `{"name": ..., "workflow": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub name: String,
    pub workflow: Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WriteMethod {
    Put,
    Post,
}

impl fmt::Display for WriteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMethod::Put => f.write_str("PUT"),
            WriteMethod::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub method: WriteMethod,
    pub path: String,
}

/// The two deployed flavors of the same publish operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TargetKind {
    #[default]
    Connect,
    FastApi,
}

impl TargetKind {
    pub fn target(self) -> PublishTarget {
        match self {
            TargetKind::Connect => PublishTarget {
                method: WriteMethod::Put,
                path: "/connect/workflows".to_string(),
            },
            TargetKind::FastApi => PublishTarget {
                method: WriteMethod::Post,
                path: "/fast_api/workflows".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warn,
    Error,
}

/// A toast as the host would display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub life_ms: u64,
}

pub const TOAST_LIFE_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReport {
    Cancelled,
    Published { name: String, status: u16 },
    Failed { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_request_wire_shape() {
        let request = PublishRequest {
            name: "render-pipeline".to_string(),
            workflow: serde_json::json!({"nodes": [1, 2]}),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"name": "render-pipeline", "workflow": {"nodes": [1, 2]}})
        );
    }

    #[test]
    fn test_target_kinds() {
        let connect = TargetKind::Connect.target();
        assert_eq!(connect.method, WriteMethod::Put);
        assert_eq!(connect.path, "/connect/workflows");

        let fast_api = TargetKind::FastApi.target();
        assert_eq!(fast_api.method, WriteMethod::Post);
        assert_eq!(fast_api.path, "/fast_api/workflows");
    }

    #[test]
    fn test_context_serializes_as_name() {
        let context = DocumentContext::with_name("a");
        assert_eq!(
            serde_json::to_string(&context).unwrap(),
            r#"{"name":"a"}"#
        );
        let empty: DocumentContext = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.default_name(), "");
    }
}
