use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid endpoint name '{name}': {reason}")]
    InvalidNameError { name: String, reason: String },

    #[error("Workflow '{name}' not found")]
    WorkflowNotFound { name: String },

    #[error("Invalid workflow: {message}")]
    InvalidWorkflowError { message: String },

    #[error("Invalid workflow input: {message}")]
    TagInputError { message: String },

    #[error("File input error for '{name}': {message}")]
    FileInputError { name: String, message: String },

    #[error("ComfyUI error: {message}")]
    ComfyUiError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
    Input,
    Upstream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConnectError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConnectError::HttpError(_) => ErrorCategory::Network,
            ConnectError::IoError(_) => ErrorCategory::Storage,
            ConnectError::SerializationError(_) | ConnectError::DecodeError(_) => {
                ErrorCategory::Data
            }
            ConnectError::TomlError(_)
            | ConnectError::ConfigValidationError { .. }
            | ConnectError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ConnectError::InvalidNameError { .. }
            | ConnectError::WorkflowNotFound { .. }
            | ConnectError::InvalidWorkflowError { .. }
            | ConnectError::TagInputError { .. }
            | ConnectError::FileInputError { .. } => ErrorCategory::Input,
            ConnectError::ComfyUiError { .. } => ErrorCategory::Upstream,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ConnectError::HttpError(_) => {
                "Check that the ComfyUI server is running and reachable at the configured host and port"
            }
            ConnectError::IoError(_) => "Check file paths and permissions",
            ConnectError::SerializationError(_) => "Make sure the document is valid JSON",
            ConnectError::DecodeError(_) => "File content must be standard base64",
            ConnectError::TomlError(_) => "Check the TOML syntax of the configuration file",
            ConnectError::ConfigValidationError { .. }
            | ConnectError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and try again"
            }
            ConnectError::InvalidNameError { .. } => {
                "Use a name without path separators, e.g. 'render-pipeline'"
            }
            ConnectError::WorkflowNotFound { .. } => "Save the workflow before running it",
            ConnectError::InvalidWorkflowError { .. } => {
                "Publish the API-format prompt: an object mapping node ids to nodes"
            }
            ConnectError::TagInputError { .. } => {
                "Check the workflow's tagged inputs in /connect/openapi.json"
            }
            ConnectError::FileInputError { .. } => {
                "Provide either 'content' with a 'name' or a reachable 'url'"
            }
            ConnectError::ComfyUiError { .. } => "Inspect the ComfyUI server log",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConnectError::HttpError(e) if e.is_connect() => {
                "Could not connect to the server".to_string()
            }
            ConnectError::HttpError(e) if e.is_timeout() => "The request timed out".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = ConnectError::WorkflowNotFound {
            name: "missing".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Workflow 'missing' not found");

        let err = ConnectError::InvalidConfigValueError {
            field: "port".to_string(),
            value: "0".to_string(),
            reason: "Value must be between 1 and 65535".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: ConnectError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.recovery_suggestion(), "Check file paths and permissions");
    }
}
