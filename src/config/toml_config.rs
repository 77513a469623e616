use crate::core::TargetKind;
use crate::utils::error::{ConnectError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub comfyui: ComfyUiSection,
    #[serde(default)]
    pub publish: PublishSection,
}

/// The editor's own connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComfyUiSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub token: Option<String>,
    pub gateway_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishSection {
    pub target: Option<TargetKind>,
    pub api_prefix: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub report_failures: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConnectError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConnectError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[comfyui]
host = "10.0.0.5"
port = 8190
gateway_endpoint = "ws://gateway.local"

[publish]
target = "fast-api"
api_prefix = ""
timeout_seconds = 15
report_failures = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.comfyui.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.comfyui.port, Some(8190));
        assert_eq!(config.publish.target, Some(TargetKind::FastApi));
        assert_eq!(config.publish.api_prefix.as_deref(), Some(""));
        assert_eq!(config.publish.timeout_seconds, Some(15));
        assert_eq!(config.publish.report_failures, Some(true));
    }

    #[test]
    fn test_empty_config() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.comfyui.host.is_none());
        assert!(config.publish.target.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CONNECT_TEST_TOKEN", "s3cret");

        let config = TomlConfig::from_toml_str(
            r#"
[comfyui]
token = "${CONNECT_TEST_TOKEN}"
host = "${CONNECT_TEST_UNSET_HOST}"
"#,
        )
        .unwrap();
        assert_eq!(config.comfyui.token.as_deref(), Some("s3cret"));
        assert_eq!(
            config.comfyui.host.as_deref(),
            Some("${CONNECT_TEST_UNSET_HOST}")
        );

        std::env::remove_var("CONNECT_TEST_TOKEN");
    }

    #[test]
    fn test_invalid_target() {
        let result = TomlConfig::from_toml_str("[publish]\ntarget = \"ftp\"\n");
        let err = result.unwrap_err();
        assert!(matches!(err, ConnectError::TomlError(_)));
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Configuration);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[comfyui]\nport = 9000\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.comfyui.port, Some(9000));
    }
}
