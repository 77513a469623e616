#[cfg(feature = "cli")]
pub mod cli;
#[cfg(all(feature = "cli", feature = "server"))]
pub mod server;
pub mod toml_config;

use crate::core::publisher::NotifyPolicy;
use crate::core::{ConfigProvider, TargetKind};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_api_prefix, validate_non_empty_string, validate_range, validate_url, Validate,
};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8188;
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Fully resolved publish settings (flags over file over defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct PublishSettings {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    pub target: TargetKind,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
    pub report_failures: bool,
    /// Consumed from the editor settings but not used for publishing.
    pub gateway_endpoint: Option<String>,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            target: TargetKind::default(),
            token: None,
            timeout: None,
            report_failures: false,
            gateway_endpoint: None,
        }
    }
}

impl PublishSettings {
    pub fn policy(&self) -> NotifyPolicy {
        if self.report_failures {
            NotifyPolicy::ReportFailures
        } else {
            NotifyPolicy::SuccessOnResponse
        }
    }
}

impl ConfigProvider for PublishSettings {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Validate for PublishSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("host", &self.host)?;
        validate_range("port", self.port, 1, u16::MAX)?;
        validate_api_prefix("api_prefix", &self.api_prefix)?;
        validate_url("base_url", &self.base_url())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PublishSettings::default();
        assert_eq!(settings.base_url(), "http://127.0.0.1:8188");
        assert_eq!(settings.api_prefix(), "/api");
        assert_eq!(settings.policy(), NotifyPolicy::SuccessOnResponse);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let settings = PublishSettings {
            host: " ".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = PublishSettings {
            port: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = PublishSettings {
            api_prefix: "api".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = PublishSettings {
            host: "bad host".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let settings = PublishSettings {
            token: Some(String::new()),
            report_failures: true,
            ..Default::default()
        };
        assert_eq!(settings.token(), None);
        assert_eq!(settings.policy(), NotifyPolicy::ReportFailures);
    }
}
