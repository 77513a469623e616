use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "connect-server")]
#[command(about = "Serve published ComfyUI workflows as HTTP endpoints")]
pub struct ServerConfig {
    #[arg(long, env = "CONNECT_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    #[arg(long, default_value = "./workflows")]
    pub workflows_dir: PathBuf,

    #[arg(long, default_value = "./input")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "127.0.0.1")]
    pub comfy_host: String,

    #[arg(long, default_value = "8188")]
    pub comfy_port: u16,

    #[arg(long, env = "COMFYUI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, default_value = "500")]
    pub poll_interval_ms: u64,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ServerConfig {
    pub fn comfy_url(&self) -> String {
        format!("http://{}:{}", self.comfy_host, self.comfy_port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validate_path("workflows_dir", &self.workflows_dir.to_string_lossy())?;
        validate_path("input_dir", &self.input_dir.to_string_lossy())?;
        validate_non_empty_string("comfy_host", &self.comfy_host)?;
        validate_url("comfy_url", &self.comfy_url())?;
        validate_positive_number("poll_interval_ms", self.poll_interval_ms, 10)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["connect-server"]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8000".parse().unwrap());
        assert_eq!(config.comfy_url(), "http://127.0.0.1:8188");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poll_interval_floor() {
        let config =
            ServerConfig::try_parse_from(["connect-server", "--poll-interval-ms", "1"]).unwrap();
        assert!(config.validate().is_err());
    }
}
