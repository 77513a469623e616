use crate::config::toml_config::TomlConfig;
use crate::config::PublishSettings;
use crate::core::TargetKind;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "comfy-connect")]
#[command(about = "Save a ComfyUI prompt as a named API endpoint")]
pub struct CliConfig {
    /// API-format prompt (or an export carrying an `output` field)
    pub document: PathBuf,

    /// Endpoint name; prompts on stdin when omitted
    #[arg(short, long)]
    pub name: Option<String>,

    #[arg(long, value_enum)]
    pub target: Option<TargetKind>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub api_prefix: Option<String>,

    #[arg(long, env = "COMFYUI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Show an error toast when saving fails")]
    pub report_failures: bool,

    #[arg(short, long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Do not remember the endpoint name next to the document")]
    pub no_context: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 命令列參數優先於設定檔
    pub fn resolve(&self) -> Result<PublishSettings> {
        let file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        Ok(self.merge(file))
    }

    pub fn merge(&self, file: TomlConfig) -> PublishSettings {
        let defaults = PublishSettings::default();
        let TomlConfig { comfyui, publish } = file;

        PublishSettings {
            host: self.host.clone().or(comfyui.host).unwrap_or(defaults.host),
            port: self.port.or(comfyui.port).unwrap_or(defaults.port),
            api_prefix: self
                .api_prefix
                .clone()
                .or(publish.api_prefix)
                .unwrap_or(defaults.api_prefix),
            target: self.target.or(publish.target).unwrap_or(defaults.target),
            token: self.token.clone().or(comfyui.token),
            timeout: self
                .timeout_seconds
                .or(publish.timeout_seconds)
                .map(Duration::from_secs),
            report_failures: self.report_failures || publish.report_failures.unwrap_or(false),
            gateway_endpoint: comfyui.gateway_endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let cli = CliConfig::try_parse_from(["comfy-connect", "prompt.json"]).unwrap();
        assert_eq!(cli.document, PathBuf::from("prompt.json"));
        assert!(cli.name.is_none());

        let settings = cli.merge(TomlConfig::default());
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8188);
        assert_eq!(settings.target, TargetKind::Connect);
    }

    #[test]
    fn test_flags_override_file() {
        let cli = CliConfig::try_parse_from([
            "comfy-connect",
            "prompt.json",
            "--name",
            "render-pipeline",
            "--port",
            "9000",
            "--target",
            "fast-api",
        ])
        .unwrap();

        let file = TomlConfig::from_toml_str(
            "[comfyui]\nhost = \"comfy.local\"\nport = 8000\n[publish]\ntimeout_seconds = 5\n",
        )
        .unwrap();
        let settings = cli.merge(file);

        assert_eq!(cli.name.as_deref(), Some("render-pipeline"));
        assert_eq!(settings.host, "comfy.local");
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.target, TargetKind::FastApi);
        assert_eq!(settings.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_rejects_unknown_target() {
        assert!(CliConfig::try_parse_from(["comfy-connect", "p.json", "--target", "grpc"]).is_err());
    }
}
