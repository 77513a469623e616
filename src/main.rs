use clap::Parser;
use comfy_connect::adapters::console::{ConsoleNotifier, FixedName, LinePrompt};
use comfy_connect::adapters::document::{ContextFile, JsonFileDocument};
use comfy_connect::adapters::http::HttpTransport;
use comfy_connect::core::{NamePrompt, PublishReport};
use comfy_connect::utils::error::ErrorSeverity;
use comfy_connect::utils::{logger, validation::Validate};
use comfy_connect::{CliConfig, EndpointPublisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);
    tracing::debug!("Document: {}", config.document.display());

    let settings = match config.resolve().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(
                "❌ Configuration validation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            let exit_code = match e.severity() {
                ErrorSeverity::Critical => 3,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    };
    if let Some(gateway) = &settings.gateway_endpoint {
        tracing::debug!("Gateway endpoint configured: {}", gateway);
    }

    let transport = match HttpTransport::from_config(&settings) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let prompt: Box<dyn NamePrompt> = match &config.name {
        Some(name) => Box::new(FixedName(name.clone())),
        None => Box::new(LinePrompt::stdin()),
    };

    let publisher = EndpointPublisher::new(
        prompt,
        JsonFileDocument::new(&config.document),
        transport,
        ConsoleNotifier,
        settings.target.target(),
    )
    .with_api_prefix(settings.api_prefix.clone())
    .with_policy(settings.policy());

    let context_file = ContextFile::beside(&config.document);
    let mut context = if config.no_context {
        Default::default()
    } else {
        context_file.load().await
    };

    let report = publisher.publish(&mut context).await;

    if !config.no_context && !matches!(report, PublishReport::Cancelled) {
        if let Err(e) = context_file.save(&context).await {
            tracing::warn!(
                "Could not remember endpoint name in {}: {}",
                context_file.path().display(),
                e
            );
        }
    }

    // 根據結果決定退出碼
    match report {
        PublishReport::Failed { reason, .. } => {
            tracing::debug!("Publish failed: {}", reason);
            if settings.report_failures {
                std::process::exit(2);
            }
        }
        PublishReport::Cancelled | PublishReport::Published { .. } => {}
    }
    Ok(())
}
