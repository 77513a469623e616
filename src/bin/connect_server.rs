use clap::Parser;
use comfy_connect::adapters::comfyui::ComfyUiClient;
use comfy_connect::api::{self, AppState};
use comfy_connect::config::server::ServerConfig;
use comfy_connect::utils::{logger, validation::Validate};
use comfy_connect::{WorkflowExecutor, WorkflowStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    logger::init_server_logger(config.verbose, config.json_logs);
    tracing::info!("🚀 Starting connect-server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let store = WorkflowStore::open(&config.workflows_dir).await?;
    let runner = ComfyUiClient::new(config.comfy_url())
        .with_token(config.token.clone())
        .with_poll_interval(config.poll_interval());
    tracing::info!(
        "ComfyUI at {} (client id {})",
        config.comfy_url(),
        runner.client_id()
    );

    let executor = WorkflowExecutor::new(store, runner, &config.input_dir);
    let app = api::create_router(Arc::new(AppState { executor }));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("📡 Listening on {}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
