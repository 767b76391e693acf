//! Ode API Server

use std::path::PathBuf;

use miette::IntoDiagnostic;
use ode_server::{ServerConfig, start_server};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "ode_core=info,ode_server=info,ode_api=info,tower_http=info";

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .build(),
        )
    }))?;
    miette::set_panic_hook();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_file(true)
        .with_line_number(true)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .init();

    let config_path = std::env::var("ODE_SERVER_CONFIG").ok().map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref())
        .await?
        .apply_env_overrides(|key| std::env::var(key).ok())?;

    start_server(config).await.into_diagnostic()?;

    Ok(())
}
