//! Import agent entry point.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting import agent");

    let config = config::AgentConfig::load()?;
    let store_path = config.store_path()?;
    tracing::info!(store = %store_path.display(), "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let status = rt.block_on(app::run(store_path, config.dial))?;

    if status.is_failure() {
        anyhow::bail!("import failed: {status}");
    }
    tracing::info!(%status, "import finished");
    Ok(())
}
