use anyhow::Context;
use grove::http::{AppState, HttpServer};
use grove::{GroveConfig, Publisher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Usage: `grove [CONFIG]`; the config path may also come from `$GROVE_CONFIG`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = GroveConfig::load(config_path.as_deref()).context("loading configuration")?;

    info!("Grove v{}", grove::version());

    let registry = config.prefix_registry();
    let (store, persistence) = grove::open_store(&config).context("opening vocabulary store")?;
    info!(
        "{} vocabularies loaded, publishing to {}",
        store.vocabulary_count(),
        config.output_dir.display()
    );

    let state = Arc::new(AppState::new(
        store,
        registry,
        Publisher::new(&config.output_dir),
        persistence,
    ));

    HttpServer::new(state, config.bind_address())
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    Ok(())
}
