use std::sync::Arc;

use anyhow::Context;
use common::{telemetry, Config};
use route_api::{create_router, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing("route-api", &config.log_level);

    let composer = route_engine::build_composer(&config).context("Failed to set up the route composer")?;
    info!(
        "🗺️ Partitioning: {}, mode: {:?}, dedup: {:?}",
        composer.settings().partitioner.name(),
        config.route_mode,
        config.dedup_policy
    );

    let app = create_router(Arc::new(AppState::new(composer)));

    let addr = config.bind_addr();
    info!("🚀 API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
