//! Hype Meter — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the cache, aggregator, and middleware.

mod aggregate;
mod api;
mod cache;
mod config;
mod metrics;
mod score;
mod sources;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::HypeConfig;
use crate::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - HYPE_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("HYPE_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hype_meter=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let config = HypeConfig::from_env();
    let metrics = Metrics::init(config.cache_ttl.as_secs());

    let router = api::create_router(&config).merge(metrics.router());

    Ok(router.into())
}
