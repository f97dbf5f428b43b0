use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::aggregate::{Aggregator, HypeResult};
use crate::cache::{normalize_query, HypeCache};
use crate::config::HypeConfig;
use crate::sources::{
    newsapi::NewsApiAdapter, reddit::RedditAdapter, trends::TrendsAdapter,
    wikipedia::WikipediaAdapter, SourceAdapter,
};

/// Diagnostic header reporting whether the response came from cache.
pub const CACHE_HEADER: &str = "X-Hype-Cache";

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<HypeCache>,
    pub aggregator: Arc<Aggregator>,
}

/// Production wiring: real adapters in fixed priority order
/// (Wikipedia → Reddit → NewsAPI → Trends), cache sized from config.
pub fn create_router(config: &HypeConfig) -> Router {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(WikipediaAdapter::new()),
        Arc::new(RedditAdapter::new(config.reddit.clone())),
        Arc::new(NewsApiAdapter::new(config.newsapi_key.clone())),
        Arc::new(TrendsAdapter::new()),
    ];

    let state = AppState {
        cache: Arc::new(HypeCache::new(config.cache_ttl, config.cache_capacity)),
        aggregator: Arc::new(Aggregator::new(adapters, config.adapter_timeout)),
    };

    router(state, cors_layer(&config.allowed_origins))
}

/// Assemble the router around an existing state; tests inject mock adapters
/// and short TTLs through here.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/hype", post(hype))
        .layer(cors)
        .with_state(state)
}

/// CORS restricted to the configured origins; only what the JSON endpoint
/// needs is allowed through.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[derive(serde::Deserialize)]
struct HypeQuery {
    query: String,
}

async fn hype(State(state): State<AppState>, Json(body): Json<HypeQuery>) -> Response {
    counter!("hype_requests_total").increment(1);

    let normalized = normalize_query(&body.query);
    if normalized.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "query must not be empty" })),
        )
            .into_response();
    }

    if let Some(hit) = state.cache.get(&normalized) {
        counter!("hype_cache_hits_total").increment(1);
        tracing::info!(query = %normalized, "cache hit");
        return respond(hit, "HIT");
    }

    // Single-flight: concurrent misses for the same query wait here and
    // re-check the cache, so only the first one fans out to the adapters.
    let flight = state.cache.flight(&normalized);
    let _guard = flight.lock().await;
    if let Some(hit) = state.cache.get(&normalized) {
        counter!("hype_cache_hits_total").increment(1);
        tracing::info!(query = %normalized, "cache hit (collapsed in-flight)");
        return respond(hit, "HIT");
    }

    counter!("hype_cache_misses_total").increment(1);
    tracing::info!(query = %normalized, "cache miss, aggregating");
    let result = state.aggregator.aggregate(&normalized, &body.query).await;
    state.cache.put(&normalized, result.clone());
    respond(result, "MISS")
}

fn respond(result: HypeResult, cache_status: &'static str) -> Response {
    ([(CACHE_HEADER, cache_status)], Json(result)).into_response()
}
