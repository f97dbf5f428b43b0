use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("hype_requests_total", "Total /api/hype requests served.");
        describe_counter!("hype_cache_hits_total", "Requests answered from cache.");
        describe_counter!(
            "hype_cache_misses_total",
            "Requests that triggered a fresh aggregation."
        );
        describe_counter!(
            "hype_adapter_errors_total",
            "Source adapter failures (any kind)."
        );
        describe_histogram!("hype_aggregate_ms", "Aggregation wall time in milliseconds.");
    });
}

impl Metrics {
    /// Initialize Prometheus recorder and expose a static gauge for the cache TTL.
    pub fn init(ttl_secs: u64) -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_metrics_described();
        gauge!("hype_cache_ttl_secs").set(ttl_secs as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
