//! # Aggregator
//! Fans a query out to every registered source adapter, normalizes each
//! signal into a `Contribution`, and merges them into one `HypeResult`.
//!
//! Adapters run concurrently under a per-adapter timeout, but the merge is
//! deterministic: results are buffered and combined in registration order,
//! never in arrival order. The aggregator itself never fails; a request with
//! all adapters down still yields a zero-score result with one explanatory
//! snippet per adapter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use crate::score::{self, Contribution};
use crate::sources::{FailureKind, SourceAdapter, SourceFailure, SourceSignal};

/// Title when no adapter produced a hint.
const NO_DATA_TITLE: &str = "No Data";

/// Composite popularity estimate for one query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypeResult {
    /// Original casing, as submitted by the client.
    pub query: String,
    pub score: f64,
    pub title: String,
    pub snippets: Vec<String>,
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    adapter_timeout: Duration,
}

impl Aggregator {
    /// Adapter order is fixed here and determines title priority and snippet
    /// ordering in every response.
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, adapter_timeout: Duration) -> Self {
        Self {
            adapters,
            adapter_timeout,
        }
    }

    /// Compute a `HypeResult` for an already-normalized query. `original`
    /// keeps the client's casing for the response body.
    pub async fn aggregate(&self, normalized: &str, original: &str) -> HypeResult {
        let t0 = Instant::now();

        let futures = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let query = normalized.to_string();
            let limit = self.adapter_timeout;
            async move {
                match tokio::time::timeout(limit, adapter.fetch(&query)).await {
                    Ok(signal) => signal,
                    Err(_) => Err(SourceFailure::new(
                        FailureKind::Timeout,
                        format!("{} timed out after {}s.", adapter.name(), limit.as_secs()),
                    )),
                }
            }
        });
        let signals: Vec<SourceSignal> = join_all(futures).await;

        let mut score = 0.0;
        let mut title = NO_DATA_TITLE.to_string();
        let mut snippets = Vec::new();

        for (adapter, signal) in self.adapters.iter().zip(signals.iter()) {
            if let Err(failure) = signal {
                counter!("hype_adapter_errors_total").increment(1);
                tracing::warn!(
                    provider = adapter.name(),
                    kind = ?failure.kind,
                    message = %failure.message,
                    "adapter failure"
                );
            }
            let Contribution {
                score_delta,
                snippets: more,
                title_hint,
            } = score::contribution(signal);
            score += score_delta;
            snippets.extend(more);
            if let Some(hint) = title_hint {
                title = hint;
            }
        }

        histogram!("hype_aggregate_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::info!(query = normalized, score, title = %title, "aggregated");

        HypeResult {
            query: original.to_string(),
            score,
            title,
            snippets,
        }
    }
}
