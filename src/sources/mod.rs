// src/sources/mod.rs
pub mod newsapi;
pub mod reddit;
pub mod trends;
pub mod wikipedia;

use async_trait::async_trait;

/// One related search term reported by the trend service.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedQuery {
    pub query: String,
    /// Percent-change string for rising terms (e.g. "250"); absent for top terms.
    pub change: Option<String>,
}

/// Trend-service payload: interest over the trailing window plus related terms.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendData {
    /// Most recent interest index, 0-100.
    pub latest: f64,
    /// Sum of all interest points before the latest one.
    pub prior_sum: f64,
    pub related_top: Vec<RelatedQuery>,
    pub related_rising: Vec<RelatedQuery>,
}

/// Raw, source-specific signal. One variant per adapter so the normalizer
/// can match exhaustively instead of poking at untyped JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSignal {
    /// Outbound link count of the exact-title encyclopedia page.
    Encyclopedia { link_count: u64 },
    /// Matching forum posts, capped at 10 by the search itself.
    Discussion { post_count: u32 },
    /// Total matching articles reported by the news index.
    News { article_count: u64 },
    Trend(TrendData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Ambiguous,
    Unconfigured,
    RateLimited,
    NetworkError,
    Timeout,
    MalformedResponse,
}

/// Adapter-level failure. Carries a human-readable message that becomes
/// the explanatory snippet for the failed source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SourceFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// What one adapter produces for one query: a raw signal or a typed failure.
/// Adapters never report errors through any other channel.
pub type SourceSignal = Result<RawSignal, SourceFailure>;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Query the external source. Must not panic; every failure mode
    /// (network, rate limit, not found, missing credentials, bad body)
    /// comes back as `Err(SourceFailure)`.
    async fn fetch(&self, query: &str) -> SourceSignal;
    fn name(&self) -> &'static str;
}

/// Map a reqwest error to the failure taxonomy.
pub(crate) fn classify_http_error(e: &reqwest::Error) -> FailureKind {
    if e.is_timeout() {
        FailureKind::Timeout
    } else if e.is_decode() {
        FailureKind::MalformedResponse
    } else {
        FailureKind::NetworkError
    }
}
