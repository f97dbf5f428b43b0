// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod score;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{Aggregator, HypeResult};
pub use crate::api::{create_router, router, AppState};
pub use crate::cache::HypeCache;
pub use crate::config::HypeConfig;
