//! # Cache Layer
//! Process-lifetime map from normalized query to a previously computed
//! `HypeResult`, with a freshness window and a capacity bound so the
//! external sources are shielded from redundant load.
//!
//! Lookups take an explicit `Instant` internally (`get_at`/`put_at`) so
//! expiry is testable without sleeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::aggregate::HypeResult;

/// Default freshness window: 15 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
/// Default capacity bound; oldest entries are evicted first once reached.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Cache key derivation: queries differing only by case or extra whitespace
/// must map to the same entry and the same adapter calls.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: HypeResult,
    created_at: Instant,
}

/// Thread-safe TTL cache. The inner map is the only mutable state shared
/// across requests; one mutex around read-check-write is sufficient at the
/// expected throughput.
pub struct HypeCache {
    inner: Mutex<HashMap<String, CacheEntry>>,
    flights: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    ttl: Duration,
    capacity: usize,
}

impl HypeCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry → clone of the stored result. A stale entry is removed
    /// here (lazy expiry) and reported as a miss.
    pub fn get(&self, key: &str) -> Option<HypeResult> {
        self.get_at(key, Instant::now())
    }

    pub fn put(&self, key: &str, result: HypeResult) {
        self.put_at(key, result, Instant::now());
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<HypeResult> {
        let mut map = self.inner.lock().expect("cache mutex poisoned");
        match map.get(key) {
            Some(entry) if now.duration_since(entry.created_at) < self.ttl => {
                Some(entry.result.clone())
            }
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put_at(&self, key: &str, result: HypeResult, now: Instant) {
        let mut map = self.inner.lock().expect("cache mutex poisoned");
        if !map.contains_key(key) && map.len() >= self.capacity {
            // Oldest-first eviction keeps the map bounded in long-running
            // deployments; entries also self-expire via the TTL.
            if let Some(oldest) = map
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone())
            {
                map.remove(&oldest);
            }
        }
        map.insert(
            key.to_string(),
            CacheEntry {
                result,
                created_at: now,
            },
        );
    }

    /// Per-key in-flight lock. Concurrent misses for the same query serialize
    /// on this lock and re-check the cache after acquiring it, so only the
    /// first caller actually fans out to the adapters. Different keys get
    /// independent locks and never wait on each other.
    pub fn flight(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut flights = self.flights.lock().expect("flight mutex poisoned");
        // Drop locks nobody holds anymore before handing out a new one.
        flights.retain(|_, lock| Arc::strong_count(lock) > 1);
        flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").len()
    }
}
