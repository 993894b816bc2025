//! Query identifier generation.
//!
//! GetMetricData requires ids that start with a lowercase letter and are
//! unique within one call. Ids are drawn from a monotonic counter owned by a
//! single scrape unit, so every partition built from that unit's records has
//! unique ids without any coordination between units.

use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix for generated query ids
pub const QUERY_ID_PREFIX: &str = "id_";

/// Monotonic query id source scoped to one scrape unit
#[derive(Debug, Default)]
pub struct QueryIdGenerator {
    next: AtomicU64,
}

impl QueryIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next unused id
    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{QUERY_ID_PREFIX}{n}")
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
