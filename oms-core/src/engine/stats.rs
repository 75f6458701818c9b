//! Dispatch statistics: lock-free counters with running min/avg/max

use std::sync::atomic::{AtomicU64, Ordering};

use crate::perf::latency::{update_max, update_min};

/// Live counters owned by the order manager
///
/// `min_latency_us` starts at `u64::MAX` and only moves down; readers
/// should go through [`Stats::snapshot`], which normalises the
/// never-measured case.
#[derive(Debug)]
pub struct Stats {
    pub orders_processed: AtomicU64,
    pub orders_rejected: AtomicU64,
    pub total_latency_us: AtomicU64,
    pub min_latency_us: AtomicU64,
    pub max_latency_us: AtomicU64,
}

impl Stats {
    pub const fn new() -> Self {
        Self {
            orders_processed: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            min_latency_us: AtomicU64::new(u64::MAX),
            max_latency_us: AtomicU64::new(0),
        }
    }

    /// Record one dispatch observation
    #[inline]
    pub fn record_latency(&self, latency_us: u64) {
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        update_min(&self.min_latency_us, latency_us);
        update_max(&self.max_latency_us, latency_us);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let processed = self.orders_processed.load(Ordering::Relaxed);
        let min = self.min_latency_us.load(Ordering::Relaxed);

        StatsSnapshot {
            orders_processed: processed,
            orders_rejected: self.orders_rejected.load(Ordering::Relaxed),
            total_latency_us: self.total_latency_us.load(Ordering::Relaxed),
            min_latency_us: if min == u64::MAX { 0 } else { min },
            max_latency_us: self.max_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the dispatch counters
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub orders_processed: u64,
    pub orders_rejected: u64,
    pub total_latency_us: u64,
    pub min_latency_us: u64,
    pub max_latency_us: u64,
}

impl StatsSnapshot {
    /// Average dispatch latency in microseconds
    pub fn average_latency_us(&self) -> f64 {
        if self.orders_processed == 0 {
            return 0.0;
        }
        self.total_latency_us as f64 / self.orders_processed as f64
    }
}
