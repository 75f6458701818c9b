//! Lock-free running min/max latency tracking
//!
//! Compare-and-swap loops that only attempt the exchange while the
//! new observation is strictly better than the published one. Shared
//! by the order manager's dispatch stats and the host's reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lower `current` to `observed` if strictly smaller
#[inline]
pub fn update_min(current: &AtomicU64, observed: u64) {
    let mut seen = current.load(Ordering::Relaxed);
    while observed < seen {
        match current.compare_exchange_weak(seen, observed, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => seen = actual,
        }
    }
}

/// Raise `current` to `observed` if strictly larger
#[inline]
pub fn update_max(current: &AtomicU64, observed: u64) {
    let mut seen = current.load(Ordering::Relaxed);
    while observed > seen {
        match current.compare_exchange_weak(seen, observed, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => seen = actual,
        }
    }
}
