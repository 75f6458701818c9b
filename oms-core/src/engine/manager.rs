//! Order manager: admission, per-venue queues, dispatch worker, index
//!
//! Submissions are rate-limited against a per-second tumbling window
//! and enqueued on the ring buffer of the target venue. A single
//! dispatch worker (optionally CPU-pinned) round-robins the venue
//! rings, assigns monotonic order ids, and maintains the order index.
//!
//! The rings are SPSC: the worker is the only consumer, and each
//! venue's submissions must come from one producer thread at a time
//! (one upstream pipeline per venue). The rate-limit counters and
//! the index are safe from any thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::types::{epoch_micros, Order, OrderId, OrderStatus, Venue};
use crate::core::RingBuffer;
use crate::perf;

use super::stats::{Stats, StatsSnapshot};

/// Order manager tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderManagerConfig {
    /// Per-venue ring size; rounded up to a power of two
    pub ring_buffer_size: usize,

    /// Admission cap per tumbling one-second window
    pub max_orders_per_second: u32,

    /// Expected live-order population; sizes the index up front
    pub max_active_orders: usize,

    /// Cores the dispatch worker may pin to (first available wins)
    pub cpu_cores: Vec<usize>,
}

impl Default for OrderManagerConfig {
    fn default() -> Self {
        Self {
            ring_buffer_size: 1 << 20,
            max_orders_per_second: 100_000,
            max_active_orders: 1_000_000,
            cpu_cores: vec![2, 3],
        }
    }
}

/// by-id and by-venue views over admitted orders
///
/// Reads copy records out, so callers never hold references into the
/// index across lock boundaries.
#[derive(Default)]
struct OrderIndex {
    by_id: HashMap<OrderId, Order>,
    by_venue: HashMap<Venue, Vec<OrderId>>,
}

struct Inner {
    config: OrderManagerConfig,

    /// One SPSC ring per venue, indexed by `Venue::index`
    queues: [RingBuffer<Order>; Venue::COUNT],

    index: RwLock<OrderIndex>,
    stats: Stats,

    next_order_id: AtomicU64,

    orders_this_second: AtomicU32,
    last_rate_check: Mutex<Instant>,

    running: AtomicBool,
}

/// Serializes order flow per venue and owns the order index
pub struct OrderManager {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl OrderManager {
    pub fn new(config: OrderManagerConfig) -> Self {
        let ring_size = config.ring_buffer_size;
        let queues = std::array::from_fn(|_| RingBuffer::new(ring_size));

        let index = OrderIndex {
            by_id: HashMap::with_capacity(config.max_active_orders.min(1 << 16)),
            by_venue: HashMap::with_capacity(Venue::COUNT),
        };

        Self {
            inner: Arc::new(Inner {
                config,
                queues,
                index: RwLock::new(index),
                stats: Stats::new(),
                next_order_id: AtomicU64::new(1),
                orders_this_second: AtomicU32::new(0),
                last_rate_check: Mutex::new(Instant::now()),
                running: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Admit `order` into its venue queue
    ///
    /// Returns false (and counts a rejection) when the per-second
    /// admission window is exhausted or the venue ring is full.
    pub fn submit_order(&self, order: Order) -> bool {
        self.inner.submit_order(order)
    }

    /// Route a cancellation through the same admission path
    ///
    /// Synthesizes a `Canceled` record; the dispatch worker applies it
    /// to the index when it drains the queue.
    pub fn cancel_order(&self, order_id: OrderId, venue: Venue) -> bool {
        let cancel = Order {
            id: order_id,
            venue,
            status: OrderStatus::Canceled,
            ..Order::default()
        };
        self.inner.submit_order(cancel)
    }

    /// Replace the indexed record for `order.id`
    ///
    /// Returns false when the id was never admitted.
    pub fn update_order(&self, order: Order) -> bool {
        let mut index = self.inner.index.write();
        match index.by_id.get_mut(&order.id) {
            Some(stored) => {
                *stored = order;
                true
            }
            None => false,
        }
    }

    /// Copy of the admitted record for `order_id`
    pub fn get_order(&self, order_id: OrderId) -> Option<Order> {
        self.inner.index.read().by_id.get(&order_id).cloned()
    }

    /// Copies of every admitted record for `venue`, in admission order
    pub fn get_orders_by_venue(&self, venue: Venue) -> Vec<Order> {
        let index = self.inner.index.read();
        index
            .by_venue
            .get(&venue)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| index.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Spawn the dispatch worker; idempotent
    pub fn start(&self) -> Result<()> {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("oms-dispatch".to_string())
            .spawn(move || {
                perf::pin_to_any(&inner.config.cpu_cores);
                inner.dispatch_loop();
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.inner.running.store(false, Ordering::Release);
                return Err(err).context("failed to spawn dispatch worker");
            }
        };

        *self.worker.lock() = Some(handle);
        info!("Order manager started");
        Ok(())
    }

    /// Clear the running flag and join the worker; idempotent
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                warn!("Dispatch worker panicked during shutdown");
            }
        }
        info!("Order manager stopped");
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }
}

impl Drop for OrderManager {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    fn submit_order(&self, order: Order) -> bool {
        if !self.check_rate() {
            self.stats.orders_rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let queue = &self.queues[order.venue.index()];
        if queue.push(order).is_err() {
            self.stats.orders_rejected.fetch_add(1, Ordering::Relaxed);
            debug!("submission rejected: venue ring full");
            return false;
        }

        true
    }

    /// Tumbling one-second admission window
    fn check_rate(&self) -> bool {
        {
            let mut last_check = self.last_rate_check.lock();
            if last_check.elapsed() >= Duration::from_secs(1) {
                self.orders_this_second.store(0, Ordering::Release);
                *last_check = Instant::now();
            }
        }

        self.orders_this_second.fetch_add(1, Ordering::AcqRel) < self.config.max_orders_per_second
    }

    /// Worker body: round-robin the venue rings until stopped
    fn dispatch_loop(&self) {
        debug!("dispatch loop entered");

        while self.running.load(Ordering::Acquire) {
            let mut dispatched = false;

            for venue in Venue::ALL {
                if let Some(order) = self.queues[venue.index()].pop() {
                    let start = Instant::now();
                    self.process_order(order);
                    let latency_us = start.elapsed().as_micros() as u64;

                    self.stats.record_latency(latency_us);
                    self.stats.orders_processed.fetch_add(1, Ordering::Relaxed);
                    dispatched = true;
                }
            }

            if !dispatched {
                thread::yield_now();
            }
        }

        debug!("dispatch loop exited");
    }

    fn process_order(&self, mut order: Order) {
        if order.status == OrderStatus::Canceled {
            self.process_cancellation(order.id, order.venue);
            return;
        }

        order.id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        order.created_at = epoch_micros();
        order.updated_at = order.created_at;

        let mut index = self.index.write();
        index.by_venue.entry(order.venue).or_default().push(order.id);
        index.by_id.insert(order.id, order);

        // Forwarding to the venue connector is the transport layer's
        // job; the admitted record is what it picks up.
    }

    fn process_cancellation(&self, order_id: OrderId, venue: Venue) {
        let mut index = self.index.write();
        if let Some(order) = index.by_id.get_mut(&order_id) {
            // A venue mismatch is a silent no-op
            if order.venue == venue {
                order.status = OrderStatus::Canceled;
                order.updated_at = epoch_micros();
            }
        }
    }
}
