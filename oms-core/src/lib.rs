//! OMS Core - Deterministic Low-Latency Kernel for a Multi-Exchange OMS
//!
//! The hot path of a multi-exchange order management system for crypto
//! trading: order admission and dispatch, constant-time pre-trade risk
//! checks, and a merged multi-venue book — all under microsecond
//! latency budgets.
//!
//! ## System Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     HOST PROCESS (oms-bins)                  │
//! │   signal handling · stats loop · transport (NATS, WS, ...)   │
//! └──────────────────────────────────────────────────────────────┘
//!          │ submit_order / update_price_feed        ▲ pop
//!          ▼                                         │
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        OMS CORE                              │
//! │                                                              │
//! │  SubmitOrder ──▶ rate limit ──▶ per-venue SPSC ring          │
//! │                                      │                       │
//! │                                      ▼  (pinned worker)      │
//! │                              dispatch loop ──▶ order index   │
//! │                                                              │
//! │  RiskEngine: 4 O(1) gates over atomic scalars   (<50µs avg)  │
//! │  AggregatedOrderBook: merged multi-venue ladders             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Strategies (arbitrage detection, market making) build on these
//! primitives in the `oms-strategies` crate.
//!
//! ## Design Principles
//!
//! - **No allocation on hot paths** — risk checks, ring push/pop and
//!   latency tracking touch only atomics and stack data.
//! - **One mutator per hot structure** — each ring has one producer
//!   and one consumer; snapshots publish through sequence locks; the
//!   order index is the only reader-writer lock in the system.
//! - **Failures are counters, not errors** — admission and risk
//!   rejections return `false` and bump a counter; nothing on the hot
//!   path constructs an error value.
//!
//! ## Core Modules
//!
//! - [`core`] — domain types, [`core::RingBuffer`] (SPSC),
//!   [`core::Versioned`] (seqlock), [`core::AtomicF64`]
//! - [`engine`] — [`engine::OrderManager`]: admission, dispatch,
//!   order index
//! - [`risk`] — [`risk::RiskEngine`]: pre-trade gates and position
//!   state
//! - [`orderbook`] — [`orderbook::AggregatedOrderBook`]
//! - [`perf`] — CPU pinning, lock-free min/max tracking
//! - [`utils`] — logging setup

pub mod core;
pub mod engine;
pub mod orderbook;
pub mod perf;
pub mod risk;
pub mod utils;

pub use crate::core::{
    AtomicF64, FixedStr, MarketData, Order, OrderId, OrderStatus, OrderType, RingBuffer, Side,
    TimeInForce, Venue, Versioned,
};
pub use engine::{OrderManager, OrderManagerConfig};
pub use orderbook::AggregatedOrderBook;
pub use risk::{RiskConfig, RiskEngine};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::core::{
        epoch_micros, monotonic_nanos, FixedStr, Order, OrderId, OrderStatus, OrderType,
        RingBuffer, Side, TimeInForce, Venue, Versioned,
    };
    pub use crate::engine::{OrderManager, OrderManagerConfig};
    pub use crate::orderbook::{AggregatedOrderBook, Book, BookLevel};
    pub use crate::risk::{RiskConfig, RiskEngine};
    pub use crate::{Error, Result};
}
