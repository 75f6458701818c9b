//! Core primitives: domain types, the SPSC ring buffer, and the
//! lock-free publication cells every subsystem builds on.

pub mod atomic;
pub mod ring_buffer;
pub mod types;
pub mod versioned;

pub use atomic::AtomicF64;
pub use ring_buffer::RingBuffer;
pub use types::{
    epoch_micros, monotonic_nanos, FixedStr, MarketData, Order, OrderId, OrderStatus, OrderType,
    Side, TimeInForce, Venue,
};
pub use versioned::Versioned;
