//! Performance utilities: CPU pinning and lock-free latency tracking

pub mod cpu;
pub mod latency;

pub use cpu::{num_cores, pin_to_any, pin_to_core, set_realtime_priority};
