//! Pre-trade risk checks and position/PnL state

pub mod engine;
pub mod types;

pub use engine::{RiskEngine, MAX_SYMBOLS};
pub use types::RiskConfig;
