//! OMS Strategies - Arbitrage Detection and Market Making
//!
//! Strategy engines built on the `oms-core` primitives:
//!
//! - [`ArbitrageDetector`] — per-symbol, per-venue top-of-book matrix
//!   scanned for buy-low/sell-high edges net of taker fees.
//! - [`MarketMakerEngine`] — dynamic spread from rolling volatility
//!   and inventory skew, emitted as a multi-level quote ladder.
//!
//! Both engines follow the same shape: updates arrive from market-data
//! pipelines through lock-free publication, a dedicated thread runs
//! the periodic scan/tick, and the output (opportunities, quotes)
//! lands on an SPSC ring the transport layer drains. Nothing here
//! blocks, and nothing on a scan path allocates.
//!
//! ## Modules
//!
//! - [`arbitrage`] — detector, price matrix, opportunity records
//! - [`market_maker`] — quote engine and its snapshots
//! - [`spread`] — standalone [`SpreadCalculator`]
//! - [`risk_checker`] — quote-level [`RiskChecker`]
//! - [`volatility`] — rolling log-return volatility window
//! - [`fees`] — per-venue maker/taker [`FeeSchedule`]

pub mod arbitrage;
pub mod fees;
pub mod market_maker;
pub mod risk_checker;
pub mod spread;
pub mod volatility;

pub use arbitrage::{ArbitrageConfig, ArbitrageDetector, ArbitrageOpportunity, PriceFeed};
pub use fees::FeeSchedule;
pub use market_maker::{
    InventorySnapshot, MMQuote, MarketMakerConfig, MarketMakerEngine, MarketSnapshot,
};
pub use risk_checker::RiskChecker;
pub use spread::SpreadCalculator;
pub use volatility::RollingVolatility;
