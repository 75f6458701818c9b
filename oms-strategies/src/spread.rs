//! Standalone spread arithmetic
//!
//! Same clamped base-times-adjustments model as the quote engine,
//! but parameterized directly by (volatility, inventory ratio, book
//! depth) so backtests and the host can evaluate spreads without an
//! engine instance.

use crate::market_maker::MarketMakerConfig;

/// Spread calculator over a fixed configuration
pub struct SpreadCalculator {
    config: MarketMakerConfig,
}

impl SpreadCalculator {
    pub fn new(config: MarketMakerConfig) -> Self {
        Self { config }
    }

    /// Combined spread for the given market conditions, clamped to
    /// the configured band
    pub fn calculate(&self, volatility: f64, inventory_ratio: f64, book_depth: f64) -> f64 {
        let base_spread = self.config.base_spread_bps / 10_000.0;

        let spread = base_spread
            * self.volatility_adjustment(volatility)
            * self.inventory_adjustment(inventory_ratio)
            * self.depth_adjustment(book_depth);

        let min_spread = self.config.min_spread_bps / 10_000.0;
        let max_spread = self.config.max_spread_bps / 10_000.0;
        spread.min(max_spread).max(min_spread)
    }

    /// Split a base spread into bid/ask halves skewed by inventory
    ///
    /// Long inventory tightens the ask and widens the bid; short
    /// inventory mirrors.
    pub fn bid_ask_spreads(&self, base_spread: f64, inventory_ratio: f64) -> (f64, f64) {
        let mut bid_spread = base_spread;
        let mut ask_spread = base_spread;

        let skew = self.config.inventory_skew;

        if inventory_ratio > 0.0 {
            ask_spread *= 1.0 - skew * inventory_ratio.abs();
            bid_spread *= 1.0 + skew * inventory_ratio.abs();
        } else if inventory_ratio < 0.0 {
            bid_spread *= 1.0 - skew * inventory_ratio.abs();
            ask_spread *= 1.0 + skew * inventory_ratio.abs();
        }

        (bid_spread, ask_spread)
    }

    /// Higher volatility, wider spread
    fn volatility_adjustment(&self, volatility: f64) -> f64 {
        1.0 + volatility * self.config.volatility_factor
    }

    /// Heavier inventory, wider spread (quadratic)
    fn inventory_adjustment(&self, inventory_ratio: f64) -> f64 {
        1.0 + inventory_ratio.abs().powi(2) * 0.5
    }

    /// Thinner book, wider spread
    fn depth_adjustment(&self, book_depth: f64) -> f64 {
        if book_depth < 10.0 {
            1.2
        } else if book_depth < 50.0 {
            1.1
        } else {
            1.0
        }
    }
}
