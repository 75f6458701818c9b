//! Quote-level risk guard for the market maker
//!
//! Rejects individual quotes that would breach inventory or value
//! limits, and decides when the maker should stop quoting entirely:
//! daily loss exhausted, stop-loss hit, or a losing streak.

use std::sync::atomic::{AtomicU32, Ordering};

use oms_core::core::{AtomicF64, Side};

use crate::market_maker::{InventorySnapshot, MMQuote, MarketMakerConfig};

/// Consecutive losing fills that trigger a stop
const MAX_CONSECUTIVE_LOSSES: u32 = 10;

/// Stateful quote guard
pub struct RiskChecker {
    config: MarketMakerConfig,
    daily_pnl: AtomicF64,
    consecutive_losses: AtomicU32,
}

impl RiskChecker {
    pub fn new(config: MarketMakerConfig) -> Self {
        Self {
            config,
            daily_pnl: AtomicF64::new(0.0),
            consecutive_losses: AtomicU32::new(0),
        }
    }

    /// Would this quote, if filled, stay inside the limits?
    pub fn check_quote(&self, quote: &MMQuote, inventory: &InventorySnapshot) -> bool {
        let new_position = match quote.side {
            Side::Buy => inventory.position + quote.quantity,
            Side::Sell => inventory.position - quote.quantity,
        };

        if new_position.abs() > self.config.max_inventory {
            return false;
        }

        let position_value = (new_position * quote.price).abs();
        if position_value > self.config.max_position_value {
            return false;
        }

        // Epsilon keeps a flat book from dividing by zero
        let pnl_percent = inventory.unrealized_pnl / (inventory.position_value + 1e-10);
        if pnl_percent < -self.config.stop_loss_percent {
            return false;
        }

        true
    }

    /// Should quoting stop altogether?
    pub fn should_stop(&self, inventory: &InventorySnapshot, daily_pnl: f64) -> bool {
        if daily_pnl < -self.config.max_daily_loss {
            return true;
        }

        let pnl_percent = inventory.unrealized_pnl / (inventory.position_value + 1e-10);
        if pnl_percent < -self.config.stop_loss_percent {
            return true;
        }

        self.consecutive_losses.load(Ordering::Acquire) >= MAX_CONSECUTIVE_LOSSES
    }

    /// Track a fill's PnL; losses extend the streak, any win resets it
    pub fn record_pnl(&self, pnl: f64) {
        self.daily_pnl.fetch_add(pnl, Ordering::AcqRel);

        if pnl < 0.0 {
            self.consecutive_losses.fetch_add(1, Ordering::AcqRel);
        } else {
            self.consecutive_losses.store(0, Ordering::Release);
        }
    }

    pub fn daily_pnl(&self) -> f64 {
        self.daily_pnl.load(Ordering::Acquire)
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oms_core::core::FixedStr;

    fn config() -> MarketMakerConfig {
        MarketMakerConfig {
            max_inventory: 10.0,
            max_position_value: 10_000.0,
            stop_loss_percent: 0.02,
            max_daily_loss: 1_000.0,
            ..MarketMakerConfig::default()
        }
    }

    fn quote(side: Side, price: f64, quantity: f64) -> MMQuote {
        MMQuote {
            symbol: FixedStr::from_str("BTCUSDT"),
            venue: FixedStr::from_str("binance_spot"),
            side,
            price,
            quantity,
            level: 0,
            timestamp_ns: 0,
        }
    }

    fn inventory(position: f64, avg_price: f64, unrealized_pnl: f64) -> InventorySnapshot {
        InventorySnapshot {
            position,
            avg_price,
            unrealized_pnl,
            realized_pnl: 0.0,
            position_value: position * avg_price,
            timestamp_ns: 0,
        }
    }

    #[test]
    fn test_quote_within_limits_passes() {
        let checker = RiskChecker::new(config());
        assert!(checker.check_quote(&quote(Side::Buy, 100.0, 1.0), &inventory(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_inventory_cap() {
        let checker = RiskChecker::new(config());
        let inv = inventory(9.5, 100.0, 0.0);

        assert!(!checker.check_quote(&quote(Side::Buy, 100.0, 1.0), &inv));
        // Selling reduces inventory and passes
        assert!(checker.check_quote(&quote(Side::Sell, 100.0, 1.0), &inv));
    }

    #[test]
    fn test_position_value_cap() {
        let checker = RiskChecker::new(config());
        // 8 units at 2_000 = 16_000 > 10_000
        assert!(!checker.check_quote(&quote(Side::Buy, 2_000.0, 1.0), &inventory(7.0, 2_000.0, 0.0)));
    }

    #[test]
    fn test_stop_loss_blocks_quotes() {
        let checker = RiskChecker::new(config());
        // Down 3% against a 1_000 position value
        let inv = inventory(10.0, 100.0, -30.0);
        assert!(!checker.check_quote(&quote(Side::Sell, 100.0, 1.0), &inv));
        assert!(checker.should_stop(&inv, 0.0));
    }

    #[test]
    fn test_daily_loss_stops() {
        let checker = RiskChecker::new(config());
        let inv = inventory(0.0, 0.0, 0.0);

        assert!(!checker.should_stop(&inv, -999.0));
        assert!(checker.should_stop(&inv, -1_001.0));
    }

    #[test]
    fn test_losing_streak_stops() {
        let checker = RiskChecker::new(config());
        let inv = inventory(0.0, 0.0, 0.0);

        for _ in 0..9 {
            checker.record_pnl(-1.0);
        }
        assert!(!checker.should_stop(&inv, 0.0));

        checker.record_pnl(-1.0);
        assert_eq!(checker.consecutive_losses(), 10);
        assert!(checker.should_stop(&inv, 0.0));

        // A winning fill resets the streak
        checker.record_pnl(2.0);
        assert!(!checker.should_stop(&inv, 0.0));
        assert!((checker.daily_pnl() - -8.0).abs() < 1e-9);
    }
}
