//! Per-venue trading fee schedule
//!
//! Fee rates are fractions of notional (0.001 = 0.1% = 10 bps).
//! Venues without an explicit entry fall back to
//! [`DEFAULT_FEE_RATE`], the common 0.1% taker tier.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fallback rate for venues missing from the schedule
pub const DEFAULT_FEE_RATE: f64 = 0.001;

/// Maker/taker fee rates keyed by venue name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    taker: HashMap<String, f64>,
    maker: HashMap<String, f64>,
}

impl FeeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both rates for a venue; builder-style
    pub fn with_venue(mut self, venue: &str, taker: f64, maker: f64) -> Self {
        self.taker.insert(venue.to_string(), taker);
        self.maker.insert(venue.to_string(), maker);
        self
    }

    pub fn set_taker(&mut self, venue: &str, rate: f64) {
        self.taker.insert(venue.to_string(), rate);
    }

    pub fn set_maker(&mut self, venue: &str, rate: f64) {
        self.maker.insert(venue.to_string(), rate);
    }

    #[inline]
    pub fn taker_rate(&self, venue: &str) -> f64 {
        self.taker.get(venue).copied().unwrap_or(DEFAULT_FEE_RATE)
    }

    #[inline]
    pub fn maker_rate(&self, venue: &str) -> f64 {
        self.maker.get(venue).copied().unwrap_or(DEFAULT_FEE_RATE)
    }

    /// Absolute taker fee for trading `price` worth of one unit
    #[inline]
    pub fn taker_fee(&self, venue: &str, price: f64) -> f64 {
        price * self.taker_rate(venue)
    }

    /// Absolute maker fee for quoting `price` worth of one unit
    #[inline]
    pub fn maker_fee(&self, venue: &str, price: f64) -> f64 {
        price * self.maker_rate(venue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate_for_unknown_venue() {
        let fees = FeeSchedule::new();
        assert_eq!(fees.taker_rate("nowhere"), DEFAULT_FEE_RATE);
        assert_eq!(fees.maker_rate("nowhere"), DEFAULT_FEE_RATE);
    }

    #[test]
    fn test_configured_rates() {
        let fees = FeeSchedule::new()
            .with_venue("binance_spot", 0.001, 0.0008)
            .with_venue("upbit", 0.0025, 0.0025);

        assert_eq!(fees.taker_rate("binance_spot"), 0.001);
        assert_eq!(fees.maker_rate("binance_spot"), 0.0008);
        assert_eq!(fees.taker_rate("upbit"), 0.0025);
    }

    #[test]
    fn test_absolute_fee() {
        let fees = FeeSchedule::new().with_venue("okx_spot", 0.002, 0.001);
        assert!((fees.taker_fee("okx_spot", 100.0) - 0.2).abs() < 1e-12);
        assert!((fees.maker_fee("okx_spot", 100.0) - 0.1).abs() < 1e-12);
        // Fallback venue uses the default rate
        assert!((fees.taker_fee("bybit_spot", 100.0) - 0.1).abs() < 1e-12);
    }
}
