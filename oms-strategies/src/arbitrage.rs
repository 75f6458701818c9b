//! Cross-venue arbitrage detection
//!
//! Maintains per-symbol top-of-book snapshots for up to
//! [`MAX_EXCHANGES`] venues and [`MAX_SYMBOLS`] symbols, and scans
//! every venue pair in both directions for buy-low/sell-high edges
//! that survive taker fees.
//!
//! Price updates arrive from the market-data pipelines (one pipeline
//! owns each venue); each (symbol, venue) slot publishes through a
//! sequence lock so the detection thread always reads a coherent
//! feed. The symbol index and venue slots are append-only — neither
//! is ever freed during a session.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use oms_core::core::{monotonic_nanos, FixedStr, RingBuffer, Versioned};

use crate::fees::FeeSchedule;

/// Venue slots per symbol
pub const MAX_EXCHANGES: usize = 10;
/// Symbol slots in the price matrix
pub const MAX_SYMBOLS: usize = 100;
/// Outbound opportunity ring size
pub const OPPORTUNITY_BUFFER_SIZE: usize = 1024;

/// Feeds older than this are ignored by the scan
const STALE_FEED_NS: u64 = 1_000_000_000;

/// Top-of-book snapshot for one (venue, symbol) pair
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceFeed {
    pub venue: FixedStr<16>,
    pub symbol: FixedStr<16>,
    pub bid_price: f64,
    pub bid_quantity: f64,
    pub ask_price: f64,
    pub ask_quantity: f64,
    pub timestamp_ns: u64,
}

/// A profitable buy-low/sell-high pair, net of taker fees
#[derive(Debug, Clone, Copy, Default)]
pub struct ArbitrageOpportunity {
    /// `{symbol}_{buy_venue}_{sell_venue}_{detected_at_ns}`
    pub id: FixedStr<64>,
    pub symbol: FixedStr<16>,
    pub buy_venue: FixedStr<16>,
    pub sell_venue: FixedStr<16>,
    pub buy_price: f64,
    pub sell_price: f64,
    pub max_quantity: f64,
    /// Net profit rate after fees
    pub profit_rate: f64,
    /// Net profit amount after fees at `max_quantity`
    pub net_profit: f64,
    pub detected_at_ns: u64,
    pub valid_until_ns: u64,
}

/// Detection thresholds and fee tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageConfig {
    /// Minimum profit rate, applied to both gross and net edges
    pub min_profit_rate: f64,

    /// Minimum net profit amount in quote currency
    pub min_profit_amount: f64,

    /// Notional cap per opportunity
    pub max_position_size: f64,

    /// How long an emitted opportunity stays actionable
    pub opportunity_ttl_ns: u64,

    pub fees: FeeSchedule,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_profit_rate: 0.001,
            min_profit_amount: 10.0,
            max_position_size: 10_000.0,
            opportunity_ttl_ns: 500_000_000,
            fees: FeeSchedule::default(),
        }
    }
}

/// Per-symbol venue slots
struct SymbolPrices {
    feeds: [Versioned<PriceFeed>; MAX_EXCHANGES],
    exchange_count: AtomicU8,
}

impl Default for SymbolPrices {
    fn default() -> Self {
        Self {
            feeds: std::array::from_fn(|_| Versioned::new(PriceFeed::default())),
            exchange_count: AtomicU8::new(0),
        }
    }
}

/// Cross-venue arbitrage detector
pub struct ArbitrageDetector {
    config: ArbitrageConfig,

    symbol_index: DashMap<String, usize>,
    symbols: Box<[SymbolPrices]>,
    symbol_count: AtomicUsize,

    opportunities: RingBuffer<ArbitrageOpportunity>,

    detected_count: AtomicU64,
    processed_prices: AtomicU64,

    running: AtomicBool,
}

impl ArbitrageDetector {
    pub fn new(config: ArbitrageConfig) -> Self {
        let symbols = (0..MAX_SYMBOLS)
            .map(|_| SymbolPrices::default())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            config,
            symbol_index: DashMap::new(),
            symbols,
            symbol_count: AtomicUsize::new(0),
            opportunities: RingBuffer::new(OPPORTUNITY_BUFFER_SIZE),
            detected_count: AtomicU64::new(0),
            processed_prices: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
        info!("Arbitrage detector started");
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        info!("Arbitrage detector stopped");
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ingest a top-of-book update for one (venue, symbol) pair
    ///
    /// Creates the symbol slot on first sight (up to [`MAX_SYMBOLS`])
    /// and the venue slot on first sight within the symbol (up to
    /// [`MAX_EXCHANGES`]); past either cap the update is silently
    /// dropped.
    pub fn update_price_feed(
        &self,
        venue: &str,
        symbol: &str,
        bid_price: f64,
        bid_quantity: f64,
        ask_price: f64,
        ask_quantity: f64,
    ) {
        let Some(symbol_idx) = self.symbol_slot(symbol) else {
            return;
        };
        let slots = &self.symbols[symbol_idx];

        let feed = PriceFeed {
            venue: FixedStr::from_str(venue),
            symbol: FixedStr::from_str(symbol),
            bid_price,
            bid_quantity,
            ask_price,
            ask_quantity,
            timestamp_ns: monotonic_nanos(),
        };

        // Linear scan over a small, cache-resident array
        let count = (slots.exchange_count.load(Ordering::Acquire) as usize).min(MAX_EXCHANGES);
        for i in 0..count {
            if slots.feeds[i].read().venue == feed.venue {
                slots.feeds[i].write(feed);
                self.processed_prices.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        // First sighting of this venue: claim the next slot
        let idx = slots.exchange_count.fetch_add(1, Ordering::AcqRel) as usize;
        if idx >= MAX_EXCHANGES {
            slots.exchange_count.fetch_sub(1, Ordering::AcqRel);
            return;
        }
        slots.feeds[idx].write(feed);
        self.processed_prices.fetch_add(1, Ordering::Relaxed);
    }

    /// One full scan over every symbol and venue pair
    ///
    /// Evaluates both directions per pair and skips feeds older than
    /// one second. Emitted opportunities land on the outbound ring;
    /// overflow drops them silently.
    pub fn detect_opportunities(&self) {
        if !self.is_running() {
            return;
        }

        let now = monotonic_nanos();
        let symbol_count = self.symbol_count.load(Ordering::Acquire).min(MAX_SYMBOLS);

        for symbol_idx in 0..symbol_count {
            let slots = &self.symbols[symbol_idx];
            let venues = (slots.exchange_count.load(Ordering::Acquire) as usize).min(MAX_EXCHANGES);
            if venues < 2 {
                continue;
            }

            for i in 0..venues {
                let feed_i = slots.feeds[i].read();
                if now.saturating_sub(feed_i.timestamp_ns) > STALE_FEED_NS {
                    continue;
                }

                for j in (i + 1)..venues {
                    let feed_j = slots.feeds[j].read();
                    if now.saturating_sub(feed_j.timestamp_ns) > STALE_FEED_NS {
                        continue;
                    }

                    self.check_pair(&feed_i, &feed_j);
                    self.check_pair(&feed_j, &feed_i);
                }
            }
        }
    }

    /// Pop the next queued opportunity (single consumer)
    pub fn next_opportunity(&self) -> Option<ArbitrageOpportunity> {
        self.opportunities.pop()
    }

    pub fn detected_count(&self) -> u64 {
        self.detected_count.load(Ordering::Relaxed)
    }

    pub fn processed_prices(&self) -> u64 {
        self.processed_prices.load(Ordering::Relaxed)
    }

    /// Evaluate buying on `buy` (at its ask) and selling on `sell`
    /// (at its bid)
    fn check_pair(&self, buy: &PriceFeed, sell: &PriceFeed) {
        let price_diff = sell.bid_price - buy.ask_price;
        if price_diff <= 0.0 {
            return;
        }

        let profit_rate = price_diff / buy.ask_price;
        if profit_rate < self.config.min_profit_rate {
            return;
        }

        let buy_fee = self.config.fees.taker_fee(buy.venue.as_str(), buy.ask_price);
        let sell_fee = self.config.fees.taker_fee(sell.venue.as_str(), sell.bid_price);
        let total_fee_rate = (buy_fee + sell_fee) / buy.ask_price;

        let net_profit_rate = profit_rate - total_fee_rate;
        if net_profit_rate < self.config.min_profit_rate {
            return;
        }

        let mut max_quantity = buy.ask_quantity.min(sell.bid_quantity);
        if max_quantity * buy.ask_price > self.config.max_position_size {
            max_quantity = self.config.max_position_size / buy.ask_price;
        }

        let net_profit = max_quantity * price_diff - max_quantity * (buy_fee + sell_fee);
        if net_profit < self.config.min_profit_amount {
            return;
        }

        let detected_at_ns = monotonic_nanos();
        let mut id = FixedStr::<64>::new();
        let _ = write!(
            id,
            "{}_{}_{}_{}",
            buy.symbol, buy.venue, sell.venue, detected_at_ns
        );

        let opportunity = ArbitrageOpportunity {
            id,
            symbol: buy.symbol,
            buy_venue: buy.venue,
            sell_venue: sell.venue,
            buy_price: buy.ask_price,
            sell_price: sell.bid_price,
            max_quantity,
            profit_rate: net_profit_rate,
            net_profit,
            detected_at_ns,
            valid_until_ns: detected_at_ns + self.config.opportunity_ttl_ns,
        };

        if self.opportunities.push(opportunity).is_ok() {
            self.detected_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Resolve (or create) the matrix row for `symbol`
    fn symbol_slot(&self, symbol: &str) -> Option<usize> {
        if let Some(idx) = self.symbol_index.get(symbol) {
            return (*idx < MAX_SYMBOLS).then_some(*idx);
        }

        let idx = *self
            .symbol_index
            .entry(symbol.to_string())
            .or_insert_with(|| self.symbol_count.fetch_add(1, Ordering::AcqRel));

        // Over the cap the entry stays as a tombstone so later
        // updates fail the lookup cheaply
        (idx < MAX_SYMBOLS).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector_with(config: ArbitrageConfig) -> ArbitrageDetector {
        let detector = ArbitrageDetector::new(config);
        detector.start();
        detector
    }

    fn scenario_config() -> ArbitrageConfig {
        ArbitrageConfig {
            min_profit_rate: 0.001,
            min_profit_amount: 0.1,
            max_position_size: 1_000.0,
            opportunity_ttl_ns: 500_000_000,
            fees: FeeSchedule::new()
                .with_venue("venue_a", 0.001, 0.001)
                .with_venue("venue_b", 0.001, 0.001),
        }
    }

    #[test]
    fn test_emits_profitable_pair_net_of_fees() {
        let detector = detector_with(scenario_config());

        detector.update_price_feed("venue_a", "BTCUSDT", 99.5, 1.0, 100.0, 1.0);
        detector.update_price_feed("venue_b", "BTCUSDT", 100.5, 1.0, 101.0, 1.0);

        detector.detect_opportunities();

        let opp = detector.next_opportunity().expect("expected one opportunity");
        assert_eq!(opp.buy_venue, "venue_a");
        assert_eq!(opp.sell_venue, "venue_b");
        assert_eq!(opp.symbol, "BTCUSDT");
        assert_eq!(opp.buy_price, 100.0);
        assert_eq!(opp.sell_price, 100.5);
        assert_eq!(opp.max_quantity, 1.0);

        // 0.5 gross minus taker fees 0.1 + 0.1005
        assert!((opp.net_profit - 0.2995).abs() < 1e-9);
        assert!(opp.profit_rate >= 0.001);
        assert!(opp.valid_until_ns == opp.detected_at_ns + 500_000_000);
        assert!(opp.id.as_str().starts_with("BTCUSDT_venue_a_venue_b_"));

        // Reverse direction is not profitable
        assert!(detector.next_opportunity().is_none());
        assert_eq!(detector.detected_count(), 1);
    }

    #[test]
    fn test_no_emission_on_negative_edge() {
        let detector = detector_with(scenario_config());

        // Sell bid below buy ask everywhere
        detector.update_price_feed("venue_a", "BTCUSDT", 99.0, 1.0, 100.0, 1.0);
        detector.update_price_feed("venue_b", "BTCUSDT", 99.5, 1.0, 100.5, 1.0);

        detector.detect_opportunities();
        assert!(detector.next_opportunity().is_none());
        assert_eq!(detector.detected_count(), 0);
    }

    #[test]
    fn test_fees_kill_thin_edges() {
        let mut config = scenario_config();
        config.fees = FeeSchedule::new()
            .with_venue("venue_a", 0.01, 0.01)
            .with_venue("venue_b", 0.01, 0.01);
        let detector = detector_with(config);

        // 0.5% gross edge, 2% round-trip fees
        detector.update_price_feed("venue_a", "BTCUSDT", 99.5, 1.0, 100.0, 1.0);
        detector.update_price_feed("venue_b", "BTCUSDT", 100.5, 1.0, 101.0, 1.0);

        detector.detect_opportunities();
        assert!(detector.next_opportunity().is_none());
    }

    #[test]
    fn test_quantity_capped_by_position_size() {
        let mut config = scenario_config();
        config.max_position_size = 50.0;
        let detector = detector_with(config);

        detector.update_price_feed("venue_a", "BTCUSDT", 99.5, 10.0, 100.0, 10.0);
        detector.update_price_feed("venue_b", "BTCUSDT", 102.0, 10.0, 102.5, 10.0);

        detector.detect_opportunities();
        let opp = detector.next_opportunity().expect("expected one opportunity");
        assert!((opp.max_quantity - 0.5).abs() < 1e-12); // 50 / 100.0
    }

    #[test]
    fn test_min_profit_amount_gate() {
        let mut config = scenario_config();
        config.min_profit_amount = 1_000.0;
        let detector = detector_with(config);

        detector.update_price_feed("venue_a", "BTCUSDT", 99.5, 1.0, 100.0, 1.0);
        detector.update_price_feed("venue_b", "BTCUSDT", 100.5, 1.0, 101.0, 1.0);

        detector.detect_opportunities();
        assert!(detector.next_opportunity().is_none());
    }

    #[test]
    fn test_single_venue_symbol_is_skipped() {
        let detector = detector_with(scenario_config());

        detector.update_price_feed("venue_a", "BTCUSDT", 99.5, 1.0, 100.0, 1.0);
        detector.detect_opportunities();

        assert!(detector.next_opportunity().is_none());
    }

    #[test]
    fn test_stopped_detector_does_not_scan() {
        let detector = ArbitrageDetector::new(scenario_config());

        detector.update_price_feed("venue_a", "BTCUSDT", 99.5, 1.0, 100.0, 1.0);
        detector.update_price_feed("venue_b", "BTCUSDT", 100.5, 1.0, 101.0, 1.0);

        detector.detect_opportunities();
        assert!(detector.next_opportunity().is_none());
    }

    #[test]
    fn test_updates_overwrite_in_place() {
        let detector = detector_with(scenario_config());

        detector.update_price_feed("venue_a", "BTCUSDT", 99.5, 1.0, 100.0, 1.0);
        detector.update_price_feed("venue_a", "BTCUSDT", 99.9, 2.0, 100.4, 2.0);
        assert_eq!(detector.processed_prices(), 2);

        // Still only one venue: nothing to pair against
        detector.detect_opportunities();
        assert!(detector.next_opportunity().is_none());
    }

    #[test]
    fn test_symbol_cap_drops_excess_symbols() {
        let detector = detector_with(scenario_config());

        for i in 0..(MAX_SYMBOLS + 5) {
            detector.update_price_feed("venue_a", &format!("SYM{i}"), 99.5, 1.0, 100.0, 1.0);
        }

        // Updates past the cap are dropped, not counted
        assert_eq!(detector.processed_prices(), MAX_SYMBOLS as u64);
    }

    #[test]
    fn test_venue_cap_within_symbol() {
        let detector = detector_with(scenario_config());

        for i in 0..(MAX_EXCHANGES + 3) {
            detector.update_price_feed(&format!("venue_{i}"), "BTCUSDT", 99.5, 1.0, 100.0, 1.0);
        }

        assert_eq!(detector.processed_prices(), MAX_EXCHANGES as u64);
    }
}
