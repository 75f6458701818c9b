//! Market-maker quote engine
//!
//! Computes a dynamic spread from rolling volatility and inventory
//! skew, then emits multi-level bid/ask quotes around the mid price.
//! Market-data and position updates publish through sequence-locked
//! snapshots; the quote-generation thread reads coherent copies and
//! writes quotes to an outbound SPSC ring drained by the transport
//! layer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use oms_core::core::{monotonic_nanos, FixedStr, RingBuffer, Side, Versioned};

use crate::volatility::RollingVolatility;

/// Quote batch cap per generation tick
pub const MAX_QUOTES: usize = 20;
/// Outbound quote ring size
pub const QUOTE_BUFFER_SIZE: usize = 1024;
/// Mid prices retained for volatility estimation
pub const PRICE_HISTORY_SIZE: usize = 1000;

/// A single quote at one level of the ladder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MMQuote {
    pub symbol: FixedStr<16>,
    pub venue: FixedStr<16>,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub level: u32,
    pub timestamp_ns: u64,
}

/// Coherent top-of-book state for quote calculations
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarketSnapshot {
    pub bid_price: f64,
    pub ask_price: f64,
    pub mid_price: f64,
    pub last_price: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub volatility: f64,
    pub timestamp_ns: u64,
}

/// Coherent inventory state for quote calculations
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InventorySnapshot {
    pub position: f64,
    pub avg_price: f64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
    pub position_value: f64,
    pub timestamp_ns: u64,
}

/// Quoting parameters and risk limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMakerConfig {
    /// Symbol being quoted
    pub symbol: String,
    /// Venue the quotes target
    pub venue: String,

    /// Base half-structure spread in basis points
    pub base_spread_bps: f64,
    pub min_spread_bps: f64,
    pub max_spread_bps: f64,

    /// Size per quote level
    pub quote_size: f64,
    /// Number of levels per side
    pub quote_levels: u32,
    /// Additional spread per level, in basis points
    pub level_spacing_bps: f64,

    /// Maximum absolute position
    pub max_inventory: f64,
    /// Inventory skew weight
    pub inventory_skew: f64,
    /// Spread sensitivity to volatility
    pub volatility_factor: f64,

    // Risk limits
    pub max_position_value: f64,
    pub stop_loss_percent: f64,
    pub max_daily_loss: f64,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            venue: "binance_spot".to_string(),
            base_spread_bps: 10.0,
            min_spread_bps: 5.0,
            max_spread_bps: 50.0,
            quote_size: 1.0,
            quote_levels: 3,
            level_spacing_bps: 2.0,
            max_inventory: 100.0,
            inventory_skew: 0.5,
            volatility_factor: 1.0,
            max_position_value: 100_000.0,
            stop_loss_percent: 0.02,
            max_daily_loss: 1_000.0,
        }
    }
}

/// Quote generation engine for one (symbol, venue)
pub struct MarketMakerEngine {
    config: MarketMakerConfig,
    symbol_tag: FixedStr<16>,
    venue_tag: FixedStr<16>,

    market: Versioned<MarketSnapshot>,
    inventory: Versioned<InventorySnapshot>,

    history: Mutex<RollingVolatility<PRICE_HISTORY_SIZE>>,

    quotes: RingBuffer<MMQuote>,

    quotes_generated: AtomicU64,
    market_updates: AtomicU64,

    running: AtomicBool,
}

impl MarketMakerEngine {
    pub fn new(config: MarketMakerConfig) -> Self {
        let symbol_tag = FixedStr::from_str(&config.symbol);
        let venue_tag = FixedStr::from_str(&config.venue);

        Self {
            config,
            symbol_tag,
            venue_tag,
            market: Versioned::new(MarketSnapshot::default()),
            inventory: Versioned::new(InventorySnapshot::default()),
            history: Mutex::new(RollingVolatility::new()),
            quotes: RingBuffer::new(QUOTE_BUFFER_SIZE),
            quotes_generated: AtomicU64::new(0),
            market_updates: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
        info!(symbol = %self.config.symbol, "Market maker started");
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        info!(symbol = %self.config.symbol, "Market maker stopped");
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Publish a new market snapshot (single market-data writer)
    ///
    /// Appends the mid to the price history and recomputes rolling
    /// volatility before publication.
    pub fn update_market_data(
        &self,
        bid_price: f64,
        bid_size: f64,
        ask_price: f64,
        ask_size: f64,
        last_price: f64,
    ) {
        let mid_price = (bid_price + ask_price) / 2.0;

        let volatility = {
            let mut history = self.history.lock();
            history.record(mid_price);
            history.calculate()
        };

        self.market.write(MarketSnapshot {
            bid_price,
            ask_price,
            mid_price,
            last_price,
            bid_size,
            ask_size,
            volatility,
            timestamp_ns: monotonic_nanos(),
        });
        self.market_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish a new inventory snapshot (single position writer)
    pub fn update_position(&self, position: f64, avg_price: f64) {
        let market = self.market.read();
        let unrealized_pnl = if market.mid_price > 0.0 {
            position * (market.mid_price - avg_price)
        } else {
            0.0
        };

        self.inventory.write(InventorySnapshot {
            position,
            avg_price,
            unrealized_pnl,
            realized_pnl: 0.0,
            position_value: position * avg_price,
            timestamp_ns: monotonic_nanos(),
        });
    }

    /// Emit one ladder of quotes into the outbound ring
    ///
    /// Requires a running engine and a non-trivial market snapshot;
    /// the batch is capped at [`MAX_QUOTES`]. Ring overflow drops the
    /// quote silently.
    pub fn generate_quotes(&self) {
        if !self.is_running() {
            return;
        }

        let market = self.market.read();
        let inventory = self.inventory.read();

        if market.mid_price <= 0.0 || market.bid_price <= 0.0 || market.ask_price <= 0.0 {
            return;
        }

        let spread = self.calculate_spread(&market, &inventory);
        let mut emitted = 0usize;

        for level in 0..self.config.quote_levels {
            for side in [Side::Buy, Side::Sell] {
                if emitted >= MAX_QUOTES {
                    return;
                }
                emitted += 1;

                let quote = self.quote_level(side, market.mid_price, spread, level, &inventory);
                if self.quotes.push(quote).is_ok() {
                    self.quotes_generated.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Pop the next queued quote (single consumer)
    pub fn next_quote(&self) -> Option<MMQuote> {
        self.quotes.pop()
    }

    pub fn quotes_generated(&self) -> u64 {
        self.quotes_generated.load(Ordering::Relaxed)
    }

    pub fn market_updates(&self) -> u64 {
        self.market_updates.load(Ordering::Relaxed)
    }

    /// Completed market snapshot publications
    pub fn market_version(&self) -> u64 {
        self.market.version()
    }

    /// Completed inventory snapshot publications
    pub fn inventory_version(&self) -> u64 {
        self.inventory.version()
    }

    pub fn market_snapshot(&self) -> MarketSnapshot {
        self.market.read()
    }

    pub fn inventory_snapshot(&self) -> InventorySnapshot {
        self.inventory.read()
    }

    /// Base spread widened by volatility and inventory pressure,
    /// clamped to the configured band
    fn calculate_spread(&self, market: &MarketSnapshot, inventory: &InventorySnapshot) -> f64 {
        let base_spread = self.config.base_spread_bps / 10_000.0;

        let vol_factor = 1.0 + market.volatility * self.config.volatility_factor;

        let inventory_ratio = inventory.position / self.config.max_inventory;
        let skew_factor = 1.0 + self.config.inventory_skew * inventory_ratio.abs();

        let spread = base_spread * vol_factor * skew_factor;

        let min_spread = self.config.min_spread_bps / 10_000.0;
        let max_spread = self.config.max_spread_bps / 10_000.0;
        spread.min(max_spread).max(min_spread)
    }

    fn quote_level(
        &self,
        side: Side,
        mid_price: f64,
        spread: f64,
        level: u32,
        inventory: &InventorySnapshot,
    ) -> MMQuote {
        let level_spread = spread * (1.0 + level as f64 * self.config.level_spacing_bps / 10_000.0);

        let mut price = match side {
            Side::Buy => mid_price * (1.0 - level_spread),
            Side::Sell => mid_price * (1.0 + level_spread),
        };

        // Skew the ladder toward mean reversion: long inventory makes
        // asks more aggressive and bids less, short inventory mirrors
        let inventory_ratio = inventory.position / self.config.max_inventory;
        let half_skew = inventory_ratio.abs() * self.config.inventory_skew * 0.5;

        if inventory_ratio > 0.0 {
            match side {
                Side::Sell => price *= 1.0 - half_skew,
                Side::Buy => price *= 1.0 + half_skew,
            }
        } else if inventory_ratio < 0.0 {
            match side {
                Side::Buy => price *= 1.0 + half_skew,
                Side::Sell => price *= 1.0 - half_skew,
            }
        }

        MMQuote {
            symbol: self.symbol_tag,
            venue: self.venue_tag,
            side,
            price,
            quantity: self.config.quote_size,
            level,
            timestamp_ns: monotonic_nanos(),
        }
    }
}
