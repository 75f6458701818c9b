//! Constant-time pre-trade risk checks
//!
//! Every check is O(1) over atomic scalars: no locks, no allocation,
//! no I/O. The latency budget is an average of 50µs per check over
//! 10k calls; in practice a check is a handful of atomic loads.
//!
//! Position state lives in a fixed table of [`MAX_SYMBOLS`] slots
//! addressed by symbol hash. Distinct symbols that hash to the same
//! slot alias each other — acceptable for the symbol universes this
//! engine is deployed on, and documented here so nobody is surprised.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, info};

use crate::core::types::{Order, Side};
use crate::core::AtomicF64;

use super::types::RiskConfig;

/// Fixed position-table size
pub const MAX_SYMBOLS: usize = 1000;

/// One open-addressed position slot
///
/// Updated by the fill pipeline (single writer per symbol), read by
/// concurrent checkers. Aligned to a cache line so neighbouring
/// symbols don't false-share.
#[repr(C, align(64))]
#[derive(Default)]
struct PositionSlot {
    quantity: AtomicF64,
    value: AtomicF64,
    avg_price: AtomicF64,
}

/// Pre-trade risk engine
pub struct RiskEngine {
    config: RiskConfig,

    positions: Box<[PositionSlot]>,

    daily_pnl: AtomicF64,
    open_orders: AtomicI64,

    total_checks: AtomicU64,
    total_latency_ns: AtomicU64,

    running: AtomicBool,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        let positions = (0..MAX_SYMBOLS)
            .map(|_| PositionSlot::default())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            config,
            positions,
            daily_pnl: AtomicF64::new(0.0),
            open_orders: AtomicI64::new(0),
            total_checks: AtomicU64::new(0),
            total_latency_ns: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
        info!("Risk engine started");
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        info!("Risk engine stopped");
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run the four admission gates against `order`
    ///
    /// Gates apply in sequence and the first failure wins: order
    /// value, prospective position value, daily PnL floor, open-order
    /// count. Latency is recorded whether or not the order passes.
    pub fn check_order(&self, order: &Order) -> bool {
        let start = Instant::now();

        if !self.is_running() {
            return false;
        }

        let mut passed = true;

        // 1. Order value limit
        let order_value = order.price * order.quantity;
        if order_value > self.config.max_order_value {
            debug!(order_value, "risk: order value exceeds limit");
            passed = false;
        }

        // 2. Prospective position value limit
        if passed {
            let slot = self.slot(&order.symbol);
            let signed = match order.side {
                Side::Buy => order_value,
                Side::Sell => -order_value,
            };
            let new_position_value = slot.value.load(Ordering::Acquire) + signed;

            if new_position_value.abs() > self.config.max_position_value {
                debug!(new_position_value, "risk: position value would exceed limit");
                passed = false;
            }
        }

        // 3. Daily loss limit
        if passed && self.daily_pnl.load(Ordering::Acquire) < -self.config.daily_loss_limit {
            debug!("risk: daily loss limit exceeded");
            passed = false;
        }

        // 4. Open orders limit
        if passed && self.open_orders.load(Ordering::Acquire) >= self.config.max_open_orders {
            debug!("risk: open orders limit exceeded");
            passed = false;
        }

        let elapsed = start.elapsed().as_nanos() as u64;
        self.total_checks.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns.fetch_add(elapsed, Ordering::Relaxed);

        passed
    }

    /// Apply a fill to the position table
    ///
    /// Realized PnL accrues only when the fill reduces or flips the
    /// position (old quantity and delta have opposite signs), over
    /// the overlapping quantity. The average price is re-weighted
    /// over the new quantity whenever old and new quantity share a
    /// sign, reset to the fill price on an open or a flip, and
    /// retained when the position goes flat.
    ///
    /// Single writer per symbol: the fill pipeline owns this path.
    pub fn update_position(&self, symbol: &str, quantity_delta: f64, fill_price: f64) {
        let slot = self.slot(symbol);

        let old_quantity = slot.quantity.load(Ordering::Acquire);
        let new_quantity = old_quantity + quantity_delta;

        if old_quantity * quantity_delta < 0.0 {
            let avg_price = slot.avg_price.load(Ordering::Acquire);
            let realized = realized_pnl(old_quantity, avg_price, quantity_delta, fill_price);
            self.daily_pnl.fetch_add(realized, Ordering::AcqRel);
        }

        slot.quantity.store(new_quantity, Ordering::Release);
        slot.value.store(new_quantity * fill_price, Ordering::Release);

        if new_quantity != 0.0 {
            if old_quantity * new_quantity > 0.0 {
                // Same sign: re-weight the basis over the new quantity
                let old_avg = slot.avg_price.load(Ordering::Acquire);
                let weighted =
                    (old_quantity * old_avg + quantity_delta * fill_price) / new_quantity;
                slot.avg_price.store(weighted, Ordering::Release);
            } else {
                // Opened or flipped through zero: basis is the fill
                slot.avg_price.store(fill_price, Ordering::Release);
            }
        }
    }

    /// Adjust the open-order count; callers pair +1 on submission
    /// with -1 on terminal transitions
    #[inline]
    pub fn update_order_count(&self, delta: i64) {
        self.open_orders.fetch_add(delta, Ordering::AcqRel);
    }

    /// Sum of absolute position values across all slots
    pub fn total_exposure(&self) -> f64 {
        self.positions
            .iter()
            .map(|slot| slot.value.load(Ordering::Acquire).abs())
            .sum()
    }

    pub fn daily_pnl(&self) -> f64 {
        self.daily_pnl.load(Ordering::Acquire)
    }

    pub fn reset_daily_pnl(&self) {
        self.daily_pnl.store(0.0, Ordering::Release);
        info!("Daily PnL reset");
    }

    pub fn open_orders(&self) -> i64 {
        self.open_orders.load(Ordering::Acquire)
    }

    pub fn total_checks(&self) -> u64 {
        self.total_checks.load(Ordering::Acquire)
    }

    /// Average check latency in microseconds
    pub fn average_latency_us(&self) -> f64 {
        let checks = self.total_checks.load(Ordering::Acquire);
        if checks == 0 {
            return 0.0;
        }
        self.total_latency_ns.load(Ordering::Acquire) as f64 / checks as f64 / 1_000.0
    }

    #[inline(always)]
    fn slot(&self, symbol: &str) -> &PositionSlot {
        &self.positions[hash_symbol(symbol) % MAX_SYMBOLS]
    }
}

/// 31-multiplier byte hash, same family as Java's `String::hashCode`
#[inline(always)]
fn hash_symbol(symbol: &str) -> usize {
    let mut hash = 0usize;
    for &byte in symbol.as_bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(byte as usize);
    }
    hash
}

/// PnL over the overlapping quantity of a reducing fill
#[inline]
fn realized_pnl(old_quantity: f64, avg_price: f64, quantity_delta: f64, fill_price: f64) -> f64 {
    let closed = old_quantity.abs().min(quantity_delta.abs());
    if old_quantity > 0.0 {
        closed * (fill_price - avg_price)
    } else {
        closed * (avg_price - fill_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OrderStatus, OrderType, TimeInForce, Venue};

    fn order(symbol: &str, side: Side, price: f64, quantity: f64) -> Order {
        Order {
            id: 0,
            client_order_id: "test".to_string(),
            venue: Venue::BinanceSpot,
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Limit,
            price,
            quantity,
            executed_quantity: 0.0,
            status: OrderStatus::New,
            time_in_force: TimeInForce::Gtc,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn engine_with(config: RiskConfig) -> RiskEngine {
        let engine = RiskEngine::new(config);
        engine.start();
        engine
    }

    #[test]
    fn test_rejects_when_stopped() {
        let engine = RiskEngine::new(RiskConfig::default());
        assert!(!engine.check_order(&order("BTCUSDT", Side::Buy, 100.0, 1.0)));
    }

    #[test]
    fn test_basic_admission() {
        let engine = engine_with(RiskConfig {
            max_order_value: 10_000.0,
            max_position_value: 50_000.0,
            daily_loss_limit: 5_000.0,
            max_open_orders: 10,
            max_leverage: 10.0,
        });

        // 40_000 * 0.1 = 4_000, under the limit
        assert!(engine.check_order(&order("BTCUSDT", Side::Buy, 40_000.0, 0.1)));

        // 40_000 * 0.5 = 20_000, over the limit
        assert!(!engine.check_order(&order("BTCUSDT", Side::Buy, 40_000.0, 0.5)));
    }

    #[test]
    fn test_position_value_gate() {
        let engine = engine_with(RiskConfig {
            max_order_value: 100_000.0,
            max_position_value: 10_000.0,
            ..RiskConfig::default()
        });

        // Build a long position worth 8_000
        engine.update_position("ETHUSDT", 4.0, 2_000.0);

        // +4_000 would take the slot to 12_000
        assert!(!engine.check_order(&order("ETHUSDT", Side::Buy, 2_000.0, 2.0)));

        // Selling reduces the prospective value; passes
        assert!(engine.check_order(&order("ETHUSDT", Side::Sell, 2_000.0, 2.0)));
    }

    #[test]
    fn test_daily_loss_gate() {
        let engine = engine_with(RiskConfig {
            daily_loss_limit: 100.0,
            ..RiskConfig::default()
        });

        // Lose 150 by buying at 100 and selling at 85 ten times over
        engine.update_position("X", 10.0, 100.0);
        engine.update_position("X", -10.0, 85.0);
        assert!((engine.daily_pnl() - -150.0).abs() < 1e-9);

        assert!(!engine.check_order(&order("Y", Side::Buy, 10.0, 1.0)));

        engine.reset_daily_pnl();
        assert!(engine.check_order(&order("Y", Side::Buy, 10.0, 1.0)));
    }

    #[test]
    fn test_open_orders_gate() {
        let engine = engine_with(RiskConfig {
            max_open_orders: 2,
            ..RiskConfig::default()
        });

        assert!(engine.check_order(&order("BTCUSDT", Side::Buy, 10.0, 1.0)));
        engine.update_order_count(1);
        engine.update_order_count(1);

        assert!(!engine.check_order(&order("BTCUSDT", Side::Buy, 10.0, 1.0)));

        engine.update_order_count(-1);
        assert!(engine.check_order(&order("BTCUSDT", Side::Buy, 10.0, 1.0)));
        assert_eq!(engine.open_orders(), 1);
    }

    #[test]
    fn test_realized_pnl_on_reduction() {
        let engine = engine_with(RiskConfig::default());

        engine.update_position("BTCUSDT", 1.0, 100.0);
        engine.update_position("BTCUSDT", -1.0, 110.0);

        assert!((engine.daily_pnl() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_realized_pnl_short_cover() {
        let engine = engine_with(RiskConfig::default());

        engine.update_position("BTCUSDT", -2.0, 100.0);
        engine.update_position("BTCUSDT", 2.0, 90.0);

        // Short 2 at 100, covered at 90: +20
        assert!((engine.daily_pnl() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_reduction_overlap_only() {
        let engine = engine_with(RiskConfig::default());

        engine.update_position("BTCUSDT", 2.0, 100.0);
        engine.update_position("BTCUSDT", -0.5, 120.0);

        // Only the 0.5 overlap realizes: 0.5 * 20
        assert!((engine.daily_pnl() - 10.0).abs() < 1e-9);

        // Same-sign quantities re-weight the basis over the remainder:
        // (2.0 * 100 - 0.5 * 120) / 1.5
        let avg = engine.slot("BTCUSDT").avg_price.load(Ordering::Acquire);
        assert!((avg - 140.0 / 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_flip_realizes_overlap_and_resets_basis() {
        let engine = engine_with(RiskConfig::default());

        engine.update_position("BTCUSDT", 1.0, 100.0);
        // Sell 3 at 110: closes 1 (PnL +10), opens short 2 at 110
        engine.update_position("BTCUSDT", -3.0, 110.0);

        assert!((engine.daily_pnl() - 10.0).abs() < 1e-9);

        // Cover the short at 100: 2 * (110 - 100) = +20
        engine.update_position("BTCUSDT", 2.0, 100.0);
        assert!((engine.daily_pnl() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_average_when_adding() {
        let engine = engine_with(RiskConfig::default());

        engine.update_position("BTCUSDT", 1.0, 100.0);
        engine.update_position("BTCUSDT", 1.0, 200.0);
        // Basis is now 150; selling both at 150 realizes zero
        engine.update_position("BTCUSDT", -2.0, 150.0);

        assert!(engine.daily_pnl().abs() < 1e-9);
    }

    #[test]
    fn test_total_exposure() {
        let engine = engine_with(RiskConfig::default());

        engine.update_position("AAA", 1.0, 1_000.0);
        engine.update_position("BBB", -2.0, 500.0);

        assert!((engine.total_exposure() - 2_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_check_latency_budget() {
        let engine = engine_with(RiskConfig::default());
        let o = order("BTCUSDT", Side::Buy, 40_000.0, 0.01);

        const CHECKS: u64 = 10_000;
        for _ in 0..CHECKS {
            engine.check_order(&o);
        }

        assert_eq!(engine.total_checks(), CHECKS);
        assert!(
            engine.average_latency_us() < 50.0,
            "average check latency {}µs exceeds 50µs budget",
            engine.average_latency_us()
        );
    }
}
