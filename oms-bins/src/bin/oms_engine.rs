//! OMS core engine host
//!
//! Constructs the four subsystems, starts them, runs the periodic
//! stats loop, and shuts everything down in reverse order on
//! SIGINT/SIGTERM. Transport (market data in, orders/quotes out) is
//! the connectors' job; `--demo` runs a synthetic feed instead so the
//! engine can be exercised standalone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use oms_bins::common::{init_logging, print_stats, CommonArgs};
use oms_core::core::{epoch_micros, MarketData, Venue};
use oms_core::engine::{OrderManager, OrderManagerConfig};
use oms_core::risk::{RiskConfig, RiskEngine};
use oms_strategies::{
    ArbitrageConfig, ArbitrageDetector, FeeSchedule, MarketMakerConfig, MarketMakerEngine,
};

const STATS_INTERVAL: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    let args = CommonArgs::parse();
    init_logging(&args)?;

    tracing::info!("Multi-exchange OMS core engine starting");
    tracing::info!("CPU cores available: {}", oms_core::perf::num_cores());

    let risk_engine = Arc::new(RiskEngine::new(RiskConfig {
        max_position_value: 1_000_000.0,
        max_order_value: 100_000.0,
        daily_loss_limit: 50_000.0,
        max_open_orders: 100,
        max_leverage: 10.0,
    }));

    let order_manager = Arc::new(OrderManager::new(OrderManagerConfig {
        cpu_cores: args.cpu_cores.clone(),
        ..OrderManagerConfig::default()
    }));

    let detector = Arc::new(ArbitrageDetector::new(ArbitrageConfig {
        min_profit_rate: 0.001,
        min_profit_amount: 10.0,
        max_position_size: 100_000.0,
        opportunity_ttl_ns: 500_000_000,
        fees: FeeSchedule::new()
            .with_venue("binance_spot", 0.001, 0.001)
            .with_venue("okx_spot", 0.0008, 0.0008)
            .with_venue("bybit_spot", 0.001, 0.001),
    }));

    let maker = Arc::new(MarketMakerEngine::new(MarketMakerConfig {
        symbol: args.symbol.clone(),
        venue: args.venue.clone(),
        base_spread_bps: 10.0,
        quote_size: 0.1,
        max_inventory: 1.0,
        quote_levels: 3,
        ..MarketMakerConfig::default()
    }));

    // Start order: leaves first, per dependency order
    risk_engine.start();
    order_manager.start()?;
    detector.start();
    maker.start();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            tracing::info!("Shutdown signal received");
            running.store(false, Ordering::Release);
        })?;
    }

    // Dedicated scan threads for the strategies
    let detector_thread = {
        let detector = Arc::clone(&detector);
        thread::spawn(move || {
            while detector.is_running() {
                detector.detect_opportunities();
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    let maker_thread = {
        let maker = Arc::clone(&maker);
        thread::spawn(move || {
            while maker.is_running() {
                maker.generate_quotes();
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    // Outbound drain: the transport layer's stand-in
    let drain_thread = {
        let detector = Arc::clone(&detector);
        let maker = Arc::clone(&maker);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            while running.load(Ordering::Acquire) {
                let mut idle = true;
                if let Some(opportunity) = detector.next_opportunity() {
                    tracing::debug!(
                        id = %opportunity.id,
                        net_profit = opportunity.net_profit,
                        "opportunity"
                    );
                    idle = false;
                }
                if maker.next_quote().is_some() {
                    idle = false;
                }
                if idle {
                    thread::sleep(Duration::from_millis(1));
                }
            }
        })
    };

    let feed_thread = args.demo.then(|| {
        let detector = Arc::clone(&detector);
        let maker = Arc::clone(&maker);
        let running = Arc::clone(&running);
        let symbol = args.symbol.clone();
        thread::spawn(move || synthetic_feed(&detector, &maker, &running, &symbol))
    });

    tracing::info!("OMS core engine running (Ctrl+C to stop)");

    let mut last_stats = Instant::now();
    while running.load(Ordering::Acquire) {
        if last_stats.elapsed() >= STATS_INTERVAL {
            print_stats(&order_manager.stats(), &risk_engine, &detector, &maker);
            last_stats = Instant::now();
        }
        thread::sleep(Duration::from_millis(100));
    }

    // Shutdown in reverse order
    tracing::info!("Shutting down components");
    maker.stop();
    detector.stop();
    order_manager.stop();
    risk_engine.stop();

    maker_thread.join().ok();
    detector_thread.join().ok();
    drain_thread.join().ok();
    if let Some(handle) = feed_thread {
        handle.join().ok();
    }

    print_stats(&order_manager.stats(), &risk_engine, &detector, &maker);
    tracing::info!("OMS core engine stopped");
    Ok(())
}

/// Synthetic two-venue feed with a slow drift and an occasional
/// dislocation wide enough to trip the arbitrage detector
fn synthetic_feed(
    detector: &ArbitrageDetector,
    maker: &MarketMakerEngine,
    running: &AtomicBool,
    symbol: &str,
) {
    let mut tick = 0u64;
    let base_price = 50_000.0;

    while running.load(Ordering::Acquire) {
        tick += 1;
        let drift = ((tick % 200) as f64 - 100.0) * 0.5;
        let bid = base_price + drift;

        // Every ~50 ticks the second venue dislocates upward
        let dislocation = if tick % 50 == 0 { 120.0 } else { 2.0 };

        let primary = MarketData {
            venue: Venue::BinanceSpot,
            bid_price: bid,
            bid_quantity: 1.0,
            ask_price: bid + 10.0,
            ask_quantity: 1.0,
            last_price: bid + 5.0,
            timestamp: epoch_micros(),
        };
        let secondary = MarketData {
            venue: Venue::OkxSpot,
            bid_price: bid + dislocation,
            ask_price: bid + 10.0 + dislocation,
            ..primary
        };

        for data in [&primary, &secondary] {
            detector.update_price_feed(
                data.venue.as_str(),
                symbol,
                data.bid_price,
                data.bid_quantity,
                data.ask_price,
                data.ask_quantity,
            );
        }
        maker.update_market_data(
            primary.bid_price,
            primary.bid_quantity,
            primary.ask_price,
            primary.ask_quantity,
            primary.last_price,
        );

        thread::sleep(Duration::from_millis(10));
    }
}
