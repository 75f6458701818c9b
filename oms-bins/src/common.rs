//! Common utilities for the host binaries
//!
//! CLI parsing, logging setup and the stats printer shared by every
//! entry point.

use anyhow::Result;
use clap::Parser;

use oms_core::engine::StatsSnapshot;
use oms_core::risk::RiskEngine;
use oms_core::utils::LogFormat;
use oms_strategies::{ArbitrageDetector, MarketMakerEngine};

/// Common CLI arguments
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Symbol the market maker quotes
    #[arg(short, long, default_value = "BTCUSDT")]
    pub symbol: String,

    /// Venue the market maker quotes on
    #[arg(long, default_value = "binance_spot")]
    pub venue: String,

    /// CPU cores the dispatch worker may pin to (comma separated)
    #[arg(short = 'c', long, value_delimiter = ',', default_values_t = vec![2usize, 3])]
    pub cpu_cores: Vec<usize>,

    /// Feed the engines with synthetic market data
    #[arg(long)]
    pub demo: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Initialize tracing/logging
pub fn init_logging(args: &CommonArgs) -> Result<()> {
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    oms_core::utils::init_logger(&args.log_level, format)
}

/// Print the periodic stats block
pub fn print_stats(
    dispatch: &StatsSnapshot,
    risk: &RiskEngine,
    detector: &ArbitrageDetector,
    maker: &MarketMakerEngine,
) {
    tracing::info!("=== Performance Stats ===");
    tracing::info!(
        "Orders: {} processed, {} rejected (latency µs min/avg/max: {}/{:.1}/{})",
        dispatch.orders_processed,
        dispatch.orders_rejected,
        dispatch.min_latency_us,
        dispatch.average_latency_us(),
        dispatch.max_latency_us,
    );
    tracing::info!(
        "Risk checks: {} (avg latency: {:.2} µs)",
        risk.total_checks(),
        risk.average_latency_us(),
    );
    tracing::info!(
        "Arbitrage opportunities: {} (prices processed: {})",
        detector.detected_count(),
        detector.processed_prices(),
    );
    tracing::info!(
        "Market maker quotes: {} (market updates: {})",
        maker.quotes_generated(),
        maker.market_updates(),
    );
}
