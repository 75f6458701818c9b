//! Tracing setup for the engine host
//!
//! Subsystems emit lifecycle transitions and rejection events only;
//! hot paths stay silent. The host picks the sink once at startup.

use anyhow::{Context, Result};
use tracing_subscriber::fmt::time::uptime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output shape for engine logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines, stamped with process uptime and the
    /// engine thread name (`oms-dispatch`, scan threads, ...)
    Text,
    /// One JSON object per event, for log shippers
    Json,
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides `default_level`. A second call returns an
/// error instead of panicking, so tests may race to initialize.
pub fn init_logger(default_level: &str, format: LogFormat) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_new(default_level),
    }
    .context("invalid log filter directive")?;

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_timer(uptime()).with_thread_names(true))
            .try_init(),
    }
    .map_err(|err| anyhow::anyhow!("logger already installed: {err}"))
}
