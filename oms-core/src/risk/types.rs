//! Risk engine configuration

use serde::{Deserialize, Serialize};

/// Pre-trade risk limits
///
/// All monetary limits are quote-currency notionals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum absolute position value per symbol
    pub max_position_value: f64,

    /// Maximum notional value of a single order
    pub max_order_value: f64,

    /// Daily loss limit; checks fail once daily PnL drops below its
    /// negation
    pub daily_loss_limit: f64,

    /// Maximum number of simultaneously open orders
    pub max_open_orders: i64,

    /// Maximum leverage (informational; enforced by the venues)
    pub max_leverage: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_value: 100_000.0,
            max_order_value: 10_000.0,
            daily_loss_limit: 5_000.0,
            max_open_orders: 100,
            max_leverage: 10.0,
        }
    }
}
