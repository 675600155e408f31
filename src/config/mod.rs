mod env;
mod file_config;

pub use env::{risk_from_env, simulation_from_env, strategy_from_env};
pub use file_config::FileConfig;

use serde::Deserialize;

/// Execution-simulation knobs for paper trading
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Slippage volatility factor (0.0005 = 5bps)
    pub slippage_volatility: f64,
    pub commission_per_unit: f64,
    /// Proportional spread cost per fill
    pub spread_fraction: f64,
    /// Heartbeat/persistence interval in bars; 0 disables
    pub heartbeat_every: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            slippage_volatility: 0.0005,
            commission_per_unit: 0.0,
            spread_fraction: 0.0001,
            heartbeat_every: 10,
        }
    }
}
