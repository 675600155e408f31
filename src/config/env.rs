//! Environment-variable configuration parsing.
//!
//! Every knob has a default matching the shipped strategy parameters, so a
//! bare environment runs the reference setup. `.env` loading happens in the
//! binary before any of these are read.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::env;
use std::str::FromStr;

use crate::application::strategies::BreakoutStrategy;
use crate::config::SimulationSettings;
use crate::domain::risk::RiskConfig;

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

pub fn risk_from_env() -> RiskConfig {
    let defaults = RiskConfig::default();
    RiskConfig {
        base_risk_fraction: parse_env("BASE_RISK_FRACTION", defaults.base_risk_fraction),
        max_drawdown_fraction: parse_env("MAX_DRAWDOWN_FRACTION", defaults.max_drawdown_fraction),
        daily_loss_limit: env::var("DAILY_LOSS_LIMIT")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .and_then(Decimal::from_f64)
            .unwrap_or(defaults.daily_loss_limit),
        soft_stop_fraction: parse_env("SOFT_STOP_FRACTION", defaults.soft_stop_fraction),
        size_after_one_loss: parse_env("SIZE_AFTER_ONE_LOSS", defaults.size_after_one_loss),
        size_in_recovery: parse_env("SIZE_IN_RECOVERY", defaults.size_in_recovery),
        recovery_trigger_losses: parse_env(
            "RECOVERY_TRIGGER_LOSSES",
            defaults.recovery_trigger_losses,
        ),
        recovery_duration_trades: parse_env(
            "RECOVERY_DURATION_TRADES",
            defaults.recovery_duration_trades,
        ),
        max_concurrent_trades: parse_env("MAX_CONCURRENT_TRADES", defaults.max_concurrent_trades),
    }
}

pub fn strategy_from_env() -> BreakoutStrategy {
    let defaults = BreakoutStrategy::default();
    BreakoutStrategy {
        breakout_length: parse_env("BREAKOUT_LENGTH", defaults.breakout_length),
        atr_stop_multiplier: parse_env("ATR_STOP_MULTIPLIER", defaults.atr_stop_multiplier),
        atr_tp_multiplier: parse_env("ATR_TP_MULTIPLIER", defaults.atr_tp_multiplier),
        volatility_filter: parse_env("VOLATILITY_FILTER", defaults.volatility_filter),
        trend_filter: parse_env("TREND_FILTER", defaults.trend_filter),
        trend_period: parse_env("TREND_PERIOD", defaults.trend_period),
    }
}

pub fn simulation_from_env() -> SimulationSettings {
    let defaults = SimulationSettings::default();
    SimulationSettings {
        slippage_volatility: parse_env("SLIPPAGE_VOLATILITY", defaults.slippage_volatility),
        commission_per_unit: parse_env("COMMISSION_PER_UNIT", defaults.commission_per_unit),
        spread_fraction: parse_env("SPREAD_FRACTION", defaults.spread_fraction),
        heartbeat_every: parse_env("HEARTBEAT_EVERY", defaults.heartbeat_every),
    }
}
