use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::errors::RiskConfigError;

/// Risk management configuration, immutable for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fraction of balance risked per trade before the sizing multiplier
    pub base_risk_fraction: f64,
    /// Fraction of peak balance lost that permanently halts trading
    pub max_drawdown_fraction: f64,
    /// Absolute loss within one calendar day that freezes trading until the next day
    pub daily_loss_limit: Decimal,
    /// Fraction of peak balance lost that halts new entries, recoverable
    pub soft_stop_fraction: f64,
    /// Sizing multiplier after exactly one consecutive loss
    pub size_after_one_loss: f64,
    /// Sizing multiplier while the recovery cooldown is running
    pub size_in_recovery: f64,
    /// Consecutive-loss count at which recovery mode arms
    pub recovery_trigger_losses: usize,
    /// Number of trades recovery sizing persists once armed
    pub recovery_duration_trades: usize,
    /// Ceiling on simultaneously open positions
    pub max_concurrent_trades: usize,
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), RiskConfigError> {
        let fractions = [
            ("base_risk_fraction", self.base_risk_fraction),
            ("max_drawdown_fraction", self.max_drawdown_fraction),
            ("soft_stop_fraction", self.soft_stop_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(RiskConfigError::ValidationError(format!(
                    "Invalid {}: {}",
                    name, value
                )));
            }
        }

        let multipliers = [
            ("size_after_one_loss", self.size_after_one_loss),
            ("size_in_recovery", self.size_in_recovery),
        ];
        for (name, value) in multipliers {
            if !(value > 0.0 && value <= 1.0) {
                return Err(RiskConfigError::ValidationError(format!(
                    "Invalid {}: {} (must be in (0, 1])",
                    name, value
                )));
            }
        }

        if self.daily_loss_limit < Decimal::ZERO {
            return Err(RiskConfigError::ValidationError(format!(
                "Invalid daily_loss_limit: {}",
                self.daily_loss_limit
            )));
        }
        if self.recovery_trigger_losses < 1 {
            return Err(RiskConfigError::ValidationError(
                "recovery_trigger_losses must be >= 1".to_string(),
            ));
        }
        if self.max_concurrent_trades < 1 {
            return Err(RiskConfigError::ValidationError(
                "max_concurrent_trades must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_risk_fraction: 0.002,
            max_drawdown_fraction: 0.30,
            daily_loss_limit: dec!(600),
            soft_stop_fraction: 0.15,
            size_after_one_loss: 0.8,
            size_in_recovery: 0.5,
            recovery_trigger_losses: 2,
            recovery_duration_trades: 5,
            max_concurrent_trades: 2,
        }
    }
}
