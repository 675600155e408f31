use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::domain::trading::types::TradeSide;

/// Trait defining a slippage simulation model.
pub trait SlippageModel: Send + Sync {
    /// Effective fill price for an order at the theoretical `price`.
    ///
    /// `is_entry` distinguishes opening from closing fills: a long entry and
    /// a short exit are buys, the other two combinations are sells.
    fn execution_price(&self, price: Decimal, side: TradeSide, is_entry: bool) -> Decimal;
}

/// Volatility-based slippage model.
///
/// Random variation within +/- the volatility factor, shifted by a fixed
/// impact cost so fills land mostly on the adverse side.
#[derive(Debug, Clone)]
pub struct VolatilitySlippage {
    /// Slippage volatility factor (e.g. 0.0005 for 5bps)
    volatility_factor: f64,
}

impl VolatilitySlippage {
    pub fn new(volatility_factor: f64) -> Self {
        Self { volatility_factor }
    }
}

impl SlippageModel for VolatilitySlippage {
    fn execution_price(&self, price: Decimal, side: TradeSide, is_entry: bool) -> Decimal {
        let mut rng = rand::rng();

        let noise = if self.volatility_factor > 0.0 {
            rng.random_range(-self.volatility_factor..=self.volatility_factor)
        } else {
            0.0
        };
        let impact = self.volatility_factor * 0.2;

        let is_buy = matches!(
            (side, is_entry),
            (TradeSide::Long, true) | (TradeSide::Short, false)
        );
        // Buys fill higher, sells lower
        let pct_change = if is_buy { impact + noise } else { -(impact + noise) };

        let new_price = price.to_f64().unwrap_or(0.0) * (1.0 + pct_change);
        Decimal::from_f64(new_price).unwrap_or(price)
    }
}

/// No slippage (perfect execution).
#[derive(Debug, Clone)]
pub struct ZeroSlippage;

impl SlippageModel for ZeroSlippage {
    fn execution_price(&self, price: Decimal, _side: TradeSide, _is_entry: bool) -> Decimal {
        price
    }
}
