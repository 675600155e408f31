use rust_decimal::Decimal;
use std::fmt::Debug;

/// Trait defining a transaction cost model for simulated fills.
pub trait FeeModel: Debug + Send + Sync {
    /// Cost of executing `quantity` units at `price`, in account currency.
    fn calculate_cost(&self, quantity: Decimal, price: Decimal) -> Decimal;

    fn description(&self) -> String;
}

/// Flat per-unit commission plus a proportional spread cost.
#[derive(Debug, Clone)]
pub struct ConstantFeeModel {
    pub commission_per_unit: Decimal,
    pub spread_fraction: Decimal,
}

impl ConstantFeeModel {
    pub fn new(commission_per_unit: Decimal, spread_fraction: Decimal) -> Self {
        Self {
            commission_per_unit,
            spread_fraction,
        }
    }
}

impl FeeModel for ConstantFeeModel {
    fn calculate_cost(&self, quantity: Decimal, price: Decimal) -> Decimal {
        let trade_value = quantity * price;
        quantity * self.commission_per_unit + trade_value * self.spread_fraction
    }

    fn description(&self) -> String {
        format!(
            "Constant Fee Model (Com: {}/unit, Spread: {}%)",
            self.commission_per_unit,
            self.spread_fraction * Decimal::ONE_HUNDRED
        )
    }
}

/// Frictionless execution.
#[derive(Debug, Clone)]
pub struct ZeroFeeModel;

impl FeeModel for ZeroFeeModel {
    fn calculate_cost(&self, _quantity: Decimal, _price: Decimal) -> Decimal {
        Decimal::ZERO
    }

    fn description(&self) -> String {
        "Zero Fee Model".to_string()
    }
}
