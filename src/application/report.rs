use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::performance::PerformanceSummary;
use crate::domain::risk::AccountState;
use crate::domain::trading::types::{ClosedTrade, EquityPoint};

/// Everything a finished backtest or paper session produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub initial_balance: Decimal,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: PerformanceSummary,
    pub account: AccountState,
}

impl RunReport {
    /// Realized R-multiple series, input for Monte Carlo resampling.
    pub fn r_multiples(&self) -> Vec<f64> {
        self.trades.iter().map(|t| t.r_multiple).collect()
    }
}
