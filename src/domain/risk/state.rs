use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rolling account state owned by the risk engine.
///
/// Mutated exclusively through `RiskEngine::record_outcome`; everything else
/// reads it as a snapshot. Serializable so an external collaborator can
/// persist it across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    /// Current equity, updated only by applying realized trade pnl
    pub balance: Decimal,

    /// Highest equity ever observed (high water mark)
    pub peak_balance: Decimal,

    /// Number of consecutive losing trades since the last win
    pub consecutive_losses: usize,

    /// Trades remaining at reduced size once recovery mode armed
    pub recovery_cooldown_remaining: usize,

    /// Sum of losses within the current calendar-day bucket
    pub daily_loss_accumulator: Decimal,

    /// Calendar day the daily bucket refers to; None until the first outcome
    pub bucket_date: Option<NaiveDate>,

    /// Daily loss limit tripped; clears at the next day rollover
    pub trading_frozen_daily: bool,

    /// Hard drawdown stop tripped; terminal until an explicit external reset
    pub trading_frozen_drawdown: bool,
}

impl AccountState {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: initial_balance,
            peak_balance: initial_balance,
            consecutive_losses: 0,
            recovery_cooldown_remaining: 0,
            daily_loss_accumulator: Decimal::ZERO,
            bucket_date: None,
            trading_frozen_daily: false,
            trading_frozen_drawdown: false,
        }
    }
}
