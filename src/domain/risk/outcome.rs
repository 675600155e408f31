use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::domain::errors::OutcomeError;
use crate::domain::trading::types::ClosedTrade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeResult {
    Win,
    Loss,
}

/// One closed trade as seen by the risk engine.
///
/// Ordering is by `sequence_index`; `timestamp` is used only for
/// calendar-day bucketing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub sequence_index: u64,
    pub result: TradeResult,
    pub pnl: Decimal,
    pub r_multiple: f64,
    pub timestamp: DateTime<Utc>,
}

impl TradeOutcome {
    /// Build an outcome from float-domain values, rejecting non-finite input.
    ///
    /// `Decimal` cannot represent NaN or infinity, so this conversion is the
    /// validation boundary for pnl arriving from float arithmetic.
    pub fn try_from_f64(
        sequence_index: u64,
        result: TradeResult,
        pnl: f64,
        r_multiple: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, OutcomeError> {
        if !pnl.is_finite() {
            return Err(OutcomeError::NonFinitePnl {
                sequence_index,
                value: pnl,
            });
        }
        if !r_multiple.is_finite() {
            return Err(OutcomeError::NonFiniteRMultiple {
                sequence_index,
                value: r_multiple,
            });
        }
        let pnl = Decimal::from_f64(pnl).ok_or(OutcomeError::NonFinitePnl {
            sequence_index,
            value: pnl,
        })?;
        Ok(Self {
            sequence_index,
            result,
            pnl,
            r_multiple,
            timestamp,
        })
    }

    /// Derive an outcome from a closed trade record.
    pub fn from_trade(sequence_index: u64, trade: &ClosedTrade) -> Self {
        Self {
            sequence_index,
            result: if trade.is_win() {
                TradeResult::Win
            } else {
                TradeResult::Loss
            },
            pnl: trade.pnl,
            r_multiple: trade.r_multiple,
            timestamp: trade.exit_time,
        }
    }
}
