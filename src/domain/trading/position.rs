use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::market::Candle;
use crate::domain::trading::types::{ClosedTrade, ExitReason, TradeSide};

/// A single open position with its protective levels.
///
/// Exit evaluation is intrabar: a bar that touches the stop or the target
/// fills at that level. When one bar touches both, the level nearer to the
/// entry is assumed to have been hit first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub id: String,
    pub side: TradeSide,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub quantity: Decimal,
    pub size_multiplier: f64,
}

impl OpenPosition {
    pub fn open(
        side: TradeSide,
        entry_time: DateTime<Utc>,
        entry_price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
        quantity: Decimal,
        size_multiplier: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            side,
            entry_time,
            entry_price,
            stop_loss,
            take_profit,
            quantity,
            size_multiplier,
        }
    }

    /// Distance between entry and stop, the "1R" unit for this position.
    pub fn risk_per_unit(&self) -> Decimal {
        (self.entry_price - self.stop_loss).abs()
    }

    /// Check whether this bar closes the position; returns fill price and reason.
    pub fn check_exit(&self, candle: &Candle) -> Option<(Decimal, ExitReason)> {
        let (stop_hit, target_hit) = match self.side {
            TradeSide::Long => (
                candle.low <= self.stop_loss,
                candle.high >= self.take_profit,
            ),
            TradeSide::Short => (
                candle.high >= self.stop_loss,
                candle.low <= self.take_profit,
            ),
        };

        match (stop_hit, target_hit) {
            (true, true) => {
                let dist_to_stop = (self.entry_price - self.stop_loss).abs();
                let dist_to_target = (self.take_profit - self.entry_price).abs();
                if dist_to_target <= dist_to_stop {
                    Some((self.take_profit, ExitReason::TakeProfit))
                } else {
                    Some((self.stop_loss, ExitReason::StopLoss))
                }
            }
            (true, false) => Some((self.stop_loss, ExitReason::StopLoss)),
            (false, true) => Some((self.take_profit, ExitReason::TakeProfit)),
            (false, false) => None,
        }
    }

    /// Close the position and realize its P&L.
    ///
    /// `costs` is the total simulated commission/spread impact; zero for
    /// frictionless backtests.
    pub fn close(
        self,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
        exit_reason: ExitReason,
        costs: Decimal,
    ) -> ClosedTrade {
        let profit_per_unit = match self.side {
            TradeSide::Long => exit_price - self.entry_price,
            TradeSide::Short => self.entry_price - exit_price,
        };
        let pnl = profit_per_unit * self.quantity - costs;

        let risk = self.risk_per_unit();
        let r_multiple = if risk > Decimal::ZERO {
            (profit_per_unit / risk).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        ClosedTrade {
            id: self.id,
            side: self.side,
            entry_time: self.entry_time,
            exit_time,
            entry_price: self.entry_price,
            exit_price,
            quantity: self.quantity,
            pnl,
            r_multiple,
            size_multiplier: self.size_multiplier,
            exit_reason,
        }
    }
}
