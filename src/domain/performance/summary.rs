use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::fmt;

use crate::domain::trading::types::{ClosedTrade, EquityPoint};

/// Aggregate performance statistics for a finished run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    pub total_r: f64,
    /// Mean R per trade
    pub expectancy: f64,
    pub profit_factor: f64,

    pub net_profit: Decimal,
    pub return_pct: f64,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,

    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    pub max_consecutive_losses: usize,

    pub final_balance: Decimal,
}

impl PerformanceSummary {
    pub fn from_trades(
        trades: &[ClosedTrade],
        initial_balance: Decimal,
        equity_curve: &[EquityPoint],
    ) -> Self {
        let mut summary = Self::default();
        summary.total_trades = trades.len();

        let mut streak = 0usize;
        for trade in trades {
            summary.total_r += trade.r_multiple;
            if trade.is_win() {
                summary.winning_trades += 1;
                summary.gross_profit += trade.pnl;
                summary.largest_win = summary.largest_win.max(trade.pnl);
                streak = 0;
            } else {
                summary.losing_trades += 1;
                summary.gross_loss += trade.pnl.abs();
                summary.largest_loss = summary.largest_loss.min(trade.pnl);
                streak += 1;
                summary.max_consecutive_losses = summary.max_consecutive_losses.max(streak);
            }
        }

        if !trades.is_empty() {
            summary.win_rate = summary.winning_trades as f64 / trades.len() as f64;
            summary.expectancy = summary.total_r / trades.len() as f64;
        }
        summary.profit_factor = if summary.gross_loss > Decimal::ZERO {
            (summary.gross_profit / summary.gross_loss)
                .to_f64()
                .unwrap_or(0.0)
        } else if summary.gross_profit > Decimal::ZERO {
            f64::INFINITY
        } else {
            0.0
        };

        // Drawdown from the running equity maximum
        let mut peak = initial_balance;
        let mut final_balance = initial_balance;
        for point in equity_curve {
            if point.equity > peak {
                peak = point.equity;
            }
            let dd = peak - point.equity;
            if dd > summary.max_drawdown {
                summary.max_drawdown = dd;
                summary.max_drawdown_pct = if peak > Decimal::ZERO {
                    (dd / peak).to_f64().unwrap_or(0.0)
                } else {
                    0.0
                };
            }
            final_balance = point.equity;
        }

        summary.final_balance = final_balance;
        summary.net_profit = final_balance - initial_balance;
        summary.return_pct = if initial_balance > Decimal::ZERO {
            ((final_balance - initial_balance) / initial_balance)
                .to_f64()
                .unwrap_or(0.0)
                * 100.0
        } else {
            0.0
        };

        summary
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trades:          {}", self.total_trades)?;
        writeln!(f, "Win rate:        {:.2}%", self.win_rate * 100.0)?;
        writeln!(f, "Total R:         {:.2}", self.total_r)?;
        writeln!(f, "Expectancy:      {:.2} R", self.expectancy)?;
        writeln!(f, "Profit factor:   {:.2}", self.profit_factor)?;
        writeln!(f, "Net profit:      {:.2}", self.net_profit)?;
        writeln!(f, "Return:          {:.2}%", self.return_pct)?;
        writeln!(
            f,
            "Max drawdown:    {:.2} ({:.2}%)",
            self.max_drawdown,
            self.max_drawdown_pct * 100.0
        )?;
        writeln!(f, "Max loss streak: {}", self.max_consecutive_losses)?;
        write!(f, "Final balance:   {:.2}", self.final_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::types::{ExitReason, TradeSide};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal, r: f64) -> ClosedTrade {
        let ts = Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap();
        ClosedTrade {
            id: "t".to_string(),
            side: TradeSide::Long,
            entry_time: ts,
            exit_time: ts,
            entry_price: dec!(100),
            exit_price: dec!(101),
            quantity: dec!(1),
            pnl,
            r_multiple: r,
            size_multiplier: 1.0,
            exit_reason: ExitReason::TakeProfit,
        }
    }

    fn equity(points: &[Decimal]) -> Vec<EquityPoint> {
        points
            .iter()
            .map(|e| EquityPoint {
                time: Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap(),
                equity: *e,
            })
            .collect()
    }

    #[test]
    fn test_summary_basic_stats() {
        let trades = vec![trade(dec!(200), 4.0), trade(dec!(-50), -1.0)];
        let curve = equity(&[dec!(10_200), dec!(10_150)]);
        let summary = PerformanceSummary::from_trades(&trades, dec!(10_000), &curve);

        assert_eq!(summary.total_trades, 2);
        assert_eq!(summary.winning_trades, 1);
        assert!((summary.win_rate - 0.5).abs() < 1e-9);
        assert!((summary.total_r - 3.0).abs() < 1e-9);
        assert!((summary.profit_factor - 4.0).abs() < 1e-9);
        assert_eq!(summary.net_profit, dec!(150));
        assert_eq!(summary.max_drawdown, dec!(50));
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let trades = vec![trade(dec!(100), 2.0)];
        let curve = equity(&[dec!(10_100)]);
        let summary = PerformanceSummary::from_trades(&trades, dec!(10_000), &curve);
        assert!(summary.profit_factor.is_infinite());
    }

    #[test]
    fn test_max_consecutive_losses() {
        let trades = vec![
            trade(dec!(-10), -1.0),
            trade(dec!(-10), -1.0),
            trade(dec!(50), 2.0),
            trade(dec!(-10), -1.0),
        ];
        let curve = equity(&[dec!(9_990), dec!(9_980), dec!(10_030), dec!(10_020)]);
        let summary = PerformanceSummary::from_trades(&trades, dec!(10_000), &curve);
        assert_eq!(summary.max_consecutive_losses, 2);
    }
}
