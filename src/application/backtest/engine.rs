use anyhow::Context;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::application::report::RunReport;
use crate::application::strategies::{Signal, TradingStrategy};
use crate::domain::errors::RiskConfigError;
use crate::domain::market::Candle;
use crate::domain::performance::PerformanceSummary;
use crate::domain::risk::{RiskConfig, RiskEngine, TradeOutcome};
use crate::domain::trading::position::OpenPosition;
use crate::domain::trading::types::{ClosedTrade, EquityPoint, ExitReason};

/// Sequential bar-replay backtester.
///
/// Entries fill at the breakout level on the signal bar; exits are evaluated
/// intrabar from the following bar on. All sizing and gating decisions go
/// through the risk engine, so the backtest exercises the same freeze and
/// recovery behavior the paper trader does.
pub struct BacktestEngine {
    strategy: Box<dyn TradingStrategy>,
    risk: RiskEngine,
    initial_balance: Decimal,
    open: Option<OpenPosition>,
    trades: Vec<ClosedTrade>,
    equity_curve: Vec<EquityPoint>,
    sequence: u64,
}

impl BacktestEngine {
    pub fn new(
        strategy: Box<dyn TradingStrategy>,
        risk_config: RiskConfig,
        initial_balance: Decimal,
    ) -> Result<Self, RiskConfigError> {
        let risk = RiskEngine::new(risk_config, initial_balance)?;
        Ok(Self {
            strategy,
            risk,
            initial_balance,
            open: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            sequence: 0,
        })
    }

    pub fn run(mut self, candles: &[Candle]) -> anyhow::Result<RunReport> {
        info!(
            strategy = self.strategy.name(),
            bars = candles.len(),
            initial_balance = %self.initial_balance,
            "Backtest started"
        );

        for (i, candle) in candles.iter().enumerate() {
            if let Some(position) = self.open.take() {
                match position.check_exit(candle) {
                    Some((price, reason)) => {
                        self.close_position(position, price, candle, reason)?
                    }
                    None => self.open = Some(position),
                }
            }

            if self.open.is_none()
                && let Some(signal) = self.strategy.analyze(&candles[..=i], false)
            {
                match self.risk.entry_block() {
                    None => self.enter(&signal, candle),
                    Some(block) => debug!(%block, bar = i, "Entry suppressed"),
                }
            }
        }

        // Flatten anything still open at the last close
        if let Some(position) = self.open.take()
            && let Some(last) = candles.last()
        {
            self.close_position(position, last.close, last, ExitReason::EndOfData)?;
        }

        let summary =
            PerformanceSummary::from_trades(&self.trades, self.initial_balance, &self.equity_curve);
        info!(trades = self.trades.len(), final_balance = %self.risk.snapshot().balance, "Backtest finished");

        Ok(RunReport {
            initial_balance: self.initial_balance,
            trades: self.trades,
            equity_curve: self.equity_curve,
            summary,
            account: self.risk.snapshot().clone(),
        })
    }

    fn enter(&mut self, signal: &Signal, candle: &Candle) {
        let stop_distance = (signal.entry - signal.stop_loss).abs();
        let balance = self.risk.snapshot().balance;
        if stop_distance <= Decimal::ZERO || balance <= Decimal::ZERO {
            return;
        }

        let multiplier = self.risk.size_next_trade();
        let risk_fraction = self.risk.config().base_risk_fraction * multiplier;
        let risk_amount =
            balance * Decimal::from_f64_retain(risk_fraction).unwrap_or(Decimal::ZERO);
        let quantity = (risk_amount / stop_distance).round_dp(4);
        if quantity <= Decimal::ZERO {
            return;
        }

        let position = OpenPosition::open(
            signal.side,
            candle.time,
            signal.entry,
            signal.stop_loss,
            signal.take_profit,
            quantity,
            multiplier,
        );
        self.risk.position_opened();
        info!(
            side = %position.side,
            entry = %position.entry_price,
            stop = %position.stop_loss,
            target = %position.take_profit,
            quantity = %position.quantity,
            multiplier,
            reason = %signal.reason,
            "Opened position"
        );
        self.open = Some(position);
    }

    fn close_position(
        &mut self,
        position: OpenPosition,
        exit_price: Decimal,
        candle: &Candle,
        reason: ExitReason,
    ) -> anyhow::Result<()> {
        let trade = position.close(exit_price, candle.time, reason, Decimal::ZERO);
        let outcome = TradeOutcome::from_trade(self.sequence, &trade);
        self.sequence += 1;
        self.risk
            .record_outcome(&outcome)
            .context("risk engine rejected trade outcome")?;

        info!(
            side = %trade.side,
            exit = %trade.exit_price,
            reason = %trade.exit_reason,
            pnl = %trade.pnl,
            r = trade.r_multiple,
            balance = %self.risk.snapshot().balance,
            "Closed position"
        );
        self.equity_curve.push(EquityPoint {
            time: candle.time,
            equity: self.risk.snapshot().balance,
        });
        self.trades.push(trade);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::strategies::BreakoutStrategy;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal_macros::dec;

    fn candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            time: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64),
            open: Decimal::from_f64(open).unwrap(),
            high: Decimal::from_f64(high).unwrap(),
            low: Decimal::from_f64(low).unwrap(),
            close: Decimal::from_f64(close).unwrap(),
            volume: Decimal::from(1000),
        }
    }

    fn engine(initial: Decimal) -> BacktestEngine {
        let strategy = BreakoutStrategy::new(5, 0.5, 2.0, false, false, 200);
        let risk = RiskConfig {
            base_risk_fraction: 0.01,
            ..RiskConfig::default()
        };
        BacktestEngine::new(Box::new(strategy), risk, initial).unwrap()
    }

    #[test]
    fn test_breakout_trade_reaches_target() {
        let mut candles: Vec<Candle> =
            (0..15).map(|i| candle(i, 100.0, 105.0, 95.0, 100.0)).collect();
        // Breakout bar: entry fills at the 5-bar high (105), ATR ~ 10,
        // stop 100, target 125.
        candles.push(candle(15, 104.0, 110.0, 103.0, 109.0));
        // March straight through the target without touching the stop.
        candles.push(candle(16, 109.0, 118.0, 108.0, 117.0));
        candles.push(candle(17, 117.0, 127.0, 116.0, 126.0));

        let report = engine(dec!(10_000)).run(&candles).unwrap();
        assert_eq!(report.trades.len(), 1);
        let trade = &report.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert!(trade.pnl > Decimal::ZERO);
        assert!((trade.r_multiple - 4.0).abs() < 1e-6);
        assert_eq!(report.account.balance, dec!(10_000) + trade.pnl);
    }

    #[test]
    fn test_open_position_flattened_at_end_of_data() {
        let mut candles: Vec<Candle> =
            (0..15).map(|i| candle(i, 100.0, 105.0, 95.0, 100.0)).collect();
        candles.push(candle(15, 104.0, 110.0, 103.0, 109.0));
        // Drifts sideways: neither level is touched before the feed ends.
        candles.push(candle(16, 109.0, 112.0, 106.0, 108.0));

        let report = engine(dec!(10_000)).run(&candles).unwrap();
        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].exit_reason, ExitReason::EndOfData);
    }

    #[test]
    fn test_equity_reconciles_with_trade_pnl() {
        let mut candles: Vec<Candle> =
            (0..15).map(|i| candle(i, 100.0, 105.0, 95.0, 100.0)).collect();
        candles.push(candle(15, 104.0, 110.0, 103.0, 109.0));
        candles.push(candle(16, 109.0, 110.0, 99.0, 100.0)); // stop hit
        for i in 17..32 {
            candles.push(candle(i, 100.0, 105.0, 95.0, 100.0));
        }
        candles.push(candle(32, 104.0, 110.0, 103.0, 109.0));
        candles.push(candle(33, 109.0, 127.0, 108.0, 126.0)); // target hit

        let report = engine(dec!(10_000)).run(&candles).unwrap();
        assert!(report.trades.len() >= 2);
        let total: Decimal = report.trades.iter().map(|t| t.pnl).sum();
        assert_eq!(report.account.balance, dec!(10_000) + total);
        assert_eq!(
            report.equity_curve.last().unwrap().equity,
            report.account.balance
        );
    }
}
