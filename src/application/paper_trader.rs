use anyhow::Context;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::application::report::RunReport;
use crate::application::strategies::{Signal, TradingStrategy};
use crate::domain::market::Candle;
use crate::domain::performance::PerformanceSummary;
use crate::domain::ports::CandleFeed;
use crate::domain::risk::{RiskConfig, RiskEngine, TradeOutcome};
use crate::domain::trading::fees::FeeModel;
use crate::domain::trading::position::OpenPosition;
use crate::domain::trading::types::{ClosedTrade, EquityPoint, ExitReason};
use crate::infrastructure::persistence::{JsonStateStore, TradeLogWriter, TraderState};
use crate::infrastructure::simulation::SlippageModel;

pub struct PaperTraderSettings {
    /// Log a heartbeat (and persist state) every N bars; 0 disables it
    pub heartbeat_every: usize,
}

impl Default for PaperTraderSettings {
    fn default() -> Self {
        Self { heartbeat_every: 10 }
    }
}

/// Simulated live trading session.
///
/// Same strategy/risk pipeline as the backtester, but fills pass through the
/// slippage and fee models, every closed trade is appended to the CSV log,
/// and the whole session state survives restarts through the JSON store.
pub struct PaperTrader {
    strategy: Box<dyn TradingStrategy>,
    risk: RiskEngine,
    slippage: Box<dyn SlippageModel>,
    fees: Box<dyn FeeModel>,
    state_store: Option<JsonStateStore>,
    trade_log: Option<TradeLogWriter>,
    settings: PaperTraderSettings,
    initial_balance: Decimal,
    history: Vec<Candle>,
    open: Option<OpenPosition>,
    trades: Vec<ClosedTrade>,
    equity_curve: Vec<EquityPoint>,
    sequence: u64,
}

impl PaperTrader {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        strategy: Box<dyn TradingStrategy>,
        risk_config: RiskConfig,
        initial_balance: Decimal,
        slippage: Box<dyn SlippageModel>,
        fees: Box<dyn FeeModel>,
        state_store: Option<JsonStateStore>,
        trade_log: Option<TradeLogWriter>,
        settings: PaperTraderSettings,
    ) -> anyhow::Result<Self> {
        // Resume a previous session if the store has one
        let persisted = match &state_store {
            Some(store) => store.load().context("failed to load trader state")?,
            None => None,
        };

        let (risk, open, sequence) = match persisted {
            Some(state) => {
                info!(
                    balance = %state.account.balance,
                    trades = state.trades_recorded,
                    "Resuming paper session from persisted state"
                );
                let open_slots = usize::from(state.open_position.is_some());
                (
                    RiskEngine::from_snapshot(risk_config, state.account, open_slots)?,
                    state.open_position,
                    state.trades_recorded,
                )
            }
            None => (RiskEngine::new(risk_config, initial_balance)?, None, 0),
        };

        Ok(Self {
            strategy,
            risk,
            slippage,
            fees,
            state_store,
            trade_log,
            settings,
            initial_balance,
            history: Vec::new(),
            open,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            sequence,
        })
    }

    pub fn run(mut self, feed: &mut dyn CandleFeed) -> anyhow::Result<RunReport> {
        info!(
            strategy = self.strategy.name(),
            fees = self.fees.description(),
            "Paper trading session started"
        );

        let mut bars = 0usize;
        while let Some(candle) = feed.next_candle().context("candle feed failed")? {
            bars += 1;
            self.history.push(candle.clone());

            if let Some(position) = self.open.take() {
                match position.check_exit(&candle) {
                    Some((level, reason)) => self.close_position(position, level, &candle, reason)?,
                    None => self.open = Some(position),
                }
            }

            if self.open.is_none()
                && let Some(signal) = self.strategy.analyze(&self.history, false)
            {
                match self.risk.entry_block() {
                    None => self.enter(&signal, &candle)?,
                    Some(block) => debug!(%block, "Entry suppressed"),
                }
            }

            if self.settings.heartbeat_every > 0 && bars % self.settings.heartbeat_every == 0 {
                info!(
                    bars,
                    balance = %self.risk.snapshot().balance,
                    drawdown_pct = self.risk.drawdown_fraction() * 100.0,
                    trades = self.trades.len(),
                    "Heartbeat"
                );
                self.save_state(candle.time)?;
            }
        }

        if let Some(position) = &self.open {
            warn!(
                id = %position.id,
                side = %position.side,
                "Feed ended with an open position; it stays open in the persisted state"
            );
        }
        if let Some(last) = self.history.last() {
            self.save_state(last.time)?;
        }

        let summary =
            PerformanceSummary::from_trades(&self.trades, self.initial_balance, &self.equity_curve);
        info!(bars, trades = self.trades.len(), "Paper trading session ended");

        Ok(RunReport {
            initial_balance: self.initial_balance,
            trades: self.trades,
            equity_curve: self.equity_curve,
            summary,
            account: self.risk.snapshot().clone(),
        })
    }

    fn enter(&mut self, signal: &Signal, candle: &Candle) -> anyhow::Result<()> {
        let fill = self
            .slippage
            .execution_price(signal.entry, signal.side, true);
        let stop_distance = (fill - signal.stop_loss).abs();
        let balance = self.risk.snapshot().balance;
        if stop_distance <= Decimal::ZERO || balance <= Decimal::ZERO {
            return Ok(());
        }

        let multiplier = self.risk.size_next_trade();
        let risk_fraction = self.risk.config().base_risk_fraction * multiplier;
        let risk_amount =
            balance * Decimal::from_f64_retain(risk_fraction).unwrap_or(Decimal::ZERO);
        let quantity = (risk_amount / stop_distance).round_dp(4);
        if quantity <= Decimal::ZERO {
            return Ok(());
        }

        let position = OpenPosition::open(
            signal.side,
            candle.time,
            fill,
            signal.stop_loss,
            signal.take_profit,
            quantity,
            multiplier,
        );
        self.risk.position_opened();
        info!(
            side = %position.side,
            fill = %fill,
            stop = %position.stop_loss,
            target = %position.take_profit,
            quantity = %position.quantity,
            multiplier,
            reason = %signal.reason,
            "Paper entry"
        );
        self.open = Some(position);
        self.save_state(candle.time)?;
        Ok(())
    }

    fn close_position(
        &mut self,
        position: OpenPosition,
        level: Decimal,
        candle: &Candle,
        reason: ExitReason,
    ) -> anyhow::Result<()> {
        let fill = self.slippage.execution_price(level, position.side, false);
        let costs = self.fees.calculate_cost(position.quantity, position.entry_price)
            + self.fees.calculate_cost(position.quantity, fill);
        let trade = position.close(fill, candle.time, reason, costs);

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
            balance = %self.risk.snapshot().balance,
            "Paper exit"
        );
        if let Some(log) = &self.trade_log {
            log.append(&trade).context("failed to append trade log")?;
        }
        self.equity_curve.push(EquityPoint {
            time: candle.time,
            equity: self.risk.snapshot().balance,
        });
        self.trades.push(trade);
        self.save_state(candle.time)?;
        Ok(())
    }

    fn save_state(&self, at: chrono::DateTime<chrono::Utc>) -> anyhow::Result<()> {
        if let Some(store) = &self.state_store {
            let state = TraderState {
                account: self.risk.snapshot().clone(),
                open_position: self.open.clone(),
                trades_recorded: self.sequence,
                saved_at: at,
            };
            store.save(&state).context("failed to persist trader state")?;
        }
        Ok(())
    }
}
