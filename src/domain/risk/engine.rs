use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{error, info, warn};

use crate::domain::errors::{OutcomeError, RiskConfigError, RiskViolation};
use crate::domain::risk::outcome::{TradeOutcome, TradeResult};
use crate::domain::risk::risk_config::RiskConfig;
use crate::domain::risk::state::AccountState;

/// Sizing regime derived from the loss streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingPhase {
    Normal,
    OneLoss,
    Recovery,
}

/// Sequential risk/position-sizing state machine.
///
/// Owns one `AccountState` and consumes trade outcomes in close order. All
/// operations are synchronous, bounded computations; the contract requires
/// at most one in-flight call at a time, so a concurrent host must serialize
/// access to a single instance.
pub struct RiskEngine {
    config: RiskConfig,
    state: AccountState,
    open_positions: usize,
    #[cfg(debug_assertions)]
    last_sequence: Option<u64>,
}

impl RiskEngine {
    pub fn new(config: RiskConfig, initial_balance: Decimal) -> Result<Self, RiskConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: AccountState::new(initial_balance),
            open_positions: 0,
            #[cfg(debug_assertions)]
            last_sequence: None,
        })
    }

    /// Resume from a persisted snapshot, re-registering any still-open slots.
    pub fn from_snapshot(
        config: RiskConfig,
        state: AccountState,
        open_positions: usize,
    ) -> Result<Self, RiskConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state,
            open_positions,
            #[cfg(debug_assertions)]
            last_sequence: None,
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Read-only view of the rolling account state, for reporting and for
    /// external persistence collaborators.
    pub fn snapshot(&self) -> &AccountState {
        &self.state
    }

    pub fn open_positions(&self) -> usize {
        self.open_positions
    }

    /// Current drawdown from the high water mark as a fraction of it.
    pub fn drawdown_fraction(&self) -> f64 {
        if self.state.peak_balance <= Decimal::ZERO {
            return 0.0;
        }
        ((self.state.peak_balance - self.state.balance) / self.state.peak_balance)
            .to_f64()
            .unwrap_or(0.0)
    }

    /// Why trading is currently blocked, if it is. Pure read.
    pub fn entry_block(&self) -> Option<RiskViolation> {
        if self.state.trading_frozen_drawdown {
            return Some(RiskViolation::MaxDrawdown {
                drawdown_pct: self.drawdown_fraction() * 100.0,
                max_pct: self.config.max_drawdown_fraction * 100.0,
            });
        }
        if self.state.trading_frozen_daily {
            return Some(RiskViolation::DailyLossLimit {
                loss: self.state.daily_loss_accumulator,
                limit: self.config.daily_loss_limit,
            });
        }
        let drawdown = self.drawdown_fraction();
        if drawdown > self.config.soft_stop_fraction {
            return Some(RiskViolation::SoftStop {
                drawdown_pct: drawdown * 100.0,
                soft_pct: self.config.soft_stop_fraction * 100.0,
            });
        }
        if self.open_positions >= self.config.max_concurrent_trades {
            return Some(RiskViolation::ConcurrentTradeLimit {
                open: self.open_positions,
                limit: self.config.max_concurrent_trades,
            });
        }
        None
    }

    /// Whether a new entry is currently permitted. Pure read.
    pub fn is_trading_allowed(&self) -> bool {
        self.entry_block().is_none()
    }

    /// Sizing regime implied by the current loss streak. The cooldown branch
    /// of `size_next_trade` takes priority over this.
    pub fn sizing_phase(&self) -> SizingPhase {
        if self.state.consecutive_losses == 0 {
            SizingPhase::Normal
        } else if self.state.consecutive_losses >= self.config.recovery_trigger_losses {
            SizingPhase::Recovery
        } else {
            SizingPhase::OneLoss
        }
    }

    /// Position-size multiplier for the next trade.
    ///
    /// Call exactly once, immediately before opening a trade: while the
    /// recovery cooldown is running this decrements it by one, which is the
    /// single mutating side effect of this otherwise-read operation.
    pub fn size_next_trade(&mut self) -> f64 {
        if self.state.recovery_cooldown_remaining > 0 {
            self.state.recovery_cooldown_remaining -= 1;
            return self.config.size_in_recovery;
        }

        match self.sizing_phase() {
            SizingPhase::Normal => 1.0,
            SizingPhase::OneLoss => self.config.size_after_one_loss,
            SizingPhase::Recovery => {
                self.state.recovery_cooldown_remaining = self.config.recovery_duration_trades;
                info!(
                    consecutive_losses = self.state.consecutive_losses,
                    cooldown = self.config.recovery_duration_trades,
                    "Recovery mode armed, reducing position size"
                );
                self.config.size_in_recovery
            }
        }
    }

    /// Register a position the caller is about to open, counted against
    /// `max_concurrent_trades`. Released again by `record_outcome`.
    pub fn position_opened(&mut self) {
        self.open_positions += 1;
    }

    /// Apply one closed trade to the rolling state.
    ///
    /// The five updates (balance/peak, streak, day rollover, daily loss,
    /// drawdown stop) happen as one logical step: a malformed outcome is
    /// rejected up front and leaves the state untouched.
    pub fn record_outcome(&mut self, outcome: &TradeOutcome) -> Result<(), OutcomeError> {
        if !outcome.r_multiple.is_finite() {
            return Err(OutcomeError::NonFiniteRMultiple {
                sequence_index: outcome.sequence_index,
                value: outcome.r_multiple,
            });
        }

        // 1. Balance and high water mark
        self.state.balance += outcome.pnl;
        if self.state.balance > self.state.peak_balance {
            self.state.peak_balance = self.state.balance;
        }

        // 2. Loss streak
        match outcome.result {
            TradeResult::Win => self.state.consecutive_losses = 0,
            TradeResult::Loss => self.state.consecutive_losses += 1,
        }

        // 3. Day rollover: the daily bucket only ever advances
        let day = outcome.timestamp.date_naive();
        match self.state.bucket_date {
            None => self.state.bucket_date = Some(day),
            Some(current) if day > current => {
                info!(%day, balance = %self.state.balance, "New trading day, daily limits reset");
                self.state.bucket_date = Some(day);
                self.state.daily_loss_accumulator = Decimal::ZERO;
                self.state.trading_frozen_daily = false;
            }
            Some(_) => {}
        }

        // 4. Daily loss accumulation
        if outcome.pnl < Decimal::ZERO {
            self.state.daily_loss_accumulator += outcome.pnl.abs();
            if self.state.daily_loss_accumulator > self.config.daily_loss_limit
                && !self.state.trading_frozen_daily
            {
                warn!(
                    loss = %self.state.daily_loss_accumulator,
                    limit = %self.config.daily_loss_limit,
                    "Daily loss limit breached, trading frozen until next day"
                );
                self.state.trading_frozen_daily = true;
            }
        }

        // 5. Hard drawdown stop, terminal for the run
        if !self.state.trading_frozen_drawdown
            && self.drawdown_fraction() > self.config.max_drawdown_fraction
        {
            error!(
                drawdown_pct = self.drawdown_fraction() * 100.0,
                limit_pct = self.config.max_drawdown_fraction * 100.0,
                "Hard drawdown stop triggered, all trading halted"
            );
            self.state.trading_frozen_drawdown = true;
        }

        self.open_positions = self.open_positions.saturating_sub(1);

        #[cfg(debug_assertions)]
        self.assert_invariants(outcome);
        Ok(())
    }

    /// Explicit external reset of the terminal drawdown stop.
    pub fn clear_hard_stop(&mut self) {
        if self.state.trading_frozen_drawdown {
            warn!("Hard drawdown stop cleared by external reset");
            self.state.trading_frozen_drawdown = false;
        }
    }

    #[cfg(debug_assertions)]
    fn assert_invariants(&mut self, last: &TradeOutcome) {
        debug_assert!(
            self.state.peak_balance >= self.state.balance,
            "peak_balance {} fell below balance {}",
            self.state.peak_balance,
            self.state.balance
        );
        if last.result == TradeResult::Win {
            debug_assert_eq!(
                self.state.consecutive_losses, 0,
                "loss streak must reset on a win"
            );
        }
        if let Some(prev) = self.last_sequence {
            debug_assert!(
                last.sequence_index > prev,
                "outcomes must arrive in sequence order ({} after {})",
                last.sequence_index,
                prev
            );
        }
        self.last_sequence = Some(last.sequence_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn outcome(seq: u64, result: TradeResult, pnl: Decimal, day: u32, hour: u32) -> TradeOutcome {
        TradeOutcome {
            sequence_index: seq,
            result,
            pnl,
            r_multiple: if result == TradeResult::Win { 2.0 } else { -1.0 },
            timestamp: Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap(),
        }
    }

    fn engine() -> RiskEngine {
        RiskEngine::new(RiskConfig::default(), dec!(10_000)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = RiskConfig {
            soft_stop_fraction: -0.1,
            ..RiskConfig::default()
        };
        assert!(RiskEngine::new(config, dec!(10_000)).is_err());
    }

    #[test]
    fn test_full_size_on_clean_slate() {
        let mut risk = engine();
        assert_eq!(risk.sizing_phase(), SizingPhase::Normal);
        assert_eq!(risk.size_next_trade(), 1.0);
    }

    #[test]
    fn test_win_resets_streak() {
        let mut risk = engine();
        risk.record_outcome(&outcome(0, TradeResult::Loss, dec!(-50), 3, 9))
            .unwrap();
        risk.record_outcome(&outcome(1, TradeResult::Loss, dec!(-50), 3, 10))
            .unwrap();
        assert_eq!(risk.snapshot().consecutive_losses, 2);

        risk.record_outcome(&outcome(2, TradeResult::Win, dec!(120), 3, 11))
            .unwrap();
        assert_eq!(risk.snapshot().consecutive_losses, 0);
    }

    #[test]
    fn test_one_loss_multiplier() {
        let mut risk = engine();
        risk.record_outcome(&outcome(0, TradeResult::Loss, dec!(-50), 3, 9))
            .unwrap();
        assert_eq!(risk.sizing_phase(), SizingPhase::OneLoss);
        assert_eq!(risk.size_next_trade(), 0.8);
    }

    #[test]
    fn test_streak_below_trigger_stays_reduced_not_recovery() {
        // Trigger at 3: a streak of 2 takes the one-loss multiplier,
        // recovery only arms at or above the trigger.
        let config = RiskConfig {
            recovery_trigger_losses: 3,
            ..RiskConfig::default()
        };
        let mut risk = RiskEngine::new(config, dec!(10_000)).unwrap();
        risk.record_outcome(&outcome(0, TradeResult::Loss, dec!(-10), 3, 9))
            .unwrap();
        risk.record_outcome(&outcome(1, TradeResult::Loss, dec!(-10), 3, 10))
            .unwrap();
        assert_eq!(risk.sizing_phase(), SizingPhase::OneLoss);
        assert_eq!(risk.size_next_trade(), 0.8);
        assert_eq!(risk.snapshot().recovery_cooldown_remaining, 0);
    }

    #[test]
    fn test_recovery_arms_at_trigger_and_counts_down() {
        let mut risk = engine();
        risk.record_outcome(&outcome(0, TradeResult::Loss, dec!(-50), 3, 9))
            .unwrap();
        risk.record_outcome(&outcome(1, TradeResult::Loss, dec!(-50), 3, 10))
            .unwrap();

        // Arming call
        assert_eq!(risk.size_next_trade(), 0.5);
        assert_eq!(risk.snapshot().recovery_cooldown_remaining, 5);

        // A win does not cancel the running cooldown
        risk.record_outcome(&outcome(2, TradeResult::Win, dec!(80), 3, 11))
            .unwrap();
        for remaining in (0..5).rev() {
            assert_eq!(risk.size_next_trade(), 0.5);
            assert_eq!(risk.snapshot().recovery_cooldown_remaining, remaining);
        }
        // Cooldown exhausted, streak clean: back to full size
        assert_eq!(risk.size_next_trade(), 1.0);
    }

    #[test]
    fn test_trigger_of_one_arms_after_single_loss() {
        let config = RiskConfig {
            recovery_trigger_losses: 1,
            ..RiskConfig::default()
        };
        let mut risk = RiskEngine::new(config, dec!(10_000)).unwrap();
        risk.record_outcome(&outcome(0, TradeResult::Loss, dec!(-50), 3, 9))
            .unwrap();
        assert_eq!(risk.sizing_phase(), SizingPhase::Recovery);
        assert_eq!(risk.size_next_trade(), 0.5);
        assert_eq!(risk.snapshot().recovery_cooldown_remaining, 5);
    }

    #[test]
    fn test_concurrent_trade_ceiling() {
        let config = RiskConfig {
            max_concurrent_trades: 1,
            ..RiskConfig::default()
        };
        let mut risk = RiskEngine::new(config, dec!(10_000)).unwrap();
        assert!(risk.is_trading_allowed());
        risk.position_opened();
        assert!(matches!(
            risk.entry_block(),
            Some(RiskViolation::ConcurrentTradeLimit { open: 1, limit: 1 })
        ));

        risk.record_outcome(&outcome(0, TradeResult::Win, dec!(10), 3, 9))
            .unwrap();
        assert!(risk.is_trading_allowed());
    }

    #[test]
    fn test_malformed_outcome_leaves_state_untouched() {
        let mut risk = engine();
        risk.record_outcome(&outcome(0, TradeResult::Loss, dec!(-50), 3, 9))
            .unwrap();
        let before = risk.snapshot().clone();

        let mut bad = outcome(1, TradeResult::Loss, dec!(-50), 3, 10);
        bad.r_multiple = f64::NAN;
        assert!(risk.record_outcome(&bad).is_err());
        assert_eq!(risk.snapshot(), &before);
    }

    #[test]
    fn test_clear_hard_stop() {
        let mut risk = engine();
        risk.record_outcome(&outcome(0, TradeResult::Loss, dec!(-4000), 3, 9))
            .unwrap();
        assert!(risk.snapshot().trading_frozen_drawdown);
        assert!(!risk.is_trading_allowed());

        risk.clear_hard_stop();
        assert!(!risk.snapshot().trading_frozen_drawdown);
    }
}
