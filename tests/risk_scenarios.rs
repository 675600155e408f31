//! End-to-end exercises of the risk engine over outcome sequences:
//! streak sizing, recovery cooldown, daily freeze, soft and hard stops.

use breakwater::domain::risk::{RiskConfig, RiskEngine, TradeOutcome, TradeResult};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

fn outcome(seq: u64, pnl: Decimal, day: u32, hour: u32) -> TradeOutcome {
    TradeOutcome {
        sequence_index: seq,
        result: if pnl > Decimal::ZERO {
            TradeResult::Win
        } else {
            TradeResult::Loss
        },
        pnl,
        r_multiple: if pnl > Decimal::ZERO { 2.0 } else { -1.0 },
        timestamp: ts(day, hour),
    }
}

fn engine(config: RiskConfig) -> RiskEngine {
    RiskEngine::new(config, dec!(10_000)).unwrap()
}

/// Two losses arm recovery: 0.8x after the first, 0.5x with a five-trade
/// cooldown once the streak reaches the trigger.
#[test]
fn scenario_loss_streak_arms_recovery() {
    let mut risk = engine(RiskConfig {
        max_drawdown_fraction: 0.3,
        recovery_trigger_losses: 2,
        ..RiskConfig::default()
    });

    risk.record_outcome(&outcome(0, dec!(-50), 3, 9)).unwrap();
    assert_eq!(risk.size_next_trade(), 0.8);

    risk.record_outcome(&outcome(1, dec!(-50), 3, 10)).unwrap();
    assert_eq!(risk.snapshot().consecutive_losses, 2);

    assert_eq!(risk.size_next_trade(), 0.5);
    assert_eq!(risk.snapshot().recovery_cooldown_remaining, 5);
}

/// Same-day losses totaling past the limit freeze trading until an outcome
/// from a later calendar day arrives.
#[test]
fn scenario_daily_loss_freeze_and_rollover() {
    let mut risk = engine(RiskConfig {
        daily_loss_limit: dec!(600),
        ..RiskConfig::default()
    });

    risk.record_outcome(&outcome(0, dec!(-300), 3, 9)).unwrap();
    assert!(risk.is_trading_allowed());

    risk.record_outcome(&outcome(1, dec!(-350), 3, 15)).unwrap();
    assert!(risk.snapshot().trading_frozen_daily);
    assert!(!risk.is_trading_allowed());

    // Still frozen for anything else dated the same day
    risk.record_outcome(&outcome(2, dec!(10), 3, 22)).unwrap();
    assert!(!risk.is_trading_allowed());

    // First outcome on a later day clears the freeze and the accumulator
    risk.record_outcome(&outcome(3, dec!(-20), 4, 1)).unwrap();
    assert!(!risk.snapshot().trading_frozen_daily);
    assert_eq!(risk.snapshot().daily_loss_accumulator, dec!(20));
    assert!(risk.is_trading_allowed());
}

/// The soft stop blocks entries while drawdown sits between the soft and
/// hard thresholds, and releases as equity recovers. The hard flag never
/// trips below its own threshold.
#[test]
fn scenario_soft_stop_blocks_then_releases() {
    let mut risk = engine(RiskConfig {
        max_drawdown_fraction: 0.30,
        soft_stop_fraction: 0.15,
        daily_loss_limit: dec!(100_000),
        ..RiskConfig::default()
    });

    // 16% drawdown: 10_000 -> 8_400
    risk.record_outcome(&outcome(0, dec!(-1600), 3, 9)).unwrap();
    assert!(!risk.is_trading_allowed());
    assert!(!risk.snapshot().trading_frozen_drawdown);

    // Recovers to 8_600 (14% drawdown): entries allowed again
    risk.record_outcome(&outcome(1, dec!(200), 3, 11)).unwrap();
    assert!(risk.is_trading_allowed());
}

/// A single malformed outcome is rejected without touching the state.
#[test]
fn scenario_malformed_outcome_rejected_atomically() {
    let mut risk = engine(RiskConfig::default());
    risk.record_outcome(&outcome(0, dec!(-50), 3, 9)).unwrap();
    let before = risk.snapshot().clone();

    assert!(
        TradeOutcome::try_from_f64(1, TradeResult::Loss, f64::NAN, -1.0, ts(3, 10)).is_err()
    );

    let mut bad = outcome(1, dec!(-50), 3, 10);
    bad.r_multiple = f64::NEG_INFINITY;
    assert!(risk.record_outcome(&bad).is_err());
    assert_eq!(risk.snapshot(), &before);
}

/// Once the hard drawdown stop trips it stays tripped, no matter how many
/// wins follow.
#[test]
fn hard_stop_is_terminal_across_wins() {
    let mut risk = engine(RiskConfig {
        max_drawdown_fraction: 0.30,
        daily_loss_limit: dec!(100_000),
        ..RiskConfig::default()
    });

    risk.record_outcome(&outcome(0, dec!(-3500), 3, 9)).unwrap();
    assert!(risk.snapshot().trading_frozen_drawdown);

    for seq in 1..6 {
        risk.record_outcome(&outcome(seq, dec!(1000), 3 + seq as u32 / 3, 9))
            .unwrap();
        assert!(
            !risk.is_trading_allowed(),
            "hard stop must hold after win #{seq}"
        );
    }
}

/// Peak balance never decreases and never falls below balance, whatever the
/// outcome sequence.
#[test]
fn peak_balance_is_monotone_upper_bound() {
    let mut risk = engine(RiskConfig {
        daily_loss_limit: dec!(100_000),
        max_drawdown_fraction: 1.0,
        ..RiskConfig::default()
    });

    let pnls = [
        dec!(250), dec!(-120), dec!(-80), dec!(500), dec!(-900), dec!(40),
        dec!(-40), dec!(700), dec!(-300), dec!(90),
    ];
    let mut last_peak = risk.snapshot().peak_balance;
    for (seq, pnl) in pnls.into_iter().enumerate() {
        risk.record_outcome(&outcome(seq as u64, pnl, 3 + seq as u32 / 4, 9))
            .unwrap();
        let state = risk.snapshot();
        assert!(state.peak_balance >= last_peak);
        assert!(state.peak_balance >= state.balance);
        last_peak = state.peak_balance;
    }
}

/// The sizing multiplier never leaves [min(multipliers), 1.0] over an
/// adversarial win/loss sequence.
#[test]
fn size_multiplier_stays_bounded() {
    let mut risk = engine(RiskConfig {
        daily_loss_limit: dec!(100_000),
        max_drawdown_fraction: 1.0,
        ..RiskConfig::default()
    });
    let floor = 0.5f64.min(0.8);

    let mut seq = 0u64;
    for chunk in [
        [dec!(-50), dec!(-50), dec!(-50)],
        [dec!(200), dec!(-50), dec!(200)],
        [dec!(-50), dec!(-50), dec!(200)],
    ] {
        for pnl in chunk {
            let mult = risk.size_next_trade();
            assert!((floor..=1.0).contains(&mult), "multiplier {mult} out of range");
            risk.position_opened();
            risk.record_outcome(&outcome(seq, pnl, 3, 9)).unwrap();
            seq += 1;
        }
    }
}

/// Streak accounting: N consecutive losses count N, any win resets to zero.
#[test]
fn streak_counts_and_resets() {
    let mut risk = engine(RiskConfig {
        daily_loss_limit: dec!(100_000),
        ..RiskConfig::default()
    });

    for (i, seq) in (0..4).enumerate() {
        risk.record_outcome(&outcome(seq, dec!(-10), 3, 9)).unwrap();
        assert_eq!(risk.snapshot().consecutive_losses, i + 1);
    }
    risk.record_outcome(&outcome(4, dec!(30), 3, 10)).unwrap();
    assert_eq!(risk.snapshot().consecutive_losses, 0);
}
