use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub iterations: usize,
    pub initial_equity: Decimal,
    /// Fraction of equity risked per trade when replaying resampled outcomes
    pub risk_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub final_equity_mean: Decimal,
    pub final_equity_median: Decimal,
    pub percentile_5: Decimal,
    pub percentile_95: Decimal,
    pub probability_of_profit: f64,
    pub max_drawdown_mean: f64,
    pub max_drawdown_worst: f64,
}

/// Bootstrap robustness test over realized trade outcomes.
///
/// Resamples the R-multiple series with replacement and replays each sampled
/// ordering through fixed-fractional sizing, answering how sensitive the
/// equity curve is to trade ordering and which drawdowns are plausible.
pub struct MonteCarloEngine;

impl MonteCarloEngine {
    pub fn resample(r_multiples: &[f64], config: &MonteCarloConfig) -> Option<MonteCarloResult> {
        if r_multiples.is_empty() || config.iterations == 0 {
            return None;
        }

        let initial = config.initial_equity.to_f64().unwrap_or(0.0);
        let mut rng = rand::rng();
        let mut final_equities = Vec::with_capacity(config.iterations);
        let mut max_drawdowns = Vec::with_capacity(config.iterations);
        let mut profitable_runs = 0usize;

        for _ in 0..config.iterations {
            let mut equity = initial;
            let mut peak = equity;
            let mut max_dd = 0.0f64;

            for _ in 0..r_multiples.len() {
                let r = r_multiples[rng.random_range(0..r_multiples.len())];
                equity += equity * config.risk_fraction * r;

                if equity > peak {
                    peak = equity;
                } else if peak > 0.0 {
                    let dd = (peak - equity) / peak;
                    if dd > max_dd {
                        max_dd = dd;
                    }
                }
            }

            final_equities.push(equity);
            max_drawdowns.push(max_dd);
            if equity > initial {
                profitable_runs += 1;
            }
        }

        final_equities.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = config.iterations;
        let mean: f64 = final_equities.iter().sum::<f64>() / n as f64;
        let median = final_equities[n / 2];
        let p5 = final_equities[n * 5 / 100];
        let p95 = final_equities[(n * 95 / 100).min(n - 1)];
        let mean_dd: f64 = max_drawdowns.iter().sum::<f64>() / n as f64;
        let worst_dd = max_drawdowns.iter().cloned().fold(0.0, f64::max);

        Some(MonteCarloResult {
            final_equity_mean: Decimal::from_f64_retain(mean).unwrap_or_default(),
            final_equity_median: Decimal::from_f64_retain(median).unwrap_or_default(),
            percentile_5: Decimal::from_f64_retain(p5).unwrap_or_default(),
            percentile_95: Decimal::from_f64_retain(p95).unwrap_or_default(),
            probability_of_profit: profitable_runs as f64 / n as f64,
            max_drawdown_mean: mean_dd,
            max_drawdown_worst: worst_dd,
        })
    }
}
