use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use ta::indicators::{AverageTrueRange, SimpleMovingAverage};
use ta::{DataItem, Next};

use super::traits::{Signal, TradingStrategy};
use crate::domain::market::Candle;

const ATR_PERIOD: usize = 14;

/// N-bar Breakout Strategy
///
/// Goes long when the current bar trades above the rolling high of the
/// previous `breakout_length` bars, short below the rolling low. Stop and
/// target distances are ATR multiples. Two optional gates cut low-quality
/// signals:
/// - volatility filter: ATR must be above its own moving average
/// - trend filter: longs only above the `trend_period` SMA, shorts below
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutStrategy {
    pub breakout_length: usize,
    pub atr_stop_multiplier: f64,
    pub atr_tp_multiplier: f64,
    pub volatility_filter: bool,
    pub trend_filter: bool,
    pub trend_period: usize,
}

impl Default for BreakoutStrategy {
    fn default() -> Self {
        Self {
            breakout_length: 25,
            atr_stop_multiplier: 0.3,
            atr_tp_multiplier: 4.0,
            volatility_filter: true,
            trend_filter: true,
            trend_period: 200,
        }
    }
}

struct IndicatorReadout {
    atr: f64,
    atr_slow: f64,
    trend_ma: f64,
}

impl BreakoutStrategy {
    pub fn new(
        breakout_length: usize,
        atr_stop_multiplier: f64,
        atr_tp_multiplier: f64,
        volatility_filter: bool,
        trend_filter: bool,
        trend_period: usize,
    ) -> Self {
        Self {
            breakout_length,
            atr_stop_multiplier,
            atr_tp_multiplier,
            volatility_filter,
            trend_filter,
            trend_period,
        }
    }

    /// Feed the candle history through the indicator chain and return the
    /// values as of the latest bar.
    fn compute_indicators(&self, candles: &[Candle]) -> Option<IndicatorReadout> {
        let mut atr_ind = AverageTrueRange::new(ATR_PERIOD).ok()?;
        let mut atr_sma = SimpleMovingAverage::new(ATR_PERIOD).ok()?;
        let mut trend_sma = SimpleMovingAverage::new(self.trend_period.max(1)).ok()?;

        let mut readout = IndicatorReadout {
            atr: 0.0,
            atr_slow: 0.0,
            trend_ma: 0.0,
        };
        for candle in candles {
            let item = DataItem::builder()
                .open(candle.open.to_f64()?)
                .high(candle.high.to_f64()?)
                .low(candle.low.to_f64()?)
                .close(candle.close.to_f64()?)
                .volume(candle.volume.to_f64().unwrap_or(0.0))
                .build()
                .ok()?;
            readout.atr = atr_ind.next(&item);
            readout.atr_slow = atr_sma.next(readout.atr);
            readout.trend_ma = trend_sma.next(candle.close.to_f64()?);
        }
        Some(readout)
    }

    fn levels(&self, entry: f64, atr: f64, long: bool) -> Option<(Decimal, Decimal)> {
        let (stop, target) = if long {
            (
                entry - self.atr_stop_multiplier * atr,
                entry + self.atr_tp_multiplier * atr,
            )
        } else {
            (
                entry + self.atr_stop_multiplier * atr,
                entry - self.atr_tp_multiplier * atr,
            )
        };
        if !stop.is_finite() || !target.is_finite() || stop <= 0.0 {
            return None;
        }
        Some((Decimal::from_f64_retain(stop)?, Decimal::from_f64_retain(target)?))
    }
}

impl TradingStrategy for BreakoutStrategy {
    fn analyze(&self, candles: &[Candle], has_position: bool) -> Option<Signal> {
        if has_position || candles.len() < self.min_warmup_bars() {
            return None;
        }

        let current = candles.last()?;
        let prev = &candles[candles.len() - 1 - self.breakout_length..candles.len() - 1];
        let prev_high = prev.iter().map(|c| c.high).max()?;
        let prev_low = prev.iter().map(|c| c.low).min()?;

        let readout = self.compute_indicators(candles)?;
        if readout.atr <= 0.0 {
            return None;
        }
        if self.volatility_filter && readout.atr <= readout.atr_slow {
            return None;
        }

        let close = current.close.to_f64()?;
        let long_bias = !self.trend_filter || close > readout.trend_ma;
        let short_bias = !self.trend_filter || close < readout.trend_ma;

        if current.high > prev_high && long_bias {
            let entry_f = prev_high.to_f64()?;
            let (stop, target) = self.levels(entry_f, readout.atr, true)?;
            return Some(Signal::long(
                prev_high,
                stop,
                target,
                format!(
                    "Breakout: High {:.5} > {}-bar high {:.5} (ATR {:.5})",
                    current.high, self.breakout_length, prev_high, readout.atr
                ),
            ));
        }

        if current.low < prev_low && short_bias {
            let entry_f = prev_low.to_f64()?;
            let (stop, target) = self.levels(entry_f, readout.atr, false)?;
            return Some(Signal::short(
                prev_low,
                stop,
                target,
                format!(
                    "Breakdown: Low {:.5} < {}-bar low {:.5} (ATR {:.5})",
                    current.low, self.breakout_length, prev_low, readout.atr
                ),
            ));
        }

        None
    }

    fn min_warmup_bars(&self) -> usize {
        let trend = if self.trend_filter { self.trend_period } else { 0 };
        (self.breakout_length + 1).max(ATR_PERIOD + 1).max(trend)
    }

    fn name(&self) -> &str {
        "Breakout"
    }
}
