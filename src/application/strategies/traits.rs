use rust_decimal::Decimal;

use crate::domain::market::Candle;
use crate::domain::trading::types::TradeSide;

/// Entry signal with its protective levels
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub side: TradeSide,
    /// Breakout level the entry is assumed to fill at
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub reason: String,
}

impl Signal {
    pub fn long(entry: Decimal, stop_loss: Decimal, take_profit: Decimal, reason: String) -> Self {
        Self {
            side: TradeSide::Long,
            entry,
            stop_loss,
            take_profit,
            reason,
        }
    }

    pub fn short(entry: Decimal, stop_loss: Decimal, take_profit: Decimal, reason: String) -> Self {
        Self {
            side: TradeSide::Short,
            entry,
            stop_loss,
            take_profit,
            reason,
        }
    }
}

/// A stateless signal detector over a candle history.
///
/// `candles` is the full history up to and including the current bar, in
/// close order. Implementations return `None` until their warm-up window is
/// filled.
pub trait TradingStrategy: Send + Sync {
    fn analyze(&self, candles: &[Candle], has_position: bool) -> Option<Signal>;

    /// Bars required before the first signal can be produced
    fn min_warmup_bars(&self) -> usize;

    fn name(&self) -> &str;
}
