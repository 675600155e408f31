use crate::domain::errors::FeedError;
use crate::domain::market::Candle;

/// Source of candles for the paper trader: a CSV replay, an in-memory
/// series, or any future streaming adapter. Candles must arrive in close
/// order.
pub trait CandleFeed {
    fn next_candle(&mut self) -> Result<Option<Candle>, FeedError>;
}
