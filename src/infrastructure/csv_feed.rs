use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::domain::errors::FeedError;
use crate::domain::market::Candle;
use crate::domain::ports::CandleFeed;

#[derive(Debug, Deserialize)]
struct CandleRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

fn parse_time(value: &str, row: usize) -> Result<DateTime<Utc>, FeedError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Bare "YYYY-MM-DD HH:MM:SS" exports, assumed UTC
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(FeedError::BadTimestamp {
        value: value.to_string(),
        row,
    })
}

fn to_decimal(value: f64, row: usize, field: &str) -> Result<Decimal, FeedError> {
    Decimal::from_f64(value).ok_or_else(|| FeedError::MalformedRow {
        row,
        reason: format!("non-finite {field}: {value}"),
    })
}

/// Load OHLC candles from a `time,open,high,low,close[,volume]` CSV,
/// sorted chronologically.
pub fn load_candles(path: &Path) -> Result<Vec<Candle>, FeedError> {
    let display = path.display().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|e| match e.kind() {
        csv::ErrorKind::Io(_) => FeedError::Open {
            path: display.clone(),
            source: std::io::Error::other(e.to_string()),
        },
        _ => FeedError::MalformedRow {
            row: 0,
            reason: e.to_string(),
        },
    })?;

    let mut candles = Vec::new();
    for (i, record) in reader.deserialize::<CandleRow>().enumerate() {
        let row = record.map_err(|e| FeedError::MalformedRow {
            row: i + 1,
            reason: e.to_string(),
        })?;
        candles.push(Candle {
            time: parse_time(&row.time, i + 1)?,
            open: to_decimal(row.open, i + 1, "open")?,
            high: to_decimal(row.high, i + 1, "high")?,
            low: to_decimal(row.low, i + 1, "low")?,
            close: to_decimal(row.close, i + 1, "close")?,
            volume: to_decimal(row.volume, i + 1, "volume")?,
        });
    }

    if candles.is_empty() {
        return Err(FeedError::Empty { path: display });
    }
    candles.sort_by_key(|c| c.time);
    info!(path = %path.display(), bars = candles.len(), "Loaded candle history");
    Ok(candles)
}

/// Replays a pre-loaded candle series, bar by bar.
pub struct MemoryFeed {
    candles: std::vec::IntoIter<Candle>,
}

impl MemoryFeed {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles: candles.into_iter(),
        }
    }

    pub fn from_csv(path: &Path) -> Result<Self, FeedError> {
        Ok(Self::new(load_candles(path)?))
    }
}

impl CandleFeed for MemoryFeed {
    fn next_candle(&mut self) -> Result<Option<Candle>, FeedError> {
        Ok(self.candles.next())
    }
}
