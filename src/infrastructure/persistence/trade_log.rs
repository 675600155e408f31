use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::domain::errors::PersistenceError;
use crate::domain::trading::types::{ClosedTrade, EquityPoint};

fn io_err(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Append-only CSV log of closed trades.
///
/// The header is written once when the file is created; subsequent sessions
/// append bare records, so one file accumulates a whole trading history.
pub struct TradeLogWriter {
    path: PathBuf,
}

impl TradeLogWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, trade: &ClosedTrade) -> Result<(), PersistenceError> {
        let needs_header = std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| io_err(&self.path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(trade)?;
        writer.flush().map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}

/// Write a whole trade list in one shot (backtest output).
pub fn write_trades_csv(path: &Path, trades: &[ClosedTrade]) -> Result<(), PersistenceError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| PersistenceError::Csv(e))?;
    for trade in trades {
        writer.serialize(trade)?;
    }
    writer.flush().map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Write an equity curve in one shot.
pub fn write_equity_csv(path: &Path, points: &[EquityPoint]) -> Result<(), PersistenceError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| PersistenceError::Csv(e))?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush().map_err(|e| io_err(path, e))?;
    Ok(())
}
