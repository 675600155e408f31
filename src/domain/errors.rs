use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while validating risk configuration at construction time
#[derive(Debug, Error)]
pub enum RiskConfigError {
    #[error("Invalid RiskConfig: {0}")]
    ValidationError(String),
}

/// Errors raised when a malformed trade outcome is handed to the risk engine.
/// The engine rejects the call and leaves its state untouched.
#[derive(Debug, Error)]
pub enum OutcomeError {
    #[error("Non-finite pnl for outcome #{sequence_index}: {value}")]
    NonFinitePnl { sequence_index: u64, value: f64 },

    #[error("Non-finite R multiple for outcome #{sequence_index}: {value}")]
    NonFiniteRMultiple { sequence_index: u64, value: f64 },
}

/// Errors related to candle feeds
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to open candle file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed candle row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("Candle feed is empty: {path}")]
    Empty { path: String },

    #[error("Unparseable timestamp '{value}' in row {row}")]
    BadTimestamp { value: String, row: usize },
}

/// Errors related to trade-log and state-snapshot persistence
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write CSV record: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors related to risk limit violations, used for reporting why an entry
/// was refused
#[derive(Debug, Error)]
pub enum RiskViolation {
    #[error("Daily loss limit breached: {loss} > {limit}")]
    DailyLossLimit { loss: Decimal, limit: Decimal },

    #[error("Maximum drawdown exceeded: {drawdown_pct:.2}% > {max_pct:.2}%")]
    MaxDrawdown { drawdown_pct: f64, max_pct: f64 },

    #[error("Soft equity stop active: {drawdown_pct:.2}% > {soft_pct:.2}%")]
    SoftStop { drawdown_pct: f64, soft_pct: f64 },

    #[error("Concurrent trade ceiling reached: {open} open (limit {limit})")]
    ConcurrentTradeLimit { open: usize, limit: usize },
}
