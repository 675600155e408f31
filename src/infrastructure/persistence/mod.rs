pub mod state_store;
pub mod trade_log;

pub use state_store::{JsonStateStore, TraderState};
pub use trade_log::{TradeLogWriter, write_equity_csv, write_trades_csv};
