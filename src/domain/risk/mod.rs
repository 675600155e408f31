pub mod engine;
pub mod outcome;
pub mod risk_config;
pub mod state;

pub use engine::{RiskEngine, SizingPhase};
pub use outcome::{TradeOutcome, TradeResult};
pub use risk_config::RiskConfig;
pub use state::AccountState;
