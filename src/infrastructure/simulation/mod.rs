pub mod slippage_model;

pub use slippage_model::{SlippageModel, VolatilitySlippage, ZeroSlippage};
