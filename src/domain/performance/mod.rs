pub mod monte_carlo;
pub mod summary;

pub use monte_carlo::{MonteCarloConfig, MonteCarloEngine, MonteCarloResult};
pub use summary::PerformanceSummary;
