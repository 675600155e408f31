use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::application::strategies::BreakoutStrategy;
use crate::config::SimulationSettings;
use crate::domain::risk::RiskConfig;

/// One TOML file describing a whole run. Missing sections and fields fall
/// back to the same defaults the environment configuration uses; a provided
/// file replaces the environment entirely.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub risk: RiskConfig,
    pub strategy: BreakoutStrategy,
    pub simulation: SimulationSettings,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "Loaded run configuration");
        Ok(config)
    }
}
