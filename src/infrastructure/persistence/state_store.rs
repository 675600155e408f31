use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::domain::errors::PersistenceError;
use crate::domain::risk::AccountState;
use crate::domain::trading::position::OpenPosition;

/// Durable snapshot of a paper-trading session, written after every closed
/// trade and heartbeat so a restarted process resumes where it stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderState {
    pub account: AccountState,
    pub open_position: Option<OpenPosition>,
    pub trades_recorded: u64,
    pub saved_at: DateTime<Utc>,
}

/// JSON file persistence for `TraderState`. The risk core itself never does
/// I/O; this is the external collaborator holding its snapshot.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Option<TraderState>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| PersistenceError::Io {
            path: self.path.display().to_string(),
            source: e,
        })?;
        let state: TraderState = serde_json::from_str(&content)?;
        info!(path = %self.path.display(), balance = %state.account.balance, "Loaded trader state");
        Ok(Some(state))
    }

    pub fn save(&self, state: &TraderState) -> Result<(), PersistenceError> {
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content).map_err(|e| PersistenceError::Io {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}
