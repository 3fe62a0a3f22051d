use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use agenda_fabric::SyncMode;
use agenda_types::TimeUnit;

use crate::error::{SdkError, SdkResult};

/// How an [`Agenda`](crate::Agenda) is stored and timed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaConfig {
    /// Journal file. Without one the agenda lives in memory only.
    pub journal_path: Option<PathBuf>,
    pub sync_mode: SyncMode,
    /// Unit of the system clock, and of every timestamp callers pass in.
    pub time_unit: TimeUnit,
    /// Capacity of each notification subscriber's channel.
    pub channel_capacity: usize,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            journal_path: None,
            sync_mode: SyncMode::default(),
            time_unit: TimeUnit::default(),
            channel_capacity: 1024,
        }
    }
}

impl AgendaConfig {
    /// A durable configuration journaling to `path`.
    pub fn with_journal(path: impl Into<PathBuf>) -> Self {
        Self {
            journal_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }
}
