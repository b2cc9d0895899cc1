use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fs, path::Path};
use tracing::warn;

use crate::error::AlertError;

/// Dedup keys for alerts already broadcast, persisted between runs.
///
/// Heat alerts are keyed by calendar date, rain alerts by forecast hour,
/// both in local civil time. Keys from previous days are pruned at the
/// start of every evaluation, so the file stays a handful of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    #[serde(default)]
    pub notified_heat_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub notified_rain_events: BTreeSet<NaiveDateTime>,
}

impl NotificationState {
    /// Drop every key that does not belong to `today`.
    ///
    /// Runs unconditionally each cycle, whether or not new events fire, so
    /// the dedup sets self-reset at day rollover without a separate job.
    pub fn prune(&mut self, today: NaiveDate) {
        self.notified_heat_dates.retain(|d| *d == today);
        self.notified_rain_events.retain(|t| t.date() == today);
    }

    /// Load persisted state from `path`.
    ///
    /// A missing, unreadable or corrupt file is treated as "no prior
    /// state" (both sets empty), never as a fatal error.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    "{}, starting with empty state",
                    AlertError::StateRead(e.into())
                );
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    "{}, starting with empty state",
                    AlertError::StateRead(e.into())
                );
                Self::default()
            }
        }
    }

    /// Persist to `path`, creating parent directories as needed.
    ///
    /// Writes to a temp file and renames it into place so a crash mid-write
    /// cannot leave a truncated state file behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize notification state")?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move state file into place: {}", path.display()))?;

        Ok(())
    }
}
