//! Build history
//!
//! One JSON line per completed step in `~/.local/state/kiln/history.log`.
//! Entries are typed [`BuildEvent`]s so `kiln status` can read back what the
//! pipeline last did.

use crate::config::{schema::Config, ConfigManager};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// A step the pipeline completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildEvent {
    DepsEnsured {
        build_type: String,
        sanitiser: String,
        clean: bool,
        lockfile: PathBuf,
    },
    Configured {
        identity: String,
        dir: PathBuf,
        clean: bool,
    },
    Compiled {
        identity: String,
        dir: PathBuf,
        targets: Vec<String>,
    },
    Published {
        link: PathBuf,
        target: PathBuf,
        identity: Option<String>,
    },
    CoverageRendered {
        input: PathBuf,
        output: PathBuf,
        binary: PathBuf,
    },
}

/// One line of the history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub event: BuildEvent,
}

/// Append-only history of completed build steps
pub struct BuildHistory {
    /// `None` records nothing
    path: Option<PathBuf>,
}

impl BuildHistory {
    pub fn new(config: &Config) -> Self {
        if config.general.history {
            Self::at(ConfigManager::history_path())
        } else {
            Self::disabled()
        }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Append `event`, stamped now
    ///
    /// Write failures only warn: a build that succeeded stays successful.
    pub async fn record(&self, event: BuildEvent) {
        let Some(ref path) = self.path else {
            return;
        };

        let entry = HistoryEntry {
            timestamp: Utc::now(),
            event,
        };
        let mut line = match serde_json::to_vec(&entry) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize history entry: {}", e);
                return;
            }
        };
        line.push(b'\n');

        if let Err(e) = append_line(path, &line).await {
            warn!("Failed to write build history {}: {}", path.display(), e);
        }
    }

    /// Most recent publish of the `bin` link
    pub async fn last_published(&self) -> Option<HistoryEntry> {
        self.latest(|event| matches!(event, BuildEvent::Published { .. }))
            .await
    }

    /// Most recent entry whose event satisfies `wanted`
    ///
    /// Lines that no longer parse are skipped.
    pub async fn latest(&self, wanted: impl Fn(&BuildEvent) -> bool) -> Option<HistoryEntry> {
        let path = self.path.as_ref()?;
        let content = tokio::fs::read_to_string(path).await.ok()?;
        content
            .lines()
            .rev()
            .filter_map(|line| match serde_json::from_str::<HistoryEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping history line: {}", e);
                    None
                }
            })
            .find(|entry| wanted(&entry.event))
    }
}

async fn append_line(path: &Path, line: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line).await?;
    file.flush().await
}
