//! Bounded conversation history of the terminal client, kept as one JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{Role, Turn};

/// Storage key of the widget history.
pub const HISTORY_KEY: &str = "vahta_chat_history";

/// Only the newest entries are kept.
pub const MAX_ENTRIES: usize = 50;

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub bot: String,
    pub timestamp: String,
}

pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Opens `<dir>/<key>.json`, creating `dir` if needed.
    ///
    /// A missing file yields an empty history. A file that cannot be decoded is
    /// reported and ignored; it is overwritten on the next append.
    pub fn open(dir: &Path, key: &str) -> Result<Self, AppError> {
        if !dir.exists() {
            info!("Creating data directory: {:?}", dir);
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(format!("{}.json", key));

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring unreadable history {:?}: {}", path, e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(entries = entries.len(), "History loaded");

        let mut store = Self { path, entries };
        store.enforce_cap();
        Ok(store)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records one exchange and rewrites the file.
    pub fn append(
        &mut self,
        user: impl Into<String>,
        bot: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Result<(), AppError> {
        self.entries.push(HistoryEntry {
            user: user.into(),
            bot: bot.into(),
            timestamp: timestamp.into(),
        });
        self.enforce_cap();
        self.persist()
    }

    /// Alternating user/assistant turns, oldest first.
    pub fn turns(&self) -> Vec<Turn> {
        self.entries
            .iter()
            .flat_map(|entry| {
                [
                    Turn::new(Role::User, entry.user.as_str()),
                    Turn::new(Role::Assistant, entry.bot.as_str()),
                ]
            })
            .collect()
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        self.entries.clear();
        self.persist()
    }

    fn enforce_cap(&mut self) {
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    fn persist(&self) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| AppError::Internal(format!("Failed to encode history: {}", e)))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
