//! Per-task activity notes kept on this device only

use crate::store::{LocalStore, LocalStoreError};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskdeck_model::TaskId;

/// Entries kept per task
pub const MAX_ENTRIES: usize = 100;

/// Storage key prefix
pub const KEY_PREFIX: &str = "task-activity:";

/// One note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Trimmed text
    pub text: String,
    /// Epoch milliseconds
    pub ts: i64,
}

impl ActivityEntry {
    /// Timestamp as an instant
    #[must_use]
    pub fn at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.ts).single()
    }
}

/// Storage key for a task's log
#[must_use]
pub fn activity_key(task: &TaskId) -> String {
    format!("{KEY_PREFIX}{task}")
}

/// Newest-first activity log per task
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn LocalStore>,
}

impl ActivityLog {
    /// Log over `store`
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Entries for `task`, newest first. Missing or unreadable data yields
    /// an empty log.
    #[must_use]
    pub fn load(&self, task: &TaskId) -> Vec<ActivityEntry> {
        let key = activity_key(task);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                tracing::warn!(%key, %error, "activity unreadable");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|error| {
            tracing::warn!(%key, %error, "activity corrupt, starting over");
            Vec::new()
        })
    }

    /// Record `text` now.
    ///
    /// # Errors
    /// When the log cannot be written back.
    pub fn append(&self, task: &TaskId, text: &str) -> Result<Option<ActivityEntry>, LocalStoreError> {
        self.append_at(task, text, Utc::now())
    }

    /// Record `text` with an explicit timestamp. Blank text is ignored and
    /// returns `None`; otherwise the new entry is returned.
    ///
    /// # Errors
    /// When the log cannot be written back.
    pub fn append_at(
        &self,
        task: &TaskId,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ActivityEntry>, LocalStoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let entry = ActivityEntry {
            text: text.to_string(),
            ts: at.timestamp_millis(),
        };
        let mut entries = self.load(task);
        entries.insert(0, entry.clone());
        entries.truncate(MAX_ENTRIES);

        let key = activity_key(task);
        let raw = serde_json::to_string(&entries).map_err(|source| LocalStoreError::Encode {
            key: key.clone(),
            source,
        })?;
        self.store.set(&key, &raw)?;
        tracing::debug!(%key, entries = entries.len(), "activity appended");
        Ok(Some(entry))
    }

    /// Forget a task's log
    ///
    /// # Errors
    /// Backend failures.
    pub fn clear(&self, task: &TaskId) -> Result<(), LocalStoreError> {
        self.store.remove(&activity_key(task))
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog").finish_non_exhaustive()
    }
}
