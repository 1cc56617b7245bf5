//! Saved searches and search history, persisted as JSON files.
//!
//! Both collections live as single JSON documents under a directory chosen
//! by the caller, written with the temp-file-then-rename pattern so a crash
//! mid-write never corrupts them. Missing or unreadable files load as empty
//! with a warning; these are user convenience features and must not fail a
//! session.

use super::SearchFilters;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which entity collection a saved search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Milestone search.
    Milestones,

    /// Deliverable search.
    Deliverables,

    /// Ticket search.
    Tickets,

    /// Search across all entity collections.
    All,
}

/// A persisted, named filter set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    /// Unique identifier, `search_{millis}`.
    pub id: String,

    /// User-chosen display name.
    pub name: String,

    /// The filter set to re-run.
    pub filters: SearchFilters,

    /// Target entity collection.
    pub entity_kind: EntityKind,

    /// When the search was saved.
    pub created_at: DateTime<Utc>,
}

/// One entry of the recent-search history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    /// The query text.
    pub query: String,

    /// When the search ran.
    pub searched_at: DateTime<Utc>,

    /// How many results it produced.
    pub result_count: usize,
}

/// Most recent history entries kept.
const HISTORY_LIMIT: usize = 20;

const SAVED_FILE: &str = "saved_searches.json";
const HISTORY_FILE: &str = "search_history.json";

/// File-backed store for saved searches and search history.
#[derive(Debug, Clone)]
pub struct SavedSearchStore {
    dir: PathBuf,
}

impl SavedSearchStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load all saved searches. Missing or corrupt files yield an empty
    /// list.
    pub async fn saved_searches(&self) -> Vec<SavedSearch> {
        read_or_empty(&self.dir.join(SAVED_FILE)).await
    }

    /// Persist a new saved search and return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] / [`Error::Json`] on write failures.
    pub async fn save_search(
        &self,
        name: impl Into<String>,
        filters: SearchFilters,
        entity_kind: EntityKind,
    ) -> Result<SavedSearch> {
        let search = SavedSearch {
            id: format!("search_{}", Utc::now().timestamp_millis()),
            name: name.into(),
            filters,
            entity_kind,
            created_at: Utc::now(),
        };

        let mut searches = self.saved_searches().await;
        searches.push(search.clone());
        self.write(SAVED_FILE, &searches).await?;
        Ok(search)
    }

    /// Delete a saved search by id. Deleting an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] / [`Error::Json`] on write failures.
    pub async fn delete_saved_search(&self, id: &str) -> Result<()> {
        let mut searches = self.saved_searches().await;
        searches.retain(|s| s.id != id);
        self.write(SAVED_FILE, &searches).await
    }

    /// Load the recent-search history, most recent first, capped at
    /// [`HISTORY_LIMIT`] entries.
    pub async fn history(&self) -> Vec<SearchHistoryEntry> {
        let mut entries: Vec<SearchHistoryEntry> =
            read_or_empty(&self.dir.join(HISTORY_FILE)).await;
        entries.truncate(HISTORY_LIMIT);
        entries
    }

    /// Record a query in the history: deduplicated by query text, newest
    /// first, capped. Blank queries are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] / [`Error::Json`] on write failures.
    pub async fn record_search(&self, query: &str, result_count: usize) -> Result<()> {
        if query.trim().is_empty() {
            return Ok(());
        }

        let mut entries = self.history().await;
        entries.retain(|e| e.query != query);
        entries.insert(
            0,
            SearchHistoryEntry {
                query: query.to_string(),
                searched_at: Utc::now(),
                result_count,
            },
        );
        entries.truncate(HISTORY_LIMIT);
        self.write(HISTORY_FILE, &entries).await
    }

    /// Clear the search history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] / [`Error::Json`] on write failures.
    pub async fn clear_history(&self) -> Result<()> {
        self.write::<SearchHistoryEntry>(HISTORY_FILE, &[]).await
    }

    /// Atomically write a collection as one JSON document.
    async fn write<T: Serialize>(&self, file: &str, values: &[T]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(Error::Io)?;

        let path = self.dir.join(file);
        let temp_path = path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(values)?;
        tokio::fs::write(&temp_path, json).await.map_err(Error::Io)?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(Error::Io(e));
        }
        Ok(())
    }
}

/// Read a JSON collection, treating a missing or unreadable file as empty.
async fn read_or_empty<T: for<'de> Deserialize<'de>>(path: &Path) -> Vec<T> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read saved search file");
            return Vec::new();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "corrupt saved search file; starting empty"
            );
            Vec::new()
        }
    }
}
