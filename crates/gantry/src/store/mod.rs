//! Storage abstraction for milestone documents.
//!
//! The dependency graph engine consumes a document-style persistence
//! collaborator through the [`MilestoneStore`] trait. Two implementations
//! ship with the crate:
//!
//! - **In-memory**: fast, ephemeral storage backed by a `HashMap`
//! - **JSONL**: the in-memory store loaded from / saved to a JSON Lines file
//!
//! # Architecture
//!
//! The trait is async and object-safe, allowing dynamic dispatch via
//! `Box<dyn MilestoneStore>`. Milestone documents embed their dependency
//! edges; there is no separate edge table. The three write operations each
//! replace one field of one document, mirroring the partial-update semantics
//! of the document stores this crate fronts.
//!
//! # Consistency
//!
//! The store offers no multi-document transactions. Operations in
//! [`crate::graph`] that touch two documents issue two sequential writes;
//! if the second fails after the first succeeded, the graph is left
//! half-applied and the error propagates to the caller. See the module
//! documentation of [`crate::graph`] for the full discussion.
//!
//! # Test Utilities
//!
//! [`MockStore`] provides a stateless implementation for verifying trait
//! object usage. Enable the `test-util` feature to use it from downstream
//! crates.

use crate::domain::{Milestone, MilestoneDependency, MilestoneId, ProjectId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod in_memory;
pub mod jsonl;

pub use in_memory::new_in_memory_store;
pub use jsonl::{LoadWarning, load_from_jsonl, save_to_jsonl};

/// Document-style persistence collaborator for milestone records.
///
/// Implementations must be `Send + Sync` to support concurrent access in
/// async contexts. All failures map to [`crate::error::Error::Store`] (or
/// `Io`/`Json` for file-backed stores) and propagate unmodified.
#[async_trait]
pub trait MilestoneStore: Send + Sync {
    /// Insert a milestone document, replacing any existing document with the
    /// same project and milestone id.
    async fn insert_milestone(&mut self, milestone: Milestone) -> Result<()>;

    /// Fetch a milestone document. Returns `None` if the id does not resolve.
    async fn get_milestone(
        &self,
        project: &ProjectId,
        id: &MilestoneId,
    ) -> Result<Option<Milestone>>;

    /// List every milestone of a project, in insertion order.
    async fn list_milestones(&self, project: &ProjectId) -> Result<Vec<Milestone>>;

    /// Replace the embedded dependency edges of one milestone document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MilestoneNotFound`] if the document
    /// does not exist.
    async fn update_milestone_dependencies(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        dependencies: Vec<MilestoneDependency>,
    ) -> Result<()>;

    /// Replace the dependents mirror list of one milestone document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MilestoneNotFound`] if the document
    /// does not exist.
    async fn update_milestone_dependents(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        dependents: Vec<MilestoneId>,
    ) -> Result<()>;

    /// Replace the schedule window of one milestone document.
    ///
    /// Used by cascading date recalculation; the milestone's duration is the
    /// caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MilestoneNotFound`] if the document
    /// does not exist.
    async fn update_milestone_schedule(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        starts_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Result<()>;

    /// Export every milestone across all projects, suitable for JSONL backup.
    async fn export_all(&self) -> Result<Vec<Milestone>>;
}

// ========== Test Utilities ==========

/// Mock implementation of [`MilestoneStore`] for testing.
///
/// A **stateless** mock useful for verifying trait-object usage: reads
/// return empty results and writes succeed without persisting anything.
/// Use [`new_in_memory_store`] when a test needs real data flowing through
/// the engine.
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone, Copy, Default)]
#[non_exhaustive]
pub struct MockStore;

#[cfg(any(test, feature = "test-util"))]
impl MockStore {
    /// Create a new `MockStore` instance.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl MilestoneStore for MockStore {
    async fn insert_milestone(&mut self, _milestone: Milestone) -> Result<()> {
        Ok(())
    }

    async fn get_milestone(
        &self,
        _project: &ProjectId,
        _id: &MilestoneId,
    ) -> Result<Option<Milestone>> {
        Ok(None)
    }

    async fn list_milestones(&self, _project: &ProjectId) -> Result<Vec<Milestone>> {
        Ok(vec![])
    }

    async fn update_milestone_dependencies(
        &mut self,
        _project: &ProjectId,
        id: &MilestoneId,
        _dependencies: Vec<MilestoneDependency>,
    ) -> Result<()> {
        Err(crate::error::Error::MilestoneNotFound(id.clone()))
    }

    async fn update_milestone_dependents(
        &mut self,
        _project: &ProjectId,
        id: &MilestoneId,
        _dependents: Vec<MilestoneId>,
    ) -> Result<()> {
        Err(crate::error::Error::MilestoneNotFound(id.clone()))
    }

    async fn update_milestone_schedule(
        &mut self,
        _project: &ProjectId,
        id: &MilestoneId,
        _starts_at: DateTime<Utc>,
        _due_date: DateTime<Utc>,
    ) -> Result<()> {
        Err(crate::error::Error::MilestoneNotFound(id.clone()))
    }

    async fn export_all(&self) -> Result<Vec<Milestone>> {
        Ok(vec![])
    }
}
