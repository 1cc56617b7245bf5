//! In-memory milestone store backed by a `HashMap`.
//!
//! All data is held in RAM and lost when the process exits. Suitable for
//! testing, development, and as the working set behind the JSONL backend
//! (see [`super::jsonl`]).
//!
//! # Thread Safety
//!
//! The store is wrapped in `Arc<tokio::sync::Mutex<Inner>>` so a single
//! instance can be shared across tasks. Every operation acquires the lock
//! for its full duration, which makes each trait method atomic - but
//! sequences of calls (read, check, write) are still subject to the races
//! documented in [`crate::graph`].

use crate::domain::{Milestone, MilestoneDependency, MilestoneId, ProjectId};
use crate::error::{Error, Result};
use crate::store::MilestoneStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Inner storage structure (not thread-safe on its own).
///
/// Milestones are keyed by `(project, milestone)` since milestone ids are
/// only guaranteed stable within one project. Insertion order per project is
/// tracked separately so `list_milestones` is deterministic.
pub(crate) struct InMemoryStoreInner {
    /// Milestone documents indexed for O(1) lookups.
    milestones: HashMap<(ProjectId, MilestoneId), Milestone>,

    /// Per-project insertion order for stable listing.
    order: HashMap<ProjectId, Vec<MilestoneId>>,
}

impl InMemoryStoreInner {
    pub(crate) fn new() -> Self {
        Self {
            milestones: HashMap::new(),
            order: HashMap::new(),
        }
    }

    fn get_mut(&mut self, project: &ProjectId, id: &MilestoneId) -> Result<&mut Milestone> {
        self.milestones
            .get_mut(&(project.clone(), id.clone()))
            .ok_or_else(|| Error::MilestoneNotFound(id.clone()))
    }
}

/// Thread-safe in-memory store.
pub(crate) type InMemoryStore = Arc<Mutex<InMemoryStoreInner>>;

/// Create a new empty in-memory store.
///
/// # Example
///
/// ```
/// use gantry::store::new_in_memory_store;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = new_in_memory_store();
///     // Seed milestones, then drive the graph engine...
/// }
/// ```
pub fn new_in_memory_store() -> Box<dyn MilestoneStore> {
    Box::new(Arc::new(Mutex::new(InMemoryStoreInner::new())))
}

#[async_trait]
impl MilestoneStore for InMemoryStore {
    async fn insert_milestone(&mut self, milestone: Milestone) -> Result<()> {
        let mut inner = self.lock().await;

        let key = (milestone.project_id.clone(), milestone.id.clone());
        if !inner.milestones.contains_key(&key) {
            inner
                .order
                .entry(milestone.project_id.clone())
                .or_default()
                .push(milestone.id.clone());
        }
        inner.milestones.insert(key, milestone);
        Ok(())
    }

    async fn get_milestone(
        &self,
        project: &ProjectId,
        id: &MilestoneId,
    ) -> Result<Option<Milestone>> {
        let inner = self.lock().await;
        Ok(inner
            .milestones
            .get(&(project.clone(), id.clone()))
            .cloned())
    }

    async fn list_milestones(&self, project: &ProjectId) -> Result<Vec<Milestone>> {
        let inner = self.lock().await;

        let Some(ids) = inner.order.get(project) else {
            return Ok(vec![]);
        };
        Ok(ids
            .iter()
            .filter_map(|id| inner.milestones.get(&(project.clone(), id.clone())))
            .cloned()
            .collect())
    }

    async fn update_milestone_dependencies(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        dependencies: Vec<MilestoneDependency>,
    ) -> Result<()> {
        let mut inner = self.lock().await;
        inner.get_mut(project, id)?.dependencies = dependencies;
        Ok(())
    }

    async fn update_milestone_dependents(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        dependents: Vec<MilestoneId>,
    ) -> Result<()> {
        let mut inner = self.lock().await;
        inner.get_mut(project, id)?.dependents = dependents;
        Ok(())
    }

    async fn update_milestone_schedule(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        starts_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.lock().await;
        let milestone = inner.get_mut(project, id)?;
        milestone.starts_at = starts_at;
        milestone.due_date = due_date;
        Ok(())
    }

    async fn export_all(&self) -> Result<Vec<Milestone>> {
        let inner = self.lock().await;

        // Deterministic export order: projects sorted, milestones in
        // insertion order within each project.
        let mut projects: Vec<&ProjectId> = inner.order.keys().collect();
        projects.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let mut all = Vec::with_capacity(inner.milestones.len());
        for project in projects {
            for id in &inner.order[project] {
                if let Some(m) = inner.milestones.get(&(project.clone(), id.clone())) {
                    all.push(m.clone());
                }
            }
        }
        Ok(all)
    }
}
