//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use gantry::domain::{
    DependencyKind, Milestone, MilestoneDependency, MilestoneId, MilestoneStatus, NewDependency,
    ProjectId,
};
use gantry::error::{Error, Result};
use gantry::store::{MilestoneStore, new_in_memory_store};

/// Fixed date helper: day `day` of March 2026.
pub fn date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap()
}

/// Milestone fixture with a given schedule window.
pub fn milestone(project: &str, id: &str, name: &str, starts: u32, due: u32) -> Milestone {
    Milestone {
        id: MilestoneId::new(id),
        project_id: ProjectId::new(project),
        name: name.to_string(),
        description: format!("Description of {name}"),
        status: MilestoneStatus::NotStarted,
        starts_at: date(starts),
        due_date: date(due),
        assigned_to: vec![],
        dependencies: vec![],
        dependents: vec![],
        deliverables: vec![],
    }
}

/// Dependency edge fixture: `from` depends on `to`.
pub fn edge(from: &str, to: &str) -> MilestoneDependency {
    MilestoneDependency {
        id: format!("{from}_{to}"),
        from_milestone_id: MilestoneId::new(from),
        from_milestone_name: from.to_string(),
        to_milestone_id: MilestoneId::new(to),
        to_milestone_name: to.to_string(),
        kind: DependencyKind::FinishToStart,
        lag_days: 0,
        created_at: date(1),
        created_by: "tester".to_string(),
    }
}

/// Request fixture for `add_milestone_dependency`.
pub fn new_dependency(project: &str, from: &str, to: &str) -> NewDependency {
    NewDependency {
        project_id: ProjectId::new(project),
        from_id: MilestoneId::new(from),
        from_name: from.to_string(),
        to_id: MilestoneId::new(to),
        to_name: to.to_string(),
        kind: DependencyKind::FinishToStart,
        lag_days: 0,
        created_by: "tester".to_string(),
    }
}

/// Seed an in-memory store with milestones.
pub async fn seeded_store(milestones: Vec<Milestone>) -> Box<dyn MilestoneStore> {
    let mut store = new_in_memory_store();
    for m in milestones {
        store.insert_milestone(m).await.unwrap();
    }
    store
}

/// Store wrapper that counts document writes and can inject a failure on
/// the nth write, for verifying write-count contracts and partial-apply
/// behavior.
pub struct CountingStore {
    inner: Box<dyn MilestoneStore>,
    writes: usize,
    fail_on_write: Option<usize>,
}

impl CountingStore {
    pub fn new(inner: Box<dyn MilestoneStore>) -> Self {
        Self {
            inner,
            writes: 0,
            fail_on_write: None,
        }
    }

    /// Fail the `n`th write (1-based) with a store error.
    pub fn fail_on_write(mut self, n: usize) -> Self {
        self.fail_on_write = Some(n);
        self
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    fn tick(&mut self) -> Result<()> {
        self.writes += 1;
        if self.fail_on_write == Some(self.writes) {
            return Err(Error::Store("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MilestoneStore for CountingStore {
    async fn insert_milestone(&mut self, milestone: Milestone) -> Result<()> {
        self.inner.insert_milestone(milestone).await
    }

    async fn get_milestone(
        &self,
        project: &ProjectId,
        id: &MilestoneId,
    ) -> Result<Option<Milestone>> {
        self.inner.get_milestone(project, id).await
    }

    async fn list_milestones(&self, project: &ProjectId) -> Result<Vec<Milestone>> {
        self.inner.list_milestones(project).await
    }

    async fn update_milestone_dependencies(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        dependencies: Vec<MilestoneDependency>,
    ) -> Result<()> {
        self.tick()?;
        self.inner
            .update_milestone_dependencies(project, id, dependencies)
            .await
    }

    async fn update_milestone_dependents(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        dependents: Vec<MilestoneId>,
    ) -> Result<()> {
        self.tick()?;
        self.inner
            .update_milestone_dependents(project, id, dependents)
            .await
    }

    async fn update_milestone_schedule(
        &mut self,
        project: &ProjectId,
        id: &MilestoneId,
        starts_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Result<()> {
        self.tick()?;
        self.inner
            .update_milestone_schedule(project, id, starts_at, due_date)
            .await
    }

    async fn export_all(&self) -> Result<Vec<Milestone>> {
        self.inner.export_all().await
    }
}
