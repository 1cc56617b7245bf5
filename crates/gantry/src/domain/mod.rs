//! Domain types for milestone planning.
//!
//! This module contains the core domain types shared by the dependency graph
//! engine and the search utility. `Milestone`, `Deliverable`, and `Ticket`
//! are externally owned records; the graph engine only ever mutates the
//! dependency-related fields of a milestone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Create a new project ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a milestone, stable within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneId(pub String);

impl MilestoneId {
    /// Create a new milestone ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ID is empty (malformed data from an external writer).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MilestoneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MilestoneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Default for MilestoneId {
    fn default() -> Self {
        Self(String::new())
    }
}

/// Lifecycle state of a milestone. Mutated by external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MilestoneStatus {
    /// Work has not begun.
    NotStarted,

    /// Work is underway.
    InProgress,

    /// The milestone is done.
    Completed,
}

impl MilestoneStatus {
    /// Canonical string form, as stored and as used by search filters.
    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneStatus::NotStarted => "not-started",
            MilestoneStatus::InProgress => "in-progress",
            MilestoneStatus::Completed => "completed",
        }
    }
}

/// Semantic relationship between the two milestones' schedules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    /// The prerequisite must finish before the dependent starts.
    #[default]
    FinishToStart,

    /// The prerequisite must start before the dependent starts.
    StartToStart,

    /// The prerequisite must finish before the dependent finishes.
    FinishToFinish,

    /// The prerequisite must start before the dependent finishes.
    StartToFinish,
}

/// A directed dependency edge, embedded in the depending milestone's
/// `dependencies` list.
///
/// `from_milestone_id` is the milestone holding this edge (the dependent);
/// `to_milestone_id` is the prerequisite it depends on. The endpoint ids
/// deserialize with defaults so that documents malformed by out-of-band
/// writers surface as empty ids and can be filtered instead of failing the
/// whole read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneDependency {
    /// Deterministic composite id, `"{from}_{to}"`.
    #[serde(default)]
    pub id: String,

    /// The milestone that depends on another (the one holding this edge).
    #[serde(default)]
    pub from_milestone_id: MilestoneId,

    /// Display name of the depending milestone at creation time.
    #[serde(default)]
    pub from_milestone_name: String,

    /// The milestone being depended upon (the prerequisite).
    #[serde(default)]
    pub to_milestone_id: MilestoneId,

    /// Display name of the prerequisite at creation time.
    #[serde(default)]
    pub to_milestone_name: String,

    /// Schedule relationship between the two milestones.
    #[serde(rename = "type", default)]
    pub kind: DependencyKind,

    /// Offset in days applied when computing downstream schedules.
    #[serde(default)]
    pub lag_days: u32,

    /// When the edge was created.
    pub created_at: DateTime<Utc>,

    /// Who created the edge.
    #[serde(default)]
    pub created_by: String,
}

impl MilestoneDependency {
    /// The deterministic composite id for an edge between two milestones.
    pub fn edge_id(from: &MilestoneId, to: &MilestoneId) -> String {
        format!("{from}_{to}")
    }

    /// Whether both endpoint ids resolve to something meaningful.
    ///
    /// Edges written by buggy external collaborators can end up with missing
    /// endpoint fields; those deserialize as empty ids.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
            && !self.from_milestone_id.is_empty()
            && !self.to_milestone_id.is_empty()
    }
}

/// A named deliverable checkpoint within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Unique identifier, stable within the project.
    pub id: MilestoneId,

    /// Owning project.
    pub project_id: ProjectId,

    /// Display name.
    pub name: String,

    /// Longer description.
    pub description: String,

    /// Lifecycle state.
    pub status: MilestoneStatus,

    /// Scheduled start. Anchors duration and the forward scheduling pass.
    pub starts_at: DateTime<Utc>,

    /// Target completion instant.
    pub due_date: DateTime<Utc>,

    /// Assigned user ids (ordering irrelevant).
    #[serde(default)]
    pub assigned_to: Vec<String>,

    /// Dependency edges held by this milestone. The sole persisted
    /// representation of the graph; there is no separate edge table.
    #[serde(default)]
    pub dependencies: Vec<MilestoneDependency>,

    /// Ids of milestones that depend on this one. Mirror of the embedded
    /// edges so both directions resolve without a join.
    #[serde(default)]
    pub dependents: Vec<MilestoneId>,

    /// Associated deliverable ids (opaque to this crate).
    #[serde(default)]
    pub deliverables: Vec<String>,
}

impl Milestone {
    /// Scheduled duration in whole days, rounded up, clamped at zero.
    pub fn duration_days(&self) -> i64 {
        let secs = (self.due_date - self.starts_at).num_seconds();
        if secs <= 0 {
            0
        } else {
            (secs + 86_399) / 86_400
        }
    }
}

/// A derived graph node, constructed fresh on each call to
/// [`crate::graph::build_dependency_graph`] and never persisted.
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// Milestone id.
    pub id: MilestoneId,

    /// Milestone display name.
    pub name: String,

    /// The source milestone.
    pub milestone: Milestone,

    /// Ids of milestones this node depends on (prerequisites).
    pub dependencies: Vec<MilestoneId>,

    /// Ids of milestones that depend on this node (successors).
    pub dependents: Vec<MilestoneId>,

    /// Topological depth: 0 with no prerequisites, otherwise
    /// `max(level of prerequisites) + 1`.
    pub level: usize,

    /// Whether the node lies on the critical path (zero slack).
    pub is_on_critical_path: bool,

    /// Forward-pass earliest start.
    pub earliest_start: DateTime<Utc>,

    /// Forward-pass earliest finish.
    pub earliest_finish: DateTime<Utc>,

    /// Backward-pass latest start.
    pub latest_start: DateTime<Utc>,

    /// Backward-pass latest finish.
    pub latest_finish: DateTime<Utc>,

    /// Days the schedule can shift without delaying the project
    /// (`latest_start - earliest_start`); zero means critical.
    pub slack: i64,
}

impl DependencyGraphNode {
    /// Build the initial node for a milestone, before adjacency and
    /// scheduling passes run.
    pub(crate) fn seed(milestone: &Milestone) -> Self {
        Self {
            id: milestone.id.clone(),
            name: milestone.name.clone(),
            milestone: milestone.clone(),
            dependencies: Vec::new(),
            dependents: Vec::new(),
            level: 0,
            is_on_critical_path: false,
            earliest_start: milestone.starts_at,
            earliest_finish: milestone.due_date,
            latest_start: milestone.due_date,
            latest_finish: milestone.due_date,
            slack: 0,
        }
    }
}

/// A deliverable attached to a milestone. Searchable, otherwise opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
    /// Unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Longer description.
    pub description: String,

    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,

    /// Lifecycle state (externally owned vocabulary).
    pub status: String,

    /// Deliverable kind (externally owned vocabulary).
    #[serde(rename = "type")]
    pub kind: String,

    /// Assigned user, if any.
    #[serde(default)]
    pub assigned_to: Option<String>,

    /// Target completion instant.
    pub due_date: DateTime<Utc>,
}

/// A comment on a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketComment {
    /// Comment author.
    pub author: String,

    /// Comment body.
    pub body: String,

    /// When the comment was written.
    pub created_at: DateTime<Utc>,
}

/// A support or work ticket. Searchable, otherwise opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique identifier.
    pub id: String,

    /// Ticket title.
    pub title: String,

    /// Longer description.
    pub description: String,

    /// Lifecycle state (externally owned vocabulary).
    pub status: String,

    /// Priority (externally owned vocabulary).
    pub priority: String,

    /// Category (externally owned vocabulary).
    pub category: String,

    /// Assigned user, if any.
    #[serde(default)]
    pub assigned_to: Option<String>,

    /// When the ticket was opened.
    pub created_at: DateTime<Utc>,

    /// Discussion thread.
    #[serde(default)]
    pub comments: Vec<TicketComment>,
}

/// Request to create a dependency edge between two milestones.
#[derive(Debug, Clone)]
pub struct NewDependency {
    /// Project both milestones belong to.
    pub project_id: ProjectId,

    /// The depending milestone.
    pub from_id: MilestoneId,

    /// Display name of the depending milestone.
    pub from_name: String,

    /// The prerequisite milestone.
    pub to_id: MilestoneId,

    /// Display name of the prerequisite.
    pub to_name: String,

    /// Schedule relationship.
    pub kind: DependencyKind,

    /// Offset in days applied to downstream scheduling.
    pub lag_days: u32,

    /// Actor creating the edge, recorded for audit.
    pub created_by: String,
}
