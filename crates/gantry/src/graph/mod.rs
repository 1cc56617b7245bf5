//! Milestone dependency graph engine.
//!
//! Builds an in-memory directed graph from the per-milestone edges persisted
//! by a [`MilestoneStore`], detects cycles before any edge is committed,
//! computes topological levels, and derives the critical path.
//!
//! # Edge direction convention
//!
//! An edge means "`from` depends on `to`": `from_milestone_id` is the
//! dependent holding the edge, `to_milestone_id` is the prerequisite that
//! must complete first (per the edge's [`crate::domain::DependencyKind`]
//! semantics). Each
//! edge is stored once, embedded in the dependent's `dependencies` list,
//! with the prerequisite's `dependents` list mirroring the reverse direction
//! so both lookups resolve without a join.
//!
//! # Consistency model
//!
//! [`add_milestone_dependency`] and [`remove_milestone_dependency`] each
//! issue two sequential document writes. The store offers no multi-document
//! transaction, so:
//!
//! - If the second write fails after the first succeeded, the graph is left
//!   half-applied. The error propagates; callers must treat the operation as
//!   a single logical unit and reconcile on failure.
//! - Two concurrent adds can both pass cycle detection against a stale read
//!   and together introduce a cycle. This race is a documented limitation of
//!   the read-check-write protocol, not hidden by the engine; read paths are
//!   defensive against the resulting state (bounded traversals, best-effort
//!   leveling).
//!
//! No operation retries, rolls back, or imposes timeouts beyond what the
//! store itself provides.

mod critical_path;
mod planning;

pub use critical_path::calculate_critical_path;
pub use planning::{DependencySuggestion, cascade_date_changes, suggest_dependencies};

use crate::domain::{
    DependencyGraphNode, Milestone, MilestoneDependency, MilestoneId, NewDependency, ProjectId,
};
use crate::error::{Error, Result};
use crate::store::MilestoneStore;
use chrono::Utc;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Add a directed dependency edge: `from` depends on `to`.
///
/// Validation happens before any write: self-dependencies are rejected
/// without touching the store, then the **persisted** prerequisite chain of
/// `to` is walked to prove the edge cannot close a loop, then duplicates are
/// rejected. On success exactly two documents are updated - the edge is
/// appended to `from`'s `dependencies` and `from` is added to `to`'s
/// `dependents`. On any rejection, zero writes occur.
///
/// # Errors
///
/// - [`Error::SelfDependency`] if `from == to`
/// - [`Error::CircularDependency`] if the edge would close a loop
/// - [`Error::MilestoneNotFound`] if either endpoint does not resolve
/// - [`Error::DependencyExists`] if the edge is already present
/// - Store failures propagate unmodified; a failure on the second write
///   leaves the first applied (see module docs)
pub async fn add_milestone_dependency(
    store: &mut dyn MilestoneStore,
    req: NewDependency,
) -> Result<MilestoneDependency> {
    // Self-dependency is rejected before any persistence read.
    if req.from_id == req.to_id {
        return Err(Error::SelfDependency);
    }

    if check_circular_dependency(store, &req.project_id, &req.from_id, &req.to_id).await? {
        return Err(Error::CircularDependency {
            from: req.from_id,
            to: req.to_id,
        });
    }

    let from = store
        .get_milestone(&req.project_id, &req.from_id)
        .await?
        .ok_or_else(|| Error::MilestoneNotFound(req.from_id.clone()))?;
    let to = store
        .get_milestone(&req.project_id, &req.to_id)
        .await?
        .ok_or_else(|| Error::MilestoneNotFound(req.to_id.clone()))?;

    let edge_id = MilestoneDependency::edge_id(&req.from_id, &req.to_id);
    if from.dependencies.iter().any(|d| d.id == edge_id) {
        return Err(Error::DependencyExists {
            from: req.from_id,
            to: req.to_id,
        });
    }

    let edge = MilestoneDependency {
        id: edge_id,
        from_milestone_id: req.from_id.clone(),
        from_milestone_name: req.from_name,
        to_milestone_id: req.to_id.clone(),
        to_milestone_name: req.to_name,
        kind: req.kind,
        lag_days: req.lag_days,
        created_at: Utc::now(),
        created_by: req.created_by,
    };

    // Two sequential writes; no rollback if the second fails.
    let mut dependencies = from.dependencies;
    dependencies.push(edge.clone());
    store
        .update_milestone_dependencies(&req.project_id, &req.from_id, dependencies)
        .await?;

    let mut dependents = to.dependents;
    if !dependents.contains(&req.from_id) {
        dependents.push(req.from_id.clone());
    }
    store
        .update_milestone_dependents(&req.project_id, &req.to_id, dependents)
        .await?;

    Ok(edge)
}

/// Remove the edge `from -> to`, if present, from both milestones' stored
/// dependency state.
///
/// Idempotent with respect to the edge itself: removing an edge that does
/// not exist still rewrites both documents with their (unchanged) filtered
/// lists. Both milestones must exist.
///
/// # Errors
///
/// - [`Error::MilestoneNotFound`] if either endpoint does not resolve
/// - Store failures propagate unmodified
pub async fn remove_milestone_dependency(
    store: &mut dyn MilestoneStore,
    project: &ProjectId,
    from: &MilestoneId,
    to: &MilestoneId,
) -> Result<()> {
    let from_milestone = store
        .get_milestone(project, from)
        .await?
        .ok_or_else(|| Error::MilestoneNotFound(from.clone()))?;
    let to_milestone = store
        .get_milestone(project, to)
        .await?
        .ok_or_else(|| Error::MilestoneNotFound(to.clone()))?;

    let edge_id = MilestoneDependency::edge_id(from, to);

    let mut dependencies = from_milestone.dependencies;
    dependencies.retain(|d| d.id != edge_id);
    store
        .update_milestone_dependencies(project, from, dependencies)
        .await?;

    let mut dependents = to_milestone.dependents;
    dependents.retain(|id| id != from);
    store
        .update_milestone_dependents(project, to, dependents)
        .await?;

    Ok(())
}

/// Pure predicate: would adding edge `from -> to` create a cycle?
///
/// Walks the persisted "depends on" relation breadth-first starting from
/// `to`'s dependency chain, looking for `from`. Ids that do not resolve
/// contribute nothing to the walk - absence is not itself a cycle. The
/// traversal is bounded by a visited set, so it terminates even on data
/// already malformed into a loop.
pub async fn check_circular_dependency(
    store: &dyn MilestoneStore,
    project: &ProjectId,
    from: &MilestoneId,
    to: &MilestoneId,
) -> Result<bool> {
    let mut visited: HashSet<MilestoneId> = HashSet::new();
    let mut queue: VecDeque<MilestoneId> = VecDeque::new();
    queue.push_back(to.clone());

    while let Some(current) = queue.pop_front() {
        if current == *from {
            return Ok(true);
        }
        if !visited.insert(current.clone()) {
            continue;
        }

        let Some(milestone) = store.get_milestone(project, &current).await? else {
            // Unresolved id: nothing to follow.
            continue;
        };
        for edge in &milestone.dependencies {
            if !visited.contains(&edge.to_milestone_id) {
                queue.push_back(edge.to_milestone_id.clone());
            }
        }
    }

    Ok(false)
}

/// Aggregate every dependency edge embedded across a project's milestones
/// into one flat, de-duplicated list.
///
/// De-duplication key is the edge `id`; the first occurrence wins. Entries
/// with a malformed shape (empty endpoint ids, written by an out-of-band
/// collaborator) are dropped with a warning rather than raising.
pub async fn get_project_dependencies(
    store: &dyn MilestoneStore,
    project: &ProjectId,
) -> Result<Vec<MilestoneDependency>> {
    let milestones = store.list_milestones(project).await?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut edges = Vec::new();

    for milestone in &milestones {
        for edge in &milestone.dependencies {
            if !edge.is_well_formed() {
                tracing::warn!(
                    milestone = %milestone.id,
                    project = %project,
                    "dropping malformed dependency edge"
                );
                continue;
            }
            if seen.insert(edge.id.clone()) {
                edges.push(edge.clone());
            }
        }
    }

    Ok(edges)
}

/// Build the full dependency graph for a milestone set.
///
/// Nodes come back in the order of `milestones`. Adjacency is populated from
/// the project's aggregated edge list (edges whose endpoints are not in the
/// set are ignored), topological levels are computed, and the schedule
/// passes run so every node carries earliest/latest windows, slack, and its
/// critical-path flag.
///
/// The leveling pass must not hang on data corrupted into a cycle behind the
/// write-time check: if topological sorting fails, a warning is emitted and
/// all nodes keep best-effort level 0.
pub async fn build_dependency_graph(
    store: &dyn MilestoneStore,
    project: &ProjectId,
    milestones: &[Milestone],
) -> Result<Vec<DependencyGraphNode>> {
    let edges = get_project_dependencies(store, project).await?;

    let mut nodes: Vec<DependencyGraphNode> =
        milestones.iter().map(DependencyGraphNode::seed).collect();
    let index_of: HashMap<MilestoneId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();

    for edge in &edges {
        let (Some(&from), Some(&to)) = (
            index_of.get(&edge.from_milestone_id),
            index_of.get(&edge.to_milestone_id),
        ) else {
            continue;
        };
        nodes[from].dependencies.push(edge.to_milestone_id.clone());
        nodes[to].dependents.push(edge.from_milestone_id.clone());
    }

    compute_levels(&mut nodes, &index_of);

    let critical: HashSet<MilestoneId> = calculate_critical_path(&mut nodes).into_iter().collect();
    for node in &mut nodes {
        node.is_on_critical_path = critical.contains(&node.id);
    }

    Ok(nodes)
}

/// Assign topological levels: prerequisites-free nodes at 0, every other
/// node one past its deepest prerequisite.
fn compute_levels(nodes: &mut [DependencyGraphNode], index_of: &HashMap<MilestoneId, usize>) {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut petgraph_index: Vec<NodeIndex> = Vec::with_capacity(nodes.len());
    for i in 0..nodes.len() {
        petgraph_index.push(graph.add_node(i));
    }

    // Edges run prerequisite -> dependent so a topological order visits
    // prerequisites first.
    for (i, node) in nodes.iter().enumerate() {
        for dep in &node.dependencies {
            if let Some(&j) = index_of.get(dep) {
                graph.add_edge(petgraph_index[j], petgraph_index[i], ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => {
            for idx in order {
                let i = graph[idx];
                let level = graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .map(|pred| nodes[graph[pred]].level + 1)
                    .max()
                    .unwrap_or(0);
                nodes[i].level = level;
            }
        }
        Err(_) => {
            // Corrupted out-of-band: write-time validation should have made
            // this unreachable. Levels stay at 0 rather than looping.
            tracing::warn!("dependency graph contains a cycle; levels left at 0");
        }
    }
}
