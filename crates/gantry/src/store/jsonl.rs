//! JSONL persistence for the in-memory milestone store.
//!
//! Each line of the file is one serialized [`Milestone`] document. Loading is
//! resilient: malformed lines are skipped, edges pointing at milestones that
//! do not exist are stripped, and projects whose persisted graph is cyclic
//! (corrupted by an out-of-band writer) are flagged - all reported as
//! [`LoadWarning`]s rather than hard failures, so one bad record never takes
//! down the whole data set.

use crate::domain::{Milestone, MilestoneId, ProjectId};
use crate::error::{Error, Result};
use crate::store::MilestoneStore;
use crate::store::in_memory::new_in_memory_store;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Warnings that can occur during JSONL file loading.
///
/// These are non-fatal: loading continues, but the flagged data is skipped or
/// sanitized. Callers should log or surface them, since they indicate data
/// written or corrupted outside this crate's write path.
#[derive(Debug, Clone)]
pub enum LoadWarning {
    /// A line that could not be parsed as a milestone document.
    ///
    /// The line is skipped entirely.
    MalformedJson {
        /// 1-based line number in the file.
        line_number: usize,
        /// Parser error text.
        error: String,
    },

    /// An edge referencing a milestone that does not exist in the project.
    ///
    /// The edge is stripped; both milestones (where present) still load.
    OrphanedDependency {
        /// The depending milestone.
        from: MilestoneId,
        /// The missing prerequisite.
        to: MilestoneId,
    },

    /// A project whose persisted dependency graph contains a cycle.
    ///
    /// The data loads as-is; graph construction is defensive against cycles,
    /// but write-time validation should have prevented this state.
    CyclicProject {
        /// The affected project.
        project: ProjectId,
    },
}

/// Load a store from a JSONL file.
///
/// Returns the populated store together with all non-fatal warnings
/// encountered. A missing file is an error; an empty file yields an empty
/// store.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read.
pub async fn load_from_jsonl(path: &Path) -> Result<(Box<dyn MilestoneStore>, Vec<LoadWarning>)> {
    let contents = tokio::fs::read_to_string(path).await.map_err(Error::Io)?;

    let mut warnings = Vec::new();
    let mut milestones: Vec<Milestone> = Vec::new();

    // First pass: parse lines, skipping malformed ones.
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Milestone>(line) {
            Ok(milestone) => milestones.push(milestone),
            Err(e) => warnings.push(LoadWarning::MalformedJson {
                line_number: index + 1,
                error: e.to_string(),
            }),
        }
    }

    // Second pass: strip edges whose prerequisite is not in the project.
    let known: HashSet<(ProjectId, MilestoneId)> = milestones
        .iter()
        .map(|m| (m.project_id.clone(), m.id.clone()))
        .collect();

    for milestone in &mut milestones {
        let project = milestone.project_id.clone();
        let from = milestone.id.clone();
        milestone.dependencies.retain(|edge| {
            let resolves = known.contains(&(project.clone(), edge.to_milestone_id.clone()));
            if !resolves {
                warnings.push(LoadWarning::OrphanedDependency {
                    from: from.clone(),
                    to: edge.to_milestone_id.clone(),
                });
            }
            resolves
        });
    }

    // Third pass: flag projects whose persisted graph is cyclic.
    for project in cyclic_projects(&milestones) {
        tracing::warn!(project = %project, "persisted dependency graph contains a cycle");
        warnings.push(LoadWarning::CyclicProject { project });
    }

    let mut store = new_in_memory_store();
    for milestone in milestones {
        store.insert_milestone(milestone).await?;
    }

    Ok((store, warnings))
}

/// Save a store to a JSONL file with atomic writes.
///
/// Writes every milestone to a temporary file first, then renames it over the
/// target path. Renames within one filesystem are atomic on POSIX, so a crash
/// mid-write leaves the original file intact.
///
/// # Errors
///
/// Returns [`Error::Io`] on file failures and [`Error::Json`] if a milestone
/// fails to serialize.
pub async fn save_to_jsonl(store: &dyn MilestoneStore, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("jsonl.tmp");

    let file = File::create(&temp_path).await.map_err(Error::Io)?;
    let mut writer = BufWriter::new(file);

    let milestones = store.export_all().await?;
    for milestone in &milestones {
        let json = serde_json::to_string(milestone)?;
        writer.write_all(json.as_bytes()).await.map_err(Error::Io)?;
        writer.write_all(b"\n").await.map_err(Error::Io)?;
    }

    writer.flush().await.map_err(Error::Io)?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        // Best-effort cleanup so a stale temp file is not left behind.
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(Error::Io(e));
    }

    Ok(())
}

/// Projects whose embedded edges form at least one cycle.
fn cyclic_projects(milestones: &[Milestone]) -> Vec<ProjectId> {
    let mut by_project: HashMap<&ProjectId, Vec<&Milestone>> = HashMap::new();
    for m in milestones {
        by_project.entry(&m.project_id).or_default().push(m);
    }

    let mut cyclic = Vec::new();
    for (project, members) in by_project {
        let mut graph: DiGraph<&MilestoneId, ()> = DiGraph::new();
        let mut nodes = HashMap::new();
        for m in &members {
            nodes.insert(&m.id, graph.add_node(&m.id));
        }
        for m in &members {
            for edge in &m.dependencies {
                if let (Some(&from), Some(&to)) =
                    (nodes.get(&m.id), nodes.get(&edge.to_milestone_id))
                {
                    graph.add_edge(from, to, ());
                }
            }
        }
        if toposort(&graph, None).is_err() {
            cyclic.push(project.clone());
        }
    }
    cyclic.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    cyclic
}
