//! Schedule cascading and dependency suggestions.
//!
//! Planning helpers layered on top of the dependency graph: pushing date
//! changes forward through dependents, and heuristically proposing edges the
//! user may want to create.

use crate::domain::{Milestone, MilestoneId, ProjectId};
use crate::error::Result;
use crate::store::MilestoneStore;
use chrono::Duration;
use std::collections::{HashSet, VecDeque};

/// Ordered workflow keywords used for sequence suggestions.
///
/// A milestone whose name contains one keyword is suggested as a
/// prerequisite of a milestone containing the next keyword in the list.
const WORKFLOW_KEYWORDS: [&str; 7] = [
    "design",
    "develop",
    "test",
    "deploy",
    "plan",
    "implement",
    "review",
];

/// Window in days within which date proximity produces a suggestion.
const SUGGESTION_WINDOW_DAYS: i64 = 30;

/// Push a milestone's date change forward through its dependents.
///
/// Each dependent whose start would now fall before its predecessor's finish
/// is shifted: its new start is the predecessor's due date plus one day plus
/// the connecting edge's `lag_days`, and its duration is preserved. Shifts
/// only ever move milestones later, never earlier. One schedule write is
/// issued per shift; a shifted milestone re-enters the worklist every time a
/// deeper predecessor moves it again, so its own dependents always reconcile
/// against its final dates. On acyclic data the forward-only shift rule
/// settles; a pop budget of the squared project size bounds the loop on data
/// corrupted into a cycle, which would otherwise push dates forward
/// indefinitely.
///
/// # Errors
///
/// Store failures propagate unmodified. A missing `changed` milestone is a
/// no-op; missing dependents are skipped.
pub async fn cascade_date_changes(
    store: &mut dyn MilestoneStore,
    project: &ProjectId,
    changed: &MilestoneId,
) -> Result<()> {
    let mut queue: VecDeque<MilestoneId> = VecDeque::new();
    let mut queued: HashSet<MilestoneId> = HashSet::new();
    queue.push_back(changed.clone());
    queued.insert(changed.clone());

    let node_count = store.list_milestones(project).await?.len();
    let mut budget = node_count.saturating_mul(node_count).max(1);

    while let Some(current_id) = queue.pop_front() {
        queued.remove(&current_id);
        if budget == 0 {
            tracing::warn!(
                project = %project,
                "cascade did not settle; dependency data may be cyclic"
            );
            break;
        }
        budget -= 1;

        let Some(current) = store.get_milestone(project, &current_id).await? else {
            continue;
        };

        for dependent_id in &current.dependents {
            let Some(dependent) = store.get_milestone(project, dependent_id).await? else {
                continue;
            };

            // The connecting edge's lag widens the gap after the
            // predecessor's finish.
            let lag = dependent
                .dependencies
                .iter()
                .find(|edge| edge.to_milestone_id == current_id)
                .map_or(0, |edge| i64::from(edge.lag_days));

            let new_start = current.due_date + Duration::days(1 + lag);
            if new_start <= dependent.starts_at {
                continue;
            }

            let duration = Duration::days(dependent.duration_days());
            store
                .update_milestone_schedule(project, dependent_id, new_start, new_start + duration)
                .await?;

            tracing::debug!(
                milestone = %dependent_id,
                new_start = %new_start,
                "cascaded schedule shift"
            );
            if queued.insert(dependent_id.clone()) {
                queue.push_back(dependent_id.clone());
            }
        }
    }

    Ok(())
}

/// A heuristically proposed dependency edge.
#[derive(Debug, Clone)]
pub struct DependencySuggestion {
    /// Proposed prerequisite.
    pub from: Milestone,

    /// Proposed dependent.
    pub to: Milestone,

    /// Human-readable rationale.
    pub reason: String,

    /// Confidence in `[0.0, 1.0]`; higher sorts first.
    pub confidence: f64,
}

/// Suggest dependencies based on milestone names and dates.
///
/// Two heuristics, applied to every ordered pair:
///
/// - **Date proximity**: if one milestone's due date falls within
///   [`SUGGESTION_WINDOW_DAYS`] before another's, suggest it as a
///   prerequisite with confidence decaying over the gap (floor 0.3).
/// - **Workflow sequence**: if the names contain consecutive
///   [`WORKFLOW_KEYWORDS`] ("design" before "develop", and so on), suggest
///   the earlier stage as a prerequisite with confidence 0.8.
///
/// Returns suggestions sorted by confidence, highest first. Purely
/// in-memory; nothing is persisted.
pub fn suggest_dependencies(milestones: &[Milestone]) -> Vec<DependencySuggestion> {
    let mut suggestions = Vec::new();

    for (i, m1) in milestones.iter().enumerate() {
        for m2 in milestones.iter().skip(i + 1) {
            if m1.due_date < m2.due_date {
                let gap = (m2.due_date - m1.due_date).num_days();
                if gap <= SUGGESTION_WINDOW_DAYS {
                    let confidence =
                        (1.0 - gap as f64 / SUGGESTION_WINDOW_DAYS as f64).max(0.3);
                    suggestions.push(DependencySuggestion {
                        from: m1.clone(),
                        to: m2.clone(),
                        reason: format!("{} ends {gap} days before {} starts", m1.name, m2.name),
                        confidence,
                    });
                }
            }

            let name1 = m1.name.to_lowercase();
            let name2 = m2.name.to_lowercase();
            for pair in WORKFLOW_KEYWORDS.windows(2) {
                if name1.contains(pair[0]) && name2.contains(pair[1]) {
                    suggestions.push(DependencySuggestion {
                        from: m1.clone(),
                        to: m2.clone(),
                        reason: format!("Sequential workflow: {} -> {}", pair[0], pair[1]),
                        confidence: 0.8,
                    });
                }
            }
        }
    }

    suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    suggestions
}
