//! Critical path computation via forward and backward scheduling passes.

use crate::domain::{DependencyGraphNode, MilestoneId};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Ceiling division of seconds into whole days.
fn ceil_days(seconds: i64) -> i64 {
    (seconds + 86_399).div_euclid(86_400)
}

/// Run the forward and backward passes over a leveled node set and return
/// the critical path: the ids of every node with zero slack, in input order.
///
/// The forward pass walks nodes in level order computing earliest
/// start/finish (a node with no prerequisites starts at its milestone's
/// scheduled start; otherwise at the latest earliest-finish among its
/// prerequisites). The backward pass walks in reverse computing latest
/// finish/start (a node with no dependents may finish at its earliest
/// finish; otherwise by the earliest latest-start among its dependents).
/// Slack is `latest_start - earliest_start` in whole days.
///
/// Properties:
/// - Empty input produces empty output.
/// - An isolated node (no edges either way) has zero slack and is included.
/// - Parallel zero-slack chains are all included; the critical path of a DAG
///   need not be a single linear chain.
pub fn calculate_critical_path(nodes: &mut [DependencyGraphNode]) -> Vec<MilestoneId> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let index_of: HashMap<MilestoneId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();

    // Process in level order without permuting the caller's slice.
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by_key(|&i| nodes[i].level);

    let durations: Vec<Duration> = nodes
        .iter()
        .map(|n| Duration::days(n.milestone.duration_days()))
        .collect();

    // Forward pass: earliest start / finish.
    let mut earliest_start: Vec<DateTime<Utc>> =
        nodes.iter().map(|n| n.milestone.starts_at).collect();
    let mut earliest_finish: Vec<DateTime<Utc>> = earliest_start.clone();

    for &i in &order {
        let es = if nodes[i].dependencies.is_empty() {
            nodes[i].milestone.starts_at
        } else {
            nodes[i]
                .dependencies
                .iter()
                .filter_map(|dep| index_of.get(dep))
                .map(|&j| earliest_finish[j])
                .max()
                .unwrap_or(nodes[i].milestone.starts_at)
        };
        earliest_start[i] = es;
        earliest_finish[i] = es + durations[i];
    }

    // Backward pass: latest finish / start, then slack.
    let mut latest_finish: Vec<DateTime<Utc>> = earliest_finish.clone();
    let mut latest_start: Vec<DateTime<Utc>> = earliest_start.clone();

    for &i in order.iter().rev() {
        let lf = if nodes[i].dependents.is_empty() {
            earliest_finish[i]
        } else {
            nodes[i]
                .dependents
                .iter()
                .filter_map(|dep| index_of.get(dep))
                .map(|&j| latest_start[j])
                .min()
                .unwrap_or(earliest_finish[i])
        };
        latest_finish[i] = lf;
        latest_start[i] = lf - durations[i];
    }

    for (i, node) in nodes.iter_mut().enumerate() {
        node.earliest_start = earliest_start[i];
        node.earliest_finish = earliest_finish[i];
        node.latest_start = latest_start[i];
        node.latest_finish = latest_finish[i];
        node.slack = ceil_days((latest_start[i] - earliest_start[i]).num_seconds());
    }

    nodes
        .iter()
        .filter(|n| n.slack == 0)
        .map(|n| n.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Milestone, MilestoneStatus, ProjectId};
    use chrono::TimeZone;

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap()
    }

    fn node(id: &str, starts: u32, due: u32, level: usize) -> DependencyGraphNode {
        let milestone = Milestone {
            id: MilestoneId::new(id),
            project_id: ProjectId::new("p1"),
            name: id.to_string(),
            description: String::new(),
            status: MilestoneStatus::NotStarted,
            starts_at: date(starts),
            due_date: date(due),
            assigned_to: vec![],
            dependencies: vec![],
            dependents: vec![],
            deliverables: vec![],
        };
        let mut n = DependencyGraphNode::seed(&milestone);
        n.level = level;
        n
    }

    fn link(nodes: &mut [DependencyGraphNode], from: usize, to: usize) {
        let to_id = nodes[to].id.clone();
        let from_id = nodes[from].id.clone();
        nodes[from].dependencies.push(to_id);
        nodes[to].dependents.push(from_id);
    }

    #[test]
    fn empty_input_yields_empty_path() {
        let mut nodes: Vec<DependencyGraphNode> = vec![];
        assert!(calculate_critical_path(&mut nodes).is_empty());
    }

    #[test]
    fn isolated_node_has_zero_slack() {
        let mut nodes = vec![node("m1", 1, 5, 0)];
        let path = calculate_critical_path(&mut nodes);
        assert_eq!(path, vec![MilestoneId::new("m1")]);
        assert_eq!(nodes[0].slack, 0);
        assert_eq!(nodes[0].earliest_start, date(1));
        assert_eq!(nodes[0].earliest_finish, date(5));
    }

    #[test]
    fn linear_chain_is_fully_critical() {
        let mut nodes = vec![node("m1", 1, 5, 0), node("m2", 5, 10, 1), node("m3", 10, 12, 2)];
        link(&mut nodes, 1, 0);
        link(&mut nodes, 2, 1);

        let path = calculate_critical_path(&mut nodes);
        assert_eq!(
            path,
            vec![
                MilestoneId::new("m1"),
                MilestoneId::new("m2"),
                MilestoneId::new("m3")
            ]
        );
        // Chained earliest starts follow the predecessor's finish.
        assert_eq!(nodes[1].earliest_start, nodes[0].earliest_finish);
        assert_eq!(nodes[2].earliest_start, nodes[1].earliest_finish);
    }

    #[test]
    fn short_parallel_branch_gains_slack() {
        // m3 waits on both m1 (4 days) and m2 (1 day); the shorter branch
        // can slip by the difference.
        let mut nodes = vec![node("m1", 1, 5, 0), node("m2", 1, 2, 0), node("m3", 5, 8, 1)];
        link(&mut nodes, 2, 0);
        link(&mut nodes, 2, 1);

        let path = calculate_critical_path(&mut nodes);
        assert!(path.contains(&MilestoneId::new("m1")));
        assert!(path.contains(&MilestoneId::new("m3")));
        assert!(!path.contains(&MilestoneId::new("m2")));
        assert_eq!(nodes[1].slack, 3);
    }

    #[test]
    fn parallel_equal_branches_are_all_critical() {
        // Two branches of identical length feeding one sink: ties keep both.
        let mut nodes = vec![node("a", 1, 5, 0), node("b", 1, 5, 0), node("sink", 5, 7, 1)];
        link(&mut nodes, 2, 0);
        link(&mut nodes, 2, 1);

        let path = calculate_critical_path(&mut nodes);
        assert_eq!(path.len(), 3);
    }
}
