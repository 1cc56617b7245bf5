//! Persistence tests: JSONL save/load round-trips and resilient loading.

mod common;

use anyhow::Result;
use common::{edge, milestone, new_dependency, seeded_store};
use gantry::domain::ProjectId;
use gantry::graph::add_milestone_dependency;
use gantry::store::{LoadWarning, MilestoneStore, load_from_jsonl, save_to_jsonl};
use tempfile::tempdir;

#[tokio::test]
async fn save_load_roundtrip_preserves_milestones_and_edges() -> Result<()> {
    let mut store = seeded_store(vec![
        milestone("p1", "m1", "Design", 1, 5),
        milestone("p1", "m2", "Develop", 6, 12),
        milestone("p2", "m1", "Kickoff", 1, 3),
    ])
    .await;
    add_milestone_dependency(&mut *store, new_dependency("p1", "m2", "m1")).await?;

    let dir = tempdir()?;
    let path = dir.path().join("milestones.jsonl");
    save_to_jsonl(&*store, &path).await?;

    let (loaded, warnings) = load_from_jsonl(&path).await?;
    assert!(warnings.is_empty());

    let p1 = loaded.list_milestones(&ProjectId::new("p1")).await?;
    assert_eq!(p1.len(), 2);
    let m2 = p1.iter().find(|m| m.id.as_str() == "m2").unwrap();
    assert_eq!(m2.dependencies.len(), 1);
    assert_eq!(m2.dependencies[0].id, "m2_m1");

    let p2 = loaded.list_milestones(&ProjectId::new("p2")).await?;
    assert_eq!(p2.len(), 1);
    Ok(())
}

#[tokio::test]
async fn save_does_not_leave_a_temp_file_behind() -> Result<()> {
    let store = seeded_store(vec![milestone("p1", "m1", "Design", 1, 5)]).await;

    let dir = tempdir()?;
    let path = dir.path().join("milestones.jsonl");
    save_to_jsonl(&*store, &path).await?;

    assert!(path.exists());
    assert!(!dir.path().join("milestones.jsonl.tmp").exists());
    Ok(())
}

#[tokio::test]
async fn malformed_lines_are_skipped_with_a_warning() -> Result<()> {
    let store = seeded_store(vec![milestone("p1", "m1", "Design", 1, 5)]).await;

    let dir = tempdir()?;
    let path = dir.path().join("milestones.jsonl");
    save_to_jsonl(&*store, &path).await?;

    // Corrupt the file by appending garbage.
    let mut contents = tokio::fs::read_to_string(&path).await?;
    contents.push_str("this is not json\n");
    tokio::fs::write(&path, contents).await?;

    let (loaded, warnings) = load_from_jsonl(&path).await?;
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        warnings[0],
        LoadWarning::MalformedJson { line_number: 2, .. }
    ));
    assert_eq!(loaded.list_milestones(&ProjectId::new("p1")).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn orphaned_edges_are_stripped_with_a_warning() -> Result<()> {
    let mut orphaned = milestone("p1", "m1", "Design", 1, 5);
    orphaned.dependencies.push(edge("m1", "ghost"));
    let store = seeded_store(vec![orphaned]).await;

    let dir = tempdir()?;
    let path = dir.path().join("milestones.jsonl");
    save_to_jsonl(&*store, &path).await?;

    let (loaded, warnings) = load_from_jsonl(&path).await?;
    assert!(warnings.iter().any(|w| matches!(
        w,
        LoadWarning::OrphanedDependency { from, to }
            if from.as_str() == "m1" && to.as_str() == "ghost"
    )));

    let m1 = loaded
        .get_milestone(&ProjectId::new("p1"), &"m1".into())
        .await?
        .unwrap();
    assert!(m1.dependencies.is_empty());
    Ok(())
}

#[tokio::test]
async fn cyclic_projects_are_flagged_but_still_load() -> Result<()> {
    // Mutually dependent milestones, written by something that bypassed
    // write-time validation.
    let mut m1 = milestone("p1", "m1", "Design", 1, 5);
    m1.dependencies.push(edge("m1", "m2"));
    let mut m2 = milestone("p1", "m2", "Develop", 6, 12);
    m2.dependencies.push(edge("m2", "m1"));
    let store = seeded_store(vec![m1, m2]).await;

    let dir = tempdir()?;
    let path = dir.path().join("milestones.jsonl");
    save_to_jsonl(&*store, &path).await?;

    let (loaded, warnings) = load_from_jsonl(&path).await?;
    assert!(warnings.iter().any(|w| matches!(
        w,
        LoadWarning::CyclicProject { project } if project.as_str() == "p1"
    )));
    assert_eq!(loaded.list_milestones(&ProjectId::new("p1")).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn empty_file_loads_an_empty_store() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("milestones.jsonl");
    tokio::fs::write(&path, "").await?;

    let (loaded, warnings) = load_from_jsonl(&path).await?;
    assert!(warnings.is_empty());
    assert!(loaded.export_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let result = load_from_jsonl(&dir.path().join("absent.jsonl")).await;
    assert!(result.is_err());
}
