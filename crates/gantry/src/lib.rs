//! Gantry - milestone dependency graphs and search for project planning.
//!
//! This crate provides two cooperating components over a project's milestone
//! set:
//!
//! - A **dependency graph engine** ([`graph`]) that validates and persists
//!   dependency edges between milestones, detects cycles before any write,
//!   computes topological levels, and derives the critical path with per-node
//!   slack.
//! - A **search utility** ([`search`]) that filters, ranks, and highlights
//!   in-memory collections of milestones, deliverables, and tickets with no
//!   persistence side effects.
//!
//! Persistence goes through the [`store::MilestoneStore`] trait, an async
//! document-style collaborator with in-memory and JSONL-backed
//! implementations.

#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod graph;
pub mod search;
pub mod store;
