//! Error types for gantry operations.

use crate::domain::MilestoneId;
use std::io;
use thiserror::Error;

/// The error type for gantry operations.
///
/// Everything surfaces to the caller; nothing is logged and swallowed inside
/// the crate. Store failures propagate unmodified - the engine does not
/// retry, wrap, or suppress them.
#[derive(Debug, Error)]
pub enum Error {
    /// A milestone was asked to depend on itself. Rejected before any I/O.
    #[error("A milestone cannot depend on itself")]
    SelfDependency,

    /// The prerequisite chain would close a loop.
    #[error("This dependency would create a circular relationship")]
    CircularDependency {
        /// The depending milestone.
        from: MilestoneId,
        /// The prerequisite whose chain reaches back to `from`.
        to: MilestoneId,
    },

    /// A referenced milestone id did not resolve.
    #[error("Milestone not found: {0}")]
    MilestoneNotFound(MilestoneId),

    /// The edge already exists; edges are unique per (from, to) pair.
    #[error("Dependency already exists: {from} -> {to}")]
    DependencyExists {
        /// The depending milestone.
        from: MilestoneId,
        /// The prerequisite.
        to: MilestoneId,
    },

    /// Failure reported by the persistence collaborator.
    #[error("Store error: {0}")]
    Store(String),

    /// IO error from file-backed persistence.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for gantry operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages_are_verbatim() {
        // The UI layer displays these messages as-is; the wording is part of
        // the contract.
        assert_eq!(
            Error::SelfDependency.to_string(),
            "A milestone cannot depend on itself"
        );
        assert_eq!(
            Error::CircularDependency {
                from: "m1".into(),
                to: "m3".into(),
            }
            .to_string(),
            "This dependency would create a circular relationship"
        );
    }
}
