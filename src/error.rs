//! Error types for timetable generation and reconciliation.
//!
//! Every variant is terminal for the request that raised it; the engine
//! never retries on its own.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::models::{Conflict, Session, TimetableStatus};
use crate::validation::ValidationIssue;

/// Main error type.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// Input is malformed or infeasible by construction. Raised before allocation.
    #[error("validation failed: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// Search exhausted without a complete, valid assignment.
    #[error("infeasible: {0}")]
    Infeasible(InfeasibleError),

    /// A reconciliation would introduce blocking conflicts.
    #[error("conflict: {0}")]
    Conflict(ConflictError),

    /// Another generation or reconciliation holds the key.
    #[error("resource busy: timetable '{key}' is locked by another request")]
    ResourceBusy { key: String },

    /// Requested entity or timetable does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Illegal lifecycle transition.
    #[error("invalid state for '{key}': cannot move from {from:?} to {to:?}")]
    InvalidState {
        key: String,
        from: TimetableStatus,
        to: TimetableStatus,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A worker task panicked or was cancelled.
    #[error("worker error: {0}")]
    Worker(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, TimetableError>;

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a search gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfeasibleReason {
    /// Backtracking bound exceeded.
    BacktrackLimit,
    /// A unit had no candidate and nothing could be undone to free one.
    NoCandidate,
    /// Wall-clock budget exhausted.
    TimeBudgetExceeded,
    /// Reconciliation found no alternative placement.
    NoAlternative,
}

/// The resource that ran out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum LimitingResource {
    Classroom(Vec<String>),
    Faculty(Vec<String>),
    Batch(Vec<String>),
    /// Search stopped on the clock, not on a resource.
    Time,
}

impl fmt::Display for LimitingResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitingResource::Classroom(ids) => write!(f, "classroom [{}]", ids.join(", ")),
            LimitingResource::Faculty(ids) => write!(f, "faculty [{}]", ids.join(", ")),
            LimitingResource::Batch(ids) => write!(f, "batch [{}]", ids.join(", ")),
            LimitingResource::Time => f.write_str("time budget"),
        }
    }
}

/// Search exhaustion details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfeasibleError {
    pub reason: InfeasibleReason,
    /// Demand units / sessions (`batch:subject:index`) that could not be placed.
    pub unplaced: Vec<String>,
    pub limiting: LimitingResource,
    /// Largest partial assignment reached.
    pub best_partial: Vec<Session>,
}

impl fmt::Display for InfeasibleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: could not place [{}]; limiting resource: {}",
            self.reason,
            self.unplaced.join(", "),
            self.limiting
        )
    }
}

/// A rejected change and the conflicts it would cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictError {
    /// Session the change targeted.
    pub session_id: String,
    /// New blocking conflicts the change would introduce.
    pub conflicts: Vec<Conflict>,
}

impl ConflictError {
    /// Ids of sessions the change collides with (excluding the moved one).
    pub fn colliding_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .conflicts
            .iter()
            .flat_map(|c| c.session_ids.iter())
            .filter(|id| **id != self.session_id)
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "moving '{}' would collide with [{}]",
            self.session_id,
            self.colliding_sessions().join(", ")
        )
    }
}
