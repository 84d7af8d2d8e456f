//! Conflict (constraint violation) model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A detected violation of a timetable invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conflict {
    /// What went wrong.
    pub kind: ConflictKind,
    /// How bad it is.
    pub severity: Severity,
    /// Sessions involved, sorted.
    pub session_ids: Vec<String>,
    /// The resource at fault (faculty, classroom, batch, or subject id).
    pub resource_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// A faculty member teaches two overlapping sessions.
    FacultyDoubleBooked,
    /// A classroom hosts two overlapping sessions.
    ClassroomDoubleBooked,
    /// A batch attends two overlapping sessions.
    BatchDoubleBooked,
    /// Room is too small for the batch.
    CapacityExceeded,
    /// Faculty weekly hours or daily session cap exceeded.
    LoadExceeded,
    /// Session falls inside a faculty member's leave.
    UnavailableFaculty,
    /// Room type/facilities or faculty qualification does not match the subject.
    RequirementMismatch,
    /// A (batch, subject) pair has the wrong number of sessions.
    SessionCountMismatch,
}

/// Conflict severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Tolerated under relaxed matching; costs score.
    Warning,
    /// Must never appear in a committed timetable.
    Blocking,
}

impl Conflict {
    /// Creates a conflict; session ids are sorted for stable comparison.
    pub fn new(
        kind: ConflictKind,
        severity: Severity,
        mut session_ids: Vec<String>,
        resource_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        session_ids.sort();
        Self {
            kind,
            severity,
            session_ids,
            resource_id: resource_id.into(),
            message: message.into(),
        }
    }

    /// Creates a blocking double-booking conflict between two sessions.
    pub fn double_booked(
        kind: ConflictKind,
        first: &str,
        second: &str,
        resource_id: impl Into<String>,
    ) -> Self {
        let resource_id = resource_id.into();
        let message = format!("{kind} on '{resource_id}': '{first}' overlaps '{second}'");
        Self::new(
            kind,
            Severity::Blocking,
            vec![first.to_string(), second.to_string()],
            resource_id,
            message,
        )
    }

    /// Whether the conflict blocks commit.
    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }

    /// Whether a session takes part in this conflict.
    pub fn involves(&self, session_id: &str) -> bool {
        self.session_ids.iter().any(|s| s == session_id)
    }
}

impl ConflictKind {
    /// Whether this kind is a double booking.
    pub fn is_double_booking(self) -> bool {
        matches!(
            self,
            ConflictKind::FacultyDoubleBooked
                | ConflictKind::ClassroomDoubleBooked
                | ConflictKind::BatchDoubleBooked
        )
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictKind::FacultyDoubleBooked => "faculty double-booked",
            ConflictKind::ClassroomDoubleBooked => "classroom double-booked",
            ConflictKind::BatchDoubleBooked => "batch double-booked",
            ConflictKind::CapacityExceeded => "capacity exceeded",
            ConflictKind::LoadExceeded => "load exceeded",
            ConflictKind::UnavailableFaculty => "unavailable faculty",
            ConflictKind::RequirementMismatch => "requirement mismatch",
            ConflictKind::SessionCountMismatch => "session count mismatch",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_booked_factory() {
        let c = Conflict::double_booked(ConflictKind::FacultyDoubleBooked, "b:S:1", "a:S:0", "F1");
        assert!(c.is_blocking());
        assert_eq!(c.session_ids, vec!["a:S:0", "b:S:1"]);
        assert!(c.involves("b:S:1"));
        assert!(!c.involves("c:S:0"));
        assert!(c.message.contains("F1"));
    }

    #[test]
    fn test_kind_classification() {
        assert!(ConflictKind::BatchDoubleBooked.is_double_booking());
        assert!(!ConflictKind::CapacityExceeded.is_double_booking());
        assert!(Severity::Blocking > Severity::Warning);
    }
}
