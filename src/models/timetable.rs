//! Timetable (solution) model.
//!
//! A timetable is the ordered session set for one
//! (department, academic year, semester) key, together with its
//! lifecycle status, quality score, and detected conflicts.
//!
//! # Lifecycle
//!
//! ```text
//! Draft ──▶ Generated ──▶ Published ◀──▶ Reconciling
//!               │             │
//!               └──▶ Archived ◀┘
//! ```

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Conflict, Session, TimeRange};
use crate::error::{Result, TimetableError};

/// Identity of a timetable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimetableKey {
    /// Department code.
    pub department: String,
    /// Academic year (e.g., "2024-25").
    pub academic_year: String,
    /// Semester number.
    pub semester: u32,
}

impl TimetableKey {
    /// Creates a key.
    pub fn new(
        department: impl Into<String>,
        academic_year: impl Into<String>,
        semester: u32,
    ) -> Self {
        Self {
            department: department.into(),
            academic_year: academic_year.into(),
            semester,
        }
    }
}

impl fmt::Display for TimetableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.department, self.academic_year, self.semester
        )
    }
}

/// Lifecycle state of a timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimetableStatus {
    /// Being assembled.
    Draft,
    /// Allocation finished and scored.
    Generated,
    /// Visible to consumers.
    Published,
    /// A leave/reschedule request is being applied.
    Reconciling,
    /// Retired.
    Archived,
}

impl TimetableStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: TimetableStatus) -> bool {
        use TimetableStatus::*;
        matches!(
            (self, next),
            (Draft, Generated)
                | (Generated, Published)
                | (Published, Reconciling)
                | (Reconciling, Published)
                | (Generated, Archived)
                | (Published, Archived)
        )
    }
}

/// Approved leave recorded against a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacultyLeave {
    /// Faculty on leave.
    pub faculty_id: String,
    /// Blocked range.
    pub range: TimeRange,
}

/// A weekly timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timetable {
    /// Identity key.
    pub key: TimetableKey,
    /// Lifecycle state.
    pub status: TimetableStatus,
    /// Sessions in chronological order.
    pub sessions: Vec<Session>,
    /// Quality score in [0, 100].
    pub score: f64,
    /// Conflicts detected at the last evaluation.
    pub conflicts: Vec<Conflict>,
    /// Leave applied through reconciliation.
    pub faculty_leave: Vec<FacultyLeave>,
    /// Incremented on every committed change.
    pub revision: u64,
}

impl Timetable {
    /// Creates an empty draft.
    pub fn draft(key: TimetableKey) -> Self {
        Self {
            key,
            status: TimetableStatus::Draft,
            sessions: Vec::new(),
            score: 0.0,
            conflicts: Vec::new(),
            faculty_leave: Vec::new(),
            revision: 0,
        }
    }

    /// Identifier (`department/year/semester`).
    pub fn id(&self) -> String {
        self.key.to_string()
    }

    /// Moves to `next`, rejecting illegal transitions.
    pub fn transition(&mut self, next: TimetableStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(TimetableError::InvalidState {
                key: self.key.to_string(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Sorts sessions into canonical chronological order.
    pub fn normalize(&mut self) {
        self.sessions.sort_by(|a, b| a.chronological_cmp(b));
    }

    /// Finds a session by id.
    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Sessions taught by a faculty member.
    pub fn sessions_for_faculty(&self, faculty_id: &str) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.faculty_id == faculty_id)
            .collect()
    }

    /// Sessions attended by a batch.
    pub fn sessions_for_batch(&self, batch_id: &str) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.batch_id == batch_id)
            .collect()
    }

    /// Sessions held in a classroom.
    pub fn sessions_for_classroom(&self, classroom_id: &str) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.classroom_id == classroom_id)
            .collect()
    }

    /// Sessions on a given day.
    pub fn sessions_on(&self, day: Weekday) -> Vec<&Session> {
        self.sessions.iter().filter(|s| s.slot.day == day).collect()
    }

    /// Per-day session counts for a faculty member (Monday = 0).
    pub fn faculty_daily_counts(&self, faculty_id: &str) -> BTreeMap<u32, u32> {
        let mut counts = BTreeMap::new();
        for s in self.sessions_for_faculty(faculty_id) {
            *counts.entry(s.slot.day.num_days_from_monday()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of blocking conflicts.
    pub fn blocking_conflict_count(&self) -> usize {
        self.conflicts.iter().filter(|c| c.is_blocking()).count()
    }

    /// Whether the timetable has no blocking conflicts.
    pub fn is_valid(&self) -> bool {
        self.blocking_conflict_count() == 0
    }

    /// Leave ranges recorded for a faculty member.
    pub fn leave_for(&self, faculty_id: &str) -> impl Iterator<Item = &TimeRange> + '_ {
        let faculty_id = faculty_id.to_string();
        self.faculty_leave
            .iter()
            .filter(move |l| l.faculty_id == faculty_id)
            .map(|l| &l.range)
    }

    /// Number of sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictKind, Slot};
    use chrono::NaiveTime;

    fn slot(day: Weekday, h: u32) -> Slot {
        Slot::starting_at(day, NaiveTime::from_hms_opt(h, 0, 0).unwrap(), 60).unwrap()
    }

    fn sample_timetable() -> Timetable {
        let mut t = Timetable::draft(TimetableKey::new("CSE", "2024-25", 5));
        t.sessions = vec![
            Session::new("CS301", "A", 0, "F1", "R1", slot(Weekday::Tue, 9)),
            Session::new("CS301", "A", 1, "F1", "R1", slot(Weekday::Mon, 10)),
            Session::new("CS302", "B", 0, "F2", "R2", slot(Weekday::Mon, 9)),
        ];
        t
    }

    #[test]
    fn test_key_display() {
        let k = TimetableKey::new("CSE", "2024-25", 5);
        assert_eq!(k.to_string(), "CSE/2024-25/5");
        assert_eq!(sample_timetable().id(), "CSE/2024-25/5");
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut t = sample_timetable();
        assert!(t.transition(TimetableStatus::Published).is_err());
        t.transition(TimetableStatus::Generated).unwrap();
        t.transition(TimetableStatus::Published).unwrap();
        t.transition(TimetableStatus::Reconciling).unwrap();
        t.transition(TimetableStatus::Published).unwrap();
        t.transition(TimetableStatus::Archived).unwrap();
        assert!(t.transition(TimetableStatus::Published).is_err());
    }

    #[test]
    fn test_normalize() {
        let mut t = sample_timetable();
        t.normalize();
        let ids: Vec<&str> = t.sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["B:CS302:0", "A:CS301:1", "A:CS301:0"]);
    }

    #[test]
    fn test_queries() {
        let t = sample_timetable();
        assert_eq!(t.sessions_for_faculty("F1").len(), 2);
        assert_eq!(t.sessions_for_batch("B").len(), 1);
        assert_eq!(t.sessions_for_classroom("R1").len(), 2);
        assert_eq!(t.sessions_on(Weekday::Mon).len(), 2);
        assert!(t.session("A:CS301:1").is_some());
        assert!(t.session("nope").is_none());

        let counts = t.faculty_daily_counts("F1");
        assert_eq!(counts.get(&0), Some(&1));
        assert_eq!(counts.get(&1), Some(&1));
    }

    #[test]
    fn test_leave_for() {
        let mut t = sample_timetable();
        t.faculty_leave.push(FacultyLeave {
            faculty_id: "F1".into(),
            range: TimeRange::whole_day(Weekday::Mon),
        });
        t.faculty_leave.push(FacultyLeave {
            faculty_id: "F2".into(),
            range: TimeRange::whole_day(Weekday::Fri),
        });

        // The id may be a temporary; the iterator only borrows the timetable
        let ranges: Vec<&TimeRange> = t.leave_for(&format!("F{}", 1)).collect();
        assert_eq!(ranges, vec![&TimeRange::whole_day(Weekday::Mon)]);
        assert_eq!(t.leave_for("F3").count(), 0);
    }

    #[test]
    fn test_validity() {
        let mut t = sample_timetable();
        assert!(t.is_valid());
        t.conflicts.push(Conflict::double_booked(
            ConflictKind::ClassroomDoubleBooked,
            "A:CS301:0",
            "B:CS302:0",
            "R1",
        ));
        assert_eq!(t.blocking_conflict_count(), 1);
        assert!(!t.is_valid());
    }
}
