//! Session model.
//!
//! A session is the atomic unit of a timetable: one occurrence of a
//! (batch, subject) pair bound to a faculty member, a classroom, and a slot.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::Slot;

/// A scheduled teaching session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    /// Stable identifier, `batch:subject:index`.
    pub id: String,
    /// Subject taught.
    pub subject_code: String,
    /// Batch attending.
    pub batch_id: String,
    /// Faculty member teaching.
    pub faculty_id: String,
    /// Room used.
    pub classroom_id: String,
    /// When it takes place.
    pub slot: Slot,
    /// Position within the subject's weekly requirement (0-indexed).
    pub index: u32,
}

impl Session {
    /// Creates a session; the id is derived from batch, subject, and index.
    pub fn new(
        subject_code: impl Into<String>,
        batch_id: impl Into<String>,
        index: u32,
        faculty_id: impl Into<String>,
        classroom_id: impl Into<String>,
        slot: Slot,
    ) -> Self {
        let subject_code = subject_code.into();
        let batch_id = batch_id.into();
        Self {
            id: Self::make_id(&batch_id, &subject_code, index),
            subject_code,
            batch_id,
            faculty_id: faculty_id.into(),
            classroom_id: classroom_id.into(),
            slot,
            index,
        }
    }

    /// Builds the identifier for the `index`-th session of a (batch, subject) pair.
    pub fn make_id(batch_id: &str, subject_code: &str, index: u32) -> String {
        format!("{batch_id}:{subject_code}:{index}")
    }

    /// Duration in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> u32 {
        self.slot.duration_minutes()
    }

    /// Whether two sessions overlap in time.
    #[inline]
    pub fn overlaps(&self, other: &Session) -> bool {
        self.slot.overlaps(&other.slot)
    }

    /// Canonical timetable order: weekday, start time, then id.
    pub fn chronological_cmp(&self, other: &Session) -> Ordering {
        self.slot
            .day
            .num_days_from_monday()
            .cmp(&other.slot.day.num_days_from_monday())
            .then(self.slot.start.cmp(&other.slot.start))
            .then_with(|| self.id.cmp(&other.id))
    }
}
