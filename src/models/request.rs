//! Leave and reschedule request records.
//!
//! These are owned by the request-management collaborator; the engine
//! only acts on them once they are approved.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::TimeRange;

/// Review state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A faculty leave request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: String,
    pub faculty_id: String,
    /// Ranges the faculty member will be away.
    pub ranges: Vec<TimeRange>,
    pub status: RequestStatus,
}

impl LeaveRequest {
    /// Creates a pending request.
    pub fn new(id: impl Into<String>, faculty_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            faculty_id: faculty_id.into(),
            ranges: Vec::new(),
            status: RequestStatus::Pending,
        }
    }

    /// Adds a range.
    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.ranges.push(range);
        self
    }

    /// Marks the request approved.
    pub fn approved(mut self) -> Self {
        self.status = RequestStatus::Approved;
        self
    }
}

/// Where a rescheduled session should move to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleTarget {
    pub day: Weekday,
    pub start: NaiveTime,
    pub classroom_id: String,
    pub faculty_id: String,
}

impl RescheduleTarget {
    /// Creates a target.
    pub fn new(
        day: Weekday,
        start: NaiveTime,
        classroom_id: impl Into<String>,
        faculty_id: impl Into<String>,
    ) -> Self {
        Self {
            day,
            start,
            classroom_id: classroom_id.into(),
            faculty_id: faculty_id.into(),
        }
    }
}

/// A request to move one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub id: String,
    /// Faculty member asking for the move.
    pub requested_by: String,
    pub session_id: String,
    pub target: RescheduleTarget,
    pub status: RequestStatus,
}

impl RescheduleRequest {
    /// Creates a pending request.
    pub fn new(
        id: impl Into<String>,
        requested_by: impl Into<String>,
        session_id: impl Into<String>,
        target: RescheduleTarget,
    ) -> Self {
        Self {
            id: id.into(),
            requested_by: requested_by.into(),
            session_id: session_id.into(),
            target,
            status: RequestStatus::Pending,
        }
    }

    /// Marks the request approved.
    pub fn approved(mut self) -> Self {
        self.status = RequestStatus::Approved;
        self
    }
}
