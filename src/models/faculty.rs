//! Faculty model.
//!
//! Faculty members teach sessions. Each has departments, specializations,
//! an academic rank, weekly and daily load limits, and the time ranges
//! during which approved leave makes them unavailable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Slot, TimeRange};

/// A teaching faculty member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faculty {
    /// Unique faculty identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Departments the faculty member may teach for. Empty = any.
    pub departments: BTreeSet<String>,
    /// Subject areas of expertise.
    pub specializations: BTreeSet<String>,
    /// Academic rank.
    pub designation: Designation,
    /// Maximum teaching hours per week.
    pub max_weekly_hours: u32,
    /// Maximum sessions on any single day.
    pub max_sessions_per_day: u32,
    /// Time ranges blocked by approved leave.
    pub unavailable: Vec<TimeRange>,
    /// On approved leave for the whole term (never eligible).
    pub on_term_leave: bool,
}

/// Academic rank, ordered from junior to senior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Designation {
    Lecturer,
    AssistantProfessor,
    AssociateProfessor,
    Professor,
}

impl Faculty {
    /// Creates a faculty member with an 18-hour week and 4 sessions per day.
    pub fn new(id: impl Into<String>, designation: Designation) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            departments: BTreeSet::new(),
            specializations: BTreeSet::new(),
            designation,
            max_weekly_hours: 18,
            max_sessions_per_day: 4,
            unavailable: Vec::new(),
            on_term_leave: false,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.departments.insert(department.into());
        self
    }

    /// Adds a specialization.
    pub fn with_specialization(mut self, specialization: impl Into<String>) -> Self {
        self.specializations.insert(specialization.into());
        self
    }

    /// Sets the weekly hour limit.
    pub fn with_max_weekly_hours(mut self, hours: u32) -> Self {
        self.max_weekly_hours = hours;
        self
    }

    /// Sets the per-day session cap.
    pub fn with_max_sessions_per_day(mut self, n: u32) -> Self {
        self.max_sessions_per_day = n;
        self
    }

    /// Adds an unavailable range.
    pub fn with_unavailable(mut self, range: TimeRange) -> Self {
        self.unavailable.push(range);
        self
    }

    /// Marks the faculty member as on leave for the whole term.
    pub fn on_term_leave(mut self) -> Self {
        self.on_term_leave = true;
        self
    }

    /// Whether the faculty member may teach for `department`.
    pub fn serves_department(&self, department: &str) -> bool {
        self.departments.is_empty() || self.departments.contains(department)
    }

    /// Whether the faculty member is free of leave during `slot`.
    pub fn is_available(&self, slot: &Slot) -> bool {
        !self.unavailable.iter().any(|r| slot.intersects(r))
    }

    /// Weekly limit in minutes.
    #[inline]
    pub fn max_weekly_minutes(&self) -> u32 {
        self.max_weekly_hours.saturating_mul(60)
    }
}
