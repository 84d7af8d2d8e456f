//! Classroom model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A room sessions can be held in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    /// Unique room identifier.
    pub id: String,
    /// Room classification.
    pub room_type: ClassroomType,
    /// Seats available.
    pub capacity: u32,
    /// Installed facilities (e.g., "projector", "gpu").
    pub facilities: BTreeSet<String>,
    /// Department the room is reserved for; `None` = shared.
    pub department: Option<String>,
}

/// Room classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassroomType {
    LectureHall,
    Lab,
    TutorialRoom,
    SeminarHall,
    Auditorium,
}

impl Classroom {
    /// Creates a shared room with no facilities.
    pub fn new(id: impl Into<String>, room_type: ClassroomType, capacity: u32) -> Self {
        Self {
            id: id.into(),
            room_type,
            capacity,
            facilities: BTreeSet::new(),
            department: None,
        }
    }

    /// Creates a lecture hall.
    pub fn lecture_hall(id: impl Into<String>, capacity: u32) -> Self {
        Self::new(id, ClassroomType::LectureHall, capacity)
    }

    /// Creates a lab.
    pub fn lab(id: impl Into<String>, capacity: u32) -> Self {
        Self::new(id, ClassroomType::Lab, capacity)
    }

    /// Adds a facility.
    pub fn with_facility(mut self, facility: impl Into<String>) -> Self {
        self.facilities.insert(facility.into());
        self
    }

    /// Reserves the room for a department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Whether every facility in `required` is installed.
    pub fn has_facilities(&self, required: &BTreeSet<String>) -> bool {
        required.is_subset(&self.facilities)
    }

    /// Whether the room may host sessions of `department`.
    pub fn open_to(&self, department: &str) -> bool {
        self.department.as_deref().map_or(true, |d| d == department)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classroom_builder() {
        let r = Classroom::lab("LAB-1", 30)
            .with_facility("gpu")
            .with_facility("projector")
            .with_department("CSE");

        assert_eq!(r.room_type, ClassroomType::Lab);
        assert_eq!(r.capacity, 30);
        assert!(r.open_to("CSE"));
        assert!(!r.open_to("ME"));

        let mut need = BTreeSet::new();
        need.insert("gpu".to_string());
        assert!(r.has_facilities(&need));
        need.insert("fume-hood".to_string());
        assert!(!r.has_facilities(&need));
    }

    #[test]
    fn test_shared_room_open_to_all() {
        let r = Classroom::lecture_hall("LH-1", 60);
        assert!(r.open_to("CSE"));
        assert!(r.open_to("ME"));
    }
}
