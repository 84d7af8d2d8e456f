//! Subject model.
//!
//! A subject is a course offered in a term. It states how many sessions
//! a batch needs per week, how long each lasts, and what kind of room
//! and faculty it requires. Subjects are immutable within a generation run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{ClassroomType, Designation};

/// A subject (course) to be timetabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject code (e.g., "CS301").
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Owning department.
    pub department: String,
    /// Credit value.
    pub credits: u32,
    /// Teaching format.
    pub subject_type: SubjectType,
    /// Required sessions per week for every batch taking the subject.
    pub sessions_per_week: u32,
    /// Length of a single session (minutes).
    pub session_duration_minutes: u32,
    /// What the classroom must provide.
    pub classroom_requirement: ClassroomRequirement,
    /// What the teaching faculty must satisfy.
    pub faculty_requirement: FacultyRequirement,
}

/// Teaching format of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Theory,
    Lab,
    Tutorial,
    Seminar,
    Project,
}

impl SubjectType {
    /// Room type a subject of this format asks for by default.
    pub fn default_room_type(self) -> ClassroomType {
        match self {
            SubjectType::Theory => ClassroomType::LectureHall,
            SubjectType::Lab => ClassroomType::Lab,
            SubjectType::Tutorial => ClassroomType::TutorialRoom,
            SubjectType::Seminar => ClassroomType::SeminarHall,
            SubjectType::Project => ClassroomType::Lab,
        }
    }
}

/// Classroom constraints of a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomRequirement {
    /// Required room type.
    pub room_type: ClassroomType,
    /// Minimum seating capacity beyond the batch size (0 = batch size only).
    pub min_capacity: u32,
    /// Facilities that must all be present (e.g., "projector").
    pub facilities: BTreeSet<String>,
}

/// Faculty constraints of a subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacultyRequirement {
    /// Accepted specializations; empty = any.
    pub specializations: BTreeSet<String>,
    /// Minimum academic rank; `None` = any.
    pub min_designation: Option<Designation>,
}

impl Subject {
    /// Creates a subject with one 60-minute session per week.
    ///
    /// The classroom requirement defaults to the subject type's room type.
    pub fn new(
        code: impl Into<String>,
        department: impl Into<String>,
        subject_type: SubjectType,
    ) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            department: department.into(),
            credits: 0,
            subject_type,
            sessions_per_week: 1,
            session_duration_minutes: 60,
            classroom_requirement: ClassroomRequirement::of_type(subject_type.default_room_type()),
            faculty_requirement: FacultyRequirement::default(),
        }
    }

    /// Creates a theory subject.
    pub fn theory(code: impl Into<String>, department: impl Into<String>) -> Self {
        Self::new(code, department, SubjectType::Theory)
    }

    /// Creates a lab subject.
    pub fn lab(code: impl Into<String>, department: impl Into<String>) -> Self {
        Self::new(code, department, SubjectType::Lab)
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the credit value.
    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }

    /// Sets sessions per week.
    pub fn with_sessions_per_week(mut self, n: u32) -> Self {
        self.sessions_per_week = n;
        self
    }

    /// Sets the session length in minutes.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.session_duration_minutes = minutes;
        self
    }

    /// Overrides the required room type.
    pub fn with_room_type(mut self, room_type: ClassroomType) -> Self {
        self.classroom_requirement.room_type = room_type;
        self
    }

    /// Sets the minimum room capacity.
    pub fn with_min_capacity(mut self, capacity: u32) -> Self {
        self.classroom_requirement.min_capacity = capacity;
        self
    }

    /// Adds a required room facility.
    pub fn with_facility(mut self, facility: impl Into<String>) -> Self {
        self.classroom_requirement.facilities.insert(facility.into());
        self
    }

    /// Adds an accepted faculty specialization.
    pub fn with_specialization(mut self, specialization: impl Into<String>) -> Self {
        self.faculty_requirement
            .specializations
            .insert(specialization.into());
        self
    }

    /// Sets the minimum faculty designation.
    pub fn with_min_designation(mut self, designation: Designation) -> Self {
        self.faculty_requirement.min_designation = Some(designation);
        self
    }
}

impl ClassroomRequirement {
    /// A requirement for the given room type with no extra capacity or facilities.
    pub fn of_type(room_type: ClassroomType) -> Self {
        Self {
            room_type,
            min_capacity: 0,
            facilities: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_builder() {
        let s = Subject::theory("CS301", "CSE")
            .with_name("Operating Systems")
            .with_credits(4)
            .with_sessions_per_week(3)
            .with_duration(50)
            .with_facility("projector")
            .with_specialization("systems")
            .with_min_designation(Designation::AssistantProfessor);

        assert_eq!(s.code, "CS301");
        assert_eq!(s.subject_type, SubjectType::Theory);
        assert_eq!(s.sessions_per_week, 3);
        assert_eq!(s.session_duration_minutes, 50);
        assert_eq!(s.classroom_requirement.room_type, ClassroomType::LectureHall);
        assert!(s.classroom_requirement.facilities.contains("projector"));
        assert!(s.faculty_requirement.specializations.contains("systems"));
        assert_eq!(
            s.faculty_requirement.min_designation,
            Some(Designation::AssistantProfessor)
        );
    }

    #[test]
    fn test_default_room_types() {
        assert_eq!(Subject::lab("L1", "CSE").classroom_requirement.room_type, ClassroomType::Lab);
        assert_eq!(
            SubjectType::Seminar.default_room_type(),
            ClassroomType::SeminarHall
        );
        let s = Subject::theory("X", "CSE").with_room_type(ClassroomType::Auditorium);
        assert_eq!(s.classroom_requirement.room_type, ClassroomType::Auditorium);
    }
}
