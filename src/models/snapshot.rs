//! Entity snapshot: the immutable input of a generation run.

use serde::{Deserialize, Serialize};

use super::{Batch, Classroom, Faculty, Subject};

/// A consistent point-in-time copy of the entities for one timetable key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub subjects: Vec<Subject>,
    pub faculty: Vec<Faculty>,
    pub classrooms: Vec<Classroom>,
    pub batches: Vec<Batch>,
}

impl EntitySnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a faculty member.
    pub fn with_faculty(mut self, faculty: Faculty) -> Self {
        self.faculty.push(faculty);
        self
    }

    /// Adds a classroom.
    pub fn with_classroom(mut self, classroom: Classroom) -> Self {
        self.classrooms.push(classroom);
        self
    }

    /// Adds a batch.
    pub fn with_batch(mut self, batch: Batch) -> Self {
        self.batches.push(batch);
        self
    }

    pub fn subject(&self, code: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.code == code)
    }

    pub fn faculty_member(&self, id: &str) -> Option<&Faculty> {
        self.faculty.iter().find(|f| f.id == id)
    }

    pub fn classroom(&self, id: &str) -> Option<&Classroom> {
        self.classrooms.iter().find(|c| c.id == id)
    }

    pub fn batch(&self, id: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == id)
    }

    /// Whether the snapshot holds no entities at all.
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
            && self.faculty.is_empty()
            && self.classrooms.is_empty()
            && self.batches.is_empty()
    }
}
