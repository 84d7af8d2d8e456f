//! Student batch model.
//!
//! A batch is a cohort of students that attends sessions together.
//! Its subject list defines the weekly teaching demand.

use serde::{Deserialize, Serialize};

/// A student batch (section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: String,
    /// Degree program (e.g., "B.Tech CSE").
    pub program: String,
    /// Semester number.
    pub semester: u32,
    /// Number of students.
    pub size: u32,
    /// Codes of subjects the batch takes this term.
    pub subjects: Vec<String>,
}

impl Batch {
    /// Creates a batch with no subjects.
    pub fn new(id: impl Into<String>, size: u32) -> Self {
        Self {
            id: id.into(),
            program: String::new(),
            semester: 0,
            size,
            subjects: Vec::new(),
        }
    }

    /// Sets the program.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the semester.
    pub fn with_semester(mut self, semester: u32) -> Self {
        self.semester = semester;
        self
    }

    /// Adds a subject code.
    pub fn with_subject(mut self, code: impl Into<String>) -> Self {
        self.subjects.push(code.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_builder() {
        let b = Batch::new("CSE-5A", 60)
            .with_program("B.Tech CSE")
            .with_semester(5)
            .with_subject("CS301")
            .with_subject("CS302");

        assert_eq!(b.id, "CSE-5A");
        assert_eq!(b.size, 60);
        assert_eq!(b.semester, 5);
        assert_eq!(b.subjects, vec!["CS301", "CS302"]);
    }
}
