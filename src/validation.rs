//! Input validation for timetabling problems.
//!
//! Checks structural integrity of an [`EntitySnapshot`] before a
//! constraint model is built. Detects:
//! - Duplicate IDs (subjects, faculty, classrooms, batches)
//! - Batches referencing unknown subjects, or listing a subject twice
//! - Subjects with no weekly sessions or zero duration
//! - Empty batches
//!
//! Eligibility problems (a subject nobody can teach, or no room fits)
//! are reported with the same issue type by the constraint builder.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::EntitySnapshot;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationIssue>>;

/// A validation issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue category.
    pub kind: ValidationIssueKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssueKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A batch references a subject that doesn't exist.
    UnknownSubject,
    /// A subject has no sessions or zero-length sessions.
    InvalidSubject,
    /// A batch has no students.
    EmptyBatch,
    /// No faculty member satisfies a subject's requirement.
    NoEligibleFaculty,
    /// No classroom satisfies a subject's requirement.
    NoEligibleClassroom,
    /// A session can't fit anywhere in the configured time grid.
    NoCandidateSlot,
    /// A leave or reschedule request has not been approved.
    RequestNotApproved,
}

impl ValidationIssue {
    pub(crate) fn new(kind: ValidationIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a snapshot.
///
/// Checks:
/// 1. No duplicate subject codes, faculty, classroom, or batch IDs
/// 2. Every subject has at least one session per week of positive length
/// 3. Every batch has students
/// 4. Every subject a batch lists exists, and is listed once
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(issues)` with all detected issues.
pub fn validate_snapshot(snapshot: &EntitySnapshot) -> ValidationResult {
    let mut issues = Vec::new();

    check_unique(
        snapshot.subjects.iter().map(|s| s.code.as_str()),
        "subject",
        &mut issues,
    );
    check_unique(
        snapshot.faculty.iter().map(|f| f.id.as_str()),
        "faculty",
        &mut issues,
    );
    check_unique(
        snapshot.classrooms.iter().map(|c| c.id.as_str()),
        "classroom",
        &mut issues,
    );
    check_unique(
        snapshot.batches.iter().map(|b| b.id.as_str()),
        "batch",
        &mut issues,
    );

    for subject in &snapshot.subjects {
        if subject.sessions_per_week == 0 {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::InvalidSubject,
                format!("Subject '{}' has zero sessions per week", subject.code),
            ));
        }
        if subject.session_duration_minutes == 0 {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::InvalidSubject,
                format!("Subject '{}' has zero session duration", subject.code),
            ));
        }
    }

    let subject_codes: HashSet<&str> = snapshot.subjects.iter().map(|s| s.code.as_str()).collect();

    for batch in &snapshot.batches {
        if batch.size == 0 {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::EmptyBatch,
                format!("Batch '{}' has no students", batch.id),
            ));
        }

        let mut seen = HashSet::new();
        for code in &batch.subjects {
            if !subject_codes.contains(code.as_str()) {
                issues.push(ValidationIssue::new(
                    ValidationIssueKind::UnknownSubject,
                    format!("Batch '{}' references unknown subject '{}'", batch.id, code),
                ));
            }
            if !seen.insert(code.as_str()) {
                issues.push(ValidationIssue::new(
                    ValidationIssueKind::DuplicateId,
                    format!("Batch '{}' lists subject '{}' twice", batch.id, code),
                ));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_unique<'a>(
    ids: impl Iterator<Item = &'a str>,
    entity: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::DuplicateId,
                format!("Duplicate {entity} ID: {id}"),
            ));
        }
    }
}
