//! Constraint model construction.
//!
//! Compiles an [`EntitySnapshot`] into demand units: one per required
//! weekly occurrence of every (batch, subject) pair, each carrying its
//! duration and the faculty, classrooms, and slots it may use.
//!
//! Eligibility is decided once, up front. A subject nobody can teach or
//! no room can host fails here with a diagnostic naming it, rather than
//! surfacing later as an opaque allocation failure.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::TimeGrid;
use crate::config::EngineConfig;
use crate::error::{Result, TimetableError};
use crate::models::{Batch, Classroom, EntitySnapshot, Faculty, Session, Slot, Subject, TimeRange};
use crate::validation::{validate_snapshot, ValidationIssue, ValidationIssueKind};

/// One required weekly occurrence of a (batch, subject) pair.
#[derive(Debug, Clone)]
pub struct DemandUnit {
    /// Identifier of the session this unit becomes (`batch:subject:index`).
    pub id: String,
    pub batch_id: String,
    pub subject_code: String,
    /// Position within the subject's weekly requirement.
    pub index: u32,
    pub duration_minutes: u32,
    pub batch_size: u32,
    /// Indices into [`ConstraintModel::faculty`], ascending.
    pub eligible_faculty: Vec<usize>,
    /// Indices into [`ConstraintModel::classroom`], ascending.
    pub eligible_classrooms: Vec<usize>,
    /// Grid slots matching the duration, in day then start order.
    pub candidate_slots: Vec<Slot>,
}

impl DemandUnit {
    /// Number of (faculty × classroom × slot) combinations.
    pub fn constrainedness(&self) -> u64 {
        self.eligible_faculty.len() as u64
            * self.eligible_classrooms.len() as u64
            * self.candidate_slots.len() as u64
    }
}

/// How well a classroom fits a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomFit {
    /// Meets every requirement.
    Exact,
    /// Falls short on capacity within the relaxed-matching tolerance.
    Relaxed,
}

/// Compiled constraints of one generation run.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    snapshot: EntitySnapshot,
    config: EngineConfig,
    grid: TimeGrid,
    units: Vec<DemandUnit>,
    faculty_index: HashMap<String, usize>,
    classroom_index: HashMap<String, usize>,
    unit_index: HashMap<String, usize>,
}

impl ConstraintModel {
    /// Builds the model.
    ///
    /// # Errors
    /// - [`TimetableError::Config`] if `config` is inconsistent.
    /// - [`TimetableError::Validation`] for structural snapshot issues, and for
    ///   any (batch, subject) pair with no eligible faculty, classroom, or slot.
    pub fn build(snapshot: &EntitySnapshot, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        validate_snapshot(snapshot).map_err(TimetableError::Validation)?;

        let grid = TimeGrid::from_config(config);
        let mut issues = Vec::new();
        let mut units = Vec::new();

        // Faculty eligibility depends only on the subject.
        let mut faculty_for: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for subject in &snapshot.subjects {
            let eligible: Vec<usize> = snapshot
                .faculty
                .iter()
                .enumerate()
                .filter(|(_, f)| faculty_qualifies(f, subject))
                .map(|(i, _)| i)
                .collect();
            faculty_for.insert(subject.code.as_str(), eligible);
        }

        let mut slots_for: HashMap<u32, Vec<Slot>> = HashMap::new();

        for batch in &snapshot.batches {
            for code in &batch.subjects {
                let Some(subject) = snapshot.subject(code) else {
                    continue;
                };
                let eligible_faculty = faculty_for.get(code.as_str()).cloned().unwrap_or_default();
                let eligible_classrooms: Vec<usize> = snapshot
                    .classrooms
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| classroom_fit(config, r, subject, batch.size).is_some())
                    .map(|(i, _)| i)
                    .collect();
                let candidate_slots = slots_for
                    .entry(subject.session_duration_minutes)
                    .or_insert_with(|| grid.candidate_slots(subject.session_duration_minutes))
                    .clone();

                if eligible_faculty.is_empty() {
                    issues.push(ValidationIssue::new(
                        ValidationIssueKind::NoEligibleFaculty,
                        format!(
                            "Subject '{}' (batch '{}') has no eligible faculty",
                            subject.code, batch.id
                        ),
                    ));
                }
                if eligible_classrooms.is_empty() {
                    issues.push(ValidationIssue::new(
                        ValidationIssueKind::NoEligibleClassroom,
                        format!(
                            "Subject '{}' (batch '{}', {} students) has no eligible classroom",
                            subject.code, batch.id, batch.size
                        ),
                    ));
                }
                if candidate_slots.is_empty() {
                    issues.push(ValidationIssue::new(
                        ValidationIssueKind::NoCandidateSlot,
                        format!(
                            "Subject '{}' sessions of {} minutes do not fit the working day",
                            subject.code, subject.session_duration_minutes
                        ),
                    ));
                }

                for index in 0..subject.sessions_per_week {
                    units.push(DemandUnit {
                        id: Session::make_id(&batch.id, &subject.code, index),
                        batch_id: batch.id.clone(),
                        subject_code: subject.code.clone(),
                        index,
                        duration_minutes: subject.session_duration_minutes,
                        batch_size: batch.size,
                        eligible_faculty: eligible_faculty.clone(),
                        eligible_classrooms: eligible_classrooms.clone(),
                        candidate_slots: candidate_slots.clone(),
                    });
                }
            }
        }

        if !issues.is_empty() {
            return Err(TimetableError::Validation(issues));
        }

        debug!(
            event = "model_built",
            demand_units = units.len(),
            faculty = snapshot.faculty.len(),
            classrooms = snapshot.classrooms.len(),
            base_slots = grid.base_slot_count(),
        );

        let faculty_index = snapshot
            .faculty
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
        let classroom_index = snapshot
            .classrooms
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        let unit_index = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id.clone(), i))
            .collect();

        Ok(Self {
            snapshot: snapshot.clone(),
            config: config.clone(),
            grid,
            units,
            faculty_index,
            classroom_index,
            unit_index,
        })
    }

    /// All demand units, in snapshot order.
    pub fn units(&self) -> &[DemandUnit] {
        &self.units
    }

    pub fn unit(&self, idx: usize) -> &DemandUnit {
        &self.units[idx]
    }

    /// Index of the unit backing a session id.
    pub fn unit_index(&self, id: &str) -> Option<usize> {
        self.unit_index.get(id).copied()
    }

    /// Unit indices, most constrained first.
    ///
    /// Ties are broken by batch, subject, and index so the order never
    /// depends on hashing or input permutation.
    pub fn placement_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.units.len()).collect();
        order.sort_by(|&a, &b| {
            let (ua, ub) = (&self.units[a], &self.units[b]);
            ua.constrainedness()
                .cmp(&ub.constrainedness())
                .then_with(|| ua.batch_id.cmp(&ub.batch_id))
                .then_with(|| ua.subject_code.cmp(&ub.subject_code))
                .then(ua.index.cmp(&ub.index))
        });
        order
    }

    pub fn faculty(&self, idx: usize) -> &Faculty {
        &self.snapshot.faculty[idx]
    }

    pub fn classroom(&self, idx: usize) -> &Classroom {
        &self.snapshot.classrooms[idx]
    }

    pub fn faculty_index(&self, id: &str) -> Option<usize> {
        self.faculty_index.get(id).copied()
    }

    pub fn classroom_index(&self, id: &str) -> Option<usize> {
        self.classroom_index.get(id).copied()
    }

    pub fn subject(&self, code: &str) -> Option<&Subject> {
        self.snapshot.subject(code)
    }

    pub fn batch(&self, id: &str) -> Option<&Batch> {
        self.snapshot.batch(id)
    }

    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Number of classrooms in the model.
    pub fn classroom_count(&self) -> usize {
        self.snapshot.classrooms.len()
    }

    /// Required session count per (batch, subject) pair.
    pub fn required_counts(&self) -> BTreeMap<(String, String), u32> {
        let mut counts = BTreeMap::new();
        for u in &self.units {
            *counts
                .entry((u.batch_id.clone(), u.subject_code.clone()))
                .or_insert(0) += 1;
        }
        counts
    }

    /// Marks a faculty member unavailable for `range`.
    ///
    /// Returns `false` if the faculty member is unknown.
    pub fn add_unavailability(&mut self, faculty_id: &str, range: TimeRange) -> bool {
        match self.faculty_index(faculty_id) {
            Some(i) => {
                let f = &mut self.snapshot.faculty[i];
                if !f.unavailable.contains(&range) {
                    f.unavailable.push(range);
                }
                true
            }
            None => false,
        }
    }
}

/// Whether `faculty` may teach `subject`.
///
/// Requires: not on whole-term leave, serves the subject's department,
/// holds at least one accepted specialization (if any are listed), and
/// meets the minimum designation.
pub fn faculty_qualifies(faculty: &Faculty, subject: &Subject) -> bool {
    let req = &subject.faculty_requirement;
    !faculty.on_term_leave
        && faculty.serves_department(&subject.department)
        && (req.specializations.is_empty()
            || !req.specializations.is_disjoint(&faculty.specializations))
        && req.min_designation.map_or(true, |d| faculty.designation >= d)
}

/// How `room` fits `subject` for a batch of `batch_size` students.
///
/// Returns `None` if the room is unusable.
pub fn classroom_fit(
    config: &EngineConfig,
    room: &Classroom,
    subject: &Subject,
    batch_size: u32,
) -> Option<RoomFit> {
    let req = &subject.classroom_requirement;
    if !config.room_type_accepts(req.room_type, room.room_type)
        || !room.has_facilities(&req.facilities)
        || !room.open_to(&subject.department)
    {
        return None;
    }
    let needed = batch_size.max(req.min_capacity);
    if room.capacity >= needed {
        return Some(RoomFit::Exact);
    }
    if config.relaxed_matching {
        let floor = (needed as f64 * (1.0 - config.capacity_tolerance)).ceil() as u32;
        if room.capacity >= floor {
            return Some(RoomFit::Relaxed);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Batch, ClassroomType, Designation};

    fn snapshot() -> EntitySnapshot {
        EntitySnapshot::new()
            .with_subject(
                Subject::theory("CS301", "CSE")
                    .with_sessions_per_week(3)
                    .with_specialization("systems"),
            )
            .with_subject(Subject::lab("CS391", "CSE").with_duration(120).with_facility("gpu"))
            .with_faculty(
                Faculty::new("F1", Designation::AssistantProfessor)
                    .with_department("CSE")
                    .with_specialization("systems"),
            )
            .with_faculty(Faculty::new("F2", Designation::Professor).with_department("CSE"))
            .with_classroom(Classroom::lecture_hall("LH-1", 60))
            .with_classroom(Classroom::lab("LAB-1", 40).with_facility("gpu"))
            .with_classroom(Classroom::lab("LAB-2", 40))
            .with_batch(Batch::new("A", 40).with_subject("CS301").with_subject("CS391"))
    }

    #[test]
    fn test_build_units() {
        let model = ConstraintModel::build(&snapshot(), &EngineConfig::default()).unwrap();
        assert_eq!(model.units().len(), 4);

        let theory = model.unit(0);
        assert_eq!(theory.id, "A:CS301:0");
        assert_eq!(theory.eligible_faculty, vec![0]); // only F1 has "systems"
        assert_eq!(theory.eligible_classrooms, vec![0]);
        assert_eq!(theory.candidate_slots.len(), 35);

        let lab = model.unit(3);
        assert_eq!(lab.id, "A:CS391:0");
        assert_eq!(lab.eligible_faculty, vec![0, 1]); // no specialization required
        assert_eq!(lab.eligible_classrooms, vec![1]); // LAB-2 lacks gpu
        assert_eq!(lab.duration_minutes, 120);
    }

    #[test]
    fn test_placement_order_most_constrained_first() {
        let model = ConstraintModel::build(&snapshot(), &EngineConfig::default()).unwrap();
        let order = model.placement_order();
        // Lab: 2 faculty × 1 room × 25 slots = 50; theory: 1 × 1 × 35 = 35
        assert_eq!(model.unit(order[0]).subject_code, "CS301");
        assert_eq!(model.unit(order[3]).subject_code, "CS391");
        // Ties broken by index
        assert_eq!(model.unit(order[0]).index, 0);
        assert_eq!(model.unit(order[1]).index, 1);
    }

    #[test]
    fn test_no_eligible_faculty() {
        let snap = snapshot().with_subject(Subject::theory("EE101", "EEE")).with_batch(
            Batch::new("B", 30).with_subject("EE101"),
        );
        let err = ConstraintModel::build(&snap, &EngineConfig::default()).unwrap_err();
        match err {
            TimetableError::Validation(issues) => {
                assert!(issues.iter().any(|i| i.kind == ValidationIssueKind::NoEligibleFaculty
                    && i.message.contains("EE101")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_eligible_classroom() {
        let snap = snapshot().with_batch(Batch::new("BIG", 200).with_subject("CS301"));
        let err = ConstraintModel::build(&snap, &EngineConfig::default()).unwrap_err();
        match err {
            TimetableError::Validation(issues) => {
                assert!(issues
                    .iter()
                    .any(|i| i.kind == ValidationIssueKind::NoEligibleClassroom
                        && i.message.contains("BIG")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_session_longer_than_day() {
        let snap = EntitySnapshot::new()
            .with_subject(Subject::theory("LONG", "CSE").with_duration(600))
            .with_faculty(Faculty::new("F", Designation::Professor))
            .with_classroom(Classroom::lecture_hall("R", 50))
            .with_batch(Batch::new("A", 10).with_subject("LONG"));
        let err = ConstraintModel::build(&snap, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, TimetableError::Validation(ref i)
            if i.iter().any(|x| x.kind == ValidationIssueKind::NoCandidateSlot)));
    }

    #[test]
    fn test_huge_duration_reports_no_slot() {
        let snap = EntitySnapshot::new()
            .with_subject(Subject::theory("HUGE", "CSE").with_duration(u32::MAX))
            .with_faculty(Faculty::new("F", Designation::Professor))
            .with_classroom(Classroom::lecture_hall("R", 50))
            .with_batch(Batch::new("A", 10).with_subject("HUGE"));
        let err = ConstraintModel::build(&snap, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, TimetableError::Validation(ref i)
            if i.iter().any(|x| x.kind == ValidationIssueKind::NoCandidateSlot)));
    }

    #[test]
    fn test_faculty_qualification() {
        let subject = Subject::theory("S", "CSE")
            .with_specialization("ml")
            .with_min_designation(Designation::AssociateProfessor);

        let ok = Faculty::new("F", Designation::Professor).with_specialization("ml");
        let junior = Faculty::new("F", Designation::AssistantProfessor).with_specialization("ml");
        let wrong_area = Faculty::new("F", Designation::Professor).with_specialization("vlsi");
        let away = ok.clone().on_term_leave();
        let other_dept = ok.clone().with_department("ECE");

        assert!(faculty_qualifies(&ok, &subject));
        assert!(!faculty_qualifies(&junior, &subject));
        assert!(!faculty_qualifies(&wrong_area, &subject));
        assert!(!faculty_qualifies(&away, &subject));
        assert!(!faculty_qualifies(&other_dept, &subject));
    }

    #[test]
    fn test_classroom_fit() {
        let config = EngineConfig::default();
        let subject = Subject::theory("S", "CSE");
        let hall = Classroom::lecture_hall("H", 50);
        let audi = Classroom::new("AUD", ClassroomType::Auditorium, 300);
        let lab = Classroom::lab("L", 100);
        let reserved = Classroom::lecture_hall("X", 80).with_department("ME");

        assert_eq!(classroom_fit(&config, &hall, &subject, 50), Some(RoomFit::Exact));
        assert_eq!(classroom_fit(&config, &hall, &subject, 51), None);
        assert_eq!(classroom_fit(&config, &audi, &subject, 50), Some(RoomFit::Exact));
        assert_eq!(classroom_fit(&config, &lab, &subject, 50), None);
        assert_eq!(classroom_fit(&config, &reserved, &subject, 50), None);

        let relaxed = EngineConfig::default().with_relaxed_matching(0.1);
        assert_eq!(classroom_fit(&relaxed, &hall, &subject, 55), Some(RoomFit::Relaxed));
        assert_eq!(classroom_fit(&relaxed, &hall, &subject, 60), None);
    }

    #[test]
    fn test_min_capacity_requirement() {
        let config = EngineConfig::default();
        let subject = Subject::theory("S", "CSE").with_min_capacity(80);
        let hall = Classroom::lecture_hall("H", 60);
        assert_eq!(classroom_fit(&config, &hall, &subject, 40), None);
    }

    #[test]
    fn test_add_unavailability() {
        let mut model = ConstraintModel::build(&snapshot(), &EngineConfig::default()).unwrap();
        let range = TimeRange::whole_day(chrono::Weekday::Mon);
        assert!(model.add_unavailability("F1", range));
        assert!(model.add_unavailability("F1", range));
        assert_eq!(model.faculty(0).unavailable.len(), 1);
        assert!(!model.add_unavailability("NOPE", range));
    }

    #[test]
    fn test_required_counts() {
        let model = ConstraintModel::build(&snapshot(), &EngineConfig::default()).unwrap();
        let counts = model.required_counts();
        assert_eq!(counts[&("A".to_string(), "CS301".to_string())], 3);
        assert_eq!(counts[&("A".to_string(), "CS391".to_string())], 1);
    }
}
