//! Conflict detection.
//!
//! A pure function of the session set and the model: no state carries
//! over between calls. The allocator never hands out conflicting
//! resources, but generated and reconciled timetables are still checked
//! here before anything is committed.
//!
//! # Checks
//!
//! | Kind | Severity |
//! |------|----------|
//! | Faculty / classroom / batch double booking | Blocking |
//! | Session during faculty leave | Blocking |
//! | Weekly hours or daily session cap exceeded | Blocking |
//! | Session count differs from `sessions_per_week` | Blocking |
//! | Room too small | Warning within relaxed tolerance, otherwise Blocking |
//! | Room type, facilities, or faculty qualification mismatch | Warning when relaxed, otherwise Blocking |

use std::collections::BTreeMap;

use crate::constraint::{classroom_fit, faculty_qualifies, ConstraintModel, RoomFit};
use crate::models::{Conflict, ConflictKind, Session, Severity};

/// Checks a session set against every timetable invariant.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector<'a> {
    model: &'a ConstraintModel,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(model: &'a ConstraintModel) -> Self {
        Self { model }
    }

    /// All conflicts in `sessions`, in a stable order.
    pub fn detect(&self, sessions: &[Session]) -> Vec<Conflict> {
        let mut conflicts = detect_double_bookings(sessions);
        for s in sessions {
            self.check_session(s, &mut conflicts);
        }
        self.check_load(sessions, &mut conflicts);
        self.check_counts(sessions, &mut conflicts);
        sort_conflicts(&mut conflicts);
        conflicts
    }

    /// Conflicts in `after` that are not in `before`.
    pub fn new_conflicts(&self, before: &[Session], after: &[Session]) -> Vec<Conflict> {
        let existing = self.detect(before);
        self.detect(after)
            .into_iter()
            .filter(|c| !existing.contains(c))
            .collect()
    }

    fn check_session(&self, s: &Session, out: &mut Vec<Conflict>) {
        let model = self.model;
        let config = model.config();
        let soft = if config.relaxed_matching {
            Severity::Warning
        } else {
            Severity::Blocking
        };

        let (Some(subject), Some(batch)) = (model.subject(&s.subject_code), model.batch(&s.batch_id))
        else {
            out.push(Conflict::new(
                ConflictKind::RequirementMismatch,
                Severity::Blocking,
                vec![s.id.clone()],
                &s.subject_code,
                format!("session '{}' references an unknown subject or batch", s.id),
            ));
            return;
        };

        match model.classroom_index(&s.classroom_id).map(|i| model.classroom(i)) {
            None => out.push(Conflict::new(
                ConflictKind::RequirementMismatch,
                Severity::Blocking,
                vec![s.id.clone()],
                &s.classroom_id,
                format!("session '{}' uses unknown classroom '{}'", s.id, s.classroom_id),
            )),
            Some(room) => match classroom_fit(config, room, subject, batch.size) {
                Some(RoomFit::Exact) => {}
                Some(RoomFit::Relaxed) => out.push(Conflict::new(
                    ConflictKind::CapacityExceeded,
                    Severity::Warning,
                    vec![s.id.clone()],
                    &room.id,
                    format!(
                        "classroom '{}' seats {} for batch '{}' of {}",
                        room.id, room.capacity, batch.id, batch.size
                    ),
                )),
                None => {
                    let req = &subject.classroom_requirement;
                    let suitable = config.room_type_accepts(req.room_type, room.room_type)
                        && room.has_facilities(&req.facilities)
                        && room.open_to(&subject.department);
                    if suitable {
                        out.push(Conflict::new(
                            ConflictKind::CapacityExceeded,
                            Severity::Blocking,
                            vec![s.id.clone()],
                            &room.id,
                            format!(
                                "classroom '{}' seats {} for batch '{}' of {}",
                                room.id, room.capacity, batch.id, batch.size
                            ),
                        ));
                    } else {
                        out.push(Conflict::new(
                            ConflictKind::RequirementMismatch,
                            soft,
                            vec![s.id.clone()],
                            &room.id,
                            format!(
                                "classroom '{}' does not meet the requirements of '{}'",
                                room.id, subject.code
                            ),
                        ));
                    }
                }
            },
        }

        let Some(faculty) = model.faculty_index(&s.faculty_id).map(|i| model.faculty(i)) else {
            out.push(Conflict::new(
                ConflictKind::RequirementMismatch,
                Severity::Blocking,
                vec![s.id.clone()],
                &s.faculty_id,
                format!("session '{}' uses unknown faculty '{}'", s.id, s.faculty_id),
            ));
            return;
        };

        if faculty.on_term_leave || !faculty.is_available(&s.slot) {
            out.push(Conflict::new(
                ConflictKind::UnavailableFaculty,
                Severity::Blocking,
                vec![s.id.clone()],
                &faculty.id,
                format!("'{}' is on leave during {} ({})", faculty.id, s.slot, s.id),
            ));
        } else if !faculty_qualifies(faculty, subject) {
            out.push(Conflict::new(
                ConflictKind::RequirementMismatch,
                soft,
                vec![s.id.clone()],
                &faculty.id,
                format!("'{}' is not qualified to teach '{}'", faculty.id, subject.code),
            ));
        }
    }

    fn check_load(&self, sessions: &[Session], out: &mut Vec<Conflict>) {
        let mut by_faculty: BTreeMap<&str, Vec<&Session>> = BTreeMap::new();
        for s in sessions {
            by_faculty.entry(s.faculty_id.as_str()).or_default().push(s);
        }

        for (id, taught) in by_faculty {
            let Some(faculty) = self.model.faculty_index(id).map(|i| self.model.faculty(i)) else {
                continue;
            };
            let minutes: u32 = taught.iter().map(|s| s.duration_minutes()).sum();
            if minutes > faculty.max_weekly_minutes() {
                out.push(Conflict::new(
                    ConflictKind::LoadExceeded,
                    Severity::Blocking,
                    taught.iter().map(|s| s.id.clone()).collect(),
                    id,
                    format!(
                        "'{id}' teaches {minutes} minutes, limit {}",
                        faculty.max_weekly_minutes()
                    ),
                ));
            }

            let mut per_day: BTreeMap<u32, Vec<&Session>> = BTreeMap::new();
            for s in &taught {
                per_day
                    .entry(s.slot.day.num_days_from_monday())
                    .or_default()
                    .push(s);
            }
            for day_sessions in per_day.values() {
                if day_sessions.len() as u32 > faculty.max_sessions_per_day {
                    out.push(Conflict::new(
                        ConflictKind::LoadExceeded,
                        Severity::Blocking,
                        day_sessions.iter().map(|s| s.id.clone()).collect(),
                        id,
                        format!(
                            "'{id}' teaches {} sessions on {}, limit {}",
                            day_sessions.len(),
                            day_sessions[0].slot.day,
                            faculty.max_sessions_per_day
                        ),
                    ));
                }
            }
        }
    }

    fn check_counts(&self, sessions: &[Session], out: &mut Vec<Conflict>) {
        let mut actual: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
        for s in sessions {
            actual
                .entry((s.batch_id.clone(), s.subject_code.clone()))
                .or_default()
                .push(s.id.clone());
        }
        let required = self.model.required_counts();

        let mut keys: Vec<&(String, String)> = required.keys().chain(actual.keys()).collect();
        keys.sort();
        keys.dedup();

        for key in keys {
            let want = required.get(key).copied().unwrap_or(0);
            let ids = actual.get(key).cloned().unwrap_or_default();
            if ids.len() as u32 != want {
                out.push(Conflict::new(
                    ConflictKind::SessionCountMismatch,
                    Severity::Blocking,
                    ids.clone(),
                    &key.1,
                    format!(
                        "batch '{}' has {} sessions of '{}', requires {}",
                        key.0,
                        ids.len(),
                        key.1,
                        want
                    ),
                ));
            }
        }
    }
}

/// Pairwise double bookings of faculty, classrooms, and batches.
///
/// Needs no model, so callers can screen a candidate session set before
/// building one.
pub fn detect_double_bookings(sessions: &[Session]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    let resources: [(ConflictKind, fn(&Session) -> &str); 3] = [
        (ConflictKind::FacultyDoubleBooked, |s| s.faculty_id.as_str()),
        (ConflictKind::ClassroomDoubleBooked, |s| s.classroom_id.as_str()),
        (ConflictKind::BatchDoubleBooked, |s| s.batch_id.as_str()),
    ];

    for (kind, resource_of) in resources {
        let mut groups: BTreeMap<&str, Vec<&Session>> = BTreeMap::new();
        for s in sessions {
            groups.entry(resource_of(s)).or_default().push(s);
        }
        for (resource, mut group) in groups {
            group.sort_by(|a, b| a.chronological_cmp(b));
            for (i, a) in group.iter().enumerate() {
                // Sorted by day then start: stop at the first session that
                // starts after `a` ends.
                for b in &group[i + 1..] {
                    if b.slot.day != a.slot.day || b.slot.start >= a.slot.end {
                        break;
                    }
                    conflicts.push(Conflict::double_booked(kind, &a.id, &b.id, resource));
                }
            }
        }
    }
    sort_conflicts(&mut conflicts);
    conflicts
}

fn sort_conflicts(conflicts: &mut [Conflict]) {
    conflicts.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.session_ids.cmp(&b.session_ids))
            .then_with(|| a.resource_id.cmp(&b.resource_id))
            .then_with(|| a.message.cmp(&b.message))
    });
}
