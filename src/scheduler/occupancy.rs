//! Resource occupancy ledger.
//!
//! Tracks which faculty, classrooms, and batches are busy when, plus the
//! per-faculty load counters the feasibility filter needs. Shared by the
//! full allocation pass and the single-unit reconciliation pass.

use std::collections::HashMap;

use tracing::warn;

use crate::constraint::ConstraintModel;
use crate::models::{Session, Slot};

/// Where a demand unit was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub slot: Slot,
    /// Faculty index in the model.
    pub faculty: usize,
    /// Classroom index in the model.
    pub classroom: usize,
}

#[derive(Debug, Clone, Copy)]
struct Booking {
    unit: usize,
    placement: Placement,
}

/// Busy intervals and load counters of every resource.
#[derive(Debug, Clone)]
pub struct Occupancy {
    faculty: Vec<Vec<Booking>>,
    classrooms: Vec<Vec<Booking>>,
    batches: HashMap<String, Vec<Booking>>,
    faculty_minutes: Vec<u32>,
    /// Per faculty, session count per working day (grid order).
    faculty_days: Vec<Vec<u32>>,
    day_count: usize,
}

impl Occupancy {
    /// An empty ledger sized for `model`.
    pub fn new(model: &ConstraintModel) -> Self {
        let nf = model.snapshot().faculty.len();
        let day_count = model.grid().days().len();
        Self {
            faculty: vec![Vec::new(); nf],
            classrooms: vec![Vec::new(); model.classroom_count()],
            batches: HashMap::new(),
            faculty_minutes: vec![0; nf],
            faculty_days: vec![vec![0; day_count]; nf],
            day_count,
        }
    }

    /// A ledger holding existing sessions.
    ///
    /// Sessions whose unit, faculty, or classroom is unknown to the model
    /// are skipped with a warning.
    pub fn from_sessions<'a>(
        model: &ConstraintModel,
        sessions: impl IntoIterator<Item = &'a Session>,
    ) -> Self {
        let mut occ = Self::new(model);
        for s in sessions {
            let resolved = (
                model.unit_index(&s.id),
                model.faculty_index(&s.faculty_id),
                model.classroom_index(&s.classroom_id),
            );
            match resolved {
                (Some(unit), Some(faculty), Some(classroom)) => occ.place(
                    model,
                    unit,
                    Placement {
                        slot: s.slot,
                        faculty,
                        classroom,
                    },
                ),
                _ => warn!(
                    event = "occupancy_skip",
                    session = %s.id,
                    "session references entities missing from the snapshot"
                ),
            }
        }
        occ
    }

    /// Records a placement.
    pub fn place(&mut self, model: &ConstraintModel, unit: usize, placement: Placement) {
        let booking = Booking { unit, placement };
        let batch = &model.unit(unit).batch_id;
        self.faculty[placement.faculty].push(booking);
        self.classrooms[placement.classroom].push(booking);
        self.batches.entry(batch.clone()).or_default().push(booking);
        self.faculty_minutes[placement.faculty] += placement.slot.duration_minutes();
        if let Some(d) = model.grid().day_index(placement.slot.day) {
            self.faculty_days[placement.faculty][d] += 1;
        }
    }

    /// Removes a placement previously recorded for `unit`.
    pub fn remove(&mut self, model: &ConstraintModel, unit: usize, placement: Placement) {
        self.faculty[placement.faculty].retain(|b| b.unit != unit);
        self.classrooms[placement.classroom].retain(|b| b.unit != unit);
        if let Some(v) = self.batches.get_mut(&model.unit(unit).batch_id) {
            v.retain(|b| b.unit != unit);
        }
        let f = placement.faculty;
        self.faculty_minutes[f] = self.faculty_minutes[f].saturating_sub(placement.slot.duration_minutes());
        if let Some(d) = model.grid().day_index(placement.slot.day) {
            self.faculty_days[f][d] = self.faculty_days[f][d].saturating_sub(1);
        }
    }

    pub fn faculty_free(&self, faculty: usize, slot: &Slot) -> bool {
        !self.faculty[faculty].iter().any(|b| b.placement.slot.overlaps(slot))
    }

    pub fn classroom_free(&self, classroom: usize, slot: &Slot) -> bool {
        !self.classrooms[classroom]
            .iter()
            .any(|b| b.placement.slot.overlaps(slot))
    }

    pub fn batch_free(&self, batch_id: &str, slot: &Slot) -> bool {
        self.batches
            .get(batch_id)
            .map_or(true, |v| !v.iter().any(|b| b.placement.slot.overlaps(slot)))
    }

    /// Whether adding `slot` keeps the faculty member within weekly and daily limits.
    pub fn within_load(&self, model: &ConstraintModel, faculty: usize, slot: &Slot) -> bool {
        let f = model.faculty(faculty);
        if self.faculty_minutes[faculty] + slot.duration_minutes() > f.max_weekly_minutes() {
            return false;
        }
        match model.grid().day_index(slot.day) {
            Some(d) => self.faculty_days[faculty][d] < f.max_sessions_per_day,
            None => false,
        }
    }

    /// `n² · variance` of the faculty member's per-day counts after adding
    /// one session on working day `day`. Integer, so comparisons are exact.
    pub fn scaled_variance_with(&self, faculty: usize, day: usize) -> u64 {
        let n = self.day_count as u64;
        let (mut sum, mut sum_sq) = (0u64, 0u64);
        for (d, &c) in self.faculty_days[faculty].iter().enumerate() {
            let c = c as u64 + u64::from(d == day);
            sum += c;
            sum_sq += c * c;
        }
        n * sum_sq - sum * sum
    }

    /// Whether the batch already uses `classroom` on the slot's day.
    pub fn batch_uses_classroom_on(&self, batch_id: &str, classroom: usize, slot: &Slot) -> bool {
        self.batches.get(batch_id).map_or(false, |v| {
            v.iter()
                .any(|b| b.placement.classroom == classroom && b.placement.slot.day == slot.day)
        })
    }

    /// Scheduled minutes of a faculty member.
    pub fn faculty_minutes(&self, faculty: usize) -> u32 {
        self.faculty_minutes[faculty]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::{Batch, Classroom, Designation, EntitySnapshot, Faculty, Subject};
    use chrono::{NaiveTime, Weekday};

    fn model() -> ConstraintModel {
        let snap = EntitySnapshot::new()
            .with_subject(Subject::theory("S", "CSE").with_sessions_per_week(3))
            .with_faculty(
                Faculty::new("F", Designation::Professor)
                    .with_max_weekly_hours(2)
                    .with_max_sessions_per_day(1),
            )
            .with_classroom(Classroom::lecture_hall("R", 50))
            .with_batch(Batch::new("A", 30).with_subject("S"));
        ConstraintModel::build(&snap, &EngineConfig::default()).unwrap()
    }

    fn slot(day: Weekday, h: u32) -> Slot {
        Slot::starting_at(day, NaiveTime::from_hms_opt(h, 0, 0).unwrap(), 60).unwrap()
    }

    #[test]
    fn test_place_and_remove() {
        let m = model();
        let mut occ = Occupancy::new(&m);
        let p = Placement {
            slot: slot(Weekday::Mon, 9),
            faculty: 0,
            classroom: 0,
        };
        occ.place(&m, 0, p);
        assert!(!occ.faculty_free(0, &slot(Weekday::Mon, 9)));
        assert!(!occ.classroom_free(0, &slot(Weekday::Mon, 9)));
        assert!(!occ.batch_free("A", &slot(Weekday::Mon, 9)));
        assert!(occ.batch_free("A", &slot(Weekday::Mon, 10)));
        assert!(occ.batch_free("B", &slot(Weekday::Mon, 9)));
        assert_eq!(occ.faculty_minutes(0), 60);

        occ.remove(&m, 0, p);
        assert!(occ.faculty_free(0, &slot(Weekday::Mon, 9)));
        assert_eq!(occ.faculty_minutes(0), 0);
    }

    #[test]
    fn test_load_limits() {
        let m = model();
        let mut occ = Occupancy::new(&m);
        occ.place(
            &m,
            0,
            Placement {
                slot: slot(Weekday::Mon, 9),
                faculty: 0,
                classroom: 0,
            },
        );
        // Daily cap of 1
        assert!(!occ.within_load(&m, 0, &slot(Weekday::Mon, 11)));
        assert!(occ.within_load(&m, 0, &slot(Weekday::Tue, 11)));

        occ.place(
            &m,
            1,
            Placement {
                slot: slot(Weekday::Tue, 9),
                faculty: 0,
                classroom: 0,
            },
        );
        // Weekly limit of 2 hours reached
        assert!(!occ.within_load(&m, 0, &slot(Weekday::Wed, 9)));
    }

    #[test]
    fn test_scaled_variance_prefers_empty_days() {
        let m = model();
        let mut occ = Occupancy::new(&m);
        occ.place(
            &m,
            0,
            Placement {
                slot: slot(Weekday::Mon, 9),
                faculty: 0,
                classroom: 0,
            },
        );
        let same_day = occ.scaled_variance_with(0, 0);
        let other_day = occ.scaled_variance_with(0, 1);
        assert!(other_day < same_day);
    }

    #[test]
    fn test_locality() {
        let m = model();
        let mut occ = Occupancy::new(&m);
        occ.place(
            &m,
            0,
            Placement {
                slot: slot(Weekday::Mon, 9),
                faculty: 0,
                classroom: 0,
            },
        );
        assert!(occ.batch_uses_classroom_on("A", 0, &slot(Weekday::Mon, 15)));
        assert!(!occ.batch_uses_classroom_on("A", 0, &slot(Weekday::Tue, 15)));
    }

    #[test]
    fn test_from_sessions() {
        let m = model();
        let sessions = vec![
            Session::new("S", "A", 0, "F", "R", slot(Weekday::Mon, 9)),
            Session::new("S", "A", 1, "GHOST", "R", slot(Weekday::Tue, 9)),
        ];
        let occ = Occupancy::from_sessions(&m, &sessions);
        assert!(!occ.faculty_free(0, &slot(Weekday::Mon, 9)));
        // Unknown faculty skipped
        assert!(occ.classroom_free(0, &slot(Weekday::Tue, 9)));
    }
}
