//! Full generation pipeline.

use std::time::Instant;

use tracing::{info, warn};

use super::{ConflictDetector, ScoreEvaluator, SlotAllocator};
use crate::config::EngineConfig;
use crate::constraint::ConstraintModel;
use crate::error::{ConflictError, Result, TimetableError};
use crate::models::{EntitySnapshot, Timetable, TimetableKey, TimetableStatus};

/// Builds a timetable from scratch.
///
/// Compiles the snapshot, allocates every demand unit, verifies the result
/// with the conflict detector, and scores it. Performs no I/O and holds no
/// locks; the same inputs always produce the same timetable.
///
/// # Errors
/// - [`TimetableError::Validation`] / [`TimetableError::Config`] before allocation.
/// - [`TimetableError::Infeasible`] when allocation gives up.
/// - [`TimetableError::Conflict`] if the allocated set fails verification.
pub fn generate_timetable(
    key: TimetableKey,
    snapshot: &EntitySnapshot,
    config: &EngineConfig,
) -> Result<Timetable> {
    let started = Instant::now();
    let model = ConstraintModel::build(snapshot, config)?;
    info!(
        event = "generate_start",
        key = %key,
        demand_units = model.units().len(),
    );

    let allocation = SlotAllocator::new(&model).allocate()?;
    let conflicts = ConflictDetector::new(&model).detect(&allocation.sessions);

    if let Some(first) = conflicts.iter().find(|c| c.is_blocking()) {
        warn!(
            event = "generate_rejected",
            key = %key,
            blocking = conflicts.iter().filter(|c| c.is_blocking()).count(),
        );
        return Err(TimetableError::Conflict(ConflictError {
            session_id: first.session_ids.first().cloned().unwrap_or_default(),
            conflicts: conflicts.into_iter().filter(|c| c.is_blocking()).collect(),
        }));
    }

    let breakdown = ScoreEvaluator::new(&model).evaluate(&allocation.sessions, &conflicts);

    let mut timetable = Timetable::draft(key);
    timetable.sessions = allocation.sessions;
    timetable.conflicts = conflicts;
    timetable.score = breakdown.score;
    timetable.normalize();
    timetable.transition(TimetableStatus::Generated)?;

    info!(
        event = "generate_complete",
        key = %timetable.key,
        sessions = timetable.session_count(),
        backtracks = allocation.backtracks,
        score = timetable.score,
        utilization = breakdown.utilization,
        elapsed_ms = started.elapsed().as_millis() as u64,
    );
    Ok(timetable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LimitingResource;
    use crate::models::{Batch, Classroom, Designation, Faculty, Subject};
    use chrono::NaiveTime;

    fn key() -> TimetableKey {
        TimetableKey::new("CSE", "2024-25", 5)
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
            .with_day_window(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            )
            .without_lunch()
    }

    #[test]
    fn test_generate_simple() {
        let snap = EntitySnapshot::new()
            .with_subject(Subject::theory("CS301", "CSE").with_sessions_per_week(3))
            .with_faculty(Faculty::new("F1", Designation::Professor))
            .with_classroom(Classroom::lecture_hall("LH-1", 60))
            .with_batch(Batch::new("A", 40).with_subject("CS301"));

        let tt = generate_timetable(key(), &snap, &config()).unwrap();
        assert_eq!(tt.status, TimetableStatus::Generated);
        assert_eq!(tt.id(), "CSE/2024-25/5");
        assert_eq!(tt.session_count(), 3);
        assert!(tt.conflicts.is_empty());
        assert!(tt.score > 0.0 && tt.score <= 100.0);
        assert_eq!(tt.revision, 0);
    }

    #[test]
    fn test_generate_infeasible() {
        let snap = EntitySnapshot::new()
            .with_subject(Subject::theory("S1", "CSE").with_sessions_per_week(18))
            .with_subject(Subject::theory("S2", "CSE").with_sessions_per_week(18))
            .with_faculty(
                Faculty::new("F1", Designation::Professor)
                    .with_max_weekly_hours(40)
                    .with_max_sessions_per_day(6),
            )
            .with_faculty(
                Faculty::new("F2", Designation::Professor)
                    .with_max_weekly_hours(40)
                    .with_max_sessions_per_day(6),
            )
            .with_classroom(Classroom::lecture_hall("R1", 60))
            .with_batch(Batch::new("A", 30).with_subject("S1"))
            .with_batch(Batch::new("B", 30).with_subject("S2"));

        match generate_timetable(key(), &snap, &config()) {
            Err(TimetableError::Infeasible(e)) => {
                assert_eq!(e.limiting, LimitingResource::Classroom(vec!["R1".into()]));
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_generate_validation_error() {
        let snap = EntitySnapshot::new()
            .with_subject(Subject::lab("CS391", "CSE"))
            .with_faculty(Faculty::new("F1", Designation::Professor))
            .with_classroom(Classroom::lecture_hall("LH-1", 60))
            .with_batch(Batch::new("A", 40).with_subject("CS391"));
        assert!(matches!(
            generate_timetable(key(), &snap, &config()),
            Err(TimetableError::Validation(_))
        ));
    }
}
