//! Score bounds and monotonicity.

use chrono::{NaiveTime, Weekday};
use proptest::prelude::*;
use u_timetable::config::ScoreWeights;
use u_timetable::models::{Conflict, ConflictKind, Session, Severity, Slot};
use u_timetable::scheduler::ScoreEvaluator;

const DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

fn evaluator() -> ScoreEvaluator {
    // 5 days × 8 hourly slots × 3 rooms
    ScoreEvaluator::from_parts(ScoreWeights::default(), DAYS.to_vec(), 60, 120)
}

/// (day, hour offset, faculty) triples turned into hour-long sessions.
fn sessions(raw: &[(usize, u32, u8)]) -> Vec<Session> {
    raw.iter()
        .enumerate()
        .map(|(i, &(day, hour, faculty))| {
            let start = NaiveTime::from_hms_opt(9 + hour, 0, 0).unwrap();
            let slot = Slot::starting_at(DAYS[day], start, 60).unwrap();
            Session::new(
                "S",
                "B",
                i as u32,
                format!("F{faculty}"),
                format!("R{}", i % 3),
                slot,
            )
        })
        .collect()
}

fn conflict(severity: Severity) -> Conflict {
    Conflict::new(
        ConflictKind::FacultyDoubleBooked,
        severity,
        vec!["B:S:0".into()],
        "F0",
        "synthetic",
    )
}

proptest! {
    #[test]
    fn prop_score_in_range(
        raw in prop::collection::vec((0usize..5, 0u32..8, 0u8..4), 0..60),
        blocking in 0usize..6,
        warnings in 0usize..10,
    ) {
        let sessions = sessions(&raw);
        let mut conflicts = vec![conflict(Severity::Blocking); blocking];
        conflicts.extend(vec![conflict(Severity::Warning); warnings]);

        let b = evaluator().evaluate(&sessions, &conflicts);
        prop_assert!((0.0..=100.0).contains(&b.score));
        prop_assert!((0.0..=1.0).contains(&b.utilization));
        prop_assert!((0.0..1.0).contains(&b.balance_penalty));
        prop_assert_eq!(b.blocking, blocking);
        prop_assert_eq!(b.warnings, warnings);
    }

    #[test]
    fn prop_blocking_never_helps(
        raw in prop::collection::vec((0usize..5, 0u32..8, 0u8..4), 0..40),
        extra in 1usize..4,
    ) {
        let sessions = sessions(&raw);
        let eval = evaluator();
        let base = eval.evaluate(&sessions, &[]).score;
        let worse = eval
            .evaluate(&sessions, &vec![conflict(Severity::Blocking); extra])
            .score;
        prop_assert!(worse <= base + 1e-10);
    }

    #[test]
    fn prop_order_independent(
        raw in prop::collection::vec((0usize..5, 0u32..8, 0u8..4), 1..30),
    ) {
        let sessions = sessions(&raw);
        let mut reversed = sessions.clone();
        reversed.reverse();
        let eval = evaluator();
        let a = eval.evaluate(&sessions, &[]).score;
        let b = eval.evaluate(&reversed, &[]).score;
        prop_assert!((a - b).abs() < 1e-10);
    }
}
