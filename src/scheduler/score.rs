//! Timetable quality score.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Utilization | Scheduled grid-slot units / (base slots per room × rooms), in [0, 1] |
//! | Balance penalty | Mean per-faculty variance of daily session counts, mapped by v / (1 + v) into [0, 1) |
//! | Score | 100 × (w_u·U + w_b·(1 − B)) / (w_u + w_b) − blocking × p_b − warnings × p_w, clamped to [0, 100] |
//!
//! The score depends only on the sessions and conflicts it is given, not
//! on their order.
//!
//! # Reference
//! Burke & Petrovic (2002), "Recent research directions in automated
//! timetabling", EJOR 140(2): soft-constraint cost aggregation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ScoreWeights;
use crate::constraint::ConstraintModel;
use crate::models::{Conflict, Session};
use chrono::Weekday;

/// Score components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Fraction of room-slot capacity in use (0.0..=1.0).
    pub utilization: f64,
    /// Normalized faculty day-load imbalance (0.0..1.0).
    pub balance_penalty: f64,
    /// Number of blocking conflicts.
    pub blocking: usize,
    /// Number of warnings.
    pub warnings: usize,
    /// Final score (0.0..=100.0).
    pub score: f64,
}

/// Scores timetables of one model.
#[derive(Debug, Clone)]
pub struct ScoreEvaluator {
    weights: ScoreWeights,
    days: Vec<Weekday>,
    granularity: u32,
    capacity: usize,
}

impl ScoreEvaluator {
    /// Creates an evaluator from a model's grid, rooms, and weights.
    pub fn new(model: &ConstraintModel) -> Self {
        let grid = model.grid();
        Self::from_parts(
            model.config().weights.clone(),
            grid.days().to_vec(),
            grid.granularity(),
            grid.base_slot_count() * model.classroom_count(),
        )
    }

    /// Creates an evaluator directly.
    ///
    /// # Arguments
    /// * `days` - Working days over which load balance is measured.
    /// * `granularity` - Minutes per grid slot.
    /// * `capacity` - Room-slots available per week.
    pub fn from_parts(
        weights: ScoreWeights,
        days: Vec<Weekday>,
        granularity: u32,
        capacity: usize,
    ) -> Self {
        Self {
            weights,
            days,
            granularity: granularity.max(1),
            capacity,
        }
    }

    /// Scores a session set with its conflicts.
    pub fn evaluate(&self, sessions: &[Session], conflicts: &[Conflict]) -> ScoreBreakdown {
        let utilization = self.utilization(sessions);
        let balance_penalty = self.balance_penalty(sessions);
        let blocking = conflicts.iter().filter(|c| c.is_blocking()).count();
        let warnings = conflicts.len() - blocking;

        let w = &self.weights;
        let total_weight = w.utilization + w.balance;
        let quality = if total_weight > 0.0 {
            (w.utilization * utilization + w.balance * (1.0 - balance_penalty)) / total_weight
        } else {
            0.0
        };
        let raw = 100.0 * quality
            - blocking as f64 * w.blocking_penalty
            - warnings as f64 * w.warning_penalty;

        ScoreBreakdown {
            utilization,
            balance_penalty,
            blocking,
            warnings,
            score: raw.clamp(0.0, 100.0),
        }
    }

    fn utilization(&self, sessions: &[Session]) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        let units: u32 = sessions
            .iter()
            .map(|s| s.duration_minutes().div_ceil(self.granularity))
            .sum();
        (units as f64 / self.capacity as f64).clamp(0.0, 1.0)
    }

    fn balance_penalty(&self, sessions: &[Session]) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        let mut counts: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for s in sessions {
            let Some(d) = self.days.iter().position(|day| *day == s.slot.day) else {
                continue;
            };
            counts
                .entry(s.faculty_id.as_str())
                .or_insert_with(|| vec![0; self.days.len()])[d] += 1;
        }
        if counts.is_empty() {
            return 0.0;
        }

        let n = self.days.len() as f64;
        let mean_variance = counts
            .values()
            .map(|days| {
                let mean = days.iter().sum::<u32>() as f64 / n;
                days.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / n
            })
            .sum::<f64>()
            / counts.len() as f64;
        mean_variance / (1.0 + mean_variance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictKind, Severity, Slot};
    use chrono::NaiveTime;

    fn weekdays() -> Vec<Weekday> {
        vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
    }

    fn session(idx: u32, faculty: &str, day: Weekday, h: u32) -> Session {
        let slot = Slot::starting_at(day, NaiveTime::from_hms_opt(h, 0, 0).unwrap(), 60).unwrap();
        Session::new("S", "A", idx, faculty, "R", slot)
    }

    fn evaluator(capacity: usize) -> ScoreEvaluator {
        ScoreEvaluator::from_parts(ScoreWeights::default(), weekdays(), 60, capacity)
    }

    #[test]
    fn test_empty_timetable() {
        let b = evaluator(30).evaluate(&[], &[]);
        assert!((b.utilization - 0.0).abs() < 1e-10);
        assert!((b.balance_penalty - 0.0).abs() < 1e-10);
        // Only the balance term contributes: 0.4 / 1.0
        assert!((b.score - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_perfect_timetable_scores_100() {
        let days = weekdays();
        let sessions: Vec<_> = (0..5).map(|i| session(i, "F", days[i as usize], 9)).collect();
        let b = evaluator(5).evaluate(&sessions, &[]);
        assert!((b.utilization - 1.0).abs() < 1e-10);
        assert!((b.balance_penalty - 0.0).abs() < 1e-10);
        assert!((b.score - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_imbalance_penalized() {
        let spread = vec![
            session(0, "F", Weekday::Mon, 9),
            session(1, "F", Weekday::Tue, 9),
        ];
        let stacked = vec![
            session(0, "F", Weekday::Mon, 9),
            session(1, "F", Weekday::Mon, 10),
        ];
        let e = evaluator(35);
        let a = e.evaluate(&spread, &[]);
        let b = e.evaluate(&stacked, &[]);
        assert!((a.utilization - b.utilization).abs() < 1e-10);
        assert!(a.balance_penalty < b.balance_penalty);
        assert!(a.score > b.score);
        // Counts [2,0,0,0,0]: mean 0.4, variance 0.64
        assert!((b.balance_penalty - 0.64 / 1.64).abs() < 1e-10);
    }

    #[test]
    fn test_conflict_penalties() {
        let sessions = vec![session(0, "F", Weekday::Mon, 9)];
        let blocking = Conflict::double_booked(ConflictKind::FacultyDoubleBooked, "x", "y", "F");
        let warning = Conflict::new(
            ConflictKind::CapacityExceeded,
            Severity::Warning,
            vec!["x".into()],
            "R",
            "small room",
        );
        let e = evaluator(35);
        let clean = e.evaluate(&sessions, &[]);
        let warned = e.evaluate(&sessions, &[warning.clone()]);
        let blocked = e.evaluate(&sessions, &[blocking, warning]);

        assert_eq!(warned.warnings, 1);
        assert!((clean.score - warned.score - 2.0).abs() < 1e-10);
        assert_eq!(blocked.blocking, 1);
        assert!(blocked.score < warned.score);
    }

    #[test]
    fn test_score_clamped() {
        let sessions = vec![session(0, "F", Weekday::Mon, 9)];
        let many: Vec<_> = (0..10)
            .map(|i| {
                Conflict::double_booked(ConflictKind::BatchDoubleBooked, "a", &format!("b{i}"), "A")
            })
            .collect();
        let b = evaluator(35).evaluate(&sessions, &many);
        assert!((b.score - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_order_independent() {
        let mut sessions = vec![
            session(0, "F", Weekday::Mon, 9),
            session(1, "G", Weekday::Mon, 10),
            session(2, "F", Weekday::Wed, 9),
        ];
        let e = evaluator(35);
        let a = e.evaluate(&sessions, &[]);
        sessions.reverse();
        let b = e.evaluate(&sessions, &[]);
        assert_eq!(a, b);
    }
}
