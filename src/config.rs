//! Engine configuration.
//!
//! Every generation or reconciliation run receives an explicit
//! [`EngineConfig`]; nothing is read from process-wide state. Configs can
//! be built in code or loaded from TOML.
//!
//! # Examples
//!
//! ```
//! use u_timetable::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     working_days = ["Mon", "Tue", "Wed"]
//!     day_start = "08:00:00"
//!     day_end = "14:00:00"
//!     slot_granularity_minutes = 30
//!
//!     [weights]
//!     utilization = 0.5
//!     balance = 0.5
//! "#).unwrap();
//!
//! assert_eq!(config.working_days.len(), 3);
//! assert_eq!(config.slot_granularity_minutes, 30);
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ClassroomType;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

const DEFAULT_BACKTRACK_FACTOR: usize = 8;
const DEFAULT_TIME_BUDGET_MS: u64 = 30_000;
const DEFAULT_RECONCILE_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_LOCK_WAIT_MS: u64 = 5_000;
const DEFAULT_MAX_CONCURRENT_RUNS: usize = 4;

/// Per-run engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Teaching days, in timetable order.
    pub working_days: Vec<Weekday>,
    /// Start of the teaching day.
    pub day_start: NaiveTime,
    /// End of the teaching day.
    pub day_end: NaiveTime,
    /// Lunch break start; `None` disables the break.
    pub lunch_start: Option<NaiveTime>,
    /// Lunch break end.
    pub lunch_end: Option<NaiveTime>,
    /// Step between candidate start times (minutes).
    pub slot_granularity_minutes: u32,
    /// Backtrack bound = factor × demand units (when no explicit limit).
    pub backtrack_factor: usize,
    /// Explicit backtrack bound.
    pub backtrack_limit: Option<usize>,
    /// Wall-clock budget for a generation run (ms).
    pub time_budget_ms: u64,
    /// Wall-clock budget for a reconciliation (ms).
    pub reconcile_timeout_ms: u64,
    /// How long a request waits for a busy key (ms).
    pub lock_wait_ms: u64,
    /// CPU-bound runs allowed in flight at once.
    pub max_concurrent_runs: usize,
    /// Tolerate capacity/requirement mismatches as warnings.
    pub relaxed_matching: bool,
    /// Fraction of the batch size a room may fall short by under relaxed matching.
    pub capacity_tolerance: f64,
    /// Which room types may substitute for a required type.
    pub room_compatibility: Vec<RoomCompatibility>,
    /// Score weights.
    pub weights: ScoreWeights,
}

/// A substitution rule: a subject requiring `required` may use any of `accepts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCompatibility {
    pub required: ClassroomType,
    pub accepts: Vec<ClassroomType>,
}

/// Weights of the optimization score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of the utilization term.
    pub utilization: f64,
    /// Weight of the load-balance term.
    pub balance: f64,
    /// Points subtracted per blocking conflict.
    pub blocking_penalty: f64,
    /// Points subtracted per warning.
    pub warning_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            utilization: 0.6,
            balance: 0.4,
            blocking_penalty: 25.0,
            warning_penalty: 2.0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            day_start: hm(9, 0),
            day_end: hm(17, 0),
            lunch_start: Some(hm(13, 0)),
            lunch_end: Some(hm(14, 0)),
            slot_granularity_minutes: 60,
            backtrack_factor: DEFAULT_BACKTRACK_FACTOR,
            backtrack_limit: None,
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            reconcile_timeout_ms: DEFAULT_RECONCILE_TIMEOUT_MS,
            lock_wait_ms: DEFAULT_LOCK_WAIT_MS,
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
            relaxed_matching: false,
            capacity_tolerance: 0.0,
            room_compatibility: default_room_compatibility(),
            weights: ScoreWeights::default(),
        }
    }
}

fn default_room_compatibility() -> Vec<RoomCompatibility> {
    vec![
        RoomCompatibility {
            required: ClassroomType::TutorialRoom,
            accepts: vec![ClassroomType::LectureHall],
        },
        RoomCompatibility {
            required: ClassroomType::SeminarHall,
            accepts: vec![ClassroomType::LectureHall],
        },
        RoomCompatibility {
            required: ClassroomType::LectureHall,
            accepts: vec![ClassroomType::Auditorium],
        },
    ]
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

impl EngineConfig {
    /// Creates the default configuration (Mon–Fri, 09:00–17:00, lunch 13:00–14:00, hourly slots).
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string and validates it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the working days.
    pub fn with_working_days(mut self, days: Vec<Weekday>) -> Self {
        self.working_days = days;
        self
    }

    /// Sets the teaching day window.
    pub fn with_day_window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.day_start = start;
        self.day_end = end;
        self
    }

    /// Sets the lunch break.
    pub fn with_lunch(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.lunch_start = Some(start);
        self.lunch_end = Some(end);
        self
    }

    /// Removes the lunch break.
    pub fn without_lunch(mut self) -> Self {
        self.lunch_start = None;
        self.lunch_end = None;
        self
    }

    /// Sets the slot granularity.
    pub fn with_granularity(mut self, minutes: u32) -> Self {
        self.slot_granularity_minutes = minutes;
        self
    }

    /// Sets an explicit backtrack bound.
    pub fn with_backtrack_limit(mut self, limit: usize) -> Self {
        self.backtrack_limit = Some(limit);
        self
    }

    /// Sets the generation time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = budget.as_millis() as u64;
        self
    }

    /// Sets the reconciliation timeout.
    pub fn with_reconcile_timeout(mut self, timeout: Duration) -> Self {
        self.reconcile_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the lock wait.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait_ms = wait.as_millis() as u64;
        self
    }

    /// Sets how many runs may compute at once.
    pub fn with_max_concurrent_runs(mut self, runs: usize) -> Self {
        self.max_concurrent_runs = runs;
        self
    }

    /// Enables relaxed matching with a capacity tolerance.
    pub fn with_relaxed_matching(mut self, capacity_tolerance: f64) -> Self {
        self.relaxed_matching = true;
        self.capacity_tolerance = capacity_tolerance;
        self
    }

    /// Sets score weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Backtrack bound for a model with `demand_units` units.
    pub fn backtrack_bound(&self, demand_units: usize) -> usize {
        self.backtrack_limit
            .unwrap_or_else(|| self.backtrack_factor.saturating_mul(demand_units.max(1)))
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_millis(self.reconcile_timeout_ms)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    /// Lunch break as a `(start, end)` pair, if configured.
    pub fn lunch(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.lunch_start, self.lunch_end) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }

    /// Whether a room of type `offered` satisfies a requirement of type `required`.
    pub fn room_type_accepts(&self, required: ClassroomType, offered: ClassroomType) -> bool {
        required == offered
            || self
                .room_compatibility
                .iter()
                .any(|rule| rule.required == required && rule.accepts.contains(&offered))
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.working_days.is_empty() {
            return Err(ConfigError::Invalid("no working days".into()));
        }
        for (i, day) in self.working_days.iter().enumerate() {
            if self.working_days[..i].contains(day) {
                return Err(ConfigError::Invalid(format!("working day {day} listed twice")));
            }
        }
        if self.day_start >= self.day_end {
            return Err(ConfigError::Invalid(format!(
                "day_start {} must precede day_end {}",
                self.day_start, self.day_end
            )));
        }
        if self.slot_granularity_minutes == 0 {
            return Err(ConfigError::Invalid("slot granularity must be positive".into()));
        }
        match (self.lunch_start, self.lunch_end) {
            (Some(s), Some(e)) => {
                if s >= e || s < self.day_start || e > self.day_end {
                    return Err(ConfigError::Invalid(format!(
                        "lunch {s}-{e} must be a non-empty range inside the working day"
                    )));
                }
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "lunch_start and lunch_end must be set together".into(),
                ))
            }
        }
        if !(0.0..1.0).contains(&self.capacity_tolerance) {
            return Err(ConfigError::Invalid(format!(
                "capacity_tolerance {} outside [0, 1)",
                self.capacity_tolerance
            )));
        }
        let w = &self.weights;
        let finite = [w.utilization, w.balance, w.blocking_penalty, w.warning_penalty]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !finite || w.utilization + w.balance <= 0.0 {
            return Err(ConfigError::Invalid(
                "score weights must be finite, non-negative, and not all zero".into(),
            ));
        }
        if self.max_concurrent_runs == 0 {
            return Err(ConfigError::Invalid("max_concurrent_runs must be positive".into()));
        }
        Ok(())
    }
}
