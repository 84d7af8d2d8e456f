//! Weekly time model: slots and unavailability ranges.
//!
//! A timetable repeats every week, so every time value is a
//! (weekday, time-of-day) pair. Intervals are half-open `[start, end)`:
//! a session ending at 10:00 does not overlap one starting at 10:00.

use std::fmt;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// A teaching slot: one weekday and a `[start, end)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Day of the week.
    pub day: Weekday,
    /// Start time (inclusive).
    pub start: NaiveTime,
    /// End time (exclusive).
    pub end: NaiveTime,
}

impl Slot {
    /// Creates a slot.
    pub fn new(day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self { day, start, end }
    }

    /// Creates a slot starting at `start` and lasting `minutes`.
    ///
    /// Returns `None` if the slot would run past midnight.
    pub fn starting_at(day: Weekday, start: NaiveTime, minutes: u32) -> Option<Self> {
        let end_minutes = minutes_of(start).checked_add(minutes)?;
        if end_minutes >= 24 * 60 {
            return None;
        }
        Some(Self {
            day,
            start,
            end: time_from_minutes(end_minutes)?,
        })
    }

    /// Length of the slot in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> u32 {
        minutes_of(self.end).saturating_sub(minutes_of(self.start))
    }

    /// Whether two slots intersect (same day, overlapping intervals).
    #[inline]
    pub fn overlaps(&self, other: &Slot) -> bool {
        self.day == other.day && self.start < other.end && other.start < self.end
    }

    /// Whether this slot intersects an unavailability range.
    #[inline]
    pub fn intersects(&self, range: &TimeRange) -> bool {
        self.day == range.day && self.start < range.end && range.start < self.end
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// A range of time during which a faculty member is unavailable.
///
/// Derived from approved leave. `start == 00:00` and `end == 23:59:59`
/// covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Day of the week.
    pub day: Weekday,
    /// Range start (inclusive).
    pub start: NaiveTime,
    /// Range end (exclusive).
    pub end: NaiveTime,
}

impl TimeRange {
    /// Creates a range.
    pub fn new(day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self { day, start, end }
    }

    /// A range covering the whole of `day`.
    pub fn whole_day(day: Weekday) -> Self {
        Self {
            day,
            start: NaiveTime::default(),
            end: NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::default()),
        }
    }

    /// Whether the range has positive length.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Minutes since midnight.
#[inline]
pub(crate) fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Inverse of [`minutes_of`]; `None` past the end of the day.
#[inline]
pub(crate) fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}
