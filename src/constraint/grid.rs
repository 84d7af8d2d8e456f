//! Weekly time grid.
//!
//! Expands the configured working days, working-hour window, lunch
//! break, and granularity into candidate slots. Enumeration order is
//! day order (as configured) then start time, which is also the
//! allocator's earliest-slot tie-break.

use chrono::Weekday;

use crate::config::EngineConfig;
use crate::models::{minutes_of, time_from_minutes, Slot};

/// The teaching grid of one configuration.
#[derive(Debug, Clone)]
pub struct TimeGrid {
    days: Vec<Weekday>,
    day_start: u32,
    day_end: u32,
    lunch: Option<(u32, u32)>,
    granularity: u32,
}

impl TimeGrid {
    /// Builds the grid described by `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            days: config.working_days.clone(),
            day_start: minutes_of(config.day_start),
            day_end: minutes_of(config.day_end),
            lunch: config.lunch().map(|(s, e)| (minutes_of(s), minutes_of(e))),
            granularity: config.slot_granularity_minutes.max(1),
        }
    }

    /// Working days in order.
    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// Position of `day` in the working week.
    pub fn day_index(&self, day: Weekday) -> Option<usize> {
        self.days.iter().position(|d| *d == day)
    }

    /// Every slot of length `duration_minutes` the grid admits, in day
    /// order then start order.
    pub fn candidate_slots(&self, duration_minutes: u32) -> Vec<Slot> {
        let mut slots = Vec::new();
        if duration_minutes == 0 {
            return slots;
        }
        for &day in &self.days {
            let mut start = self.day_start;
            while let Some(end) = start
                .checked_add(duration_minutes)
                .filter(|end| *end <= self.day_end)
            {
                if self.admits(start, duration_minutes) {
                    if let (Some(s), Some(e)) = (time_from_minutes(start), time_from_minutes(end)) {
                        slots.push(Slot::new(day, s, e));
                    }
                }
                start += self.granularity;
            }
        }
        slots
    }

    /// Whether `slot` lies inside the working window of a working day and
    /// clear of lunch.
    pub fn contains(&self, slot: &Slot) -> bool {
        if self.day_index(slot.day).is_none() || slot.end <= slot.start {
            return false;
        }
        let start = minutes_of(slot.start);
        let end = minutes_of(slot.end);
        start >= self.day_start && end <= self.day_end && self.admits(start, end - start)
    }

    /// Number of granularity-sized slots per week; the utilization
    /// denominator for one room.
    pub fn base_slot_count(&self) -> usize {
        self.candidate_slots(self.granularity).len()
    }

    /// Slot length in minutes.
    pub fn granularity(&self) -> u32 {
        self.granularity
    }

    fn admits(&self, start: u32, duration: u32) -> bool {
        match self.lunch {
            Some((ls, le)) => start.saturating_add(duration) <= ls || start >= le,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_default_grid() {
        // 09-17 with lunch 13-14: 7 hourly slots per day, 5 days
        let grid = TimeGrid::from_config(&EngineConfig::default());
        assert_eq!(grid.base_slot_count(), 35);

        let slots = grid.candidate_slots(60);
        assert_eq!(slots[0], Slot::new(Weekday::Mon, t(9, 0), t(10, 0)));
        assert!(slots.iter().all(|s| s.start != t(13, 0)));
        assert_eq!(slots.last().unwrap().day, Weekday::Fri);
    }

    #[test]
    fn test_long_sessions_avoid_lunch() {
        let grid = TimeGrid::from_config(&EngineConfig::default());
        let slots: Vec<_> = grid
            .candidate_slots(120)
            .into_iter()
            .filter(|s| s.day == Weekday::Mon)
            .collect();
        // 09-11, 10-12, 11-13, 14-16, 15-17
        assert_eq!(slots.len(), 5);
        assert!(!slots.iter().any(|s| s.start == t(12, 0)));
    }

    #[test]
    fn test_six_slot_day() {
        let config = EngineConfig::default()
            .with_day_window(t(9, 0), t(15, 0))
            .without_lunch();
        let grid = TimeGrid::from_config(&config);
        assert_eq!(grid.base_slot_count(), 30);
    }

    #[test]
    fn test_contains() {
        let grid = TimeGrid::from_config(&EngineConfig::default());
        assert!(grid.contains(&Slot::new(Weekday::Tue, t(10, 0), t(11, 0))));
        assert!(!grid.contains(&Slot::new(Weekday::Sat, t(10, 0), t(11, 0))));
        assert!(!grid.contains(&Slot::new(Weekday::Tue, t(12, 30), t(13, 30))));
        assert!(!grid.contains(&Slot::new(Weekday::Tue, t(16, 30), t(17, 30))));
        assert!(!grid.contains(&Slot::new(Weekday::Tue, t(8, 0), t(9, 0))));
    }

    #[test]
    fn test_oversized_duration_has_no_slots() {
        let grid = TimeGrid::from_config(&EngineConfig::default());
        assert!(grid.candidate_slots(u32::MAX).is_empty());
        assert!(grid.candidate_slots(9 * 60).is_empty());
        // Only 09-13 fits before lunch
        assert_eq!(grid.candidate_slots(4 * 60).len(), 5);
    }

    #[test]
    fn test_day_order_follows_config() {
        let config = EngineConfig::default().with_working_days(vec![Weekday::Fri, Weekday::Mon]);
        let grid = TimeGrid::from_config(&config);
        let slots = grid.candidate_slots(60);
        assert_eq!(slots[0].day, Weekday::Fri);
        assert_eq!(grid.day_index(Weekday::Mon), Some(1));
    }
}
