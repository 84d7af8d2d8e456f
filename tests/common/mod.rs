#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveTime;
use tracing_subscriber::EnvFilter;
use u_timetable::config::EngineConfig;
use u_timetable::models::{
    Batch, Classroom, Designation, EntitySnapshot, Faculty, Subject, TimetableKey,
};
use u_timetable::service::{InMemorySnapshotProvider, InMemoryTimetableStore, TimetableEngine};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

pub fn key() -> TimetableKey {
    TimetableKey::new("CSE", "2024-25", 5)
}

/// Five working days of six hourly slots, no lunch.
pub fn six_slot_week() -> EngineConfig {
    EngineConfig::default().with_day_window(t(9), t(15)).without_lunch()
}

/// One batch, one subject taught three times a week, one faculty member, one room.
pub fn single_subject() -> EntitySnapshot {
    EntitySnapshot::new()
        .with_subject(Subject::theory("CS301", "CSE").with_sessions_per_week(3))
        .with_faculty(Faculty::new("F1", Designation::Professor))
        .with_classroom(Classroom::lecture_hall("LH-1", 60))
        .with_batch(Batch::new("A", 40).with_subject("CS301"))
}

/// A mid-sized department: four subjects, four faculty, three rooms, two batches.
pub fn department() -> EntitySnapshot {
    EntitySnapshot::new()
        .with_subject(
            Subject::theory("CS301", "CSE")
                .with_sessions_per_week(3)
                .with_specialization("systems"),
        )
        .with_subject(
            Subject::theory("CS302", "CSE")
                .with_sessions_per_week(3)
                .with_specialization("theory"),
        )
        .with_subject(Subject::theory("MA301", "CSE").with_sessions_per_week(2))
        .with_subject(
            Subject::lab("CS391", "CSE")
                .with_duration(120)
                .with_specialization("systems"),
        )
        .with_faculty(
            Faculty::new("F1", Designation::Professor)
                .with_department("CSE")
                .with_specialization("systems"),
        )
        .with_faculty(
            Faculty::new("F2", Designation::AssociateProfessor)
                .with_department("CSE")
                .with_specialization("theory"),
        )
        .with_faculty(
            Faculty::new("F3", Designation::AssistantProfessor)
                .with_department("CSE")
                .with_specialization("systems")
                .with_specialization("theory"),
        )
        .with_faculty(Faculty::new("F4", Designation::Lecturer).with_department("CSE"))
        .with_classroom(Classroom::lecture_hall("LH-1", 70))
        .with_classroom(Classroom::lecture_hall("LH-2", 50))
        .with_classroom(Classroom::lab("LAB-1", 60))
        .with_batch(
            Batch::new("CSE-A", 60)
                .with_subject("CS301")
                .with_subject("CS302")
                .with_subject("MA301")
                .with_subject("CS391"),
        )
        .with_batch(
            Batch::new("CSE-B", 45)
                .with_subject("CS301")
                .with_subject("CS302")
                .with_subject("MA301"),
        )
}

pub fn engine_with(
    snapshot: EntitySnapshot,
    config: EngineConfig,
) -> (TimetableEngine, Arc<InMemoryTimetableStore>) {
    let provider = Arc::new(InMemorySnapshotProvider::new().with_snapshot(key(), snapshot));
    let store = Arc::new(InMemoryTimetableStore::new());
    let engine = TimetableEngine::new(provider, store.clone(), config).unwrap();
    (engine, store)
}
