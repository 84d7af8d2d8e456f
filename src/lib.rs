//! Academic timetable engine.
//!
//! Builds weekly teaching timetables for a department/term from subjects,
//! faculty, classrooms, and student batches, and keeps published
//! timetables consistent as leave and reschedule requests arrive.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Subject`, `Faculty`, `Classroom`, `Batch`,
//!   `EntitySnapshot`, `Slot`, `Session`, `Timetable`, `Conflict`, requests
//! - **`config`**: Per-run `EngineConfig` (time grid, bounds, weights), TOML loading
//! - **`validation`**: Snapshot integrity checks (duplicate IDs, dangling references)
//! - **`constraint`**: Constraint model builder (demand units, eligibility, time grid)
//! - **`scheduler`**: Slot allocator, conflict detector, score evaluator,
//!   and the `generate_timetable` pipeline
//! - **`reconcile`**: Leave and reschedule reconciliation
//! - **`service`**: Async engine with per-key locking and bounded workers
//!
//! # Architecture
//!
//! Everything below `service` is synchronous and pure: the same snapshot
//! and configuration always yield the same timetable. `service` adds the
//! concurrency model (one run per key, bounded lock wait, a capped pool of
//! blocking workers) and talks to storage through traits.
//!
//! # Example
//!
//! ```
//! use u_timetable::config::EngineConfig;
//! use u_timetable::models::{Batch, Classroom, Designation, EntitySnapshot, Faculty, Subject, TimetableKey};
//! use u_timetable::scheduler::generate_timetable;
//!
//! let snapshot = EntitySnapshot::new()
//!     .with_subject(Subject::theory("CS301", "CSE").with_sessions_per_week(3))
//!     .with_faculty(Faculty::new("F1", Designation::Professor))
//!     .with_classroom(Classroom::lecture_hall("LH-1", 60))
//!     .with_batch(Batch::new("A", 40).with_subject("CS301"));
//!
//! let key = TimetableKey::new("CSE", "2024-25", 5);
//! let timetable = generate_timetable(key, &snapshot, &EngineConfig::default()).unwrap();
//! assert_eq!(timetable.session_count(), 3);
//! assert!(timetable.is_valid());
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

pub mod config;
pub mod constraint;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod scheduler;
pub mod service;
pub mod validation;

pub use error::{Result, TimetableError};
