//! Async service layer.
//!
//! - [`TimetableEngine`]: generate / publish / archive / reconcile entry points
//! - [`SnapshotProvider`], [`TimetableStore`]: collaborator traits, with
//!   in-memory implementations
//! - [`KeyLocks`]: per-key locks with bounded wait

mod engine;
mod lock;
mod store;

pub use engine::TimetableEngine;
pub use lock::{KeyGuard, KeyLocks};
pub use store::{InMemorySnapshotProvider, InMemoryTimetableStore, SnapshotProvider, TimetableStore};
