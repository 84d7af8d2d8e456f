//! Allocation, conflict detection, and scoring.
//!
//! # Algorithm
//!
//! [`SlotAllocator`] places demand units most-constrained first with
//! bounded backtracking. [`ConflictDetector`] re-checks every invariant on
//! the result; it is the only judge of whether a session set may be
//! committed. [`ScoreEvaluator`] rates what passes.
//! [`generate_timetable`] chains the three.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling", Artificial Intelligence Review 13
//! - Carter & Laporte (1998), "Recent Developments in Practical Course Timetabling"

mod allocator;
mod conflicts;
mod generate;
mod occupancy;
mod score;

pub use allocator::{Allocation, SlotAllocator};
pub use conflicts::{detect_double_bookings, ConflictDetector};
pub use generate::generate_timetable;
pub use occupancy::{Occupancy, Placement};
pub use score::{ScoreBreakdown, ScoreEvaluator};
