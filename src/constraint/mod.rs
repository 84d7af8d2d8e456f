//! Constraint model builder.
//!
//! Turns an entity snapshot and a configuration into the typed input of
//! the slot allocator: a [`TimeGrid`] and a list of [`DemandUnit`]s with
//! their eligible faculty, classrooms, and slots. Kept separate from the
//! search so eligibility can be tested on its own.
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", §3 (school and course
//! timetabling formulations)

mod builder;
mod grid;

pub use builder::{classroom_fit, faculty_qualifies, ConstraintModel, DemandUnit, RoomFit};
pub use grid::TimeGrid;
