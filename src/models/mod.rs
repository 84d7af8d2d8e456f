//! Timetabling domain models.
//!
//! Entity records (subjects, faculty, classrooms, batches) arrive as an
//! immutable [`EntitySnapshot`]. The engine produces [`Session`]s grouped
//! into a [`Timetable`], with detected [`Conflict`]s attached.
//!
//! # Domain Mappings
//!
//! | u-timetable | Generic scheduling |
//! |-------------|--------------------|
//! | Subject × Batch | Task |
//! | Session | Assignment |
//! | Faculty, Classroom, Batch | Resources |
//! | Timetable | Schedule |
//! | Conflict | Violation |

mod batch;
mod calendar;
mod classroom;
mod conflict;
mod faculty;
mod request;
mod session;
mod snapshot;
mod subject;
mod timetable;

pub use batch::Batch;
pub use calendar::{Slot, TimeRange};
pub(crate) use calendar::{minutes_of, time_from_minutes};
pub use classroom::{Classroom, ClassroomType};
pub use conflict::{Conflict, ConflictKind, Severity};
pub use faculty::{Designation, Faculty};
pub use request::{LeaveRequest, RequestStatus, RescheduleRequest, RescheduleTarget};
pub use session::Session;
pub use snapshot::EntitySnapshot;
pub use subject::{ClassroomRequirement, FacultyRequirement, Subject, SubjectType};
pub use timetable::{FacultyLeave, Timetable, TimetableKey, TimetableStatus};
