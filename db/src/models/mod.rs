//! Typed records decoded from store documents.
//!
//! Each record has exactly one `from_document` adapter, and every legacy
//! field-name fallback lives inside that adapter. Aggregation code only ever
//! sees the canonical shape.

pub mod assignment;
pub mod course;
pub mod course_module;
pub mod enrollment;
pub mod progress;
pub mod user;

pub use assignment::{Assignment, AssignmentType};
pub use course::Course;
pub use course_module::CourseModule;
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use progress::{AssignmentProgress, ModuleProgressRecord, ProgressSummary};
pub use user::{Role, User};
