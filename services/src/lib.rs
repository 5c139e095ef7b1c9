//! Aggregation services for the analytics dashboard.
//!
//! Joins courses, enrollments, users and progress summaries fetched through
//! the document access layer, derives dashboard metrics and risk
//! assessments, and caches results per logical query.
//!
//! Failure policy: every public aggregation entry point contains its own
//! errors, records them on the degradation telemetry channel, and returns an
//! empty result. A partial dashboard beats a crashed one.

pub mod cache;
pub mod charts;
pub mod course_service;
pub mod error;
pub mod predictions;
pub mod risk;
pub mod student_service;
pub mod telemetry;

pub use cache::{CacheClass, QueryCache};
pub use course_service::{CourseService, CourseStats};
pub use error::ServiceError;
pub use predictions::{PredictionBatch, PredictionError, PredictionSource, RiskPrediction};
pub use risk::{RiskAssessment, RiskLevel, RiskMetrics};
pub use student_service::{
    AssignmentStatus, ModuleProgressRow, PredictionStatus, StudentAssignmentRow, StudentService,
    StudentSummary,
};
pub use telemetry::Telemetry;
