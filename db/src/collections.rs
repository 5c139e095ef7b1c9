//! Collection and sub-collection names used by the document store.
//!
//! Field and collection names are the store's wire names, which is why they
//! are camelCase. Two schema generations are in circulation; the `legacy`
//! constants are only queried when the current-generation query comes back
//! empty.

pub const USERS: &str = "users";
pub const TEACHERS: &str = "teachers";
pub const COURSES: &str = "courses";
pub const ENROLLMENTS: &str = "enrollments";
pub const COURSE_SUMMARIES: &str = "studentCourseSummaries";
pub const STUDENT_ASSIGNMENTS: &str = "studentAssignments";
pub const STUDENT_MODULES: &str = "studentModules";

/// Sub-collections of `courses`.
pub const MODULES_SUBPATH: &str = "modules";
pub const ASSIGNMENTS_SUBPATH: &str = "assignments";

pub mod legacy {
    /// Parent collection of the nested per-student progress tree.
    pub const STUDENT_PROGRESS: &str = "studentProgress";
    /// `studentProgress/{studentId}/courses/{courseId}`
    pub const COURSES_SUBPATH: &str = "courses";
    /// `studentProgress/{studentId}/assignments/{assignmentId}`
    pub const ASSIGNMENTS_SUBPATH: &str = "assignments";
}
