//! Demo-data seeders. Ids are deterministic so the seeders can cross-reference
//! each other without sharing state; only names, scores and dates are random.

pub mod courses;
pub mod enrollments;
pub mod student_assignments;
pub mod student_modules;
pub mod summaries;
pub mod users;

pub const TEACHER_COUNT: usize = 3;
pub const COURSE_COUNT: usize = 6;
pub const STUDENT_COUNT: usize = 40;
pub const MODULES_PER_COURSE: usize = 5;
pub const ASSIGNMENTS_PER_COURSE: usize = 4;

pub fn teacher_id(i: usize) -> String {
    format!("t{:04}", i + 1)
}

pub fn teacher_user_id(i: usize) -> String {
    format!("u-teacher-{:02}", i + 1)
}

pub fn student_id(i: usize) -> String {
    format!("s{:04}", i + 1)
}

pub fn course_id(i: usize) -> String {
    format!("c{:04}", i + 1)
}

pub fn module_id(course: usize, module: usize) -> String {
    format!("{}-m{}", course_id(course), module + 1)
}

pub fn assignment_id(course: usize, assignment: usize) -> String {
    format!("{}-a{}", course_id(course), assignment + 1)
}

/// Which courses a student is enrolled in. Two per student, spread evenly.
pub fn courses_for_student(student: usize) -> [usize; 2] {
    [student % COURSE_COUNT, (student + 1) % COURSE_COUNT]
}
