use crate::seed::{Seeder, run_seeder};
use crate::seeds::{
    courses::CourseSeeder, enrollments::EnrollmentSeeder, student_assignments::StudentAssignmentSeeder,
    student_modules::StudentModuleSeeder, summaries::SummarySeeder, users::UserSeeder,
};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    let config = common::config::Config::init(".env");
    common::logger::init_logger(&config.log_level, &config.log_file, false);

    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(parent).expect("Failed to create data directory");
    }
    let store = db::SqliteStore::connect(&config.database_path)
        .await
        .expect("Failed to open document store");

    for (seeder, name) in [
        (Box::new(UserSeeder) as Box<dyn Seeder + Send + Sync>, "User"),
        (Box::new(CourseSeeder), "Course"),
        (Box::new(EnrollmentSeeder), "Enrollment"),
        (Box::new(SummarySeeder), "CourseSummary"),
        (Box::new(StudentAssignmentSeeder), "StudentAssignment"),
        (Box::new(StudentModuleSeeder), "StudentModule"),
    ] {
        run_seeder(&*seeder, name, &store).await;
    }
}
