use crate::seed::Seeder;
use crate::seeds::{
    ASSIGNMENTS_PER_COURSE, COURSE_COUNT, MODULES_PER_COURSE, TEACHER_COUNT, assignment_id,
    course_id, module_id, teacher_id,
};
use chrono::{Duration, Utc};
use db::SqliteStore;
use db::collections;
use db::error::StoreError;
use serde_json::json;
use std::pin::Pin;

const COURSE_NAMES: [&str; COURSE_COUNT] = [
    "Algebra II",
    "Geometry",
    "Physical Sciences",
    "Life Sciences",
    "English Home Language",
    "History",
];

const ASSIGNMENT_TYPES: [&str; ASSIGNMENTS_PER_COURSE] = ["Quiz", "Exam", "Project", "Participation"];

pub struct CourseSeeder;

impl Seeder for CourseSeeder {
    fn seed<'a>(
        &'a self,
        store: &'a SqliteStore,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let now = Utc::now();
            for i in 0..COURSE_COUNT {
                let id = course_id(i);
                let owner = teacher_id(i % TEACHER_COUNT);

                // The last course is kept on the previous schema generation:
                // `name` and a scalar `teacherId`.
                let body = if i == COURSE_COUNT - 1 {
                    json!({
                        "name": COURSE_NAMES[i],
                        "teacherId": owner,
                        "studentCount": fastrand::usize(10..20),
                    })
                } else {
                    json!({
                        "courseName": COURSE_NAMES[i],
                        "teacherIds": [owner],
                        "studentCount": fastrand::usize(10..20),
                    })
                };
                store.upsert_document(collections::COURSES, &id, &body).await?;

                for m in 0..MODULES_PER_COURSE {
                    store
                        .upsert_subdocument(
                            collections::COURSES,
                            &id,
                            collections::MODULES_SUBPATH,
                            &module_id(i, m),
                            &json!({
                                "title": format!("Unit {}", m + 1),
                                "sequenceNumber": m + 1,
                                "isRequired": m < 3,
                            }),
                        )
                        .await?;
                }

                for a in 0..ASSIGNMENTS_PER_COURSE {
                    // Due dates straddle today so every status shows up.
                    let due = now + Duration::days(a as i64 * 10 - 15);
                    let assigned = due - Duration::days(14);
                    store
                        .upsert_subdocument(
                            collections::COURSES,
                            &id,
                            collections::ASSIGNMENTS_SUBPATH,
                            &assignment_id(i, a),
                            &json!({
                                "title": format!("{} {}", ASSIGNMENT_TYPES[a], a + 1),
                                "type": ASSIGNMENT_TYPES[a],
                                "dueDate": due.to_rfc3339(),
                                "assignDate": assigned.to_rfc3339(),
                                "maxScore": 100.0,
                                "weight": if ASSIGNMENT_TYPES[a] == "Exam" { 2.0 } else { 1.0 },
                            }),
                        )
                        .await?;
                }
            }
            Ok(())
        })
    }
}
