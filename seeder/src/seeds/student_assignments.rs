use crate::seed::Seeder;
use crate::seeds::{
    ASSIGNMENTS_PER_COURSE, STUDENT_COUNT, assignment_id, courses_for_student, student_id,
};
use chrono::{Duration, Utc};
use db::SqliteStore;
use db::collections;
use db::error::StoreError;
use serde_json::json;
use std::pin::Pin;

pub struct StudentAssignmentSeeder;

impl Seeder for StudentAssignmentSeeder {
    fn seed<'a>(
        &'a self,
        store: &'a SqliteStore,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let now = Utc::now();
            for i in 0..STUDENT_COUNT {
                if i % 9 == 0 {
                    // Matches the never-engaged students in the summaries.
                    continue;
                }
                let sid = student_id(i);
                for course in courses_for_student(i) {
                    for a in 0..ASSIGNMENTS_PER_COURSE {
                        // Mirrors the due-date layout in the course seeder;
                        // only assignments already due have submissions, and
                        // not all of those.
                        let due = now + Duration::days(a as i64 * 10 - 15);
                        if due > now || fastrand::f64() < 0.25 {
                            continue;
                        }
                        let offset_hours = fastrand::i64(-72..24);
                        let submitted = due + Duration::hours(offset_hours);
                        let aid = assignment_id(course, a);
                        store
                            .upsert_document(
                                collections::STUDENT_ASSIGNMENTS,
                                &format!("{sid}-{aid}"),
                                &json!({
                                    "studentId": sid,
                                    "assignmentId": aid,
                                    "submittedAt": submitted.to_rfc3339(),
                                    "score": 35.0 + fastrand::f64() * 65.0,
                                }),
                            )
                            .await?;
                    }
                }
            }
            Ok(())
        })
    }
}
