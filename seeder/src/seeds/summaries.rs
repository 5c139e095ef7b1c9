use crate::seed::Seeder;
use crate::seeds::{STUDENT_COUNT, course_id, courses_for_student, student_id};
use chrono::{Duration, Utc};
use db::SqliteStore;
use db::collections;
use db::error::StoreError;
use serde_json::json;
use std::pin::Pin;

pub struct SummarySeeder;

impl Seeder for SummarySeeder {
    fn seed<'a>(
        &'a self,
        store: &'a SqliteStore,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let now = Utc::now();
            for i in 0..STUDENT_COUNT {
                let sid = student_id(i);
                for course in courses_for_student(i) {
                    let cid = course_id(course);
                    // Every 9th student never engaged: zero score, no access.
                    let mut body = if i % 9 == 0 {
                        json!({
                            "studentId": sid,
                            "courseId": cid,
                            "overallScore": 0.0,
                            "completionRate": 0.0,
                            "totalTimeSpentMinutes": 0.0,
                        })
                    } else {
                        json!({
                            "studentId": sid,
                            "courseId": cid,
                            "overallScore": 40.0 + fastrand::f64() * 55.0,
                            "completionRate": 30.0 + fastrand::f64() * 70.0,
                            "totalTimeSpentMinutes": fastrand::f64() * 2400.0,
                            "lastAccessed": (now - Duration::days(fastrand::i64(0..35))).to_rfc3339(),
                        })
                    };
                    // Submission rate only exists where the assignment
                    // pipeline has run; leave it absent for a third.
                    if i % 3 != 0 {
                        body["submissionRate"] =
                            json!(25.0 + fastrand::f64() * 75.0);
                    }
                    store
                        .upsert_document(
                            collections::COURSE_SUMMARIES,
                            &format!("{sid}-{cid}"),
                            &body,
                        )
                        .await?;
                }
            }
            Ok(())
        })
    }
}
