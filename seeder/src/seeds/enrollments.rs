use crate::seed::Seeder;
use crate::seeds::{STUDENT_COUNT, course_id, courses_for_student, student_id};
use db::SqliteStore;
use db::collections;
use db::error::StoreError;
use serde_json::json;
use std::pin::Pin;

pub struct EnrollmentSeeder;

impl Seeder for EnrollmentSeeder {
    fn seed<'a>(
        &'a self,
        store: &'a SqliteStore,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            for i in 0..STUDENT_COUNT {
                let sid = student_id(i);
                for (n, course) in courses_for_student(i).into_iter().enumerate() {
                    let cid = course_id(course);
                    // Every 7th student dropped their second course; every
                    // 11th enrollment predates the status field.
                    let body = if n == 1 && i % 7 == 0 {
                        json!({"studentId": sid, "courseId": cid, "status": "inactive"})
                    } else if i % 11 == 0 {
                        json!({"studentId": sid, "courseId": cid})
                    } else {
                        json!({"studentId": sid, "courseId": cid, "status": "active"})
                    };
                    store
                        .upsert_document(collections::ENROLLMENTS, &format!("{sid}-{cid}"), &body)
                        .await?;
                }
            }
            Ok(())
        })
    }
}
