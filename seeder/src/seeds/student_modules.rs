use crate::seed::Seeder;
use crate::seeds::{
    MODULES_PER_COURSE, STUDENT_COUNT, course_id, courses_for_student, module_id, student_id,
};
use chrono::{Duration, Utc};
use db::SqliteStore;
use db::collections;
use db::error::StoreError;
use serde_json::json;
use std::pin::Pin;

pub struct StudentModuleSeeder;

impl Seeder for StudentModuleSeeder {
    fn seed<'a>(
        &'a self,
        store: &'a SqliteStore,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let now = Utc::now();
            for i in 0..STUDENT_COUNT {
                if i % 9 == 0 {
                    continue;
                }
                let sid = student_id(i);
                for course in courses_for_student(i) {
                    let cid = course_id(course);
                    // Students work through modules in order; later units
                    // have no record yet, which the join defaults to zero.
                    let reached = 1 + fastrand::usize(..MODULES_PER_COURSE);
                    for m in 0..reached {
                        let mid = module_id(course, m);
                        let completion = if m + 1 == reached {
                            fastrand::f64() * 80.0
                        } else {
                            100.0
                        };
                        store
                            .upsert_document(
                                collections::STUDENT_MODULES,
                                &format!("{sid}-{mid}"),
                                &json!({
                                    "studentId": sid,
                                    "courseId": cid,
                                    "moduleId": mid,
                                    "completionPercent": completion,
                                    "timeSpentMinutes": 20.0 + fastrand::f64() * 220.0,
                                    "lastAccessed": (now - Duration::days(fastrand::i64(0..21))).to_rfc3339(),
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
