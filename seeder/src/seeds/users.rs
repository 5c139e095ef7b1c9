use crate::seed::Seeder;
use crate::seeds::{STUDENT_COUNT, TEACHER_COUNT, student_id, teacher_id, teacher_user_id};
use db::SqliteStore;
use db::collections;
use db::error::StoreError;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use serde_json::json;
use std::pin::Pin;

pub struct UserSeeder;

impl Seeder for UserSeeder {
    fn seed<'a>(
        &'a self,
        store: &'a SqliteStore,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            for i in 0..TEACHER_COUNT {
                let first: String = FirstName().fake();
                let last: String = LastName().fake();
                let user_id = teacher_user_id(i);
                store
                    .upsert_document(
                        collections::USERS,
                        &user_id,
                        &json!({
                            "role": "teacher",
                            "firstName": first,
                            "lastName": last,
                            "email": format!("teacher{}@school.example", i + 1),
                            "authUid": format!("auth-teacher-{:02}", i + 1),
                        }),
                    )
                    .await?;
                store
                    .upsert_document(
                        collections::TEACHERS,
                        &teacher_id(i),
                        &json!({ "userId": user_id }),
                    )
                    .await?;
            }

            for i in 0..STUDENT_COUNT {
                let first: String = FirstName().fake();
                let last: String = LastName().fake();
                store
                    .upsert_document(
                        collections::USERS,
                        &student_id(i),
                        &json!({
                            "role": "student",
                            "firstName": first,
                            "lastName": last,
                            "email": format!("student{:03}@school.example", i + 1),
                            "schoolId": "sch-001",
                        }),
                    )
                    .await?;
            }

            store
                .upsert_document(
                    collections::USERS,
                    "u-admin",
                    &json!({
                        "role": "admin",
                        "firstName": "Site",
                        "lastName": "Admin",
                        "email": "admin@school.example",
                    }),
                )
                .await?;
            Ok(())
        })
    }
}
