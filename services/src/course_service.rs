//! Teacher resolution, course lists and per-course statistics.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use db::collections;
use db::filters::{FieldFilter, QueryOptions};
use db::models::{Course, Enrollment, ProgressSummary, Role, User};
use db::DocumentStore;

use crate::cache::{CacheClass, QueryCache};
use crate::error::ServiceError;
use crate::telemetry::Telemetry;

/// Per-course dashboard statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub course_id: String,
    pub course_name: String,
    /// Count of active enrollments, not the denormalized
    /// `Course.student_count`.
    pub student_count: usize,
    pub average_score: f64,
    pub average_completion: f64,
    pub module_count: usize,
    pub assignment_count: usize,
    pub active_last_7_days: usize,
    /// Superset of the 7-day count by construction.
    pub active_last_30_days: usize,
}

pub struct CourseService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<QueryCache>,
    telemetry: Arc<Telemetry>,
    ttl: Duration,
}

impl CourseService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<QueryCache>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            store,
            cache,
            telemetry,
            ttl: QueryCache::default_ttl(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Resolves whatever the UI has on hand (teacher id, user id, email, or
    /// auth identifier) to the teacher id used in `courses.teacherIds`.
    ///
    /// `None` means "no such teacher" and is not an error: the UI renders an
    /// empty course list for it.
    pub async fn resolve_teacher_id(
        &self,
        identifier: &str,
    ) -> Result<Option<String>, ServiceError> {
        if self
            .store
            .fetch_document_by_id(collections::TEACHERS, identifier)
            .await?
            .is_some()
        {
            return Ok(Some(identifier.to_string()));
        }

        if let Some(doc) = self
            .store
            .fetch_document_by_id(collections::USERS, identifier)
            .await?
        {
            if let Some(user) = User::from_document(&doc) {
                if user.role == Role::Teacher {
                    return Ok(Some(self.teacher_record_id(&user.id).await?));
                }
            }
        }

        match self.find_teacher_user(identifier).await? {
            Some(user) => Ok(Some(self.teacher_record_id(&user.id).await?)),
            None => {
                debug!("no teacher matches identifier {identifier:?}");
                Ok(None)
            }
        }
    }

    /// Looks a user up by email, then by auth identifier.
    async fn find_teacher_user(&self, identifier: &str) -> Result<Option<User>, ServiceError> {
        for field in ["email", "authUid"] {
            let docs = self
                .store
                .fetch_documents(
                    collections::USERS,
                    &QueryOptions::filtered(vec![FieldFilter::eq(field, identifier)])
                        .with_limit(1),
                )
                .await?;
            if let Some(doc) = docs.first() {
                match User::from_document(doc) {
                    Some(user) if user.role == Role::Teacher => return Ok(Some(user)),
                    Some(user) => {
                        debug!("identifier {identifier:?} matched non-teacher user {}", user.id);
                        return Ok(None);
                    }
                    None => warn!("undecodable user document matching {identifier:?}"),
                }
            }
        }
        Ok(None)
    }

    /// Maps a user id to its `teachers` record id. Old data used one id
    /// space for users and teachers, so the user id itself is the fallback.
    async fn teacher_record_id(&self, user_id: &str) -> Result<String, ServiceError> {
        let docs = self
            .store
            .fetch_documents(
                collections::TEACHERS,
                &QueryOptions::filtered(vec![FieldFilter::eq("userId", user_id)]).with_limit(1),
            )
            .await?;
        Ok(docs
            .first()
            .map(|d| d.id.clone())
            .unwrap_or_else(|| user_id.to_string()))
    }

    /// Courses owned by a teacher. Contained failures degrade to `[]`.
    pub async fn teacher_courses(&self, identifier: &str) -> Vec<Course> {
        let key = format!("teacher-{identifier}");
        if let Some(cached) = self.cache.get::<Vec<Course>>(CacheClass::TeacherCourses, &key) {
            return cached;
        }

        match self.teacher_courses_inner(identifier).await {
            Ok(courses) => {
                self.cache
                    .set(CacheClass::TeacherCourses, &key, &courses, self.ttl);
                courses
            }
            Err(e) => {
                self.telemetry.record_degraded("teacher_courses", &e);
                Vec::new()
            }
        }
    }

    async fn teacher_courses_inner(
        &self,
        identifier: &str,
    ) -> Result<Vec<Course>, ServiceError> {
        let Some(teacher_id) = self.resolve_teacher_id(identifier).await? else {
            return Ok(Vec::new());
        };

        let mut docs = self
            .store
            .fetch_documents(
                collections::COURSES,
                &QueryOptions::filtered(vec![FieldFilter::array_contains(
                    "teacherIds",
                    teacher_id.as_str(),
                )]),
            )
            .await?;

        // Legacy generation stored a single scalar teacherId; only consulted
        // when the array query comes back empty.
        if docs.is_empty() {
            docs = self
                .store
                .fetch_documents(
                    collections::COURSES,
                    &QueryOptions::filtered(vec![FieldFilter::eq(
                        "teacherId",
                        teacher_id.as_str(),
                    )]),
                )
                .await?;
        }

        Ok(docs.iter().filter_map(Course::from_document).collect())
    }

    /// Statistics for one course, or `None` when the course is missing or
    /// the fetch degrades.
    pub async fn course_stats(&self, course_id: &str) -> Option<CourseStats> {
        if let Some(cached) = self.cache.get::<CourseStats>(CacheClass::CourseStats, course_id) {
            return Some(cached);
        }

        match self.course_stats_inner(course_id, Utc::now()).await {
            Ok(Some(stats)) => {
                self.cache
                    .set(CacheClass::CourseStats, course_id, &stats, self.ttl);
                Some(stats)
            }
            Ok(None) => None,
            Err(e) => {
                self.telemetry.record_degraded("course_stats", &e);
                None
            }
        }
    }

    async fn course_stats_inner(
        &self,
        course_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CourseStats>, ServiceError> {
        let no_options = QueryOptions::default();
        let enrollment_options =
            QueryOptions::filtered(vec![FieldFilter::eq("courseId", course_id)]);
        let summary_options =
            QueryOptions::filtered(vec![FieldFilter::eq("courseId", course_id)]);

        let (course_doc, enrollments, modules, assignments, summaries) = tokio::join!(
            self.store
                .fetch_document_by_id(collections::COURSES, course_id),
            self.store
                .fetch_documents(collections::ENROLLMENTS, &enrollment_options),
            self.store.fetch_subcollection(
                collections::COURSES,
                course_id,
                collections::MODULES_SUBPATH,
                &no_options,
            ),
            self.store.fetch_subcollection(
                collections::COURSES,
                course_id,
                collections::ASSIGNMENTS_SUBPATH,
                &no_options,
            ),
            self.store
                .fetch_documents(collections::COURSE_SUMMARIES, &summary_options),
        );

        let Some(course_doc) = course_doc? else {
            debug!("course {course_id} not found");
            return Ok(None);
        };
        let Some(course) = Course::from_document(&course_doc) else {
            warn!("undecodable course document {course_id}");
            return Ok(None);
        };

        let enrollments: Vec<Enrollment> = enrollments?
            .iter()
            .filter_map(Enrollment::from_document)
            .filter(Enrollment::is_active)
            .collect();
        let active_count = enrollments.len();

        let mut summaries: Vec<ProgressSummary> = summaries?
            .iter()
            .filter_map(|d| ProgressSummary::from_document(d, None, Some(course_id)))
            .collect();
        if summaries.is_empty() {
            summaries = self.legacy_course_summaries(course_id, &enrollments).await;
        }
        let valid: Vec<&ProgressSummary> =
            summaries.iter().filter(|s| s.is_valid()).collect();

        let average_score = if valid.is_empty() {
            0.0
        } else {
            valid.iter().map(|s| s.overall_score).sum::<f64>() / valid.len() as f64
        };
        let average_completion = if summaries.is_empty() {
            0.0
        } else {
            summaries.iter().map(|s| s.completion_rate).sum::<f64>() / summaries.len() as f64
        };

        let active_within = |days: i64| {
            summaries
                .iter()
                .filter(|s| {
                    s.last_accessed
                        .is_some_and(|t| now - t <= Duration::days(days))
                })
                .count()
        };

        Ok(Some(CourseStats {
            course_id: course.id,
            course_name: course.course_name,
            student_count: active_count,
            average_score,
            average_completion,
            module_count: modules?.len(),
            assignment_count: assignments?.len(),
            active_last_7_days: active_within(7),
            active_last_30_days: active_within(30),
        }))
    }

    /// Walks `studentProgress/{studentId}/courses` for each enrolled student
    /// when the flat summary collection has nothing for the course. A failed
    /// student is logged and skipped; the rest still contribute.
    async fn legacy_course_summaries(
        &self,
        course_id: &str,
        enrollments: &[Enrollment],
    ) -> Vec<ProgressSummary> {
        debug!("no flat summaries for {course_id}; walking legacy per-student progress");
        let options = QueryOptions::default();
        let fetches = enrollments.iter().map(|enrollment| {
            let student_id = enrollment.student_id.as_str();
            let options = &options;
            async move {
                let docs = self
                    .store
                    .fetch_subcollection(
                        collections::legacy::STUDENT_PROGRESS,
                        student_id,
                        collections::legacy::COURSES_SUBPATH,
                        options,
                    )
                    .await;
                (student_id, docs)
            }
        });

        let mut summaries = Vec::new();
        for (student_id, result) in join_all(fetches).await {
            match result {
                Ok(docs) => summaries.extend(docs.iter().filter_map(|d| {
                    ProgressSummary::from_document(d, Some(student_id), Some(d.id.as_str()))
                        .filter(|s| s.course_id == course_id)
                })),
                Err(e) => warn!("skipping legacy progress for {student_id}: {e}"),
            }
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::{
        seed_document, seed_subdocument, setup_test_store, CountingStore, FailingStore,
    };
    use serde_json::json;

    fn service(store: Arc<dyn DocumentStore>) -> CourseService {
        CourseService::new(
            store,
            Arc::new(QueryCache::new()),
            Arc::new(Telemetry::new()),
        )
    }

    async fn seed_teacher(store: &db::SqliteStore) {
        seed_document(
            store,
            collections::USERS,
            "u-nadia",
            json!({
                "role": "teacher",
                "firstName": "Nadia",
                "lastName": "Okoye",
                "email": "nadia@school.example",
                "authUid": "auth-nadia",
            }),
        )
        .await;
        seed_document(
            store,
            collections::TEACHERS,
            "t1",
            json!({"userId": "u-nadia"}),
        )
        .await;
    }

    #[tokio::test]
    async fn resolves_email_and_auth_identifiers_to_teacher_id() {
        let store = Arc::new(setup_test_store().await);
        seed_teacher(&store).await;
        let service = service(store);

        for identifier in ["t1", "u-nadia", "nadia@school.example", "auth-nadia"] {
            let resolved = service.resolve_teacher_id(identifier).await.unwrap();
            assert_eq!(resolved.as_deref(), Some("t1"), "identifier {identifier}");
        }

        let unknown = service
            .resolve_teacher_id("nobody@school.example")
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn teacher_courses_prefers_array_schema() {
        let store = Arc::new(setup_test_store().await);
        seed_teacher(&store).await;
        seed_document(
            &store,
            collections::COURSES,
            "c1",
            json!({"courseName": "Algebra II", "teacherIds": ["t1"]}),
        )
        .await;
        // Legacy doc for the same teacher must not be reached while the
        // array query has results.
        seed_document(
            &store,
            collections::COURSES,
            "c2",
            json!({"name": "Old Biology", "teacherId": "t1"}),
        )
        .await;

        let courses = service(store).teacher_courses("t1").await;
        let names: Vec<&str> = courses.iter().map(|c| c.course_name.as_str()).collect();
        assert_eq!(names, vec!["Algebra II"]);
    }

    #[tokio::test]
    async fn teacher_courses_falls_back_to_legacy_schema() {
        let store = Arc::new(setup_test_store().await);
        seed_teacher(&store).await;
        seed_document(
            &store,
            collections::COURSES,
            "c2",
            json!({"name": "Old Biology", "teacherId": "t1"}),
        )
        .await;

        let courses = service(store).teacher_courses("t1").await;
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].course_name, "Old Biology");
        assert_eq!(courses[0].teacher_ids, vec!["t1"]);
    }

    #[tokio::test]
    async fn unknown_email_yields_empty_without_error() {
        let store = Arc::new(setup_test_store().await);
        let telemetry = Arc::new(Telemetry::new());
        let service = CourseService::new(store, Arc::new(QueryCache::new()), telemetry.clone());

        let courses = service.teacher_courses("ghost@school.example").await;
        assert!(courses.is_empty());
        // Not-found is not a degradation.
        assert_eq!(telemetry.degraded_count("teacher_courses"), 0);
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let store = Arc::new(setup_test_store().await);
        seed_teacher(&store).await;
        seed_document(
            &store,
            collections::COURSES,
            "c1",
            json!({"courseName": "Algebra II", "teacherIds": ["t1"]}),
        )
        .await;

        let counting = Arc::new(CountingStore::new(store));
        let service = service(counting.clone());

        let first = service.teacher_courses("t1").await;
        let calls_after_first = counting.call_count();
        assert!(calls_after_first > 0);

        let second = service.teacher_courses("t1").await;
        assert_eq!(first, second);
        assert_eq!(counting.call_count(), calls_after_first);
    }

    #[tokio::test]
    async fn course_stats_aggregates_and_windows() {
        let store = Arc::new(setup_test_store().await);
        seed_document(
            &store,
            collections::COURSES,
            "c1",
            json!({"courseName": "Algebra II", "teacherIds": ["t1"], "studentCount": 99}),
        )
        .await;
        for (id, student, status) in [
            ("e1", "s1", "active"),
            ("e2", "s2", "active"),
            ("e3", "s3", "inactive"),
        ] {
            seed_document(
                &store,
                collections::ENROLLMENTS,
                id,
                json!({"studentId": student, "courseId": "c1", "status": status}),
            )
            .await;
        }
        seed_subdocument(&store, collections::COURSES, "c1", "modules", "m1", json!({"title": "Unit 1", "sequenceNumber": 1})).await;
        seed_subdocument(&store, collections::COURSES, "c1", "assignments", "a1", json!({"title": "Quiz 1", "type": "Quiz"})).await;
        seed_subdocument(&store, collections::COURSES, "c1", "assignments", "a2", json!({"title": "Exam 1", "type": "Exam"})).await;

        let now = Utc::now();
        seed_document(
            &store,
            collections::COURSE_SUMMARIES,
            "s1-c1",
            json!({
                "studentId": "s1", "courseId": "c1",
                "overallScore": 80.0, "completionRate": 90.0,
                "lastAccessed": (now - Duration::days(2)).to_rfc3339(),
            }),
        )
        .await;
        seed_document(
            &store,
            collections::COURSE_SUMMARIES,
            "s2-c1",
            json!({
                "studentId": "s2", "courseId": "c1",
                "overallScore": 0.0, "completionRate": 30.0,
                "lastAccessed": (now - Duration::days(20)).to_rfc3339(),
            }),
        )
        .await;

        let stats = service(store).course_stats("c1").await.unwrap();
        assert_eq!(stats.course_name, "Algebra II");
        // Active enrollments, not the drifted denormalized count.
        assert_eq!(stats.student_count, 2);
        // Zero-score summary is "no activity" and excluded from the score
        // mean, but still carries completion.
        assert_eq!(stats.average_score, 80.0);
        assert_eq!(stats.average_completion, 60.0);
        assert_eq!(stats.module_count, 1);
        assert_eq!(stats.assignment_count, 2);
        assert_eq!(stats.active_last_7_days, 1);
        assert_eq!(stats.active_last_30_days, 2);
    }

    #[tokio::test]
    async fn course_stats_falls_back_to_legacy_progress_tree() {
        let store = Arc::new(setup_test_store().await);
        seed_document(
            &store,
            collections::COURSES,
            "c1",
            json!({"courseName": "History", "teacherIds": ["t1"]}),
        )
        .await;
        seed_document(
            &store,
            collections::ENROLLMENTS,
            "e1",
            json!({"studentId": "s1", "courseId": "c1", "status": "active"}),
        )
        .await;
        // No flat summaries at all; only the legacy per-student tree.
        seed_subdocument(
            &store,
            collections::legacy::STUDENT_PROGRESS,
            "s1",
            collections::legacy::COURSES_SUBPATH,
            "c1",
            json!({
                "averageScore": 72.0,
                "completion": 65.0,
                "lastAccessed": (Utc::now() - Duration::days(2)).to_rfc3339(),
            }),
        )
        .await;

        let stats = service(store).course_stats("c1").await.unwrap();
        assert_eq!(stats.average_score, 72.0);
        assert_eq!(stats.average_completion, 65.0);
        assert_eq!(stats.student_count, 1);
        assert_eq!(stats.active_last_7_days, 1);
        assert_eq!(stats.active_last_30_days, 1);
    }

    #[tokio::test]
    async fn missing_course_is_none_not_error() {
        let store = Arc::new(setup_test_store().await);
        let telemetry = Arc::new(Telemetry::new());
        let service = CourseService::new(store, Arc::new(QueryCache::new()), telemetry.clone());
        assert!(service.course_stats("nope").await.is_none());
        assert_eq!(telemetry.degraded_count("course_stats"), 0);
    }

    #[tokio::test]
    async fn upstream_failure_degrades_and_is_counted() {
        let telemetry = Arc::new(Telemetry::new());
        let service = CourseService::new(
            Arc::new(FailingStore),
            Arc::new(QueryCache::new()),
            telemetry.clone(),
        );

        let courses = service.teacher_courses("t1").await;
        assert!(courses.is_empty());
        assert_eq!(telemetry.degraded_count("teacher_courses"), 1);

        assert!(service.course_stats("c1").await.is_none());
        assert_eq!(telemetry.degraded_count("course_stats"), 1);
    }
}
