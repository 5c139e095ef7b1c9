//! Student-facing aggregation: rosters, assignment tables, module progress.
//!
//! The roster join is the widest fetch in the system: courses, enrollments,
//! users and progress summaries fanned out concurrently, with id batches
//! isolated so one failed batch degrades to a smaller roster instead of an
//! empty one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::Display;

use db::collections;
use db::filters::{FieldFilter, QueryOptions};
use db::models::{
    Assignment, AssignmentProgress, AssignmentType, CourseModule, Enrollment,
    ModuleProgressRecord, ProgressSummary, User,
};
use db::{Document, DocumentStore};

use crate::cache::{CacheClass, QueryCache};
use crate::course_service::CourseService;
use crate::error::ServiceError;
use crate::predictions::{apply_predictions, PredictionError, PredictionSource};
use crate::risk::{score_risk, RiskAssessment, RiskMetrics};
use crate::telemetry::Telemetry;

/// Maximum ids per membership (`in`) query; the backend's limit.
const ID_BATCH: usize = 10;

/// One roster row: a student with metrics folded across every course they
/// share with the teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    pub full_name: String,
    pub email: String,
    pub course_count: usize,
    pub average_score: f64,
    pub completion_rate: f64,
    pub submission_rate: Option<f64>,
    pub total_time_spent_minutes: f64,
    pub last_accessed: Option<DateTime<Utc>>,
    pub risk: RiskAssessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssignmentStatus {
    Completed,
    Overdue,
    Future,
    Pending,
}

/// One row of a student's assignment table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignmentRow {
    pub assignment_id: String,
    pub course_id: String,
    pub title: String,
    pub kind: AssignmentType,
    pub due_date: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub max_score: f64,
    pub status: AssignmentStatus,
    pub is_late: bool,
}

/// One module of a course with the student's progress joined in; students
/// with no record on a module get the zeroed defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleProgressRow {
    pub module_id: String,
    pub title: String,
    pub sequence_number: i64,
    pub is_required: bool,
    pub completion_percent: f64,
    pub time_spent_minutes: f64,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Outcome of merging external predictions into a roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum PredictionStatus {
    /// Predictions merged; `file_id` names the artifact version applied.
    Applied { file_id: String },
    /// The pipeline has produced nothing yet; the UI offers to generate.
    NotGenerated,
    /// The prediction service failed; rule-based values stand.
    Unavailable,
}

pub struct StudentService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<QueryCache>,
    telemetry: Arc<Telemetry>,
    course_service: CourseService,
    ttl: Duration,
}

impl StudentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<QueryCache>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        let course_service =
            CourseService::new(store.clone(), cache.clone(), telemetry.clone());
        Self {
            store,
            cache,
            telemetry,
            course_service,
            ttl: QueryCache::default_ttl(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.course_service = self.course_service.with_ttl(ttl);
        self.ttl = ttl;
        self
    }

    pub fn course_service(&self) -> &CourseService {
        &self.course_service
    }

    /// Every student enrolled in any of the teacher's courses, each exactly
    /// once. Contained failures degrade to `[]`.
    pub async fn students_by_teacher(&self, identifier: &str) -> Vec<StudentSummary> {
        let key = format!("teacher-{identifier}");
        if let Some(cached) = self
            .cache
            .get::<Vec<StudentSummary>>(CacheClass::StudentsByTeacher, &key)
        {
            return cached;
        }

        match self.students_by_teacher_inner(identifier).await {
            Ok(students) => {
                self.cache
                    .set(CacheClass::StudentsByTeacher, &key, &students, self.ttl);
                students
            }
            Err(e) => {
                self.telemetry.record_degraded("students_by_teacher", &e);
                Vec::new()
            }
        }
    }

    async fn students_by_teacher_inner(
        &self,
        identifier: &str,
    ) -> Result<Vec<StudentSummary>, ServiceError> {
        let courses = self.course_service.teacher_courses(identifier).await;
        if courses.is_empty() {
            return Ok(Vec::new());
        }
        let course_ids: Vec<String> = courses.iter().map(|c| c.id.clone()).collect();

        // Unique active student ids across every course, insertion-ordered so
        // roster order is stable across refreshes.
        let mut student_ids: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for enrollment in self
            .fetch_enrollments_for_courses(&course_ids)
            .await
            .iter()
            .filter_map(Enrollment::from_document)
            .filter(Enrollment::is_active)
        {
            if seen.insert(enrollment.student_id.clone()) {
                student_ids.push(enrollment.student_id);
            }
        }
        if student_ids.is_empty() {
            return Ok(Vec::new());
        }

        let (users, summaries) = tokio::join!(
            self.fetch_users_batched(&student_ids),
            self.fetch_summaries(&student_ids, &course_ids),
        );

        let mut by_student: HashMap<&str, Vec<&ProgressSummary>> = HashMap::new();
        for summary in &summaries {
            by_student
                .entry(summary.student_id.as_str())
                .or_default()
                .push(summary);
        }

        let now = Utc::now();
        let students = student_ids
            .iter()
            .filter_map(|id| {
                let user = users.get(id)?;
                let student_summaries =
                    by_student.get(id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                Some(fold_student(user, student_summaries, now))
            })
            .collect();
        Ok(students)
    }

    /// Active enrollments for a set of course ids, chunked to the membership
    /// query limit. A failed chunk is logged and skipped; the students of the
    /// remaining chunks still make the roster.
    async fn fetch_enrollments_for_courses(&self, course_ids: &[String]) -> Vec<Document> {
        let fetches = course_ids.chunks(ID_BATCH).map(|chunk| {
            let options = QueryOptions::filtered(vec![FieldFilter::any_of(
                "courseId",
                chunk.iter().map(|id| id.as_str().into()).collect(),
            )]);
            async move {
                self.store
                    .fetch_documents(collections::ENROLLMENTS, &options)
                    .await
            }
        });

        let mut documents = Vec::new();
        for result in join_all(fetches).await {
            match result {
                Ok(mut docs) => documents.append(&mut docs),
                Err(e) => warn!("skipping failed enrollment batch: {e}"),
            }
        }
        documents
    }

    /// Batched user lookup with the same per-batch isolation.
    async fn fetch_users_batched(&self, student_ids: &[String]) -> HashMap<String, User> {
        let fetches = student_ids.chunks(ID_BATCH).map(|chunk| async move {
            self.store
                .fetch_documents_by_ids(collections::USERS, chunk)
                .await
        });

        let mut users = HashMap::new();
        for result in join_all(fetches).await {
            match result {
                Ok(docs) => {
                    for doc in &docs {
                        match User::from_document(doc) {
                            Some(user) => {
                                users.insert(user.id.clone(), user);
                            }
                            None => warn!("undecodable user document {}", doc.id),
                        }
                    }
                }
                Err(e) => warn!("skipping failed user batch: {e}"),
            }
        }
        users
    }

    /// Progress summaries for the roster, restricted to the teacher's
    /// courses. The flat collection is queried first; only when it yields
    /// nothing at all does the legacy per-student subcollection get walked.
    async fn fetch_summaries(
        &self,
        student_ids: &[String],
        course_ids: &[String],
    ) -> Vec<ProgressSummary> {
        let fetches = student_ids.chunks(ID_BATCH).map(|chunk| {
            let options = QueryOptions::filtered(vec![FieldFilter::any_of(
                "studentId",
                chunk.iter().map(|id| id.as_str().into()).collect(),
            )]);
            async move {
                self.store
                    .fetch_documents(collections::COURSE_SUMMARIES, &options)
                    .await
            }
        });

        let course_set: HashSet<&str> = course_ids.iter().map(String::as_str).collect();
        let mut summaries = Vec::new();
        for result in join_all(fetches).await {
            match result {
                Ok(docs) => summaries.extend(
                    docs.iter()
                        .filter_map(|d| ProgressSummary::from_document(d, None, None))
                        .filter(|s| course_set.contains(s.course_id.as_str())),
                ),
                Err(e) => warn!("skipping failed summary batch: {e}"),
            }
        }
        if !summaries.is_empty() {
            return summaries;
        }

        debug!("no flat summaries; walking legacy per-student progress");
        let fetches = student_ids.iter().map(|student_id| async move {
            let docs = self
                .store
                .fetch_subcollection(
                    collections::legacy::STUDENT_PROGRESS,
                    student_id,
                    collections::legacy::COURSES_SUBPATH,
                    &QueryOptions::default(),
                )
                .await;
            (student_id, docs)
        });

        for (student_id, result) in join_all(fetches).await {
            match result {
                Ok(docs) => summaries.extend(docs.iter().filter_map(|d| {
                    ProgressSummary::from_document(d, Some(student_id.as_str()), Some(d.id.as_str()))
                        .filter(|s| course_set.contains(s.course_id.as_str()))
                })),
                Err(e) => warn!("skipping legacy progress for {student_id}: {e}"),
            }
        }
        summaries
    }

    /// The student's assignment table across their active courses, sorted by
    /// due date with undated assignments last.
    pub async fn student_assignments(&self, student_id: &str) -> Vec<StudentAssignmentRow> {
        if let Some(cached) = self
            .cache
            .get::<Vec<StudentAssignmentRow>>(CacheClass::StudentAssignments, student_id)
        {
            return cached;
        }

        match self.student_assignments_inner(student_id, Utc::now()).await {
            Ok(rows) => {
                self.cache
                    .set(CacheClass::StudentAssignments, student_id, &rows, self.ttl);
                rows
            }
            Err(e) => {
                self.telemetry.record_degraded("student_assignments", &e);
                Vec::new()
            }
        }
    }

    async fn student_assignments_inner(
        &self,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<StudentAssignmentRow>, ServiceError> {
        let enrollment_options =
            QueryOptions::filtered(vec![FieldFilter::eq("studentId", student_id)]);
        let course_ids: Vec<String> = self
            .store
            .fetch_documents(collections::ENROLLMENTS, &enrollment_options)
            .await?
            .iter()
            .filter_map(Enrollment::from_document)
            .filter(Enrollment::is_active)
            .map(|e| e.course_id)
            .collect();
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let assignment_fetches = course_ids.iter().map(|course_id| async move {
            let docs = self
                .store
                .fetch_subcollection(
                    collections::COURSES,
                    course_id,
                    collections::ASSIGNMENTS_SUBPATH,
                    &QueryOptions::default(),
                )
                .await;
            (course_id.as_str(), docs)
        });
        let (assignment_results, progress) = tokio::join!(
            join_all(assignment_fetches),
            self.fetch_assignment_progress(student_id),
        );

        let progress = progress?;
        let mut rows = Vec::new();
        for (course_id, result) in assignment_results {
            for assignment in result?
                .iter()
                .filter_map(|d| Assignment::from_document(course_id, d))
            {
                let record = progress.get(&assignment.id);
                rows.push(build_assignment_row(assignment, record, now));
            }
        }

        rows.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.title.cmp(&b.title),
        });
        Ok(rows)
    }

    async fn fetch_assignment_progress(
        &self,
        student_id: &str,
    ) -> Result<HashMap<String, AssignmentProgress>, ServiceError> {
        let options = QueryOptions::filtered(vec![FieldFilter::eq("studentId", student_id)]);
        let mut docs = self
            .store
            .fetch_documents(collections::STUDENT_ASSIGNMENTS, &options)
            .await?;
        if docs.is_empty() {
            docs = self
                .store
                .fetch_subcollection(
                    collections::legacy::STUDENT_PROGRESS,
                    student_id,
                    collections::legacy::ASSIGNMENTS_SUBPATH,
                    &QueryOptions::default(),
                )
                .await?;
        }
        Ok(docs
            .iter()
            .filter_map(AssignmentProgress::from_document)
            .map(|p| (p.assignment_id.clone(), p))
            .collect())
    }

    /// Per-module progress for one student in one course, every course
    /// module present, ordered by sequence number.
    pub async fn module_progress(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Vec<ModuleProgressRow> {
        let key = format!("{student_id}-{course_id}");
        if let Some(cached) = self
            .cache
            .get::<Vec<ModuleProgressRow>>(CacheClass::ModuleProgress, &key)
        {
            return cached;
        }

        match self.module_progress_inner(student_id, course_id).await {
            Ok(rows) => {
                self.cache
                    .set(CacheClass::ModuleProgress, &key, &rows, self.ttl);
                rows
            }
            Err(e) => {
                self.telemetry.record_degraded("module_progress", &e);
                Vec::new()
            }
        }
    }

    async fn module_progress_inner(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Vec<ModuleProgressRow>, ServiceError> {
        let module_options = QueryOptions::default();
        let record_options = QueryOptions::filtered(vec![
            FieldFilter::eq("studentId", student_id),
            FieldFilter::eq("courseId", course_id),
        ]);
        let (modules, records) = tokio::join!(
            self.store.fetch_subcollection(
                collections::COURSES,
                course_id,
                collections::MODULES_SUBPATH,
                &module_options,
            ),
            self.store
                .fetch_documents(collections::STUDENT_MODULES, &record_options),
        );

        let records: HashMap<String, ModuleProgressRecord> = records?
            .iter()
            .filter_map(ModuleProgressRecord::from_document)
            .map(|r| (r.module_id.clone(), r))
            .collect();

        let mut rows: Vec<ModuleProgressRow> = modules?
            .iter()
            .filter_map(|d| CourseModule::from_document(course_id, d))
            .map(|module| {
                let record = records.get(&module.id);
                ModuleProgressRow {
                    module_id: module.id,
                    title: module.title,
                    sequence_number: module.sequence_number,
                    is_required: module.is_required,
                    completion_percent: record.map(|r| r.completion_percent).unwrap_or(0.0),
                    time_spent_minutes: record.map(|r| r.time_spent_minutes).unwrap_or(0.0),
                    last_accessed: record.and_then(|r| r.last_accessed),
                }
            })
            .collect();
        rows.sort_by_key(|r| r.sequence_number);
        Ok(rows)
    }

    /// Roster with external predictions merged over the rule-based risk
    /// where the artifact has a row for the student.
    pub async fn students_with_predictions(
        &self,
        identifier: &str,
        source: &dyn PredictionSource,
    ) -> (Vec<StudentSummary>, PredictionStatus) {
        let mut students = self.students_by_teacher(identifier).await;

        let teacher_id = match self.course_service.resolve_teacher_id(identifier).await {
            Ok(Some(id)) => id,
            Ok(None) => identifier.to_string(),
            Err(e) => {
                self.telemetry.record_degraded("students_with_predictions", &e);
                return (students, PredictionStatus::Unavailable);
            }
        };

        match source.latest_for_teacher(&teacher_id).await {
            Ok(batch) => {
                apply_predictions(&mut students, &batch);
                (
                    students,
                    PredictionStatus::Applied {
                        file_id: batch.file_id,
                    },
                )
            }
            Err(PredictionError::NotGenerated) => (students, PredictionStatus::NotGenerated),
            Err(e @ PredictionError::Upstream(_)) => {
                self.telemetry.record_degraded("students_with_predictions", &e);
                (students, PredictionStatus::Unavailable)
            }
        }
    }
}

/// Folds a student's per-course summaries into one roster row. Score and
/// completion means skip zero-score ("no activity") summaries;
/// `last_accessed` is the most recent across courses.
fn fold_student(user: &User, summaries: &[&ProgressSummary], now: DateTime<Utc>) -> StudentSummary {
    let valid: Vec<&&ProgressSummary> = summaries.iter().filter(|s| s.is_valid()).collect();
    let (average_score, completion_rate) = if valid.is_empty() {
        (0.0, 0.0)
    } else {
        let n = valid.len() as f64;
        (
            valid.iter().map(|s| s.overall_score).sum::<f64>() / n,
            valid.iter().map(|s| s.completion_rate).sum::<f64>() / n,
        )
    };

    let rates: Vec<f64> = summaries.iter().filter_map(|s| s.submission_rate).collect();
    let submission_rate = if rates.is_empty() {
        None
    } else {
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    };

    let last_accessed = summaries.iter().filter_map(|s| s.last_accessed).max();

    let risk = score_risk(
        &RiskMetrics {
            average_score,
            completion_rate,
            late_submissions: 0,
            missing_assignments: None,
            days_since_last_access: last_accessed.map(|t| (now - t).num_days()),
            submission_rate,
        },
        true,
    );

    StudentSummary {
        student_id: user.id.clone(),
        full_name: user.full_name(),
        email: user.email.clone(),
        course_count: summaries.len(),
        average_score,
        completion_rate,
        submission_rate,
        total_time_spent_minutes: summaries.iter().map(|s| s.total_time_spent_minutes).sum(),
        last_accessed,
        risk,
    }
}

fn build_assignment_row(
    assignment: Assignment,
    progress: Option<&AssignmentProgress>,
    now: DateTime<Utc>,
) -> StudentAssignmentRow {
    let submitted_at = progress.and_then(|p| p.submitted_at);
    let status = if submitted_at.is_some() {
        AssignmentStatus::Completed
    } else if assignment.due_date.is_some_and(|due| due < now) {
        AssignmentStatus::Overdue
    } else if assignment.assign_date.is_some_and(|at| at > now) {
        AssignmentStatus::Future
    } else {
        AssignmentStatus::Pending
    };
    let is_late = match (submitted_at, assignment.due_date) {
        (Some(submitted), Some(due)) => submitted > due,
        _ => false,
    };

    StudentAssignmentRow {
        assignment_id: assignment.id,
        course_id: assignment.course_id,
        title: assignment.title,
        kind: assignment.kind,
        due_date: assignment.due_date,
        submitted_at,
        score: progress.and_then(|p| p.score),
        max_score: assignment.max_score,
        status,
        is_late,
    }
}
