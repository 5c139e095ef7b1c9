use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Document;

/// Per-student-per-course rollup, maintained by the external progress
/// pipeline. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub student_id: String,
    pub course_id: String,
    pub overall_score: f64,
    pub completion_rate: f64,
    pub submission_rate: Option<f64>,
    pub total_time_spent_minutes: f64,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl ProgressSummary {
    /// Decodes a `studentCourseSummaries` document, or a legacy
    /// `studentProgress/{studentId}/courses/{courseId}` document when the
    /// ids are supplied by the caller.
    ///
    /// Score fallback chain across generations:
    /// `overallScore` → `averageScore` → `grade`; completion:
    /// `completionRate` → `completion`.
    pub fn from_document(
        doc: &Document,
        student_id: Option<&str>,
        course_id: Option<&str>,
    ) -> Option<Self> {
        let student_id = doc
            .str_field("studentId")
            .map(str::to_string)
            .or_else(|| student_id.map(str::to_string))?;
        let course_id = doc
            .str_field("courseId")
            .map(str::to_string)
            .or_else(|| course_id.map(str::to_string))?;

        let overall_score = doc
            .f64_field("overallScore")
            .or_else(|| doc.f64_field("averageScore"))
            .or_else(|| doc.f64_field("grade"))
            .unwrap_or(0.0);
        let completion_rate = doc
            .f64_field("completionRate")
            .or_else(|| doc.f64_field("completion"))
            .unwrap_or(0.0);

        Some(Self {
            student_id,
            course_id,
            overall_score,
            completion_rate,
            submission_rate: doc.f64_field("submissionRate"),
            total_time_spent_minutes: doc.f64_field("totalTimeSpentMinutes").unwrap_or(0.0),
            last_accessed: doc.timestamp_field("lastAccessed"),
        })
    }

    /// A zero overall score means "no meaningful activity", an explicit
    /// business rule, not a data error.
    pub fn is_valid(&self) -> bool {
        self.overall_score > 0.0
    }
}

/// Per-assignment progress for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentProgress {
    pub assignment_id: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
}

impl AssignmentProgress {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let assignment_id = doc
            .str_field("assignmentId")
            .map(str::to_string)
            .unwrap_or_else(|| doc.id.clone());
        Some(Self {
            assignment_id,
            submitted_at: doc
                .timestamp_field("submittedAt")
                .or_else(|| doc.timestamp_field("submissionDate")),
            score: doc.f64_field("score"),
        })
    }
}

/// Per-module progress for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProgressRecord {
    pub module_id: String,
    pub completion_percent: f64,
    pub time_spent_minutes: f64,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl ModuleProgressRecord {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let module_id = doc
            .str_field("moduleId")
            .map(str::to_string)
            .unwrap_or_else(|| doc.id.clone());
        Some(Self {
            module_id,
            completion_percent: doc
                .f64_field("completionPercent")
                .or_else(|| doc.f64_field("completion"))
                .unwrap_or(0.0),
            time_spent_minutes: doc.f64_field("timeSpentMinutes").unwrap_or(0.0),
            last_accessed: doc.timestamp_field("lastAccessed"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_fallback_chain_is_ordered() {
        let doc = Document::new(
            "p1",
            json!({"studentId": "s1", "courseId": "c1", "overallScore": 70.0, "grade": 40.0}),
        );
        let summary = ProgressSummary::from_document(&doc, None, None).unwrap();
        assert_eq!(summary.overall_score, 70.0);

        let doc = Document::new("p1", json!({"studentId": "s1", "courseId": "c1", "grade": 40.0}));
        let summary = ProgressSummary::from_document(&doc, None, None).unwrap();
        assert_eq!(summary.overall_score, 40.0);
    }

    #[test]
    fn legacy_subcollection_docs_take_ids_from_path() {
        let doc = Document::new("c1", json!({"overallScore": 55.0, "completion": 80.0}));
        let summary = ProgressSummary::from_document(&doc, Some("s1"), Some("c1")).unwrap();
        assert_eq!(summary.student_id, "s1");
        assert_eq!(summary.course_id, "c1");
        assert_eq!(summary.completion_rate, 80.0);
    }

    #[test]
    fn zero_score_is_not_valid_activity() {
        let doc = Document::new("p1", json!({"studentId": "s1", "courseId": "c1"}));
        let summary = ProgressSummary::from_document(&doc, None, None).unwrap();
        assert!(!summary.is_valid());
    }
}
