//! Externally computed risk predictions.
//!
//! An ML pipeline periodically publishes a per-student risk table through a
//! side API; this module models that artifact and its precedence over the
//! rule-based scorer. The artifact's storage format (CSV) and the pipeline
//! itself stay out of scope.
//!
//! "Nothing generated yet" is a distinguishable, actionable state: the UI
//! routes it to a "generate predictions" affordance, not an error banner.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::risk::{RiskAssessment, RiskLevel};
use crate::student_service::StudentSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub student_id: String,
    pub score: i64,
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub confidence: f64,
    /// Identifier/version of the prediction file this row came from.
    pub file_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionBatch {
    pub file_id: String,
    pub generated_at: Option<DateTime<Utc>>,
    pub by_student: HashMap<String, RiskPrediction>,
}

#[derive(Error, Debug)]
pub enum PredictionError {
    /// The pipeline has not produced an artifact yet.
    #[error("no predictions generated yet")]
    NotGenerated,

    #[error("prediction service error: {0}")]
    Upstream(String),
}

/// Maps an upstream failure message onto the error taxonomy. The side API
/// distinguishes "nothing generated yet" only by message content.
pub fn classify_upstream_message(message: &str) -> PredictionError {
    let lowered = message.to_lowercase();
    if lowered.contains("no predictions") || lowered.contains("not found") {
        PredictionError::NotGenerated
    } else {
        PredictionError::Upstream(message.to_string())
    }
}

/// Seam to whatever serves the prediction artifact.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    async fn latest_for_teacher(&self, teacher_id: &str)
        -> Result<PredictionBatch, PredictionError>;
}

/// Overwrites rule-based risk with the external prediction wherever one
/// exists; students without a prediction keep their rule-based assessment.
pub fn apply_predictions(students: &mut [StudentSummary], batch: &PredictionBatch) {
    for student in students.iter_mut() {
        if let Some(prediction) = batch.by_student.get(&student.student_id) {
            student.risk = RiskAssessment {
                score: prediction.score,
                level: prediction.level,
                factors: prediction.factors.clone(),
                is_at_risk: prediction.level != RiskLevel::Low,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{score_risk, RiskMetrics};

    fn summary(id: &str, average_score: f64) -> StudentSummary {
        StudentSummary {
            student_id: id.to_string(),
            full_name: id.to_string(),
            email: format!("{id}@school.example"),
            course_count: 1,
            average_score,
            completion_rate: 80.0,
            submission_rate: None,
            total_time_spent_minutes: 0.0,
            last_accessed: None,
            risk: score_risk(
                &RiskMetrics {
                    average_score,
                    completion_rate: 80.0,
                    ..Default::default()
                },
                true,
            ),
        }
    }

    #[test]
    fn missing_artifact_is_distinguished_by_message() {
        assert!(matches!(
            classify_upstream_message("No predictions found for this class"),
            PredictionError::NotGenerated
        ));
        assert!(matches!(
            classify_upstream_message("connection reset by peer"),
            PredictionError::Upstream(_)
        ));
    }

    #[test]
    fn predictions_take_precedence_only_where_present() {
        let mut students = vec![summary("s1", 55.0), summary("s2", 55.0)];
        let rule_based = students[1].risk.clone();

        let mut by_student = HashMap::new();
        by_student.insert(
            "s1".to_string(),
            RiskPrediction {
                student_id: "s1".to_string(),
                score: 91,
                level: RiskLevel::High,
                factors: vec!["Model: declining trend".to_string()],
                confidence: 0.87,
                file_id: "pred-2026-03".to_string(),
            },
        );
        let batch = PredictionBatch {
            file_id: "pred-2026-03".to_string(),
            generated_at: None,
            by_student,
        };

        apply_predictions(&mut students, &batch);

        assert_eq!(students[0].risk.score, 91);
        assert_eq!(students[0].risk.level, RiskLevel::High);
        assert!(students[0].risk.is_at_risk);
        assert_eq!(students[1].risk, rule_based);
    }
}
