//! Rule-based risk scoring.
//!
//! Fallback path only: when the external ML pipeline has produced a
//! prediction for a student, that value takes precedence (see
//! [`crate::predictions`]) and this scorer is not consulted for them.
//!
//! The point values and factor strings are load-bearing; reports and tests
//! depend on them exactly.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Metrics bag fed to the scorer. Optional fields are "not yet available"
/// markers: a metric with no real data source contributes no points rather
/// than a fabricated value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub average_score: f64,
    pub completion_rate: f64,
    pub late_submissions: i64,
    pub missing_assignments: Option<i64>,
    pub days_since_last_access: Option<i64>,
    pub submission_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: i64,
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub is_at_risk: bool,
}

/// Additive point model over the metrics bag. Student-level rows (missing
/// assignments, access recency, submission rate) only apply when
/// `student_level` is set and the metric is present.
pub fn score_risk(metrics: &RiskMetrics, student_level: bool) -> RiskAssessment {
    let mut score = 0;
    let mut factors = Vec::new();

    if metrics.average_score < 60.0 {
        score += 30;
        factors.push("Failing average score".to_string());
    } else if metrics.average_score < 70.0 {
        score += 20;
        factors.push("Below average score".to_string());
    }

    if metrics.completion_rate < 40.0 {
        score += 30;
        factors.push("Very low completion rate".to_string());
    } else if metrics.completion_rate < 60.0 {
        score += 15;
        factors.push("Below average completion rate".to_string());
    }

    if metrics.late_submissions > 2 {
        score += 15;
        factors.push("Multiple late submissions".to_string());
    }

    if student_level {
        if let Some(missing) = metrics.missing_assignments {
            if missing > 5 {
                score += 25;
                factors.push("Multiple missing assignments".to_string());
            } else if missing > 2 {
                score += 10;
                factors.push("Several missing assignments".to_string());
            }
        }

        if let Some(days) = metrics.days_since_last_access {
            if days > 21 {
                score += 25;
                factors.push("No course access in over 3 weeks".to_string());
            } else if days > 14 {
                score += 15;
                factors.push("No course access in over 2 weeks".to_string());
            } else if days > 7 {
                score += 5;
                factors.push("No course access in over a week".to_string());
            }
        }

        if let Some(rate) = metrics.submission_rate {
            if rate < 50.0 {
                score += 15;
                factors.push("Low assignment submission rate".to_string());
            }
        }
    }

    let level = if score >= 50 {
        RiskLevel::High
    } else if score >= 25 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskAssessment {
        score,
        level,
        factors,
        is_at_risk: level != RiskLevel::Low,
    }
}
