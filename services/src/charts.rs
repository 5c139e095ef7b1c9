//! Chart-ready series builders. Pure functions, no I/O.

use serde::{Deserialize, Serialize};

use crate::student_service::StudentSummary;

/// Assumed ceiling for time-spent normalization: 3000 minutes (~50 hours)
/// maps to 100 on a radar axis.
const RADAR_TIME_CEILING_MINUTES: f64 = 3000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeBucket {
    pub label: &'static str,
    pub count: usize,
    /// Rounded share of all scores, 0-100.
    pub percentage: u32,
}

/// Buckets scores into the fixed grade bands. Empty input yields all-zero
/// buckets rather than an empty series so charts keep their axes.
pub fn grade_distribution(scores: &[f64]) -> Vec<GradeBucket> {
    let bands: [(&'static str, fn(f64) -> bool); 5] = [
        ("90+", |s| s >= 90.0),
        ("80-89", |s| (80.0..90.0).contains(&s)),
        ("70-79", |s| (70.0..80.0).contains(&s)),
        ("60-69", |s| (60.0..70.0).contains(&s)),
        ("Below 60", |s| s < 60.0),
    ];

    let total = scores.len();
    bands
        .iter()
        .map(|(label, band)| {
            let count = scores.iter().filter(|s| band(**s)).count();
            let percentage = if total == 0 {
                0
            } else {
                (count as f64 / total as f64 * 100.0).round() as u32
            };
            GradeBucket {
                label,
                count,
                percentage,
            }
        })
        .collect()
}

/// Metrics normalized to a common 0-100 scale for a radar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarMetrics {
    pub score: f64,
    pub completion: f64,
    pub submission: f64,
    pub time_spent: f64,
}

pub fn radar_metrics(
    average_score: f64,
    completion_rate: f64,
    submission_rate: Option<f64>,
    time_spent_minutes: f64,
) -> RadarMetrics {
    RadarMetrics {
        score: average_score.clamp(0.0, 100.0),
        completion: completion_rate.clamp(0.0, 100.0),
        submission: submission_rate.unwrap_or(0.0).clamp(0.0, 100.0),
        time_spent: (time_spent_minutes / RADAR_TIME_CEILING_MINUTES * 100.0).clamp(0.0, 100.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAverage {
    pub average_score: f64,
    pub average_completion: f64,
    /// How many students actually contributed; zero-score students count as
    /// "no data", not as a scored zero.
    pub students_with_data: usize,
}

pub fn class_average(students: &[StudentSummary]) -> ClassAverage {
    let with_data: Vec<&StudentSummary> = students
        .iter()
        .filter(|s| s.average_score > 0.0)
        .collect();

    if with_data.is_empty() {
        return ClassAverage {
            average_score: 0.0,
            average_completion: 0.0,
            students_with_data: 0,
        };
    }

    let n = with_data.len() as f64;
    ClassAverage {
        average_score: with_data.iter().map(|s| s.average_score).sum::<f64>() / n,
        average_completion: with_data.iter().map(|s| s.completion_rate).sum::<f64>() / n,
        students_with_data: with_data.len(),
    }
}
