use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum AssignmentType {
    Quiz,
    Exam,
    Project,
    Participation,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub kind: AssignmentType,
    pub due_date: Option<DateTime<Utc>>,
    pub assign_date: Option<DateTime<Utc>>,
    pub max_score: f64,
    pub weight: f64,
}

impl Assignment {
    /// Decodes an `assignments` sub-collection document. Unknown type
    /// strings decode as `Other` rather than dropping the assignment.
    pub fn from_document(course_id: &str, doc: &Document) -> Option<Self> {
        let kind = doc
            .str_field("type")
            .and_then(|raw| AssignmentType::from_str(raw).ok())
            .unwrap_or(AssignmentType::Other);
        Some(Self {
            id: doc.id.clone(),
            course_id: course_id.to_string(),
            title: doc
                .str_field("title")
                .or_else(|| doc.str_field("name"))?
                .to_string(),
            kind,
            due_date: doc.timestamp_field("dueDate"),
            assign_date: doc.timestamp_field("assignDate"),
            max_score: doc.f64_field("maxScore").unwrap_or(100.0),
            weight: doc.f64_field("weight").unwrap_or(1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_decodes_as_other() {
        let doc = Document::new("a1", json!({"title": "Essay", "type": "Homework"}));
        let assignment = Assignment::from_document("c1", &doc).unwrap();
        assert_eq!(assignment.kind, AssignmentType::Other);
        assert_eq!(assignment.max_score, 100.0);
    }

    #[test]
    fn decodes_dates_from_any_timestamp_shape() {
        let doc = Document::new(
            "a1",
            json!({
                "title": "Quiz 1",
                "type": "Quiz",
                "dueDate": "2026-04-01T00:00:00Z",
                "assignDate": {"seconds": 1_774_915_200, "nanoseconds": 0},
            }),
        );
        let assignment = Assignment::from_document("c1", &doc).unwrap();
        assert_eq!(assignment.kind, AssignmentType::Quiz);
        assert!(assignment.due_date.is_some());
        assert!(assignment.assign_date.is_some());
    }
}
