use serde::{Deserialize, Serialize};

use crate::store::Document;

/// A content module within a course. Ordered by `sequence_number`, which is
/// unique per course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub sequence_number: i64,
    pub is_required: bool,
}

impl CourseModule {
    pub fn from_document(course_id: &str, doc: &Document) -> Option<Self> {
        Some(Self {
            id: doc.id.clone(),
            course_id: course_id.to_string(),
            title: doc.str_field("title")?.to_string(),
            sequence_number: doc
                .i64_field("sequenceNumber")
                .or_else(|| doc.i64_field("order"))
                .unwrap_or(0),
            is_required: doc.bool_field("isRequired").unwrap_or(false),
        })
    }
}
