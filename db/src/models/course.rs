use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub course_name: String,
    pub teacher_ids: Vec<String>,
    /// Denormalized display count. May drift from the enrollments
    /// collection; never used for joins.
    pub student_count: i64,
}

impl Course {
    /// Decodes a `courses` document.
    ///
    /// Two schema generations: current documents carry a `teacherIds` array
    /// and `courseName`; legacy ones a scalar `teacherId` and `name`.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let course_name = doc
            .str_field("courseName")
            .or_else(|| doc.str_field("name"))?
            .to_string();

        let teacher_ids = match doc.field("teacherIds") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => doc
                .str_field("teacherId")
                .map(|id| vec![id.to_string()])
                .unwrap_or_default(),
        };

        Some(Self {
            id: doc.id.clone(),
            course_name,
            teacher_ids,
            student_count: doc.i64_field("studentCount").unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_current_generation() {
        let doc = Document::new(
            "c1",
            json!({"courseName": "Algebra II", "teacherIds": ["t1", "t2"], "studentCount": 28}),
        );
        let course = Course::from_document(&doc).unwrap();
        assert_eq!(course.course_name, "Algebra II");
        assert_eq!(course.teacher_ids, vec!["t1", "t2"]);
        assert_eq!(course.student_count, 28);
    }

    #[test]
    fn falls_back_to_legacy_fields() {
        let doc = Document::new("c1", json!({"name": "Biology", "teacherId": "t1"}));
        let course = Course::from_document(&doc).unwrap();
        assert_eq!(course.course_name, "Biology");
        assert_eq!(course.teacher_ids, vec!["t1"]);
        assert_eq!(course.student_count, 0);
    }
}
