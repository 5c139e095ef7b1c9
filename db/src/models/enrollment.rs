use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EnrollmentStatus {
    Active,
    Inactive,
}

/// Join entity between students and courses; the sole source of truth for
/// membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
    pub status: EnrollmentStatus,
}

impl Enrollment {
    /// Decodes an `enrollments` document. The oldest generation predates the
    /// status field; those records are all active memberships.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let status = match doc.str_field("status") {
            Some(raw) => EnrollmentStatus::from_str(raw).ok()?,
            None => EnrollmentStatus::Active,
        };
        Some(Self {
            student_id: doc.str_field("studentId")?.to_string(),
            course_id: doc.str_field("courseId")?.to_string(),
            status,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_status_decodes_as_active() {
        let doc = Document::new("e1", json!({"studentId": "s1", "courseId": "c1"}));
        let enrollment = Enrollment::from_document(&doc).unwrap();
        assert!(enrollment.is_active());
    }

    #[test]
    fn explicit_status_is_kept() {
        let doc = Document::new(
            "e1",
            json!({"studentId": "s1", "courseId": "c1", "status": "inactive"}),
        );
        assert!(!Enrollment::from_document(&doc).unwrap().is_active());
    }

    #[test]
    fn unusable_without_both_ids() {
        let doc = Document::new("e1", json!({"studentId": "s1"}));
        assert!(Enrollment::from_document(&doc).is_none());
    }
}
