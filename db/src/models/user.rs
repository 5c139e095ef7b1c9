use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::store::Document;

/// Role of a user account. Created by the external auth/admin flow;
/// read-only to this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub school_id: Option<String>,
}

impl User {
    /// Decodes a `users` document. Returns `None` when the role field is
    /// missing or unrecognized; such accounts cannot be placed anywhere in
    /// a dashboard.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let role = Role::from_str(doc.str_field("role")?).ok()?;
        Some(Self {
            id: doc.id.clone(),
            role,
            first_name: doc.str_field("firstName").unwrap_or_default().to_string(),
            last_name: doc.str_field("lastName").unwrap_or_default().to_string(),
            email: doc.str_field("email").unwrap_or_default().to_string(),
            school_id: doc.str_field("schoolId").map(str::to_string),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_a_complete_user() {
        let doc = Document::new(
            "u1",
            json!({
                "role": "teacher",
                "firstName": "Nadia",
                "lastName": "Okoye",
                "email": "nadia@school.example",
                "schoolId": "sch-1",
            }),
        );
        let user = User::from_document(&doc).unwrap();
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.full_name(), "Nadia Okoye");
        assert_eq!(user.school_id.as_deref(), Some("sch-1"));
    }

    #[test]
    fn rejects_unknown_roles() {
        let doc = Document::new("u1", json!({"role": "superuser"}));
        assert!(User::from_document(&doc).is_none());
        let doc = Document::new("u1", json!({"email": "x@y.z"}));
        assert!(User::from_document(&doc).is_none());
    }
}
