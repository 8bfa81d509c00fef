use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{DomainError, Fields};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Landing page of the role's area, relative to the login entry point.
    pub fn dashboard_path(&self) -> String {
        format!("{}/dashboard.html", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

/// Roles a page admits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn only(role: Role) -> Self {
        Self(vec![role])
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut roles = Vec::new();
        for role in iter {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Self(roles)
    }
}

/// Application profile stored in `users/{uid}`.
///
/// `is_approved` is only meaningful for students; `department` and `subject`
/// only for teachers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Profile {
    /// A freshly registered student, waiting for approval.
    pub fn student(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: Role::Student,
            is_approved: Some(false),
            department: None,
            subject: None,
        }
    }

    pub fn teacher(
        name: impl Into<String>,
        email: impl Into<String>,
        department: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: Role::Teacher,
            is_approved: None,
            department: Some(department.into()),
            subject: Some(subject.into()),
        }
    }

    pub fn admin(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: Role::Admin,
            is_approved: None,
            department: None,
            subject: None,
        }
    }

    /// Rebuild a profile from a record that does not fully decode. Only
    /// `role` has to be readable; other fields of the wrong type are dropped.
    pub fn salvage(fields: &Fields) -> Option<Self> {
        let role = serde_json::from_value(fields.get("role")?.clone()).ok()?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            name: text("name").unwrap_or_default(),
            email: text("email").unwrap_or_default(),
            role,
            is_approved: fields.get("isApproved").and_then(Value::as_bool),
            department: text("department"),
            subject: text("subject"),
        })
    }

    /// Students need an admin's approval before they may log in.
    pub fn awaiting_approval(&self) -> bool {
        self.role == Role::Student && self.is_approved != Some(true)
    }

    /// Case-insensitive match over name, department and subject.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [
            Some(self.name.as_str()),
            self.department.as_deref(),
            self.subject.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn test_dashboard_paths() {
        assert_eq!(Role::Student.dashboard_path(), "student/dashboard.html");
        assert_eq!(Role::Admin.dashboard_path(), "admin/dashboard.html");
    }

    #[test]
    fn test_role_set_dedups() {
        let set: RoleSet = [Role::Admin, Role::Admin, Role::Teacher].into();
        assert_eq!(set.iter().count(), 2);
        assert!(set.contains(Role::Teacher));
        assert!(!set.contains(Role::Student));
    }

    #[test]
    fn test_profile_wire_format() {
        let json = serde_json::to_value(Profile::student("Ann", "ann@example.com")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Ann",
                "email": "ann@example.com",
                "role": "student",
                "isApproved": false
            })
        );
    }

    #[test]
    fn test_role_only_record_decodes() {
        let profile: Profile =
            serde_json::from_value(serde_json::json!({ "name": "Root", "role": "admin" })).unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert_eq!(profile.email, "");
    }

    #[test]
    fn test_salvage_needs_only_role() {
        let fields = match serde_json::json!({ "name": 42, "role": "teacher", "subject": "Optics" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let profile = Profile::salvage(&fields).unwrap();
        assert_eq!(profile.role, Role::Teacher);
        assert_eq!(profile.name, "");
        assert_eq!(profile.subject.as_deref(), Some("Optics"));

        let mut unreadable = fields.clone();
        unreadable.insert("role".into(), Value::from("janitor"));
        assert!(Profile::salvage(&unreadable).is_none());
    }

    #[test]
    fn test_awaiting_approval() {
        let mut student = Profile::student("Ann", "ann@example.com");
        assert!(student.awaiting_approval());
        student.is_approved = Some(true);
        assert!(!student.awaiting_approval());
        assert!(!Profile::admin("Root", "root@example.com").awaiting_approval());
    }

    #[test]
    fn test_search_covers_department_and_subject() {
        let teacher = Profile::teacher("Dr. Lee", "lee@example.com", "Physics", "Optics");
        assert!(teacher.matches_search("lee"));
        assert!(teacher.matches_search("PHYS"));
        assert!(teacher.matches_search("opt"));
        assert!(!teacher.matches_search("chemistry"));
    }
}
