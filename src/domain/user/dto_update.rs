use serde::Deserialize;
use validator::Validate;

/// Editable teacher fields. Email and role are fixed once created.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTeacherDto {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "department is required"))]
    pub department: String,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
}

impl UpdateTeacherDto {
    pub fn new(name: &str, department: &str, subject: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            department: department.trim().to_string(),
            subject: subject.trim().to_string(),
        }
    }
}
