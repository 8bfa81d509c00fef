use serde::Deserialize;
use validator::Validate;

/// Self-registration form. New accounts always start as unapproved students.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterStudentDto {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6–128 characters"))]
    pub password: String,
}

impl RegisterStudentDto {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }
}

/// Teacher account created by an admin.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeacherDto {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6–128 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "department is required"))]
    pub department: String,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
}

impl CreateTeacherDto {
    pub fn new(name: &str, email: &str, password: &str, department: &str, subject: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
            department: department.trim().to_string(),
            subject: subject.trim().to_string(),
        }
    }
}
