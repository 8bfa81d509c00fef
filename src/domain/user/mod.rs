//! User aggregate
//!
//! Contains the profile model, role types, form DTOs and the lookup port.

pub mod model;
pub mod repository;

mod dto_create;
mod dto_update;

pub use model::{Profile, Role, RoleSet};

pub use dto_create::{CreateTeacherDto, RegisterStudentDto};
pub use dto_update::UpdateTeacherDto;

pub use repository::ProfileLookup;
