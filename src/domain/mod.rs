pub mod appointment;
pub mod events;
pub mod ports;
pub mod schedule;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use appointment::{Appointment, AppointmentStatus};
pub use events::{DocumentEvent, Event, EventMessage};
pub use ports::{
    decode_document, encode_fields, ChangeFeed, Document, DocumentStore, FieldFilter, Fields,
    IdentityService, Navigator, Record, SessionStream,
};
pub use schedule::TeacherSchedule;
pub use session::Session;
pub use user::{
    CreateTeacherDto, Profile, ProfileLookup, RegisterStudentDto, Role, RoleSet,
    UpdateTeacherDto,
};

// Re-export errors from support for convenience
pub use crate::support::errors::{DomainError, DomainResult};

/// Collection names
pub mod collections {
    pub const USERS: &str = "users";
    pub const TEACHER_SCHEDULES: &str = "teacherSchedules";
    pub const APPOINTMENTS: &str = "appointments";
}
