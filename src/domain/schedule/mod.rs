//! Teacher availability

pub mod model;

pub use model::TeacherSchedule;
