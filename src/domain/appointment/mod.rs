//! Appointment aggregate

pub mod model;

pub use model::{Appointment, AppointmentStatus};
