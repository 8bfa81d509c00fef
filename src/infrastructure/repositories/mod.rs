//! Typed repositories over the document store

mod appointment_repository;
mod profile_repository;
mod schedule_repository;

pub use appointment_repository::AppointmentRepository;
pub use profile_repository::ProfileRepository;
pub use schedule_repository::ScheduleRepository;
