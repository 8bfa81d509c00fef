//! Infrastructure layer - external concerns

pub mod crypto;
pub mod identity;
pub mod navigation;
pub mod repositories;
pub mod snapshot;
pub mod storage;

pub use identity::{Account, InMemoryIdentity};
pub use navigation::RecordingNavigator;
pub use repositories::{AppointmentRepository, ProfileRepository, ScheduleRepository};
pub use snapshot::BackendSnapshot;
pub use storage::InMemoryDocumentStore;
