//! Role-area page logic
//!
//! Each page is built from the [`AuthContext`] its guard produced, so it
//! never looks up "the current user" on its own.

mod admin;
mod student;
mod teacher;

use std::sync::Arc;

pub use admin::AdminPage;
pub use student::{BookingOptions, StudentPage};
pub use teacher::TeacherPage;

use crate::application::access::AuthContext;
use crate::domain::{DocumentStore, DomainError, DomainResult, Role};
use crate::infrastructure::{AppointmentRepository, ProfileRepository, ScheduleRepository};

/// Repositories shared by all pages
#[derive(Clone)]
pub struct PortalRepositories {
    pub profiles: ProfileRepository,
    pub schedules: ScheduleRepository,
    pub appointments: AppointmentRepository,
}

impl PortalRepositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            profiles: ProfileRepository::new(store.clone()),
            schedules: ScheduleRepository::new(store.clone()),
            appointments: AppointmentRepository::new(store),
        }
    }
}

fn require_role(context: &AuthContext, role: Role) -> DomainResult<()> {
    if context.role() == role {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!("requires the {} role", role)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::PortalRepositories;
    use crate::application::access::AuthContext;
    use crate::domain::Profile;
    use crate::infrastructure::InMemoryDocumentStore;

    pub fn repositories() -> (Arc<InMemoryDocumentStore>, PortalRepositories) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let repos = PortalRepositories::new(store.clone());
        (store, repos)
    }

    pub async fn signed_in(repos: &PortalRepositories, uid: &str, profile: Profile) -> Arc<AuthContext> {
        repos.profiles.create(uid, &profile).await.unwrap();
        Arc::new(AuthContext {
            session_id: uid.to_string(),
            profile,
        })
    }
}
