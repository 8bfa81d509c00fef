//! Portal runtime
//!
//! [`PortalHandle`] wires the in-memory backend, the page guard, account
//! flows and page repositories together, restoring state from a snapshot
//! file and saving it back. The CLI uses this so it holds no bootstrap code
//! of its own.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::{
    AccessGuard, AccountService, AdminPage, AuthContext, GuardHandle, PageLocation,
    PortalRepositories, StudentPage, TeacherPage,
};
use crate::config::AppConfig;
use crate::domain::{DomainResult, RoleSet};
use crate::infrastructure::{
    BackendSnapshot, InMemoryDocumentStore, InMemoryIdentity, ProfileRepository,
    RecordingNavigator,
};
use crate::support::AppError;

/// Options for opening the portal
pub struct PortalOptions {
    pub config: AppConfig,
    /// Snapshot file to restore from and save to
    pub snapshot_path: PathBuf,
    /// Create the configured admin when no accounts exist (default: true)
    pub create_default_admin: bool,
}

/// A running portal backed by a snapshot file
pub struct PortalHandle {
    pub config: AppConfig,
    pub identity: Arc<InMemoryIdentity>,
    pub store: Arc<InMemoryDocumentStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub guard: AccessGuard,
    pub accounts: AccountService,
    pub repos: PortalRepositories,
    snapshot_path: PathBuf,
}

impl PortalHandle {
    pub async fn open(opts: PortalOptions) -> Result<Self, AppError> {
        let config = opts.config;

        let snapshot = BackendSnapshot::load(&opts.snapshot_path).await?;
        let (identity, store) = snapshot.into_backend(config.storage.password_cost);
        let identity = Arc::new(identity);
        let store = Arc::new(store);
        info!(
            path = %opts.snapshot_path.display(),
            accounts = identity.account_count(),
            documents = store.document_count(),
            "Portal state loaded"
        );

        let navigator = Arc::new(RecordingNavigator::new());
        let repos = PortalRepositories::new(store.clone());
        let profiles = Arc::new(ProfileRepository::new(store.clone()));
        let guard = AccessGuard::new(
            identity.clone(),
            profiles,
            navigator.clone(),
            config.guard_settings(),
        );
        let accounts = AccountService::new(
            identity.clone(),
            repos.profiles.clone(),
            navigator.clone(),
            config.portal.login_entry.clone(),
        );

        let handle = Self {
            config,
            identity,
            store,
            navigator,
            guard,
            accounts,
            repos,
            snapshot_path: opts.snapshot_path,
        };

        if opts.create_default_admin {
            handle.create_default_admin().await;
        }
        Ok(handle)
    }

    /// Guard a page load against the current session.
    pub fn protect(&self, page: PageLocation, allowed: impl Into<RoleSet>) -> GuardHandle {
        self.guard.protect(page, allowed)
    }

    pub fn admin_page(&self, context: Arc<AuthContext>) -> DomainResult<AdminPage> {
        AdminPage::new(context, self.identity.clone(), self.repos.clone())
    }

    pub fn teacher_page(&self, context: Arc<AuthContext>) -> DomainResult<TeacherPage> {
        TeacherPage::new(context, self.repos.clone())
    }

    pub fn student_page(&self, context: Arc<AuthContext>) -> DomainResult<StudentPage> {
        StudentPage::new(context, self.repos.clone())
    }

    /// Write the current accounts, session and documents to the snapshot file.
    pub async fn save(&self) -> Result<(), AppError> {
        BackendSnapshot::capture(&self.identity, &self.store)
            .save(&self.snapshot_path)
            .await?;
        info!(path = %self.snapshot_path.display(), "Portal state saved");
        Ok(())
    }

    async fn create_default_admin(&self) {
        if self.identity.account_count() > 0 {
            return;
        }
        info!("Creating default admin user...");

        let admin = &self.config.admin;
        match self
            .accounts
            .create_admin(&admin.name, &admin.email, &admin.password)
            .await
        {
            Ok(_) => {
                info!("Default admin created: {}", admin.email);
                warn!("Please change the default admin password");
            }
            Err(e) => error!("Failed to create admin user: {}", e),
        }
    }
}

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` wins over `logging.level`. Call once at process startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IdentityService, Role};

    fn options(dir: &std::path::Path) -> PortalOptions {
        let mut config = AppConfig::default();
        config.storage.password_cost = 4;
        PortalOptions {
            config,
            snapshot_path: dir.join("state.json"),
            create_default_admin: true,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("portal-{}-{}", name, uuid::Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn test_default_admin_survives_save_and_reopen() {
        let dir = temp_dir("reopen");
        let portal = PortalHandle::open(options(&dir)).await.unwrap();
        assert_eq!(portal.identity.account_count(), 1);

        portal
            .accounts
            .login("admin@example.com", "admin123")
            .await
            .unwrap();
        portal.save().await.unwrap();
        drop(portal);

        let portal = PortalHandle::open(options(&dir)).await.unwrap();
        assert_eq!(portal.identity.account_count(), 1);
        assert!(portal.identity.current_session().is_some());

        let mut guard = portal.protect(
            PageLocation::in_area(Role::Admin, "dashboard.html"),
            [Role::Admin],
        );
        let context = guard.ready().await.expect("admin not authorized");
        assert!(portal.admin_page(context.clone()).is_ok());
        assert!(portal.student_page(context).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
