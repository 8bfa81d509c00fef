//! Account flows: registration, login, logout and admin seeding

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use crate::application::access::PageLocation;
use crate::domain::{
    DomainError, DomainResult, IdentityService, Navigator, Profile, RegisterStudentDto, Role,
    Session,
};
use crate::infrastructure::ProfileRepository;

/// Where a freshly registered student is sent.
pub const REGISTRATION_REDIRECT: &str =
    "index.html?message=Registration successful. Please wait for admin approval.";

/// Returned after a successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub session: Session,
    pub profile: Profile,
    /// The role's dashboard, relative to the login page
    pub dashboard: String,
}

/// Orchestrates the account use-cases that run on public pages.
#[derive(Clone)]
pub struct AccountService {
    identity: Arc<dyn IdentityService>,
    profiles: ProfileRepository,
    navigator: Arc<dyn Navigator>,
    login_entry: String,
}

impl AccountService {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        profiles: ProfileRepository,
        navigator: Arc<dyn Navigator>,
        login_entry: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            profiles,
            navigator,
            login_entry: login_entry.into(),
        }
    }

    /// Register a new student. The account is signed in immediately but the
    /// profile starts unapproved, so login is refused until an admin
    /// approves it.
    pub async fn register(&self, dto: RegisterStudentDto) -> DomainResult<Session> {
        dto.validate()?;

        let session = self.identity.sign_up(&dto.email, &dto.password).await?;
        let profile = Profile::student(&dto.name, &dto.email);
        if let Err(e) = self.profiles.create(&session.uid, &profile).await {
            warn!(uid = %session.uid, error = %e, "Account created but profile write failed");
            return Err(e);
        }

        info!(uid = %session.uid, email = %dto.email, "New student registered");
        self.navigator.redirect(REGISTRATION_REDIRECT);
        Ok(session)
    }

    /// Sign in and route to the role's dashboard.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<LoginResult> {
        let session = self.identity.sign_in(email.trim(), password).await?;

        let Some(profile) = self.profiles.find(&session.uid).await? else {
            warn!(uid = %session.uid, "Signed in but no profile record");
            return Err(DomainError::not_found("User", "id", session.uid));
        };

        if profile.awaiting_approval() {
            self.identity.sign_out().await?;
            info!(uid = %session.uid, "Login refused: student not approved");
            return Err(DomainError::NotApproved(profile.email));
        }

        let dashboard = profile.role.dashboard_path();
        info!(uid = %session.uid, role = %profile.role, "User logged in");
        self.navigator.redirect(&dashboard);

        Ok(LoginResult {
            session,
            profile,
            dashboard,
        })
    }

    /// Sign out and go back to the login page. Returns the redirect target.
    pub async fn logout(&self, page: &PageLocation) -> DomainResult<String> {
        self.identity.sign_out().await?;
        let target = page.login_url(&self.login_entry);
        self.navigator.redirect(&target);
        Ok(target)
    }

    /// Create an admin account with its profile, leaving the current session
    /// alone. Returns the new uid.
    pub async fn create_admin(&self, name: &str, email: &str, password: &str) -> DomainResult<String> {
        let uid = self.identity.create_account(email, password).await?;
        self.profiles.create(&uid, &Profile::admin(name, email)).await?;
        info!(%uid, email, role = %Role::Admin, "Admin account created");
        Ok(uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{InMemoryDocumentStore, InMemoryIdentity, RecordingNavigator};

    struct Fixture {
        identity: Arc<InMemoryIdentity>,
        store: Arc<InMemoryDocumentStore>,
        profiles: ProfileRepository,
        navigator: Arc<RecordingNavigator>,
        service: AccountService,
    }

    fn fixture() -> Fixture {
        let identity = Arc::new(InMemoryIdentity::with_password_cost(4));
        let store = Arc::new(InMemoryDocumentStore::new());
        let profiles = ProfileRepository::new(store.clone());
        let navigator = Arc::new(RecordingNavigator::new());
        let service = AccountService::new(
            identity.clone(),
            profiles.clone(),
            navigator.clone(),
            "index.html",
        );
        Fixture {
            identity,
            store,
            profiles,
            navigator,
            service,
        }
    }

    #[tokio::test]
    async fn test_register_writes_unapproved_student() {
        let fx = fixture();

        let session = fx
            .service
            .register(RegisterStudentDto::new(" Ann ", "ann@example.com", "secret1"))
            .await
            .unwrap();

        let profile = fx.profiles.get(&session.uid).await.unwrap();
        assert_eq!(profile.name, "Ann");
        assert_eq!(profile.role, Role::Student);
        assert_eq!(profile.is_approved, Some(false));
        assert_eq!(fx.navigator.last().as_deref(), Some(REGISTRATION_REDIRECT));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_form() {
        let fx = fixture();
        let err = fx
            .service
            .register(RegisterStudentDto::new("Ann", "ann@example.com", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(fx.identity.account_count(), 0);
    }

    #[tokio::test]
    async fn test_login_refuses_unapproved_student_and_signs_out() {
        let fx = fixture();
        fx.service
            .register(RegisterStudentDto::new("Ann", "ann@example.com", "secret1"))
            .await
            .unwrap();
        fx.identity.sign_out().await.unwrap();

        let err = fx.service.login("ann@example.com", "secret1").await.unwrap_err();

        assert!(matches!(err, DomainError::NotApproved(_)));
        assert!(fx.identity.current_session().is_none());
    }

    #[tokio::test]
    async fn test_login_routes_to_role_dashboard() {
        let fx = fixture();
        let session = fx
            .service
            .register(RegisterStudentDto::new("Ann", "ann@example.com", "secret1"))
            .await
            .unwrap();
        fx.profiles.mark_approved(&session.uid).await.unwrap();
        fx.service
            .create_admin("Root", "root@example.com", "rootpass")
            .await
            .unwrap();

        let student = fx.service.login("ann@example.com", "secret1").await.unwrap();
        assert_eq!(student.dashboard, "student/dashboard.html");

        let admin = fx.service.login("root@example.com", "rootpass").await.unwrap();
        assert_eq!(admin.dashboard, "admin/dashboard.html");
        assert_eq!(fx.navigator.last().as_deref(), Some("admin/dashboard.html"));
        assert_eq!(fx.identity.current_session(), Some(admin.session));
    }

    #[tokio::test]
    async fn test_login_without_profile_keeps_session() {
        let fx = fixture();
        fx.identity.create_account("ghost@example.com", "secret1").await.unwrap();

        let err = fx.service.login("ghost@example.com", "secret1").await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(fx.identity.current_session().is_some());
    }

    #[tokio::test]
    async fn test_login_reads_role_from_sparse_profile() {
        use crate::domain::DocumentStore;

        let fx = fixture();
        let uid = fx.identity.create_account("root@example.com", "rootpass").await.unwrap();
        let mut fields = crate::domain::Fields::new();
        fields.insert("name".into(), serde_json::json!("Root"));
        fields.insert("role".into(), serde_json::json!("admin"));
        fx.store.set("users", &uid, fields).await.unwrap();

        let login = fx.service.login("root@example.com", "rootpass").await.unwrap();
        assert_eq!(login.dashboard, "admin/dashboard.html");
    }

    #[tokio::test]
    async fn test_login_bad_password_is_unauthorized() {
        let fx = fixture();
        fx.service
            .create_admin("Root", "root@example.com", "rootpass")
            .await
            .unwrap();
        let err = fx.service.login("root@example.com", "wrong!!").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_logout_target_depends_on_page() {
        let fx = fixture();
        let target = fx
            .service
            .logout(&PageLocation::in_area(Role::Teacher, "dashboard.html"))
            .await
            .unwrap();
        assert_eq!(target, "../index.html");

        let target = fx.service.logout(&PageLocation::new("/index.html")).await.unwrap();
        assert_eq!(target, "index.html");
    }
}
