use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{DomainResult, Session};

/// Stream of the current session. The value seen on subscription is the
/// restored (or absent) session; every sign-in and sign-out publishes a new
/// value.
pub type SessionStream = watch::Receiver<Option<Session>>;

/// Credential-based identity service.
#[async_trait]
pub trait IdentityService: Send + Sync {
    fn subscribe(&self) -> SessionStream;

    fn current_session(&self) -> Option<Session>;

    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> DomainResult<Session>;

    /// Create an account without touching the current session.
    /// Returns the new account's uid.
    async fn create_account(&self, email: &str, password: &str) -> DomainResult<String>;

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session>;

    async fn sign_out(&self) -> DomainResult<()>;
}
