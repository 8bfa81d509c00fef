//! In-memory identity service

use async_trait::async_trait;
use bcrypt::DEFAULT_COST;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::{DomainError, DomainResult, IdentityService, Session, SessionStream};
use crate::infrastructure::crypto::{hash_password_with_cost, verify_password};

/// Minimum password length accepted by the identity service
const MIN_PASSWORD_LEN: usize = 6;

/// Credential account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub password_hash: String,
}

/// In-memory identity service.
///
/// Accounts are keyed by lower-cased email. The session lives in a watch
/// channel so subscribers always see the latest value.
pub struct InMemoryIdentity {
    accounts: DashMap<String, Account>,
    session: watch::Sender<Option<Session>>,
    password_cost: u32,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::with_password_cost(DEFAULT_COST)
    }

    pub fn with_password_cost(password_cost: u32) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: DashMap::new(),
            session,
            password_cost,
        }
    }

    /// Rebuild from saved accounts, restoring the session if its account
    /// still exists.
    pub fn restore(accounts: Vec<Account>, session: Option<Session>, password_cost: u32) -> Self {
        let identity = Self::with_password_cost(password_cost);
        for account in accounts {
            identity.accounts.insert(normalize(&account.email), account);
        }

        if let Some(session) = session {
            let known = identity
                .accounts
                .get(&normalize(&session.email))
                .is_some_and(|account| account.uid == session.uid);
            if known {
                identity.session.send_replace(Some(session));
            } else {
                warn!(uid = %session.uid, "Saved session has no account; not restoring");
            }
        }
        identity
    }

    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.email.cmp(&b.email));
        accounts
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn insert_account(&self, email: &str, password: &str) -> DomainResult<Account> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(DomainError::Validation("Invalid email address".into()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = hash_password_with_cost(password, self.password_cost)
            .map_err(|e| DomainError::Backend(format!("Failed to hash password: {}", e)))?;

        match self.accounts.entry(normalize(email)) {
            Entry::Occupied(_) => Err(DomainError::Conflict("Email already in use".into())),
            Entry::Vacant(slot) => {
                let account = Account {
                    uid: uuid::Uuid::new_v4().simple().to_string(),
                    email: email.to_string(),
                    password_hash,
                };
                slot.insert(account.clone());
                Ok(account)
            }
        }
    }
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityService for InMemoryIdentity {
    fn subscribe(&self) -> SessionStream {
        self.session.subscribe()
    }

    fn current_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    async fn sign_up(&self, email: &str, password: &str) -> DomainResult<Session> {
        let account = self.insert_account(email, password)?;
        info!(uid = %account.uid, email = %account.email, "Account created and signed in");

        let session = Session::new(account.uid, account.email);
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn create_account(&self, email: &str, password: &str) -> DomainResult<String> {
        let account = self.insert_account(email, password)?;
        info!(uid = %account.uid, email = %account.email, "Account created");
        Ok(account.uid)
    }

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        let account = self
            .accounts
            .get(&normalize(email))
            .map(|entry| entry.value().clone());

        let Some(account) = account else {
            return Err(DomainError::Unauthorized("Invalid email or password".into()));
        };

        let valid = verify_password(password, &account.password_hash).unwrap_or(false);
        if !valid {
            return Err(DomainError::Unauthorized("Invalid email or password".into()));
        }

        let session = Session::new(account.uid, account.email);
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> DomainResult<()> {
        if let Some(previous) = self.session.send_replace(None) {
            info!(uid = %previous.uid, "Signed out");
        }
        Ok(())
    }
}
