//! One-shot "ready" hand-off from the guard to page logic

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{Profile, Role};

/// What an authorized page load knows about its user.
///
/// Built once by the guard; page handlers receive it instead of reading any
/// global state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub session_id: String,
    pub profile: Profile,
}

impl AuthContext {
    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

/// Result of firing the ready signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fire {
    Fired,
    /// Same session already authorized on this page load
    AlreadyFired,
    /// A different session was authorized earlier on this page load
    OtherSession,
}

pub(crate) struct ReadySender(watch::Sender<Option<Arc<AuthContext>>>);

impl ReadySender {
    pub(crate) fn fire(&self, context: AuthContext) -> Fire {
        let mut outcome = Fire::Fired;
        self.0.send_if_modified(|slot| match slot {
            None => {
                *slot = Some(Arc::new(context));
                true
            }
            Some(existing) => {
                outcome = if existing.session_id == context.session_id {
                    Fire::AlreadyFired
                } else {
                    Fire::OtherSession
                };
                false
            }
        });
        outcome
    }
}

/// Receiving side of the ready signal
#[derive(Clone)]
pub struct PageReady(watch::Receiver<Option<Arc<AuthContext>>>);

impl PageReady {
    /// Wait until the page is authorized. `None` if the guard finished
    /// without authorizing (it redirected or was cancelled).
    pub async fn wait(&mut self) -> Option<Arc<AuthContext>> {
        match self.0.wait_for(Option::is_some).await {
            Ok(context) => context.clone(),
            Err(_) => None,
        }
    }

    /// The context, if ready has already fired.
    pub fn get(&self) -> Option<Arc<AuthContext>> {
        self.0.borrow().clone()
    }

    /// Whether ready fired since this receiver last looked.
    pub fn has_fired_since_seen(&self) -> bool {
        self.0.has_changed().unwrap_or(false)
    }
}

pub(crate) fn ready_channel() -> (ReadySender, PageReady) {
    let (tx, rx) = watch::channel(None);
    (ReadySender(tx), PageReady(rx))
}
