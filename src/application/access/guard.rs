//! Page authorization guard
//!
//! Decides, on every session change, whether the current session may stay
//! on a page:
//!
//! - no session: restricted pages redirect to login, public pages stay;
//! - session without a profile record: forced sign-out, then redirect;
//! - profile role in the page's role set: authorize and fire "ready";
//! - any other role: redirect, session kept.
//!
//! Approval (`isApproved`) is only checked at login, not here.
//!
//! Each applied verdict increments `portal_guard_outcomes_total`; this is a
//! no-op unless the host process has installed a `metrics` recorder.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::page::PageLocation;
use super::ready::{ready_channel, AuthContext, Fire, PageReady, ReadySender};
use crate::domain::{
    DomainError, IdentityService, Navigator, ProfileLookup, Role, RoleSet, Session, SessionStream,
};

/// What to do when the profile lookup itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailurePolicy {
    /// Treat it like a missing profile: sign out, then redirect
    #[default]
    SignOut,
    /// Redirect but keep the session
    KeepSession,
}

#[derive(Debug, Clone)]
pub struct GuardSettings {
    /// Login entry point, relative to the site root
    pub login_entry: String,
    pub on_lookup_failure: LookupFailurePolicy,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            login_entry: "index.html".to_string(),
            on_lookup_failure: LookupFailurePolicy::default(),
        }
    }
}

/// Why a session was turned away
#[derive(Debug, Clone, PartialEq)]
pub enum DenyReason {
    NoSession,
    MissingProfile,
    /// `None` when the stored role could not be read
    RoleMismatch(Option<Role>),
    LookupFailed(String),
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NoSession => "no_session",
            DenyReason::MissingProfile => "missing_profile",
            DenyReason::RoleMismatch(_) => "role_mismatch",
            DenyReason::LookupFailed(_) => "lookup_failed",
        }
    }
}

/// Outcome of evaluating one session against one page
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Public page, nobody signed in
    Stay,
    Authorize(AuthContext),
    Deny { reason: DenyReason, sign_out: bool },
}

/// Why a guard stopped running
#[derive(Debug, Clone, PartialEq)]
pub enum GuardExit {
    Redirected { target: String, reason: DenyReason },
    /// A different user became authorized after ready fired
    Reloaded,
    Cancelled,
    SessionStreamClosed,
}

/// Page authorization guard.
///
/// Cheap to clone; one guard can protect any number of page loads.
#[derive(Clone)]
pub struct AccessGuard {
    identity: Arc<dyn IdentityService>,
    profiles: Arc<dyn ProfileLookup>,
    navigator: Arc<dyn Navigator>,
    settings: GuardSettings,
}

enum Step {
    Superseded { stream_open: bool },
    Decided(Verdict),
}

impl AccessGuard {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        profiles: Arc<dyn ProfileLookup>,
        navigator: Arc<dyn Navigator>,
        settings: GuardSettings,
    ) -> Self {
        Self {
            identity,
            profiles,
            navigator,
            settings,
        }
    }

    pub fn settings(&self) -> &GuardSettings {
        &self.settings
    }

    /// Decide for a single session. The only side effect is the profile
    /// lookup, and it is skipped when there is no session.
    pub async fn evaluate(
        &self,
        page: &PageLocation,
        allowed: &RoleSet,
        session: Option<&Session>,
    ) -> Verdict {
        let Some(session) = session else {
            return if page.is_restricted() {
                Verdict::Deny {
                    reason: DenyReason::NoSession,
                    sign_out: false,
                }
            } else {
                Verdict::Stay
            };
        };

        match self.profiles.find_profile(&session.uid).await {
            Ok(Some(profile)) if allowed.contains(profile.role) => {
                Verdict::Authorize(AuthContext {
                    session_id: session.uid.clone(),
                    profile,
                })
            }
            Ok(Some(profile)) => Verdict::Deny {
                reason: DenyReason::RoleMismatch(Some(profile.role)),
                sign_out: false,
            },
            Ok(None) => Verdict::Deny {
                reason: DenyReason::MissingProfile,
                sign_out: true,
            },
            Err(DomainError::Malformed { reason, .. }) => {
                warn!(uid = %session.uid, %reason, "Stored profile is unreadable");
                Verdict::Deny {
                    reason: DenyReason::RoleMismatch(None),
                    sign_out: false,
                }
            }
            Err(e) => Verdict::Deny {
                reason: DenyReason::LookupFailed(e.to_string()),
                sign_out: self.settings.on_lookup_failure == LookupFailurePolicy::SignOut,
            },
        }
    }

    /// Guard a page load.
    ///
    /// The current session is evaluated right away and again on every
    /// session change. A change that arrives while a lookup is in flight
    /// drops that lookup; only the latest session's verdict is applied.
    /// Dropping or cancelling the handle stops the guard.
    pub fn protect(&self, page: PageLocation, allowed: impl Into<RoleSet>) -> GuardHandle {
        let allowed = allowed.into();
        let (ready_tx, ready_rx) = ready_channel();
        let sessions = self.identity.subscribe();
        let guard = self.clone();

        debug!(page = page.path(), ?allowed, "Guarding page");
        let task = tokio::spawn(async move { guard.run(page, allowed, sessions, ready_tx).await });

        GuardHandle {
            ready: ready_rx,
            task,
        }
    }

    async fn run(
        self,
        page: PageLocation,
        allowed: RoleSet,
        mut sessions: SessionStream,
        ready: ReadySender,
    ) -> GuardExit {
        let mut current = sessions.borrow_and_update().clone();

        loop {
            let step = tokio::select! {
                biased;
                changed = sessions.changed() => Step::Superseded { stream_open: changed.is_ok() },
                verdict = self.evaluate(&page, &allowed, current.as_ref()) => Step::Decided(verdict),
            };

            match step {
                Step::Superseded { stream_open: false } => return GuardExit::SessionStreamClosed,
                Step::Superseded { stream_open: true } => {
                    debug!(page = page.path(), "Session changed during evaluation; superseding");
                    current = sessions.borrow_and_update().clone();
                    continue;
                }
                Step::Decided(verdict) => {
                    if let Some(exit) = self.apply(&page, verdict, &ready).await {
                        return exit;
                    }
                }
            }

            if sessions.changed().await.is_err() {
                return GuardExit::SessionStreamClosed;
            }
            current = sessions.borrow_and_update().clone();
        }
    }

    async fn apply(
        &self,
        page: &PageLocation,
        verdict: Verdict,
        ready: &ReadySender,
    ) -> Option<GuardExit> {
        match verdict {
            Verdict::Stay => {
                debug!(page = page.path(), "Public page, no session");
                None
            }
            Verdict::Authorize(context) => {
                let uid = context.session_id.clone();
                let role = context.role();
                match ready.fire(context) {
                    Fire::Fired => {
                        info!(%uid, %role, page = page.path(), "User authorized for page");
                        metrics::counter!("portal_guard_outcomes_total", "outcome" => "authorized")
                            .increment(1);
                        None
                    }
                    Fire::AlreadyFired => {
                        debug!(%uid, page = page.path(), "Already authorized; ready not repeated");
                        None
                    }
                    Fire::OtherSession => {
                        info!(%uid, page = page.path(), "Different user authorized; reloading page");
                        metrics::counter!("portal_guard_outcomes_total", "outcome" => "reloaded")
                            .increment(1);
                        self.navigator.redirect(page.path());
                        Some(GuardExit::Reloaded)
                    }
                }
            }
            Verdict::Deny { reason, sign_out } => {
                match &reason {
                    DenyReason::NoSession => {
                        info!(page = page.path(), "No user logged in. Redirecting to login.")
                    }
                    DenyReason::RoleMismatch(role) => {
                        warn!(page = page.path(), ?role, "Role mismatch. Redirecting.")
                    }
                    DenyReason::MissingProfile => {
                        error!(page = page.path(), "User profile not found. Logging out.")
                    }
                    DenyReason::LookupFailed(cause) => {
                        error!(page = page.path(), %cause, sign_out, "Profile lookup failed. Redirecting.")
                    }
                }
                metrics::counter!("portal_guard_outcomes_total", "outcome" => reason.as_str())
                    .increment(1);

                if sign_out {
                    if let Err(e) = self.identity.sign_out().await {
                        warn!(error = %e, "Forced sign-out failed");
                    }
                }

                let target = page.login_url(&self.settings.login_entry);
                self.navigator.redirect(&target);
                Some(GuardExit::Redirected { target, reason })
            }
        }
    }
}

/// A running guard: the page's cancellable session subscription plus its
/// ready signal.
pub struct GuardHandle {
    ready: PageReady,
    task: JoinHandle<GuardExit>,
}

impl GuardHandle {
    /// Wait for authorization. `None` if the guard redirected instead.
    pub async fn ready(&mut self) -> Option<Arc<AuthContext>> {
        self.ready.wait().await
    }

    /// A receiver for page logic that waits on its own.
    pub fn page_ready(&self) -> PageReady {
        self.ready.clone()
    }

    pub fn context(&self) -> Option<Arc<AuthContext>> {
        self.ready.get()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the guard to stop.
    pub async fn join(mut self) -> GuardExit {
        match (&mut self.task).await {
            Ok(exit) => exit,
            Err(e) if e.is_cancelled() => GuardExit::Cancelled,
            Err(e) => {
                error!(error = %e, "Guard task failed");
                GuardExit::Cancelled
            }
        }
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
