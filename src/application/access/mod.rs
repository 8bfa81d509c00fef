//! Page access control
//!
//! A page load calls [`AccessGuard::protect`] with its location and the roles
//! it admits, then waits on the returned [`GuardHandle`] before running any
//! page logic.

mod guard;
mod page;
mod ready;

pub use guard::{
    AccessGuard, DenyReason, GuardExit, GuardHandle, GuardSettings, LookupFailurePolicy, Verdict,
};
pub use page::PageLocation;
pub use ready::{AuthContext, PageReady};
