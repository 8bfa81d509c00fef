//! Application layer: the page guard, account flows and role-area pages

pub mod access;
pub mod identity;
pub mod pages;

pub use access::{
    AccessGuard, AuthContext, DenyReason, GuardExit, GuardHandle, GuardSettings,
    LookupFailurePolicy, PageLocation, PageReady, Verdict,
};
pub use identity::{AccountService, LoginResult};
pub use pages::{AdminPage, BookingOptions, PortalRepositories, StudentPage, TeacherPage};
