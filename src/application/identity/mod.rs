//! Identity module: registration, login and logout
//!
//! Contains the `AccountService` which orchestrates the account flows that
//! run outside the guarded role areas.

pub mod service;

pub use service::{AccountService, LoginResult, REGISTRATION_REDIRECT};
