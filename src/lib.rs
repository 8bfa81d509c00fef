//! # Appointment Portal
//!
//! Role-based appointment booking for students, teachers and admins.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Profiles, schedules, appointments and the service ports
//!   (identity, document store, navigation)
//! - **application**: The page access guard, account flows and role-area pages
//! - **infrastructure**: In-memory identity and document store, repositories,
//!   snapshot persistence
//! - **notifications**: Document change events and live queries
//! - **portal**: Runtime wiring used by the CLI
//!
//! Every role-area page load runs through [`AccessGuard::protect`], which
//! watches the session and either redirects or hands the page an
//! [`AuthContext`].
//!
//! ## Metrics
//!
//! Guard outcomes are counted on `portal_guard_outcomes_total` (label
//! `outcome`) through the `metrics` facade. The crate installs no recorder,
//! so the counters only record anything once the embedding application
//! installs one.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod portal;
pub mod support;

pub use application::{AccessGuard, AuthContext, GuardHandle, PageLocation};
pub use config::{default_config_path, AppConfig};
pub use portal::{init_tracing, PortalHandle, PortalOptions};

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, LiveQuery, SharedEventBus};
