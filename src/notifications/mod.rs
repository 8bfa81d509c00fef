//! Notifications module
//!
//! Document change events and the live queries built on them.
//!
//! # Usage
//! ```ignore
//! use appointment_portal::notifications::LiveQuery;
//!
//! let mut teachers: LiveQuery<Profile> =
//!     LiveQuery::new(store, "User", "users", vec![FieldFilter::eq("role", "teacher")]);
//! while let Some(snapshot) = teachers.next().await {
//!     render(snapshot?);
//! }
//! ```

pub mod event_bus;
pub mod live_query;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use live_query::{LiveDocument, LiveQuery};

pub use crate::domain::events::{DocumentEvent, Event, EventMessage};
