//! Domain events
//!
//! Document change facts. The broadcast bus that carries them lives in
//! `notifications`.

pub mod types;

pub use types::{DocumentEvent, Event, EventMessage};
