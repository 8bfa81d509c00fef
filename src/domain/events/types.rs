//! Change events
//!
//! Published by document stores whenever a document is written or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// Document inserted (set on a new id, or add)
    DocumentCreated(DocumentEvent),
    /// Document overwritten or merged
    DocumentUpdated(DocumentEvent),
    /// Document removed
    DocumentDeleted(DocumentEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::DocumentCreated(_) => "document_created",
            Event::DocumentUpdated(_) => "document_updated",
            Event::DocumentDeleted(_) => "document_deleted",
        }
    }

    pub fn document(&self) -> &DocumentEvent {
        match self {
            Event::DocumentCreated(e) | Event::DocumentUpdated(e) | Event::DocumentDeleted(e) => e,
        }
    }

    pub fn collection(&self) -> &str {
        &self.document().collection
    }
}

/// A document identified by collection and id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEvent {
    pub collection: String,
    pub id: String,
}

impl DocumentEvent {
    pub fn new(collection: &str, id: &str) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
