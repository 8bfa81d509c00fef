//! Ports: the services this application consumes
//!
//! - [`IdentityService`]: credential accounts and the session stream
//! - [`DocumentStore`]: document database with field queries and change feed
//! - [`Navigator`]: page navigation

pub mod documents;
pub mod identity;
pub mod navigation;

pub use documents::{
    decode_document, encode_fields, ChangeFeed, Document, DocumentStore, FieldFilter, Fields, Record,
};
pub use identity::{IdentityService, SessionStream};
pub use navigation::Navigator;
