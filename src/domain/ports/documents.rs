use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::{DomainError, DomainResult, EventMessage};

/// Field map of a stored document
pub type Fields = serde_json::Map<String, Value>;

/// A stored document: id plus fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// A decoded document
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: String,
    pub data: T,
}

/// Equality filter on a top-level field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// Subscription to a document store's changes, across all collections.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Next change, or `None` once the store is gone. Changes missed by a
    /// slow reader are skipped.
    async fn next_change(&mut self) -> Option<EventMessage>;
}

/// Document database with query-by-field and a change feed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<Document>>;

    /// Create or overwrite.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> DomainResult<()>;

    /// Merge fields into an existing document; `NotFound` if it is absent.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DomainResult<()>;

    /// Insert under a generated id.
    async fn add(&self, collection: &str, fields: Fields) -> DomainResult<String>;

    async fn delete(&self, collection: &str, id: &str) -> DomainResult<()>;

    /// Documents matching every filter.
    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> DomainResult<Vec<Document>>;

    /// Append values missing from an array field of an existing document;
    /// `NotFound` if the document is absent.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> DomainResult<()>;

    /// Subscribe to document changes. Only changes after the call are seen.
    fn changes(&self) -> Box<dyn ChangeFeed>;
}

/// Serialize a value into document fields.
pub fn encode_fields<T: Serialize>(value: &T) -> DomainResult<Fields> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(DomainError::Validation(format!(
            "Expected an object, got {}",
            other
        ))),
        Err(e) => Err(DomainError::Validation(format!("Failed to encode: {}", e))),
    }
}

/// Decode a stored document into its domain type.
pub fn decode_document<T: DeserializeOwned>(
    entity: &'static str,
    document: Document,
) -> DomainResult<Record<T>> {
    let Document { id, fields } = document;
    match serde_json::from_value(Value::Object(fields)) {
        Ok(data) => Ok(Record { id, data }),
        Err(e) => Err(DomainError::Malformed {
            entity,
            id,
            reason: e.to_string(),
        }),
    }
}
