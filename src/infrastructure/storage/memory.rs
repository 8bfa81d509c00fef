//! In-memory document store

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::domain::{
    ChangeFeed, Document, DocumentEvent, DocumentStore, DomainError, DomainResult, Event,
    FieldFilter, Fields,
};
use crate::notifications::{create_event_bus, SharedEventBus};

/// Documents of every collection, keyed by collection then id
pub type CollectionsDump = BTreeMap<String, BTreeMap<String, Fields>>;

/// In-memory document store for development, the CLI and tests.
///
/// Each collection lives under one map entry, so a write holds only that
/// collection's shard lock. Change events are published after the lock is
/// released.
pub struct InMemoryDocumentStore {
    collections: DashMap<String, BTreeMap<String, Fields>>,
    events: SharedEventBus,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            events: create_event_bus(),
        }
    }

    /// Rebuild a store from [`InMemoryDocumentStore::dump`] output.
    pub fn restore(dump: CollectionsDump) -> Self {
        let store = Self::new();
        for (name, documents) in dump {
            store.collections.insert(name, documents);
        }
        store
    }

    pub fn dump(&self) -> CollectionsDump {
        self.collections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn document_count(&self) -> usize {
        self.collections.iter().map(|entry| entry.value().len()).sum()
    }

    fn missing(collection: &str, id: &str) -> DomainError {
        DomainError::not_found("Document", "path", format!("{}/{}", collection, id))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<Document>> {
        Ok(self.collections.get(collection).and_then(|documents| {
            documents.get(id).map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            })
        }))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> DomainResult<()> {
        let created = self
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields)
            .is_none();

        let event = DocumentEvent::new(collection, id);
        self.events.publish(if created {
            Event::DocumentCreated(event)
        } else {
            Event::DocumentUpdated(event)
        });
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DomainResult<()> {
        {
            let mut documents = self
                .collections
                .get_mut(collection)
                .ok_or_else(|| Self::missing(collection, id))?;
            let document = documents
                .get_mut(id)
                .ok_or_else(|| Self::missing(collection, id))?;
            for (key, value) in fields {
                document.insert(key, value);
            }
        }

        self.events
            .publish(Event::DocumentUpdated(DocumentEvent::new(collection, id)));
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> DomainResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);

        debug!(collection, %id, "Document added");
        self.events
            .publish(Event::DocumentCreated(DocumentEvent::new(collection, &id)));
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> DomainResult<()> {
        let removed = self
            .collections
            .get_mut(collection)
            .and_then(|mut documents| documents.remove(id));
        if removed.is_none() {
            return Err(Self::missing(collection, id));
        }

        self.events
            .publish(Event::DocumentDeleted(DocumentEvent::new(collection, id)));
        Ok(())
    }

    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> DomainResult<Vec<Document>> {
        let Some(documents) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(documents
            .iter()
            .filter(|(_, fields)| filters.iter().all(|filter| filter.matches(fields)))
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> DomainResult<()> {
        {
            let mut documents = self
                .collections
                .get_mut(collection)
                .ok_or_else(|| Self::missing(collection, id))?;
            let document = documents
                .get_mut(id)
                .ok_or_else(|| Self::missing(collection, id))?;

            let slot = document
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                for value in values {
                    if !items.contains(&value) {
                        items.push(value);
                    }
                }
            }
        }

        self.events
            .publish(Event::DocumentUpdated(DocumentEvent::new(collection, id)));
        Ok(())
    }

    fn changes(&self) -> Box<dyn ChangeFeed> {
        Box::new(self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_set_get_update() {
        let store = InMemoryDocumentStore::new();
        store
            .set("users", "u1", fields(json!({"name": "Ann", "role": "student"})))
            .await
            .unwrap();

        store
            .update("users", "u1", fields(json!({"isApproved": true})))
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Ann");
        assert_eq!(doc.fields["isApproved"], true);
        assert!(store.get("users", "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .update("users", "ghost", fields(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_query_applies_all_filters() {
        let store = InMemoryDocumentStore::new();
        store
            .set("users", "a", fields(json!({"role": "student", "isApproved": false})))
            .await
            .unwrap();
        store
            .set("users", "b", fields(json!({"role": "student", "isApproved": true})))
            .await
            .unwrap();
        store
            .set("users", "c", fields(json!({"role": "teacher"})))
            .await
            .unwrap();

        let pending = store
            .query(
                "users",
                &[
                    FieldFilter::eq("role", "student"),
                    FieldFilter::eq("isApproved", false),
                ],
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "a");

        assert!(store.query("nothing", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_array_union_skips_existing_values() {
        let store = InMemoryDocumentStore::new();
        store
            .set("teacherSchedules", "t1", fields(json!({"availableSlots": ["a"]})))
            .await
            .unwrap();
        store
            .array_union("teacherSchedules", "t1", "availableSlots", vec![json!("a"), json!("b")])
            .await
            .unwrap();

        let doc = store.get("teacherSchedules", "t1").await.unwrap().unwrap();
        assert_eq!(doc.fields["availableSlots"], json!(["a", "b"]));

        let err = store
            .array_union("teacherSchedules", "t2", "availableSlots", vec![json!("a")])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_writes_publish_changes() {
        let store = InMemoryDocumentStore::new();
        let mut changes = store.changes();

        let id = store.add("appointments", fields(json!({"status": "pending"}))).await.unwrap();
        store.delete("appointments", &id).await.unwrap();

        let first = changes.next_change().await.unwrap();
        assert_eq!(first.event.event_type(), "document_created");
        assert_eq!(first.event.document().id, id);
        let second = changes.next_change().await.unwrap();
        assert_eq!(second.event.event_type(), "document_deleted");
    }

    #[tokio::test]
    async fn test_dump_and_restore() {
        let store = InMemoryDocumentStore::new();
        store.set("users", "u1", fields(json!({"name": "Ann"}))).await.unwrap();

        let restored = InMemoryDocumentStore::restore(store.dump());
        assert_eq!(restored.document_count(), 1);
        assert!(restored.get("users", "u1").await.unwrap().is_some());
    }
}
