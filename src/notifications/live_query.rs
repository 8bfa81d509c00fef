//! Live queries
//!
//! A query that re-runs whenever its collection changes: the first call to
//! [`LiveQuery::next`] yields the current result set, each later call waits
//! for a change in the collection and yields a fresh one. [`LiveDocument`]
//! does the same for a single document.

use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::stream::{self, Stream};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{
    decode_document, ChangeFeed, Document, DocumentStore, DomainResult, FieldFilter, Record,
};

/// Turns a stored document into a typed record
pub type Decoder<T> = fn(&'static str, Document) -> DomainResult<Record<T>>;

pub struct LiveQuery<T> {
    store: Arc<dyn DocumentStore>,
    entity: &'static str,
    collection: String,
    filters: Vec<FieldFilter>,
    decode: Decoder<T>,
    changes: Box<dyn ChangeFeed>,
    primed: bool,
}

impl<T: DeserializeOwned> LiveQuery<T> {
    /// Subscribes immediately, so no change between construction and the
    /// first snapshot is lost.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        entity: &'static str,
        collection: &str,
        filters: Vec<FieldFilter>,
    ) -> Self {
        let changes = store.changes();
        Self {
            store,
            entity,
            collection: collection.to_string(),
            filters,
            decode: decode_document::<T>,
            changes,
            primed: false,
        }
    }
}

impl<T> LiveQuery<T> {
    pub fn with_decoder(mut self, decode: Decoder<T>) -> Self {
        self.decode = decode;
        self
    }

    /// Next snapshot, or `None` once the store's change feed is closed.
    ///
    /// Documents that do not decode are logged and left out; they never
    /// fail the whole snapshot.
    pub async fn next(&mut self) -> Option<DomainResult<Vec<Record<T>>>> {
        if self.primed {
            loop {
                let message = self.changes.next_change().await?;
                if message.event.collection() == self.collection {
                    break;
                }
            }
        }
        self.primed = true;
        Some(self.snapshot().await)
    }

    async fn snapshot(&self) -> DomainResult<Vec<Record<T>>> {
        let documents = self.store.query(&self.collection, &self.filters).await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match (self.decode)(self.entity, document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(collection = %self.collection, error = %e, "Skipping unreadable document");
                    None
                }
            })
            .collect())
    }

    pub fn into_stream(self) -> impl Stream<Item = DomainResult<Vec<Record<T>>>> {
        stream::unfold(self, |mut query| async move {
            query.next().await.map(|item| (item, query))
        })
    }
}

/// One document, re-read whenever it changes.
pub struct LiveDocument<T> {
    store: Arc<dyn DocumentStore>,
    entity: &'static str,
    collection: String,
    id: String,
    changes: Box<dyn ChangeFeed>,
    primed: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> LiveDocument<T> {
    pub fn new(store: Arc<dyn DocumentStore>, entity: &'static str, collection: &str, id: &str) -> Self {
        let changes = store.changes();
        Self {
            store,
            entity,
            collection: collection.to_string(),
            id: id.to_string(),
            changes,
            primed: false,
            _marker: PhantomData,
        }
    }

    /// Current value first (`None` while the document does not exist), then
    /// the new value after each write or delete of this document.
    pub async fn next(&mut self) -> Option<DomainResult<Option<T>>> {
        if self.primed {
            loop {
                let message = self.changes.next_change().await?;
                let changed = message.event.document();
                if changed.collection == self.collection && changed.id == self.id {
                    break;
                }
            }
        }
        self.primed = true;
        Some(self.read().await)
    }

    async fn read(&self) -> DomainResult<Option<T>> {
        match self.store.get(&self.collection, &self.id).await? {
            Some(document) => Ok(Some(decode_document(self.entity, document)?.data)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;
    use serde_json::json;

    use super::*;
    use crate::domain::{Fields, Profile, TeacherSchedule};
    use crate::infrastructure::InMemoryDocumentStore;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_reruns_only_on_own_collection() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let stream = LiveQuery::<Profile>::new(
            store.clone(),
            "User",
            "users",
            vec![FieldFilter::eq("role", "teacher")],
        )
        .into_stream();
        futures_util::pin_mut!(stream);

        assert!(stream.next().await.unwrap().unwrap().is_empty());

        store
            .set("teacherSchedules", "t1", fields(json!({ "availableSlots": [] })))
            .await
            .unwrap();
        store
            .set(
                "users",
                "t1",
                fields(json!({ "name": "Lee", "email": "lee@example.com", "role": "teacher" })),
            )
            .await
            .unwrap();

        let snapshot = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "t1");
    }

    #[tokio::test]
    async fn test_unreadable_document_does_not_hide_the_rest() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store
            .set("users", "t1", fields(json!({ "name": "Lee", "role": "teacher" })))
            .await
            .unwrap();
        store
            .set("users", "t2", fields(json!({ "name": 7, "role": "teacher" })))
            .await
            .unwrap();

        let mut query = LiveQuery::<Profile>::new(
            store.clone(),
            "User",
            "users",
            vec![FieldFilter::eq("role", "teacher")],
        );
        let snapshot = query.next().await.unwrap().unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "t1");
    }

    #[tokio::test]
    async fn test_live_document_follows_one_id() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let mut live =
            LiveDocument::<TeacherSchedule>::new(store.clone(), "TeacherSchedule", "teacherSchedules", "t1");
        assert_eq!(live.next().await.unwrap().unwrap(), None);

        store
            .set("teacherSchedules", "t2", fields(json!({ "availableSlots": [] })))
            .await
            .unwrap();
        store
            .set(
                "teacherSchedules",
                "t1",
                fields(json!({ "availableSlots": ["2026-11-02T09:00:00Z"] })),
            )
            .await
            .unwrap();

        let schedule = tokio::time::timeout(Duration::from_secs(1), live.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap()
            .expect("schedule created");
        assert_eq!(schedule.available_slots.len(), 1);
    }
}
