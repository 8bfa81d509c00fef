use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use crate::domain::collections::TEACHER_SCHEDULES;
use crate::domain::{
    decode_document, encode_fields, DocumentStore, DomainError, DomainResult, TeacherSchedule,
};
use crate::notifications::LiveDocument;

const ENTITY: &str = "TeacherSchedule";
const SLOTS_FIELD: &str = "availableSlots";

/// Availability in `teacherSchedules`, keyed by teacher uid
#[derive(Clone)]
pub struct ScheduleRepository {
    store: Arc<dyn DocumentStore>,
}

impl ScheduleRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, teacher_id: &str) -> DomainResult<Option<TeacherSchedule>> {
        match self.store.get(TEACHER_SCHEDULES, teacher_id).await? {
            Some(document) => Ok(Some(decode_document(ENTITY, document)?.data)),
            None => Ok(None),
        }
    }

    /// One teacher's schedule, re-read after every change to it
    pub fn watch(&self, teacher_id: &str) -> LiveDocument<TeacherSchedule> {
        LiveDocument::new(self.store.clone(), ENTITY, TEACHER_SCHEDULES, teacher_id)
    }

    /// Append a slot; appending an instant already offered is a no-op.
    /// The schedule document is created on first use.
    pub async fn add_slot(&self, teacher_id: &str, slot: DateTime<Utc>) -> DomainResult<()> {
        let result = self
            .store
            .array_union(TEACHER_SCHEDULES, teacher_id, SLOTS_FIELD, vec![json!(slot)])
            .await;

        match result {
            Err(DomainError::NotFound { .. }) => {
                debug!(teacher_id, "No schedule yet; creating it");
                let schedule = TeacherSchedule {
                    available_slots: vec![slot],
                };
                self.store
                    .set(TEACHER_SCHEDULES, teacher_id, encode_fields(&schedule)?)
                    .await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryDocumentStore;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_add_slot_creates_then_unions() {
        let repo = ScheduleRepository::new(Arc::new(InMemoryDocumentStore::new()));
        let nine = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let ten = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();

        assert!(repo.find("t1").await.unwrap().is_none());

        repo.add_slot("t1", ten).await.unwrap();
        repo.add_slot("t1", nine).await.unwrap();
        repo.add_slot("t1", ten).await.unwrap();

        let schedule = repo.find("t1").await.unwrap().unwrap();
        assert_eq!(schedule.available_slots, vec![ten, nine]);
        assert_eq!(schedule.sorted_slots(), vec![nine, ten]);
    }
}
