use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::domain::collections::APPOINTMENTS;
use crate::domain::{
    decode_document, encode_fields, Appointment, AppointmentStatus, DocumentStore, DomainError,
    DomainResult, FieldFilter, Fields, Record,
};
use crate::notifications::LiveQuery;

const ENTITY: &str = "Appointment";

/// Appointments under generated ids
#[derive(Clone)]
pub struct AppointmentRepository {
    store: Arc<dyn DocumentStore>,
}

impl AppointmentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, appointment: &Appointment) -> DomainResult<String> {
        self.store.add(APPOINTMENTS, encode_fields(appointment)?).await
    }

    pub async fn get(&self, id: &str) -> DomainResult<Record<Appointment>> {
        let document = self
            .store
            .get(APPOINTMENTS, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY, "id", id))?;
        decode_document(ENTITY, document)
    }

    pub async fn set_status(&self, id: &str, status: AppointmentStatus) -> DomainResult<()> {
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(status));
        self.store.update(APPOINTMENTS, id, fields).await
    }

    pub async fn for_teacher(&self, teacher_id: &str) -> DomainResult<Vec<Record<Appointment>>> {
        self.query(FieldFilter::eq("teacherId", teacher_id)).await
    }

    pub async fn for_student(&self, student_id: &str) -> DomainResult<Vec<Record<Appointment>>> {
        self.query(FieldFilter::eq("studentId", student_id)).await
    }

    pub fn watch_teacher(&self, teacher_id: &str) -> LiveQuery<Appointment> {
        LiveQuery::new(
            self.store.clone(),
            ENTITY,
            APPOINTMENTS,
            vec![FieldFilter::eq("teacherId", teacher_id)],
        )
    }

    pub fn watch_student(&self, student_id: &str) -> LiveQuery<Appointment> {
        LiveQuery::new(
            self.store.clone(),
            ENTITY,
            APPOINTMENTS,
            vec![FieldFilter::eq("studentId", student_id)],
        )
    }

    async fn query(&self, filter: FieldFilter) -> DomainResult<Vec<Record<Appointment>>> {
        let mut records: Vec<Record<Appointment>> = self
            .store
            .query(APPOINTMENTS, &[filter])
            .await?
            .into_iter()
            .filter_map(|document| match decode_document(ENTITY, document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable appointment");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| a.data.date_time.cmp(&b.data.date_time));
        Ok(records)
    }
}
