use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::collections::USERS;
use crate::domain::{
    decode_document, encode_fields, Document, DocumentStore, DomainError, DomainResult,
    FieldFilter, Fields, Profile, ProfileLookup, Record, Role, UpdateTeacherDto,
};
use crate::notifications::LiveQuery;

const ENTITY: &str = "User";

/// Profiles in the `users` collection, keyed by identity uid
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, uid: &str) -> DomainResult<Option<Profile>> {
        match self.store.get(USERS, uid).await? {
            Some(document) => Ok(Some(decode_profile(ENTITY, document)?.data)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, uid: &str) -> DomainResult<Profile> {
        self.find(uid)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY, "id", uid))
    }

    pub async fn create(&self, uid: &str, profile: &Profile) -> DomainResult<()> {
        self.store.set(USERS, uid, encode_fields(profile)?).await
    }

    pub async fn list_by_role(&self, role: Role) -> DomainResult<Vec<Record<Profile>>> {
        self.query(vec![FieldFilter::eq("role", role.as_str())]).await
    }

    pub async fn pending_students(&self) -> DomainResult<Vec<Record<Profile>>> {
        self.query(pending_filters()).await
    }

    pub async fn mark_approved(&self, uid: &str) -> DomainResult<()> {
        self.store
            .update(USERS, uid, single("isApproved", json!(true)))
            .await
    }

    pub async fn update_teacher(&self, uid: &str, dto: &UpdateTeacherDto) -> DomainResult<()> {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!(dto.name));
        fields.insert("department".into(), json!(dto.department));
        fields.insert("subject".into(), json!(dto.subject));
        self.store.update(USERS, uid, fields).await
    }

    pub async fn delete(&self, uid: &str) -> DomainResult<()> {
        self.store.delete(USERS, uid).await
    }

    pub fn watch_role(&self, role: Role) -> LiveQuery<Profile> {
        LiveQuery::new(
            self.store.clone(),
            ENTITY,
            USERS,
            vec![FieldFilter::eq("role", role.as_str())],
        )
        .with_decoder(decode_profile)
    }

    async fn query(&self, filters: Vec<FieldFilter>) -> DomainResult<Vec<Record<Profile>>> {
        let mut records: Vec<Record<Profile>> = self
            .store
            .query(USERS, &filters)
            .await?
            .into_iter()
            .filter_map(|document| match decode_profile(ENTITY, document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable profile");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| a.data.name.cmp(&b.data.name));
        Ok(records)
    }
}

#[async_trait]
impl ProfileLookup for ProfileRepository {
    async fn find_profile(&self, uid: &str) -> DomainResult<Option<Profile>> {
        self.find(uid).await
    }
}

/// Decode a profile record. Only `role` must be readable; a record with
/// other bad fields is salvaged rather than rejected.
fn decode_profile(entity: &'static str, document: Document) -> DomainResult<Record<Profile>> {
    let id = document.id.clone();
    let salvaged = Profile::salvage(&document.fields);
    match (decode_document(entity, document), salvaged) {
        (Ok(record), _) => Ok(record),
        (Err(e), Some(profile)) => {
            warn!(%id, error = %e, "Profile has unreadable fields; using its role only");
            Ok(Record { id, data: profile })
        }
        (Err(e), None) => Err(e),
    }
}

fn pending_filters() -> Vec<FieldFilter> {
    vec![
        FieldFilter::eq("role", Role::Student.as_str()),
        FieldFilter::eq("isApproved", false),
    ]
}

fn single(key: &str, value: Value) -> Fields {
    let mut fields = Fields::new();
    fields.insert(key.to_string(), value);
    fields
}
