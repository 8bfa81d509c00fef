//! JSON snapshot of the in-memory backend
//!
//! Lets one-shot processes (the CLI) keep accounts, documents and the
//! signed-in session between runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::identity::{Account, InMemoryIdentity};
use super::storage::{CollectionsDump, InMemoryDocumentStore};
use crate::domain::Session;
use crate::support::InfraError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub documents: CollectionsDump,
}

impl BackendSnapshot {
    pub fn capture(identity: &InMemoryIdentity, store: &InMemoryDocumentStore) -> Self {
        use crate::domain::IdentityService;

        Self {
            accounts: identity.accounts(),
            session: identity.current_session(),
            documents: store.dump(),
        }
    }

    pub fn into_backend(self, password_cost: u32) -> (InMemoryIdentity, InMemoryDocumentStore) {
        (
            InMemoryIdentity::restore(self.accounts, self.session, password_cost),
            InMemoryDocumentStore::restore(self.documents),
        )
    }

    /// Load a snapshot; a missing file is an empty backend.
    pub async fn load(path: &Path) -> Result<Self, InfraError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let snapshot: Self = serde_json::from_slice(&bytes)?;
                debug!(
                    path = %path.display(),
                    accounts = snapshot.accounts.len(),
                    "Snapshot loaded"
                );
                Ok(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No snapshot yet; starting empty");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write atomically: temp file, then rename.
    pub async fn save(&self, path: &Path) -> Result<(), InfraError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), "Snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{encode_fields, DocumentStore, IdentityService, Profile};

    #[tokio::test]
    async fn test_capture_save_load_restore() {
        let identity = InMemoryIdentity::with_password_cost(4);
        let store = InMemoryDocumentStore::new();
        let session = identity.sign_up("ann@example.com", "secret1").await.unwrap();
        store
            .set(
                "users",
                &session.uid,
                encode_fields(&Profile::student("Ann", "ann@example.com")).unwrap(),
            )
            .await
            .unwrap();

        let dir = std::env::temp_dir().join(format!("portal-snapshot-{}", uuid::Uuid::new_v4()));
        let path = dir.join("state.json");

        BackendSnapshot::capture(&identity, &store).save(&path).await.unwrap();
        let loaded = BackendSnapshot::load(&path).await.unwrap();
        let (identity, store) = loaded.into_backend(4);

        assert_eq!(identity.current_session(), Some(session.clone()));
        assert!(store.get("users", &session.uid).await.unwrap().is_some());
        assert!(identity.sign_in("ann@example.com", "secret1").await.is_ok());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let path = std::env::temp_dir().join(format!("portal-missing-{}.json", uuid::Uuid::new_v4()));
        assert_eq!(BackendSnapshot::load(&path).await.unwrap(), BackendSnapshot::default());
    }
}
