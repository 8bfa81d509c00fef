use async_trait::async_trait;

use super::Profile;
use crate::domain::DomainResult;

/// Profile lookup by identity-service uid.
///
/// `Ok(None)` means the record is genuinely absent; a failed lookup is an
/// `Err`.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn find_profile(&self, uid: &str) -> DomainResult<Option<Profile>>;
}
