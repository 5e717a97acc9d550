use common::crypto::KeyCodec;
use common::domain::{DomainError, DomainResult, KeyedRecord};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Authenticates presented keys against their canonical stored record.
///
/// A key is accepted only when it decodes to an identity, a record of the
/// expected kind exists under that identity, and the record's stored key is
/// exactly the presented one. The last check rejects keys of another entity
/// kind that happen to decode to the same identity, and keys superseded by a
/// newer canonical key.
#[derive(Clone)]
pub struct IdentityValidator {
    codec: Arc<KeyCodec>,
}

impl IdentityValidator {
    pub fn new(codec: Arc<KeyCodec>) -> Self {
        Self { codec }
    }

    /// Validate `presented_key` as a key of kind `R`.
    ///
    /// `lookup` fetches the record of kind `R` with the decoded identity; the
    /// entity kind is bound by the caller, never inferred from the key.
    pub async fn validate<R, F, Fut>(&self, presented_key: &str, lookup: F) -> DomainResult<R>
    where
        R: KeyedRecord,
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = DomainResult<Option<R>>>,
    {
        let id = self.codec.decode(presented_key).map_err(|e| {
            debug!(kind = %R::KIND, error = %e, "rejected undecodable key");
            DomainError::from(e)
        })?;

        let record = lookup(id)
            .await?
            .ok_or_else(|| R::KIND.not_found(id.to_string()))?;

        if record.id() != id {
            debug!(kind = %R::KIND, id, stored_id = record.id(), "lookup returned another identity");
            return Err(DomainError::KeyMismatch(R::KIND));
        }

        if record.key() != presented_key {
            debug!(kind = %R::KIND, id, "presented key differs from canonical key");
            return Err(DomainError::KeyMismatch(R::KIND));
        }

        Ok(record)
    }
}
