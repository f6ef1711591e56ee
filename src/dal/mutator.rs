//! Mutation path: field-level merge in the store, then overwrite the
//! cache entry with the authoritative post-merge document.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

use crate::cache::TieredCache;
use crate::error::{Result, StoreError};
use crate::store::{parse_document_id, GraphStoreClient};

pub(crate) struct EntityMutator {
    client: Arc<GraphStoreClient>,
    cache: Arc<TieredCache>,
}

impl EntityMutator {
    pub(crate) fn new(client: Arc<GraphStoreClient>, cache: Arc<TieredCache>) -> Self {
        Self { client, cache }
    }

    pub(crate) async fn update<T: DeserializeOwned>(&self, id: &str, patch: Value) -> Result<T> {
        let merged = self.update_raw(id, patch).await?;
        Ok(serde_json::from_value(merged)?)
    }

    /// Send only the explicitly-set fields; the store's merged document,
    /// not the input, becomes both the cache entry and the return value.
    pub(crate) async fn update_raw(&self, id: &str, patch: Value) -> Result<Value> {
        if !patch.is_object() {
            return Err(StoreError::InvalidOperation(
                "update patch must be an object".to_string(),
            )
            .into());
        }

        let (collection, key) = parse_document_id(id);
        let collection = self.client.resolve_collection(&collection).await?;
        let merged = match self
            .client
            .store()
            .merge_update(&collection, &key, patch)
            .await
        {
            Ok(doc) => doc,
            Err(e) => {
                error!(id = %id, error = %e, "update failed");
                return Err(e.into());
            }
        };

        let canonical_id = merged
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or(id)
            .to_string();
        self.cache.set(&canonical_id, merged.clone()).await;
        Ok(merged)
    }
}
