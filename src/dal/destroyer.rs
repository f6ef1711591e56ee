//! Deletion path: remove from the store, expel the cache entry.

use std::sync::Arc;

use tracing::error;

use crate::cache::TieredCache;
use crate::error::{OmnigraphError, Result, StoreError};
use crate::store::{parse_document_id, GraphStoreClient};

pub(crate) struct EntityDestroyer {
    client: Arc<GraphStoreClient>,
    cache: Arc<TieredCache>,
}

impl EntityDestroyer {
    pub(crate) fn new(client: Arc<GraphStoreClient>, cache: Arc<TieredCache>) -> Self {
        Self { client, cache }
    }

    /// Delete one document. `Ok(false)` when it did not exist; store
    /// failures propagate like every other mutation.
    pub(crate) async fn delete(&self, id: &str) -> Result<bool> {
        let (collection, key) = parse_document_id(id);
        // Cache keys use the canonical lowercase-collection id.
        let canonical = format!("{collection}/{key}");
        let collection = match self.client.resolve_collection(&collection).await {
            Ok(collection) => collection,
            Err(OmnigraphError::Store(StoreError::CollectionNotFound(_))) => {
                self.cache.expel(&canonical).await;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let removed = match self.client.store().remove(&collection, &key).await {
            Ok(removed) => removed,
            Err(e) => {
                error!(id = %id, error = %e, "delete failed");
                return Err(e.into());
            }
        };

        // Expel unconditionally: a cache entry must never outlive a
        // deletion.
        self.cache.expel(&canonical).await;
        Ok(removed)
    }
}
