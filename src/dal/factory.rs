//! Creation path: embed, insert, rebuild from the store's canonical
//! document, write through the cache.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use crate::cache::TieredCache;
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, StoreError};
use crate::model::{EntityDraft, Relation, RelationData, StoredEntity};
use crate::store::{parse_document_id, GraphStoreClient};

pub(crate) struct EntityFactory {
    client: Arc<GraphStoreClient>,
    cache: Arc<TieredCache>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EntityFactory {
    pub(crate) fn new(
        client: Arc<GraphStoreClient>,
        cache: Arc<TieredCache>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            client,
            cache,
            embedder,
        }
    }

    /// Create one document of a stored kind.
    ///
    /// The returned value is rebuilt from the store's canonical inserted
    /// document, which carries the assigned id, key and revision.
    pub(crate) async fn create<D: EntityDraft>(&self, data: &D, owner: &str) -> Result<D::Output> {
        let collection = self
            .client
            .resolve_collection(<D::Output as StoredEntity>::COLLECTION)
            .await?;

        let mut doc = serde_json::to_value(data)?;
        let obj = doc.as_object_mut().ok_or_else(|| {
            StoreError::InvalidOperation("entity payload must serialize to an object".to_string())
        })?;
        obj.insert("owner".to_string(), json!(owner));
        obj.insert("read".to_string(), json!([]));
        obj.insert("write".to_string(), json!([]));

        if let Some(text) = data.search_text() {
            if let Some(vector) = self.embed(&text).await {
                obj.insert("embedding".to_string(), json!(vector));
            }
        }

        let stored = self.client.store().insert(&collection, doc).await?;
        self.write_through(&stored).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Create a relation in its deterministic edge collection; graph and
    /// view attachment happen as part of edge-collection provisioning.
    pub(crate) async fn create_relation(
        &self,
        data: &RelationData,
        owner: &str,
    ) -> Result<Relation> {
        let (from_collection, _) = parse_document_id(&data.from_id);
        let (to_collection, _) = parse_document_id(&data.to_id);
        let edge_collection = self
            .client
            .edge_collection_for(&data.name, &from_collection, &to_collection)
            .await?;

        let mut doc = serde_json::to_value(data)?;
        let obj = doc.as_object_mut().ok_or_else(|| {
            StoreError::InvalidOperation("relation payload must serialize to an object".to_string())
        })?;
        obj.insert("owner".to_string(), json!(owner));
        obj.insert("read".to_string(), json!([]));
        obj.insert("write".to_string(), json!([]));

        let stored = self.client.store().insert(&edge_collection, doc).await?;
        self.write_through(&stored).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Best-effort embedding: failures are logged and tolerated, the
    /// document then simply has no vector-search relevance.
    pub(crate) async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.embedder.embed(text).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(error = %e, "embedding generation failed; document will not be vector-searchable");
                None
            }
        }
    }

    async fn write_through(&self, stored: &Value) -> Result<()> {
        let id = stored
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Backend("insert returned a document without _id".to_string()))?;
        self.cache.set(id, stored.clone()).await;
        Ok(())
    }
}
