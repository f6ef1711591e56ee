//! View access layer: saved bundles of entity references.
//!
//! Views hold display configs whose entity ids are verified against the
//! store at mutation time. A missing referenced entity aborts the whole
//! mutation before anything is written; integrity is checked at the
//! boundary, never maintained afterwards.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::error;

use crate::cache::TieredCache;
use crate::dal::{
    fetch_document, EntityAccessLayer, EntityDestroyer, EntityFactory, EntityMutator,
};
use crate::embedding::EmbeddingProvider;
use crate::error::{OmnigraphError, Result, StoreError};
use crate::model::{
    collections, now_ms, Record, RelationData, View, ViewConfig, ViewData, VIEW_GRAPH,
};
use crate::store::{
    parse_document_id, CollectionKind, Direction, Filter, GraphQuery, GraphStoreClient, IndexSpec,
};

/// The relation type linking a view to an entity it includes.
const INCLUDES: &str = "includes";

pub struct ViewAccessLayer {
    entities: Arc<EntityAccessLayer>,
    client: Arc<GraphStoreClient>,
    cache: Arc<TieredCache>,
    factory: EntityFactory,
    mutator: EntityMutator,
    destroyer: EntityDestroyer,
}

impl ViewAccessLayer {
    pub async fn new(
        entities: Arc<EntityAccessLayer>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let client = entities.client().clone();
        let cache = entities.cache().clone();

        client
            .ensure_collection(
                collections::VIEW,
                CollectionKind::Document,
                &[IndexSpec::on(&["name"]), IndexSpec::on(&["description"])],
                false,
            )
            .await?;
        client
            .ensure_graph(VIEW_GRAPH, |from, _to| from == collections::VIEW)
            .await?;

        Ok(Self {
            factory: EntityFactory::new(client.clone(), cache.clone(), embedder),
            mutator: EntityMutator::new(client.clone(), cache.clone()),
            destroyer: EntityDestroyer::new(client.clone(), cache.clone()),
            entities,
            client,
            cache,
        })
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Create a view. Entity ids referenced by any initial config must
    /// already exist.
    pub async fn create_view(&self, data: &ViewData, owner: &str) -> Result<View> {
        for config in &data.configs {
            self.verify_entities_exist(&config.entities).await?;
        }
        self.factory.create(data, owner).await
    }

    pub async fn get_view(&self, id: &str) -> Result<Option<View>> {
        match fetch_document(&self.client, &self.cache, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Merge a patch into a view. A patch replacing `configs` goes
    /// through the same entity verification as `add_config`; a dangling
    /// reference aborts before anything is written.
    pub async fn update_view(&self, id: &str, patch: Value) -> Result<View> {
        if let Some(configs) = patch.get("configs").and_then(Value::as_array) {
            for config in configs {
                let ids: Vec<String> = config
                    .get("entities")
                    .and_then(Value::as_array)
                    .map(|entities| {
                        entities
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                self.verify_entities_exist(&ids).await?;
            }
        }
        self.mutator.update(id, patch).await
    }

    pub async fn delete_view(&self, id: &str) -> Result<bool> {
        self.destroyer.delete(id).await
    }

    // ========================================================================
    // Config and membership mutation
    // ========================================================================

    /// Append a display config to a view.
    ///
    /// Every entity id the config references is verified against the
    /// store first; one missing id aborts with a referential violation
    /// and the view is left untouched.
    pub async fn add_config(&self, view_id: &str, config: &ViewConfig) -> Result<View> {
        self.verify_entities_exist(&config.entities).await?;

        let (collection, key) = parse_document_id(view_id);
        let collection = self.client.resolve_collection(&collection).await?;
        let updated = match self
            .client
            .store()
            .push_to_list(&collection, &key, "configs", serde_json::to_value(config)?)
            .await
        {
            Ok(doc) => doc,
            Err(e) => {
                error!(view = %view_id, error = %e, "adding view config failed");
                return Err(e.into());
            }
        };

        let canonical_id = updated
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or(view_id)
            .to_string();
        self.cache.set(&canonical_id, updated.clone()).await;
        Ok(serde_json::from_value(updated)?)
    }

    /// Connect one entity to a view.
    ///
    /// With a config index the entity id is appended to that config's
    /// entity list; without one an `includes` edge is created in the view
    /// graph, owned by the view's owner.
    pub async fn connect_entity_to_view(
        &self,
        view_id: &str,
        entity_id: &str,
        config_index: Option<usize>,
    ) -> Result<()> {
        self.verify_entities_exist(&[entity_id.to_string()]).await?;

        match config_index {
            Some(index) => {
                let (collection, key) = parse_document_id(view_id);
                let collection = self.client.resolve_collection(&collection).await?;
                let updated = self
                    .client
                    .store()
                    .push_to_list(
                        &collection,
                        &key,
                        &format!("configs.{index}.entities"),
                        json!(entity_id),
                    )
                    .await?;
                let canonical_id = updated
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or(view_id)
                    .to_string();
                self.cache.set(&canonical_id, updated).await;
            }
            None => {
                let view = self
                    .get_view(view_id)
                    .await?
                    .ok_or_else(|| OmnigraphError::ReferentialViolation {
                        id: view_id.to_string(),
                    })?;
                let now = now_ms();
                let relation = RelationData {
                    name: INCLUDES.to_string(),
                    label: INCLUDES.to_string(),
                    confidence: 100,
                    created_at: now,
                    updated_at: now,
                    attributes: Default::default(),
                    from_id: view.meta.id.clone(),
                    to_id: entity_id.to_string(),
                };
                self.entities
                    .create_relation(&relation, &view.acl.owner)
                    .await?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Retrieval
    // ========================================================================

    /// Entities connected to a view through `includes` edges.
    pub async fn get_entities(&self, view_id: &str) -> Result<Vec<Record>> {
        let query = GraphQuery::traversal(view_id, VIEW_GRAPH, Direction::Outbound, 1, false);
        self.entities.query(&query).await
    }

    /// Case-insensitive text search over an owner's views by name or
    /// description.
    pub async fn query_views(&self, text: &str, owner: &str, limit: usize) -> Result<Vec<View>> {
        let query = GraphQuery::over_collection(collections::VIEW)
            .filter(Filter::eq("owner", json!(owner)))
            .filter(Filter::Or(vec![
                Filter::contains("name", text),
                Filter::contains("description", text),
            ]))
            .take(limit);
        let rows = self.client.store().execute(&query).await?;
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(serde_json::from_value(row)?);
        }
        Ok(views)
    }

    /// Verify that each id resolves to an existing document, reading the
    /// store directly so a stale cache entry can never mask a deletion.
    async fn verify_entities_exist(&self, ids: &[String]) -> Result<()> {
        for id in ids {
            let (collection, key) = parse_document_id(id);
            let collection = match self.client.resolve_collection(&collection).await {
                Ok(collection) => collection,
                Err(OmnigraphError::Store(StoreError::CollectionNotFound(_))) => {
                    return Err(OmnigraphError::ReferentialViolation { id: id.clone() });
                }
                Err(e) => return Err(e),
            };
            if self.client.store().fetch(&collection, &key).await?.is_none() {
                return Err(OmnigraphError::ReferentialViolation { id: id.clone() });
            }
        }
        Ok(())
    }
}
