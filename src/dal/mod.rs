//! Typed data access over the five entity kinds and relations.
//!
//! [`EntityAccessLayer`] composes three capability components (factory,
//! mutator, destroyer) with the tiered cache and the provisioning
//! client, wired by explicit injection. Construction provisions the
//! entity collections, the entity graph, and the event search view,
//! once and idempotently.

mod destroyer;
mod factory;
mod monitors;
mod mutator;

pub use monitors::MonitorAccessLayer;

pub(crate) use destroyer::EntityDestroyer;
pub(crate) use factory::EntityFactory;
pub(crate) use mutator::EntityMutator;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::cache::TieredCache;
use crate::embedding::EmbeddingProvider;
use crate::error::{OmnigraphError, Result, StoreError};
use crate::model::{
    collections, is_entity_collection, Event, EventData, Organization, OrganizationData, Person,
    PersonData, Record, Relation, RelationData, Source, SourceData, Website, WebsiteData,
    EVENT_RELATED_GRAPH, EVENT_VIEW,
};
use crate::store::{
    parse_document_id, CollectionKind, GraphQuery, GraphStoreClient, IndexSpec,
};

/// Generic cache-through document getter shared by the access layers.
///
/// Absent documents are `Ok(None)`, not errors, including ids naming a
/// collection that was never provisioned. Ids are case-insensitive in
/// their collection part; the cache is keyed by the canonical lowercase
/// form so spelling variants share one entry.
pub(crate) async fn fetch_document(
    client: &GraphStoreClient,
    cache: &TieredCache,
    id: &str,
) -> Result<Option<Value>> {
    let (collection, key) = parse_document_id(id);
    let id = format!("{collection}/{key}");

    if let Some(value) = cache.get(&id).await {
        if value.is_object() {
            return Ok(Some(value));
        }
    }

    let collection = match client.resolve_collection(&collection).await {
        Ok(collection) => collection,
        Err(OmnigraphError::Store(StoreError::CollectionNotFound(_))) => return Ok(None),
        Err(e) => return Err(e),
    };
    match client.store().fetch(&collection, &key).await? {
        Some(doc) => {
            cache.set(&id, doc.clone()).await;
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}

/// Typed CRUD over entities and relations.
pub struct EntityAccessLayer {
    client: Arc<GraphStoreClient>,
    cache: Arc<TieredCache>,
    factory: EntityFactory,
    mutator: EntityMutator,
    destroyer: EntityDestroyer,
}

impl EntityAccessLayer {
    /// Construct the layer and provision its schema objects.
    pub async fn new(
        client: Arc<GraphStoreClient>,
        cache: Arc<TieredCache>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        client
            .ensure_collection(
                collections::PERSON,
                CollectionKind::Document,
                &[IndexSpec::on(&["name"])],
                true,
            )
            .await?;
        client
            .ensure_collection(
                collections::ORGANIZATION,
                CollectionKind::Document,
                &[IndexSpec::on(&["name"]), IndexSpec::on(&["type"])],
                true,
            )
            .await?;
        client
            .ensure_collection(
                collections::WEBSITE,
                CollectionKind::Document,
                &[IndexSpec::on(&["url"])],
                true,
            )
            .await?;
        client
            .ensure_collection(
                collections::SOURCE,
                CollectionKind::Document,
                &[IndexSpec::on(&["url"]), IndexSpec::on(&["type"])],
                true,
            )
            .await?;
        client
            .ensure_collection(
                collections::EVENT,
                CollectionKind::Document,
                &[
                    IndexSpec::on(&["happened_at"]),
                    IndexSpec::on(&["location.country_code"]),
                ],
                true,
            )
            .await?;

        client
            .ensure_graph(EVENT_RELATED_GRAPH, |from, to| {
                is_entity_collection(from) && is_entity_collection(to)
            })
            .await?;

        client.ensure_view(EVENT_VIEW, &[collections::EVENT]).await?;
        client.attach_to_view_when(EVENT_VIEW, |from, to| {
            from == collections::EVENT && to == collections::EVENT
        });

        Ok(Self {
            factory: EntityFactory::new(client.clone(), cache.clone(), embedder),
            mutator: EntityMutator::new(client.clone(), cache.clone()),
            destroyer: EntityDestroyer::new(client.clone(), cache.clone()),
            client,
            cache,
        })
    }

    // ========================================================================
    // Create
    // ========================================================================

    pub async fn create_person(&self, data: &PersonData, owner: &str) -> Result<Person> {
        self.factory.create(data, owner).await
    }

    pub async fn create_organization(
        &self,
        data: &OrganizationData,
        owner: &str,
    ) -> Result<Organization> {
        self.factory.create(data, owner).await
    }

    pub async fn create_website(&self, data: &WebsiteData, owner: &str) -> Result<Website> {
        self.factory.create(data, owner).await
    }

    pub async fn create_source(&self, data: &SourceData, owner: &str) -> Result<Source> {
        self.factory.create(data, owner).await
    }

    pub async fn create_event(&self, data: &EventData, owner: &str) -> Result<Event> {
        self.factory.create(data, owner).await
    }

    pub async fn create_relation(&self, data: &RelationData, owner: &str) -> Result<Relation> {
        self.factory.create_relation(data, owner).await
    }

    // ========================================================================
    // Read
    // ========================================================================

    pub async fn get_person(&self, id: &str) -> Result<Option<Person>> {
        self.get_typed(id).await
    }

    pub async fn get_organization(&self, id: &str) -> Result<Option<Organization>> {
        self.get_typed(id).await
    }

    pub async fn get_website(&self, id: &str) -> Result<Option<Website>> {
        self.get_typed(id).await
    }

    pub async fn get_source(&self, id: &str) -> Result<Option<Source>> {
        self.get_typed(id).await
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>> {
        self.get_typed(id).await
    }

    pub async fn get_relation(&self, id: &str) -> Result<Option<Relation>> {
        self.get_typed(id).await
    }

    /// Raw cache-through getter; the bridge used by permission checks and
    /// the view layer.
    pub async fn get_document(&self, id: &str) -> Result<Option<Value>> {
        fetch_document(&self.client, &self.cache, id).await
    }

    async fn get_typed<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        match self.get_document(id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Update
    // ========================================================================

    pub async fn update_person(&self, id: &str, patch: Value) -> Result<Person> {
        self.mutator.update(id, patch).await
    }

    pub async fn update_organization(&self, id: &str, patch: Value) -> Result<Organization> {
        self.mutator.update(id, patch).await
    }

    pub async fn update_website(&self, id: &str, patch: Value) -> Result<Website> {
        self.mutator.update(id, patch).await
    }

    pub async fn update_source(&self, id: &str, patch: Value) -> Result<Source> {
        self.mutator.update(id, patch).await
    }

    pub async fn update_event(&self, id: &str, patch: Value) -> Result<Event> {
        self.mutator.update(id, patch).await
    }

    pub async fn update_relation(&self, id: &str, patch: Value) -> Result<Relation> {
        self.mutator.update(id, patch).await
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Delete an entity or relation by id. `Ok(false)` when it did not
    /// exist.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.destroyer.delete(id).await
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// Execute a declarative query and map each row by structural shape:
    /// rows with both edge endpoints become relations, rows with a self
    /// id dispatch on their collection prefix, anything else is dropped.
    pub async fn query(&self, query: &GraphQuery) -> Result<Vec<Record>> {
        let rows = self.client.store().execute(query).await?;
        Ok(rows.into_iter().filter_map(map_row).collect())
    }

    /// Best-effort embedding of arbitrary text, for query construction.
    pub async fn embed_text(&self, text: &str) -> Option<Vec<f32>> {
        self.factory.embed(text).await
    }

    pub(crate) fn client(&self) -> &Arc<GraphStoreClient> {
        &self.client
    }

    pub(crate) fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }
}

fn map_row(row: Value) -> Option<Record> {
    let obj = row.as_object()?;

    if obj.contains_key("_from") && obj.contains_key("_to") {
        return deserialize_row(row).map(Record::Relation);
    }

    let id = obj.get("_id")?.as_str()?;
    let (collection, _) = parse_document_id(id);
    match collection.as_str() {
        collections::PERSON => deserialize_row(row).map(Record::Person),
        collections::ORGANIZATION => deserialize_row(row).map(Record::Organization),
        collections::WEBSITE => deserialize_row(row).map(Record::Website),
        collections::SOURCE => deserialize_row(row).map(Record::Source),
        collections::EVENT => deserialize_row(row).map(Record::Event),
        other => {
            debug!(collection = %other, "dropping query row from unmapped collection");
            None
        }
    }
}

fn deserialize_row<T: DeserializeOwned>(row: Value) -> Option<T> {
    match serde_json::from_value(row) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "dropping undeserializable query row");
            None
        }
    }
}
