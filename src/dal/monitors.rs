//! Access layer for monitoring sources.
//!
//! Same component wiring as the entity layer, scoped to one collection
//! and without vector enrichment.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::cache::TieredCache;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::model::{collections, MonitoringSource, MonitoringSourceData};
use crate::store::{CollectionKind, Filter, GraphQuery, GraphStoreClient, IndexSpec};

use super::{fetch_document, EntityDestroyer, EntityFactory, EntityMutator};

pub struct MonitorAccessLayer {
    client: Arc<GraphStoreClient>,
    cache: Arc<TieredCache>,
    factory: EntityFactory,
    mutator: EntityMutator,
    destroyer: EntityDestroyer,
}

impl MonitorAccessLayer {
    pub async fn new(
        client: Arc<GraphStoreClient>,
        cache: Arc<TieredCache>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        client
            .ensure_collection(
                collections::MONITORING_SOURCE,
                CollectionKind::Document,
                &[
                    IndexSpec::on(&["name"]),
                    IndexSpec::on(&["type"]),
                    IndexSpec::on(&["user_id"]),
                ],
                false,
            )
            .await?;

        Ok(Self {
            factory: EntityFactory::new(client.clone(), cache.clone(), embedder),
            mutator: EntityMutator::new(client.clone(), cache.clone()),
            destroyer: EntityDestroyer::new(client.clone(), cache.clone()),
            client,
            cache,
        })
    }

    pub async fn create(
        &self,
        data: &MonitoringSourceData,
        owner: &str,
    ) -> Result<MonitoringSource> {
        self.factory.create(data, owner).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<MonitoringSource>> {
        match fetch_document(&self.client, &self.cache, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn update(&self, id: &str, patch: Value) -> Result<MonitoringSource> {
        self.mutator.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.destroyer.delete(id).await
    }

    /// All monitoring sources belonging to one user.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<MonitoringSource>> {
        let query = GraphQuery::over_collection(collections::MONITORING_SOURCE)
            .filter(Filter::eq("user_id", json!(user_id)));
        let rows = self.client.store().execute(&query).await?;
        let mut sources = Vec::with_capacity(rows.len());
        for row in rows {
            sources.push(serde_json::from_value(row)?);
        }
        Ok(sources)
    }
}
