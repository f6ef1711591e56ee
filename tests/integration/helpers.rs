//! Shared fixtures: the embedded stack and a deterministic embedder.

use std::sync::Arc;

use async_trait::async_trait;

use omnigraph::cache::{MemorySharedCache, TieredCache};
use omnigraph::config::CacheConfig;
use omnigraph::dal::EntityAccessLayer;
use omnigraph::embedding::{EmbeddingProvider, NullEmbedder};
use omnigraph::error::EmbeddingError;
use omnigraph::model::{EventData, Location, PersonData, RelationData};
use omnigraph::store::{GraphStoreClient, MemoryGraphStore};

pub const DIMENSION: usize = 16;

/// Deterministic bag-of-words embedder: each token hashes into one of
/// the vector's buckets, so token overlap between texts translates into
/// vector similarity. Good enough to make ranking observable.
pub struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; DIMENSION];
        for token in text.split_whitespace() {
            let mut hash: usize = 0;
            for byte in token.to_lowercase().bytes() {
                hash = hash.wrapping_mul(31).wrapping_add(byte as usize);
            }
            vector[hash % DIMENSION] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

pub struct Stack {
    pub store: Arc<MemoryGraphStore>,
    pub client: Arc<GraphStoreClient>,
    pub cache: Arc<TieredCache>,
    pub entities: Arc<EntityAccessLayer>,
    pub embedder: Arc<dyn EmbeddingProvider>,
}

pub async fn stack_with(embedder: Arc<dyn EmbeddingProvider>) -> Stack {
    let store = Arc::new(MemoryGraphStore::new());
    let client = Arc::new(GraphStoreClient::new(store.clone(), DIMENSION));
    let cache = Arc::new(TieredCache::new(
        &CacheConfig::default(),
        Arc::new(MemorySharedCache::new()),
    ));
    let entities = Arc::new(
        EntityAccessLayer::new(client.clone(), cache.clone(), embedder.clone())
            .await
            .unwrap(),
    );
    Stack {
        store,
        client,
        cache,
        entities,
        embedder,
    }
}

/// Stack without a working embedding provider, like most deployments.
pub async fn stack() -> Stack {
    stack_with(Arc::new(NullEmbedder::new(DIMENSION))).await
}

pub fn person(name: &str) -> PersonData {
    PersonData {
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn event(title: &str, country: &str, happened_at: i64) -> EventData {
    EventData {
        title: title.to_string(),
        happened_at,
        location: Location {
            country_code: country.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn relation(name: &str, from_id: &str, to_id: &str) -> RelationData {
    RelationData {
        name: name.to_string(),
        from_id: from_id.to_string(),
        to_id: to_id.to_string(),
        ..Default::default()
    }
}
