//! Embedding collaborator trait.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Text-to-vector provider.
///
/// Failures are treated as "unavailable" by the access layers: embeddings
/// are enrichment, never a prerequisite for a write.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of the vectors this provider produces.
    fn dimension(&self) -> usize;
}

/// Provider used when no embedding service is configured; every request
/// reports unavailability.
pub struct NullEmbedder {
    dimension: usize,
}

impl NullEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Unavailable)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
