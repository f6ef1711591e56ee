//! Error types for the omnigraph access layer.

use thiserror::Error;

/// Main error type for omnigraph operations.
#[derive(Error, Debug)]
pub enum OmnigraphError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Referential violation: {id} does not resolve to an existing document")]
    ReferentialViolation { id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backing-store errors.
///
/// `AlreadyExists` is raised by provisioning calls that race with another
/// instance; callers that want idempotency treat it as success.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Shared-cache errors. These never propagate out of the cache layer; the
/// tiered cache degrades them to a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Embedding-related errors.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding provider unavailable")]
    Unavailable,

    #[error("API error: {0}")]
    Api(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for omnigraph operations.
pub type Result<T> = std::result::Result<T, OmnigraphError>;

impl OmnigraphError {
    /// Whether this error is a provisioning conflict that idempotent
    /// callers may treat as success.
    pub fn is_conflict(&self) -> bool {
        matches!(self, OmnigraphError::Store(StoreError::AlreadyExists(_)))
    }
}
