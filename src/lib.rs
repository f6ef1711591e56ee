//! Omnigraph: typed access layer over a graph-backed entity store.
//!
//! CRUD for OSINT entity kinds and relations, a two-tier cache, embedded
//! document permissions, saved views with boundary-checked entity
//! references, and hybrid query tools combining filters, vector ranking
//! and graph traversal.

pub mod acl;
pub mod cache;
pub mod config;
pub mod dal;
pub mod embedding;
pub mod error;
pub mod model;
pub mod query;
pub mod store;
pub mod views;

pub use acl::PermissionEvaluator;
pub use cache::{MemorySharedCache, SharedCache, TieredCache};
pub use config::{CacheConfig, Config, StoreConfig};
pub use dal::{EntityAccessLayer, MonitorAccessLayer};
pub use embedding::{EmbeddingProvider, NullEmbedder};
pub use error::{
    CacheError, ConfigError, EmbeddingError, OmnigraphError, Result, StoreError,
};
pub use model::{
    AclFields, DocumentMeta, Event, EventData, Location, MonitoringSource, MonitoringSourceData,
    Organization, OrganizationData, Person, PersonData, Record, Relation, RelationData, Source,
    SourceData, View, ViewConfig, ViewData, ViewMode, ViewUi, Website, WebsiteData,
};
pub use query::{EventSearchParams, QueryTools};
pub use store::{
    Direction, Filter, GraphQuery, GraphStore, GraphStoreClient, MemoryGraphStore, Sort,
};
pub use views::ViewAccessLayer;
