//! Backing-store abstraction.
//!
//! [`GraphStore`] is the narrow trait the access layers consume: document
//! and edge collections, named graphs, search views, document CRUD, and
//! execution of typed declarative queries. [`MemoryGraphStore`] is the
//! embedded implementation used for tests and single-process deployments;
//! [`GraphStoreClient`] layers idempotent provisioning on top of any
//! implementation.

mod client;
mod memory;

pub use client::GraphStoreClient;
pub use memory::MemoryGraphStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Whether a collection holds vertex documents or edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Document,
    Edge,
}

/// A persistent index over one or more document fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub fields: Vec<String>,
}

impl IndexSpec {
    /// Index over the given fields.
    pub fn on(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// One edge definition inside a named graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDefinition {
    pub edge_collection: String,
    pub from: Vec<String>,
    pub to: Vec<String>,
}

/// Traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
    Any,
}

/// Where a query draws its candidate rows from.
#[derive(Debug, Clone)]
pub enum QuerySource {
    /// Scan one collection.
    Collection(String),
    /// Scan every collection linked into a search view.
    SearchView(String),
    /// Graph traversal from a start document.
    Traversal {
        start: String,
        graph: String,
        direction: Direction,
        depth: u32,
        /// Also return the edges connecting the returned vertices.
        include_edges: bool,
    },
}

/// A single predicate, or a disjunction of predicates. Top-level filters
/// on a query are ANDed.
#[derive(Debug, Clone)]
pub enum Filter {
    Field {
        /// Dotted path into the document, e.g. `location.country_code`.
        path: String,
        op: FilterOp,
        value: Value,
    },
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: Value) -> Self {
        Filter::Field {
            path: path.into(),
            op: FilterOp::Eq,
            value,
        }
    }

    pub fn ge(path: impl Into<String>, value: Value) -> Self {
        Filter::Field {
            path: path.into(),
            op: FilterOp::Ge,
            value,
        }
    }

    pub fn le(path: impl Into<String>, value: Value) -> Self {
        Filter::Field {
            path: path.into(),
            op: FilterOp::Le,
            value,
        }
    }

    /// Document value is a member of the given array.
    pub fn is_in(path: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::Field {
            path: path.into(),
            op: FilterOp::In,
            value: Value::Array(values),
        }
    }

    /// Case-insensitive substring match on a string field.
    pub fn contains(path: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Field {
            path: path.into(),
            op: FilterOp::Contains,
            value: Value::String(needle.into()),
        }
    }
}

/// Comparison operator of a field filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ge,
    Le,
    In,
    Contains,
}

/// Result ordering.
#[derive(Debug, Clone)]
pub enum Sort {
    /// Order by a document field.
    Field { path: String, descending: bool },
    /// Order by ascending vector distance between a document field and
    /// the query vector. Documents without a vector sort last.
    Distance { path: String, query: Vec<f32> },
}

/// A typed declarative query: source, ANDed filters, optional ordering,
/// optional limit. Values are carried in the structure itself.
#[derive(Debug, Clone)]
pub struct GraphQuery {
    pub source: QuerySource,
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
}

impl GraphQuery {
    /// Query scanning a single collection.
    pub fn over_collection(name: impl Into<String>) -> Self {
        Self {
            source: QuerySource::Collection(name.into()),
            filters: Vec::new(),
            sort: None,
            limit: None,
        }
    }

    /// Query scanning every collection linked into a search view.
    pub fn over_view(name: impl Into<String>) -> Self {
        Self {
            source: QuerySource::SearchView(name.into()),
            filters: Vec::new(),
            sort: None,
            limit: None,
        }
    }

    /// Graph traversal from a start document.
    pub fn traversal(
        start: impl Into<String>,
        graph: impl Into<String>,
        direction: Direction,
        depth: u32,
        include_edges: bool,
    ) -> Self {
        Self {
            source: QuerySource::Traversal {
                start: start.into(),
                graph: graph.into(),
                direction,
                depth,
                include_edges,
            },
            filters: Vec::new(),
            sort: None,
            limit: None,
        }
    }

    /// Add a filter (ANDed with existing ones).
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the ordering.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Cap the number of returned rows.
    pub fn take(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The narrow backing-store interface.
///
/// Provisioning calls raise [`StoreError::AlreadyExists`] on conflict so
/// callers can classify races explicitly instead of swallowing every
/// failure.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn has_collection(&self, name: &str) -> Result<bool, StoreError>;

    async fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), StoreError>;

    /// Idempotent: adding an index that already exists is a no-op.
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), StoreError>;

    async fn create_vector_index(
        &self,
        collection: &str,
        field: &str,
        dimension: usize,
    ) -> Result<(), StoreError>;

    async fn has_graph(&self, name: &str) -> Result<bool, StoreError>;

    async fn create_graph(&self, name: &str) -> Result<(), StoreError>;

    async fn edge_definitions(&self, graph: &str) -> Result<Vec<EdgeDefinition>, StoreError>;

    async fn add_edge_definition(
        &self,
        graph: &str,
        definition: EdgeDefinition,
    ) -> Result<(), StoreError>;

    async fn has_view(&self, name: &str) -> Result<bool, StoreError>;

    async fn create_view(&self, name: &str, links: Vec<String>) -> Result<(), StoreError>;

    async fn view_links(&self, name: &str) -> Result<Vec<String>, StoreError>;

    async fn set_view_links(&self, name: &str, links: Vec<String>) -> Result<(), StoreError>;

    /// Insert a document and return the canonical stored form, including
    /// the assigned `_id`, `_key` and `_rev`.
    async fn insert(&self, collection: &str, document: Value) -> Result<Value, StoreError>;

    /// Fetch one document by key. Absent documents are `None`, not errors.
    async fn fetch(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Field-level merge of `patch` into an existing document. Returns the
    /// authoritative post-merge document with its new revision.
    async fn merge_update(
        &self,
        collection: &str,
        key: &str,
        patch: Value,
    ) -> Result<Value, StoreError>;

    /// Remove a document. `Ok(false)` when it did not exist.
    async fn remove(&self, collection: &str, key: &str) -> Result<bool, StoreError>;

    /// Atomically append `value` to the array at `path` (dotted, may index
    /// into arrays) inside one document, creating the array if the field
    /// is absent. Returns the post-update document.
    async fn push_to_list(
        &self,
        collection: &str,
        key: &str,
        path: &str,
        value: Value,
    ) -> Result<Value, StoreError>;

    /// Execute a typed declarative query.
    async fn execute(&self, query: &GraphQuery) -> Result<Vec<Value>, StoreError>;
}

/// Split a canonical id `"{collection}/{key}"` into its parts.
///
/// Purely syntactic: no existence check is performed. Collection names are
/// case-insensitive and normalized to lower case.
pub fn parse_document_id(id: &str) -> (String, String) {
    let collection = id.split('/').next().unwrap_or(id).to_lowercase();
    let key = id.rsplit('/').next().unwrap_or(id).to_string();
    (collection, key)
}
