//! Provisioning facade over a [`GraphStore`].
//!
//! All schema objects (collections, indexes, graphs, search views) are
//! created idempotently: conflict races with other instances are
//! classified via [`StoreError::AlreadyExists`] and treated as success,
//! while genuine failures propagate. Nothing is ever retried.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{parse_document_id, CollectionKind, EdgeDefinition, GraphStore, IndexSpec};
use crate::error::{Result, StoreError};

type MembershipPredicate = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// One `(name, predicate)` membership rule, evaluated against the
/// `(from, to)` collections of every edge collection being provisioned.
struct MembershipRule {
    name: String,
    applies: MembershipPredicate,
}

/// Client owning the store handle and the provisioning state.
///
/// One instance is constructed per process and shared by every access
/// layer.
pub struct GraphStoreClient {
    store: Arc<dyn GraphStore>,
    embedding_dimension: usize,
    known_collections: RwLock<HashSet<String>>,
    graph_rules: RwLock<Vec<MembershipRule>>,
    view_rules: RwLock<Vec<MembershipRule>>,
}

impl GraphStoreClient {
    pub fn new(store: Arc<dyn GraphStore>, embedding_dimension: usize) -> Self {
        Self {
            store,
            embedding_dimension,
            known_collections: RwLock::new(HashSet::new()),
            graph_rules: RwLock::new(Vec::new()),
            view_rules: RwLock::new(Vec::new()),
        }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Idempotently create a collection with its indexes.
    ///
    /// Vector-index creation is best-effort: some deployments lack vector
    /// support and that must not block startup, so failures are logged
    /// and swallowed.
    pub async fn ensure_collection(
        &self,
        name: &str,
        kind: CollectionKind,
        indexes: &[IndexSpec],
        wants_vector_index: bool,
    ) -> Result<String> {
        let name = name.to_lowercase();
        if !self.store.has_collection(&name).await? {
            match self.store.create_collection(&name, kind).await {
                Ok(()) => {}
                Err(StoreError::AlreadyExists(_)) => {
                    debug!(collection = %name, "collection created concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        for index in indexes {
            match self.store.create_index(&name, index).await {
                Ok(()) | Err(StoreError::AlreadyExists(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        if wants_vector_index {
            match self
                .store
                .create_vector_index(&name, "embedding", self.embedding_dimension)
                .await
            {
                Ok(()) | Err(StoreError::AlreadyExists(_)) => {}
                Err(e) => {
                    warn!(collection = %name, error = %e, "vector index creation failed; continuing without vector search");
                }
            }
        }

        self.known_collections.write().insert(name.clone());
        Ok(name)
    }

    /// Idempotently create a named graph and register its membership
    /// predicate. The predicate is evaluated against every edge
    /// collection provisioned afterwards; multiple graphs may claim the
    /// same edge collection independently.
    pub async fn ensure_graph(
        &self,
        graph: &str,
        applies: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> Result<()> {
        if !self.store.has_graph(graph).await? {
            match self.store.create_graph(graph).await {
                Ok(()) | Err(StoreError::AlreadyExists(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.graph_rules.write().push(MembershipRule {
            name: graph.to_string(),
            applies: Box::new(applies),
        });
        Ok(())
    }

    /// Idempotently create a search view with its initial collection
    /// links. Linking into an existing view is a read-modify-write of its
    /// link set.
    pub async fn ensure_view(&self, view: &str, initial_links: &[&str]) -> Result<()> {
        if !self.store.has_view(view).await? {
            let links = initial_links.iter().map(|l| l.to_string()).collect();
            match self.store.create_view(view, links).await {
                Ok(()) => return Ok(()),
                Err(StoreError::AlreadyExists(_)) => {
                    debug!(view = %view, "view created concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }
        for link in initial_links {
            self.add_to_view(view, link).await?;
        }
        Ok(())
    }

    /// Register a membership predicate that links matching edge
    /// collections into an existing search view.
    pub fn attach_to_view_when(
        &self,
        view: &str,
        applies: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) {
        self.view_rules.write().push(MembershipRule {
            name: view.to_string(),
            applies: Box::new(applies),
        });
    }

    /// Resolve a collection by name, lazily memoized.
    pub async fn resolve_collection(&self, name: &str) -> Result<String> {
        let name = name.to_lowercase();
        if self.known_collections.read().contains(&name) {
            return Ok(name);
        }
        if self.store.has_collection(&name).await? {
            self.known_collections.write().insert(name.clone());
            Ok(name)
        } else {
            Err(StoreError::CollectionNotFound(name).into())
        }
    }

    /// Edge collection for one relation type between two collections:
    /// deterministic name `{from}_{relation}_{to}`, auto-provisioned and
    /// attached to every graph and view whose predicate matches.
    pub async fn edge_collection_for(
        &self,
        relation: &str,
        from_collection: &str,
        to_collection: &str,
    ) -> Result<String> {
        let from = from_collection.to_lowercase();
        let to = to_collection.to_lowercase();
        let name = format!("{from}_{relation}_{to}").to_lowercase();
        self.ensure_collection(&name, CollectionKind::Edge, &[], false)
            .await?;

        let graphs: Vec<String> = self
            .graph_rules
            .read()
            .iter()
            .filter(|rule| (rule.applies)(&from, &to))
            .map(|rule| rule.name.clone())
            .collect();
        for graph in graphs {
            self.ensure_in_graph(&graph, &name, &from, &to).await?;
        }

        let views: Vec<String> = self
            .view_rules
            .read()
            .iter()
            .filter(|rule| (rule.applies)(&from, &to))
            .map(|rule| rule.name.clone())
            .collect();
        for view in views {
            self.add_to_view(&view, &name).await?;
        }

        Ok(name)
    }

    /// Split a canonical id into `(collection, key)`. Purely syntactic.
    pub fn parse_document_id(&self, id: &str) -> (String, String) {
        parse_document_id(id)
    }

    async fn ensure_in_graph(
        &self,
        graph: &str,
        edge_collection: &str,
        from: &str,
        to: &str,
    ) -> Result<()> {
        let definitions = self.store.edge_definitions(graph).await?;
        if definitions
            .iter()
            .any(|d| d.edge_collection == edge_collection)
        {
            return Ok(());
        }
        let definition = EdgeDefinition {
            edge_collection: edge_collection.to_string(),
            from: vec![from.to_string()],
            to: vec![to.to_string()],
        };
        match self.store.add_edge_definition(graph, definition).await {
            Ok(()) | Err(StoreError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn add_to_view(&self, view: &str, collection: &str) -> Result<()> {
        let mut links = self.store.view_links(view).await?;
        if !links.iter().any(|l| l == collection) {
            links.push(collection.to_string());
            self.store.set_view_links(view, links).await?;
        }
        Ok(())
    }
}
