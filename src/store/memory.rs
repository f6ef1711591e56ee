//! Embedded in-process implementation of [`GraphStore`].
//!
//! Used by tests and single-process deployments. Documents live in hash
//! maps behind a read-write lock; revisions are a process-wide counter.
//! Fetches and query executions are counted so read-through caching is
//! observable from the outside.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};

use super::{
    parse_document_id, CollectionKind, Direction, EdgeDefinition, Filter, FilterOp, GraphQuery,
    GraphStore, IndexSpec, QuerySource, Sort,
};
use crate::error::StoreError;

#[derive(Debug)]
struct Collection {
    kind: CollectionKind,
    docs: HashMap<String, Value>,
    indexes: Vec<Vec<String>>,
    vector_index: Option<(String, usize)>,
}

impl Collection {
    fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            docs: HashMap::new(),
            indexes: Vec::new(),
            vector_index: None,
        }
    }
}

#[derive(Debug, Default)]
struct Graph {
    edge_definitions: Vec<EdgeDefinition>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    graphs: HashMap<String, Graph>,
    views: HashMap<String, Vec<String>>,
}

/// In-memory graph store.
pub struct MemoryGraphStore {
    inner: RwLock<Inner>,
    vector_support: bool,
    rev_counter: AtomicU64,
    fetch_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl MemoryGraphStore {
    /// Store with vector-index support.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            vector_support: true,
            rev_counter: AtomicU64::new(1),
            fetch_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
        }
    }

    /// Store that rejects vector-index creation, like deployments without
    /// vector search.
    pub fn without_vector_support() -> Self {
        Self {
            vector_support: false,
            ..Self::new()
        }
    }

    /// Number of point fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(AtomicOrdering::Relaxed)
    }

    /// Number of queries executed so far.
    pub fn query_count(&self) -> usize {
        self.query_calls.load(AtomicOrdering::Relaxed)
    }

    fn next_rev(&self) -> String {
        format!("_{}", self.rev_counter.fetch_add(1, AtomicOrdering::Relaxed))
    }

    fn traverse(
        &self,
        inner: &Inner,
        start: &str,
        graph_name: &str,
        direction: Direction,
        depth: u32,
        include_edges: bool,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError> {
        let graph = inner
            .graphs
            .get(graph_name)
            .ok_or_else(|| StoreError::NotFound(graph_name.to_string()))?;
        let limit = limit.unwrap_or(usize::MAX);

        let mut vertices: Vec<Value> = Vec::new();
        let mut edges: Vec<Value> = Vec::new();
        let mut seen_vertices: HashSet<String> = HashSet::new();
        let mut seen_edges: HashSet<String> = HashSet::new();
        seen_vertices.insert(start.to_string());

        let mut frontier = vec![start.to_string()];
        for _ in 0..depth {
            let mut next = Vec::new();
            for current in &frontier {
                for def in &graph.edge_definitions {
                    let Some(edge_collection) = inner.collections.get(&def.edge_collection)
                    else {
                        continue;
                    };
                    for edge in edge_collection.docs.values() {
                        let from = edge.get("_from").and_then(Value::as_str).unwrap_or("");
                        let to = edge.get("_to").and_then(Value::as_str).unwrap_or("");

                        let mut neighbors = Vec::new();
                        if from == current.as_str()
                            && matches!(direction, Direction::Outbound | Direction::Any)
                        {
                            neighbors.push(to);
                        }
                        if to == current.as_str()
                            && matches!(direction, Direction::Inbound | Direction::Any)
                        {
                            neighbors.push(from);
                        }

                        for neighbor in neighbors {
                            let connected = if seen_vertices.contains(neighbor) {
                                true
                            } else if vertices.len() < limit {
                                match lookup_document(inner, neighbor) {
                                    Some(doc) if filters.iter().all(|f| matches_filter(doc, f)) => {
                                        seen_vertices.insert(neighbor.to_string());
                                        vertices.push(doc.clone());
                                        next.push(neighbor.to_string());
                                        true
                                    }
                                    _ => false,
                                }
                            } else {
                                false
                            };

                            if connected && include_edges {
                                let edge_id =
                                    edge.get("_id").and_then(Value::as_str).unwrap_or("");
                                if seen_edges.insert(edge_id.to_string()) {
                                    edges.push(edge.clone());
                                }
                            }
                        }
                    }
                }
            }
            frontier = next;
        }

        vertices.extend(edges);
        Ok(vertices)
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn has_collection(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().collections.contains_key(name))
    }

    async fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.collections.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        inner
            .collections
            .insert(name.to_string(), Collection::new(kind));
        Ok(())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let collection = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        if !collection.indexes.contains(&index.fields) {
            collection.indexes.push(index.fields.clone());
        }
        Ok(())
    }

    async fn create_vector_index(
        &self,
        collection: &str,
        field: &str,
        dimension: usize,
    ) -> Result<(), StoreError> {
        if !self.vector_support {
            return Err(StoreError::Backend(
                "vector indexes are not supported by this deployment".to_string(),
            ));
        }
        let mut inner = self.inner.write();
        let collection = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        collection.vector_index = Some((field.to_string(), dimension));
        Ok(())
    }

    async fn has_graph(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().graphs.contains_key(name))
    }

    async fn create_graph(&self, name: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.graphs.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        inner.graphs.insert(name.to_string(), Graph::default());
        Ok(())
    }

    async fn edge_definitions(&self, graph: &str) -> Result<Vec<EdgeDefinition>, StoreError> {
        let inner = self.inner.read();
        let graph = inner
            .graphs
            .get(graph)
            .ok_or_else(|| StoreError::NotFound(graph.to_string()))?;
        Ok(graph.edge_definitions.clone())
    }

    async fn add_edge_definition(
        &self,
        graph: &str,
        definition: EdgeDefinition,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let graph = inner
            .graphs
            .get_mut(graph)
            .ok_or_else(|| StoreError::NotFound(graph.to_string()))?;
        if graph
            .edge_definitions
            .iter()
            .any(|d| d.edge_collection == definition.edge_collection)
        {
            return Err(StoreError::AlreadyExists(definition.edge_collection));
        }
        graph.edge_definitions.push(definition);
        Ok(())
    }

    async fn has_view(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().views.contains_key(name))
    }

    async fn create_view(&self, name: &str, links: Vec<String>) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.views.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        inner.views.insert(name.to_string(), links);
        Ok(())
    }

    async fn view_links(&self, name: &str) -> Result<Vec<String>, StoreError> {
        self.inner
            .read()
            .views
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn set_view_links(&self, name: &str, links: Vec<String>) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let view = inner
            .views
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        *view = links;
        Ok(())
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        let mut document = document;
        let rev = self.next_rev();
        let mut inner = self.inner.write();
        let entry = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let obj = document
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidOperation("document must be an object".to_string()))?;
        if entry.kind == CollectionKind::Edge
            && (!obj.contains_key("_from") || !obj.contains_key("_to"))
        {
            return Err(StoreError::InvalidOperation(
                "edge documents require _from and _to".to_string(),
            ));
        }

        let key = match obj.get("_key").and_then(Value::as_str) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => uuid::Uuid::new_v4().simple().to_string(),
        };
        if entry.docs.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!("{collection}/{key}")));
        }

        obj.insert("_key".to_string(), json!(key));
        obj.insert("_id".to_string(), json!(format!("{collection}/{key}")));
        obj.insert("_rev".to_string(), json!(rev));

        entry.docs.insert(key, document.clone());
        Ok(document)
    }

    async fn fetch(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        self.fetch_calls.fetch_add(1, AtomicOrdering::Relaxed);
        let inner = self.inner.read();
        let entry = inner
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(entry.docs.get(key).cloned())
    }

    async fn merge_update(
        &self,
        collection: &str,
        key: &str,
        patch: Value,
    ) -> Result<Value, StoreError> {
        if !patch.is_object() {
            return Err(StoreError::InvalidOperation(
                "patch must be an object".to_string(),
            ));
        }
        let rev = self.next_rev();
        let mut inner = self.inner.write();
        let entry = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        let doc = entry
            .docs
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{key}")))?;

        let mut patch = patch;
        if let Some(obj) = patch.as_object_mut() {
            obj.remove("_id");
            obj.remove("_key");
            obj.remove("_rev");
        }
        merge_values(doc, &patch);
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("_rev".to_string(), json!(rev));
        }
        Ok(doc.clone())
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();
        let entry = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(entry.docs.remove(key).is_some())
    }

    async fn push_to_list(
        &self,
        collection: &str,
        key: &str,
        path: &str,
        value: Value,
    ) -> Result<Value, StoreError> {
        let rev = self.next_rev();
        let mut inner = self.inner.write();
        let entry = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        let doc = entry
            .docs
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{key}")))?;

        let slot = resolve_path_mut(doc, path)?;
        if slot.is_null() {
            *slot = json!([]);
        }
        let list = slot.as_array_mut().ok_or_else(|| {
            StoreError::InvalidOperation(format!("field '{path}' is not an array"))
        })?;
        list.push(value);

        if let Some(obj) = doc.as_object_mut() {
            obj.insert("_rev".to_string(), json!(rev));
        }
        Ok(doc.clone())
    }

    async fn execute(&self, query: &GraphQuery) -> Result<Vec<Value>, StoreError> {
        self.query_calls.fetch_add(1, AtomicOrdering::Relaxed);
        let inner = self.inner.read();

        let mut rows: Vec<Value> = match &query.source {
            QuerySource::Collection(name) => {
                let collection = inner
                    .collections
                    .get(name)
                    .ok_or_else(|| StoreError::CollectionNotFound(name.clone()))?;
                collection.docs.values().cloned().collect()
            }
            QuerySource::SearchView(name) => {
                let links = inner
                    .views
                    .get(name)
                    .ok_or_else(|| StoreError::NotFound(name.clone()))?;
                links
                    .iter()
                    .filter_map(|link| inner.collections.get(link))
                    .flat_map(|collection| collection.docs.values().cloned())
                    .collect()
            }
            QuerySource::Traversal {
                start,
                graph,
                direction,
                depth,
                include_edges,
            } => {
                // Traversal applies filters and limit to vertices during
                // expansion; connecting edges ride along uncounted.
                return self.traverse(
                    &inner,
                    start,
                    graph,
                    *direction,
                    *depth,
                    *include_edges,
                    &query.filters,
                    query.limit,
                );
            }
        };

        rows.retain(|row| query.filters.iter().all(|f| matches_filter(row, f)));

        match &query.sort {
            Some(Sort::Field { path, descending }) => {
                rows.sort_by(|a, b| {
                    let ordering = compare_json(
                        lookup_path(a, path).unwrap_or(&Value::Null),
                        lookup_path(b, path).unwrap_or(&Value::Null),
                    );
                    if *descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                });
            }
            Some(Sort::Distance { path, query: q }) => {
                rows.sort_by(|a, b| {
                    let da = vector_at(a, path)
                        .map(|v| cosine_distance(&v, q))
                        .unwrap_or(f32::INFINITY);
                    let db = vector_at(b, path)
                        .map(|v| cosine_distance(&v, q))
                        .unwrap_or(f32::INFINITY);
                    da.total_cmp(&db)
                });
            }
            None => {}
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

fn lookup_document<'a>(inner: &'a Inner, id: &str) -> Option<&'a Value> {
    let (collection, key) = parse_document_id(id);
    inner.collections.get(&collection)?.docs.get(&key)
}

/// Recursive field-level merge: nested objects merge, everything else is
/// replaced.
fn merge_values(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            match target.get_mut(k) {
                Some(existing) if existing.is_object() && v.is_object() => {
                    merge_values(existing, v);
                }
                _ => {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
    }
}

/// Walk a dotted path; numeric segments index into arrays.
fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = match segment.parse::<usize>() {
            Ok(index) => current.as_array()?.get(index)?,
            Err(_) => current.as_object()?.get(segment)?,
        };
    }
    Some(current)
}

fn resolve_path_mut<'a>(doc: &'a mut Value, path: &str) -> Result<&'a mut Value, StoreError> {
    let mut current = doc;
    for segment in path.split('.') {
        current = match segment.parse::<usize>() {
            Ok(index) => current
                .as_array_mut()
                .and_then(|a| a.get_mut(index))
                .ok_or_else(|| StoreError::Query(format!("no element at '{segment}'")))?,
            Err(_) => current
                .as_object_mut()
                .ok_or_else(|| StoreError::Query(format!("'{segment}' is not an object field")))?
                .entry(segment)
                .or_insert(Value::Null),
        };
    }
    Ok(current)
}

fn matches_filter(doc: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Field { path, op, value } => {
            let Some(field) = lookup_path(doc, path) else {
                return false;
            };
            match op {
                FilterOp::Eq => field == value,
                FilterOp::Ge => compare_json(field, value).is_ge(),
                FilterOp::Le => compare_json(field, value).is_le(),
                FilterOp::In => value
                    .as_array()
                    .map(|candidates| candidates.contains(field))
                    .unwrap_or(false),
                FilterOp::Contains => match (field.as_str(), value.as_str()) {
                    (Some(haystack), Some(needle)) => {
                        haystack.to_lowercase().contains(&needle.to_lowercase())
                    }
                    _ => false,
                },
            }
        }
        Filter::Or(alternatives) => alternatives.iter().any(|f| matches_filter(doc, f)),
    }
}

fn compare_json(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn vector_at(doc: &Value, path: &str) -> Option<Vec<f32>> {
    let values = lookup_path(doc, path)?.as_array()?;
    values
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return f32::INFINITY;
    }
    1.0 - dot / (norm_a * norm_b)
}
