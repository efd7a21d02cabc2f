//! Graph facade: the store plus its label buckets and property indexes
//!
//! Every structural change goes through [`Graph`], which removes the touched
//! entity from the affected index entries, applies the change and re-inserts
//! it. Indexes are therefore never stale between two facade calls.
//!
//! Candidate lookups ([`Graph::find_nodes`], [`Graph::find_edges`]) pick the
//! smallest sized access path (label bucket or a property index) and fall
//! back to a full scan when none applies. The same [`NodeFilter`] /
//! [`EdgeFilter`] is applied on top of whichever path wins.

use super::edge::Edge;
use super::filter::{EdgeFilter, NodeFilter};
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::store::{GraphError, GraphResult, GraphStore};
use super::types::{EdgeId, EdgeType, Label, NodeId};
use crate::index::{Candidates, IndexManager, LabelBuckets};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Counts describing the current graph contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub label_counts: BTreeMap<Label, usize>,
    pub edge_type_counts: BTreeMap<EdgeType, usize>,
}

/// In-memory property graph with secondary indexing
#[derive(Debug, Default)]
pub struct Graph {
    store: GraphStore,
    buckets: LabelBuckets,
    node_indexes: IndexManager<NodeId>,
    edge_indexes: IndexManager<EdgeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only access to the underlying store
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    // ---- creation ----

    /// Create a node with labels and properties.
    ///
    /// Fails without touching the graph when a property value cannot be
    /// ordered against an existing index on that property.
    pub fn new_node<L>(&mut self, labels: impl IntoIterator<Item = L>, properties: PropertyMap) -> GraphResult<NodeId>
    where
        L: Into<Label>,
    {
        self.node_indexes.check_all(&properties)?;
        let id = self.store.add_node(labels.into_iter().map(Into::into), properties);
        let node = self.store.get_node(id).ok_or(GraphError::NodeNotFound(id))?;
        self.buckets.add_node(id, &node.labels);
        self.node_indexes.insert_all(&node.properties, id)?;
        Ok(id)
    }

    /// Create a directed edge between two existing nodes.
    pub fn new_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        self.edge_indexes.check_all(&properties)?;
        let edge_type = edge_type.into();
        let id = self.store.add_edge(source, target, edge_type.clone(), properties)?;
        self.buckets.add_edge(id, &edge_type);
        let edge = self.store.get_edge(id).ok_or(GraphError::EdgeNotFound(id))?;
        self.edge_indexes.insert_all(&edge.properties, id)?;
        Ok(id)
    }

    // ---- reads ----

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.get_node(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.store.get_edge(id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.store.has_node(id)
    }

    pub fn has_edge(&self, id: EdgeId) -> bool {
        self.store.has_edge(id)
    }

    pub fn node_count(&self) -> usize {
        self.store.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.store.edge_count()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.store.node_ids()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.store.edge_ids()
    }

    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.store.outgoing_edges(node)
    }

    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.store.incoming_edges(node)
    }

    pub fn statistics(&self) -> GraphStatistics {
        GraphStatistics {
            node_count: self.store.node_count(),
            edge_count: self.store.edge_count(),
            label_counts: self
                .buckets
                .node_labels()
                .map(|(label, count)| (label.clone(), count))
                .collect(),
            edge_type_counts: self
                .buckets
                .edge_types()
                .map(|(edge_type, count)| (edge_type.clone(), count))
                .collect(),
        }
    }

    // ---- node mutation ----

    /// Set a node property, keeping any index on `key` in sync. Returns the
    /// previous value.
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let key = key.into();
        let value = value.into();
        let node = self.store.get_node_mut(id).ok_or(GraphError::NodeNotFound(id))?;

        let old = node.properties.get(&key).cloned();
        if let Some(old) = &old {
            self.node_indexes.index_remove(&key, old, id);
        }
        if let Err(e) = self.node_indexes.index_insert(&key, &value, id) {
            if let Some(old) = &old {
                self.node_indexes.index_insert(&key, old, id)?;
            }
            return Err(e);
        }
        node.properties.insert(key, value);
        Ok(old)
    }

    pub fn remove_node_property(&mut self, id: NodeId, key: &str) -> GraphResult<Option<PropertyValue>> {
        let node = self.store.get_node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        let old = node.properties.remove(key);
        if let Some(old) = &old {
            self.node_indexes.index_remove(key, old, id);
        }
        Ok(old)
    }

    /// Replace the whole label set of a node.
    pub fn set_node_labels<L>(&mut self, id: NodeId, labels: impl IntoIterator<Item = L>) -> GraphResult<()>
    where
        L: Into<Label>,
    {
        let node = self.store.get_node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        self.buckets.remove_node(id, &node.labels);
        node.labels = labels.into_iter().map(Into::into).collect::<HashSet<Label>>();
        self.buckets.add_node(id, &node.labels);
        Ok(())
    }

    pub fn add_node_label(&mut self, id: NodeId, label: impl Into<Label>) -> GraphResult<bool> {
        let node = self.store.get_node(id).ok_or(GraphError::NodeNotFound(id))?;
        let label = label.into();
        if node.has_label(&label) {
            return Ok(false);
        }
        let mut labels = node.labels.clone();
        labels.insert(label);
        self.set_node_labels(id, labels)?;
        Ok(true)
    }

    pub fn remove_node_label(&mut self, id: NodeId, label: &Label) -> GraphResult<bool> {
        let node = self.store.get_node(id).ok_or(GraphError::NodeNotFound(id))?;
        if !node.has_label(label) {
            return Ok(false);
        }
        let mut labels = node.labels.clone();
        labels.remove(label);
        self.set_node_labels(id, labels)?;
        Ok(true)
    }

    /// Remove every edge incident to `id`; the node itself stays.
    pub fn detach_node(&mut self, id: NodeId) -> GraphResult<Vec<Edge>> {
        let edges = self.store.detach_node(id)?;
        for edge in &edges {
            self.unindex_edge(edge);
        }
        Ok(edges)
    }

    /// Detach `id` and remove it from the graph.
    pub fn detach_remove_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let (node, edges) = self.store.detach_remove_node(id)?;
        for edge in &edges {
            self.unindex_edge(edge);
        }
        self.buckets.remove_node(id, &node.labels);
        self.node_indexes.remove_all(&node.properties, id);
        Ok(node)
    }

    // ---- edge mutation ----

    pub fn set_edge_property(
        &mut self,
        id: EdgeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let key = key.into();
        let value = value.into();
        let edge = self.store.get_edge_mut(id).ok_or(GraphError::EdgeNotFound(id))?;

        let old = edge.properties.get(&key).cloned();
        if let Some(old) = &old {
            self.edge_indexes.index_remove(&key, old, id);
        }
        if let Err(e) = self.edge_indexes.index_insert(&key, &value, id) {
            if let Some(old) = &old {
                self.edge_indexes.index_insert(&key, old, id)?;
            }
            return Err(e);
        }
        edge.properties.insert(key, value);
        Ok(old)
    }

    pub fn remove_edge_property(&mut self, id: EdgeId, key: &str) -> GraphResult<Option<PropertyValue>> {
        let edge = self.store.get_edge_mut(id).ok_or(GraphError::EdgeNotFound(id))?;
        let old = edge.properties.remove(key);
        if let Some(old) = &old {
            self.edge_indexes.index_remove(key, old, id);
        }
        Ok(old)
    }

    /// Change the label of an edge. Returns the previous one.
    pub fn set_edge_type(&mut self, id: EdgeId, edge_type: impl Into<EdgeType>) -> GraphResult<EdgeType> {
        let edge_type = edge_type.into();
        let old = self.store.retype_edge(id, edge_type.clone())?;
        self.buckets.remove_edge(id, &old);
        self.buckets.add_edge(id, &edge_type);
        Ok(old)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self.store.remove_edge(id)?;
        self.unindex_edge(&edge);
        Ok(edge)
    }

    fn unindex_edge(&mut self, edge: &Edge) {
        self.buckets.remove_edge(edge.id, &edge.edge_type);
        self.edge_indexes.remove_all(&edge.properties, edge.id);
    }

    // ---- index management ----

    /// Create an index on a node property and backfill it from every node.
    ///
    /// Fails (and leaves no index behind) when existing values of the
    /// property cannot be ordered against each other.
    pub fn add_node_property_index(&mut self, property: &str) -> GraphResult<()> {
        if !self.node_indexes.create_index(property) {
            return Ok(());
        }
        let mut indexed = 0usize;
        for node in self.store.node_ids().filter_map(|id| self.store.get_node(id)) {
            if let Some(value) = node.get_property(property) {
                if let Err(e) = self.node_indexes.index_insert(property, value, node.id) {
                    self.node_indexes.drop_index(property);
                    return Err(e);
                }
                indexed += 1;
            }
        }
        info!("Created node property index on '{}' ({} entries)", property, indexed);
        Ok(())
    }

    /// Create an index on an edge property and backfill it from every edge.
    pub fn add_edge_property_index(&mut self, property: &str) -> GraphResult<()> {
        if !self.edge_indexes.create_index(property) {
            return Ok(());
        }
        let mut indexed = 0usize;
        for edge in self.store.edge_ids().filter_map(|id| self.store.get_edge(id)) {
            if let Some(value) = edge.get_property(property) {
                if let Err(e) = self.edge_indexes.index_insert(property, value, edge.id) {
                    self.edge_indexes.drop_index(property);
                    return Err(e);
                }
                indexed += 1;
            }
        }
        info!("Created edge property index on '{}' ({} entries)", property, indexed);
        Ok(())
    }

    pub fn drop_node_property_index(&mut self, property: &str) -> bool {
        let dropped = self.node_indexes.drop_index(property);
        if dropped {
            debug!("Dropped node property index on '{}'", property);
        }
        dropped
    }

    pub fn drop_edge_property_index(&mut self, property: &str) -> bool {
        let dropped = self.edge_indexes.drop_index(property);
        if dropped {
            debug!("Dropped edge property index on '{}'", property);
        }
        dropped
    }

    pub fn has_node_property_index(&self, property: &str) -> bool {
        self.node_indexes.has_index(property)
    }

    pub fn has_edge_property_index(&self, property: &str) -> bool {
        self.edge_indexes.has_index(property)
    }

    // ---- candidate selection ----

    /// Nodes carrying all `labels` and holding all `properties`.
    pub fn find_nodes(&self, labels: &[Label], properties: &PropertyMap) -> GraphResult<NodeIterator<'_>> {
        self.nodes_matching(Cow::Owned(NodeFilter::new(labels, properties)))
    }

    /// Like [`find_nodes`](Self::find_nodes) for a prepared filter.
    pub fn select_nodes<'a>(&'a self, filter: &'a NodeFilter) -> GraphResult<NodeIterator<'a>> {
        self.nodes_matching(Cow::Borrowed(filter))
    }

    /// Nodes carrying at least one of `labels`, each yielded once.
    pub fn find_nodes_with_any_label(&self, labels: &[Label]) -> Candidates<'_, NodeId> {
        self.buckets.nodes_with_any(labels)
    }

    /// Edges whose type is one of `types` (any type when empty) holding all
    /// `properties`.
    pub fn find_edges(&self, types: &[EdgeType], properties: &PropertyMap) -> GraphResult<EdgeIterator<'_>> {
        self.edges_matching(Cow::Owned(EdgeFilter::new(types, properties)))
    }

    pub fn select_edges<'a>(&'a self, filter: &'a EdgeFilter) -> GraphResult<EdgeIterator<'a>> {
        self.edges_matching(Cow::Borrowed(filter))
    }

    fn nodes_matching<'a>(&'a self, filter: Cow<'a, NodeFilter>) -> GraphResult<NodeIterator<'a>> {
        let mut best: Option<Candidates<'a, NodeId>> = None;
        if !filter.labels.is_empty() {
            best = Some(self.buckets.nodes_with_all(&filter.labels));
        }
        for (key, value) in &filter.properties {
            if let Some(index) = self.node_indexes.get_index(key) {
                let candidates = match index.get(value)? {
                    Some(ids) => Candidates::new(ids.iter().copied(), Some(ids.len())),
                    None => Candidates::empty(),
                };
                if best.as_ref().map_or(true, |b| candidates.is_smaller_than(b)) {
                    best = Some(candidates);
                }
            }
        }
        let candidates = best.unwrap_or_else(|| Candidates::new(self.store.node_ids(), None));
        Ok(NodeIterator {
            candidates,
            store: &self.store,
            filter,
            failed: false,
        })
    }

    fn edges_matching<'a>(&'a self, filter: Cow<'a, EdgeFilter>) -> GraphResult<EdgeIterator<'a>> {
        let mut best: Option<Candidates<'a, EdgeId>> = None;
        if !filter.types.is_empty() {
            best = Some(self.buckets.edges_with_any(&filter.types));
        }
        for (key, value) in &filter.properties {
            if let Some(index) = self.edge_indexes.get_index(key) {
                let candidates = match index.get(value)? {
                    Some(ids) => Candidates::new(ids.iter().copied(), Some(ids.len())),
                    None => Candidates::empty(),
                };
                if best.as_ref().map_or(true, |b| candidates.is_smaller_than(b)) {
                    best = Some(candidates);
                }
            }
        }
        let candidates = best.unwrap_or_else(|| Candidates::new(self.store.edge_ids(), None));
        Ok(EdgeIterator {
            candidates,
            store: &self.store,
            filter,
            failed: false,
        })
    }

    /// Size bound of the access path [`select_nodes`](Self::select_nodes)
    /// would use; `None` when it would fall back to a full scan.
    pub fn estimate_nodes(&self, filter: &NodeFilter) -> GraphResult<Option<usize>> {
        Ok(self.select_nodes(filter)?.max_size())
    }

    pub fn estimate_edges(&self, filter: &EdgeFilter) -> GraphResult<Option<usize>> {
        Ok(self.select_edges(filter)?.max_size())
    }
}

/// Filtered node candidates. Yields an error (then stops) when the filter
/// hits an incomparable property value.
pub struct NodeIterator<'a> {
    candidates: Candidates<'a, NodeId>,
    store: &'a GraphStore,
    filter: Cow<'a, NodeFilter>,
    failed: bool,
}

impl NodeIterator<'_> {
    pub fn max_size(&self) -> Option<usize> {
        self.candidates.max_size()
    }
}

impl Iterator for NodeIterator<'_> {
    type Item = GraphResult<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for id in self.candidates.by_ref() {
            let Some(node) = self.store.get_node(id) else {
                continue;
            };
            match self.filter.matches(node) {
                Ok(true) => return Some(Ok(id)),
                Ok(false) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Filtered edge candidates, see [`NodeIterator`].
pub struct EdgeIterator<'a> {
    candidates: Candidates<'a, EdgeId>,
    store: &'a GraphStore,
    filter: Cow<'a, EdgeFilter>,
    failed: bool,
}

impl EdgeIterator<'_> {
    pub fn max_size(&self) -> Option<usize> {
        self.candidates.max_size()
    }
}

impl Iterator for EdgeIterator<'_> {
    type Item = GraphResult<EdgeId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for id in self.candidates.by_ref() {
            let Some(edge) = self.store.get_edge(id) else {
                continue;
            };
            match self.filter.matches(edge) {
                Ok(true) => return Some(Ok(id)),
                Ok(false) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
