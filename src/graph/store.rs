//! Arena storage for nodes, edges and adjacency
//!
//! Pure collection CRUD: no label buckets, no property indexes, no filtering.
//! [`Graph`](super::Graph) wraps the store and is the only path through
//! which callers mutate it.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::types::{EdgeId, EdgeType, Label, NodeId};
use crate::index::IdentitySet;
use indexmap::IndexMap;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Incomparable values: {left} and {right}")]
    IncomparableValues {
        left: &'static str,
        right: &'static str,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Edges incident to one node, grouped by edge type in first-seen order
#[derive(Debug, Clone, Default)]
struct Adjacency {
    outgoing: IndexMap<EdgeType, IdentitySet<EdgeId>>,
    incoming: IndexMap<EdgeType, IdentitySet<EdgeId>>,
}

fn link(map: &mut IndexMap<EdgeType, IdentitySet<EdgeId>>, edge_type: &EdgeType, id: EdgeId) {
    map.entry(edge_type.clone()).or_default().add(id);
}

fn unlink(map: &mut IndexMap<EdgeType, IdentitySet<EdgeId>>, edge_type: &EdgeType, id: EdgeId) {
    if let Some(ids) = map.get_mut(edge_type) {
        ids.remove(&id);
        if ids.is_empty() {
            map.shift_remove(edge_type);
        }
    }
}

/// In-memory graph storage
///
/// Nodes and edges live in slot arenas indexed by their handles:
/// - nodes: slot -> Node
/// - edges: slot -> Edge
/// - adjacency: node slot -> incoming/outgoing edges by type
///
/// Slots are never reused, so the handle of a removed node or edge stays
/// dead instead of naming a later insertion.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    adjacency: Vec<Adjacency>,
    node_count: usize,
    edge_count: usize,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, labels: impl IntoIterator<Item = Label>, properties: PropertyMap) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(Some(Node::new(id, labels, properties)));
        self.adjacency.push(Adjacency::default());
        self.node_count += 1;
        id
    }

    /// Adds a directed edge. Both endpoints must already be in the store.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: EdgeType,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        let id = EdgeId::new(self.edges.len() as u64);
        link(&mut self.adjacency[source.slot()].outgoing, &edge_type, id);
        link(&mut self.adjacency[target.slot()].incoming, &edge_type, id);
        self.edges.push(Some(Edge::new(id, source, target, edge_type, properties)));
        self.edge_count += 1;
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self
            .edges
            .get_mut(id.slot())
            .and_then(Option::take)
            .ok_or(GraphError::EdgeNotFound(id))?;

        unlink(&mut self.adjacency[edge.source.slot()].outgoing, &edge.edge_type, id);
        unlink(&mut self.adjacency[edge.target.slot()].incoming, &edge.edge_type, id);
        self.edge_count -= 1;
        Ok(edge)
    }

    /// Removes every edge incident to `id` and returns them. The node stays.
    pub fn detach_node(&mut self, id: NodeId) -> GraphResult<Vec<Edge>> {
        if !self.has_node(id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let mut incident: Vec<EdgeId> = self.outgoing_edges(id).collect();
        // a self-loop is listed on both sides
        incident.extend(self.incoming_edges(id).filter(|e| {
            self.get_edge(*e).map_or(false, |edge| !edge.is_self_loop())
        }));

        incident.into_iter().map(|edge| self.remove_edge(edge)).collect()
    }

    /// Detaches `id` and then removes it.
    pub fn detach_remove_node(&mut self, id: NodeId) -> GraphResult<(Node, Vec<Edge>)> {
        let removed_edges = self.detach_node(id)?;
        let node = self.nodes[id.slot()]
            .take()
            .ok_or(GraphError::NodeNotFound(id))?;
        self.adjacency[id.slot()] = Adjacency::default();
        self.node_count -= 1;
        Ok((node, removed_edges))
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot()).and_then(Option::as_ref)
    }

    pub(crate) fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.slot()).and_then(Option::as_mut)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.slot()).and_then(Option::as_ref)
    }

    pub(crate) fn get_edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.slot()).and_then(Option::as_mut)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    pub fn has_edge(&self, id: EdgeId) -> bool {
        self.get_edge(id).is_some()
    }

    /// Changes the type of an edge, moving it between adjacency groups.
    pub(crate) fn retype_edge(&mut self, id: EdgeId, edge_type: EdgeType) -> GraphResult<EdgeType> {
        let edge = self
            .edges
            .get_mut(id.slot())
            .and_then(Option::as_mut)
            .ok_or(GraphError::EdgeNotFound(id))?;
        let old = std::mem::replace(&mut edge.edge_type, edge_type.clone());
        let (source, target) = (edge.source, edge.target);

        unlink(&mut self.adjacency[source.slot()].outgoing, &old, id);
        unlink(&mut self.adjacency[target.slot()].incoming, &old, id);
        link(&mut self.adjacency[source.slot()].outgoing, &edge_type, id);
        link(&mut self.adjacency[target.slot()].incoming, &edge_type, id);
        Ok(old)
    }

    /// Edges leaving `node`, grouped by type in first-seen order.
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.adjacency
            .get(node.slot())
            .into_iter()
            .flat_map(|adj| adj.outgoing.values())
            .flat_map(|ids| ids.iter().copied())
    }

    /// Edges arriving at `node`, grouped by type in first-seen order.
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.adjacency
            .get(node.slot())
            .into_iter()
            .flat_map(|adj| adj.incoming.values())
            .flat_map(|ids| ids.iter().copied())
    }

    /// Edges of one type leaving `node`.
    pub fn outgoing_edges_of_type<'a>(
        &'a self,
        node: NodeId,
        edge_type: &EdgeType,
    ) -> impl Iterator<Item = EdgeId> + 'a {
        self.adjacency
            .get(node.slot())
            .and_then(|adj| adj.outgoing.get(edge_type))
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    /// Edges of one type arriving at `node`.
    pub fn incoming_edges_of_type<'a>(
        &'a self,
        node: NodeId,
        edge_type: &EdgeType,
    ) -> impl Iterator<Item = EdgeId> + 'a {
        self.adjacency
            .get(node.slot())
            .and_then(|adj| adj.incoming.get(edge_type))
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    /// Every live node handle, in slot order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().flatten().map(|n| n.id)
    }

    /// Every live edge handle, in slot order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().flatten().map(|e| e.id)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::properties;

    fn node(store: &mut GraphStore, label: &str) -> NodeId {
        store.add_node(vec![Label::new(label)], PropertyMap::new())
    }

    #[test]
    fn test_create_and_get_node() {
        let mut store = GraphStore::new();
        let id = store.add_node(vec![Label::new("Person")], properties([("name", "Ann")]));

        let node = store.get_node(id).unwrap();
        assert!(node.has_label(&Label::new("Person")));
        assert_eq!(node.get_property("name").and_then(|v| v.as_string()), Some("Ann"));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_edge_validation() {
        let mut store = GraphStore::new();
        let a = node(&mut store, "A");
        let ghost = NodeId::new(99);

        assert_eq!(
            store.add_edge(ghost, a, EdgeType::new("X"), PropertyMap::new()),
            Err(GraphError::InvalidEdgeSource(ghost))
        );
        assert_eq!(
            store.add_edge(a, ghost, EdgeType::new("X"), PropertyMap::new()),
            Err(GraphError::InvalidEdgeTarget(ghost))
        );
    }

    #[test]
    fn test_adjacency_lists() {
        let mut store = GraphStore::new();
        let a = node(&mut store, "A");
        let b = node(&mut store, "B");
        let c = node(&mut store, "C");

        let ab = store.add_edge(a, b, EdgeType::new("KNOWS"), PropertyMap::new()).unwrap();
        let ac = store.add_edge(a, c, EdgeType::new("LIKES"), PropertyMap::new()).unwrap();
        let ab2 = store.add_edge(a, b, EdgeType::new("KNOWS"), PropertyMap::new()).unwrap();

        let out: Vec<EdgeId> = store.outgoing_edges(a).collect();
        assert_eq!(out, vec![ab, ab2, ac]);

        let knows: Vec<EdgeId> = store.outgoing_edges_of_type(a, &EdgeType::new("KNOWS")).collect();
        assert_eq!(knows, vec![ab, ab2]);

        let into_b: Vec<EdgeId> = store.incoming_edges(b).collect();
        assert_eq!(into_b, vec![ab, ab2]);
        assert_eq!(store.incoming_edges_of_type(c, &EdgeType::new("KNOWS")).count(), 0);
    }

    #[test]
    fn test_remove_edge() {
        let mut store = GraphStore::new();
        let a = node(&mut store, "A");
        let b = node(&mut store, "B");
        let e = store.add_edge(a, b, EdgeType::new("KNOWS"), PropertyMap::new()).unwrap();

        let removed = store.remove_edge(e).unwrap();
        assert_eq!(removed.source, a);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.outgoing_edges(a).count(), 0);
        assert_eq!(store.remove_edge(e), Err(GraphError::EdgeNotFound(e)));
    }

    #[test]
    fn test_detach_remove_node_with_self_loop() {
        let mut store = GraphStore::new();
        let a = node(&mut store, "A");
        let b = node(&mut store, "B");
        store.add_edge(a, b, EdgeType::new("X"), PropertyMap::new()).unwrap();
        store.add_edge(b, a, EdgeType::new("Y"), PropertyMap::new()).unwrap();
        store.add_edge(a, a, EdgeType::new("SELF"), PropertyMap::new()).unwrap();

        let (node, edges) = store.detach_remove_node(a).unwrap();
        assert_eq!(node.id, a);
        assert_eq!(edges.len(), 3);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.incoming_edges(b).count(), 0);
        assert!(!store.has_node(a));
    }

    #[test]
    fn test_removed_handles_stay_dead() {
        let mut store = GraphStore::new();
        let a = node(&mut store, "A");
        let b = node(&mut store, "B");
        let ab = store.add_edge(a, b, EdgeType::new("X"), PropertyMap::new()).unwrap();
        store.detach_remove_node(a).unwrap();

        let c = node(&mut store, "C");
        assert_ne!(c, a);
        assert!(store.get_node(a).is_none());
        assert_eq!(store.node_ids().collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(
            store.add_edge(a, b, EdgeType::new("X"), PropertyMap::new()),
            Err(GraphError::InvalidEdgeSource(a))
        );

        let bc = store.add_edge(b, c, EdgeType::new("X"), PropertyMap::new()).unwrap();
        assert_ne!(bc, ab);
        assert!(store.get_edge(ab).is_none());
    }

    #[test]
    fn test_retype_edge_moves_adjacency() {
        let mut store = GraphStore::new();
        let a = node(&mut store, "A");
        let b = node(&mut store, "B");
        let e = store.add_edge(a, b, EdgeType::new("OLD"), PropertyMap::new()).unwrap();

        let old = store.retype_edge(e, EdgeType::new("NEW")).unwrap();
        assert_eq!(old, EdgeType::new("OLD"));
        assert_eq!(store.outgoing_edges_of_type(a, &EdgeType::new("OLD")).count(), 0);
        assert_eq!(store.incoming_edges_of_type(b, &EdgeType::new("NEW")).count(), 1);
    }
}
