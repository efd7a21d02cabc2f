//! Per-label buckets of nodes and per-type buckets of edges
//!
//! A node with labels {A, B} sits in both the A and the B bucket; nodes with
//! no label at all sit in a separate bucket. Each edge sits in exactly one
//! bucket, its type.

use super::candidates::Candidates;
use super::identity_set::IdentitySet;
use crate::graph::{EdgeId, EdgeType, Label, NodeId};
use rustc_hash::FxHashMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct LabelBuckets {
    nodes: FxHashMap<Label, IdentitySet<NodeId>>,
    unlabeled: IdentitySet<NodeId>,
    edges: FxHashMap<EdgeType, IdentitySet<EdgeId>>,
}

impl LabelBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId, labels: &HashSet<Label>) {
        if labels.is_empty() {
            self.unlabeled.add(id);
            return;
        }
        for label in labels {
            self.nodes.entry(label.clone()).or_default().add(id);
        }
    }

    pub fn remove_node(&mut self, id: NodeId, labels: &HashSet<Label>) {
        if labels.is_empty() {
            self.unlabeled.remove(&id);
            return;
        }
        for label in labels {
            if let Some(bucket) = self.nodes.get_mut(label) {
                bucket.remove(&id);
                if bucket.is_empty() {
                    self.nodes.remove(label);
                }
            }
        }
    }

    pub fn add_edge(&mut self, id: EdgeId, edge_type: &EdgeType) {
        self.edges.entry(edge_type.clone()).or_default().add(id);
    }

    pub fn remove_edge(&mut self, id: EdgeId, edge_type: &EdgeType) {
        if let Some(bucket) = self.edges.get_mut(edge_type) {
            bucket.remove(&id);
            if bucket.is_empty() {
                self.edges.remove(edge_type);
            }
        }
    }

    pub fn node_bucket(&self, label: &Label) -> Option<&IdentitySet<NodeId>> {
        self.nodes.get(label)
    }

    pub fn unlabeled_nodes(&self) -> &IdentitySet<NodeId> {
        &self.unlabeled
    }

    pub fn edge_bucket(&self, edge_type: &EdgeType) -> Option<&IdentitySet<EdgeId>> {
        self.edges.get(edge_type)
    }

    /// Nodes carrying every label in `labels`.
    ///
    /// Iterates the smallest requested bucket and keeps the nodes present in
    /// all the others. The reported size is that bucket's size. `labels` must
    /// not be empty.
    pub fn nodes_with_all<'a>(&'a self, labels: &[Label]) -> Candidates<'a, NodeId> {
        let mut buckets = Vec::with_capacity(labels.len());
        for label in labels {
            match self.nodes.get(label) {
                Some(bucket) => buckets.push(bucket),
                None => return Candidates::empty(),
            }
        }
        let Some((smallest_pos, smallest)) = buckets
            .iter()
            .enumerate()
            .min_by_key(|(_, bucket)| bucket.len())
            .map(|(pos, bucket)| (pos, *bucket))
        else {
            return Candidates::empty();
        };

        let size = smallest.len();
        let iter = smallest.iter().copied().filter(move |id| {
            buckets
                .iter()
                .enumerate()
                .all(|(pos, bucket)| pos == smallest_pos || bucket.contains(id))
        });
        Candidates::new(iter, Some(size))
    }

    /// Nodes carrying at least one label in `labels`, each yielded once.
    pub fn nodes_with_any<'a>(&'a self, labels: &[Label]) -> Candidates<'a, NodeId> {
        let buckets: Vec<&IdentitySet<NodeId>> =
            distinct(labels).filter_map(|label| self.nodes.get(label)).collect();
        let size = buckets.iter().map(|bucket| bucket.len()).sum();

        let iter = buckets.clone().into_iter().enumerate().flat_map(move |(pos, bucket)| {
            let earlier = buckets[..pos].to_vec();
            bucket
                .iter()
                .copied()
                .filter(move |id| !earlier.iter().any(|seen| seen.contains(id)))
        });
        Candidates::new(iter, Some(size))
    }

    /// Edges whose type is one of `types`.
    pub fn edges_with_any<'a>(&'a self, types: &[EdgeType]) -> Candidates<'a, EdgeId> {
        let buckets: Vec<&IdentitySet<EdgeId>> =
            distinct(types).filter_map(|t| self.edges.get(t)).collect();
        let size = buckets.iter().map(|bucket| bucket.len()).sum();
        let iter = buckets.into_iter().flat_map(|bucket| bucket.iter().copied());
        Candidates::new(iter, Some(size))
    }

    pub fn node_labels(&self) -> impl Iterator<Item = (&Label, usize)> + '_ {
        self.nodes.iter().map(|(label, bucket)| (label, bucket.len()))
    }

    pub fn edge_types(&self) -> impl Iterator<Item = (&EdgeType, usize)> + '_ {
        self.edges.iter().map(|(t, bucket)| (t, bucket.len()))
    }
}

/// `items` with repeats removed, first occurrence kept.
fn distinct<T: PartialEq>(items: &[T]) -> impl Iterator<Item = &T> + '_ {
    items
        .iter()
        .enumerate()
        .filter(move |(pos, item)| !items[..*pos].contains(item))
        .map(|(_, item)| item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> HashSet<Label> {
        names.iter().map(|n| Label::new(*n)).collect()
    }

    fn sample() -> LabelBuckets {
        let mut buckets = LabelBuckets::new();
        buckets.add_node(NodeId::new(1), &labels(&["A", "B"]));
        buckets.add_node(NodeId::new(2), &labels(&["A"]));
        buckets.add_node(NodeId::new(3), &labels(&["B"]));
        buckets.add_node(NodeId::new(4), &labels(&["A", "B", "C"]));
        buckets.add_node(NodeId::new(5), &labels(&[]));
        buckets
    }

    fn ids(candidates: Candidates<'_, NodeId>) -> Vec<u64> {
        let mut out: Vec<u64> = candidates.map(|n| n.as_u64()).collect();
        out.sort();
        out
    }

    #[test]
    fn test_multi_label_node_in_every_bucket() {
        let buckets = sample();
        assert_eq!(buckets.node_bucket(&Label::new("A")).unwrap().len(), 3);
        assert_eq!(buckets.node_bucket(&Label::new("B")).unwrap().len(), 3);
        assert_eq!(buckets.unlabeled_nodes().len(), 1);
    }

    #[test]
    fn test_all_labels_uses_smallest_bucket() {
        let buckets = sample();
        let wanted = [Label::new("A"), Label::new("B"), Label::new("C")];
        let candidates = buckets.nodes_with_all(&wanted);
        assert_eq!(candidates.max_size(), Some(1));
        assert_eq!(ids(candidates), vec![4]);

        let wanted = [Label::new("A"), Label::new("B")];
        assert_eq!(ids(buckets.nodes_with_all(&wanted)), vec![1, 4]);

        let missing = [Label::new("A"), Label::new("Z")];
        assert_eq!(buckets.nodes_with_all(&missing).max_size(), Some(0));
    }

    #[test]
    fn test_any_label_deduplicates() {
        let buckets = sample();
        let wanted = [Label::new("A"), Label::new("B"), Label::new("A")];
        let candidates = buckets.nodes_with_any(&wanted);
        assert_eq!(candidates.max_size(), Some(6));
        assert_eq!(ids(candidates), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_remove_node_empties_buckets() {
        let mut buckets = sample();
        buckets.remove_node(NodeId::new(4), &labels(&["A", "B", "C"]));
        assert!(buckets.node_bucket(&Label::new("C")).is_none());
        assert_eq!(buckets.nodes_with_all(&[Label::new("A"), Label::new("C")]).max_size(), Some(0));

        buckets.remove_node(NodeId::new(5), &labels(&[]));
        assert!(buckets.unlabeled_nodes().is_empty());
    }

    #[test]
    fn test_edge_buckets() {
        let mut buckets = LabelBuckets::new();
        buckets.add_edge(EdgeId::new(1), &EdgeType::new("KNOWS"));
        buckets.add_edge(EdgeId::new(2), &EdgeType::new("LIKES"));
        buckets.add_edge(EdgeId::new(3), &EdgeType::new("KNOWS"));

        let types = [EdgeType::new("KNOWS"), EdgeType::new("KNOWS")];
        let found: Vec<u64> = buckets.edges_with_any(&types).map(|e| e.as_u64()).collect();
        assert_eq!(found, vec![1, 3]);
        assert_eq!(buckets.edges_with_any(&types).max_size(), Some(2));

        buckets.remove_edge(EdgeId::new(2), &EdgeType::new("LIKES"));
        assert!(buckets.edge_bucket(&EdgeType::new("LIKES")).is_none());
    }
}
