//! Node records held in the graph arena

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A node in the property graph
///
/// Records are owned by the graph. Callers read them through
/// [`Graph::node`](super::Graph::node) and change them only through the
/// facade setters, which keep the label buckets and property indexes in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Handle of this node
    pub id: NodeId,

    /// Unordered, unique labels
    pub labels: HashSet<Label>,

    /// Properties associated with this node
    pub properties: PropertyMap,
}

impl Node {
    pub(crate) fn new(id: NodeId, labels: impl IntoIterator<Item = Label>, properties: PropertyMap) -> Self {
        Node {
            id,
            labels: labels.into_iter().collect(),
            properties,
        }
    }

    /// Check if node has a specific label
    pub fn has_label(&self, label: &Label) -> bool {
        self.labels.contains(label)
    }

    /// True when every label in `labels` is carried by this node
    pub fn has_all_labels<'a>(&self, labels: impl IntoIterator<Item = &'a Label>) -> bool {
        labels.into_iter().all(|l| self.labels.contains(l))
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let node = Node::new(
            NodeId::new(1),
            vec![Label::new("Person"), Label::new("Employee"), Label::new("Person")],
            PropertyMap::new(),
        );
        assert_eq!(node.labels.len(), 2);
        assert!(node.has_label(&Label::new("Employee")));
        assert!(node.has_all_labels(&[Label::new("Person"), Label::new("Employee")]));
        assert!(!node.has_all_labels(&[Label::new("Person"), Label::new("Robot")]));
    }

    #[test]
    fn test_equality_is_by_handle() {
        let a = Node::new(NodeId::new(7), vec![Label::new("A")], PropertyMap::new());
        let b = Node::new(NodeId::new(7), vec![], PropertyMap::new());
        let c = Node::new(NodeId::new(8), vec![Label::new("A")], PropertyMap::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
