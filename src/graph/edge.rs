//! Edge records held in the graph arena

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, NodeId};
use serde::{Deserialize, Serialize};

/// A directed edge in the property graph
///
/// Edges are stored directed. Whether a pattern may walk one against its
/// direction is decided at match time, not stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Handle of this edge
    pub id: EdgeId,

    /// Edge goes FROM this node
    pub source: NodeId,

    /// Edge goes TO this node
    pub target: NodeId,

    /// The single label of this edge
    pub edge_type: EdgeType,

    /// Properties associated with this edge
    pub properties: PropertyMap,
}

impl Edge {
    pub(crate) fn new(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        edge_type: EdgeType,
        properties: PropertyMap,
    ) -> Self {
        Edge {
            id,
            source,
            target,
            edge_type,
            properties,
        }
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
