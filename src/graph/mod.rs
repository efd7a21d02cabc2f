//! Core property graph
//!
//! This module implements the property graph data model with:
//! - Nodes with any number of labels and properties
//! - Directed, typed edges with properties (parallel edges and self-loops allowed)
//! - Arena storage with per-type adjacency ([`GraphStore`])
//! - An index-maintaining facade ([`Graph`]) used by the query layer

pub mod edge;
pub mod facade;
pub mod filter;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use facade::{EdgeIterator, Graph, GraphStatistics, NodeIterator};
pub use filter::{EdgeFilter, NodeFilter};
pub use node::Node;
pub use property::{properties, PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId};
