//! Sutra Graph Query Engine
//!
//! An embeddable, in-memory property graph with openCypher-style pattern
//! matching.
//!
//! # Architecture
//!
//! - [`graph`]: nodes, edges and adjacency in a slot arena, wrapped by the
//!   [`Graph`] facade that keeps label buckets and property indexes in sync
//! - [`index`]: identity sets, ordered property indexes, label buckets and
//!   sized candidate streams
//! - [`query`]: path patterns, a cost-guided planner and a backtracking
//!   executor with variable-length paths
//!
//! Everything is single-threaded and synchronous. The graph must not change
//! while a match is running.
//!
//! ## Example Usage
//!
//! ```rust
//! use sutra::graph::{properties, Graph, PropertyMap};
//! use sutra::query::{EdgePattern, NodePattern, PathPattern, RecordBatch, Symbols};
//!
//! let mut graph = Graph::new();
//! let alice = graph.new_node(["Person"], properties([("name", "Alice")])).unwrap();
//! let bob = graph.new_node(["Person"], properties([("name", "Bob")])).unwrap();
//! graph.new_edge(alice, bob, "KNOWS", PropertyMap::new()).unwrap();
//!
//! // MATCH (a:Person {name: "Alice"})-[:KNOWS]->(b)
//! let pattern = PathPattern::new(
//!     NodePattern::new().named("a").with_label("Person").with_property("name", "Alice"),
//! )
//! .then(EdgePattern::outgoing().with_type("KNOWS"), NodePattern::new().named("b"));
//!
//! let mut rows = RecordBatch::new();
//! pattern.run(&graph, &Symbols::new(), &mut rows).unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows.records[0].get("b").and_then(|v| v.as_node()), Some(bob));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod index;
pub mod query;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeId, EdgeType, Graph, GraphError, GraphResult, GraphStore, Label, Node, NodeId,
    PropertyMap, PropertyValue,
};

pub use query::{
    ExecutionError, ExecutionResult, MatchAccumulator, MatchClause, MatchOptions, PathPattern,
    PatternSymbol, RecordBatch, Value,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
