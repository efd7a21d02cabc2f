//! Pattern variables: bound values and the symbol sets that constrain them

use crate::graph::{EdgeId, NodeId};
use crate::index::IdentitySet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Value bound to a pattern variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    /// A node position
    Node(NodeId),
    /// An edge position: the matched edges in pattern (left to right) order
    Edges(Vec<EdgeId>),
}

impl Value {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            Value::Edges(_) => None,
        }
    }

    pub fn as_edges(&self) -> Option<&[EdgeId]> {
        match self {
            Value::Edges(edges) => Some(edges),
            Value::Node(_) => None,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Value::Node(_) => SymbolKind::Node,
            Value::Edges(_) => SymbolKind::Edges,
        }
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<EdgeId> for Value {
    fn from(id: EdgeId) -> Self {
        Value::Edges(vec![id])
    }
}

impl From<Vec<EdgeId>> for Value {
    fn from(edges: Vec<EdgeId>) -> Self {
        Value::Edges(edges)
    }
}

/// What a variable stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Node,
    Edges,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Node => write!(f, "node"),
            SymbolKind::Edges => write!(f, "edge sequence"),
        }
    }
}

/// A variable bound in an enclosing scope. A pattern position carrying the
/// same name only matches members of the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSymbol {
    Nodes(IdentitySet<NodeId>),
    Edges(IdentitySet<Vec<EdgeId>>),
}

impl PatternSymbol {
    pub fn nodes(ids: impl IntoIterator<Item = NodeId>) -> Self {
        PatternSymbol::Nodes(ids.into_iter().collect())
    }

    pub fn edges(sequences: impl IntoIterator<Item = Vec<EdgeId>>) -> Self {
        PatternSymbol::Edges(sequences.into_iter().collect())
    }

    /// Symbol holding exactly `value`.
    pub fn single(value: &Value) -> Self {
        match value {
            Value::Node(id) => Self::nodes([*id]),
            Value::Edges(edges) => Self::edges([edges.clone()]),
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            PatternSymbol::Nodes(_) => SymbolKind::Node,
            PatternSymbol::Edges(_) => SymbolKind::Edges,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PatternSymbol::Nodes(ids) => ids.len(),
            PatternSymbol::Edges(sequences) => sequences.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (PatternSymbol::Nodes(ids), Value::Node(id)) => ids.contains(id),
            (PatternSymbol::Edges(sequences), Value::Edges(edges)) => sequences.contains(edges),
            _ => false,
        }
    }
}

/// Outer-scope symbols handed to a match run
pub type Symbols = HashMap<String, PatternSymbol>;

/// Variable bindings of one result row, in pattern order
pub type Bindings = IndexMap<String, Value>;
