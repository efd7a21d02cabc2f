//! Pattern model for MATCH clauses
//!
//! A [`PathPattern`] is `(start)-[edge]-(node)-[edge]-(node)...`. Flattened,
//! it occupies positions `0..len()` with node items at even positions and
//! edge items at odd positions; the first and last positions are always
//! nodes.

use crate::graph::{EdgeFilter, EdgeType, Label, NodeFilter, PropertyMap, PropertyValue};
use crate::query::executor::{ExecutionError, ExecutionResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Path pattern: (n:Person)-[:KNOWS*1..3]->(m:Person)
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    /// Start node
    pub start: NodePattern,
    /// Edges and nodes
    pub segments: Vec<PathSegment>,
}

/// Segment of a path (edge + node)
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    /// Edge pattern
    pub edge: EdgePattern,
    /// Target node pattern
    pub node: NodePattern,
}

/// Node pattern: (n:Person:Employee {name: "Alice"})
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePattern {
    /// Variable name (e.g., "n")
    pub variable: Option<String>,
    /// Labels the node must all carry; empty means any
    pub labels: Vec<Label>,
    /// Property constraints; empty means any
    pub properties: PropertyMap,
}

/// Edge pattern: -[:KNOWS|FOLLOWS*1..5]->
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePattern {
    /// Variable name (e.g., "r")
    pub variable: Option<String>,
    /// Accepted edge types; empty means any
    pub types: Vec<EdgeType>,
    /// Direction, read left to right
    pub direction: Direction,
    /// Repetition range
    pub length: LengthPattern,
    /// Property constraints, applied to every edge of a multi-hop match
    pub properties: PropertyMap,
}

/// Edge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Outgoing: ->
    Outgoing,
    /// Incoming: <-
    Incoming,
    /// Either way: -
    Both,
}

impl Direction {
    /// The same edge seen from its other end.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
            Direction::Both => Direction::Both,
        }
    }
}

/// Variable length pattern: *1..5 or * or *3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthPattern {
    /// Minimum length (None = 1)
    pub min: Option<usize>,
    /// Maximum length (None = unbounded)
    pub max: Option<usize>,
}

impl LengthPattern {
    /// Exactly one hop.
    pub fn single() -> Self {
        Self {
            min: Some(1),
            max: Some(1),
        }
    }

    pub fn range(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// One or more hops.
    pub fn unbounded() -> Self {
        Self { min: None, max: None }
    }

    /// Effective lower bound; zero-length paths are not matched.
    pub fn min_hops(&self) -> usize {
        self.min.unwrap_or(1).max(1)
    }

    pub fn is_single_hop(&self) -> bool {
        self.min_hops() == 1 && self.max == Some(1)
    }

    pub fn contains(&self, hops: usize) -> bool {
        hops >= self.min_hops() && self.max.map_or(true, |max| hops <= max)
    }

    /// Whether a path of `hops` edges may still grow.
    pub fn can_extend(&self, hops: usize) -> bool {
        self.max.map_or(true, |max| hops < max)
    }
}

impl Default for LengthPattern {
    fn default() -> Self {
        Self::single()
    }
}

/// Borrowed view of one pattern position
#[derive(Debug, Clone, Copy)]
pub enum PatternElement<'p> {
    Node(&'p NodePattern),
    Edge(&'p EdgePattern),
}

impl<'p> PatternElement<'p> {
    pub fn variable(&self) -> Option<&'p str> {
        match self {
            PatternElement::Node(node) => node.variable.as_deref(),
            PatternElement::Edge(edge) => edge.variable.as_deref(),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, PatternElement::Node(_))
    }
}

impl NodePattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn filter(&self) -> NodeFilter {
        NodeFilter::new(&self.labels, &self.properties)
    }
}

impl EdgePattern {
    pub fn new(direction: Direction) -> Self {
        Self {
            variable: None,
            types: Vec::new(),
            direction,
            length: LengthPattern::single(),
            properties: PropertyMap::new(),
        }
    }

    pub fn outgoing() -> Self {
        Self::new(Direction::Outgoing)
    }

    pub fn incoming() -> Self {
        Self::new(Direction::Incoming)
    }

    pub fn undirected() -> Self {
        Self::new(Direction::Both)
    }

    pub fn named(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn with_type(mut self, edge_type: impl Into<EdgeType>) -> Self {
        self.types.push(edge_type.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_length(mut self, length: LengthPattern) -> Self {
        self.length = length;
        self
    }

    pub fn filter(&self) -> EdgeFilter {
        EdgeFilter::new(&self.types, &self.properties)
    }
}

impl PathPattern {
    pub fn new(start: NodePattern) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    /// Append `-[edge]-(node)`.
    pub fn then(mut self, edge: EdgePattern, node: NodePattern) -> Self {
        self.segments.push(PathSegment { edge, node });
        self
    }

    /// Number of positions (always odd).
    pub fn len(&self) -> usize {
        1 + 2 * self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn element(&self, position: usize) -> Option<PatternElement<'_>> {
        if position == 0 {
            return Some(PatternElement::Node(&self.start));
        }
        let segment = self.segments.get((position - 1) / 2)?;
        Some(if position % 2 == 1 {
            PatternElement::Edge(&segment.edge)
        } else {
            PatternElement::Node(&segment.node)
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = PatternElement<'_>> + '_ {
        std::iter::once(PatternElement::Node(&self.start)).chain(
            self.segments
                .iter()
                .flat_map(|s| [PatternElement::Edge(&s.edge), PatternElement::Node(&s.node)]),
        )
    }

    /// Variable names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.elements().filter_map(|e| e.variable()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Reject repetition ranges that can never match and names used for
    /// both a node and an edge.
    pub fn validate(&self) -> ExecutionResult<()> {
        let mut kinds: HashMap<&str, bool> = HashMap::new();
        for (position, element) in self.elements().enumerate() {
            if let PatternElement::Edge(edge) = element {
                if let Some(max) = edge.length.max {
                    if max < edge.length.min_hops() {
                        return Err(ExecutionError::InvalidPattern(format!(
                            "edge at position {} has empty length range {:?}..{}",
                            position, edge.length.min, max
                        )));
                    }
                }
            }
            if let Some(name) = element.variable() {
                let is_node = element.is_node();
                if *kinds.entry(name).or_insert(is_node) != is_node {
                    return Err(ExecutionError::InvalidPattern(format!(
                        "variable '{}' is used for both a node and an edge",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}
