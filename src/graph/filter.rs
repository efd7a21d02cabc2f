//! Pure label/property predicates shared by candidate selection and the
//! match step processors, so estimation and execution agree on what matches.

use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::store::GraphResult;
use super::types::{EdgeType, Label};

/// Property constraints sorted by key, so evaluation order (and which
/// incomparable pair is reported first) is deterministic.
fn sorted_constraints(properties: &PropertyMap) -> Vec<(String, PropertyValue)> {
    let mut constraints: Vec<_> = properties
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    constraints.sort_by(|a, b| a.0.cmp(&b.0));
    constraints
}

fn properties_match<'v>(
    constraints: &[(String, PropertyValue)],
    lookup: impl Fn(&str) -> Option<&'v PropertyValue>,
) -> GraphResult<bool> {
    for (key, expected) in constraints {
        match lookup(key) {
            Some(actual) => {
                if !actual.matches(expected)? {
                    return Ok(false);
                }
            }
            None => return Ok(false),
        }
    }
    Ok(true)
}

/// Node must carry every label and hold every property value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFilter {
    pub labels: Vec<Label>,
    pub properties: Vec<(String, PropertyValue)>,
}

impl NodeFilter {
    pub fn new(labels: &[Label], properties: &PropertyMap) -> Self {
        Self {
            labels: labels.to_vec(),
            properties: sorted_constraints(properties),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.labels.is_empty() && self.properties.is_empty()
    }

    pub fn matches(&self, node: &Node) -> GraphResult<bool> {
        if !node.has_all_labels(&self.labels) {
            return Ok(false);
        }
        properties_match(&self.properties, |key| node.get_property(key))
    }
}

/// Edge type must be one of `types` (any type when empty) and the edge must
/// hold every property value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeFilter {
    pub types: Vec<EdgeType>,
    pub properties: Vec<(String, PropertyValue)>,
}

impl EdgeFilter {
    pub fn new(types: &[EdgeType], properties: &PropertyMap) -> Self {
        Self {
            types: types.to_vec(),
            properties: sorted_constraints(properties),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.types.is_empty() && self.properties.is_empty()
    }

    pub fn matches(&self, edge: &Edge) -> GraphResult<bool> {
        if !self.types.is_empty() && !self.types.contains(&edge.edge_type) {
            return Ok(false);
        }
        properties_match(&self.properties, |key| edge.get_property(key))
    }
}
