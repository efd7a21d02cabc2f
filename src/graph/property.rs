//! Property values and the total order used by filters and indexes
//!
//! Only scalars (boolean, integer, float, string) and lists of them are
//! storable. Two values are comparable when they have the same shape; lists
//! compare lexicographically element by element, a strict prefix sorting
//! first. Comparing values of different shapes is an error, never a silent
//! coercion.

use super::store::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Property value attached to nodes and edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::String(_) => "String",
            PropertyValue::List(_) => "List",
        }
    }

    /// Total order between two values of the same shape.
    ///
    /// Returns [`GraphError::IncomparableValues`] when the shapes differ,
    /// including lists whose elements at the first differing position have
    /// different shapes.
    pub fn compare(&self, other: &PropertyValue) -> GraphResult<Ordering> {
        match (self, other) {
            (PropertyValue::Boolean(l), PropertyValue::Boolean(r)) => Ok(l.cmp(r)),
            (PropertyValue::Integer(l), PropertyValue::Integer(r)) => Ok(l.cmp(r)),
            (PropertyValue::Float(l), PropertyValue::Float(r)) => Ok(l.total_cmp(r)),
            (PropertyValue::String(l), PropertyValue::String(r)) => Ok(l.cmp(r)),
            (PropertyValue::List(l), PropertyValue::List(r)) => {
                for (a, b) in l.iter().zip(r.iter()) {
                    match a.compare(b)? {
                        Ordering::Equal => continue,
                        ord => return Ok(ord),
                    }
                }
                Ok(l.len().cmp(&r.len()))
            }
            _ => Err(GraphError::IncomparableValues {
                left: self.type_name(),
                right: other.type_name(),
            }),
        }
    }

    /// Equality under [`compare`](Self::compare); shape mismatches are errors.
    pub fn matches(&self, other: &PropertyValue) -> GraphResult<bool> {
        Ok(self.compare(other)? == Ordering::Equal)
    }

    /// Rank of the value's shape. Only used to keep ordered containers
    /// well-formed; callers validate comparability before inserting.
    pub(crate) fn shape_rank(&self) -> u8 {
        match self {
            PropertyValue::Boolean(_) => 0,
            PropertyValue::Integer(_) => 1,
            PropertyValue::Float(_) => 2,
            PropertyValue::String(_) => 3,
            PropertyValue::List(_) => 4,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::List(items) => {
                write!(f, "[")?;
                for (i, val) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        PropertyValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Property map for storing node and edge properties
pub type PropertyMap = HashMap<String, PropertyValue>;

/// Builds a [`PropertyMap`] from `(key, value)` pairs.
pub fn properties<K, V, I>(pairs: I) -> PropertyMap
where
    K: Into<String>,
    V: Into<PropertyValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
