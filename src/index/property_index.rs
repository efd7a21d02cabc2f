//! Ordered secondary index from property value to the entities holding it
//!
//! Keys are kept in [`PropertyValue::compare`] order. All keys of one index
//! must be mutually comparable: inserting or looking up a value whose shape
//! does not match the values already indexed fails with
//! [`GraphError::IncomparableValues`].

use super::identity_set::IdentitySet;
use crate::graph::{GraphError, GraphResult, PropertyValue};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::Hash;

/// Structural total order over values, used only for the map layout. Shape
/// compatibility is checked before a key ever reaches the map.
fn structural_cmp(a: &PropertyValue, b: &PropertyValue) -> Ordering {
    match (a, b) {
        (PropertyValue::List(l), PropertyValue::List(r)) => {
            for (x, y) in l.iter().zip(r.iter()) {
                let ord = structural_cmp(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            l.len().cmp(&r.len())
        }
        _ => a
            .compare(b)
            .unwrap_or_else(|_| a.shape_rank().cmp(&b.shape_rank())),
    }
}

/// Combined shape of every key in an index. A list's element shape is
/// `None` until some indexed list has an element.
#[derive(Debug, Clone, PartialEq)]
enum KeyShape {
    Scalar(&'static str),
    List(Option<Box<KeyShape>>),
}

impl KeyShape {
    fn of(value: &PropertyValue) -> GraphResult<Self> {
        match value {
            PropertyValue::List(items) => {
                let mut element: Option<KeyShape> = None;
                for item in items {
                    let shape = KeyShape::of(item)?;
                    element = Some(match element {
                        Some(seen) => seen.merge(shape)?,
                        None => shape,
                    });
                }
                Ok(KeyShape::List(element.map(Box::new)))
            }
            scalar => Ok(KeyShape::Scalar(scalar.type_name())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            KeyShape::Scalar(name) => name,
            KeyShape::List(_) => "List",
        }
    }

    fn merge(self, other: KeyShape) -> GraphResult<Self> {
        match (self, other) {
            (KeyShape::Scalar(l), KeyShape::Scalar(r)) if l == r => Ok(KeyShape::Scalar(l)),
            (KeyShape::List(None), KeyShape::List(e)) | (KeyShape::List(e), KeyShape::List(None)) => {
                Ok(KeyShape::List(e))
            }
            (KeyShape::List(Some(l)), KeyShape::List(Some(r))) => {
                Ok(KeyShape::List(Some(Box::new(l.merge(*r)?))))
            }
            (l, r) => Err(GraphError::IncomparableValues {
                left: r.name(),
                right: l.name(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct IndexKey(PropertyValue);

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        structural_cmp(&self.0, &other.0)
    }
}

/// Index for one property name over nodes or over edges
#[derive(Debug, Clone)]
pub struct PropertyIndex<Id> {
    /// Value -> entities holding that value
    index: BTreeMap<IndexKey, IdentitySet<Id>>,
    /// Shape shared by all keys; `None` while the index is empty
    shape: Option<KeyShape>,
}

impl<Id> PropertyIndex<Id>
where
    Id: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            index: BTreeMap::new(),
            shape: None,
        }
    }

    /// Fails when `value` cannot be ordered against every value already
    /// indexed. Lists whose elements differ in shape are never indexable.
    pub fn check(&self, value: &PropertyValue) -> GraphResult<()> {
        self.merged_shape(value).map(|_| ())
    }

    fn merged_shape(&self, value: &PropertyValue) -> GraphResult<KeyShape> {
        let shape = KeyShape::of(value)?;
        match &self.shape {
            Some(seen) => seen.clone().merge(shape),
            None => Ok(shape),
        }
    }

    pub fn insert(&mut self, value: PropertyValue, id: Id) -> GraphResult<()> {
        let shape = self.merged_shape(&value)?;
        self.index.entry(IndexKey(value)).or_default().add(id);
        self.shape = Some(shape);
        Ok(())
    }

    pub fn remove(&mut self, value: &PropertyValue, id: Id) {
        let key = IndexKey(value.clone());
        if let Some(ids) = self.index.get_mut(&key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.index.remove(&key);
                if self.index.is_empty() {
                    self.shape = None;
                }
            }
        }
    }

    /// Point lookup. `Ok(None)` when no entity holds `value`.
    pub fn get(&self, value: &PropertyValue) -> GraphResult<Option<&IdentitySet<Id>>> {
        self.check(value)?;
        Ok(self.index.get(&IndexKey(value.clone())))
    }

    /// Number of entities holding `value`; zero when none do.
    pub fn count(&self, value: &PropertyValue) -> GraphResult<usize> {
        Ok(self.get(value)?.map_or(0, IdentitySet::len))
    }

    /// Every distinct value with its holders, in value order.
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyValue, &IdentitySet<Id>)> + '_ {
        self.index.iter().map(|(k, ids)| (&k.0, ids))
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<Id> Default for PropertyIndex<Id>
where
    Id: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
