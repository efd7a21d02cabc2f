//! Registry of property indexes for one entity kind
//!
//! The graph keeps one manager for nodes and one for edges. Indexes are keyed
//! by property name only; label restriction happens in the candidate filter.

use super::property_index::PropertyIndex;
use crate::graph::{GraphResult, PropertyMap, PropertyValue};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct IndexManager<Id> {
    indices: HashMap<String, PropertyIndex<Id>>,
}

impl<Id> IndexManager<Id>
where
    Id: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            indices: HashMap::new(),
        }
    }

    /// Registers an empty index. Returns false when one already exists.
    pub fn create_index(&mut self, property: &str) -> bool {
        if self.indices.contains_key(property) {
            return false;
        }
        self.indices.insert(property.to_string(), PropertyIndex::new());
        true
    }

    pub fn drop_index(&mut self, property: &str) -> bool {
        self.indices.remove(property).is_some()
    }

    pub fn has_index(&self, property: &str) -> bool {
        self.indices.contains_key(property)
    }

    pub fn get_index(&self, property: &str) -> Option<&PropertyIndex<Id>> {
        self.indices.get(property)
    }

    /// Fails when `value` could not be inserted into the index on `property`.
    pub fn check(&self, property: &str, value: &PropertyValue) -> GraphResult<()> {
        match self.indices.get(property) {
            Some(index) => index.check(value),
            None => Ok(()),
        }
    }

    /// Checks every indexed property of `properties` without inserting.
    pub fn check_all(&self, properties: &PropertyMap) -> GraphResult<()> {
        for (key, value) in properties {
            self.check(key, value)?;
        }
        Ok(())
    }

    pub fn index_insert(&mut self, property: &str, value: &PropertyValue, id: Id) -> GraphResult<()> {
        match self.indices.get_mut(property) {
            Some(index) => index.insert(value.clone(), id),
            None => Ok(()),
        }
    }

    pub fn index_remove(&mut self, property: &str, value: &PropertyValue, id: Id) {
        if let Some(index) = self.indices.get_mut(property) {
            index.remove(value, id);
        }
    }

    /// Inserts every indexed property of an entity.
    pub fn insert_all(&mut self, properties: &PropertyMap, id: Id) -> GraphResult<()> {
        for (key, value) in properties {
            self.index_insert(key, value, id)?;
        }
        Ok(())
    }

    pub fn remove_all(&mut self, properties: &PropertyMap, id: Id) {
        for (key, value) in properties {
            self.index_remove(key, value, id);
        }
    }
}

impl<Id> Default for IndexManager<Id>
where
    Id: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{properties, NodeId};

    #[test]
    fn test_only_indexed_properties_are_tracked() {
        let mut manager = IndexManager::new();
        assert!(manager.create_index("age"));
        assert!(!manager.create_index("age"));

        let props = properties([("age", PropertyValue::Integer(30)), ("name", "Ann".into())]);
        manager.insert_all(&props, NodeId::new(1)).unwrap();

        let age = manager.get_index("age").unwrap();
        assert_eq!(age.count(&PropertyValue::Integer(30)).unwrap(), 1);
        assert!(manager.get_index("name").is_none());

        manager.remove_all(&props, NodeId::new(1));
        assert!(manager.get_index("age").unwrap().is_empty());

        assert!(manager.drop_index("age"));
        assert!(!manager.has_index("age"));
    }

    #[test]
    fn test_check_rejects_mismatched_shapes() {
        let mut manager = IndexManager::new();
        manager.create_index("k");
        manager.index_insert("k", &PropertyValue::Integer(1), NodeId::new(1)).unwrap();

        assert!(manager.check("k", &"x".into()).is_err());
        assert!(manager.check("other", &"x".into()).is_ok());
        assert!(manager.check_all(&properties([("k", "x")])).is_err());
    }
}
