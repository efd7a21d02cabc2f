//! Handle and name types shared by the store, the indexes and the matcher
//!
//! Handles are only meaningful for the [`Graph`](super::Graph) that issued
//! them. A removed node or edge keeps its slot, so its handle is never
//! handed out again.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! arena_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                $name(id)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }

            /// Index into the store's arena
            pub(crate) fn slot(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }
    };
}

macro_rules! interned_name {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                $name(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                $name(name)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                $name(name.to_owned())
            }
        }
    };
}

arena_handle!(
    /// Handle of a node slot
    NodeId
);

arena_handle!(
    /// Handle of an edge slot
    EdgeId
);

interned_name!(
    /// Node label. A node carries any number of these.
    Label
);

interned_name!(
    /// Edge label (relationship type). Every edge has exactly one.
    EdgeType
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_map_to_slots() {
        let node = NodeId::new(7);
        assert_eq!(node.slot(), 7);
        assert_eq!(format!("{}", node), "NodeId(7)");

        let edge: EdgeId = 3.into();
        assert_eq!(edge.slot(), 3);
        assert_eq!(format!("{}", edge), "EdgeId(3)");
    }

    #[test]
    fn test_names() {
        let label: Label = "Person".into();
        assert_eq!(label.as_str(), "Person");
        assert_eq!(label.to_string(), "Person");

        let edge_type = EdgeType::new(String::from("KNOWS"));
        assert_eq!(edge_type.to_string(), "KNOWS");
        assert!(Label::new("A") < Label::new("B"));
    }
}
