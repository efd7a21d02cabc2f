//! Secondary access paths over the graph
//!
//! - [`IdentitySet`]: insertion-ordered set with O(1) add/remove/contains
//! - [`PropertyIndex`] / [`IndexManager`]: ordered value -> id-set indexes per property
//! - [`LabelBuckets`]: node-by-label and edge-by-type buckets
//! - [`Candidates`]: an id stream paired with a cardinality bound

pub mod candidates;
pub mod identity_set;
pub mod labels;
pub mod manager;
pub mod property_index;

pub use candidates::Candidates;
pub use identity_set::IdentitySet;
pub use labels::LabelBuckets;
pub use manager::IndexManager;
pub use property_index::PropertyIndex;
