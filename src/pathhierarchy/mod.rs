//! Path hierarchy index (spec §3, §4.2).

pub mod disambiguation;
pub mod tree;

pub use disambiguation::{stable_hash, DisambiguationMatch, DisambiguationSubtree};
pub use tree::{CyclicRelationship, LookupOutcome, NodeId, PathHierarchy, PathNode};
