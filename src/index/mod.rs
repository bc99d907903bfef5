//! Bounding-box index over 16-dimensional signatures.
//!
//! [`key`] holds the per-key operations a tree host calls (compress,
//! union, penalty, same, consistency, ordering distance), [`split`] the node
//! splitting heuristic and [`tree`] an in-memory host built on both.

pub mod key;
pub mod split;
pub mod tree;

pub use key::{Consistency, IndexKey};
pub use split::{pick_split, Split};
pub use tree::{ChildRef, IndexEntry, LeafBox, Neighbor, RecordId, SignatureTree};
