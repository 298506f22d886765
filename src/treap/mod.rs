//! Probabilistic binary search tree where each node also maintains the heap invariant and the
//! size of its subtree.

mod map;
mod node;
mod tree;

pub use self::map::{TreapMap, TreapMapIntoIter, TreapMapIter, INVALID_RANK};
pub use self::node::NodeRef;
