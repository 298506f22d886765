use crate::arena::Handle;

/// A struct representing an internal node of a treap.
///
/// `left` and `right` are the owning edges of the tree and `parent` is a back-reference used
/// only to walk upwards. All three are handles into the arena that owns every node.
pub struct Node<T, U> {
    pub key: T,
    pub value: U,
    pub priority: u32,
    pub len: usize,
    pub left: Option<Handle>,
    pub right: Option<Handle>,
    pub parent: Option<Handle>,
}

impl<T, U> Node<T, U> {
    pub fn new(key: T, value: U, priority: u32, parent: Option<Handle>) -> Self {
        Node {
            key,
            value,
            priority,
            len: 1,
            left: None,
            right: None,
            parent,
        }
    }
}

impl<T, U> Node<T, U>
where
    T: Clone,
    U: Clone,
{
    /// Copies the key, value, and priority of this node into a detached node. The subtree size
    /// is reset and has to be recomputed once the children are linked.
    pub fn duplicate(&self, parent: Option<Handle>) -> Self {
        Node::new(self.key.clone(), self.value.clone(), self.priority, parent)
    }
}

/// An opaque reference to a node of a `TreapMap<T, U>`.
///
/// A `NodeRef` is only meaningful for the map that returned it, and only until that node is
/// erased or the map is cleared. Using a stale `NodeRef` panics, or names whichever entry was
/// later stored in the same slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeRef(pub(crate) Handle);
