use crate::arena::TypedArena;
use crate::error::Result;
use crate::treap::node::NodeRef;
use crate::treap::tree;
use log::debug;
use rand::{Rng, SeedableRng, XorShiftRng};
use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;
use std::ops::{Index, IndexMut};

const DEFAULT_CHUNK_SIZE: usize = 1024;

/// The rank reported for an absent node.
pub const INVALID_RANK: isize = -1;

/// An ordered map implemented by a treap with subtree sizes.
///
/// A treap is a tree that satisfies both the binary search tree property and a heap property.
/// Each node has a key, a value, and a randomly generated priority. The key of any node is
/// greater than all keys in its left subtree and less than all keys in its right subtree, and the
/// priority of a node is never greater than the priorities of its children. By randomly
/// generating priorities, the expected height of the tree is proportional to the logarithm of
/// the number of keys. Every node also caches the size of its subtree, which answers rank and
/// k-th element queries in expected logarithmic time.
///
/// Nodes live in an arena owned by the map and are named by `NodeRef` handles, so a query can
/// return a position in the tree that is later passed to `successor`, `rank`, or `erase`.
///
/// # Examples
///
/// ```
/// use rank_treap::treap::TreapMap;
///
/// let mut map = TreapMap::new();
/// for key in &[5, 3, 8, 1, 4] {
///     map.insert(*key, key * 10);
/// }
///
/// let node = map.find(&4).unwrap();
/// assert_eq!(map.rank(Some(node)), 2);
/// assert_eq!(map.value(node), &40);
///
/// let first = map.kth(0).unwrap();
/// assert_eq!(map.key(first), &1);
/// assert_eq!(map.successor(Some(first)).map(|node| *map.key(node)), Some(3));
///
/// let node = map.upper_bound(&4);
/// assert_eq!(map.erase(node), Some((5, 50)));
/// assert_eq!(map.len(), 4);
/// ```
pub struct TreapMap<T, U> {
    arena: tree::Arena<T, U>,
    root: tree::Tree,
    rng: XorShiftRng,
}

impl<T, U> TreapMap<T, U> {
    fn with_parts(chunk_size: usize, rng: XorShiftRng) -> Self {
        TreapMap {
            arena: TypedArena::new(chunk_size),
            root: None,
            rng,
        }
    }

    /// Constructs a new, empty `TreapMap<T, U>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let map: TreapMap<u32, u32> = TreapMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_parts(DEFAULT_CHUNK_SIZE, XorShiftRng::new_unseeded())
    }

    /// Constructs a new, empty `TreapMap<T, U>` whose priorities are drawn from a generator
    /// seeded with `seed`. Two maps built from the same seed and the same operations have the
    /// same shape.
    ///
    /// # Panics
    ///
    /// Panics if `seed` is all zeros.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let map: TreapMap<u32, u32> = TreapMap::with_seed([1, 2, 3, 4]);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_seed(seed: [u32; 4]) -> Self {
        Self::with_parts(DEFAULT_CHUNK_SIZE, XorShiftRng::from_seed(seed))
    }

    /// Constructs a new, empty `TreapMap<T, U>` that reserves node storage `chunk_size` nodes at
    /// a time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let map: TreapMap<u32, u32> = TreapMap::with_chunk_size(64);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self::with_parts(chunk_size, XorShiftRng::new_unseeded())
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        tree::len(&self.arena, self.root)
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Removes every entry from the map. Node storage is kept for reuse.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(2, 2);
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.front(), None);
    /// ```
    pub fn clear(&mut self) {
        debug!("clearing treap of {} nodes", self.len());
        tree::clear(&mut self.arena, self.root.take());
    }

    /// Returns the key of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not refer to a live node.
    pub fn key(&self, node: NodeRef) -> &T {
        &self.arena[node.0].key
    }

    /// Returns the value of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not refer to a live node.
    pub fn value(&self, node: NodeRef) -> &U {
        &self.arena[node.0].value
    }

    /// Returns a mutable reference to the value of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not refer to a live node.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// let node = map.insert(1, 1);
    /// *map.value_mut(node) = 2;
    /// assert_eq!(map.get(&1), Some(&2));
    /// ```
    pub fn value_mut(&mut self, node: NodeRef) -> &mut U {
        &mut self.arena[node.0].value
    }

    /// Returns the key-value pair of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not refer to a live node.
    pub fn entry(&self, node: NodeRef) -> (&T, &U) {
        let node = &self.arena[node.0];
        (&node.key, &node.value)
    }

    /// Returns the node with the minimum key, or `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(3, 3);
    /// map.insert(1, 1);
    /// assert_eq!(map.front().map(|node| map.key(node)), Some(&1));
    /// ```
    pub fn front(&self) -> Option<NodeRef> {
        tree::min(&self.arena, self.root).map(NodeRef)
    }

    /// Returns the node with the maximum key, or `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(3, 3);
    /// map.insert(1, 1);
    /// assert_eq!(map.back().map(|node| map.key(node)), Some(&3));
    /// ```
    pub fn back(&self) -> Option<NodeRef> {
        tree::max(&self.arena, self.root).map(NodeRef)
    }

    /// Returns the node with the smallest key greater than the key of `node`. Returns `None` if
    /// `node` is `None` or holds the maximum key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// let next = map.successor(map.front());
    /// assert_eq!(next.map(|node| map.key(node)), Some(&3));
    /// assert_eq!(map.successor(next), None);
    /// ```
    pub fn successor(&self, node: Option<NodeRef>) -> Option<NodeRef> {
        node.and_then(|node| tree::successor(&self.arena, node.0))
            .map(NodeRef)
    }

    /// Returns the node with the largest key less than the key of `node`. Returns `None` if
    /// `node` is `None` or holds the minimum key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// let prev = map.predecessor(map.back());
    /// assert_eq!(prev.map(|node| map.key(node)), Some(&1));
    /// assert_eq!(map.predecessor(prev), None);
    /// ```
    pub fn predecessor(&self, node: Option<NodeRef>) -> Option<NodeRef> {
        node.and_then(|node| tree::predecessor(&self.arena, node.0))
            .map(NodeRef)
    }

    /// Returns the number of keys less than the key of `node`, which is its 0-based position
    /// in key order. Returns `INVALID_RANK` (-1) if `node` is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::{TreapMap, INVALID_RANK};
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.rank(map.back()), 1);
    /// assert_eq!(map.rank(None), INVALID_RANK);
    /// ```
    pub fn rank(&self, node: Option<NodeRef>) -> isize {
        match node {
            Some(node) => tree::rank(&self.arena, node.0) as isize,
            None => INVALID_RANK,
        }
    }

    /// Returns the node at 0-based position `k` in key order. Returns `None` if `k` is negative
    /// or not less than the size of the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.kth(1).map(|node| map.key(node)), Some(&3));
    /// assert_eq!(map.kth(2), None);
    /// assert_eq!(map.kth(-1), None);
    /// ```
    pub fn kth(&self, k: isize) -> Option<NodeRef> {
        if k < 0 {
            return None;
        }
        tree::kth(&self.arena, self.root, k as usize).map(NodeRef)
    }

    /// Removes `node` from the map and returns its key-value pair. Does nothing and returns
    /// `None` if `node` is `None`.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not refer to a live node.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.erase(map.find(&1)), Some((1, 1)));
    /// assert_eq!(map.erase(map.find(&1)), None);
    /// ```
    pub fn erase(&mut self, node: Option<NodeRef>) -> Option<(T, U)> {
        let &mut TreapMap {
            ref mut arena,
            ref mut root,
            ..
        } = self;
        node.map(|node| {
            let node = tree::erase(arena, root, node.0);
            (node.key, node.value)
        })
    }

    /// Returns an iterator over the map. The iterator will yield key-value pairs in key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(3, 4);
    /// map.insert(1, 2);
    ///
    /// let mut iterator = map.iter();
    /// assert_eq!(iterator.next(), Some((&1, &2)));
    /// assert_eq!(iterator.next(), Some((&3, &4)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> TreapMapIter<'_, T, U> {
        TreapMapIter {
            map: self,
            current: self.front(),
            remaining: self.len(),
        }
    }
}

impl<T, U> TreapMap<T, U>
where
    T: Ord,
{
    /// Inserts a key-value pair into the map and returns the node holding `key`. If the key
    /// already exists, the map is left unchanged and the existing node is returned; its value
    /// is not replaced.
    ///
    /// # Panics
    ///
    /// Panics if storage for the new node cannot be reserved. Use `try_insert` to handle
    /// allocation failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// let node = map.insert(1, 1);
    /// assert_eq!(map.insert(1, 2), node);
    /// assert_eq!(map.get(&1), Some(&1));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: T, value: U) -> NodeRef {
        match self.try_insert(key, value) {
            Ok(node) => node,
            Err(error) => panic!("Error: {}", error),
        }
    }

    /// Inserts a key-value pair into the map like `insert`, but returns an error instead of
    /// panicking if storage for the new node cannot be reserved. The map is unchanged on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// let node = map.try_insert(1, 1).unwrap();
    /// assert_eq!(map.key(node), &1);
    /// ```
    pub fn try_insert(&mut self, key: T, value: U) -> Result<NodeRef> {
        let &mut TreapMap {
            ref mut arena,
            ref mut root,
            ref mut rng,
        } = self;
        let priority = rng.next_u32();
        tree::insert(arena, root, key, value, priority).map(NodeRef)
    }

    /// Returns the node holding `key`, or `None` if the key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// let node = map.insert(1, 1);
    /// assert_eq!(map.find(&1), Some(node));
    /// assert_eq!(map.find(&0), None);
    /// ```
    pub fn find<V>(&self, key: &V) -> Option<NodeRef>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        tree::find(&self.arena, self.root, key).map(NodeRef)
    }

    /// Returns the node with the smallest key greater than or equal to `key`, or `None` if no
    /// such key exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.lower_bound(&1).map(|node| map.key(node)), Some(&1));
    /// assert_eq!(map.lower_bound(&2).map(|node| map.key(node)), Some(&3));
    /// assert_eq!(map.lower_bound(&4), None);
    /// ```
    pub fn lower_bound<V>(&self, key: &V) -> Option<NodeRef>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        tree::ceil(&self.arena, self.root, key, false).map(NodeRef)
    }

    /// Returns the node with the smallest key strictly greater than `key`, or `None` if no such
    /// key exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.upper_bound(&1).map(|node| map.key(node)), Some(&3));
    /// assert_eq!(map.upper_bound(&3), None);
    /// ```
    pub fn upper_bound<V>(&self, key: &V) -> Option<NodeRef>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        tree::ceil(&self.arena, self.root, key, true).map(NodeRef)
    }

    /// Returns the node with the largest key less than or equal to `key`, or `None` if no such
    /// key exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.floor(&2).map(|node| map.key(node)), Some(&1));
    /// assert_eq!(map.floor(&0), None);
    /// ```
    pub fn floor<V>(&self, key: &V) -> Option<NodeRef>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        tree::floor(&self.arena, self.root, key).map(NodeRef)
    }

    /// Checks if a key exists in the map.
    pub fn contains<V>(&self, key: &V) -> bool
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns an immutable reference to the value associated with a particular key, or `None`
    /// if the key does not exist.
    pub fn get<V>(&self, key: &V) -> Option<&U>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.find(key).map(|node| self.value(node))
    }

    /// Returns a mutable reference to the value associated with a particular key, or `None`
    /// if the key does not exist.
    pub fn get_mut<V>(&mut self, key: &V) -> Option<&mut U>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let node = self.find(key)?;
        Some(self.value_mut(node))
    }

    /// Removes the entry with a particular key and returns it, or `None` if the key does not
    /// exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.remove(&1), Some((1, 1)));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<V>(&mut self, key: &V) -> Option<(T, U)>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let node = self.find(key);
        self.erase(node)
    }
}

impl<T, U> TreapMap<T, U>
where
    T: Ord,
    U: Default,
{
    /// Returns a mutable reference to the value associated with `key`, first inserting a
    /// default value if the key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::treap::TreapMap;
    ///
    /// let mut map: TreapMap<u32, u32> = TreapMap::new();
    /// *map.get_or_insert_default(1) += 5;
    /// *map.get_or_insert_default(1) += 5;
    /// assert_eq!(map.get(&1), Some(&10));
    /// ```
    pub fn get_or_insert_default(&mut self, key: T) -> &mut U {
        let node = self.insert(key, U::default());
        self.value_mut(node)
    }
}

impl<T, U> Clone for TreapMap<T, U>
where
    T: Clone,
    U: Clone,
{
    fn clone(&self) -> Self {
        debug!("cloning treap of {} nodes", self.len());
        let mut arena = TypedArena::new(self.arena.chunk_size());
        let root = tree::clone_into(&self.arena, self.root, &mut arena);
        TreapMap {
            arena,
            root,
            rng: self.rng.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();
        debug!("cloning treap of {} nodes into existing storage", source.len());
        self.root = tree::clone_into(&source.arena, source.root, &mut self.arena);
        self.rng = source.rng.clone();
    }
}

impl<T, U> Default for TreapMap<T, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, U> fmt::Debug for TreapMap<T, U>
where
    T: fmt::Debug,
    U: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T, U> FromIterator<(T, U)> for TreapMap<T, U>
where
    T: Ord,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
    {
        let mut map = TreapMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<'a, T, U, V> Index<&'a V> for TreapMap<T, U>
where
    T: Ord + Borrow<V>,
    V: Ord + ?Sized,
{
    type Output = U;

    fn index(&self, key: &V) -> &Self::Output {
        self.get(key).expect("Error: key does not exist.")
    }
}

impl<'a, T, U, V> IndexMut<&'a V> for TreapMap<T, U>
where
    T: Ord + Borrow<V>,
    V: Ord + ?Sized,
{
    fn index_mut(&mut self, key: &V) -> &mut Self::Output {
        self.get_mut(key).expect("Error: key does not exist.")
    }
}

impl<T, U> IntoIterator for TreapMap<T, U> {
    type Item = (T, U);
    type IntoIter = TreapMapIntoIter<T, U>;

    fn into_iter(self) -> Self::IntoIter {
        TreapMapIntoIter { map: self }
    }
}

impl<'a, T, U> IntoIterator for &'a TreapMap<T, U>
where
    T: 'a,
    U: 'a,
{
    type Item = (&'a T, &'a U);
    type IntoIter = TreapMapIter<'a, T, U>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `TreapMap<T, U>`.
///
/// This iterator removes the minimum entry of the map on every step and yields it.
pub struct TreapMapIntoIter<T, U> {
    map: TreapMap<T, U>,
}

impl<T, U> Iterator for TreapMapIntoIter<T, U> {
    type Item = (T, U);

    fn next(&mut self) -> Option<Self::Item> {
        let front = self.map.front();
        self.map.erase(front)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.map.len();
        (len, Some(len))
    }
}

/// An iterator for `TreapMap<T, U>`.
///
/// This iterator walks successor links from the minimum node and yields immutable references.
pub struct TreapMapIter<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    map: &'a TreapMap<T, U>,
    current: Option<NodeRef>,
    remaining: usize,
}

impl<'a, T, U> Iterator for TreapMapIter<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    type Item = (&'a T, &'a U);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        let map = self.map;
        self.current = map.successor(Some(node));
        self.remaining -= 1;
        Some(map.entry(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::{TreapMap, INVALID_RANK};
    use crate::arena::Handle;

    // Walks the whole tree and checks key order, heap order, cached sizes, and parent links.
    // Returns the number of reachable nodes.
    fn check_invariants<T: Ord, U>(map: &TreapMap<T, U>) -> usize {
        fn check<T: Ord, U>(
            map: &TreapMap<T, U>,
            node: Handle,
            parent: Option<Handle>,
            lower: Option<&T>,
            upper: Option<&T>,
        ) -> usize {
            let curr = &map.arena[node];
            assert_eq!(curr.parent, parent);
            if let Some(parent) = parent {
                assert!(map.arena[parent].priority <= curr.priority);
            }
            if let Some(lower) = lower {
                assert!(lower < &curr.key);
            }
            if let Some(upper) = upper {
                assert!(&curr.key < upper);
            }

            let mut len = 1;
            if let Some(left) = curr.left {
                len += check(map, left, Some(node), lower, Some(&curr.key));
            }
            if let Some(right) = curr.right {
                len += check(map, right, Some(node), Some(&curr.key), upper);
            }
            assert_eq!(curr.len, len);
            len
        }

        let len = match map.root {
            Some(root) => check(map, root, None, None, None),
            None => 0,
        };
        assert_eq!(map.len(), len);
        assert_eq!(map.arena.len(), len);
        len
    }

    fn keys(map: &TreapMap<u32, u32>) -> Vec<u32> {
        map.iter().map(|(key, _)| *key).collect()
    }

    #[test]
    fn test_len_empty() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_queries_empty() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        assert_eq!(map.find(&1), None);
        assert_eq!(map.lower_bound(&1), None);
        assert_eq!(map.upper_bound(&1), None);
        assert_eq!(map.front(), None);
        assert_eq!(map.back(), None);
        assert_eq!(map.kth(0), None);
        assert_eq!(map.successor(None), None);
        assert_eq!(map.predecessor(None), None);
        assert_eq!(map.rank(None), INVALID_RANK);
    }

    #[test]
    fn test_insert() {
        let mut map = TreapMap::new();
        let node = map.insert(1, 1);
        assert_eq!(map.find(&1), Some(node));
        assert_eq!(map.entry(node), (&1, &1));
        check_invariants(&map);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut map = TreapMap::new();
        map.insert(2, 2);
        let node = map.insert(1, 1);
        assert_eq!(map.insert(1, 3), node);
        assert_eq!(map.get(&1), Some(&1));
        assert_eq!(map.len(), 2);
        assert_eq!(keys(&map), vec![1, 2]);
        check_invariants(&map);
    }

    #[test]
    fn test_sample_scenario() {
        let mut map = TreapMap::new();
        for key in &[5, 3, 8, 1, 4] {
            map.insert(*key, *key);
        }
        check_invariants(&map);
        assert_eq!(keys(&map), vec![1, 3, 4, 5, 8]);

        assert_eq!(map.kth(0).map(|node| *map.key(node)), Some(1));
        assert_eq!(map.kth(4).map(|node| *map.key(node)), Some(8));
        assert_eq!(map.kth(5), None);
        assert_eq!(map.kth(-1), None);
        assert_eq!(map.rank(map.find(&4)), 2);
        assert_eq!(map.lower_bound(&4), map.find(&4));
        assert_eq!(map.upper_bound(&4), map.find(&5));

        let node = map.find(&5);
        assert_eq!(map.erase(node), Some((5, 5)));
        check_invariants(&map);
        assert_eq!(keys(&map), vec![1, 3, 4, 8]);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_erase_none() {
        let mut map = TreapMap::new();
        map.insert(1, 1);
        assert_eq!(map.erase(None), None);
        assert_eq!(map.len(), 1);
        check_invariants(&map);
    }

    #[test]
    fn test_erase_root_only() {
        let mut map = TreapMap::new();
        let node = map.insert(1, 1);
        assert_eq!(map.erase(Some(node)), Some((1, 1)));
        assert!(map.is_empty());
        assert_eq!(map.front(), None);
        check_invariants(&map);
    }

    #[test]
    fn test_successor_predecessor() {
        let mut map = TreapMap::new();
        for key in 0..32 {
            map.insert(key * 2, key);
        }

        let mut node = map.front();
        for key in 0..32 {
            assert_eq!(node.map(|node| *map.key(node)), Some(key * 2));
            node = map.successor(node);
        }
        assert_eq!(node, None);

        let mut node = map.back();
        for key in (0..32).rev() {
            assert_eq!(node.map(|node| *map.key(node)), Some(key * 2));
            node = map.predecessor(node);
        }
        assert_eq!(node, None);
    }

    #[test]
    fn test_bounds() {
        let mut map = TreapMap::new();
        map.insert(1, 1);
        map.insert(3, 3);
        map.insert(5, 5);

        let key_of = |node| map.key(node);
        assert_eq!(map.lower_bound(&0).map(key_of), Some(&1));
        assert_eq!(map.lower_bound(&3).map(key_of), Some(&3));
        assert_eq!(map.lower_bound(&6).map(key_of), None);
        assert_eq!(map.upper_bound(&0).map(key_of), Some(&1));
        assert_eq!(map.upper_bound(&3).map(key_of), Some(&5));
        assert_eq!(map.upper_bound(&5).map(key_of), None);
        assert_eq!(map.floor(&0).map(key_of), None);
        assert_eq!(map.floor(&4).map(key_of), Some(&3));
        assert_eq!(map.floor(&5).map(key_of), Some(&5));
    }

    #[test]
    fn test_rank_kth_inverse() {
        let mut map = TreapMap::with_seed([3, 1, 4, 1]);
        for key in (0..200).rev() {
            map.insert(key * 7 % 211, key);
        }
        check_invariants(&map);
        for k in 0..map.len() as isize {
            assert_eq!(map.rank(map.kth(k)), k);
        }
    }

    #[test]
    fn test_ascending_inserts_stay_balanced() {
        let mut map = TreapMap::with_seed([1, 1, 1, 1]);
        for key in 0..4096 {
            map.insert(key, key);
        }
        check_invariants(&map);

        fn height(map: &TreapMap<u32, u32>, node: Option<Handle>) -> usize {
            match node {
                Some(node) => {
                    1 + height(map, map.arena[node].left).max(height(map, map.arena[node].right))
                },
                None => 0,
            }
        }
        // a degenerate chain would be 4096 deep
        assert!(height(&map, map.root) < 64);
    }

    #[test]
    fn test_interleaved_insert_erase() {
        let mut map = TreapMap::with_seed([9, 8, 7, 6]);
        for key in 0..500 {
            map.insert(key * 31 % 499, key);
            if key % 3 == 0 {
                let victim = map.kth((key as isize * 13) % map.len() as isize);
                map.erase(victim);
            }
            check_invariants(&map);
        }
    }

    #[test]
    fn test_get_or_insert_default() {
        let mut map: TreapMap<&str, Vec<u32>> = TreapMap::new();
        map.get_or_insert_default("a").push(1);
        map.get_or_insert_default("a").push(2);
        map.get_or_insert_default("b");
        assert_eq!(map.get("a"), Some(&vec![1, 2]));
        assert_eq!(map.get("b"), Some(&vec![]));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_index() {
        let mut map = TreapMap::new();
        map.insert(String::from("a"), 1);
        map["a"] += 1;
        assert_eq!(map["a"], 2);
    }

    #[test]
    #[should_panic]
    fn test_index_missing() {
        let map: TreapMap<u32, u32> = TreapMap::new();
        let _value = map[&0];
    }

    #[test]
    fn test_clone_independent() {
        let mut map = TreapMap::new();
        for key in 0..10 {
            map.insert(key, key);
        }
        let mut copy = map.clone();
        check_invariants(&copy);
        assert_eq!(keys(&copy), keys(&map));

        copy.insert(10, 10);
        let node = copy.find(&0);
        copy.erase(node);
        assert_eq!(keys(&map), (0..10).collect::<Vec<u32>>());
        assert_eq!(keys(&copy), (1..11).collect::<Vec<u32>>());

        map.remove(&5);
        assert!(copy.contains(&5));
        check_invariants(&map);
        check_invariants(&copy);
    }

    #[test]
    fn test_clone_from() {
        let mut source = TreapMap::new();
        for key in 0..10 {
            source.insert(key, key);
        }
        let mut target = TreapMap::new();
        for key in 100..200 {
            target.insert(key, key);
        }
        target.clone_from(&source);
        check_invariants(&target);
        assert_eq!(keys(&target), keys(&source));
        assert_eq!(target.kth(3).map(|node| *target.key(node)), Some(3));
    }

    #[test]
    fn test_clear_reuses_storage() {
        let mut map = TreapMap::with_chunk_size(16);
        for key in 0..100 {
            map.insert(key, key);
        }
        let capacity = map.arena.capacity();
        map.clear();
        check_invariants(&map);
        assert!(map.arena.is_empty());

        for key in 0..100 {
            map.insert(key, key);
        }
        assert_eq!(map.arena.capacity(), capacity);
        check_invariants(&map);
    }

    #[test]
    fn test_iter() {
        let map: TreapMap<u32, u32> = vec![(5, 6), (1, 2), (3, 4), (1, 7)].into_iter().collect();
        assert_eq!(
            map.iter().collect::<Vec<(&u32, &u32)>>(),
            vec![(&1, &2), (&3, &4), (&5, &6)],
        );
        assert_eq!(map.iter().size_hint(), (3, Some(3)));
    }

    #[test]
    fn test_into_iter() {
        let mut map = TreapMap::new();
        map.insert(1, 2);
        map.insert(5, 6);
        map.insert(3, 4);

        assert_eq!(
            map.into_iter().collect::<Vec<(u32, u32)>>(),
            vec![(1, 2), (3, 4), (5, 6)],
        );
    }

    #[test]
    fn test_debug() {
        let mut map = TreapMap::new();
        map.insert(2, "b");
        map.insert(1, "a");
        assert_eq!(format!("{:?}", map), r#"{1: "a", 2: "b"}"#);
    }
}
