//! Chunked slab storage addressed by stable handles.

use crate::error::Result;
use log::trace;
use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A handle to an object stored in a `TypedArena<T>`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle {
    chunk_index: usize,
    block_index: usize,
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<Handle>),
}

/// A slab allocator that stores a single type of object and hands out `Copy` handles.
///
/// Objects are stored in fixed-capacity chunks, so a chunk is never reallocated once created
/// and handles stay valid until the object they name is freed. Freed blocks are threaded onto
/// a free list and are reused before a new chunk is requested. All objects still inside the
/// arena are dropped with it.
///
/// # Examples
///
/// ```
/// use rank_treap::arena::TypedArena;
///
/// let mut arena = TypedArena::new(1024);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
///
/// assert_eq!(arena.free(&x), 2);
/// assert!(arena.is_empty());
/// ```
pub struct TypedArena<T> {
    head: Option<Handle>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    len: usize,
    capacity: usize,
}

impl<T> TypedArena<T> {
    fn is_valid_handle(&self, handle: &Handle) -> bool {
        handle.chunk_index < self.chunks.len()
            && handle.block_index < self.chunks[handle.chunk_index].len()
    }

    /// Constructs a new, empty `TypedArena<T>` with a specific number of objects per chunk.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::arena::TypedArena;
    ///
    /// let arena: TypedArena<u32> = TypedArena::new(1024);
    /// assert_eq!(arena.chunk_size(), 1024);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Error: chunk size must be positive.");
        TypedArena {
            head: None,
            chunks: Vec::new(),
            chunk_size,
            len: 0,
            capacity: 0,
        }
    }

    fn push_block(&mut self, value: T) -> Handle {
        self.len += 1;
        match self.head.take() {
            None => {
                let chunk_count = self.chunks.len();
                let last_chunk = &mut self.chunks[chunk_count - 1];
                last_chunk.push(Block::Occupied(value));
                Handle {
                    chunk_index: chunk_count - 1,
                    block_index: last_chunk.len() - 1,
                }
            },
            Some(handle) => {
                let vacant_block = mem::replace(
                    &mut self.chunks[handle.chunk_index][handle.block_index],
                    Block::Occupied(value),
                );
                match vacant_block {
                    Block::Vacant(next_handle) => {
                        self.head = next_handle;
                        handle
                    },
                    Block::Occupied(_) => panic!("Error: free list points at an occupied block."),
                }
            },
        }
    }

    /// Allocates an object in the arena and returns its handle.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    pub fn allocate(&mut self, value: T) -> Handle {
        if self.len == self.capacity {
            trace!("arena growing to {} chunks of {} blocks", self.chunks.len() + 1, self.chunk_size);
            self.chunks.push(Vec::with_capacity(self.chunk_size));
            self.capacity += self.chunk_size;
        }
        self.push_block(value)
    }

    /// Allocates an object in the arena, returning an error instead of aborting if a new chunk
    /// cannot be reserved. The arena is unchanged on failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.try_allocate(7).unwrap();
    /// assert_eq!(arena[x], 7);
    /// ```
    pub fn try_allocate(&mut self, value: T) -> Result<Handle> {
        if self.len == self.capacity {
            trace!("arena growing to {} chunks of {} blocks", self.chunks.len() + 1, self.chunk_size);
            let mut chunk = Vec::new();
            chunk.try_reserve_exact(self.chunk_size)?;
            self.chunks.try_reserve(1)?;
            self.chunks.push(chunk);
            self.capacity += self.chunk_size;
        }
        Ok(self.push_block(value))
    }

    /// Deallocates an object in the arena and returns it. The freed block will be handed out
    /// again by a later allocation.
    ///
    /// # Panics
    ///
    /// Panics if `handle` corresponds to an invalid or vacant block.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.free(&x), 0);
    /// assert_eq!(arena.get(&x), None);
    /// ```
    pub fn free(&mut self, handle: &Handle) -> T {
        if !self.is_valid_handle(handle) {
            panic!("Error: attempting to free invalid block.");
        }
        let block = &mut self.chunks[handle.chunk_index][handle.block_index];
        if let Block::Vacant(_) = block {
            panic!("Error: attempting to free vacant block.");
        }
        match mem::replace(block, Block::Vacant(self.head.take())) {
            Block::Occupied(value) => {
                self.len -= 1;
                self.head = Some(*handle);
                value
            },
            Block::Vacant(_) => unreachable!(),
        }
    }

    /// Returns an immutable reference to an object in the arena, or `None` if the handle does
    /// not name a live object.
    pub fn get(&self, handle: &Handle) -> Option<&T> {
        if !self.is_valid_handle(handle) {
            return None;
        }
        match self.chunks[handle.chunk_index][handle.block_index] {
            Block::Occupied(ref value) => Some(value),
            Block::Vacant(_) => None,
        }
    }

    /// Returns a mutable reference to an object in the arena, or `None` if the handle does not
    /// name a live object.
    pub fn get_mut(&mut self, handle: &Handle) -> Option<&mut T> {
        if !self.is_valid_handle(handle) {
            return None;
        }
        match self.chunks[handle.chunk_index][handle.block_index] {
            Block::Occupied(ref mut value) => Some(value),
            Block::Vacant(_) => None,
        }
    }

    /// Returns the number of live objects in the arena.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of blocks reserved across all chunks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<T> Index<Handle> for TypedArena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &Self::Output {
        self.get(&handle).expect("Error: handle does not refer to a live block.")
    }
}

impl<T> IndexMut<Handle> for TypedArena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        self.get_mut(&handle).expect("Error: handle does not refer to a live block.")
    }
}
