use crate::arena::{Handle, TypedArena};
use crate::error::Result;
use crate::treap::node::Node;
use std::borrow::Borrow;
use std::cmp::Ordering;

pub type Tree = Option<Handle>;
pub type Arena<T, U> = TypedArena<Node<T, U>>;

pub fn len<T, U>(arena: &Arena<T, U>, tree: Tree) -> usize {
    match tree {
        Some(node) => arena[node].len,
        None => 0,
    }
}

pub fn update<T, U>(arena: &mut Arena<T, U>, node: Handle) {
    let new_len = 1 + len(arena, arena[node].left) + len(arena, arena[node].right);
    arena[node].len = new_len;
}

fn propagate<T, U>(arena: &mut Arena<T, U>, mut tree: Tree) {
    while let Some(node) = tree {
        update(arena, node);
        tree = arena[node].parent;
    }
}

// Points whichever edge of `parent` currently holds `old` at `new`. A missing parent means `old`
// is the root.
fn replace_child<T, U>(
    arena: &mut Arena<T, U>,
    root: &mut Tree,
    parent: Tree,
    old: Handle,
    new: Tree,
) {
    match parent {
        None => *root = new,
        Some(parent) => {
            if arena[parent].left == Some(old) {
                arena[parent].left = new;
            } else {
                arena[parent].right = new;
            }
        },
    }
}

// precondition: `node` has a right child
fn rotate_left<T, U>(arena: &mut Arena<T, U>, root: &mut Tree, node: Handle) {
    let child = match arena[node].right {
        Some(child) => child,
        None => unreachable!(),
    };
    let inner = arena[child].left;
    arena[node].right = inner;
    if let Some(inner) = inner {
        arena[inner].parent = Some(node);
    }

    let parent = arena[node].parent;
    arena[child].parent = parent;
    replace_child(arena, root, parent, node, Some(child));

    arena[child].left = Some(node);
    arena[node].parent = Some(child);
    update(arena, node);
    update(arena, child);
}

// precondition: `node` has a left child
fn rotate_right<T, U>(arena: &mut Arena<T, U>, root: &mut Tree, node: Handle) {
    let child = match arena[node].left {
        Some(child) => child,
        None => unreachable!(),
    };
    let inner = arena[child].right;
    arena[node].left = inner;
    if let Some(inner) = inner {
        arena[inner].parent = Some(node);
    }

    let parent = arena[node].parent;
    arena[child].parent = parent;
    replace_child(arena, root, parent, node, Some(child));

    arena[child].right = Some(node);
    arena[node].parent = Some(child);
    update(arena, node);
    update(arena, child);
}

/// Inserts a new node unless `key` is already present. Returns the handle of the node holding
/// `key`.
pub fn insert<T, U>(
    arena: &mut Arena<T, U>,
    root: &mut Tree,
    key: T,
    value: U,
    priority: u32,
) -> Result<Handle>
where
    T: Ord,
{
    let mut parent = None;
    let mut is_left = false;
    let mut curr = *root;
    while let Some(node) = curr {
        parent = curr;
        match key.cmp(&arena[node].key) {
            Ordering::Less => {
                is_left = true;
                curr = arena[node].left;
            },
            Ordering::Greater => {
                is_left = false;
                curr = arena[node].right;
            },
            Ordering::Equal => return Ok(node),
        }
    }

    let new_node = arena.try_allocate(Node::new(key, value, priority, parent))?;
    match parent {
        None => *root = Some(new_node),
        Some(parent) if is_left => arena[parent].left = Some(new_node),
        Some(parent) => arena[parent].right = Some(new_node),
    }
    propagate(arena, parent);

    while let Some(parent) = arena[new_node].parent {
        if arena[parent].priority <= arena[new_node].priority {
            break;
        }
        if arena[parent].left == Some(new_node) {
            rotate_right(arena, root, parent);
        } else {
            rotate_left(arena, root, parent);
        }
    }
    propagate(arena, Some(new_node));

    Ok(new_node)
}

/// Rotates `node` down until it is a leaf, unlinks it, and returns it.
pub fn erase<T, U>(arena: &mut Arena<T, U>, root: &mut Tree, node: Handle) -> Node<T, U> {
    loop {
        match (arena[node].left, arena[node].right) {
            (None, None) => break,
            (Some(_), None) => rotate_right(arena, root, node),
            (None, Some(_)) => rotate_left(arena, root, node),
            (Some(left), Some(right)) => {
                if arena[left].priority <= arena[right].priority {
                    rotate_right(arena, root, node);
                } else {
                    rotate_left(arena, root, node);
                }
            },
        }
    }

    let parent = arena[node].parent;
    replace_child(arena, root, parent, node, None);
    propagate(arena, parent);
    arena.free(&node)
}

pub fn find<T, U, V>(arena: &Arena<T, U>, tree: Tree, key: &V) -> Tree
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut curr = tree;
    while let Some(node) = curr {
        match key.cmp(arena[node].key.borrow()) {
            Ordering::Less => curr = arena[node].left,
            Ordering::Greater => curr = arena[node].right,
            Ordering::Equal => return curr,
        }
    }
    None
}

/// Returns the node with the smallest key that is greater than or equal to `key`, or strictly
/// greater if `strict` is set.
pub fn ceil<T, U, V>(arena: &Arena<T, U>, tree: Tree, key: &V, strict: bool) -> Tree
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut ret = None;
    let mut curr = tree;
    while let Some(node) = curr {
        let qualifies = match key.cmp(arena[node].key.borrow()) {
            Ordering::Less => true,
            Ordering::Equal => !strict,
            Ordering::Greater => false,
        };
        if qualifies {
            ret = curr;
            curr = arena[node].left;
        } else {
            curr = arena[node].right;
        }
    }
    ret
}

pub fn floor<T, U, V>(arena: &Arena<T, U>, tree: Tree, key: &V) -> Tree
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut ret = None;
    let mut curr = tree;
    while let Some(node) = curr {
        if key.cmp(arena[node].key.borrow()) != Ordering::Less {
            ret = curr;
            curr = arena[node].right;
        } else {
            curr = arena[node].left;
        }
    }
    ret
}

pub fn min<T, U>(arena: &Arena<T, U>, tree: Tree) -> Tree {
    let mut curr = tree?;
    while let Some(left) = arena[curr].left {
        curr = left;
    }
    Some(curr)
}

pub fn max<T, U>(arena: &Arena<T, U>, tree: Tree) -> Tree {
    let mut curr = tree?;
    while let Some(right) = arena[curr].right {
        curr = right;
    }
    Some(curr)
}

pub fn successor<T, U>(arena: &Arena<T, U>, node: Handle) -> Tree {
    if arena[node].right.is_some() {
        return min(arena, arena[node].right);
    }
    let mut curr = node;
    while let Some(parent) = arena[curr].parent {
        if arena[parent].left == Some(curr) {
            return Some(parent);
        }
        curr = parent;
    }
    None
}

pub fn predecessor<T, U>(arena: &Arena<T, U>, node: Handle) -> Tree {
    if arena[node].left.is_some() {
        return max(arena, arena[node].left);
    }
    let mut curr = node;
    while let Some(parent) = arena[curr].parent {
        if arena[parent].right == Some(curr) {
            return Some(parent);
        }
        curr = parent;
    }
    None
}

pub fn rank<T, U>(arena: &Arena<T, U>, node: Handle) -> usize {
    let mut ret = len(arena, arena[node].left);
    let mut curr = node;
    while let Some(parent) = arena[curr].parent {
        if arena[parent].right == Some(curr) {
            ret += 1 + len(arena, arena[parent].left);
        }
        curr = parent;
    }
    ret
}

pub fn kth<T, U>(arena: &Arena<T, U>, tree: Tree, mut k: usize) -> Tree {
    let mut curr = tree;
    while let Some(node) = curr {
        let left_len = len(arena, arena[node].left);
        match k.cmp(&left_len) {
            Ordering::Less => curr = arena[node].left,
            Ordering::Equal => return curr,
            Ordering::Greater => {
                k -= left_len + 1;
                curr = arena[node].right;
            },
        }
    }
    None
}

/// Copies every node reachable from `tree` into `dest`, returning the root of the copy.
///
/// Nodes are duplicated parent-first from an explicit stack, then subtree sizes are recomputed
/// children-first by walking the duplicates in reverse.
pub fn clone_into<T, U>(src: &Arena<T, U>, tree: Tree, dest: &mut Arena<T, U>) -> Tree
where
    T: Clone,
    U: Clone,
{
    let root = tree?;
    let new_root = dest.allocate(src[root].duplicate(None));
    let mut stack = vec![(root, new_root)];
    let mut order = Vec::with_capacity(len(src, tree));

    while let Some((node, new_node)) = stack.pop() {
        order.push(new_node);
        if let Some(left) = src[node].left {
            let new_left = dest.allocate(src[left].duplicate(Some(new_node)));
            dest[new_node].left = Some(new_left);
            stack.push((left, new_left));
        }
        if let Some(right) = src[node].right {
            let new_right = dest.allocate(src[right].duplicate(Some(new_node)));
            dest[new_node].right = Some(new_right);
            stack.push((right, new_right));
        }
    }

    for new_node in order.into_iter().rev() {
        update(dest, new_node);
    }
    Some(new_root)
}

/// Frees every node reachable from `tree`, children before their parent.
pub fn clear<T, U>(arena: &mut Arena<T, U>, tree: Tree) {
    let mut stack = Vec::new();
    stack.extend(tree);
    while let Some(node) = stack.pop() {
        let children = (arena[node].left.take(), arena[node].right.take());
        match children {
            (None, None) => {
                arena.free(&node);
            },
            (left, right) => {
                stack.push(node);
                stack.extend(left);
                stack.extend(right);
            },
        }
    }
}
