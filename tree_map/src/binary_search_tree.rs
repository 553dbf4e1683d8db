use core::fmt;
use core::marker::PhantomData;
use std::alloc::handle_alloc_error;
use std::cmp::Ordering;

use allocator_api2::alloc::{AllocError, Allocator, Global};
use compare::Compare;

use crate::node::{Node, RawNode};

/// The ordered tree engine behind [`TreeMap`](crate::TreeMap).
///
/// An unbalanced binary search tree with parent links and a persistent
/// sentinel node that stands for the position one past the maximum.
/// Degenerate shapes (for example from sorted inserts) are accepted, every
/// operation is `O(depth)`.
///
/// For simplicity we don't allow duplicate keys.
pub(crate) struct BinarySearchTree<K, V, C, A: Allocator = Global> {
    // INVARIANTS:
    //  * `sentinel` is a valid node for the whole lifetime of the tree
    //  * `sentinel.left` is the root and `sentinel.right` is the maximum node,
    //    both are `None` iff `len == 0`
    //  * every other node has a parent, the root's parent is the sentinel
    sentinel: RawNode<K, V>,
    len: usize,
    cmp: C,
    alloc: A,
    marker: PhantomData<Box<Node<K, V>>>,
}

// The tree owns its nodes like a `Box` would.
unsafe impl<K: Send, V: Send, C: Send, A: Allocator + Send> Send for BinarySearchTree<K, V, C, A> {}
unsafe impl<K: Sync, V: Sync, C: Sync, A: Allocator + Sync> Sync for BinarySearchTree<K, V, C, A> {}

impl<K, V, C, A: Allocator> Drop for BinarySearchTree<K, V, C, A> {
    fn drop(&mut self) {
        // TODO: handle panics in `K::drop` or `V::drop`, the remaining nodes and the sentinel leak
        self.clear();
        let _ = unsafe { self.sentinel.deallocate(&self.alloc) };
    }
}

impl<K, V, C, A> fmt::Debug for BinarySearchTree<K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct TreeDebug<'a, K, V> {
            first: RawNode<K, V>,
            marker: PhantomData<&'a Node<K, V>>,
        }

        impl<K, V> fmt::Debug for TreeDebug<'_, K, V>
        where
            K: fmt::Debug,
            V: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();

                let mut node = self.first;
                while !unsafe { node.is_sentinel() } {
                    f.entry(unsafe { &*node.as_ptr() });
                    match unsafe { node.next() } {
                        Some(next) => node = next,
                        None => break,
                    }
                }

                f.finish()
            }
        }

        let mut f = f.debug_struct("BinarySearchTree");
        f.field("len", &self.len);

        match self.root() {
            None => {
                f.field("root", &None::<K>);
                let nodes: &[K] = &[];
                f.field("nodes", &nodes);
            }
            Some(root) => {
                f.field("root", &Some(unsafe { &*root.as_ptr() }));
                f.field(
                    "nodes",
                    &TreeDebug {
                        first: self.first(),
                        marker: PhantomData,
                    },
                );
            }
        }

        f.finish()
    }
}

impl<K, V, C, A> Clone for BinarySearchTree<K, V, C, A>
where
    K: Clone,
    V: Clone,
    C: Clone,
    A: Allocator + Clone,
{
    /// Copies the tree node by node, so the copy has the same shape.
    fn clone(&self) -> Self {
        let mut out = Self::new_in(self.cmp.clone(), self.alloc.clone());
        let Some(root) = self.root() else {
            return out;
        };

        // Preorder walk over `self` mirrored by `dst` in `out`. A missing child
        // in `dst` where `src` has one means that subtree is not copied yet.
        // Every copy is linked in right away so that a panicking `clone` leaves
        // nothing for `out` to leak.
        unsafe {
            let mut src = root;
            let mut dst = out.clone_node(src, out.sentinel);
            out.sentinel.set_left(Some(dst));
            loop {
                if let (Some(left), None) = (src.left(), dst.left()) {
                    let copy = out.clone_node(left, dst);
                    dst.set_left(Some(copy));
                    (src, dst) = (left, copy);
                    continue;
                }
                if let (Some(right), None) = (src.right(), dst.right()) {
                    let copy = out.clone_node(right, dst);
                    dst.set_right(Some(copy));
                    (src, dst) = (right, copy);
                    continue;
                }
                if src == root {
                    break;
                }
                match (src.parent(), dst.parent()) {
                    (Some(src_parent), Some(dst_parent)) => (src, dst) = (src_parent, dst_parent),
                    _ => break,
                }
            }

            let max = out.find_max(out.root());
            out.sentinel.set_right(Some(max));
        }
        out.len = self.len;

        out
    }
}

impl<K, V, C, A: Allocator> BinarySearchTree<K, V, C, A> {
    pub(crate) fn new_in(cmp: C, alloc: A) -> Self {
        let sentinel = match RawNode::allocate(&alloc, Node::sentinel()) {
            Ok(sentinel) => sentinel,
            Err(AllocError) => handle_alloc_error(Node::<K, V>::layout()),
        };

        Self {
            sentinel,
            len: 0,
            cmp,
            alloc,
            marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn cmp(&self) -> &C {
        &self.cmp
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// The end position.
    #[inline]
    pub(crate) fn sentinel(&self) -> RawNode<K, V> {
        self.sentinel
    }

    #[inline]
    pub(crate) fn root(&self) -> Option<RawNode<K, V>> {
        unsafe { self.sentinel.left() }
    }

    /// The minimum node, or the sentinel if the tree is empty.
    #[inline]
    pub(crate) fn first(&self) -> RawNode<K, V> {
        self.find_min(self.root())
    }

    /// The maximum node, this is the sentinel's predecessor link.
    #[inline]
    pub(crate) fn last(&self) -> Option<RawNode<K, V>> {
        unsafe { self.sentinel.right() }
    }

    /// Minimum of the subtree rooted at `root`, the sentinel for an empty subtree.
    pub(crate) fn find_min(&self, root: Option<RawNode<K, V>>) -> RawNode<K, V> {
        match root {
            Some(root) => unsafe { root.min() },
            None => self.sentinel,
        }
    }

    /// Maximum of the subtree rooted at `root`, the sentinel for an empty subtree.
    pub(crate) fn find_max(&self, root: Option<RawNode<K, V>>) -> RawNode<K, V> {
        match root {
            Some(root) => unsafe { root.max() },
            None => self.sentinel,
        }
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Option<RawNode<K, V>>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut maybe_node = self.root();
        while let Some(node) = maybe_node {
            maybe_node = match self.cmp.compare(key, unsafe { node.key() }) {
                Ordering::Less => unsafe { node.left() },
                Ordering::Equal => return Some(node),
                Ordering::Greater => unsafe { node.right() },
            };
        }

        None
    }

    /// First node whose key is not less than `key`, or the sentinel.
    pub(crate) fn lower_bound<Q>(&self, key: &Q) -> RawNode<K, V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut bound = self.sentinel;
        let mut maybe_node = self.root();
        while let Some(node) = maybe_node {
            maybe_node = match self.cmp.compare(key, unsafe { node.key() }) {
                Ordering::Greater => unsafe { node.right() },
                Ordering::Less | Ordering::Equal => {
                    bound = node;
                    unsafe { node.left() }
                }
            };
        }

        bound
    }

    /// First node whose key is greater than `key`, or the sentinel.
    pub(crate) fn upper_bound<Q>(&self, key: &Q) -> RawNode<K, V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut bound = self.sentinel;
        let mut maybe_node = self.root();
        while let Some(node) = maybe_node {
            maybe_node = match self.cmp.compare(key, unsafe { node.key() }) {
                Ordering::Less => {
                    bound = node;
                    unsafe { node.left() }
                }
                Ordering::Greater | Ordering::Equal => unsafe { node.right() },
            };
        }

        bound
    }

    /// Inserts `key` unless an equal key is present.
    ///
    /// Returns the node holding the key and whether it was newly created. An
    /// existing entry is left untouched and `key` and `value` are dropped.
    pub(crate) fn try_insert(
        &mut self,
        key: K,
        value: V,
    ) -> Result<(RawNode<K, V>, bool), AllocError>
    where
        C: Compare<K>,
    {
        // Move left/right down the tree until we find an empty slot. The root is
        // the left child of the sentinel.
        let mut parent = self.sentinel;
        let mut ordering = Ordering::Less;
        let mut maybe_node = self.root();
        while let Some(node) = maybe_node {
            parent = node;
            ordering = self.cmp.compare(&key, unsafe { node.key() });
            maybe_node = match ordering {
                Ordering::Less => unsafe { node.left() },
                Ordering::Equal => return Ok((node, false)),
                Ordering::Greater => unsafe { node.right() },
            };
        }

        // The tree is untouched until the allocation succeeded.
        let new_node = RawNode::allocate(&self.alloc, Node::new(key, value, parent))?;
        unsafe {
            match ordering {
                Ordering::Less => parent.set_left(Some(new_node)),
                Ordering::Greater | Ordering::Equal => parent.set_right(Some(new_node)),
            }
        }

        // A larger key than the maximum always ends up as its right child.
        let is_max = match self.last() {
            Some(max) => ordering == Ordering::Greater && parent == max,
            None => true,
        };
        if is_max {
            unsafe { self.sentinel.set_right(Some(new_node)) };
        }

        self.len += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(len = self.len, is_max, "inserted node");

        Ok((new_node, true))
    }

    /// Same as [`try_insert`](Self::try_insert) but aborts on allocation failure.
    pub(crate) fn insert(&mut self, key: K, value: V) -> (RawNode<K, V>, bool)
    where
        C: Compare<K>,
    {
        match self.try_insert(key, value) {
            Ok(res) => res,
            Err(AllocError) => handle_alloc_error(Node::<K, V>::layout()),
        }
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.find(key)
            .map(|node| unsafe { self.remove_node(node).0 })
    }

    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        if self.is_empty() {
            return None;
        }
        let first = self.first();
        Some(unsafe { self.remove_node(first).0 })
    }

    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        self.last()
            .map(|last| unsafe { self.remove_node(last).0 })
    }

    /// Removes the element stored at `node`.
    ///
    /// Returns the removed pair and the position of its in-order successor
    /// after the removal, the sentinel if it was the maximum.
    ///
    /// If `node` has two children, it takes over its successor's element and
    /// the successor's node is freed instead. A position of that successor is
    /// invalid afterwards while `node` stays valid. Otherwise only `node` is
    /// invalidated.
    ///
    /// # Safety
    ///
    /// `node` must be a node of this tree other than the sentinel.
    pub(crate) unsafe fn remove_node(&mut self, mut node: RawNode<K, V>) -> ((K, V), RawNode<K, V>) {
        //       ┌────────── 34 ─────────┐
        //       │                       │
        // ┌──── 2 ────┐                 58 ────┐
        // │           │                        │
        // 1      ┌─── 9 ────┐              ┌── 77 ──┐
        //        │          │              │        │
        //     ┌─ 6       ┌─ 20 ─┐      ┌─ 71 ─┐     82
        //     │          │      │      │      │
        //     5         12 ─┐   24    67      75
        //                   │
        //                   13
        let (unlinked, next) = match unsafe { (node.left(), node.right()) } {
            (Some(_), Some(right)) => {
                // Remove 9, 34, 77 from the tree above.
                // The successor is the minimum of the right subtree, so it has no
                // left child. Its pair moves into `node` and the successor's node
                // is spliced out in its place. `node` then holds the successor's
                // element, which makes it the next position.
                let mut successor = unsafe { right.min() };
                unsafe { node.swap_entries(&mut successor) };
                (successor, node)
            }
            // Remove 1, 6, 12, 58 from the tree above.
            _ => (node, unsafe { node.next() }.unwrap_or(self.sentinel)),
        };

        if self.last() == Some(unlinked) {
            let new_max = unsafe { unlinked.prev() };
            unsafe { self.sentinel.set_right(new_max) };
        }

        // `unlinked` has at most one child, it takes `unlinked`'s place.
        let child = match unsafe { unlinked.left() } {
            Some(left) => Some(left),
            None => unsafe { unlinked.right() },
        };
        unsafe { self.replace_subtree(unlinked, child) };

        let entry = unsafe { unlinked.deallocate(&self.alloc).into_entry() };
        self.len -= 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            len = self.len,
            replaced_with_successor = unlinked != node,
            "removed node"
        );

        (entry, next)
    }

    /// Replaces subtree `old` with subtree `new`
    unsafe fn replace_subtree(&mut self, old: RawNode<K, V>, new: Option<RawNode<K, V>>) {
        // We need to do two things:
        //  a) make the parent of `old` point to `new` instead of `old`, if `old`
        //     was the root that parent is the sentinel and `new` becomes the root
        //  b) make `new` point to the parent of `old`
        unsafe {
            // a)
            if let Some(mut parent) = old.parent() {
                // the sentinel's right link is not a child link, compare the left one
                if parent.left() == Some(old) {
                    parent.set_left(new);
                } else {
                    parent.set_right(new);
                }
            }

            // b)
            if let Some(mut new) = new {
                new.set_parent(old.parent());
            }
        }
    }

    /// Drops every element. The sentinel stays.
    pub(crate) fn clear(&mut self) {
        let root = self.root();

        // Detach first so that a panicking drop can't leave dangling links behind.
        unsafe {
            self.sentinel.set_left(None);
            self.sentinel.set_right(None);
        }
        #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
        let len = core::mem::replace(&mut self.len, 0);

        if let Some(root) = root {
            unsafe { Self::free_subtree(root, &self.alloc) };
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(dropped = len, "cleared tree");
    }

    /// Postorder teardown along the parent links, iterative since the depth of
    /// an unbalanced tree is only bounded by its length.
    unsafe fn free_subtree(root: RawNode<K, V>, alloc: &A) {
        let mut node = root;
        loop {
            unsafe {
                if let Some(left) = node.left() {
                    node.set_left(None);
                    node = left;
                    continue;
                }
                if let Some(right) = node.right() {
                    node.set_right(None);
                    node = right;
                    continue;
                }

                let parent = node.parent();
                let is_root = node == root;
                drop(node.deallocate(alloc).into_entry());
                match parent {
                    Some(parent) if !is_root => node = parent,
                    _ => break,
                }
            }
        }
    }

    fn clone_node(&self, src: RawNode<K, V>, parent: RawNode<K, V>) -> RawNode<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let (key, value) = unsafe { src.as_refs() };
        match RawNode::allocate(&self.alloc, Node::new(key.clone(), value.clone(), parent)) {
            Ok(node) => node,
            Err(AllocError) => handle_alloc_error(Node::<K, V>::layout()),
        }
    }

    #[cfg(test)]
    pub(crate) fn inorder_for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V),
    {
        let mut node = self.first();
        while !unsafe { node.is_sentinel() } {
            let (key, value) = unsafe { node.as_muts() };
            f(key, value);
            match unsafe { node.next() } {
                Some(next) => node = next,
                None => break,
            }
        }
    }
}
