use core::fmt;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};
use std::alloc::Layout;

use allocator_api2::alloc::{AllocError, Allocator};

pub(crate) struct Node<K, V> {
    // key and value are uninit only for the sentinel node, otherwise they must
    // always be valid values
    key: MaybeUninit<K>,
    value: MaybeUninit<V>,
    parent: Option<RawNode<K, V>>,
    left: Option<RawNode<K, V>>,
    right: Option<RawNode<K, V>>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K, value: V, parent: RawNode<K, V>) -> Self {
        Self {
            key: MaybeUninit::new(key),
            value: MaybeUninit::new(value),
            parent: Some(parent),
            left: None,
            right: None,
        }
    }

    /// The "one past the last element" marker.
    ///
    /// It is the only node without a parent. Its left link is the root of the
    /// tree and its right link is the maximum node, both `None` for an empty
    /// tree.
    pub(crate) fn sentinel() -> Self {
        Self {
            key: MaybeUninit::uninit(),
            value: MaybeUninit::uninit(),
            parent: None,
            left: None,
            right: None,
        }
    }

    #[inline]
    pub(crate) fn layout() -> Layout {
        Layout::new::<Self>()
    }

    /// # Safety
    ///
    /// `self` must not be the sentinel.
    pub(crate) unsafe fn into_entry(self) -> (K, V) {
        unsafe { (self.key.assume_init(), self.value.assume_init()) }
    }
}

impl<K, V> fmt::Debug for Node<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parent.is_none() {
            return f.write_str("Sentinel");
        }

        let mut f = f.debug_struct("Node");
        f.field("key", unsafe { self.key.assume_init_ref() })
            .field("value", unsafe { self.value.assume_init_ref() });

        let mut dbg_opt_node = |name: &str, node: &Option<RawNode<K, V>>| match node {
            Some(node) if unsafe { node.is_sentinel() } => {
                f.field(name, &"sentinel");
            }
            Some(node) => {
                f.field(name, unsafe { &node.as_refs() });
            }
            None => {
                f.field(name, &None::<K>);
            }
        };

        dbg_opt_node("parent", &self.parent);
        dbg_opt_node("left", &self.left);
        dbg_opt_node("right", &self.right);

        f.finish()
    }
}

/// Wrapper around `NonNull<Node<K, V>>` providing the link accessors and the
/// navigation steps the tree and its cursors are built from.
#[repr(transparent)]
pub(crate) struct RawNode<K, V> {
    ptr: NonNull<Node<K, V>>,
}

impl<K, V> Clone for RawNode<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for RawNode<K, V> {}

impl<K, V> PartialEq for RawNode<K, V> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.as_ptr(), other.as_ptr())
    }
}

impl<K, V> Eq for RawNode<K, V> {}

impl<K, V> fmt::Debug for RawNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawNode").field(&self.ptr).finish()
    }
}

impl<K, V> RawNode<K, V> {
    /// Moves `node` into memory obtained from `alloc`.
    ///
    /// If the allocation fails the key and value of `node` are dropped.
    pub(crate) fn allocate<A: Allocator>(alloc: &A, node: Node<K, V>) -> Result<Self, AllocError> {
        let ptr = match alloc.allocate(Node::<K, V>::layout()) {
            Ok(ptr) => ptr.cast::<Node<K, V>>(),
            Err(err) => {
                // only the sentinel has no parent, and no entry
                if node.parent.is_some() {
                    drop(unsafe { node.into_entry() });
                }
                return Err(err);
            }
        };
        unsafe { ptr.as_ptr().write(node) };
        Ok(Self { ptr })
    }

    /// Moves the node out of its allocation and releases the memory.
    ///
    /// # Safety
    ///
    /// `self` must have been allocated by `alloc` and must not be used afterwards.
    pub(crate) unsafe fn deallocate<A: Allocator>(self, alloc: &A) -> Node<K, V> {
        let node = unsafe { self.ptr.as_ptr().read() };
        unsafe { alloc.deallocate(self.ptr.cast(), Node::<K, V>::layout()) };
        node
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut Node<K, V> {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) unsafe fn is_sentinel(&self) -> bool {
        unsafe { (*self.as_ptr()).parent.is_none() }
    }

    #[inline]
    pub(crate) unsafe fn key<'a>(&self) -> &'a K {
        unsafe { (*self.as_ptr()).key.assume_init_ref() }
    }

    #[inline]
    pub(crate) unsafe fn as_refs<'a>(&self) -> (&'a K, &'a V) {
        let ptr = self.as_ptr();
        unsafe { ((*ptr).key.assume_init_ref(), (*ptr).value.assume_init_ref()) }
    }

    #[inline]
    pub(crate) unsafe fn as_muts<'a>(&mut self) -> (&'a K, &'a mut V) {
        let ptr = self.as_ptr();
        unsafe { ((*ptr).key.assume_init_ref(), (*ptr).value.assume_init_mut()) }
    }

    /// Exchanges the key-value pairs stored in `self` and `other`, leaving
    /// every link untouched.
    #[inline]
    pub(crate) unsafe fn swap_entries(&mut self, other: &mut RawNode<K, V>) {
        let (a, b) = (self.as_ptr(), other.as_ptr());
        unsafe {
            ptr::swap(ptr::addr_of_mut!((*a).key), ptr::addr_of_mut!((*b).key));
            ptr::swap(ptr::addr_of_mut!((*a).value), ptr::addr_of_mut!((*b).value));
        }
    }

    #[inline]
    pub(crate) unsafe fn parent(&self) -> Option<RawNode<K, V>> {
        unsafe { (*self.as_ptr()).parent }
    }

    #[inline]
    pub(crate) unsafe fn set_parent(&mut self, new_parent: Option<RawNode<K, V>>) {
        unsafe {
            (*self.as_ptr()).parent = new_parent;
        }
    }

    #[inline]
    pub(crate) unsafe fn left(&self) -> Option<RawNode<K, V>> {
        unsafe { (*self.as_ptr()).left }
    }

    #[inline]
    pub(crate) unsafe fn set_left(&mut self, new_left: Option<RawNode<K, V>>) {
        unsafe {
            (*self.as_ptr()).left = new_left;
        }
    }

    #[inline]
    pub(crate) unsafe fn right(&self) -> Option<RawNode<K, V>> {
        unsafe { (*self.as_ptr()).right }
    }

    #[inline]
    pub(crate) unsafe fn set_right(&mut self, new_right: Option<RawNode<K, V>>) {
        unsafe {
            (*self.as_ptr()).right = new_right;
        }
    }

    /// Leftmost node of the subtree rooted at `self`.
    ///
    /// Called on the sentinel this is the minimum of the whole tree, or the
    /// sentinel itself if the tree is empty.
    pub(crate) unsafe fn min(self) -> RawNode<K, V> {
        let mut x = self;
        while let Some(left) = unsafe { x.left() } {
            x = left;
        }

        x
    }

    /// Rightmost node of the subtree rooted at `self`.
    pub(crate) unsafe fn max(self) -> RawNode<K, V> {
        let mut x = self;
        while let Some(right) = unsafe { x.right() } {
            x = right;
        }

        x
    }

    /// In-order successor of `self`.
    ///
    /// The successor of the maximum node is the sentinel. Returns `None` only
    /// when called on the sentinel.
    pub(crate) unsafe fn next(self) -> Option<RawNode<K, V>> {
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
        if unsafe { self.is_sentinel() } {
            return None;
        }

        match unsafe { self.right() } {
            // 9 -> 12, 2 -> 5, 58 -> 67 ...
            Some(right) => unsafe { Some(right.min()) },
            None => {
                // 6 -> 9, 1 -> 2, 13 -> 20, 24 -> 34, 82 -> sentinel ...
                // Move up the parents and find the first node which is the left
                // child of its parent. The root is the left child of the
                // sentinel, so the ascent from the maximum ends there.
                let mut node = self;
                let mut node_parent = unsafe { node.parent() };
                while let Some(parent) = node_parent {
                    if unsafe { parent.left() } == Some(node) {
                        break;
                    }
                    node = parent;
                    node_parent = unsafe { node.parent() };
                }

                node_parent
            }
        }
    }

    /// In-order predecessor of `self`.
    ///
    /// The predecessor of the sentinel is the maximum node. Returns `None` when
    /// called on the minimum node, or on the sentinel of an empty tree.
    pub(crate) unsafe fn prev(self) -> Option<RawNode<K, V>> {
        if unsafe { self.is_sentinel() } {
            return unsafe { self.right() };
        }

        match unsafe { self.left() } {
            // 2 -> 1, 9 -> 6, 20 -> 13, 77 -> 75
            Some(left) => unsafe { Some(left.max()) },
            None => {
                // 12 -> 9, 58 -> 34, 67 -> 58
                // Move up the parents and find the first node which is the right
                // child of its parent. Reaching the sentinel means `self` was the
                // minimum. The sentinel's right link is not a child link, so it
                // must not be compared against.
                let mut node = self;
                while let Some(parent) = unsafe { node.parent() } {
                    if unsafe { parent.is_sentinel() } {
                        return None;
                    }
                    if unsafe { parent.right() } == Some(node) {
                        return Some(parent);
                    }
                    node = parent;
                }

                None
            }
        }
    }
}
