//! Positions inside a [`TreeMap`](crate::TreeMap).
//!
//! A position references either an element or the end of the map, the slot
//! one past the largest key. Stepping forward from the largest key reaches the
//! end and stepping back from the end reaches the largest key again. Stepping
//! beyond either boundary, or reading the element at the end, fails with
//! [`Error::InvalidPosition`] and leaves the cursor where it was.
//!
//! [`Cursor`] borrows the map shared, so nothing can be removed while it is
//! alive. Removing through a position is done with [`CursorMut`], which steps
//! to the next element as part of the removal.

use core::fmt;
use core::marker::PhantomData;

use allocator_api2::alloc::{Allocator, Global};

use crate::binary_search_tree::BinarySearchTree;
use crate::error::{Error, Result};
use crate::node::{Node, RawNode};

/// A read-only position in a [`TreeMap`](crate::TreeMap).
///
/// Two cursors are equal if they reference the same position, regardless of
/// the elements' values.
pub struct Cursor<'a, K, V> {
    node: RawNode<K, V>,
    marker: PhantomData<&'a Node<K, V>>,
}

unsafe impl<K: Sync, V: Sync> Send for Cursor<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Cursor<'_, K, V> {}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K, V> fmt::Debug for Cursor<'_, K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Ok((key, value)) => f.debug_tuple("Cursor").field(key).field(value).finish(),
            Err(_) => f.write_str("Cursor(end)"),
        }
    }
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn new(node: RawNode<K, V>) -> Self {
        Self {
            node,
            marker: PhantomData,
        }
    }

    /// Returns `true` if the cursor is at the end position.
    #[inline]
    pub fn is_end(&self) -> bool {
        unsafe { self.node.is_sentinel() }
    }

    /// The key-value pair at the cursor.
    pub fn get(&self) -> Result<(&'a K, &'a V)> {
        if self.is_end() {
            return Err(Error::InvalidPosition);
        }
        Ok(unsafe { self.node.as_refs() })
    }

    pub fn key(&self) -> Result<&'a K> {
        self.get().map(|(key, _)| key)
    }

    pub fn value(&self) -> Result<&'a V> {
        self.get().map(|(_, value)| value)
    }

    /// Moves to the next larger key, or to the end after the largest one.
    pub fn move_next(&mut self) -> Result<()> {
        match unsafe { self.node.next() } {
            Some(next) => {
                self.node = next;
                Ok(())
            }
            None => Err(Error::InvalidPosition),
        }
    }

    /// Moves to the next smaller key. From the end this is the largest key.
    pub fn move_prev(&mut self) -> Result<()> {
        match unsafe { self.node.prev() } {
            Some(prev) => {
                self.node = prev;
                Ok(())
            }
            None => Err(Error::InvalidPosition),
        }
    }

    /// The position after this one.
    pub fn successor(mut self) -> Result<Self> {
        self.move_next()?;
        Ok(self)
    }

    /// The position before this one.
    pub fn predecessor(mut self) -> Result<Self> {
        self.move_prev()?;
        Ok(self)
    }
}

/// A position in a [`TreeMap`](crate::TreeMap) that can modify values and
/// remove elements.
pub struct CursorMut<'a, K, V, C, A: Allocator = Global> {
    tree: &'a mut BinarySearchTree<K, V, C, A>,
    node: RawNode<K, V>,
}

unsafe impl<K, V, C, A> Send for CursorMut<'_, K, V, C, A>
where
    K: Send + Sync,
    V: Send + Sync,
    C: Send + Sync,
    A: Allocator + Send + Sync,
{
}

impl<K, V, C, A> fmt::Debug for CursorMut<'_, K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Ok((key, value)) => f.debug_tuple("CursorMut").field(key).field(value).finish(),
            Err(_) => f.write_str("CursorMut(end)"),
        }
    }
}

impl<'a, K, V, C, A: Allocator> CursorMut<'a, K, V, C, A> {
    pub(crate) fn new(tree: &'a mut BinarySearchTree<K, V, C, A>, node: RawNode<K, V>) -> Self {
        Self { tree, node }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        unsafe { self.node.is_sentinel() }
    }

    pub fn get(&self) -> Result<(&K, &V)> {
        self.as_cursor().get()
    }

    pub fn get_mut(&mut self) -> Result<(&K, &mut V)> {
        if self.is_end() {
            return Err(Error::InvalidPosition);
        }
        Ok(unsafe { self.node.as_muts() })
    }

    pub fn key(&self) -> Result<&K> {
        self.as_cursor().key()
    }

    pub fn value_mut(&mut self) -> Result<&mut V> {
        self.get_mut().map(|(_, value)| value)
    }

    /// A read-only view of the current position.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.node)
    }

    /// Gives up the ability to modify and keeps the position.
    pub fn into_cursor(self) -> Cursor<'a, K, V> {
        Cursor::new(self.node)
    }

    pub fn move_next(&mut self) -> Result<()> {
        let mut cursor = Cursor::new(self.node);
        cursor.move_next()?;
        self.node = cursor.node;
        Ok(())
    }

    pub fn move_prev(&mut self) -> Result<()> {
        let mut cursor = Cursor::new(self.node);
        cursor.move_prev()?;
        self.node = cursor.node;
        Ok(())
    }

    /// Removes the element at the cursor and returns it.
    ///
    /// The cursor moves to the element that followed the removed one, or to
    /// the end if it was the largest.
    pub fn remove_current(&mut self) -> Result<(K, V)> {
        if self.is_end() {
            return Err(Error::InvalidPosition);
        }
        let (entry, next) = unsafe { self.tree.remove_node(self.node) };
        self.node = next;
        Ok(entry)
    }
}

/// A position that walks a [`TreeMap`](crate::TreeMap) from the largest key
/// to the smallest.
///
/// It wraps the forward position one step ahead of the element it refers to:
/// the reverse begin wraps the end, the reverse end wraps the first element.
pub struct ReverseCursor<'a, K, V> {
    base: Cursor<'a, K, V>,
}

impl<K, V> Clone for ReverseCursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for ReverseCursor<'_, K, V> {}

impl<K, V> PartialEq for ReverseCursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl<K, V> Eq for ReverseCursor<'_, K, V> {}

impl<K, V> fmt::Debug for ReverseCursor<'_, K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Ok((key, value)) => f.debug_tuple("ReverseCursor").field(key).field(value).finish(),
            Err(_) => f.write_str("ReverseCursor(end)"),
        }
    }
}

impl<'a, K, V> ReverseCursor<'a, K, V> {
    pub fn new(base: Cursor<'a, K, V>) -> Self {
        Self { base }
    }

    /// The underlying forward position.
    pub fn base(&self) -> Cursor<'a, K, V> {
        self.base
    }

    /// Returns `true` past the smallest key.
    pub fn is_end(&self) -> bool {
        self.base.predecessor().is_err()
    }

    pub fn get(&self) -> Result<(&'a K, &'a V)> {
        self.base.predecessor()?.get()
    }

    pub fn key(&self) -> Result<&'a K> {
        self.get().map(|(key, _)| key)
    }

    /// Moves to the next smaller key.
    pub fn move_next(&mut self) -> Result<()> {
        self.base.move_prev()
    }

    /// Moves to the next larger key.
    pub fn move_prev(&mut self) -> Result<()> {
        self.base.move_next()
    }
}

#[cfg(test)]
mod tests {
    use compare::natural;

    use crate::binary_search_tree::tests::Tree;
    use crate::binary_search_tree::BinarySearchTree;

    use super::*;

    fn tree(keys: &[i32]) -> Tree {
        let mut tree = BinarySearchTree::new_in(natural(), Global);
        for &k in keys {
            tree.insert(k, k * 10);
        }
        tree
    }

    #[test]
    fn walk_forward() {
        let tree = tree(&[5, 3, 8, 1, 4, 7, 9]);
        let mut cursor = Cursor::new(tree.first());

        let mut items = Vec::new();
        while !cursor.is_end() {
            items.push(*cursor.key().unwrap());
            cursor.move_next().unwrap();
        }
        assert_eq!(items, &[1, 3, 4, 5, 7, 8, 9]);
        assert_eq!(cursor, Cursor::new(tree.sentinel()));
        assert_eq!(cursor.get(), Err(Error::InvalidPosition));
        assert_eq!(cursor.move_next(), Err(Error::InvalidPosition));
        assert!(cursor.is_end());
    }

    #[test]
    fn walk_backward() {
        let tree = tree(&[5, 3, 8, 1, 4, 7, 9]);
        let mut cursor = Cursor::new(tree.sentinel());

        let mut items = Vec::new();
        while cursor.move_prev().is_ok() {
            items.push(*cursor.key().unwrap());
        }
        assert_eq!(items, &[9, 8, 7, 5, 4, 3, 1]);
        assert_eq!(cursor, Cursor::new(tree.first()));
        assert_eq!(cursor.get(), Ok((&1, &10)));
    }

    #[test]
    fn step_symmetry() {
        let tree = tree(&[5, 3, 8, 1, 4, 7, 9]);
        let begin = Cursor::new(tree.first());
        let end = Cursor::new(tree.sentinel());

        let mut cursor = begin.successor().unwrap();
        while cursor != end {
            assert_eq!(cursor.predecessor().unwrap().successor().unwrap(), cursor);
            assert_eq!(cursor.successor().unwrap().predecessor().unwrap(), cursor);
            cursor.move_next().unwrap();
        }

        assert_eq!(end.predecessor().unwrap().successor().unwrap(), end);
        assert_eq!(begin.successor().unwrap().predecessor().unwrap(), begin);
        assert_eq!(begin.predecessor(), Err(Error::InvalidPosition));
        assert_eq!(end.successor(), Err(Error::InvalidPosition));
    }

    #[test]
    fn empty_tree() {
        let tree = tree(&[]);
        let mut cursor = Cursor::new(tree.first());
        assert!(cursor.is_end());
        assert_eq!(cursor, Cursor::new(tree.sentinel()));
        assert_eq!(cursor.move_prev(), Err(Error::InvalidPosition));
        assert_eq!(cursor.move_next(), Err(Error::InvalidPosition));

        let rev = ReverseCursor::new(cursor);
        assert!(rev.is_end());
        assert_eq!(rev.get(), Err(Error::InvalidPosition));
    }

    #[test]
    fn reverse() {
        let tree = tree(&[2, 1, 3]);
        let mut rev = ReverseCursor::new(Cursor::new(tree.sentinel()));
        let rend = ReverseCursor::new(Cursor::new(tree.first()));

        let mut items = Vec::new();
        while rev != rend {
            items.push(*rev.key().unwrap());
            rev.move_next().unwrap();
        }
        assert_eq!(items, &[3, 2, 1]);
        assert!(rev.is_end());
        assert_eq!(rev.move_next(), Err(Error::InvalidPosition));
        assert_eq!(rev.base().key(), Ok(&1));

        rev.move_prev().unwrap();
        assert_eq!(rev.key(), Ok(&1));
    }

    #[test]
    fn remove_current_advances() {
        let mut tree = tree(&[5, 3, 8, 1, 4, 7, 9]);
        let first = tree.first();
        let mut cursor = CursorMut::new(&mut tree, first);

        // remove every other element, the cursor lands on the next one each time
        let mut removed = Vec::new();
        while !cursor.is_end() {
            removed.push(cursor.remove_current().unwrap().0);
            if cursor.move_next().is_err() {
                break;
            }
        }
        assert_eq!(removed, &[1, 4, 7, 9]);
        assert_eq!(cursor.remove_current(), Err(Error::InvalidPosition));

        let mut items = Vec::new();
        tree.inorder_for_each(|k, _| items.push(*k));
        assert_eq!(items, &[3, 5, 8]);
    }

    #[test]
    fn remove_two_children_keeps_position() {
        let mut tree = tree(&[5, 3, 8, 1, 4, 7, 9]);
        let root = tree.root().unwrap();
        let mut cursor = CursorMut::new(&mut tree, root);

        assert_eq!(cursor.remove_current(), Ok((5, 50)));
        assert_eq!(cursor.key(), Ok(&7));
        *cursor.value_mut().unwrap() += 1;
        cursor.move_prev().unwrap();
        assert_eq!(cursor.get(), Ok((&4, &40)));

        let cursor = cursor.into_cursor();
        assert_eq!(cursor.successor().unwrap().get(), Ok((&7, &71)));
    }
}
