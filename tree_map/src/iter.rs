use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use allocator_api2::alloc::{Allocator, Global};

use crate::binary_search_tree::BinarySearchTree;
use crate::node::{Node, RawNode};

/// Half-open run of positions `[front, back)` with its length.
struct RawIter<K, V> {
    front: RawNode<K, V>,
    back: RawNode<K, V>,
    len: usize,
}

impl<K, V> Clone for RawIter<K, V> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

impl<K, V> RawIter<K, V> {
    fn new<C, A: Allocator>(tree: &BinarySearchTree<K, V, C, A>) -> Self {
        Self {
            front: tree.first(),
            back: tree.sentinel(),
            len: tree.len(),
        }
    }

    fn next(&mut self) -> Option<RawNode<K, V>> {
        if self.len == 0 {
            return None;
        }

        let node = self.front;
        self.front = unsafe { node.next() }.unwrap_or(self.back);
        self.len -= 1;
        Some(node)
    }

    fn next_back(&mut self) -> Option<RawNode<K, V>> {
        if self.len == 0 {
            return None;
        }

        self.back = unsafe { self.back.prev() }?;
        self.len -= 1;
        Some(self.back)
    }
}

/// An iterator over the entries of a [`TreeMap`](crate::TreeMap) in key order.
pub struct Iter<'a, K, V> {
    raw: RawIter<K, V>,
    marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new<C, A: Allocator>(tree: &'a BinarySearchTree<K, V, C, A>) -> Self {
        Self {
            raw: RawIter::new(tree),
            marker: PhantomData,
        }
    }
}

unsafe impl<K: Sync, V: Sync> Send for Iter<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            marker: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for Iter<'_, K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.raw.next().map(|node| unsafe { node.as_refs() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.raw.len, Some(self.raw.len))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.raw.next_back().map(|node| unsafe { node.as_refs() })
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the entries of a [`TreeMap`](crate::TreeMap) in key
/// order, with mutable references to the values.
pub struct IterMut<'a, K, V> {
    raw: RawIter<K, V>,
    marker: PhantomData<&'a mut Node<K, V>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new<C, A: Allocator>(tree: &'a mut BinarySearchTree<K, V, C, A>) -> Self {
        Self {
            raw: RawIter::new(tree),
            marker: PhantomData,
        }
    }
}

unsafe impl<K: Sync, V: Send> Send for IterMut<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for IterMut<'_, K, V> {}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        // every node is yielded at most once, the `&mut V`s never alias
        self.raw.next().map(|mut node| unsafe { node.as_muts() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.raw.len, Some(self.raw.len))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.raw.next_back().map(|mut node| unsafe { node.as_muts() })
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a [`TreeMap`](crate::TreeMap).
pub struct Keys<'a, K, V>(pub(crate) Iter<'a, K, V>);

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.0.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`TreeMap`](crate::TreeMap), in the order
/// of their keys.
pub struct Values<'a, K, V>(pub(crate) Iter<'a, K, V>);

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.0.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V>(pub(crate) IterMut<'a, K, V>);

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.0.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the entries of a [`TreeMap`](crate::TreeMap).
pub struct IntoIter<K, V, C, A: Allocator = Global> {
    pub(crate) tree: BinarySearchTree<K, V, C, A>,
}

impl<K, V, C, A: Allocator> Iterator for IntoIter<K, V, C, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<K, V, C, A: Allocator> DoubleEndedIterator for IntoIter<K, V, C, A> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }
}

impl<K, V, C, A: Allocator> ExactSizeIterator for IntoIter<K, V, C, A> {}

impl<K, V, C, A: Allocator> FusedIterator for IntoIter<K, V, C, A> {}

#[cfg(test)]
mod tests {
    use compare::natural;

    use crate::binary_search_tree::tests::Tree;

    use super::*;

    fn tree(keys: &[i32]) -> Tree {
        let mut tree = BinarySearchTree::new_in(natural(), Global);
        for &k in keys {
            tree.insert(k, k);
        }
        tree
    }

    #[test]
    fn both_ends_meet() {
        let tree = tree(&[4, 2, 6, 1, 3, 5, 7]);
        let mut iter = Iter::new(&tree);
        assert_eq!(iter.len(), 7);

        assert_eq!(iter.next(), Some((&1, &1)));
        assert_eq!(iter.next_back(), Some((&7, &7)));
        assert_eq!(iter.next_back(), Some((&6, &6)));
        assert_eq!(iter.next(), Some((&2, &2)));
        assert_eq!(iter.len(), 3);

        let rest: Vec<_> = iter.map(|(k, _)| *k).collect();
        assert_eq!(rest, &[3, 4, 5]);
    }

    #[test]
    fn empty() {
        let tree = tree(&[]);
        let mut iter = Iter::new(&tree);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn iter_mut() {
        let mut tree = tree(&[2, 1, 3]);
        for (k, v) in IterMut::new(&mut tree).rev() {
            *v += k * 100;
        }
        let items: Vec<_> = Iter::new(&tree).map(|(k, v)| (*k, *v)).collect();
        assert_eq!(items, &[(1, 101), (2, 202), (3, 303)]);
    }

    #[test]
    fn into_iter() {
        let tree = tree(&[2, 1, 4, 3]);
        let mut iter = IntoIter { tree };
        assert_eq!(iter.next(), Some((1, 1)));
        assert_eq!(iter.next_back(), Some((4, 4)));
        assert_eq!(iter.len(), 2);
        // remaining entries are dropped with the iterator
    }
}
