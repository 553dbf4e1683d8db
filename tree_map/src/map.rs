use core::fmt;
use core::mem;
use core::ops::{Bound, Index, RangeBounds};
use std::cmp::Ordering;

use allocator_api2::alloc::{AllocError, Allocator, Global};
use compare::{natural, Compare, Natural};

use crate::binary_search_tree::BinarySearchTree;
use crate::cursor::{Cursor, CursorMut, ReverseCursor};
use crate::error::{Error, Result};
use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::node::Node;

/// An ordered map based on an unbalanced binary search tree.
///
/// Keys are kept unique and ordered by the comparator `C`, the key's own
/// [`Ord`] unless given. Nodes are allocated through `A`.
///
/// The behavior of this map is unspecified if a key's ordering relative to
/// any other key changes while the key is in the map.
pub struct TreeMap<K, V, C = Natural<K>, A: Allocator = Global> {
    tree: BinarySearchTree<K, V, C, A>,
}

impl<K: Ord, V> TreeMap<K, V> {
    /// Creates an empty map ordered by the natural order of its keys.
    ///
    /// ```
    /// let mut map = tree_map::TreeMap::new();
    ///
    /// map.insert(2, "b");
    /// map.insert(1, "a");
    /// map.insert(3, "c");
    ///
    /// let mut it = map.iter();
    /// assert_eq!(it.next(), Some((&1, &"a")));
    /// assert_eq!(it.next(), Some((&2, &"b")));
    /// assert_eq!(it.next(), Some((&3, &"c")));
    /// assert_eq!(it.next(), None);
    /// ```
    pub fn new() -> Self {
        Self::with_cmp(natural())
    }
}

impl<K: Ord, V, A: Allocator> TreeMap<K, V, Natural<K>, A> {
    /// Creates an empty map ordered by the natural order of its keys that
    /// allocates its nodes with `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_cmp_in(natural(), alloc)
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    /// Creates an empty map ordered by the given comparator.
    ///
    /// ```
    /// use compare::{Compare, natural};
    ///
    /// let mut map = tree_map::TreeMap::with_cmp(natural().rev());
    ///
    /// map.insert(2, "b");
    /// map.insert(1, "a");
    /// map.insert(3, "c");
    ///
    /// let keys: Vec<_> = map.keys().copied().collect();
    /// assert_eq!(keys, [3, 2, 1]);
    /// ```
    pub fn with_cmp(cmp: C) -> Self {
        Self::with_cmp_in(cmp, Global)
    }
}

impl<K, V, C, A: Allocator> TreeMap<K, V, C, A> {
    pub fn with_cmp_in(cmp: C, alloc: A) -> Self {
        Self {
            tree: BinarySearchTree::new_in(cmp, alloc),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Upper limit on the number of elements, bounded by the node size.
    pub fn max_size(&self) -> usize {
        isize::MAX as usize / Node::<K, V>::layout().size()
    }

    /// The comparator that orders the keys.
    pub fn key_comp(&self) -> &C {
        self.tree.cmp()
    }

    pub fn allocator(&self) -> &A {
        self.tree.allocator()
    }

    /// Position of the smallest key, equal to [`end`](Self::end) if the map
    /// is empty.
    pub fn begin(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.tree.first())
    }

    /// Position one past the largest key.
    pub fn end(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.tree.sentinel())
    }

    /// Reverse position of the largest key.
    pub fn rbegin(&self) -> ReverseCursor<'_, K, V> {
        ReverseCursor::new(self.end())
    }

    /// Reverse position one past the smallest key.
    pub fn rend(&self) -> ReverseCursor<'_, K, V> {
        ReverseCursor::new(self.begin())
    }

    /// A mutable position at the smallest key.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        let first = self.tree.first();
        CursorMut::new(&mut self.tree, first)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.tree)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.tree)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut(self.iter_mut())
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.begin().get().ok()
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.rbegin().get().ok()
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<K, V, C, A> TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: Allocator,
{
    /// Inserts `key` unless an equal key is already present.
    ///
    /// Returns the position of the element with that key and whether it was
    /// inserted. An existing element keeps its value.
    ///
    /// ```
    /// let mut map = tree_map::TreeMap::new();
    ///
    /// let (pos, inserted) = map.insert(1, "a");
    /// assert!(inserted);
    /// assert_eq!(pos.get(), Ok((&1, &"a")));
    ///
    /// let (pos, inserted) = map.insert(1, "b");
    /// assert!(!inserted);
    /// assert_eq!(pos.get(), Ok((&1, &"a")));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (Cursor<'_, K, V>, bool) {
        let (node, inserted) = self.tree.insert(key, value);
        (Cursor::new(node), inserted)
    }

    /// Same as [`insert`](Self::insert) but reports allocation failure
    /// instead of aborting. The map is unchanged on error.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(Cursor<'_, K, V>, bool)> {
        match self.tree.try_insert(key, value) {
            Ok((node, inserted)) => Ok((Cursor::new(node), inserted)),
            Err(AllocError) => Err(Error::AllocFailed {
                layout: Node::<K, V>::layout(),
            }),
        }
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key
    /// is absent.
    ///
    /// ```
    /// let mut map = tree_map::TreeMap::<&str, u32>::new();
    /// *map.index_or_default("a") += 1;
    /// *map.index_or_default("a") += 1;
    /// assert_eq!(map.at(&"a"), Ok(&2));
    /// ```
    pub fn index_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let mut node = match self.tree.find(&key) {
            Some(node) => node,
            None => self.tree.insert(key, V::default()).0,
        };
        unsafe { node.as_muts().1 }
    }
}

impl<K, V, C, A: Allocator> TreeMap<K, V, C, A> {
    /// Position of `key`, or [`end`](Self::end) if it is absent.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        Cursor::new(self.tree.find(key).unwrap_or(self.tree.sentinel()))
    }

    /// Mutable position of `key`, at the end if it is absent.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, C, A>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let node = self.tree.find(key).unwrap_or(self.tree.sentinel());
        CursorMut::new(&mut self.tree, node)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.tree.find(key).map(|node| unsafe { node.as_refs() })
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.tree
            .find(key)
            .map(|mut node| unsafe { node.as_muts().1 })
    }

    /// Checked access to the value for `key`.
    ///
    /// ```
    /// use tree_map::{Error, TreeMap};
    ///
    /// let map = TreeMap::<String, i32>::new();
    /// assert_eq!(map.at(&"missing".to_string()), Err(Error::KeyNotFound));
    /// ```
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.tree.find(key).is_some()
    }

    /// Number of elements with `key`, which is either 0 or 1.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        usize::from(self.contains_key(key))
    }

    /// Removes `key` and returns whether it was present.
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.tree.remove(key).is_some()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.tree.remove(key).map(|(_, value)| value)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.tree.remove(key)
    }

    /// Removes every element whose key lies in `range`, returns how many were
    /// removed.
    ///
    /// ```
    /// let mut map: tree_map::TreeMap<_, _> = (0..10).map(|k| (k, k)).collect();
    /// assert_eq!(map.erase_range(3..7), 4);
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [0, 1, 2, 7, 8, 9]);
    /// ```
    pub fn erase_range<Q, R>(&mut self, range: R) -> usize
    where
        C: Compare<Q, K>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        let mut node = match range.start_bound() {
            Bound::Included(key) => self.tree.lower_bound(key),
            Bound::Excluded(key) => self.tree.upper_bound(key),
            Bound::Unbounded => self.tree.first(),
        };

        let mut removed = 0;
        while !unsafe { node.is_sentinel() } {
            let key = unsafe { node.key() };
            let in_range = match range.end_bound() {
                Bound::Included(end) => self.tree.cmp().compare(end, key) != Ordering::Less,
                Bound::Excluded(end) => self.tree.cmp().compare(end, key) == Ordering::Greater,
                Bound::Unbounded => true,
            };
            if !in_range {
                break;
            }

            // `remove_node` hands back the position following the removed
            // element, `node` itself is invalid afterwards.
            let (_, next) = unsafe { self.tree.remove_node(node) };
            node = next;
            removed += 1;
        }

        removed
    }

    /// Position of the first key that is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        Cursor::new(self.tree.lower_bound(key))
    }

    /// Position of the first key that is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        Cursor::new(self.tree.upper_bound(key))
    }

    /// The half-open range of positions holding `key`.
    ///
    /// It contains the single matching element, or is empty and located where
    /// `key` would be inserted.
    pub fn equal_range<Q>(&self, key: &Q) -> (Cursor<'_, K, V>, Cursor<'_, K, V>)
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        match self.tree.find(key) {
            Some(node) => {
                let next = unsafe { node.next() }.unwrap_or(self.tree.sentinel());
                (Cursor::new(node), Cursor::new(next))
            }
            None => {
                let bound = self.lower_bound(key);
                (bound, bound)
            }
        }
    }
}

impl<K, V, C, A> Clone for TreeMap<K, V, C, A>
where
    K: Clone,
    V: Clone,
    C: Clone,
    A: Allocator + Clone,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K, V, C, A> fmt::Debug for TreeMap<K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> Default for TreeMap<K, V, C>
where
    C: Compare<K> + Default,
{
    fn default() -> Self {
        Self::with_cmp(C::default())
    }
}

impl<K, V, C, A> PartialEq for TreeMap<K, V, C, A>
where
    K: PartialEq,
    V: PartialEq,
    A: Allocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K, V, C, A> Eq for TreeMap<K, V, C, A>
where
    K: Eq,
    V: Eq,
    A: Allocator,
{
}

impl<K, V, C, A, Q> Index<&Q> for TreeMap<K, V, C, A>
where
    C: Compare<Q, K>,
    A: Allocator,
    Q: ?Sized,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present, see [`TreeMap::at`] for the checked
    /// version.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, C, A> Extend<(K, V)> for TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: Allocator,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.tree.insert(key, value);
        }
    }
}

impl<'a, K, V, C, A> Extend<(&'a K, &'a V)> for TreeMap<K, V, C, A>
where
    K: Copy + 'a,
    V: Copy + 'a,
    C: Compare<K>,
    A: Allocator,
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(key, value)| (*key, *value)));
    }
}

impl<K, V, C> FromIterator<(K, V)> for TreeMap<K, V, C>
where
    C: Compare<K> + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C, A: Allocator> IntoIterator for TreeMap<K, V, C, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { tree: self.tree }
    }
}

impl<'a, K, V, C, A: Allocator> IntoIterator for &'a TreeMap<K, V, C, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C, A: Allocator> IntoIterator for &'a mut TreeMap<K, V, C, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
