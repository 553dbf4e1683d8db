#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

//! An ordered map built on an unbalanced binary search tree.
//!
//! [`TreeMap`] keeps unique keys sorted by a configurable comparator from the
//! [`compare`] crate and allocates its nodes through an
//! [`allocator_api2`] allocator. Besides the usual iterators it exposes
//! positions: a [`Cursor`] steps between neighbouring keys and reaches a
//! dedicated end position one past the largest key, a [`ReverseCursor`] walks
//! the other way, and a [`CursorMut`] removes elements while walking.
//!
//! No rebalancing is done. Inserting keys in sorted order degenerates the tree
//! into a list and makes every operation linear in the number of elements.
//!
//! ```
//! use tree_map::TreeMap;
//!
//! let mut map = TreeMap::new();
//! for k in [5, 3, 8, 1, 4, 7, 9] {
//!     map.insert(k, k * 10);
//! }
//! assert!(map.erase(&5));
//!
//! let mut cursor = map.begin();
//! let mut keys = Vec::new();
//! while cursor != map.end() {
//!     keys.push(*cursor.key()?);
//!     cursor.move_next()?;
//! }
//! assert_eq!(keys, [1, 3, 4, 7, 8, 9]);
//! # Ok::<(), tree_map::Error>(())
//! ```
//!
//! # Features
//!
//! - `serde`: serialization of [`TreeMap`] as a map.
//! - `tracing`: `trace` level events for every structural change of the tree.

mod binary_search_tree;
pub mod cursor;
mod error;
pub mod iter;
mod map;
mod node;
#[cfg(feature = "serde")]
mod serde;

pub use cursor::{Cursor, CursorMut, ReverseCursor};
pub use error::{Error, Result};
pub use map::TreeMap;
