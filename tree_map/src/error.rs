use core::fmt;
use std::alloc::Layout;

/// Errors reported by [`TreeMap`](crate::TreeMap) and its cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No element with the requested key exists.
    KeyNotFound,

    /// A cursor was dereferenced at the end position, or moved past either
    /// boundary.
    InvalidPosition,

    /// The allocator could not provide memory for a new node.
    AllocFailed { layout: Layout },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyNotFound => write!(f, "key not found"),

            Self::InvalidPosition => write!(f, "cursor is not at a valid element"),

            Self::AllocFailed { layout } => write!(
                f,
                "memory allocation of {} bytes failed",
                layout.size()
            ),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = core::result::Result<T, E>;
