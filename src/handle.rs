//! Strongly typed ids for points and cells.
//!
//! Points and cells are identified by their index, but passing raw integers
//! around makes it far too easy to mix up a point id with a cell id. So both
//! are wrapped in their own handle type. The underlying integer type is
//! [`hsize`].

use std::{fmt, hash::Hash};

use derive_more::{From, Into};
use static_assertions::assert_eq_size;


/// The integer type used to store ids and offsets.
///
/// This is `u32` by default and `u64` with the `large-handle` feature. With
/// `u32`, a mesh can contain at most 2³² - 1 points, cells and connectivity
/// entries, which is plenty for most use cases and halves the memory of all
/// topological structures.
#[cfg(not(feature = "large-handle"))]
#[allow(non_camel_case_types)]
pub type hsize = u32;

/// The integer type used to store ids and offsets.
#[cfg(feature = "large-handle")]
#[allow(non_camel_case_types)]
pub type hsize = u64;


/// Types that are handles: thin, typed wrappers around an index.
pub trait Handle: 'static + Copy + fmt::Debug + Eq + Ord + Hash {
    /// Creates a handle from the given index.
    fn new(idx: hsize) -> Self;

    /// Returns the index of this handle.
    fn idx(&self) -> hsize;

    /// Helper method to create a handle directly from a `usize`.
    ///
    /// Panics if `raw` does not fit into `hsize`.
    #[inline(always)]
    fn from_usize(raw: usize) -> Self {
        assert!(
            raw <= hsize::max_value() as usize,
            "index {} does not fit into the handle type",
            raw,
        );
        Self::new(raw as hsize)
    }

    /// Helper method to get the index as `usize`.
    #[inline(always)]
    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident = $short:expr;) => {
        $(#[$attr])*
        #[repr(transparent)] // <-- Danger: `CellArray` relies on this!
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
        pub struct $name(hsize);

        impl Handle for $name {
            #[inline(always)]
            fn new(idx: hsize) -> Self {
                $name(idx)
            }

            #[inline(always)]
            fn idx(&self) -> hsize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}{}", $short, self.idx())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.idx().fmt(f)
            }
        }

        // The maximum index is never handed out, so it can be used as niche
        // for `Optioned`.
        impl optional::Noned for $name {
            fn is_none(&self) -> bool {
                self.0 == hsize::max_value()
            }
            fn get_none() -> Self {
                $name(hsize::max_value())
            }
        }

        impl optional::OptEq for $name {
            fn opt_eq(&self, other: &Self) -> bool {
                self == other
            }
        }

        assert_eq_size!($name, hsize);
    };
}

make_handle_type! {
    /// Identifies a point of a point set (the index of the point).
    PointId = "P";
}

make_handle_type! {
    /// Identifies a cell of a [`Mesh`][crate::Mesh]. Cell ids are assigned by
    /// the [`CellTypeIndex`][crate::CellTypeIndex].
    CellId = "C";
}
