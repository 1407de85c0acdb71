use failure::Fail;

use crate::handle::hsize;


/// Everything that can go wrong when building or querying mesh topology.
///
/// Low level structures ([`CellArray`][crate::CellArray],
/// [`EdgeTable`][crate::EdgeTable], [`CellLinks`][crate::CellLinks]) report
/// violated preconditions immediately instead of trying to recover, since
/// silently "fixing" a record would invalidate locations held by sibling
/// structures.
#[derive(Debug, Fail)]
pub enum Error {
    /// An id or location does not refer to an existing element.
    #[fail(display = "{} {} is out of range (only {} exist)", what, index, len)]
    IndexOutOfRange {
        what: &'static str,
        index: hsize,
        len: hsize,
    },

    /// A cell record was replaced by a record of different length (records
    /// can only be overwritten in place) or a per-point array does not match
    /// the number of points.
    #[fail(display = "expected {} elements, but got {}", expected, actual)]
    ShapeMismatch {
        expected: usize,
        actual: usize,
    },

    /// A documented precondition of an operation was violated by the caller.
    #[fail(display = "invariant violated: {}", _0)]
    InvariantViolation(String),

    /// The geometry is too degenerate to continue.
    #[fail(display = "degenerate geometry: {}", _0)]
    DegenerateGeometry(String),

    /// The input does not contain enough data for the operation.
    #[fail(display = "no input data: {}", _0)]
    NoInputData(String),

    /// The operation was cancelled by the caller before it completed.
    #[fail(display = "operation was cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn out_of_range(what: &'static str, index: hsize, len: usize) -> Self {
        Error::IndexOutOfRange {
            what,
            index,
            len: len as hsize,
        }
    }
}

/// Shorthand for results with this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
