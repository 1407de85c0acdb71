//! The compact cell array: a flat list of variable-length point id records.

use std::{fmt, iter::FromIterator, slice};

use static_assertions::assert_eq_size;

use crate::{
    error::{Error, Result},
    handle::{hsize, Handle, PointId},
};


/// Opaque token identifying where a record lives inside a [`CellArray`].
///
/// Locations are handed out by the array on insertion and during traversal.
/// They are only meaningful for the array that produced them and stay valid
/// as long as that array is not reset or rebuilt. There is intentionally no
/// way to create a location from an integer or to do arithmetic with it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellLocation(hsize);

assert_eq_size!(CellLocation, hsize);

impl fmt::Debug for CellLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}


/// Explicit representation of cell connectivity.
///
/// The array is one flat list of integers of the form `(n, id_1, ..., id_n,
/// n, id_1, ..., id_n, ...)` where `n` is the number of points of a cell and
/// each `id` is an index into an associated point set. This is very compact
/// and trivial to hand to external code, but does not support random access
/// by cell id. That is what the [`CellTypeIndex`][crate::CellTypeIndex] and
/// [`CellLinks`][crate::CellLinks] add on top.
///
/// Records can only be addressed by the [`CellLocation`] returned when they
/// were inserted (or visited during traversal). A record can be overwritten
/// in place with a record of the same length, but never grown or shrunk.
///
/// # Example
///
/// ```
/// use vizmesh::{CellArray, Handle, PointId};
///
/// let ids = |raw: &[usize]| raw.iter().map(|&i| PointId::from_usize(i)).collect::<Vec<_>>();
///
/// let mut cells = CellArray::new();
/// let tri = cells.insert_next_cell(&ids(&[0, 1, 2]));
/// cells.insert_next_cell(&ids(&[3, 4, 5, 6]));
///
/// assert_eq!(cells.num_cells(), 2);
/// assert_eq!(cells.max_cell_size(), 4);
/// assert_eq!(cells.get_cell(tri).unwrap(), &ids(&[0, 1, 2])[..]);
///
/// cells.init_traversal();
/// assert_eq!(cells.next_cell().map(|c| c.len()), Some(3));
/// assert_eq!(cells.next_cell().map(|c| c.len()), Some(4));
/// assert_eq!(cells.next_cell(), None);
/// ```
#[derive(Clone, Default)]
pub struct CellArray {
    data: Vec<hsize>,
    num_cells: hsize,

    /// Offset of the next record `next_cell` returns.
    traversal: usize,

    /// Location of the record `next_cell` returned last.
    last_traversed: Option<CellLocation>,
}

impl CellArray {
    /// Creates an empty cell array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of integers required to store `num_cells` cells
    /// with at most `max_pts_per_cell` points each. Exact if all cells have
    /// the same size.
    pub fn estimate_size(num_cells: usize, max_pts_per_cell: usize) -> usize {
        num_cells * (1 + max_pts_per_cell)
    }

    /// Reserves memory for roughly `estimated_cells` cells using
    /// `estimated_connectivity` point ids in total. This only affects how
    /// often the array has to grow.
    pub fn allocate(&mut self, estimated_cells: usize, estimated_connectivity: usize) {
        self.data.reserve(estimated_cells + estimated_connectivity);
    }

    /// Creates a cell array from raw connectivity data in the form `(n, id_1,
    /// ..., id_n, n, ...)`. Fails if the last record is truncated.
    pub fn from_connectivity(data: Vec<hsize>) -> Result<Self> {
        let mut num_cells = 0;
        let mut pos = 0;
        while pos < data.len() {
            let end = pos + 1 + data[pos] as usize;
            if end > data.len() {
                return Err(Error::InvariantViolation(format!(
                    "record at offset {} claims {} points, but only {} entries follow",
                    pos,
                    data[pos],
                    data.len() - pos - 1,
                )));
            }

            pos = end;
            num_cells += 1;
        }

        Ok(Self {
            data,
            num_cells,
            traversal: 0,
            last_traversed: None,
        })
    }

    /// Creates a cell array containing the given cells in order.
    pub fn from_cells<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[PointId]>,
    {
        cells.into_iter().collect()
    }

    /// Returns the number of cells (records) in this array.
    pub fn num_cells(&self) -> hsize {
        self.num_cells
    }

    pub fn is_empty(&self) -> bool {
        self.num_cells == 0
    }

    /// Returns the number of point ids stored in all records (the counts are
    /// not included).
    pub fn size(&self) -> usize {
        self.data.len() - self.num_cells as usize
    }

    /// Returns the total number of integers in the connectivity list, counts
    /// included.
    pub fn num_connectivity_entries(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of integers that can be stored without
    /// reallocating.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Returns the number of points of the largest cell, or 0 if the array is
    /// empty.
    pub fn max_cell_size(&self) -> usize {
        self.iter().map(|c| c.len()).max().unwrap_or(0)
    }

    /// Appends a cell with the given points and returns its location.
    pub fn insert_next_cell(&mut self, pts: &[PointId]) -> CellLocation {
        let loc = CellLocation(to_hsize(self.data.len()));
        self.data.reserve(pts.len() + 1);
        self.data.push(to_hsize(pts.len()));
        self.data.extend(pts.iter().map(|p| p.idx()));
        self.num_cells += 1;

        loc
    }

    /// Starts a cell with `count` points whose ids are not known yet.
    ///
    /// The ids are added one by one with [`CellBuilder::push`]; the cell is
    /// completed by [`CellBuilder::finish`]. Exactly `count` ids have to be
    /// pushed. If that's not the case (or the builder is dropped without
    /// calling `finish`), the partial record is removed again.
    pub fn begin_cell(&mut self, count: usize) -> CellBuilder<'_> {
        let start = self.data.len();
        self.data.reserve(count + 1);
        self.data.push(to_hsize(count));

        CellBuilder {
            array: self,
            start,
            count,
            done: false,
        }
    }

    /// Returns the point ids of the cell at `loc`.
    pub fn get_cell(&self, loc: CellLocation) -> Result<&[PointId]> {
        let range = self.record_range(loc)?;
        Ok(as_point_ids(&self.data[range]))
    }

    /// Overwrites the points of the cell at `loc`. The new cell must have
    /// exactly as many points as the old one.
    pub fn replace_cell(&mut self, loc: CellLocation, pts: &[PointId]) -> Result<()> {
        let range = self.record_range(loc)?;
        if range.len() != pts.len() {
            return Err(Error::ShapeMismatch {
                expected: range.len(),
                actual: pts.len(),
            });
        }

        for (dst, src) in self.data[range].iter_mut().zip(pts) {
            *dst = src.idx();
        }

        Ok(())
    }

    /// Replaces the first occurrence of `old` in the cell at `loc` with
    /// `new`. Returns whether `old` was found.
    pub fn replace_cell_point(
        &mut self,
        loc: CellLocation,
        old: PointId,
        new: PointId,
    ) -> Result<bool> {
        let range = self.record_range(loc)?;
        match self.data[range].iter_mut().find(|id| **id == old.idx()) {
            Some(slot) => {
                *slot = new.idx();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reverses the order of the points of the cell at `loc`.
    pub fn reverse_cell(&mut self, loc: CellLocation) -> Result<()> {
        let range = self.record_range(loc)?;
        self.data[range].reverse();
        Ok(())
    }

    /// Resets the traversal cursor to the first cell.
    pub fn init_traversal(&mut self) {
        self.traversal = 0;
        self.last_traversed = None;
    }

    /// Returns the next cell of the traversal started by
    /// [`init_traversal`][CellArray::init_traversal] or `None` if all cells
    /// have been visited.
    pub fn next_cell(&mut self) -> Option<&[PointId]> {
        if self.traversal >= self.data.len() {
            return None;
        }

        let loc = self.traversal;
        let end = loc + 1 + self.data[loc] as usize;
        self.traversal = end;
        self.last_traversed = Some(CellLocation(to_hsize(loc)));

        Some(as_point_ids(&self.data[loc + 1..end]))
    }

    /// Returns the location of the cell returned by the last call to
    /// [`next_cell`][CellArray::next_cell].
    pub fn traversal_location(&self) -> Option<CellLocation> {
        self.last_traversed
    }

    /// Iterates over all cells together with their locations. Unlike the
    /// traversal cursor, this does not require mutable access.
    pub fn iter_with_locations(&self) -> Iter<'_> {
        Iter {
            data: &self.data,
            pos: 0,
            remaining: self.num_cells as usize,
        }
    }

    /// Iterates over the point ids of all cells.
    pub fn iter(&self) -> impl Iterator<Item = &[PointId]> + '_ {
        self.iter_with_locations().map(|(_, pts)| pts)
    }

    /// Removes all cells but keeps the allocated memory.
    pub fn reset(&mut self) {
        self.data.clear();
        self.num_cells = 0;
        self.init_traversal();
    }

    /// Releases over-allocated memory.
    pub fn squeeze(&mut self) {
        self.data.shrink_to_fit();
    }

    fn record_range(&self, loc: CellLocation) -> Result<std::ops::Range<usize>> {
        let start = loc.0 as usize;
        let len = match self.data.get(start) {
            Some(&len) => len as usize,
            None => return Err(Error::out_of_range("cell location", loc.0, self.data.len())),
        };

        let end = start + 1 + len;
        if end > self.data.len() {
            return Err(Error::out_of_range("cell location", loc.0, self.data.len()));
        }

        Ok(start + 1..end)
    }
}

impl<C: AsRef<[PointId]>> FromIterator<C> for CellArray {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut out = Self::new();
        for cell in iter {
            out.insert_next_cell(cell.as_ref());
        }
        out
    }
}

impl PartialEq for CellArray {
    fn eq(&self, other: &Self) -> bool {
        // The traversal state is not part of the content.
        self.num_cells == other.num_cells && self.data == other.data
    }
}

impl fmt::Debug for CellArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}


/// Reserved, partially filled record of a [`CellArray`], created by
/// [`CellArray::begin_cell`].
#[derive(Debug)]
pub struct CellBuilder<'a> {
    array: &'a mut CellArray,
    start: usize,
    count: usize,
    done: bool,
}

impl CellBuilder<'_> {
    /// Appends the next point id to the record. Fails if all reserved slots
    /// are already filled.
    pub fn push(&mut self, id: PointId) -> Result<()> {
        if self.filled() >= self.count {
            return Err(Error::InvariantViolation(format!(
                "cell was started with {} points, tried to add another one",
                self.count,
            )));
        }

        self.array.data.push(id.idx());
        Ok(())
    }

    /// Number of ids pushed so far.
    pub fn filled(&self) -> usize {
        self.array.data.len() - self.start - 1
    }

    /// Completes the record and returns its location. Fails (and removes the
    /// partial record) if fewer ids than announced were pushed.
    pub fn finish(mut self) -> Result<CellLocation> {
        let filled = self.filled();
        if filled != self.count {
            return Err(Error::InvariantViolation(format!(
                "cell was started with {} points, but only {} were added",
                self.count,
                filled,
            )));
        }

        self.done = true;
        self.array.num_cells += 1;
        Ok(CellLocation(to_hsize(self.start)))
    }
}

impl Drop for CellBuilder<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.array.data.truncate(self.start);
        }
    }
}


/// Iterator over the cells of a [`CellArray`] and their locations. Created by
/// [`CellArray::iter_with_locations`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    data: &'a [hsize],
    pos: usize,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (CellLocation, &'a [PointId]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }

        let loc = self.pos;
        let end = loc + 1 + self.data[loc] as usize;
        self.pos = end;
        self.remaining -= 1;

        Some((CellLocation(to_hsize(loc)), as_point_ids(&self.data[loc + 1..end])))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}


fn as_point_ids(raw: &[hsize]) -> &[PointId] {
    // SAFETY: `PointId` is `#[repr(transparent)]` around `hsize`, so both
    // slices have the same layout.
    unsafe { slice::from_raw_parts(raw.as_ptr() as *const PointId, raw.len()) }
}

fn to_hsize(v: usize) -> hsize {
    assert!(
        v <= hsize::max_value() as usize,
        "cell array too large for the index type (consider the `large-handle` feature)",
    );
    v as hsize
}
