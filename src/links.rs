//! Point to cell reverse adjacency.

use smallvec::SmallVec;

use crate::{
    error::{Error, Result},
    handle::{hsize, CellId, Handle, PointId},
};


type CellList = SmallVec<[CellId; 6]>;

/// For each point the list of cells using that point.
///
/// The lists are built in bulk by [`CellLinks::build`] (cells are visited in
/// id order, so every list is sorted after a build) and can then be edited
/// incrementally. There is no automatic synchronization with the cell
/// arrays: whoever changes which points a cell references has to add and
/// remove the matching references. [`Mesh`][crate::Mesh] does this for its
/// `*_linked_*` operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellLinks {
    lists: Vec<CellList>,
}

impl CellLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the structure to `num_points` points without any cell
    /// references.
    pub fn allocate(&mut self, num_points: usize) {
        self.lists.clear();
        self.lists.resize_with(num_points, CellList::new);
    }

    /// Builds the links for `num_points` points from the given cells.
    ///
    /// The iterator is walked twice: once to count the uses of each point
    /// (so that every list is allocated exactly once) and once to fill the
    /// lists. Point ids must be smaller than `num_points`.
    pub fn build<'a, I>(num_points: usize, cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CellId, &'a [PointId])>,
        I::IntoIter: Clone,
    {
        let cells = cells.into_iter();

        let mut counts = vec![0usize; num_points];
        for (_, pts) in cells.clone() {
            for p in pts {
                match counts.get_mut(p.to_usize()) {
                    Some(c) => *c += 1,
                    None => return Err(Error::out_of_range("point id", p.idx(), num_points)),
                }
            }
        }

        let mut lists: Vec<CellList> = counts.into_iter()
            .map(CellList::with_capacity)
            .collect();
        for (cell, pts) in cells {
            for p in pts {
                lists[p.to_usize()].push(cell);
            }
        }

        Ok(Self { lists })
    }

    /// Returns the number of points this structure has lists for.
    pub fn num_points(&self) -> hsize {
        self.lists.len() as hsize
    }

    /// Returns the number of cells using the point `p`.
    pub fn num_cells(&self, p: PointId) -> Result<usize> {
        self.list(p).map(|l| l.len())
    }

    /// Returns the cells using the point `p`.
    pub fn cells(&self, p: PointId) -> Result<&[CellId]> {
        self.list(p).map(|l| &l[..])
    }

    /// Appends a new point without references and reserves room for
    /// `num_links_hint` of them. Returns the id of the new point.
    pub fn insert_next_point(&mut self, num_links_hint: usize) -> PointId {
        let id = PointId::from_usize(self.lists.len());
        self.lists.push(CellList::with_capacity(num_links_hint));
        id
    }

    /// Reserves room for `extra` more references of point `p`.
    pub fn resize_cell_list(&mut self, p: PointId, extra: usize) -> Result<()> {
        self.list_mut(p)?.reserve(extra);
        Ok(())
    }

    /// Records that `cell` uses the point `p`.
    pub fn add_cell_reference(&mut self, cell: CellId, p: PointId) -> Result<()> {
        self.list_mut(p)?.push(cell);
        Ok(())
    }

    /// Removes the first reference from point `p` to `cell`, keeping the
    /// order of the remaining references. Returns whether a reference was
    /// found.
    pub fn remove_cell_reference(&mut self, cell: CellId, p: PointId) -> Result<bool> {
        let list = self.list_mut(p)?;
        match list.iter().position(|&c| c == cell) {
            Some(pos) => {
                list.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes all references of the point `p`. The point itself keeps its
    /// id.
    pub fn delete_point(&mut self, p: PointId) -> Result<()> {
        let list = self.list_mut(p)?;
        list.clear();
        list.shrink_to_fit();
        Ok(())
    }

    /// Removes all points but keeps the allocated memory of the outer list.
    pub fn reset(&mut self) {
        self.lists.clear();
    }

    /// Releases over-allocated memory.
    pub fn squeeze(&mut self) {
        for list in &mut self.lists {
            list.shrink_to_fit();
        }
        self.lists.shrink_to_fit();
    }

    fn list(&self, p: PointId) -> Result<&CellList> {
        self.lists
            .get(p.to_usize())
            .ok_or_else(|| Error::out_of_range("point id", p.idx(), self.lists.len()))
    }

    fn list_mut(&mut self, p: PointId) -> Result<&mut CellList> {
        let len = self.lists.len();
        self.lists
            .get_mut(p.to_usize())
            .ok_or_else(|| Error::out_of_range("point id", p.idx(), len))
    }
}
