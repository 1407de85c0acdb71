//! Random access from cell ids to cell types and record locations.

use crate::{
    cell::CellType,
    cell_array::CellLocation,
    error::{Error, Result},
    handle::{hsize, CellId, Handle},
};


/// Maps each cell id to its [`CellType`] and to the location of its record
/// in one of the [`CellArray`][crate::CellArray]s of a mesh.
///
/// Cell ids are simply the insertion order: the n-th inserted entry gets id
/// `n`. Deleting a cell does not remove the entry (that would shift all
/// following ids), it only marks it as [`CellType::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellTypeIndex {
    entries: Vec<(CellType, CellLocation)>,
}

impl CellTypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(num_cells: usize) -> Self {
        Self {
            entries: Vec::with_capacity(num_cells),
        }
    }

    /// Reserves memory for `additional` more entries.
    pub fn allocate(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    /// Appends an entry and returns the id of the new cell.
    pub fn insert_next_cell(&mut self, ty: CellType, loc: CellLocation) -> CellId {
        let id = CellId::from_usize(self.entries.len());
        self.entries.push((ty, loc));
        id
    }

    /// Sets the entry of an existing cell.
    pub fn set_cell(&mut self, id: CellId, ty: CellType, loc: CellLocation) -> Result<()> {
        let entry = self.entry_mut(id)?;
        *entry = (ty, loc);
        Ok(())
    }

    pub fn num_cells(&self) -> hsize {
        self.entries.len() as hsize
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cell_type(&self, id: CellId) -> Result<CellType> {
        self.entry(id).map(|(ty, _)| ty)
    }

    pub fn cell_location(&self, id: CellId) -> Result<CellLocation> {
        self.entry(id).map(|(_, loc)| loc)
    }

    /// Marks a cell as deleted by setting its type to [`CellType::Empty`].
    /// The record it referred to is left untouched.
    pub fn delete_cell(&mut self, id: CellId) -> Result<()> {
        self.entry_mut(id)?.0 = CellType::Empty;
        Ok(())
    }

    pub fn is_deleted(&self, id: CellId) -> Result<bool> {
        self.cell_type(id).map(|ty| ty == CellType::Empty)
    }

    /// Iterates over all entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, CellType, CellLocation)> + Clone + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, &(ty, loc))| (CellId::from_usize(i), ty, loc))
    }

    /// Removes all entries but keeps the allocated memory.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Releases over-allocated memory.
    pub fn squeeze(&mut self) {
        self.entries.shrink_to_fit();
    }

    fn entry(&self, id: CellId) -> Result<(CellType, CellLocation)> {
        self.entries
            .get(id.to_usize())
            .cloned()
            .ok_or_else(|| Error::out_of_range("cell id", id.idx(), self.entries.len()))
    }

    fn entry_mut(&mut self, id: CellId) -> Result<&mut (CellType, CellLocation)> {
        let len = self.entries.len();
        self.entries
            .get_mut(id.to_usize())
            .ok_or_else(|| Error::out_of_range("cell id", id.idx(), len))
    }
}
