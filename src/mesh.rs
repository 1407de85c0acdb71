//! The polygonal mesh: points, four cell arrays and the derived topology.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use cgmath::Point3;
use smallvec::SmallVec;

use crate::{
    bounds::BoundingBox,
    cell::{cell_edges, Cell, CellKind, CellType},
    cell_array::{CellArray, CellLocation},
    cell_types::CellTypeIndex,
    error::{Error, Result},
    handle::{hsize, CellId, Handle, PointId},
    links::CellLinks,
    points::{PointSource, Points},
};


/// A set of points plus vertices, lines, polygons and triangle strips
/// referencing those points.
///
/// The four [`CellArray`]s are the source of truth. Two structures are
/// derived from them on demand:
///
/// - the [`CellTypeIndex`], which gives every cell an id. Ids are assigned
///   in the order verts, lines, polys, strips; so the first
///   [`num_verts`][Mesh::num_verts] ids are vertex cells and so on. Cells
///   inserted later through this type get the next free id at the end.
/// - the [`CellLinks`], which map each point to the cells using it.
///
/// Both are built lazily by the first query needing them (which works
/// through `&self`), dropped by operations that would make them stale, and
/// can be built or dropped explicitly.
///
/// Cloning a mesh is cheap: the clone shares all arrays and derived
/// structures with the original. The first modification of a shared array
/// copies it, so clones never observe each other's changes. Use
/// [`deep_copy`][Mesh::deep_copy] to duplicate everything up front.
#[derive(Clone, Default)]
pub struct Mesh {
    points: Arc<Points>,
    verts: Arc<CellArray>,
    lines: Arc<CellArray>,
    polys: Arc<CellArray>,
    strips: Arc<CellArray>,

    cells: OnceLock<Arc<CellTypeIndex>>,
    links: OnceLock<Arc<CellLinks>>,
}

impl Mesh {
    /// Creates a mesh with the given points and no cells.
    pub fn new(points: Points) -> Self {
        Self {
            points: Arc::new(points),
            .. Self::default()
        }
    }

    /// Creates a mesh without cells by copying all points of `source`.
    pub fn from_source<S: PointSource + ?Sized>(source: &S) -> Self {
        Self::new(Points::from_source(source))
    }

    /// Returns a mesh that shares nothing with `self`.
    pub fn deep_copy(&self) -> Self {
        fn deep<T: Clone>(lock: &OnceLock<Arc<T>>) -> OnceLock<Arc<T>> {
            match lock.get() {
                Some(v) => OnceLock::from(Arc::new((**v).clone())),
                None => OnceLock::new(),
            }
        }

        Self {
            points: Arc::new((*self.points).clone()),
            verts: Arc::new((*self.verts).clone()),
            lines: Arc::new((*self.lines).clone()),
            polys: Arc::new((*self.polys).clone()),
            strips: Arc::new((*self.strips).clone()),
            cells: deep(&self.cells),
            links: deep(&self.links),
        }
    }

    /// Returns `true` if both meshes share the memory of all four cell
    /// arrays (i.e. one is an unmodified clone of the other).
    pub fn shares_cells_with(&self, other: &Mesh) -> bool {
        CellKind::ALL.iter().all(|&k| Arc::ptr_eq(self.slot(k), other.slot(k)))
    }

    // =======================================================================
    // ===== Points
    // =======================================================================

    /// Returns the point coordinates.
    pub fn points(&self) -> &Points {
        &self.points
    }

    /// Returns the number of points.
    pub fn num_points(&self) -> hsize {
        self.points.len() as hsize
    }

    /// Appends a point. If the links are built, the point gets an empty link
    /// list with room for `num_links_hint` cells.
    pub fn insert_next_linked_point(&mut self, x: Point3<f64>, num_links_hint: usize) -> PointId {
        let id = Arc::make_mut(&mut self.points).push(x);
        if let Some(links) = self.links.get_mut() {
            Arc::make_mut(links).insert_next_point(num_links_hint);
        }
        id
    }

    /// Appends a point.
    pub fn insert_next_point(&mut self, x: Point3<f64>) -> PointId {
        self.insert_next_linked_point(x, 0)
    }

    /// Axis aligned bounding box of all points.
    pub fn bounds(&self) -> BoundingBox {
        self.points.bounds()
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point3<f64> {
        self.points.center()
    }

    /// Length of the diagonal of the bounding box.
    pub fn length(&self) -> f64 {
        self.points.length()
    }

    // =======================================================================
    // ===== Cell arrays
    // =======================================================================

    /// Returns the cell array holding cells of the given kind.
    pub fn cell_array(&self, kind: CellKind) -> &CellArray {
        self.slot(kind)
    }

    /// Vertex and poly vertex cells.
    pub fn verts(&self) -> &CellArray {
        &self.verts
    }

    /// Line and poly line cells.
    pub fn lines(&self) -> &CellArray {
        &self.lines
    }

    /// Triangle, quad and polygon cells.
    pub fn polys(&self) -> &CellArray {
        &self.polys
    }

    /// Triangle strips.
    pub fn strips(&self) -> &CellArray {
        &self.strips
    }

    /// Replaces one of the cell arrays. All point ids are checked against
    /// the point set. The derived structures are dropped.
    pub fn set_cell_array(&mut self, kind: CellKind, cells: CellArray) -> Result<()> {
        for pts in cells.iter() {
            self.check_points(pts)?;
        }

        *self.slot_mut(kind) = Arc::new(cells);
        self.delete_cells();
        Ok(())
    }

    /// Replaces the vertex array, see [`set_cell_array`][Mesh::set_cell_array].
    pub fn set_verts(&mut self, cells: CellArray) -> Result<()> {
        self.set_cell_array(CellKind::Verts, cells)
    }

    /// Replaces the line array, see [`set_cell_array`][Mesh::set_cell_array].
    pub fn set_lines(&mut self, cells: CellArray) -> Result<()> {
        self.set_cell_array(CellKind::Lines, cells)
    }

    /// Replaces the polygon array, see [`set_cell_array`][Mesh::set_cell_array].
    pub fn set_polys(&mut self, cells: CellArray) -> Result<()> {
        self.set_cell_array(CellKind::Polys, cells)
    }

    /// Replaces the strip array, see [`set_cell_array`][Mesh::set_cell_array].
    pub fn set_strips(&mut self, cells: CellArray) -> Result<()> {
        self.set_cell_array(CellKind::Strips, cells)
    }

    /// Number of cells in the vertex array.
    pub fn num_verts(&self) -> hsize {
        self.verts.num_cells()
    }

    /// Number of cells in the line array.
    pub fn num_lines(&self) -> hsize {
        self.lines.num_cells()
    }

    /// Number of cells in the polygon array.
    pub fn num_polys(&self) -> hsize {
        self.polys.num_cells()
    }

    /// Number of cells in the strip array.
    pub fn num_strips(&self) -> hsize {
        self.strips.num_cells()
    }

    /// Number of cells in all four arrays. Cells marked as deleted are still
    /// counted until [`remove_deleted_cells`][Mesh::remove_deleted_cells] is
    /// called.
    pub fn num_cells(&self) -> hsize {
        CellKind::ALL.iter().map(|&k| self.slot(k).num_cells()).sum()
    }

    /// Size of the largest cell in any array.
    pub fn max_cell_size(&self) -> usize {
        CellKind::ALL.iter().map(|&k| self.slot(k).max_cell_size()).max().unwrap_or(0)
    }

    // =======================================================================
    // ===== Derived structures
    // =======================================================================

    /// (Re)builds the cell type index. This also drops the links.
    pub fn build_cells(&mut self) {
        self.delete_cells();
        self.cell_index();
    }

    /// (Re)builds the links, building the cell type index first if
    /// necessary.
    pub fn build_links(&mut self) {
        self.delete_links();
        self.cell_links();
    }

    /// Drops the cell type index and the links (which depend on the cell
    /// ids).
    pub fn delete_cells(&mut self) {
        self.cells = OnceLock::new();
        self.links = OnceLock::new();
    }

    /// Drops the links but keeps the cell type index.
    pub fn delete_links(&mut self) {
        self.links = OnceLock::new();
    }

    /// Returns whether the cell type index is currently built.
    pub fn has_cell_index(&self) -> bool {
        self.cells.get().is_some()
    }

    /// Returns whether the links are currently built.
    pub fn has_links(&self) -> bool {
        self.links.get().is_some()
    }

    /// Returns the cell type index, building it if necessary.
    pub fn cell_index(&self) -> &CellTypeIndex {
        self.cells.get_or_init(|| {
            let mut index = CellTypeIndex::with_capacity(self.num_cells() as usize);
            for &kind in &CellKind::ALL {
                for (loc, pts) in self.slot(kind).iter_with_locations() {
                    index.insert_next_cell(CellType::classify(kind, pts.len()), loc);
                }
            }
            Arc::new(index)
        })
    }

    /// Returns the links, building them (and the cell type index) if
    /// necessary.
    pub fn cell_links(&self) -> &CellLinks {
        self.links.get_or_init(|| {
            let cells = self.cell_index()
                .iter()
                .filter(|&(_, ty, _)| ty != CellType::Empty)
                .map(move |(id, ty, loc)| (id, self.record(ty, loc)));

            match CellLinks::build(self.points.len(), cells) {
                Ok(links) => Arc::new(links),
                Err(e) => unreachable!("cell arrays reference unknown point: {}", e),
            }
        })
    }

    fn cell_index_mut(&mut self) -> &mut CellTypeIndex {
        self.cell_index();
        match self.cells.get_mut() {
            Some(index) => Arc::make_mut(index),
            None => unreachable!(),
        }
    }

    fn cell_links_mut(&mut self) -> &mut CellLinks {
        self.cell_links();
        match self.links.get_mut() {
            Some(links) => Arc::make_mut(links),
            None => unreachable!(),
        }
    }

    // =======================================================================
    // ===== Cell queries
    // =======================================================================

    /// Returns the type of a cell. Deleted cells are [`CellType::Empty`].
    pub fn cell_type(&self, id: CellId) -> Result<CellType> {
        self.cell_index().cell_type(id)
    }

    /// Returns the point ids of a cell. Deleted cells have no points.
    pub fn cell_points(&self, id: CellId) -> Result<&[PointId]> {
        let index = self.cell_index();
        let ty = index.cell_type(id)?;
        let loc = index.cell_location(id)?;
        Ok(self.record(ty, loc))
    }

    /// Returns type, point ids and coordinates of a cell. Deleted cells are
    /// returned as [`Cell::empty`].
    pub fn cell(&self, id: CellId) -> Result<Cell> {
        let ty = self.cell_type(id)?;
        if ty == CellType::Empty {
            return Ok(Cell::empty());
        }

        let ids: SmallVec<[PointId; 4]> = self.cell_points(id)?.into();
        let coords = ids.iter().map(|&p| self.points[p]).collect();
        Ok(Cell::new(ty, ids, coords))
    }

    /// Bounding box of the points of a cell.
    pub fn cell_bounds(&self, id: CellId) -> Result<BoundingBox> {
        let pts = self.cell_points(id)?;
        Ok(BoundingBox::around(pts.iter().map(|&p| self.points[p])))
    }

    /// Returns the cells using point `p`.
    pub fn point_cells(&self, p: PointId) -> Result<&[CellId]> {
        self.cell_links().cells(p)
    }

    /// Returns all cells except `cell` that use both `p1` and `p2`. For a
    /// manifold surface and an edge of `cell`, that's the one cell on the
    /// other side of the edge (or none at the border).
    pub fn cell_edge_neighbors(
        &self,
        cell: CellId,
        p1: PointId,
        p2: PointId,
    ) -> Result<SmallVec<[CellId; 2]>> {
        let candidates = self.point_cells(p1)?;
        self.point_cells(p2)?;

        let mut out = SmallVec::new();
        for &c in candidates {
            if c != cell && self.cell_points(c)?.contains(&p2) {
                out.push(c);
            }
        }

        Ok(out)
    }

    /// Returns all cells except `cell` that use all the given points.
    pub fn cell_neighbors(&self, cell: CellId, pts: &[PointId]) -> Result<Vec<CellId>> {
        // Start with the point used by the fewest cells
        let mut smallest: Option<&[CellId]> = None;
        for &p in pts {
            let cells = self.point_cells(p)?;
            if smallest.map_or(true, |s| cells.len() < s.len()) {
                smallest = Some(cells);
            }
        }

        let mut out = Vec::new();
        for &c in smallest.unwrap_or(&[]) {
            if c == cell {
                continue;
            }

            let used = self.cell_points(c)?;
            if pts.iter().all(|p| used.contains(p)) {
                out.push(c);
            }
        }

        Ok(out)
    }

    /// Returns whether there is a triangle cell with exactly these three
    /// points (in any order).
    pub fn is_triangle(&self, p1: PointId, p2: PointId, p3: PointId) -> Result<bool> {
        for &c in self.point_cells(p1)? {
            if self.cell_type(c)? == CellType::Triangle {
                let pts = self.cell_points(c)?;
                if pts.contains(&p2) && pts.contains(&p3) {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Returns whether any cell has an edge between `p1` and `p2`.
    pub fn is_edge(&self, p1: PointId, p2: PointId) -> Result<bool> {
        self.point_cells(p2)?;
        for &c in self.point_cells(p1)? {
            let ty = self.cell_type(c)?;
            let found = cell_edges(ty, self.cell_points(c)?)
                .any(|[a, b]| (a == p1 && b == p2) || (a == p2 && b == p1));
            if found {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Returns whether any cell uses point `p`.
    pub fn is_point_used_by_cell(&self, p: PointId) -> Result<bool> {
        self.point_cells(p).map(|cells| !cells.is_empty())
    }

    // =======================================================================
    // ===== Editing
    // =======================================================================

    /// Appends a cell to the array matching its type and returns its id.
    ///
    /// The cell type index is kept up to date, but the links are dropped. For
    /// incremental algorithms, prefer
    /// [`insert_next_linked_cell`][Mesh::insert_next_linked_cell].
    pub fn insert_next_cell(&mut self, ty: CellType, pts: &[PointId]) -> Result<CellId> {
        let kind = self.check_cell(ty, pts)?;

        // The index has to exist before the record is added, otherwise the
        // record would be indexed twice.
        self.cell_index();
        let loc = self.array_mut(kind).insert_next_cell(pts);
        let id = self.cell_index_mut().insert_next_cell(ty, loc);
        self.delete_links();

        Ok(id)
    }

    /// Like [`insert_next_cell`][Mesh::insert_next_cell], but also adds the
    /// new cell to the link lists of its points (building the links first if
    /// necessary).
    pub fn insert_next_linked_cell(&mut self, ty: CellType, pts: &[PointId]) -> Result<CellId> {
        let kind = self.check_cell(ty, pts)?;

        self.cell_links();
        let loc = self.array_mut(kind).insert_next_cell(pts);
        let id = self.cell_index_mut().insert_next_cell(ty, loc);

        let links = self.cell_links_mut();
        for &p in pts {
            links.add_cell_reference(id, p)?;
        }

        Ok(id)
    }

    /// Overwrites the points of a cell with the same number of points.
    ///
    /// The links are *not* updated. Callers maintaining links have to add
    /// and remove the affected references themselves (or use
    /// [`replace_linked_cell`][Mesh::replace_linked_cell]).
    pub fn replace_cell(&mut self, id: CellId, pts: &[PointId]) -> Result<()> {
        self.check_points(pts)?;
        let (kind, loc) = self.live_cell(id)?;
        self.array_mut(kind).replace_cell(loc, pts)
    }

    /// Like [`replace_cell`][Mesh::replace_cell], but moves the references of
    /// the cell in the links from the old to the new points.
    pub fn replace_linked_cell(&mut self, id: CellId, pts: &[PointId]) -> Result<()> {
        let old: SmallVec<[PointId; 4]> = self.cell_points(id)?.into();
        self.cell_links();
        self.replace_cell(id, pts)?;

        let links = self.cell_links_mut();
        for &p in &old {
            links.remove_cell_reference(id, p)?;
        }
        for &p in pts {
            links.add_cell_reference(id, p)?;
        }

        Ok(())
    }

    /// Replaces the first occurrence of `old` in the cell by `new`. Returns
    /// whether `old` was found. The links are not updated.
    pub fn replace_cell_point(&mut self, id: CellId, old: PointId, new: PointId) -> Result<bool> {
        self.check_points(&[new])?;
        let (kind, loc) = self.live_cell(id)?;
        self.array_mut(kind).replace_cell_point(loc, old, new)
    }

    /// Reverses the point order (and thus the orientation) of a cell.
    pub fn reverse_cell(&mut self, id: CellId) -> Result<()> {
        let (kind, loc) = self.live_cell(id)?;
        self.array_mut(kind).reverse_cell(loc)
    }

    /// Marks a cell as deleted. Its id stays valid (with type
    /// [`CellType::Empty`]) until
    /// [`remove_deleted_cells`][Mesh::remove_deleted_cells] is called.
    /// References in the links are not removed.
    pub fn delete_cell(&mut self, id: CellId) -> Result<()> {
        self.cell_index_mut().delete_cell(id)
    }

    /// Removes all cell references of point `p` from the links. The point
    /// itself stays.
    pub fn delete_point(&mut self, p: PointId) -> Result<()> {
        self.cell_links_mut().delete_point(p)
    }

    /// Rewrites the cell arrays without the cells marked as deleted and
    /// returns how many cells were removed. Cell ids change, so the derived
    /// structures are dropped (if anything was removed).
    pub fn remove_deleted_cells(&mut self) -> hsize {
        let index = match self.cells.get() {
            Some(index) => index.clone(),
            None => return 0,
        };

        let mut arrays: [CellArray; 4] = Default::default();
        let mut removed = 0;
        for (_, ty, loc) in index.iter() {
            match ty.kind() {
                Some(kind) => {
                    arrays[kind as usize].insert_next_cell(self.record(ty, loc));
                }
                None => removed += 1,
            }
        }

        if removed > 0 {
            let [verts, lines, polys, strips] = arrays;
            self.verts = Arc::new(verts);
            self.lines = Arc::new(lines);
            self.polys = Arc::new(polys);
            self.strips = Arc::new(strips);
            self.delete_cells();
        }

        removed
    }

    /// Adds `cell` to the link lists of all its points.
    pub fn add_cell_reference(&mut self, cell: CellId) -> Result<()> {
        let pts: SmallVec<[PointId; 4]> = self.cell_points(cell)?.into();
        let links = self.cell_links_mut();
        for p in pts {
            links.add_cell_reference(cell, p)?;
        }
        Ok(())
    }

    /// Removes `cell` from the link lists of all its points.
    pub fn remove_cell_reference(&mut self, cell: CellId) -> Result<()> {
        let pts: SmallVec<[PointId; 4]> = self.cell_points(cell)?.into();
        let links = self.cell_links_mut();
        for p in pts {
            links.remove_cell_reference(cell, p)?;
        }
        Ok(())
    }

    /// Adds `cell` to the link list of point `p`.
    pub fn add_reference_to_cell(&mut self, p: PointId, cell: CellId) -> Result<()> {
        self.cell_links_mut().add_cell_reference(cell, p)
    }

    /// Removes `cell` from the link list of point `p`.
    pub fn remove_reference_to_cell(&mut self, p: PointId, cell: CellId) -> Result<()> {
        self.cell_links_mut().remove_cell_reference(cell, p).map(|_| ())
    }

    /// Reserves room for `extra` more references in the link list of `p`.
    pub fn resize_cell_list(&mut self, p: PointId, extra: usize) -> Result<()> {
        self.cell_links_mut().resize_cell_list(p, extra)
    }

    /// Releases over-allocated memory of all structures not shared with
    /// another mesh.
    pub fn squeeze(&mut self) {
        if let Some(points) = Arc::get_mut(&mut self.points) {
            points.squeeze();
        }
        for &kind in &CellKind::ALL {
            if let Some(cells) = Arc::get_mut(self.slot_mut(kind)) {
                cells.squeeze();
            }
        }
        if let Some(index) = self.cells.get_mut().and_then(Arc::get_mut) {
            index.squeeze();
        }
        if let Some(links) = self.links.get_mut().and_then(Arc::get_mut) {
            links.squeeze();
        }
    }

    // =======================================================================
    // ===== Helpers
    // =======================================================================

    fn slot(&self, kind: CellKind) -> &Arc<CellArray> {
        match kind {
            CellKind::Verts => &self.verts,
            CellKind::Lines => &self.lines,
            CellKind::Polys => &self.polys,
            CellKind::Strips => &self.strips,
        }
    }

    fn slot_mut(&mut self, kind: CellKind) -> &mut Arc<CellArray> {
        match kind {
            CellKind::Verts => &mut self.verts,
            CellKind::Lines => &mut self.lines,
            CellKind::Polys => &mut self.polys,
            CellKind::Strips => &mut self.strips,
        }
    }

    fn array_mut(&mut self, kind: CellKind) -> &mut CellArray {
        Arc::make_mut(self.slot_mut(kind))
    }

    /// Looks up a record the cell index points to. Index and arrays are
    /// always modified together, so the location is valid.
    fn record(&self, ty: CellType, loc: CellLocation) -> &[PointId] {
        let kind = match ty.kind() {
            Some(kind) => kind,
            None => return &[],
        };

        match self.slot(kind).get_cell(loc) {
            Ok(pts) => pts,
            Err(e) => unreachable!("cell index out of sync with cell arrays: {}", e),
        }
    }

    /// Returns array and location of a cell that is not deleted.
    fn live_cell(&self, id: CellId) -> Result<(CellKind, CellLocation)> {
        let index = self.cell_index();
        let ty = index.cell_type(id)?;
        let loc = index.cell_location(id)?;
        match ty.kind() {
            Some(kind) => Ok((kind, loc)),
            None => Err(Error::InvariantViolation(format!("cell {:?} is deleted", id))),
        }
    }

    fn check_points(&self, pts: &[PointId]) -> Result<()> {
        let len = self.points.len();
        match pts.iter().find(|p| p.to_usize() >= len) {
            Some(p) => Err(Error::out_of_range("point id", p.idx(), len)),
            None => Ok(()),
        }
    }

    /// Checks that `pts` form a valid cell of type `ty` and returns the array
    /// the cell belongs into.
    fn check_cell(&self, ty: CellType, pts: &[PointId]) -> Result<CellKind> {
        let kind = ty.kind().ok_or_else(|| {
            Error::InvariantViolation("cannot insert a cell of type 'empty'".into())
        })?;

        let (min, exact) = match ty {
            CellType::Vertex => (1, true),
            CellType::Line => (2, true),
            CellType::Triangle => (3, true),
            CellType::Quad => (4, true),
            CellType::PolyVertex => (1, false),
            CellType::PolyLine => (2, false),
            CellType::Polygon | CellType::TriangleStrip => (3, false),
            CellType::Empty => unreachable!(),
        };

        let n = pts.len();
        if n < min || (exact && n != min) {
            return Err(Error::InvariantViolation(format!(
                "a {} cannot have {} points",
                ty,
                n,
            )));
        }

        self.check_points(pts)?;
        Ok(kind)
    }
}

impl PointSource for Mesh {
    fn num_points(&self) -> hsize {
        self.points.num_points()
    }

    fn point(&self, id: PointId) -> Point3<f64> {
        self.points[id]
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("num_points", &self.num_points())
            .field("verts", &self.verts)
            .field("lines", &self.lines)
            .field("polys", &self.polys)
            .field("strips", &self.strips)
            .field("has_cell_index", &self.has_cell_index())
            .field("has_links", &self.has_links())
            .finish()
    }
}
