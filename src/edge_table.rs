//! Deduplication of undirected edges.

use cgmath::Point3;

use crate::{
    error::{Error, Result},
    handle::{hsize, Handle, PointId},
    points::Points,
};


/// A set of undirected edges between points, optionally with one integer
/// attribute per edge.
///
/// The table keeps one list per point with the higher endpoints of all edges
/// whose lower endpoint is that point. This makes insertion and existence
/// checks cheap (a linear scan over a short list) without hashing.
///
/// Insertion does *not* check whether the edge already exists. Algorithms
/// that stream over all edges of all cells (and hence see shared edges more
/// than once) are expected to call [`is_edge`][EdgeTable::is_edge] first, or
/// to use [`try_insert_edge`][EdgeTable::try_insert_edge].
///
/// # Example
///
/// ```
/// use vizmesh::{EdgeTable, Handle, PointId};
///
/// let mut table = EdgeTable::new();
/// table.init_edge_insertion(10, true);
///
/// let id = table.insert_edge(PointId::new(3), PointId::new(7));
/// assert_eq!(table.is_edge(PointId::new(7), PointId::new(3)), Some(id));
/// assert_eq!(table.is_edge(PointId::new(3), PointId::new(4)), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EdgeTable {
    /// `table[p]` contains the higher endpoints of all edges starting at `p`.
    table: Vec<Vec<PointId>>,

    /// Parallel to `table` if attributes are stored.
    attributes: Option<Vec<Vec<hsize>>>,

    num_edges: hsize,

    /// Traversal cursor: point and position in its list.
    cursor: (usize, usize),
}

impl EdgeTable {
    /// Creates an empty table. Call
    /// [`init_edge_insertion`][EdgeTable::init_edge_insertion] before
    /// inserting to size it for the point set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table prepared for
    /// [`insert_unique_point`][EdgeTable::insert_unique_point]: the attribute
    /// of each edge is the id of the point created on it.
    pub fn for_point_insertion(num_points: usize) -> Self {
        let mut out = Self::new();
        out.init_edge_insertion(num_points, true);
        out
    }

    /// Removes all edges and prepares the table for the points `0..num_points`.
    /// `num_points` is only a size hint: inserting an edge of a larger point
    /// id grows the table. If `store_attributes` is `false`, attributes passed to
    /// [`insert_edge_with_attribute`][EdgeTable::insert_edge_with_attribute]
    /// are ignored.
    pub fn init_edge_insertion(&mut self, num_points: usize, store_attributes: bool) {
        self.table.clear();
        self.table.resize_with(num_points, Vec::new);
        self.attributes = if store_attributes {
            let mut attrs = Vec::new();
            attrs.resize_with(num_points, Vec::new);
            Some(attrs)
        } else {
            None
        };
        self.num_edges = 0;
        self.cursor = (0, 0);
    }

    /// Frees all memory. The table needs to be initialized again before
    /// use.
    pub fn initialize(&mut self) {
        *self = Self::new();
    }

    /// Returns the number of edges inserted so far.
    pub fn num_edges(&self) -> hsize {
        self.num_edges
    }

    /// Returns whether this table stores per-edge attributes.
    pub fn stores_attributes(&self) -> bool {
        self.attributes.is_some()
    }

    /// Checks whether the edge `(p1, p2)` (in any order) is in the table.
    ///
    /// If attributes are stored, the attribute of the edge is returned.
    /// Otherwise, `Some(1)` only signals that the edge exists. Points outside
    /// of the table never have edges.
    pub fn is_edge(&self, p1: PointId, p2: PointId) -> Option<hsize> {
        let (lo, hi) = sorted(p1, p2);
        let pos = self.table.get(lo.to_usize())?.iter().position(|&p| p == hi)?;

        match &self.attributes {
            Some(attrs) => Some(attrs[lo.to_usize()][pos]),
            None => Some(1),
        }
    }

    /// Inserts the edge `(p1, p2)` and returns its id, which is the number of
    /// edges inserted before. If attributes are stored, the id is used as
    /// attribute.
    ///
    /// The caller has to make sure the edge is not already present.
    pub fn insert_edge(&mut self, p1: PointId, p2: PointId) -> hsize {
        debug_assert!(
            self.is_edge(p1, p2).is_none(),
            "edge ({:?}, {:?}) inserted twice",
            p1,
            p2,
        );

        let id = self.num_edges;
        self.push(p1, p2, id);
        id
    }

    /// Like [`insert_edge`][EdgeTable::insert_edge], but returns an error
    /// instead of inserting a duplicate.
    pub fn try_insert_edge(&mut self, p1: PointId, p2: PointId) -> Result<hsize> {
        if self.is_edge(p1, p2).is_some() {
            return Err(Error::InvariantViolation(format!(
                "edge ({:?}, {:?}) is already in the edge table",
                p1,
                p2,
            )));
        }

        Ok(self.insert_edge(p1, p2))
    }

    /// Inserts the edge `(p1, p2)` with the given attribute. The attribute is
    /// dropped if the table was initialized without attribute storage.
    ///
    /// The caller has to make sure the edge is not already present.
    pub fn insert_edge_with_attribute(&mut self, p1: PointId, p2: PointId, attribute: hsize) {
        debug_assert!(
            self.is_edge(p1, p2).is_none(),
            "edge ({:?}, {:?}) inserted twice",
            p1,
            p2,
        );

        self.push(p1, p2, attribute);
    }

    /// Returns the point on edge `(p1, p2)`, creating it at `x` if the edge
    /// does not have one yet. The boolean is `true` if a new point was
    /// appended to `points`.
    ///
    /// This is used by contouring and clipping algorithms where neighboring
    /// cells compute the same intersection point on their shared edge. The
    /// table has to store attributes (see
    /// [`for_point_insertion`][EdgeTable::for_point_insertion]).
    pub fn insert_unique_point(
        &mut self,
        points: &mut Points,
        p1: PointId,
        p2: PointId,
        x: Point3<f64>,
    ) -> Result<(PointId, bool)> {
        if !self.stores_attributes() {
            return Err(Error::InvariantViolation(
                "unique point insertion requires an edge table storing attributes".into()
            ));
        }

        if let Some(existing) = self.is_edge(p1, p2) {
            return Ok((PointId::new(existing), false));
        }

        let id = points.push(x);
        self.push(p1, p2, id.idx());
        Ok((id, true))
    }

    /// Resets the traversal cursor.
    pub fn init_traversal(&mut self) {
        self.cursor = (0, 0);
    }

    /// Returns the next edge of the traversal as `(lo, hi)` with `lo <= hi`,
    /// or `None` if all edges have been visited. Edges are visited sorted by
    /// their lower endpoint and in insertion order for the same lower
    /// endpoint.
    pub fn next_edge(&mut self) -> Option<(PointId, PointId)> {
        let (mut p, mut pos) = self.cursor;
        while p < self.table.len() {
            if let Some(&hi) = self.table[p].get(pos) {
                self.cursor = (p, pos + 1);
                return Some((PointId::from_usize(p), hi));
            }

            p += 1;
            pos = 0;
        }

        self.cursor = (p, 0);
        None
    }

    /// Iterates over all edges in traversal order without touching the
    /// cursor.
    pub fn edges(&self) -> Edges<'_> {
        Edges {
            table: &self.table,
            point: 0,
            pos: 0,
        }
    }

    fn push(&mut self, p1: PointId, p2: PointId, attribute: hsize) {
        let (lo, hi) = sorted(p1, p2);
        let lo = lo.to_usize();

        // Larger point ids than announced grow the table
        if lo >= self.table.len() {
            self.table.resize_with(lo + 1, Vec::new);
        }
        self.table[lo].push(hi);

        if let Some(attrs) = &mut self.attributes {
            if lo >= attrs.len() {
                attrs.resize_with(lo + 1, Vec::new);
            }
            attrs[lo].push(attribute);
        }

        self.num_edges += 1;
    }
}

fn sorted(a: PointId, b: PointId) -> (PointId, PointId) {
    if a <= b { (a, b) } else { (b, a) }
}


/// Iterator over the edges of an [`EdgeTable`], created by
/// [`EdgeTable::edges`].
#[derive(Debug, Clone)]
pub struct Edges<'a> {
    table: &'a [Vec<PointId>],
    point: usize,
    pos: usize,
}

impl Iterator for Edges<'_> {
    type Item = (PointId, PointId);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(list) = self.table.get(self.point) {
            if let Some(&hi) = list.get(self.pos) {
                self.pos += 1;
                return Some((PointId::from_usize(self.point), hi));
            }

            self.point += 1;
            self.pos = 0;
        }

        None
    }
}
