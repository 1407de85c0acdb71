//! Cell types and the owned [`Cell`] value returned by mesh queries.

use std::fmt;

use cgmath::Point3;
use smallvec::SmallVec;

use crate::{
    bounds::BoundingBox,
    handle::PointId,
};


/// The type of a cell in a [`Mesh`][crate::Mesh].
///
/// This is a closed set: every type is stored in exactly one of the four
/// cell arrays of a mesh (see [`CellKind`]), except for `Empty`, which marks
/// deleted cells and is stored nowhere. The discriminants match the numeric
/// type codes used by common visualization file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellType {
    Empty = 0,
    Vertex = 1,
    PolyVertex = 2,
    Line = 3,
    PolyLine = 4,
    Triangle = 5,
    TriangleStrip = 6,
    Polygon = 7,
    Quad = 9,
}

impl CellType {
    /// Returns the type of a record with `n` points in the vertex array.
    pub fn for_vert(n: usize) -> Self {
        if n > 1 { CellType::PolyVertex } else { CellType::Vertex }
    }

    /// Returns the type of a record with `n` points in the line array.
    pub fn for_line(n: usize) -> Self {
        if n > 2 { CellType::PolyLine } else { CellType::Line }
    }

    /// Returns the type of a record with `n` points in the polygon array.
    pub fn for_poly(n: usize) -> Self {
        match n {
            3 => CellType::Triangle,
            4 => CellType::Quad,
            _ => CellType::Polygon,
        }
    }

    /// Returns the type of a record in the array of the given kind.
    pub fn classify(kind: CellKind, n: usize) -> Self {
        match kind {
            CellKind::Verts => Self::for_vert(n),
            CellKind::Lines => Self::for_line(n),
            CellKind::Polys => Self::for_poly(n),
            CellKind::Strips => CellType::TriangleStrip,
        }
    }

    /// Returns the array cells of this type are stored in, or `None` for
    /// `Empty`.
    pub fn kind(&self) -> Option<CellKind> {
        match self {
            CellType::Empty => None,
            CellType::Vertex | CellType::PolyVertex => Some(CellKind::Verts),
            CellType::Line | CellType::PolyLine => Some(CellKind::Lines),
            CellType::Triangle | CellType::Quad | CellType::Polygon => Some(CellKind::Polys),
            CellType::TriangleStrip => Some(CellKind::Strips),
        }
    }

    /// The topological dimension: 0 for vertices, 1 for lines, 2 for
    /// surfaces. `Empty` cells have dimension 0.
    pub fn dimension(&self) -> u8 {
        match self.kind() {
            None | Some(CellKind::Verts) => 0,
            Some(CellKind::Lines) => 1,
            Some(CellKind::Polys) | Some(CellKind::Strips) => 2,
        }
    }
}

impl TryFrom<u8> for CellType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let out = match code {
            0 => CellType::Empty,
            1 => CellType::Vertex,
            2 => CellType::PolyVertex,
            3 => CellType::Line,
            4 => CellType::PolyLine,
            5 => CellType::Triangle,
            6 => CellType::TriangleStrip,
            7 => CellType::Polygon,
            9 => CellType::Quad,
            other => return Err(other),
        };

        Ok(out)
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CellType::Empty => "empty",
            CellType::Vertex => "vertex",
            CellType::PolyVertex => "poly-vertex",
            CellType::Line => "line",
            CellType::PolyLine => "poly-line",
            CellType::Triangle => "triangle",
            CellType::TriangleStrip => "triangle strip",
            CellType::Polygon => "polygon",
            CellType::Quad => "quad",
        }.fmt(f)
    }
}


/// The four cell arrays of a mesh. The order of the variants is the order
/// in which cell ids are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Verts,
    Lines,
    Polys,
    Strips,
}

impl CellKind {
    pub const ALL: [CellKind; 4] = [CellKind::Verts, CellKind::Lines, CellKind::Polys, CellKind::Strips];
}


/// An owned snapshot of one cell: its type, its point ids and the
/// coordinates of those points.
///
/// Deleted (or otherwise unknown) cells are represented by the empty cell
/// (see [`Cell::empty`]) instead of an error, so that stale ids can be
/// queried during incremental construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    ty: CellType,
    point_ids: SmallVec<[PointId; 4]>,
    points: SmallVec<[Point3<f64>; 4]>,
}

impl Cell {
    pub(crate) fn new(
        ty: CellType,
        point_ids: SmallVec<[PointId; 4]>,
        points: SmallVec<[Point3<f64>; 4]>,
    ) -> Self {
        debug_assert_eq!(point_ids.len(), points.len());
        Self { ty, point_ids, points }
    }

    /// The empty cell without any points.
    pub fn empty() -> Self {
        Self {
            ty: CellType::Empty,
            point_ids: SmallVec::new(),
            points: SmallVec::new(),
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.ty
    }

    pub fn is_empty(&self) -> bool {
        self.ty == CellType::Empty
    }

    pub fn num_points(&self) -> usize {
        self.point_ids.len()
    }

    pub fn point_ids(&self) -> &[PointId] {
        &self.point_ids
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::around(self.points.iter().cloned())
    }

    /// Returns the number of edges of this cell.
    pub fn num_edges(&self) -> usize {
        edge_count(self.ty, self.point_ids.len())
    }

    /// Iterates over the edges of this cell as pairs of point ids, in the
    /// order they appear in the cell.
    ///
    /// - Vertices have no edges.
    /// - (Poly-)lines have an edge between each consecutive pair of points.
    /// - Polygons additionally have the closing edge from the last to the
    ///   first point.
    /// - Triangle strips have the edges of all their triangles, each listed
    ///   once.
    pub fn edges(&self) -> impl Iterator<Item = [PointId; 2]> + '_ {
        cell_edges(self.ty, &self.point_ids)
    }

    /// Decomposes this cell into triangles. Polygons and quads are
    /// fan-triangulated from their first point (which is only correct for
    /// convex polygons), strips are split into their triangles with
    /// consistent orientation. Vertices and lines yield nothing.
    pub fn triangles(&self) -> impl Iterator<Item = [PointId; 3]> + '_ {
        cell_triangles(self.ty, &self.point_ids)
    }
}


fn edge_count(ty: CellType, n: usize) -> usize {
    match ty.kind() {
        None | Some(CellKind::Verts) => 0,
        Some(CellKind::Lines) => n.saturating_sub(1),
        Some(CellKind::Polys) => if n < 2 { 0 } else if n == 2 { 1 } else { n },
        Some(CellKind::Strips) => if n < 2 { 0 } else { 2 * n - 3 },
    }
}

/// Iterates over the edges of a cell given by its type and point ids. See
/// [`Cell::edges`].
pub(crate) fn cell_edges(ty: CellType, pts: &[PointId]) -> impl Iterator<Item = [PointId; 2]> + '_ {
    let n = pts.len();
    let count = edge_count(ty, n);
    let is_strip = ty == CellType::TriangleStrip;

    (0..count).map(move |i| {
        if is_strip {
            // First the "spine" edge 0-1, then for each further point the
            // two edges connecting it to its two predecessors.
            if i == 0 {
                [pts[0], pts[1]]
            } else {
                let k = (i + 1) / 2 + 1;
                let back = if i % 2 == 1 { 2 } else { 1 };
                [pts[k - back], pts[k]]
            }
        } else {
            [pts[i], pts[(i + 1) % n]]
        }
    })
}

/// Iterates over the triangles of a cell given by its type and point ids.
/// See [`Cell::triangles`].
pub(crate) fn cell_triangles(ty: CellType, pts: &[PointId]) -> impl Iterator<Item = [PointId; 3]> + '_ {
    let n = pts.len();
    let count = match ty.kind() {
        Some(CellKind::Polys) | Some(CellKind::Strips) => n.saturating_sub(2),
        _ => 0,
    };
    let is_strip = ty == CellType::TriangleStrip;

    (0..count).map(move |i| {
        if !is_strip {
            [pts[0], pts[i + 1], pts[i + 2]]
        } else if i % 2 == 0 {
            [pts[i], pts[i + 1], pts[i + 2]]
        } else {
            [pts[i + 1], pts[i], pts[i + 2]]
        }
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    fn ids(raw: &[u32]) -> Vec<PointId> {
        raw.iter().map(|&i| PointId::from_usize(i as usize)).collect()
    }

    fn edges_of(ty: CellType, raw: &[u32]) -> Vec<[usize; 2]> {
        cell_edges(ty, &ids(raw))
            .map(|[a, b]| [a.to_usize(), b.to_usize()])
            .collect()
    }

    #[test]
    fn classification() {
        assert_eq!(CellType::classify(CellKind::Verts, 1), CellType::Vertex);
        assert_eq!(CellType::classify(CellKind::Verts, 3), CellType::PolyVertex);
        assert_eq!(CellType::classify(CellKind::Lines, 2), CellType::Line);
        assert_eq!(CellType::classify(CellKind::Lines, 5), CellType::PolyLine);
        assert_eq!(CellType::classify(CellKind::Polys, 3), CellType::Triangle);
        assert_eq!(CellType::classify(CellKind::Polys, 4), CellType::Quad);
        assert_eq!(CellType::classify(CellKind::Polys, 6), CellType::Polygon);
        assert_eq!(CellType::classify(CellKind::Strips, 3), CellType::TriangleStrip);
    }

    #[test]
    fn type_codes() {
        for &ty in &[
            CellType::Empty, CellType::Vertex, CellType::PolyVertex, CellType::Line,
            CellType::PolyLine, CellType::Triangle, CellType::TriangleStrip,
            CellType::Polygon, CellType::Quad,
        ] {
            assert_eq!(CellType::try_from(ty as u8), Ok(ty));
        }
        assert_eq!(CellType::try_from(8), Err(8));
        assert_eq!(CellType::Empty.kind(), None);
    }

    #[test]
    fn edges() {
        assert!(edges_of(CellType::Vertex, &[4]).is_empty());
        assert_eq!(edges_of(CellType::PolyLine, &[0, 1, 2]), vec![[0, 1], [1, 2]]);
        assert_eq!(edges_of(CellType::Triangle, &[0, 1, 2]), vec![[0, 1], [1, 2], [2, 0]]);
        assert_eq!(
            edges_of(CellType::TriangleStrip, &[0, 1, 2, 3]),
            vec![[0, 1], [0, 2], [1, 2], [1, 3], [2, 3]],
        );
    }

    #[test]
    fn triangles() {
        let quad = ids(&[0, 1, 2, 3]);
        let tris: Vec<_> = cell_triangles(CellType::Quad, &quad).collect();
        assert_eq!(tris, vec![ids_arr([0, 1, 2]), ids_arr([0, 2, 3])]);

        let strip = ids(&[0, 1, 2, 3, 4]);
        let tris: Vec<_> = cell_triangles(CellType::TriangleStrip, &strip).collect();
        assert_eq!(tris, vec![ids_arr([0, 1, 2]), ids_arr([2, 1, 3]), ids_arr([2, 3, 4])]);
    }

    fn ids_arr(raw: [u32; 3]) -> [PointId; 3] {
        let v = ids(&raw);
        [v[0], v[1], v[2]]
    }

    #[test]
    fn empty_cell() {
        let c = Cell::empty();
        assert!(c.is_empty());
        assert_eq!(c.num_points(), 0);
        assert_eq!(c.edges().count(), 0);
        assert!(!c.bounds().is_valid());
    }
}
