//! Incremental 2D Delaunay triangulation.
//!
//! Points are inserted one after another into a triangulation that starts
//! out as a fan over eight synthetic points surrounding the input. Each new
//! point splits the triangle (or the two triangles sharing the edge) it
//! lands in and the Delaunay property is restored by flipping edges.
//!
//! The z-coordinate of all points is ignored for the triangulation, but kept
//! in the output.

use std::sync::atomic::{AtomicBool, Ordering};

use cgmath::{InnerSpace, MetricSpace, Point3, Vector2};
use optional::Optioned as Opt;
use smallvec::{smallvec, SmallVec};

use crate::{
    cell::CellType,
    cell_array::CellArray,
    error::{Error, Result},
    handle::{hsize, CellId, Handle, PointId},
    math::{circumcircle, in_circumcircle, normalize_2d},
    mesh::Mesh,
    points::{PointSource, Points},
};


/// Products of normalized half-plane distances below this value count as
/// "on the edge".
const WALK_TOLERANCE: f64 = 1.0e-6;

/// Edges `(p1, p2)` of triangle `tri` that still have to be checked after a
/// split.
type SplitEdges = SmallVec<[(PointId, PointId, CellId); 4]>;

/// The six triangles over the eight bounding points (indices relative to
/// the first bounding point).
const BOUNDING_TRIANGLES: [[usize; 3]; 6] = [
    [0, 1, 2],
    [2, 3, 4],
    [4, 5, 6],
    [6, 7, 0],
    [0, 2, 6],
    [2, 4, 6],
];


/// Configuration of the 2D Delaunay triangulation.
///
/// ```
/// use vizmesh::algo::Delaunay2D;
///
/// let config = Delaunay2D {
///     alpha: 2.5,
///     .. Delaunay2D::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delaunay2D {
    /// If positive, only triangles with a circumradius of at most `alpha`
    /// are kept (and edges not longer than `2 * alpha` and unused points are
    /// output as lines and vertices). Default: `0.0` (off). Negative values
    /// are treated as `0.0`.
    pub alpha: f64,

    /// Points closer to an existing point than `tolerance` times the
    /// diagonal of the input's bounding box are considered duplicates and
    /// not inserted. Clamped to `[0, 1]`. Default: `0.001`.
    pub tolerance: f64,

    /// Radius of the bounding points, relative to the diagonal of the
    /// input's bounding box. Values below `0.75` are clamped. Default: `1.0`.
    pub offset: f64,

    /// If `true`, the triangles connected to the eight bounding points are
    /// kept and the bounding points are appended to the output points.
    /// Default: `false`.
    pub bounding_triangulation: bool,

    /// Maximum number of edge flips while inserting one point. If exceeded,
    /// the triangulation fails with [`Error::DegenerateGeometry`] instead of
    /// flipping forever. Default: `10_000`.
    pub max_flips_per_point: u32,
}

impl Default for Delaunay2D {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            tolerance: 0.001,
            offset: 1.0,
            bounding_triangulation: false,
            max_flips_per_point: 10_000,
        }
    }
}

/// Counters describing what happened during point insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertionStats {
    /// Number of input points inserted into the triangulation.
    pub inserted: hsize,

    /// Number of input points skipped because they coincide with an already
    /// inserted point.
    pub duplicates: hsize,

    /// Number of input points skipped because the enclosing triangle could
    /// not be found. If this is not 0, the mesh quality is suspect.
    pub degeneracies: hsize,

    /// Total number of edge flips.
    pub flips: u64,
}

/// The result of a triangulation.
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// Triangles (as polys) and, with alpha filtering, lines and vertices.
    pub mesh: Mesh,
    pub stats: InsertionStats,
}

impl Delaunay2D {
    /// Triangulates the given points.
    ///
    /// Fails with [`Error::NoInputData`] if there are less than three
    /// points. Duplicate and degenerate points do not cause an error, but
    /// are counted in [`Triangulation::stats`].
    pub fn triangulate<S: PointSource + ?Sized>(&self, source: &S) -> Result<Triangulation> {
        self.triangulate_with_cancel(source, &AtomicBool::new(false))
    }

    /// Like [`triangulate`][Delaunay2D::triangulate], but checks `cancel`
    /// before inserting each point and returns [`Error::Cancelled`] once it
    /// is set.
    pub fn triangulate_with_cancel<S: PointSource + ?Sized>(
        &self,
        source: &S,
        cancel: &AtomicBool,
    ) -> Result<Triangulation> {
        let num_points = source.num_points() as usize;
        if num_points < 3 {
            return Err(Error::NoInputData(format!(
                "cannot triangulate {} points, at least 3 are required",
                num_points,
            )));
        }

        log::debug!("generating 2D Delaunay triangulation of {} points", num_points);

        let input = Points::from_source(source);
        let mut builder = Builder::new(self, &input)?;

        for i in 0..num_points {
            if cancel.load(Ordering::Relaxed) {
                log::debug!("triangulation cancelled after {} points", i);
                return Err(Error::Cancelled);
            }

            builder.insert(PointId::from_usize(i))?;

            if i % 1000 == 0 {
                log::debug!("point #{}", i);
            }
        }

        let stats = builder.stats;
        log::debug!(
            "triangulated {} points, {} of which were duplicates",
            num_points,
            stats.duplicates,
        );
        if stats.degeneracies > 0 {
            log::warn!(
                "{} degenerate triangles encountered, mesh quality suspect",
                stats.degeneracies,
            );
        }

        let mesh = builder.finish(input)?;
        Ok(Triangulation { mesh, stats })
    }

    fn clamped(&self) -> Self {
        Self {
            alpha: self.alpha.max(0.0),
            tolerance: self.tolerance.max(0.0).min(1.0),
            offset: self.offset.max(0.75),
            .. *self
        }
    }
}


/// Where a point was found by the walk.
#[derive(Debug, Clone, Copy)]
enum Location {
    /// Strictly inside the triangle.
    Inside { tri: CellId, pts: [PointId; 3] },

    /// On the edge `(a, b)` of `tri`, which is shared with `neighbor`.
    OnEdge {
        tri: CellId,
        pts: [PointId; 3],
        edge: (PointId, PointId),
        neighbor: CellId,
    },

    /// Coincides with a vertex of a triangle.
    Duplicate,

    /// The walk got lost.
    Degenerate,
}

/// Working state of one triangulation run.
struct Builder {
    config: Delaunay2D,
    mesh: Mesh,
    num_input: usize,

    /// Absolute duplicate tolerance.
    tol: f64,

    /// Where the next walk starts.
    start: CellId,
    stats: InsertionStats,
}

impl Builder {
    /// Creates the bounding points and triangles.
    fn new(config: &Delaunay2D, input: &Points) -> Result<Self> {
        let config = config.clamped();
        let n = input.len();

        let center = input.center();
        let length = input.length();
        let radius = config.offset * length;

        let mut points = Points::with_capacity(n + 8);
        for &p in input.as_slice() {
            points.push(p);
        }
        for i in 0..8 {
            let angle = (45.0 * i as f64).to_radians();
            points.push(Point3::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
                center.z,
            ));
        }

        let mut triangles = CellArray::new();
        triangles.allocate(2 * n, CellArray::estimate_size(2 * n, 3));
        for tri in &BOUNDING_TRIANGLES {
            let pts = [
                PointId::from_usize(n + tri[0]),
                PointId::from_usize(n + tri[1]),
                PointId::from_usize(n + tri[2]),
            ];
            triangles.insert_next_cell(&pts);
        }

        let mut mesh = Mesh::new(points);
        mesh.set_polys(triangles)?;
        mesh.build_links();

        Ok(Self {
            config,
            mesh,
            num_input: n,
            tol: config.tolerance * length,
            start: CellId::new(0),
            stats: InsertionStats::default(),
        })
    }

    /// Inserts one point and restores the Delaunay property.
    fn insert(&mut self, pt: PointId) -> Result<()> {
        let x = self.mesh.point(pt);

        let edges = match self.find_triangle(x)? {
            Location::Inside { tri, pts } => {
                self.start = tri;
                self.split_triangle(pt, tri, pts)?
            }
            Location::OnEdge { tri, pts, edge, neighbor } => {
                self.start = tri;
                self.split_edge(pt, tri, pts, edge, neighbor)?
            }
            Location::Duplicate => {
                self.stats.duplicates += 1;
                self.start = CellId::new(0);
                return Ok(());
            }
            Location::Degenerate => {
                self.stats.degeneracies += 1;
                self.start = CellId::new(0);
                return Ok(());
            }
        };

        self.stats.inserted += 1;
        self.legalize(pt, x, &edges)
    }

    /// Walks from `self.start` towards `x`, each step crossing the edge that
    /// separates the current triangle from `x` the most.
    fn find_triangle(&self, x: Point3<f64>) -> Result<Location> {
        let mesh = &self.mesh;
        let mut tri = self.start;
        let mut came_from: Opt<CellId> = Opt::none();

        // Every triangle is visited at most once by a sane walk
        for _ in 0..=mesh.num_cells() {
            let pts = triangle_points(mesh, tri)?;
            let p = [mesh.point(pts[0]), mesh.point(pts[1]), mesh.point(pts[2])];

            let mut inside = true;
            let mut min_proj = 0.0;
            let mut edge = (pts[0], pts[1]);
            for i in 0..3 {
                let i2 = (i + 1) % 3;
                let i3 = (i + 2) % 3;

                // Normal of the edge (i, i2), the third vertex and `x` are on
                // the same side if both projections have the same sign.
                let mut normal = Vector2::new(-(p[i2].y - p[i].y), p[i2].x - p[i].x);
                normalize_2d(&mut normal);

                let mut vp = Vector2::new(p[i3].x - p[i].x, p[i3].y - p[i].y);
                let mut vx = Vector2::new(x.x - p[i].x, x.y - p[i].y);
                normalize_2d(&mut vp);
                if normalize_2d(&mut vx) <= self.tol {
                    return Ok(Location::Duplicate);
                }

                let dp = normal.dot(vp) * normal.dot(vx);
                if dp < WALK_TOLERANCE && dp < min_proj {
                    inside = false;
                    edge = (pts[i], pts[i2]);
                    min_proj = dp;
                }
            }

            if inside {
                return Ok(Location::Inside { tri, pts });
            }

            let next = mesh.cell_edge_neighbors(tri, edge.0, edge.1)?.first().copied();
            let next = match next {
                Some(next) => next,
                None => {
                    log::trace!("walk left the triangulation at {:?}", tri);
                    return Ok(Location::Degenerate);
                }
            };

            if min_proj.abs() < WALK_TOLERANCE {
                return Ok(Location::OnEdge { tri, pts, edge, neighbor: next });
            }

            if came_from == Opt::some(next) {
                log::trace!("walk cycles between {:?} and {:?}", tri, next);
                return Ok(Location::Degenerate);
            }

            came_from = Opt::some(tri);
            tri = next;
        }

        log::trace!("walk did not terminate");
        Ok(Location::Degenerate)
    }

    /// Replaces `tri` by three triangles fanning out from `pt`. Returns the
    /// edges to check.
    fn split_triangle(
        &mut self,
        pt: PointId,
        tri: CellId,
        pts: [PointId; 3],
    ) -> Result<SplitEdges> {
        let mesh = &mut self.mesh;

        mesh.remove_reference_to_cell(pts[2], tri)?;
        mesh.replace_cell(tri, &[pt, pts[0], pts[1]])?;
        mesh.resize_cell_list(pt, 3)?;
        mesh.add_reference_to_cell(pt, tri)?;

        let t1 = mesh.insert_next_linked_cell(CellType::Triangle, &[pt, pts[1], pts[2]])?;
        let t2 = mesh.insert_next_linked_cell(CellType::Triangle, &[pt, pts[2], pts[0]])?;

        Ok(smallvec![
            (pts[0], pts[1], tri),
            (pts[1], pts[2], t1),
            (pts[2], pts[0], t2),
        ])
    }

    /// Splits `tri` and `neighbor`, which share the edge `(a, b)` that `pt`
    /// lies on, into four triangles. Returns the edges to check.
    fn split_edge(
        &mut self,
        pt: PointId,
        tri: CellId,
        pts: [PointId; 3],
        (a, b): (PointId, PointId),
        neighbor: CellId,
    ) -> Result<SplitEdges> {
        let mesh = &mut self.mesh;

        let across = opposite(triangle_points(mesh, neighbor)?, a, b)?;
        let here = opposite(pts, a, b)?;

        // Both old triangles keep `a` and their opposite vertex
        mesh.remove_reference_to_cell(b, tri)?;
        mesh.remove_reference_to_cell(b, neighbor)?;
        mesh.replace_cell(tri, &[pt, here, a])?;
        mesh.replace_cell(neighbor, &[pt, across, a])?;
        mesh.resize_cell_list(pt, 4)?;
        mesh.add_reference_to_cell(pt, tri)?;
        mesh.add_reference_to_cell(pt, neighbor)?;

        let t2 = mesh.insert_next_linked_cell(CellType::Triangle, &[pt, here, b])?;
        let t3 = mesh.insert_next_linked_cell(CellType::Triangle, &[pt, across, b])?;

        Ok(smallvec![
            (here, a, tri),
            (across, a, neighbor),
            (here, b, t2),
            (across, b, t3),
        ])
    }

    /// Flips edges until all triangles around `pt` are Delaunay.
    ///
    /// Each entry of the work stack is an edge `(p1, p2)` of triangle `tri`,
    /// which is `(pt, p1, p2)` in some order. Edges are checked depth first,
    /// in the order they are passed.
    fn legalize(
        &mut self,
        pt: PointId,
        x: Point3<f64>,
        edges: &[(PointId, PointId, CellId)],
    ) -> Result<()> {
        let limit = self.config.max_flips_per_point;
        let mesh = &mut self.mesh;

        let mut stack: Vec<_> = edges.iter().rev().copied().collect();
        let mut flips = 0;
        while let Some((p1, p2, tri)) = stack.pop() {
            let nei = match mesh.cell_edge_neighbors(tri, p1, p2)?.first() {
                Some(&nei) => nei,
                None => continue,
            };

            let p3 = opposite(triangle_points(mesh, nei)?, p1, p2)?;
            if !in_circumcircle(mesh.point(p3), x, mesh.point(p1), mesh.point(p2)) {
                continue;
            }

            if flips >= limit {
                log::warn!("more than {} edge flips while inserting {:?}", limit, pt);
                return Err(Error::DegenerateGeometry(format!(
                    "edge flips do not terminate while inserting point {}",
                    pt,
                )));
            }

            // Swap the diagonal: (pt, p1, p2) + (p1, p3, p2) become
            // (pt, p3, p2) + (pt, p1, p3).
            mesh.remove_reference_to_cell(p1, tri)?;
            mesh.remove_reference_to_cell(p2, nei)?;
            mesh.add_reference_to_cell(pt, nei)?;
            mesh.add_reference_to_cell(p3, tri)?;
            mesh.replace_cell(tri, &[pt, p3, p2])?;
            mesh.replace_cell(nei, &[pt, p1, p3])?;
            flips += 1;

            // The two outer edges of the new triangles are suspect now
            stack.push((p3, p1, nei));
            stack.push((p2, p3, tri));
        }

        self.stats.flips += u64::from(flips);
        Ok(())
    }

    /// Removes the bounding triangles (unless requested otherwise), applies
    /// the alpha filter and assembles the output mesh.
    fn finish(self, input: Points) -> Result<Mesh> {
        let Self { config, mesh, num_input: n, .. } = self;
        let num_triangles = mesh.num_cells() as usize;
        let bounding = config.bounding_triangulation;

        let mut keep = vec![true; num_triangles];
        if !bounding {
            for i in n..n + 8 {
                for &c in mesh.point_cells(PointId::from_usize(i))? {
                    keep[c.to_usize()] = false;
                }
            }
        }

        let mut verts = CellArray::new();
        let mut lines = CellArray::new();
        if config.alpha > 0.0 {
            let alpha2 = config.alpha * config.alpha;
            let mut point_used = vec![false; n + 8];

            for (i, kept) in keep.iter_mut().enumerate().filter(|(_, kept)| **kept) {
                let pts = triangle_points(&mesh, CellId::from_usize(i))?;
                let (_, radius2) = circumcircle(
                    mesh.point(pts[0]),
                    mesh.point(pts[1]),
                    mesh.point(pts[2]),
                );

                if radius2 > alpha2 {
                    *kept = false;
                } else {
                    for p in &pts {
                        point_used[p.to_usize()] = true;
                    }
                }
            }

            // Edges of dropped triangles survive as lines if they are short
            // enough. Each edge is only visited from the cell with the
            // smaller id.
            for i in (0..num_triangles).filter(|&i| !keep[i]) {
                let cell = CellId::from_usize(i);
                let pts = triangle_points(&mesh, cell)?;

                for j in 0..3 {
                    let (p1, p2) = (pts[j], pts[(j + 1) % 3]);
                    if !bounding && (p1.to_usize() >= n || p2.to_usize() >= n) {
                        continue;
                    }

                    let candidate = match mesh.cell_edge_neighbors(cell, p1, p2)?.first() {
                        None => true,
                        Some(&nei) => nei > cell && !keep[nei.to_usize()],
                    };

                    if candidate && mesh.point(p1).distance2(mesh.point(p2)) * 0.25 <= alpha2 {
                        point_used[p1.to_usize()] = true;
                        point_used[p2.to_usize()] = true;
                        lines.insert_next_cell(&[p1, p2]);
                    }
                }
            }

            for (i, _) in point_used.iter().enumerate().filter(|(_, used)| !**used) {
                if i < n || bounding {
                    verts.insert_next_cell(&[PointId::from_usize(i)]);
                }
            }
        }

        let mut polys = CellArray::new();
        polys.allocate(num_triangles, 3 * num_triangles);
        for i in 0..num_triangles {
            if keep[i] || (config.alpha <= 0.0 && bounding) {
                polys.insert_next_cell(mesh.cell_points(CellId::from_usize(i))?);
            }
        }

        let points = if bounding { mesh.points().clone() } else { input };
        let mut out = Mesh::new(points);
        out.set_verts(verts)?;
        out.set_lines(lines)?;
        out.set_polys(polys)?;
        out.squeeze();

        Ok(out)
    }
}

fn triangle_points(mesh: &Mesh, tri: CellId) -> Result<[PointId; 3]> {
    match mesh.cell_points(tri)? {
        &[a, b, c] => Ok([a, b, c]),
        other => Err(Error::InvariantViolation(format!(
            "cell {:?} of the triangulation has {} points",
            tri,
            other.len(),
        ))),
    }
}

/// Returns the vertex of `pts` that is neither `a` nor `b`.
fn opposite(pts: [PointId; 3], a: PointId, b: PointId) -> Result<PointId> {
    pts.iter()
        .copied()
        .find(|&p| p != a && p != b)
        .ok_or_else(|| Error::InvariantViolation(format!(
            "triangle {:?} does not have a vertex opposite of ({:?}, {:?})",
            pts,
            a,
            b,
        )))
}
