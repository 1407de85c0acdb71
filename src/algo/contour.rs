use smallvec::SmallVec;

use crate::{
    cell::{cell_triangles, CellType},
    cell_array::CellArray,
    edge_table::EdgeTable,
    error::{Error, Result},
    handle::{Handle, PointId},
    mesh::Mesh,
    points::{PointSource, Points},
};


/// Computes the iso-line `scalars == value` over the polygons and triangle
/// strips of `mesh` (marching triangles).
///
/// `scalars` has to contain one value per point. Polygons are split into
/// triangle fans. The returned mesh contains only the contour points and the
/// line segments; a point where the contour crosses an edge shared by two
/// cells is created only once.
pub fn contour(mesh: &Mesh, scalars: &[f64], value: f64) -> Result<Mesh> {
    let num_points = mesh.num_points() as usize;
    if scalars.len() != num_points {
        return Err(Error::ShapeMismatch {
            expected: num_points,
            actual: scalars.len(),
        });
    }
    if mesh.num_polys() == 0 && mesh.num_strips() == 0 {
        return Err(Error::NoInputData("contouring needs polygons or triangle strips".into()));
    }

    let mut points = Points::new();
    let mut table = EdgeTable::for_point_insertion(num_points);
    let mut lines = CellArray::new();

    let cells = mesh.polys()
        .iter()
        .map(|pts| (CellType::for_poly(pts.len()), pts))
        .chain(mesh.strips().iter().map(|pts| (CellType::TriangleStrip, pts)));

    for (ty, pts) in cells {
        for tri in cell_triangles(ty, pts) {
            let mut ends = SmallVec::<[PointId; 2]>::new();
            for k in 0..3 {
                // Always interpolate from the smaller id, so that both cells
                // sharing the edge compute the same point.
                let (a, b) = match (tri[k], tri[(k + 1) % 3]) {
                    (a, b) if a < b => (a, b),
                    (a, b) => (b, a),
                };
                let (sa, sb) = (scalars[a.to_usize()], scalars[b.to_usize()]);
                if (sa >= value) == (sb >= value) {
                    continue;
                }

                let t = (value - sa) / (sb - sa);
                let (xa, xb) = (mesh.point(a), mesh.point(b));
                let x = xa + (xb - xa) * t;

                let (id, _) = table.insert_unique_point(&mut points, a, b, x)?;
                ends.push(id);
            }

            if let &[p, q] = &ends[..] {
                if p != q {
                    lines.insert_next_cell(&[p, q]);
                }
            }
        }
    }

    log::debug!(
        "contour at {} has {} points and {} segments",
        value,
        points.len(),
        lines.num_cells(),
    );

    let mut out = Mesh::new(points);
    out.set_lines(lines)?;
    Ok(out)
}
