use cgmath::{InnerSpace, Vector3};

use crate::{
    cell_array::CellArray,
    error::{Error, Result},
    handle::{hsize, CellId, Handle},
    math::polygon_normal,
    mesh::Mesh,
    points::{PointSource, Points},
};


/// The category of an extracted edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeClass {
    /// Used by exactly one polygon.
    Boundary,

    /// Used by more than two polygons.
    NonManifold,

    /// Shared by two polygons meeting at a sharp angle.
    Feature,

    /// Shared by two polygons and not a feature edge.
    Manifold,
}

impl EdgeClass {
    /// The scalar value assigned to the points of edges of this class when
    /// coloring is enabled.
    pub fn scalar(&self) -> f64 {
        match self {
            EdgeClass::Boundary => 0.0,
            EdgeClass::NonManifold => 0.222222,
            EdgeClass::Feature => 0.444444,
            EdgeClass::Manifold => 0.666667,
        }
    }
}

/// Number of extracted edges per class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCounts {
    pub boundary: hsize,
    pub non_manifold: hsize,
    pub feature: hsize,
    pub manifold: hsize,
}

impl EdgeCounts {
    pub fn total(&self) -> hsize {
        self.boundary + self.non_manifold + self.feature + self.manifold
    }

    fn count(&mut self, class: EdgeClass) {
        match class {
            EdgeClass::Boundary => self.boundary += 1,
            EdgeClass::NonManifold => self.non_manifold += 1,
            EdgeClass::Feature => self.feature += 1,
            EdgeClass::Manifold => self.manifold += 1,
        }
    }
}

/// The result of [`FeatureEdges::extract`].
#[derive(Debug, Clone)]
pub struct FeatureEdgesOutput {
    /// One line cell per extracted edge. Every line has two points of its
    /// own; points are not shared between lines.
    pub mesh: Mesh,

    /// The class of each line, in line order.
    pub classes: Vec<EdgeClass>,

    /// One scalar per output point (see [`EdgeClass::scalar`]), if coloring
    /// is enabled.
    pub scalars: Option<Vec<f64>>,

    pub counts: EdgeCounts,
}

/// Extracts special edges of the polygons of a mesh. Only polygons are
/// considered, all other cells are ignored.
///
/// ```
/// use vizmesh::algo::FeatureEdges;
///
/// // Only boundary edges, without scalars
/// let config = FeatureEdges {
///     feature_edges: false,
///     non_manifold_edges: false,
///     coloring: false,
///     .. FeatureEdges::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureEdges {
    /// Two polygons sharing an edge form a feature edge if the angle between
    /// their normals is at least this (in degrees). Default: `30.0`.
    pub feature_angle: f64,

    /// Default: `true`.
    pub boundary_edges: bool,

    /// Default: `true`.
    pub feature_edges: bool,

    /// Default: `true`.
    pub non_manifold_edges: bool,

    /// Default: `false`.
    pub manifold_edges: bool,

    /// Whether to generate per-point scalars. Default: `true`.
    pub coloring: bool,
}

impl Default for FeatureEdges {
    fn default() -> Self {
        Self {
            feature_angle: 30.0,
            boundary_edges: true,
            feature_edges: true,
            non_manifold_edges: true,
            manifold_edges: false,
            coloring: true,
        }
    }
}

impl FeatureEdges {
    /// Runs the extraction. Every edge is reported at most once.
    pub fn extract(&self, mesh: &Mesh) -> Result<FeatureEdgesOutput> {
        if mesh.num_points() == 0 || mesh.num_polys() == 0 {
            return Err(Error::NoInputData("feature edges need points and polygons".into()));
        }

        let mut out_points = Points::new();
        let mut lines = CellArray::new();
        let mut classes = Vec::new();
        let mut scalars = Vec::new();
        let mut counts = EdgeCounts::default();

        if !self.boundary_edges && !self.non_manifold_edges
            && !self.feature_edges && !self.manifold_edges
        {
            log::warn!("all edge types turned off, no edges extracted");
            return Ok(FeatureEdgesOutput {
                mesh: Mesh::new(out_points),
                classes,
                scalars: if self.coloring { Some(scalars) } else { None },
                counts,
            });
        }

        // Only polygons take part, so the cell ids are the polygon indices.
        let mut polys = mesh.clone();
        polys.set_verts(CellArray::new())?;
        polys.set_lines(CellArray::new())?;
        polys.set_strips(CellArray::new())?;

        let normals: Vec<Vector3<f64>> = if self.feature_edges {
            polys.polys()
                .iter()
                .map(|pts| polygon_normal(pts.iter().map(|&p| polys.point(p))))
                .collect()
        } else {
            Vec::new()
        };
        let cos_angle = self.feature_angle.to_radians().cos();

        for (i, pts) in polys.polys().iter().enumerate() {
            let cell = CellId::from_usize(i);
            let n = pts.len();

            for j in 0..n {
                let (p1, p2) = (pts[j], pts[(j + 1) % n]);
                let neighbors = polys.cell_edge_neighbors(cell, p1, p2)?;

                let class = match neighbors.len() {
                    0 if self.boundary_edges => EdgeClass::Boundary,
                    0 => continue,

                    // Only reported by the polygon with the smallest id
                    _ if neighbors.len() > 1 => {
                        if self.non_manifold_edges && neighbors.iter().all(|&nei| nei > cell) {
                            EdgeClass::NonManifold
                        } else {
                            continue;
                        }
                    }

                    // Only reported by the polygon with the smaller id
                    _ => {
                        let nei = neighbors[0];
                        if nei < cell {
                            continue;
                        }

                        let dot = normals.get(i)
                            .zip(normals.get(nei.to_usize()))
                            .map(|(a, b)| a.dot(*b));
                        match dot {
                            Some(dot) if dot <= cos_angle => EdgeClass::Feature,
                            _ if self.manifold_edges => EdgeClass::Manifold,
                            _ => continue,
                        }
                    }
                };

                let a = out_points.push(polys.point(p1));
                let b = out_points.push(polys.point(p2));
                lines.insert_next_cell(&[a, b]);
                classes.push(class);
                scalars.push(class.scalar());
                scalars.push(class.scalar());
                counts.count(class);
            }
        }

        log::debug!(
            "created {} boundary edges, {} non-manifold edges, {} feature edges, {} manifold edges",
            counts.boundary,
            counts.non_manifold,
            counts.feature,
            counts.manifold,
        );

        let mut out = Mesh::new(out_points);
        out.set_lines(lines)?;

        Ok(FeatureEdgesOutput {
            mesh: out,
            classes,
            scalars: if self.coloring { Some(scalars) } else { None },
            counts,
        })
    }
}


#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::handle::PointId;

    /// Two triangles sharing the edge 0-1, the second one rotated around
    /// the x-axis by `angle_deg`.
    fn folded(angle_deg: f64) -> Mesh {
        let a = angle_deg.to_radians();
        let points: Points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -a.cos(), a.sin()),
        ].into();
        let p = PointId::new;

        let mut mesh = Mesh::new(points);
        mesh.set_polys(CellArray::from_cells(vec![
            vec![p(0), p(1), p(2)],
            vec![p(1), p(0), p(3)],
        ])).unwrap();
        mesh
    }

    #[test]
    fn flat_pair() {
        let out = FeatureEdges::default().extract(&folded(0.0)).unwrap();
        assert_eq!(out.counts.boundary, 4);
        assert_eq!(out.counts.feature, 0);
        assert_eq!(out.counts.total(), 4);
        assert_eq!(out.mesh.num_lines(), 4);
        assert_eq!(out.mesh.num_points(), 8);
        assert!(out.classes.iter().all(|&c| c == EdgeClass::Boundary));
        assert_eq!(out.scalars.unwrap(), vec![0.0; 8]);
    }

    #[test]
    fn sharp_fold_is_feature() {
        let out = FeatureEdges::default().extract(&folded(90.0)).unwrap();
        assert_eq!(out.counts.boundary, 4);
        assert_eq!(out.counts.feature, 1);
        assert_eq!(out.classes.iter().filter(|&&c| c == EdgeClass::Feature).count(), 1);
    }

    #[test]
    fn manifold_edges() {
        let config = FeatureEdges {
            boundary_edges: false,
            manifold_edges: true,
            .. FeatureEdges::default()
        };
        let out = config.extract(&folded(10.0)).unwrap();
        assert_eq!(out.counts, EdgeCounts { manifold: 1, .. EdgeCounts::default() });
        assert_eq!(out.scalars.unwrap(), vec![0.666667, 0.666667]);
    }

    #[test]
    fn non_manifold_reported_once() {
        let points: Points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ].into();
        let p = PointId::new;

        let mut mesh = Mesh::new(points);
        mesh.set_polys(CellArray::from_cells(vec![
            vec![p(0), p(1), p(2)],
            vec![p(1), p(0), p(3)],
            vec![p(0), p(1), p(4)],
        ])).unwrap();

        let config = FeatureEdges {
            boundary_edges: false,
            coloring: false,
            .. FeatureEdges::default()
        };
        let out = config.extract(&mesh).unwrap();
        assert_eq!(out.counts.non_manifold, 1);
        assert_eq!(out.counts.total(), 1);
        assert!(out.scalars.is_none());
    }

    #[test]
    fn nothing_enabled() {
        let config = FeatureEdges {
            boundary_edges: false,
            feature_edges: false,
            non_manifold_edges: false,
            manifold_edges: false,
            .. FeatureEdges::default()
        };
        let out = config.extract(&folded(90.0)).unwrap();
        assert_eq!(out.counts.total(), 0);
        assert_eq!(out.mesh.num_cells(), 0);
    }

    #[test]
    fn no_polygons() {
        let mesh = Mesh::new(vec![Point3::new(0.0, 0.0, 0.0)].into());
        assert!(matches!(
            FeatureEdges::default().extract(&mesh),
            Err(Error::NoInputData(_))
        ));
    }
}
