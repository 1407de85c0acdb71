//! Scenario tests for the 2D Delaunay triangulation.

use std::{
    collections::HashMap,
    sync::atomic::AtomicBool,
};

use cgmath::Point3;
use vizmesh::{
    algo::Delaunay2D,
    math::circumcircle,
    CellId, Error, Handle, Mesh, PointId,
};


// ===========================================================================
// ===== Helpers
// ===========================================================================

/// Deterministic pseudo random points in `[0, 1)²`, z = 0.
fn scattered(n: usize, mut seed: u64) -> Vec<Point3<f64>> {
    let mut next = move || {
        // xorshift64*
        seed ^= seed >> 12;
        seed ^= seed << 25;
        seed ^= seed >> 27;
        (seed.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..n).map(|_| Point3::new(next(), next(), 0.0)).collect()
}

fn triangles(mesh: &Mesh) -> Vec<[PointId; 3]> {
    mesh.polys()
        .iter()
        .map(|pts| {
            assert_eq!(pts.len(), 3, "not a triangle: {:?}", pts);
            [pts[0], pts[1], pts[2]]
        })
        .collect()
}

/// Asserts that no point used by the triangulation lies clearly inside the
/// circumcircle of any triangle.
fn assert_empty_circles(mesh: &Mesh) {
    let tris = triangles(mesh);
    let mut used = vec![false; mesh.num_points() as usize];
    for tri in &tris {
        for p in tri {
            used[p.to_usize()] = true;
        }
    }

    let points = mesh.points().as_slice();
    for tri in &tris {
        let (center, radius2) = circumcircle(
            points[tri[0].to_usize()],
            points[tri[1].to_usize()],
            points[tri[2].to_usize()],
        );

        for (i, p) in points.iter().enumerate().filter(|&(i, _)| used[i]) {
            if tri.iter().any(|v| v.to_usize() == i) {
                continue;
            }

            let dx = p.x - center.x;
            let dy = p.y - center.y;
            assert!(
                dx * dx + dy * dy >= 0.999 * radius2,
                "point {} lies inside the circumcircle of {:?}",
                i,
                tri,
            );
        }
    }
}

/// Asserts that no undirected edge is used by more than two triangles.
fn assert_edge_manifold(mesh: &Mesh) {
    let mut uses = HashMap::new();
    for tri in triangles(mesh) {
        for i in 0..3 {
            let (a, b) = (tri[i], tri[(i + 1) % 3]);
            *uses.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    for (edge, count) in uses {
        assert!(count <= 2, "edge {:?} is used by {} triangles", edge, count);
    }
}


// ===========================================================================
// ===== Tests
// ===========================================================================

#[test]
fn unit_square() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];

    let out = Delaunay2D::default().triangulate(&points).unwrap();
    assert_eq!(out.mesh.num_points(), 4);
    assert_eq!(out.mesh.num_polys(), 2);
    assert_eq!(out.mesh.num_lines(), 0);
    assert_eq!(out.mesh.num_verts(), 0);
    assert_eq!(out.stats.inserted, 4);
    assert_eq!(out.stats.duplicates, 0);
    assert_eq!(out.stats.degeneracies, 0);

    // Both triangles share one of the diagonals
    let tris = triangles(&out.mesh);
    let shared: Vec<_> = tris[0].iter().filter(|p| tris[1].contains(p)).collect();
    assert_eq!(shared.len(), 2);
    assert_eq!(shared[0].to_usize() % 2, shared[1].to_usize() % 2);
    assert_edge_manifold(&out.mesh);
}

#[test]
fn square_with_inner_point() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.55, 0.45, 0.0),
    ];

    let out = Delaunay2D::default().triangulate(&points).unwrap();
    assert_eq!(out.mesh.num_polys(), 4);
    assert_eq!(out.stats.inserted, 5);

    // The inner point is a corner of every triangle
    let inner = PointId::new(4);
    assert!(triangles(&out.mesh).iter().all(|tri| tri.contains(&inner)));
    assert_empty_circles(&out.mesh);
}

#[test]
fn point_on_shared_diagonal() {
    // The center of the square lies on whichever diagonal the first four
    // points produce. The other two lie on one diagonal, just off the other.
    for &(x, y) in &[(0.5, 0.5), (0.5 + 1e-9, 0.5 - 1e-9), (0.5 - 1e-9, 0.5 - 1e-9)] {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(x, y, 0.0),
        ];

        let out = Delaunay2D::default().triangulate(&points).unwrap();
        assert_eq!(out.stats.inserted, 5);
        assert_eq!(out.stats.degeneracies, 0);
        assert_eq!(out.mesh.num_polys(), 4);

        // Four triangles around the center, each with one side of the square
        let center = PointId::new(4);
        for tri in triangles(&out.mesh) {
            assert!(tri.contains(&center), "{:?} misses the center", tri);
        }
        assert_empty_circles(&out.mesh);
        assert_edge_manifold(&out.mesh);
    }
}

#[test]
fn z_is_kept() {
    let points = vec![
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 2.0),
        Point3::new(0.4, 1.0, 3.0),
    ];

    let out = Delaunay2D::default().triangulate(&points).unwrap();
    assert_eq!(out.mesh.num_polys(), 1);
    assert_eq!(out.mesh.points().as_slice(), &points[..]);
}

#[test]
fn scattered_points_are_delaunay() {
    for &(n, seed) in &[(10, 1), (50, 7), (200, 42)] {
        let points = scattered(n, seed);
        let out = Delaunay2D::default().triangulate(&points).unwrap();

        let stats = out.stats;
        assert_eq!(
            (stats.inserted + stats.duplicates + stats.degeneracies) as usize,
            n,
        );
        assert!(out.mesh.num_polys() > 0);

        assert_empty_circles(&out.mesh);
        assert_edge_manifold(&out.mesh);
    }
}

#[test]
fn duplicates_are_counted() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0 + 1e-7, 0.0),
    ];

    let out = Delaunay2D::default().triangulate(&points).unwrap();
    assert_eq!(out.stats.duplicates, 2);
    assert_eq!(out.stats.inserted, 4);
    assert_eq!(out.mesh.num_polys(), 2);

    // Duplicates are not referenced by any triangle
    for tri in triangles(&out.mesh) {
        assert!(tri.iter().all(|p| p.to_usize() < 4));
    }
}

#[test]
fn too_few_points() {
    let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
    let res = Delaunay2D::default().triangulate(&points);
    assert!(matches!(res, Err(Error::NoInputData(_))));

    let empty: Vec<[f64; 3]> = vec![];
    let res = Delaunay2D::default().triangulate(&empty);
    assert!(matches!(res, Err(Error::NoInputData(_))));
}

#[test]
fn cancelled_before_start() {
    let points = scattered(20, 3);
    let cancel = AtomicBool::new(true);

    let res = Delaunay2D::default().triangulate_with_cancel(&points, &cancel);
    assert!(matches!(res, Err(Error::Cancelled)));
}

#[test]
fn bounding_triangulation_is_kept() {
    let points = vec![
        Point3::new(0.1, 0.2, 0.0),
        Point3::new(0.9, 0.1, 0.0),
        Point3::new(0.8, 0.7, 0.0),
        Point3::new(0.3, 0.9, 0.0),
        Point3::new(0.55, 0.45, 0.0),
    ];

    let config = Delaunay2D {
        bounding_triangulation: true,
        .. Delaunay2D::default()
    };
    let out = config.triangulate(&points).unwrap();

    // All points are inside the octagon formed by the bounding points:
    // 2 * (5 + 8) - 8 - 2 triangles
    assert_eq!(out.mesh.num_points(), 13);
    assert_eq!(out.mesh.num_polys(), 16);
    assert_eq!(&out.mesh.points().as_slice()[..5], &points[..]);
    assert_empty_circles(&out.mesh);
    assert_edge_manifold(&out.mesh);
}

#[test]
fn alpha_filter() {
    // A unit square and one far away point to the right
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(10.0, 0.5, 0.0),
    ];

    let unfiltered = Delaunay2D::default().triangulate(&points).unwrap();
    assert!(unfiltered.mesh.num_polys() > 2);

    let config = Delaunay2D {
        alpha: 1.0,
        .. Delaunay2D::default()
    };
    let out = config.triangulate(&points).unwrap();

    assert_eq!(out.mesh.num_polys(), 2);
    assert_eq!(out.mesh.num_lines(), 0);
    assert_eq!(out.mesh.num_verts(), 1);

    // Cell ids: the vertex comes first
    let vertex = out.mesh.cell_points(CellId::new(0)).unwrap();
    assert_eq!(vertex, &[PointId::new(4)]);
}

#[test]
fn flip_limit() {
    let points = scattered(50, 11);
    let unlimited = Delaunay2D::default().triangulate(&points).unwrap();
    assert!(unlimited.stats.flips > 0);

    let config = Delaunay2D {
        max_flips_per_point: 0,
        .. Delaunay2D::default()
    };
    let res = config.triangulate(&points);
    assert!(matches!(res, Err(Error::DegenerateGeometry(_))));
}
