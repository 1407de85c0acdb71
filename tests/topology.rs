//! Tests combining the topology structures on a small mixed mesh.

use cgmath::Point3;
use vizmesh::{
    algo::{contour, extract_edges, FeatureEdges},
    CellArray, CellId, CellType, EdgeTable, Handle, Mesh, PointId, PointSource, Points,
};


/// A 3x3 grid of points (id = 3 * y + x) with four quads, one poly line
/// along the bottom and a vertex at the top right corner.
fn grid() -> Mesh {
    let mut points = Points::new();
    for y in 0..3 {
        for x in 0..3 {
            points.push(Point3::new(x as f64, y as f64, 0.0));
        }
    }

    let p = |x: usize, y: usize| PointId::from_usize(3 * y + x);
    let mut quads = CellArray::new();
    for y in 0..2 {
        for x in 0..2 {
            quads.insert_next_cell(&[p(x, y), p(x + 1, y), p(x + 1, y + 1), p(x, y + 1)]);
        }
    }

    let mut mesh = Mesh::new(points);
    mesh.set_polys(quads).unwrap();
    mesh.set_lines(CellArray::from_cells(vec![vec![p(0, 0), p(1, 0), p(2, 0)]])).unwrap();
    mesh.set_verts(CellArray::from_cells(vec![vec![p(2, 2)]])).unwrap();
    mesh
}

fn id(i: usize) -> PointId {
    PointId::from_usize(i)
}

fn cell(i: usize) -> CellId {
    CellId::from_usize(i)
}


#[test]
fn cell_ids_follow_array_order() {
    let mesh = grid();
    assert_eq!(mesh.num_cells(), 6);

    assert_eq!(mesh.cell_type(cell(0)).unwrap(), CellType::Vertex);
    assert_eq!(mesh.cell_type(cell(1)).unwrap(), CellType::PolyLine);
    for i in 2..6 {
        assert_eq!(mesh.cell_type(cell(i)).unwrap(), CellType::Quad);
    }

    assert_eq!(mesh.cell_points(cell(1)).unwrap(), &[id(0), id(1), id(2)]);
    assert_eq!(mesh.cell_points(cell(2)).unwrap(), &[id(0), id(1), id(4), id(3)]);
    assert!(mesh.cell_type(cell(6)).is_err());
}

#[test]
fn links_and_neighbors() {
    let mesh = grid();

    assert_eq!(mesh.point_cells(id(4)).unwrap(), &[cell(2), cell(3), cell(4), cell(5)]);
    assert_eq!(mesh.point_cells(id(0)).unwrap(), &[cell(1), cell(2)]);
    assert_eq!(mesh.point_cells(id(8)).unwrap(), &[cell(0), cell(5)]);

    // Quad 2 shares the edge (1, 4) with quad 3 and the edge (0, 1) with
    // the poly line
    assert_eq!(&mesh.cell_edge_neighbors(cell(2), id(1), id(4)).unwrap()[..], &[cell(3)]);
    assert_eq!(&mesh.cell_edge_neighbors(cell(2), id(0), id(1)).unwrap()[..], &[cell(1)]);
    assert!(mesh.cell_edge_neighbors(cell(2), id(0), id(3)).unwrap().is_empty());

    assert!(mesh.is_edge(id(0), id(1)).unwrap());
    assert!(mesh.is_edge(id(4), id(5)).unwrap());
    assert!(!mesh.is_edge(id(0), id(4)).unwrap());
    assert!(!mesh.is_triangle(id(0), id(1), id(4)).unwrap());
}

#[test]
fn edit_and_compact() {
    let mut mesh = grid();

    mesh.delete_cell(cell(3)).unwrap();
    assert_eq!(mesh.cell_type(cell(3)).unwrap(), CellType::Empty);
    assert!(mesh.cell(cell(3)).unwrap().is_empty());

    assert_eq!(mesh.remove_deleted_cells(), 1);
    assert_eq!(mesh.num_cells(), 5);
    assert_eq!(mesh.num_polys(), 3);

    // Point 2 was only used by the poly line and the deleted quad
    assert_eq!(mesh.point_cells(id(2)).unwrap(), &[cell(1)]);

    let tri = mesh.insert_next_cell(CellType::Triangle, &[id(1), id(2), id(5)]).unwrap();
    assert_eq!(tri, cell(5));
    assert_eq!(mesh.point_cells(id(2)).unwrap(), &[cell(1), cell(5)]);
}

#[test]
fn copies() {
    let mesh = grid();
    assert!(!mesh.cell_links().cells(id(4)).unwrap().is_empty());

    let mut shallow = mesh.clone();
    assert!(shallow.shares_cells_with(&mesh));

    shallow.insert_next_cell(CellType::Line, &[id(6), id(7)]).unwrap();
    assert!(!shallow.shares_cells_with(&mesh));
    assert_eq!(mesh.num_cells(), 6);
    assert_eq!(shallow.num_cells(), 7);

    let deep = mesh.deep_copy();
    assert!(!deep.shares_cells_with(&mesh));
    assert_eq!(deep.polys(), mesh.polys());
}

#[test]
fn extracted_edges() {
    let out = extract_edges(&grid()).unwrap();

    // 12 grid edges, the two poly line edges are among them
    assert_eq!(out.num_lines(), 12);
    assert_eq!(out.num_polys(), 0);
    assert_eq!(out.num_verts(), 0);
    assert!(out.lines().iter().all(|pts| pts.len() == 2));
}

#[test]
fn boundary_of_flat_grid() {
    let out = FeatureEdges::default().extract(&grid()).unwrap();

    assert_eq!(out.counts.boundary, 8);
    assert_eq!(out.counts.feature, 0);
    assert_eq!(out.counts.non_manifold, 0);
    assert_eq!(out.mesh.num_lines(), 8);
    assert_eq!(out.classes.len(), 8);

    let scalars = out.scalars.unwrap();
    assert_eq!(scalars.len(), out.mesh.num_points() as usize);
    assert!(scalars.iter().all(|&s| s == 0.0));
}

#[test]
fn contour_of_x_coordinate() {
    let mesh = grid();
    let scalars: Vec<_> = (0..mesh.num_points())
        .map(|i| mesh.point(PointId::new(i)).x)
        .collect();

    let out = contour(&mesh, &scalars, 0.5).unwrap();
    assert_eq!(out.num_lines(), 4);
    assert_eq!(out.num_points(), 5);
    for i in 0..out.num_points() {
        assert!((out.point(PointId::new(i)).x - 0.5).abs() < 1e-12);
    }
}

#[test]
fn edge_table_scenario() {
    let mut table = EdgeTable::new();
    table.init_edge_insertion(10, false);

    assert_eq!(table.is_edge(id(3), id(7)), None);
    table.insert_edge(id(3), id(7));
    assert_eq!(table.is_edge(id(7), id(3)), table.is_edge(id(3), id(7)));
    assert!(table.is_edge(id(3), id(7)).is_some());
    assert_eq!(table.num_edges(), 1);
}

#[test]
fn cell_array_scenario() {
    let mut cells = CellArray::new();
    cells.insert_next_cell(&[id(0), id(1), id(2)]);
    cells.insert_next_cell(&[id(3), id(4), id(5), id(6)]);
    assert_eq!(cells.max_cell_size(), 4);

    cells.init_traversal();
    assert_eq!(cells.next_cell(), Some(&[id(0), id(1), id(2)][..]));
    assert_eq!(cells.next_cell(), Some(&[id(3), id(4), id(5), id(6)][..]));
    assert_eq!(cells.next_cell(), None);
}
