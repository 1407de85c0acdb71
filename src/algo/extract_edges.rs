use crate::{
    cell::cell_edges,
    cell_array::CellArray,
    edge_table::EdgeTable,
    error::{Error, Result},
    handle::{CellId, Handle},
    mesh::Mesh,
};


/// Returns a mesh with the same points as `mesh` and one line cell for each
/// distinct undirected edge of its cells.
///
/// Cells are visited in id order and each edge is emitted the first time it
/// is seen, in the direction it has in that cell. Vertex cells have no
/// edges; deleted cells are skipped.
pub fn extract_edges(mesh: &Mesh) -> Result<Mesh> {
    if mesh.num_points() == 0 || mesh.num_cells() == 0 {
        return Err(Error::NoInputData("mesh without points or cells has no edges".into()));
    }

    let mut table = EdgeTable::new();
    table.init_edge_insertion(mesh.num_points() as usize, false);

    let mut lines = CellArray::new();
    for i in 0..mesh.num_cells() {
        let cell = CellId::new(i);
        let ty = mesh.cell_type(cell)?;
        for [a, b] in cell_edges(ty, mesh.cell_points(cell)?) {
            if table.is_edge(a, b).is_none() {
                table.insert_edge(a, b);
                lines.insert_next_cell(&[a, b]);
            }
        }
    }

    log::debug!("extracted {} edges from {} cells", table.num_edges(), mesh.num_cells());

    // Shares the points with the input
    let mut out = mesh.clone();
    out.set_verts(CellArray::new())?;
    out.set_polys(CellArray::new())?;
    out.set_strips(CellArray::new())?;
    out.set_lines(lines)?;
    Ok(out)
}
