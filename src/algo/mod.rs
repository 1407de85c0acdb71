//! Algorithms building on the topology structures.
//!
//! - [`Delaunay2D`]: incremental 2D Delaunay triangulation of a point set,
//!   optionally filtered to an alpha shape.
//! - [`FeatureEdges`]: boundary, non-manifold, feature and manifold edges of
//!   the polygons of a mesh.
//! - [`extract_edges`]: all edges of a mesh as line cells.
//! - [`contour`]: iso-lines of a point scalar field over a surface.

mod contour;
mod delaunay;
mod extract_edges;
mod feature_edges;

pub use self::{
    contour::contour,
    delaunay::{Delaunay2D, InsertionStats, Triangulation},
    extract_edges::extract_edges,
    feature_edges::{EdgeClass, EdgeCounts, FeatureEdges, FeatureEdgesOutput},
};
