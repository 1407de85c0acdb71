//! Topology core for unstructured polygonal meshes.
//!
//! This crate stores polygonal data the way visualization pipelines like it:
//! up to four compact [`CellArray`]s (vertices, lines, polygons and triangle
//! strips) plus a point set. Everything that needs random access or upward
//! adjacency is *derived* from those arrays on demand:
//!
//! - [`CellTypeIndex`] maps a cell id to its type and the location of its
//!   record in one of the four arrays.
//! - [`CellLinks`] maps every point to the cells using it.
//!
//! The [`Mesh`] owns all of that, builds the derived structures lazily and
//! throws them away when the arrays change structurally. On top of the mesh,
//! the [`algo`] module offers a 2D Delaunay triangulation
//! ([`Delaunay2D`][algo::Delaunay2D]) and a few edge based algorithms that
//! use the [`EdgeTable`] to visit each undirected edge once.
//!
//!
//! # Example
//!
//! ```
//! use cgmath::Point3;
//! use vizmesh::algo::Delaunay2D;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//!
//! let out = Delaunay2D::default().triangulate(&points).unwrap();
//! assert_eq!(out.mesh.num_polys(), 2);
//! assert_eq!(out.stats.duplicates, 0);
//! ```
//!
//!
//! # Cargo features
//!
//! - `large-handle`: use `u64` instead of `u32` as index type ([`hsize`]).

pub mod algo;
mod bounds;
mod cell;
mod cell_array;
mod cell_types;
mod edge_table;
mod error;
pub mod handle;
mod links;
pub mod math;
mod mesh;
mod points;

pub use self::{
    bounds::BoundingBox,
    cell::{Cell, CellKind, CellType},
    cell_array::{CellArray, CellBuilder, CellLocation, Iter as CellArrayIter},
    cell_types::CellTypeIndex,
    edge_table::{EdgeTable, Edges},
    error::{Error, Result},
    handle::{hsize, CellId, Handle, PointId},
    links::CellLinks,
    mesh::Mesh,
    points::{PointSource, Points},
};
