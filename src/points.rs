use std::ops::Index;

use cgmath::Point3;

use crate::{
    bounds::BoundingBox,
    error::{Error, Result},
    handle::{hsize, Handle, PointId},
    math::Pos3Like,
};


/// Anything that can hand out point coordinates by id.
///
/// This is the only thing the topology structures and algorithms require
/// from a point set. Ids passed to [`point`][PointSource::point] must be
/// smaller than [`num_points`][PointSource::num_points]; implementations are
/// free to panic otherwise.
pub trait PointSource {
    /// Returns the number of points.
    fn num_points(&self) -> hsize;

    /// Returns the coordinates of the point `id`, converted to `f64`.
    fn point(&self, id: PointId) -> Point3<f64>;

    /// Computes the axis aligned bounding box of all points.
    fn bounds(&self) -> BoundingBox {
        BoundingBox::around((0..self.num_points()).map(|i| self.point(PointId::new(i))))
    }
}

impl<P: Pos3Like> PointSource for [P] {
    fn num_points(&self) -> hsize {
        self.len() as hsize
    }

    fn point(&self, id: PointId) -> Point3<f64> {
        self[id.to_usize()].to_point3_f64()
    }
}

impl<P: Pos3Like> PointSource for Vec<P> {
    fn num_points(&self) -> hsize {
        self.as_slice().num_points()
    }

    fn point(&self, id: PointId) -> Point3<f64> {
        self.as_slice().point(id)
    }
}


/// An append-only list of point coordinates. The id of a point is its index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Points {
    coords: Vec<Point3<f64>>,
}

impl Points {
    /// Creates an empty point list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty point list with space for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            coords: Vec::with_capacity(capacity),
        }
    }

    /// Copies all points of the given source.
    pub fn from_source<S: PointSource + ?Sized>(source: &S) -> Self {
        (0..source.num_points())
            .map(|i| source.point(PointId::new(i)))
            .collect()
    }

    /// Appends a point and returns its id.
    pub fn push(&mut self, p: Point3<f64>) -> PointId {
        let id = PointId::from_usize(self.coords.len());
        self.coords.push(p);
        id
    }

    /// Returns the coordinates of the point `id` or an error if there is no
    /// such point.
    pub fn get(&self, id: PointId) -> Result<Point3<f64>> {
        self.coords
            .get(id.to_usize())
            .copied()
            .ok_or_else(|| Error::out_of_range("point", id.idx(), self.coords.len()))
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn as_slice(&self) -> &[Point3<f64>] {
        &self.coords
    }

    /// Center of the bounding box of all points.
    pub fn center(&self) -> Point3<f64> {
        self.bounds().center()
    }

    /// Length of the bounding box diagonal of all points.
    pub fn length(&self) -> f64 {
        self.bounds().diagonal_length()
    }

    /// Releases unused capacity.
    pub fn squeeze(&mut self) {
        self.coords.shrink_to_fit();
    }
}

impl PointSource for Points {
    fn num_points(&self) -> hsize {
        self.coords.len() as hsize
    }

    fn point(&self, id: PointId) -> Point3<f64> {
        self.coords[id.to_usize()]
    }
}

impl Index<PointId> for Points {
    type Output = Point3<f64>;
    fn index(&self, id: PointId) -> &Self::Output {
        &self.coords[id.to_usize()]
    }
}

impl std::iter::FromIterator<Point3<f64>> for Points {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self {
            coords: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Point3<f64>>> for Points {
    fn from(coords: Vec<Point3<f64>>) -> Self {
        Self { coords }
    }
}
