use std::fmt;

use cgmath::{
    prelude::*,
    Point3,
};


/// An axis aligned bounding box.
#[derive(Clone, Copy, PartialEq)]
pub struct BoundingBox {
    x_range: [f64; 2],
    y_range: [f64; 2],
    z_range: [f64; 2],
}

impl BoundingBox {
    /// Creates an invalid bounding box: all lower bounds are ∞, all upper
    /// bounds are -∞. Once you added a single point, the bounding box will be
    /// valid.
    pub fn new() -> Self {
        Self {
            x_range: [f64::INFINITY, f64::NEG_INFINITY],
            y_range: [f64::INFINITY, f64::NEG_INFINITY],
            z_range: [f64::INFINITY, f64::NEG_INFINITY],
        }
    }

    /// Creates a bounding box around all points of the given iterator. If the
    /// iterator is empty, an invalid bounding box is returned (see
    /// [`BoundingBox::new`]).
    pub fn around<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        let mut out = Self::new();
        for pos in iter {
            out.add_point(pos);
        }
        out
    }

    /// Returns the `[lower, upper]` limits for the x coordinate.
    pub fn x(&self) -> [f64; 2] {
        self.x_range
    }

    /// Returns the `[lower, upper]` limits for the y coordinate.
    pub fn y(&self) -> [f64; 2] {
        self.y_range
    }

    /// Returns the `[lower, upper]` limits for the z coordinate.
    pub fn z(&self) -> [f64; 2] {
        self.z_range
    }

    /// Returns the center of this bounding box.
    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.x_range[1] + self.x_range[0]) / 2.0,
            (self.y_range[1] + self.y_range[0]) / 2.0,
            (self.z_range[1] + self.z_range[0]) / 2.0,
        )
    }

    /// Returns the length of the diagonal of this box. This is the
    /// characteristic length used to turn relative tolerances into absolute
    /// ones. Returns 0 for an invalid box.
    pub fn diagonal_length(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }

        let min = Point3::new(self.x_range[0], self.y_range[0], self.z_range[0]);
        let max = Point3::new(self.x_range[1], self.y_range[1], self.z_range[1]);
        min.distance(max)
    }

    /// Adds a point to the bounding box, enlarging it if the point lies
    /// outside of the box.
    pub fn add_point(&mut self, p: Point3<f64>) {
        fn min(state: &mut f64, new: f64) {
            if new < *state {
                *state = new;
            }
        }
        fn max(state: &mut f64, new: f64) {
            if new > *state {
                *state = new;
            }
        }

        min(&mut self.x_range[0], p.x);
        max(&mut self.x_range[1], p.x);
        min(&mut self.y_range[0], p.y);
        max(&mut self.y_range[1], p.y);
        min(&mut self.z_range[0], p.z);
        max(&mut self.z_range[1], p.z);
    }

    /// Returns `true` if all bounds are finite.
    pub fn is_valid(&self) -> bool {
        self.x_range[0].is_finite()
            && self.x_range[1].is_finite()
            && self.y_range[0].is_finite()
            && self.y_range[1].is_finite()
            && self.z_range[0].is_finite()
            && self.z_range[1].is_finite()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BoundingBox")
            .field("x", &(self.x_range[0]..self.x_range[1]))
            .field("y", &(self.y_range[0]..self.y_range[1]))
            .field("z", &(self.z_range[0]..self.z_range[1]))
            .finish()
    }
}
