//! Abstractions over numerical types and position-like types, plus the few
//! geometric predicates the topology algorithms need.
//!
//! All predicates work in `f64`, regardless of how the input points are
//! stored.

use std::fmt::Debug;

use cgmath::{
    prelude::*,
    Point3, Vector2, Vector3,
};
use num_traits::{Float, Num, NumAssign, NumCast};


/// Primitive numerical types, like `f64` and `u32`.
///
/// This trait is automatically implemented for all types that satisfy the
/// super-trait constraints.
pub trait PrimitiveNum: 'static + Copy + Debug + Num + PartialOrd + NumAssign + NumCast {}

impl<T> PrimitiveNum for T
where
    T: 'static + Copy + Debug + Num + PartialOrd + NumAssign + NumCast,
{}

/// Primitive floating point types: `f32` and `f64`.
pub trait PrimitiveFloat: PrimitiveNum + Float {
    /// Converts the value into `f64`. This is lossless for `f32` and `f64`.
    fn to_f64_lossless(self) -> f64;
}

impl PrimitiveFloat for f32 {
    fn to_f64_lossless(self) -> f64 {
        self.into()
    }
}

impl PrimitiveFloat for f64 {
    fn to_f64_lossless(self) -> f64 {
        self
    }
}


/// Types that can be interpreted to represent some kind of 3D position.
///
/// This type is implemented for strongly typed "position"-types, like
/// `cgmath::Point3`, as well as for generic "weaker" types such as tuples
/// `(T, T, T)` and arrays `[T; 3]`. However, to avoid logic errors, you should
/// try to use strong types to represent points in 3D space instead of simple
/// tuples.
pub trait Pos3Like: Copy {
    /// The type of each component.
    type Scalar: PrimitiveFloat;

    /// Creates the position type from the given three scalar values.
    fn from_coords(x: Self::Scalar, y: Self::Scalar, z: Self::Scalar) -> Self;

    /// Returns the `x` component of this position.
    fn x(&self) -> Self::Scalar;

    /// Returns the `y` component of this position.
    fn y(&self) -> Self::Scalar;

    /// Returns the `z` component of this position.
    fn z(&self) -> Self::Scalar;

    /// Converts this position into a `Point3<f64>`, the representation all
    /// computations in this crate use.
    fn to_point3_f64(self) -> Point3<f64> {
        Point3::new(
            self.x().to_f64_lossless(),
            self.y().to_f64_lossless(),
            self.z().to_f64_lossless(),
        )
    }
}

impl<T: PrimitiveFloat> Pos3Like for Point3<T> {
    type Scalar = T;
    fn from_coords(x: Self::Scalar, y: Self::Scalar, z: Self::Scalar) -> Self {
        Self::new(x, y, z)
    }
    fn x(&self) -> Self::Scalar { self.x }
    fn y(&self) -> Self::Scalar { self.y }
    fn z(&self) -> Self::Scalar { self.z }
}

impl<T: PrimitiveFloat> Pos3Like for (T, T, T) {
    type Scalar = T;
    fn from_coords(x: Self::Scalar, y: Self::Scalar, z: Self::Scalar) -> Self {
        (x, y, z)
    }
    fn x(&self) -> Self::Scalar { self.0 }
    fn y(&self) -> Self::Scalar { self.1 }
    fn z(&self) -> Self::Scalar { self.2 }
}

impl<T: PrimitiveFloat> Pos3Like for [T; 3] {
    type Scalar = T;
    fn from_coords(x: Self::Scalar, y: Self::Scalar, z: Self::Scalar) -> Self {
        [x, y, z]
    }
    fn x(&self) -> Self::Scalar { self[0] }
    fn y(&self) -> Self::Scalar { self[1] }
    fn z(&self) -> Self::Scalar { self[2] }
}


// ===========================================================================
// ===== 2D predicates (z is ignored)
// ===========================================================================

/// Normalizes `v` in place and returns its original length. A zero vector
/// stays untouched.
pub fn normalize_2d(v: &mut Vector2<f64>) -> f64 {
    let len = v.magnitude();
    if len != 0.0 {
        *v /= len;
    }
    len
}

/// Computes the circumcircle of the triangle `(a, b, c)` in the xy-plane.
///
/// Returns the center and the *squared* radius. For a degenerate (collinear)
/// triangle, the center is the origin and the squared radius is `f64::MAX`,
/// so that every point is considered to lie inside of it.
pub fn circumcircle(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> (Vector2<f64>, f64) {
    // The center lies on both perpendicular bisectors of ab and ac.
    let n12 = Vector2::new(b.x - a.x, b.y - a.y);
    let n13 = Vector2::new(c.x - a.x, c.y - a.y);
    let m12 = Vector2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let m13 = Vector2::new((a.x + c.x) / 2.0, (a.y + c.y) / 2.0);
    let rhs = Vector2::new(n12.dot(m12), n13.dot(m13));

    // Cramer's rule for the 2x2 system [n12; n13] * center = rhs
    let det = n12.x * n13.y - n12.y * n13.x;
    if det.abs() <= f64::EPSILON * (n12.magnitude2() * n13.magnitude2()).sqrt() {
        return (Vector2::zero(), f64::MAX);
    }

    let center = Vector2::new(
        (rhs.x * n13.y - n12.y * rhs.y) / det,
        (n12.x * rhs.y - rhs.x * n13.x) / det,
    );

    // Average the squared distances to smooth out rounding errors.
    let sum: f64 = [a, b, c].iter()
        .map(|p| (Vector2::new(p.x, p.y) - center).magnitude2())
        .sum();

    (center, sum / 3.0)
}

/// Returns `true` if `x` lies strictly inside the circumcircle of the
/// triangle `(a, b, c)`. Only the xy-components are considered.
///
/// The test is not exact: points closer than a relative `1e-5` to the circle
/// are considered to be outside.
pub fn in_circumcircle(x: Point3<f64>, a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> bool {
    let (center, radius2) = circumcircle(a, b, c);
    let dist2 = (Vector2::new(x.x, x.y) - center).magnitude2();

    dist2 < 0.99999 * radius2
}

/// Computes the unit normal of the polygon with the given corners using
/// Newell's method. Returns the zero vector for degenerate polygons.
pub fn polygon_normal<I>(corners: I) -> Vector3<f64>
where
    I: IntoIterator<Item = Point3<f64>>,
    I::IntoIter: Clone,
{
    let corners = corners.into_iter();
    let mut next = corners.clone().cycle().skip(1);

    let mut n = Vector3::zero();
    for p in corners {
        let q = match next.next() {
            Some(q) => q,
            None => break,
        };

        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }

    let len = n.magnitude();
    if len == 0.0 {
        n
    } else {
        n / len
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn circumcircle_right_triangle() {
        let (center, r2) = circumcircle(p(0.0, 0.0), p(2.0, 0.0), p(0.0, 2.0));
        assert!((center.x - 1.0).abs() < 1e-12);
        assert!((center.y - 1.0).abs() < 1e-12);
        assert!((r2 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn circumcircle_degenerate() {
        let (_, r2) = circumcircle(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0));
        assert_eq!(r2, f64::MAX);
    }

    #[test]
    fn in_circle() {
        let (a, b, c) = (p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0));
        assert!(in_circumcircle(p(0.5, 0.5), a, b, c));
        assert!(in_circumcircle(p(0.9, 0.9), a, b, c));
        assert!(!in_circumcircle(p(1.1, 1.1), a, b, c));

        // Exactly on the circle: not inside.
        assert!(!in_circumcircle(p(1.0, 1.0), a, b, c));
    }

    #[test]
    fn normalize() {
        let mut v = Vector2::new(3.0, 4.0);
        assert_eq!(normalize_2d(&mut v), 5.0);
        assert!((v.magnitude() - 1.0).abs() < 1e-12);

        let mut zero = Vector2::new(0.0, 0.0);
        assert_eq!(normalize_2d(&mut zero), 0.0);
        assert_eq!(zero, Vector2::new(0.0, 0.0));
    }

    #[test]
    fn newell_normal() {
        let n = polygon_normal(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]);
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).magnitude() < 1e-12);

        let n = polygon_normal(vec![p(0.0, 0.0), p(0.0, 1.0), p(1.0, 0.0)]);
        assert!((n - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-12);
    }

    #[test]
    fn pos3_like_conversion() {
        assert_eq!([1.0f32, 2.0, 3.0].to_point3_f64(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!((1.5f64, 2.0, 3.0).to_point3_f64(), Point3::new(1.5, 2.0, 3.0));
    }
}
