//! Struct and functions for working with `Vertex2D`s and `Vertex3D`s from which faces are composed.
//!
//! Every transform mutates in place and returns nothing, so calls compose by
//! repetition. Equality is exact on position and UV; the optional label is a
//! bookkeeping tag and does not take part in comparisons.

use crate::float_types::Real;
use nalgebra::{Point2, Point3, Rotation3, Unit, Vector2, Vector3};

/// One of the three world axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector along this axis.
    pub fn unit(self) -> Unit<Vector3<Real>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// A point in a face's 2D frame, with optional texture coordinates and label.
#[derive(Debug, Clone)]
pub struct Vertex2D {
    pub pos: Point2<Real>,
    pub uv: Option<Point2<Real>>,
    pub label: Option<String>,
}

impl PartialEq for Vertex2D {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.uv == other.uv
    }
}

impl Vertex2D {
    pub const fn new(x: Real, y: Real) -> Self {
        Vertex2D {
            pos: Point2::new(x, y),
            uv: None,
            label: None,
        }
    }

    pub fn with_uv(mut self, u: Real, v: Real) -> Self {
        self.uv = Some(Point2::new(u, v));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn x(&self) -> Real {
        self.pos.x
    }

    pub fn y(&self) -> Real {
        self.pos.y
    }

    pub fn translate(&mut self, x: Real, y: Real) {
        self.pos += Vector2::new(x, y);
    }

    pub fn scale(&mut self, x: Real, y: Real) {
        self.pos.x *= x;
        self.pos.y *= y;
    }

    pub fn mul(&mut self, magnitude: Real) {
        self.pos.coords *= magnitude;
    }

    /// Rotate counter-clockwise about the origin by `deg` degrees.
    pub fn rotate(&mut self, deg: Real) {
        let (sin, cos) = deg.to_radians().sin_cos();
        let Point2 { coords } = self.pos;
        self.pos = Point2::new(coords.x * cos - coords.y * sin, coords.x * sin + coords.y * cos);
    }

    pub fn move_to(&mut self, x: Real, y: Real) {
        self.pos = Point2::new(x, y);
    }

    pub fn distance(&self, other: &Vertex2D) -> Real {
        nalgebra::distance(&self.pos, &other.pos)
    }

    /// Place this point on a world plane through the origin.
    ///
    /// * `Axis::X` → `(x, 0, y)` (ground plane, the default footprint frame)
    /// * `Axis::Y` → `(0, y, x)`
    /// * `Axis::Z` → `(x, y, 0)`
    pub fn to_3d(&self, axis: Axis) -> Vertex3D {
        let Point2 { coords } = self.pos;
        let pos = match axis {
            Axis::X => Point3::new(coords.x, 0.0, coords.y),
            Axis::Y => Point3::new(0.0, coords.y, coords.x),
            Axis::Z => Point3::new(coords.x, coords.y, 0.0),
        };
        Vertex3D {
            pos,
            uv: self.uv,
            label: self.label.clone(),
        }
    }
}

/// A point in model space with optional texture coordinates and label.
#[derive(Debug, Clone)]
pub struct Vertex3D {
    pub pos: Point3<Real>,
    pub uv: Option<Point2<Real>>,
    pub label: Option<String>,
}

impl PartialEq for Vertex3D {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.uv == other.uv
    }
}

impl Default for Vertex3D {
    fn default() -> Self {
        Vertex3D::new(0.0, 0.0, 0.0)
    }
}

impl From<Point3<Real>> for Vertex3D {
    fn from(pos: Point3<Real>) -> Self {
        Vertex3D {
            pos,
            uv: None,
            label: None,
        }
    }
}

impl Vertex3D {
    pub const fn new(x: Real, y: Real, z: Real) -> Self {
        Vertex3D {
            pos: Point3::new(x, y, z),
            uv: None,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Assign texture coordinates.
    pub fn set_uv(&mut self, u: Real, v: Real) {
        self.uv = Some(Point2::new(u, v));
    }

    /// Position-only comparison, ignoring UV.
    pub fn same_position(&self, other: &Vertex3D) -> bool {
        self.pos == other.pos
    }

    pub fn translate(&mut self, x: Real, y: Real, z: Real) {
        self.pos += Vector3::new(x, y, z);
    }

    pub fn translate_vector(&mut self, offset: &Vector3<Real>) {
        self.pos += offset;
    }

    pub fn subtract(&mut self, other: &Vertex3D) {
        self.pos -= other.pos.coords;
    }

    pub fn scale(&mut self, x: Real, y: Real, z: Real) {
        self.pos.coords.component_mul_assign(&Vector3::new(x, y, z));
    }

    pub fn mul(&mut self, magnitude: Real) {
        self.pos.coords *= magnitude;
    }

    /// Negate the coordinate along `axis`.
    pub fn mirror(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.pos.x = -self.pos.x,
            Axis::Y => self.pos.y = -self.pos.y,
            Axis::Z => self.pos.z = -self.pos.z,
        }
    }

    /// Rotate about a world axis through the origin by `deg` degrees (right-handed).
    pub fn rotate(&mut self, deg: Real, axis: Axis) {
        let rot = Rotation3::from_axis_angle(&axis.unit(), deg.to_radians());
        self.pos = rot * self.pos;
    }

    /// Rotate about an arbitrary direction through the origin (Rodrigues).
    pub fn rotate_around_axis(&mut self, deg: Real, axis: &Vector3<Real>) {
        let rot = Rotation3::from_axis_angle(&Unit::new_normalize(*axis), deg.to_radians());
        self.pos = rot * self.pos;
    }

    pub fn move_to(&mut self, x: Real, y: Real, z: Real) {
        self.pos = Point3::new(x, y, z);
    }

    /// Snap every coordinate to `precision` decimal places.
    pub fn round(&mut self, precision: i32) {
        let multiplier = (10.0 as Real).powi(precision);
        self.pos.coords.apply(|c| *c = (*c * multiplier).round() / multiplier);
    }

    pub fn distance(&self, other: &Vertex3D) -> Real {
        nalgebra::distance(&self.pos, &other.pos)
    }

    pub fn dot(&self, other: &Vertex3D) -> Real {
        self.pos.coords.dot(&other.pos.coords)
    }

    pub fn cross(&self, other: &Vertex3D) -> Vector3<Real> {
        self.pos.coords.cross(&other.pos.coords)
    }

    /// The position vector scaled to unit length.
    pub fn normalize(&self) -> Vector3<Real> {
        self.pos.coords.normalize()
    }

    /// Heading from `self` to `other` in the XY plane, in degrees.
    pub fn angle(&self, other: &Vertex3D) -> Real {
        (other.pos.y - self.pos.y)
            .atan2(other.pos.x - self.pos.x)
            .to_degrees()
    }

    /// Angle in degrees between the two position vectors, plus the principal
    /// axis closest to their common perpendicular.
    pub fn rotation_to(&self, other: &Vertex3D) -> (Real, Axis) {
        let a = self.pos.coords;
        let b = other.pos.coords;
        let cos = (a.dot(&b) / (a.norm() * b.norm())).clamp(-1.0, 1.0);
        let angle = cos.acos().to_degrees();

        let cross = a.cross(&b);
        let axis = if cross.x.abs() > cross.y.abs() && cross.x.abs() > cross.z.abs() {
            Axis::X
        } else if cross.y.abs() > cross.z.abs() {
            Axis::Y
        } else {
            Axis::Z
        };
        (angle, axis)
    }
}

/// Exact hashable key of a position; `-0.0` and `0.0` collapse to one key.
pub(crate) fn position_key(p: &Point3<Real>) -> [u64; 3] {
    [p.x, p.y, p.z].map(|c| (c + 0.0).to_bits())
}

/// Exact hashable key of everything [`Vertex3D`]'s equality compares.
pub(crate) fn value_key(v: &Vertex3D) -> ([u64; 3], Option<[u64; 2]>) {
    (
        position_key(&v.pos),
        v.uv.map(|uv| [uv.x, uv.y].map(|c| (c + 0.0).to_bits())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotate_about_principal_axes() {
        let mut v = Vertex3D::new(1.0, 0.0, 0.0);
        v.rotate(90.0, Axis::Z);
        assert_relative_eq!(v.pos, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);

        let mut v = Vertex3D::new(0.0, 1.0, 0.0);
        v.rotate(90.0, Axis::X);
        assert_relative_eq!(v.pos, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);

        let mut v = Vertex3D::new(0.0, 0.0, 1.0);
        v.rotate(90.0, Axis::Y);
        assert_relative_eq!(v.pos, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn rotate_2d_uses_original_coordinates() {
        let mut v = Vertex2D::new(1.0, 1.0);
        v.rotate(90.0);
        assert_relative_eq!(v.pos, Point2::new(-1.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn equality_includes_uv_but_not_label() {
        let a = Vertex3D::new(1.0, 2.0, 3.0).with_label("a");
        let b = Vertex3D::new(1.0, 2.0, 3.0).with_label("b");
        assert_eq!(a, b);

        let mut c = b.clone();
        c.set_uv(0.5, 0.5);
        assert_ne!(a, c);
        assert!(a.same_position(&c));
    }

    #[test]
    fn round_collapses_near_duplicates() {
        let mut a = Vertex3D::new(0.1 + 0.2, 1.0, -2.0);
        let mut b = Vertex3D::new(0.3, 1.0, -2.0);
        assert_ne!(a, b);
        a.round(6);
        b.round(6);
        assert_eq!(a, b);
    }

    #[test]
    fn to_3d_per_axis() {
        let v = Vertex2D::new(2.0, 3.0);
        assert_eq!(v.to_3d(Axis::X).pos, Point3::new(2.0, 0.0, 3.0));
        assert_eq!(v.to_3d(Axis::Y).pos, Point3::new(0.0, 3.0, 2.0));
        assert_eq!(v.to_3d(Axis::Z).pos, Point3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn rotation_to_reports_angle_and_axis() {
        let a = Vertex3D::new(1.0, 0.0, 0.0);
        let b = Vertex3D::new(0.0, 1.0, 0.0);
        let (angle, axis) = a.rotation_to(&b);
        assert_relative_eq!(angle, 90.0, epsilon = 1e-9);
        assert_eq!(axis, Axis::Z);
    }
}
