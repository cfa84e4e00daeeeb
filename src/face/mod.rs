//! Planar polygon loops in 2D and 3D, and the projection that moves a loop
//! between its supporting plane and a flat working frame.
//!
//! A [`Face3D`] owns its vertices outright. Faces that live inside a
//! [`Model`](crate::graph::Model) are stored as [`Loop`](crate::graph::Loop)s
//! of shared vertex ids instead, and are gathered into a `Face3D` whenever the
//! geometry is needed.

mod face2d;
mod face3d;
pub mod fit;

pub use face2d::Face2D;
pub use face3d::Face3D;

use crate::errors::{ModelError, ModelResult};
use crate::float_types::{Real, tolerance};
use crate::graph::NodeId;
use nalgebra::{Point2, Point3, Vector3};

/// Below this, world +Y is treated as parallel to the plane normal.
const UPRIGHT_MIN_PROJECTION: Real = 1e-6;

/// Which loop of a node a projected face came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ring {
    Outer,
    Inner(usize),
}

/// Identity of a face stored in a model: the node plus the loop inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceRef {
    pub node: NodeId,
    pub ring: Ring,
}

/// Orthonormal frame of a face's supporting plane.
///
/// `u` and `v` span the plane and `n` is the unit Newell normal, with
/// `u × v = n`. A loop that winds counter-clockwise about `n` in 3D therefore
/// winds counter-clockwise in the projected `(u, v)` frame as well.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub u: Vector3<Real>,
    pub v: Vector3<Real>,
    pub n: Vector3<Real>,
}

impl Basis {
    /// Build the frame of the plane through `points`.
    ///
    /// `u` follows the first edge out of `points[0]` that is not collapsed
    /// (with any out-of-plane component removed), `v = n × u`.
    pub fn from_points(points: &[Point3<Real>]) -> ModelResult<Basis> {
        let n = newell_normal(points)?;
        let origin = points[0];
        let u = points[1..]
            .iter()
            .map(|p| {
                let d = p - origin;
                d - n * d.dot(&n)
            })
            .find(|d| d.norm() > tolerance())
            .ok_or_else(|| ModelError::invalid("all vertices coincide with the first vertex"))?
            .normalize();
        let v = n.cross(&u);
        Ok(Basis { u, v, n })
    }

    /// Frame for placing unit-frame shapes (holes, generated UVs) on a plane
    /// with unit normal `n`.
    ///
    /// `v` is world +Y with its component along `n` removed, so shapes stand
    /// upright on walls. Planes facing straight up or down use world +Z
    /// instead. `u = v × n`, which keeps `(u, v, n)` right-handed: reversing
    /// the normal mirrors `u` and leaves `v` alone. The vertex order of the
    /// plane's loop plays no part.
    pub fn upright(n: Vector3<Real>) -> Basis {
        let drop_normal = |axis: Vector3<Real>| axis - n * n.dot(&axis);
        let mut v = drop_normal(Vector3::y());
        if v.norm() < UPRIGHT_MIN_PROJECTION {
            v = drop_normal(Vector3::z());
        }
        let v = v.normalize();
        let u = v.cross(&n);
        Basis { u, v, n }
    }

    /// Coordinates of `p` in this frame, relative to `origin`.
    #[inline]
    pub fn project(&self, origin: &Point3<Real>, p: &Point3<Real>) -> Point2<Real> {
        let d = p - origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }

    /// Inverse of [`Basis::project`].
    #[inline]
    pub fn lift(&self, origin: &Point3<Real>, p: &Point2<Real>) -> Point3<Real> {
        origin + self.u * p.x + self.v * p.y
    }
}

/// Everything needed to put a flattened face back where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionDetails {
    pub basis: Basis,
    /// 3D position that maps to the 2D origin (the source face's first vertex).
    pub origin: Point3<Real>,
    /// The model face that was projected, when the face lives in a model.
    pub source: Option<FaceRef>,
}

impl ProjectionDetails {
    #[inline]
    pub fn project(&self, p: &Point3<Real>) -> Point2<Real> {
        self.basis.project(&self.origin, p)
    }

    #[inline]
    pub fn lift(&self, p: &Point2<Real>) -> Point3<Real> {
        self.basis.lift(&self.origin, p)
    }
}

/// Unit normal of a closed loop by Newell's method.
///
/// Robust for any simple polygon, including mildly non-planar ones. Loops with
/// fewer than three points or with (near) zero area are rejected.
pub fn newell_normal(points: &[Point3<Real>]) -> ModelResult<Vector3<Real>> {
    if points.len() < 3 {
        return Err(ModelError::invalid(format!(
            "a face needs at least 3 vertices, got {}",
            points.len()
        )));
    }

    let mut normal = Vector3::<Real>::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    let len = normal.norm();
    if !len.is_finite() || len < tolerance() {
        return Err(ModelError::invalid("face has zero area, its normal is undefined"));
    }
    Ok(normal / len)
}

/// Twice the signed area of a 2D loop; positive when counter-clockwise.
pub(crate) fn signed_area2(points: &[Point2<Real>]) -> Real {
    let mut sum = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum
}
