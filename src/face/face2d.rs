use crate::errors::{ModelError, ModelResult};
use crate::float_types::Real;
use crate::vertex::{Axis, Vertex2D};
use nalgebra::{Point2, Vector2};

use super::fit::{Fitter, ProjectiveFitter};
use super::{Face3D, ProjectionDetails, signed_area2};

/// An implicitly closed loop of 2D points.
///
/// A `Face2D` is either authored directly (footprints, hole shapes in the unit
/// frame) or produced by flattening a [`Face3D`], in which case `projection`
/// records how to put it back.
#[derive(Debug, Clone, PartialEq)]
pub struct Face2D {
    pub vertices: Vec<Vertex2D>,
    pub projection: Option<ProjectionDetails>,
    /// The unit-frame shape this face had before it was fit into an outer loop.
    pub perc_shape: Option<Box<Face2D>>,
}

impl Face2D {
    /// Build a face from its vertices; fewer than three is an error.
    pub fn new(vertices: Vec<Vertex2D>) -> ModelResult<Self> {
        if vertices.len() < 3 {
            return Err(ModelError::invalid(format!(
                "a face needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self::from_vertices_unchecked(vertices))
    }

    /// Build a face from `[x, y]` pairs.
    pub fn from_points(points: &[[Real; 2]]) -> ModelResult<Self> {
        Self::new(points.iter().map(|&[x, y]| Vertex2D::new(x, y)).collect())
    }

    pub(crate) const fn from_vertices_unchecked(vertices: Vec<Vertex2D>) -> Self {
        Face2D {
            vertices,
            projection: None,
            perc_shape: None,
        }
    }

    pub fn points(&self) -> Vec<Point2<Real>> {
        self.vertices.iter().map(|v| v.pos).collect()
    }

    /// Interleaved `x, y` coordinates.
    pub fn flatten(&self) -> Vec<Real> {
        self.vertices.iter().flat_map(|v| [v.pos.x, v.pos.y]).collect()
    }

    pub fn centroid(&self) -> Point2<Real> {
        let sum = self
            .vertices
            .iter()
            .fold(Vector2::zeros(), |acc, v| acc + v.pos.coords);
        Point2::from(sum / self.vertices.len() as Real)
    }

    /// Signed area; positive for counter-clockwise loops.
    pub fn signed_area(&self) -> Real {
        signed_area2(&self.points()) * 0.5
    }

    pub fn translate(&mut self, x: Real, y: Real) {
        for v in &mut self.vertices {
            v.translate(x, y);
        }
    }

    /// Scale about the centroid.
    pub fn scale(&mut self, x: Real, y: Real) {
        self.about_centroid(|f| f.scale_fixed(x, y));
    }

    /// Scale about the origin.
    pub fn scale_fixed(&mut self, x: Real, y: Real) {
        for v in &mut self.vertices {
            v.scale(x, y);
        }
    }

    pub fn rotate(&mut self, deg: Real) {
        self.about_centroid(|f| f.rotate_fixed(deg));
    }

    pub fn rotate_fixed(&mut self, deg: Real) {
        for v in &mut self.vertices {
            v.rotate(deg);
        }
    }

    pub fn mul(&mut self, magnitude: Real) {
        self.about_centroid(|f| f.mul_fixed(magnitude));
    }

    pub fn mul_fixed(&mut self, magnitude: Real) {
        for v in &mut self.vertices {
            v.mul(magnitude);
        }
    }

    fn about_centroid(&mut self, op: impl FnOnce(&mut Self)) {
        let cen = self.centroid();
        self.about_point(cen, op);
    }

    /// Run `op` with `pivot` moved to the origin.
    pub fn about_point(&mut self, pivot: Point2<Real>, op: impl FnOnce(&mut Self)) {
        self.translate(-pivot.x, -pivot.y);
        op(self);
        self.translate(pivot.x, pivot.y);
    }

    /// Mirror a unit-frame shape left to right (`x` becomes `1 - x`).
    pub fn mirror_unit_x(&mut self) {
        for v in &mut self.vertices {
            v.pos.x = 1.0 - v.pos.x;
        }
    }

    /// Reverse the winding. Applying it twice restores the original order.
    pub fn flip(&mut self) {
        self.vertices.reverse();
    }

    /// Exact positional membership test.
    pub fn contains_exact(&self, v: &Vertex2D) -> bool {
        self.vertices.iter().any(|w| w.pos == v.pos)
    }

    /// Bounding box as `(min, max)`.
    pub fn min_max(&self) -> (Point2<Real>, Point2<Real>) {
        let mut min = Point2::new(Real::MAX, Real::MAX);
        let mut max = Point2::new(-Real::MAX, -Real::MAX);
        for v in &self.vertices {
            min.x = min.x.min(v.pos.x);
            min.y = min.y.min(v.pos.y);
            max.x = max.x.max(v.pos.x);
            max.y = max.y.max(v.pos.y);
        }
        (min, max)
    }

    pub fn width(&self) -> Real {
        let (min, max) = self.min_max();
        max.x - min.x
    }

    pub fn height(&self) -> Real {
        let (min, max) = self.min_max();
        max.y - min.y
    }

    /// Warp this unit-frame shape into `outer`'s frame with the default fitter.
    pub fn fit_2d(&mut self, outer: &Face2D) -> ModelResult<()> {
        self.fit_2d_with(outer, &ProjectiveFitter)
    }

    /// Warp this unit-frame shape into `outer`'s frame.
    ///
    /// The shape is authored top-down, so `y` is inverted before the warp. The
    /// pre-fit shape is kept as `perc_shape` for later re-fitting. On error the
    /// face is left untouched.
    pub fn fit_2d_with(&mut self, outer: &Face2D, fitter: &dyn Fitter) -> ModelResult<()> {
        let source: Vec<Point2<Real>> = self
            .vertices
            .iter()
            .map(|v| Point2::new(v.pos.x, 1.0 - v.pos.y))
            .collect();
        let warped = fitter.fit(&source, &outer.points())?;
        if warped.len() != self.vertices.len() {
            return Err(ModelError::fit(format!(
                "fitter returned {} points for {} inputs",
                warped.len(),
                self.vertices.len()
            )));
        }

        let mut saved = self.clone();
        saved.perc_shape = None;
        saved.projection = None;
        self.perc_shape = Some(Box::new(saved));
        for (v, p) in self.vertices.iter_mut().zip(warped) {
            v.pos = p;
        }
        Ok(())
    }

    /// Fit into a 3D outer face: flatten it, warp, and adopt its projection so
    /// the result can be lifted onto the outer's plane.
    ///
    /// The outer is flattened upright (see [`Face3D::to_2d_upright`]), so the
    /// unit frame's top edge lands at the top of a wall whatever the outer
    /// loop's starting vertex.
    pub fn fit_3d(&mut self, outer: &Face3D) -> ModelResult<()> {
        let outer_2d = outer.to_2d_upright()?;
        self.fit_2d(&outer_2d)?;
        self.projection = outer_2d.projection;
        Ok(())
    }

    /// Place the face on a world plane through the origin.
    pub fn to_3d_fixed(&self, axis: Axis) -> Face3D {
        Face3D {
            vertices: self.vertices.iter().map(|v| v.to_3d(axis)).collect(),
            perc_shape: self.perc_shape.as_deref().cloned(),
        }
    }

    /// Lift into a freshly allocated face using the recorded projection.
    pub fn to_3d_projected(&self) -> ModelResult<Face3D> {
        let pd = self
            .projection
            .as_ref()
            .ok_or(ModelError::MissingProjectionContext)?;
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let mut out = crate::vertex::Vertex3D::from(pd.lift(&v.pos));
                out.uv = v.uv;
                out.label = v.label.clone();
                out
            })
            .collect();
        Ok(Face3D {
            vertices,
            perc_shape: self.perc_shape.as_deref().cloned(),
        })
    }

    /// Lift onto an existing face, overwriting positions only.
    ///
    /// `target` must have the same vertex count as this face; UVs and labels
    /// on `target` are kept.
    pub fn to_3d_onto(&self, target: &mut Face3D) -> ModelResult<()> {
        let pd = self
            .projection
            .as_ref()
            .ok_or(ModelError::MissingProjectionContext)?;
        if target.vertices.len() != self.vertices.len() {
            return Err(ModelError::invalid(format!(
                "cannot lift {} points onto a face with {} vertices",
                self.vertices.len(),
                target.vertices.len()
            )));
        }
        for (dst, src) in target.vertices.iter_mut().zip(&self.vertices) {
            dst.pos = pd.lift(&src.pos);
        }
        if let Some(perc) = &self.perc_shape {
            target.perc_shape = Some(perc.as_ref().clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn construction_rejects_short_loops() {
        assert!(Face2D::from_points(&[[0.0, 0.0], [1.0, 0.0]]).is_err());
        assert!(Face2D::from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).is_ok());
    }

    #[test]
    fn scale_keeps_centroid() {
        let mut f = Face2D::square(2.0, 2.0);
        let before = f.centroid();
        f.scale(3.0, 0.5);
        assert_relative_eq!(f.centroid(), before, epsilon = 1e-12);
        assert_relative_eq!(f.width(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(f.height(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn flip_is_an_involution() {
        let mut f = Face2D::circle(1.0, 1.0, 7).unwrap();
        let original = f.clone();
        f.flip();
        assert_ne!(f, original);
        f.flip();
        assert_eq!(f, original);
    }

    #[test]
    fn fit_saves_prefit_shape_and_inverts_y() {
        let outer = Face2D::from_points(&[[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 2.0]]).unwrap();
        let mut hole = Face2D::from_points(&[[0.25, 0.25], [0.75, 0.25], [0.75, 0.5], [0.25, 0.5]]).unwrap();
        let authored = hole.clone();
        hole.fit_2d(&outer).unwrap();

        assert_eq!(hole.perc_shape.as_deref(), Some(&authored));
        // y = 0.25 authored top-down lands at 0.75 of the outer's height
        assert_relative_eq!(hole.vertices[0].pos, Point2::new(1.0, 1.5), epsilon = 1e-9);
        assert_relative_eq!(hole.vertices[2].pos, Point2::new(3.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn lifting_without_projection_is_an_error() {
        let f = Face2D::square(1.0, 1.0);
        assert!(matches!(
            f.to_3d_projected(),
            Err(ModelError::MissingProjectionContext)
        ));
    }
}
