use crate::errors::{ModelError, ModelResult};
use crate::float_types::Real;
use crate::vertex::{Axis, Vertex2D, Vertex3D};
use nalgebra::{Point3, Vector3};

use super::{Basis, Face2D, ProjectionDetails, newell_normal};

/// An ordered loop of 3D vertices describing one planar polygon.
///
/// Planarity is the caller's responsibility. The winding is the only thing that
/// says which side is the front: the normal follows the right-hand rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Face3D {
    pub vertices: Vec<Vertex3D>,
    /// Unit-frame shape of this loop when it was fit into an outer loop as a hole.
    pub perc_shape: Option<Face2D>,
}

impl Face3D {
    pub fn new(vertices: Vec<Vertex3D>) -> ModelResult<Self> {
        if vertices.len() < 3 {
            return Err(ModelError::invalid(format!(
                "a face needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Face3D {
            vertices,
            perc_shape: None,
        })
    }

    /// Build a face from `[x, y, z]` triples.
    pub fn from_points(points: &[[Real; 3]]) -> ModelResult<Self> {
        Self::new(
            points
                .iter()
                .map(|&[x, y, z]| Vertex3D::new(x, y, z))
                .collect(),
        )
    }

    pub fn positions(&self) -> Vec<Point3<Real>> {
        self.vertices.iter().map(|v| v.pos).collect()
    }

    /// Interleaved `x, y, z` coordinates.
    pub fn flatten(&self) -> Vec<Real> {
        self.vertices
            .iter()
            .flat_map(|v| [v.pos.x, v.pos.y, v.pos.z])
            .collect()
    }

    /// Unit normal by Newell's method.
    ///
    /// # Errors
    /// [`ModelError::InvalidGeometry`] for fewer than three vertices or zero area.
    pub fn normal(&self) -> ModelResult<Vector3<Real>> {
        newell_normal(&self.positions())
    }

    /// Arithmetic mean of the vertices.
    pub fn centroid(&self) -> Point3<Real> {
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.pos.coords);
        Point3::from(sum / self.vertices.len() as Real)
    }

    pub fn translate(&mut self, x: Real, y: Real, z: Real) {
        for v in &mut self.vertices {
            v.translate(x, y, z);
        }
    }

    /// Translate so this face's centroid lands on `other`'s.
    pub fn align(&mut self, other: &Face3D) {
        let d = other.centroid() - self.centroid();
        self.translate(d.x, d.y, d.z);
    }

    /// Translate so the vertex nearest `point` lands on it.
    pub fn snap(&mut self, point: &Point3<Real>) {
        let closest = self
            .vertices
            .iter()
            .map(|v| v.pos)
            .min_by(|a, b| nalgebra::distance(a, point).total_cmp(&nalgebra::distance(b, point)));
        if let Some(closest) = closest {
            let d = point - closest;
            self.translate(d.x, d.y, d.z);
        }
    }

    /// Translate so the centroid lands on `(x, y, z)`.
    pub fn move_to(&mut self, x: Real, y: Real, z: Real) {
        let cen = self.centroid();
        self.translate(x - cen.x, y - cen.y, z - cen.z);
    }

    pub fn scale(&mut self, x: Real, y: Real, z: Real) {
        self.about_centroid(|f| f.scale_fixed(x, y, z));
    }

    pub fn scale_fixed(&mut self, x: Real, y: Real, z: Real) {
        for v in &mut self.vertices {
            v.scale(x, y, z);
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

    pub fn rotate(&mut self, deg: Real, axis: Axis) {
        self.about_centroid(|f| f.rotate_fixed(deg, axis));
    }

    pub fn rotate_fixed(&mut self, deg: Real, axis: Axis) {
        for v in &mut self.vertices {
            v.rotate(deg, axis);
        }
    }

    pub fn mirror(&mut self, axis: Axis) {
        for v in &mut self.vertices {
            v.mirror(axis);
        }
    }

    pub fn round_vertices(&mut self, precision: i32) {
        for v in &mut self.vertices {
            v.round(precision);
        }
    }

    fn about_centroid(&mut self, op: impl FnOnce(&mut Self)) {
        let cen = self.centroid();
        self.translate(-cen.x, -cen.y, -cen.z);
        op(self);
        self.translate(cen.x, cen.y, cen.z);
    }

    /// Apply a planar edit in the face's own 2D frame and write the result back.
    fn edit_2d(&mut self, op: impl FnOnce(&mut Face2D)) -> ModelResult<()> {
        let mut flat = self.to_2d()?;
        op(&mut flat);
        flat.to_3d_onto(self)
    }

    pub fn translate_2d(&mut self, x: Real, y: Real) -> ModelResult<()> {
        self.edit_2d(|f| f.translate(x, y))
    }

    pub fn scale_2d(&mut self, x: Real, y: Real) -> ModelResult<()> {
        self.edit_2d(|f| f.scale(x, y))
    }

    pub fn mul_2d(&mut self, magnitude: Real) -> ModelResult<()> {
        self.edit_2d(|f| f.mul(magnitude))
    }

    pub fn rotate_2d(&mut self, deg: Real) -> ModelResult<()> {
        self.edit_2d(|f| f.rotate(deg))
    }

    /// `(min, max)` of the coordinate along `axis`.
    pub fn min_max(&self, axis: Axis) -> (Real, Real) {
        self.vertices
            .iter()
            .map(|v| match axis {
                Axis::X => v.pos.x,
                Axis::Y => v.pos.y,
                Axis::Z => v.pos.z,
            })
            .fold((Real::MAX, -Real::MAX), |(lo, hi), c| (lo.min(c), hi.max(c)))
    }

    /// Extent along X.
    pub fn width(&self) -> Real {
        let (min, max) = self.min_max(Axis::X);
        max - min
    }

    /// Extent along Y.
    pub fn height(&self) -> Real {
        let (min, max) = self.min_max(Axis::Y);
        max - min
    }

    /// Extent along Z.
    pub fn depth(&self) -> Real {
        let (min, max) = self.min_max(Axis::Z);
        max - min
    }

    /// Reverse the winding. Applying it twice restores the original order.
    pub fn flip(&mut self) {
        self.vertices.reverse();
    }

    /// Exact value membership test (position and UV).
    pub fn contains_exact(&self, vertex: &Vertex3D) -> bool {
        self.vertices.iter().any(|v| v == vertex)
    }

    /// Flatten into the frame of the supporting plane.
    ///
    /// The first vertex maps to the 2D origin and the loop keeps its winding
    /// (counter-clockwise about the normal becomes counter-clockwise in 2D).
    pub fn to_2d(&self) -> ModelResult<Face2D> {
        let positions = self.positions();
        let basis = Basis::from_points(&positions)?;
        Ok(self.project_with(ProjectionDetails {
            basis,
            origin: positions[0],
            source: None,
        }))
    }

    /// Flatten into the [`Basis::upright`] frame of the supporting plane.
    ///
    /// Unlike [`Face3D::to_2d`] the frame does not depend on which vertex comes
    /// first, so it is the one unit-frame shapes are fit against.
    pub fn to_2d_upright(&self) -> ModelResult<Face2D> {
        let positions = self.positions();
        let basis = Basis::upright(newell_normal(&positions)?);
        Ok(self.project_with(ProjectionDetails {
            basis,
            origin: positions[0],
            source: None,
        }))
    }

    /// Flatten through an existing projection, e.g. one taken from another
    /// loop of the same node. Out-of-plane offsets are dropped.
    pub fn project_with(&self, pd: ProjectionDetails) -> Face2D {
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex2D {
                pos: pd.project(&v.pos),
                uv: v.uv,
                label: v.label.clone(),
            })
            .collect();
        Face2D {
            vertices,
            projection: Some(pd),
            perc_shape: self.perc_shape.clone().map(Box::new),
        }
    }

    /// Assign texture coordinates.
    ///
    /// With explicit `uvs` each vertex takes the matching pair. Without, the
    /// face is flattened, normalized to its bounding box and warped into the
    /// unit square through the same fit as holes, so non-rectangular quads
    /// still get a perspective-consistent layout.
    pub fn add_texture(&mut self, uvs: Option<&[Vertex2D]>) -> ModelResult<()> {
        if let Some(uvs) = uvs {
            if uvs.len() != self.vertices.len() {
                return Err(ModelError::invalid(format!(
                    "{} uv pairs for a face with {} vertices",
                    uvs.len(),
                    self.vertices.len()
                )));
            }
            for (v, uv) in self.vertices.iter_mut().zip(uvs) {
                v.set_uv(uv.pos.x, uv.pos.y);
            }
            return Ok(());
        }

        let mut flat = self.to_2d_upright()?;
        let (min, max) = flat.min_max();
        let (w, h) = (max.x - min.x, max.y - min.y);
        if w <= 0.0 || h <= 0.0 {
            return Err(ModelError::invalid("cannot texture a face with a collapsed extent"));
        }
        for v in &mut flat.vertices {
            v.pos.x = (v.pos.x - min.x) / w;
            v.pos.y = (v.pos.y - min.y) / h;
        }

        flat.fit_2d(&Face2D::square(1.0, 1.0))?;
        for (v, uv) in self.vertices.iter_mut().zip(&flat.vertices) {
            v.set_uv(uv.pos.x, uv.pos.y);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tilted_quad() -> Face3D {
        Face3D::from_points(&[
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 1.0],
            [2.0, 3.0, 1.0],
            [0.0, 3.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn projection_round_trip() {
        let f = tilted_quad();
        let back = f.to_2d().unwrap().to_3d_projected().unwrap();
        for (a, b) in f.vertices.iter().zip(&back.vertices) {
            assert_relative_eq!(a.pos, b.pos, epsilon = 1e-12);
        }
    }

    #[test]
    fn translate_2d_stays_in_plane() {
        let mut f = tilted_quad();
        let n = f.normal().unwrap();
        let d = f.positions()[0].coords.dot(&n);
        f.translate_2d(0.5, -0.25).unwrap();
        for p in f.positions() {
            assert_relative_eq!(p.coords.dot(&n), d, epsilon = 1e-12);
        }
        assert_relative_eq!(f.normal().unwrap(), n, epsilon = 1e-12);
    }

    #[test]
    fn rotate_keeps_centroid() {
        let mut f = tilted_quad();
        let before = f.centroid();
        f.rotate(33.0, Axis::Y);
        assert_relative_eq!(f.centroid(), before, epsilon = 1e-12);
    }

    #[test]
    fn extents_per_axis() {
        let f = tilted_quad();
        assert_relative_eq!(f.width(), 2.0);
        assert_relative_eq!(f.height(), 3.0);
        assert_relative_eq!(f.depth(), 1.0);
    }

    #[test]
    fn generated_texture_covers_unit_square() {
        let mut f = Face3D::from_points(&[
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ])
        .unwrap();
        f.add_texture(None).unwrap();
        let uvs: Vec<_> = f.vertices.iter().map(|v| v.uv.unwrap()).collect();
        for uv in &uvs {
            assert!((-1e-9..=1.0 + 1e-9).contains(&uv.x));
            assert!((-1e-9..=1.0 + 1e-9).contains(&uv.y));
        }
        assert_relative_eq!(uvs[0].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(uvs[1].x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn explicit_uv_count_must_match() {
        let mut f = tilted_quad();
        let uvs = [Vertex2D::new(0.0, 0.0)];
        assert!(matches!(
            f.add_texture(Some(&uvs)),
            Err(ModelError::InvalidGeometry(_))
        ));
    }
}
