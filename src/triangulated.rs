//! Triangulation of polygon-with-holes nodes, shared by every mesh writer.

use crate::errors::{ModelError, ModelResult};
use crate::face::{Basis, ProjectionDetails, signed_area2};
use crate::float_types::Real;
use crate::graph::{Model, NodeId};
use crate::vertex::Vertex3D;
use geo::{Coord, LineString, Polygon as GeoPolygon, TriangulateEarcut};
use hashbrown::HashMap;
use nalgebra::{Point2, Vector3};
use tracing::warn;

/// One output triangle: three vertex values (with UVs, if any) and the flat
/// normal of the face it was cut from.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex3D; 3],
    pub normal: Vector3<Real>,
}

/// A triangulated 3D surface.
///
/// Anything that can present itself as a bunch of triangles in 3D
/// can use the triangle-based writers.
pub trait Triangulated3D {
    /// Call `f` for each triangle, in a stable order.
    fn visit_triangles<F>(&self, f: F) -> ModelResult<()>
    where
        F: FnMut(&Triangle);
}

/// Ear-cut a 2D polygon with holes.
///
/// Indices refer to the concatenation of `outer` followed by each hole, in
/// order. Every triangle winds counter-clockwise.
pub fn triangulate_2d(outer: &[Point2<Real>], holes: &[Vec<Point2<Real>>]) -> ModelResult<Vec<[usize; 3]>> {
    if outer.len() < 3 {
        return Err(ModelError::invalid(format!(
            "cannot triangulate a loop of {} points",
            outer.len()
        )));
    }

    let points: Vec<Point2<Real>> = outer.iter().chain(holes.iter().flatten()).copied().collect();
    let mut lookup: HashMap<[u64; 2], usize> = HashMap::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        lookup.entry(coord_key(p.x, p.y)).or_insert(i);
    }

    let ring = |pts: &[Point2<Real>]| -> LineString<Real> {
        LineString::new(pts.iter().map(|p| Coord { x: p.x, y: p.y }).collect())
    };
    let polygon = GeoPolygon::new(
        ring(outer),
        holes.iter().filter(|h| h.len() >= 3).map(|h| ring(h.as_slice())).collect(),
    );

    // earcut reports indices into its own flattened ring list (closing points
    // included), so map them back through the coordinates
    let raw = polygon.earcut_triangles_raw();
    let index_of = |i: usize| -> ModelResult<usize> {
        let (x, y) = (raw.vertices[2 * i], raw.vertices[2 * i + 1]);
        lookup
            .get(&coord_key(x, y))
            .copied()
            .ok_or_else(|| ModelError::invalid("triangulation produced an unknown vertex"))
    };

    let mut out = Vec::with_capacity(raw.triangle_indices.len() / 3);
    for tri in raw.triangle_indices.chunks_exact(3) {
        let mut t = [index_of(tri[0])?, index_of(tri[1])?, index_of(tri[2])?];
        let area = signed_area2(&[points[t[0]], points[t[1]], points[t[2]]]);
        if area == 0.0 {
            continue;
        }
        if area < 0.0 {
            t.swap(1, 2);
        }
        out.push(t);
    }
    Ok(out)
}

fn coord_key(x: Real, y: Real) -> [u64; 2] {
    [(x + 0.0).to_bits(), (y + 0.0).to_bits()]
}

impl Model {
    /// Cut one node into triangles facing along its outer normal.
    ///
    /// Holes are projected into the outer loop's frame. A node whose outer
    /// loop has no defined normal is skipped with a warning.
    pub fn triangulate_node(&self, id: NodeId) -> ModelResult<Vec<Triangle>> {
        let node = self.node(id)?;
        let outer = self.face(&node.outer)?;
        let positions = outer.positions();
        let basis = match Basis::from_points(&positions) {
            Ok(b) => b,
            Err(err) => {
                warn!(node = ?id, %err, "skipping degenerate face");
                return Ok(Vec::new());
            }
        };
        let frame = ProjectionDetails {
            basis,
            origin: positions[0],
            source: None,
        };

        let mut vertices = outer.vertices;
        let outer_2d: Vec<Point2<Real>> = positions.iter().map(|p| frame.project(p)).collect();
        let mut holes_2d = Vec::with_capacity(node.inner.len());
        for hole in &node.inner {
            let face = self.face(hole)?;
            if face.vertices.len() < 3 {
                continue;
            }
            holes_2d.push(face.vertices.iter().map(|v| frame.project(&v.pos)).collect());
            vertices.extend(face.vertices);
        }

        Ok(triangulate_2d(&outer_2d, &holes_2d)?
            .into_iter()
            .map(|[a, b, c]| Triangle {
                vertices: [vertices[a].clone(), vertices[b].clone(), vertices[c].clone()],
                normal: basis.n,
            })
            .collect())
    }

    /// A triangle view over the list `root` belongs to.
    pub fn mesh(&self, root: NodeId) -> ListMesh<'_> {
        ListMesh { model: self, root }
    }
}

/// Every node of one list, seen as triangles.
#[derive(Debug, Clone, Copy)]
pub struct ListMesh<'a> {
    model: &'a Model,
    root: NodeId,
}

impl Triangulated3D for ListMesh<'_> {
    fn visit_triangles<F>(&self, mut f: F) -> ModelResult<()>
    where
        F: FnMut(&Triangle),
    {
        for id in self.model.nodes(self.root)? {
            for tri in self.model.triangulate_node(id)? {
                f(&tri);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[[Real; 2]]) -> Vec<Point2<Real>> {
        raw.iter().map(|&[x, y]| Point2::new(x, y)).collect()
    }

    #[test]
    fn square_gives_two_ccw_triangles() {
        let outer = pts(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let tris = triangulate_2d(&outer, &[]).unwrap();
        assert_eq!(tris.len(), 2);
        for t in &tris {
            assert!(signed_area2(&[outer[t[0]], outer[t[1]], outer[t[2]]]) > 0.0);
        }
    }

    #[test]
    fn clockwise_input_still_yields_ccw_triangles() {
        let outer = pts(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        for t in triangulate_2d(&outer, &[]).unwrap() {
            assert!(signed_area2(&[outer[t[0]], outer[t[1]], outer[t[2]]]) > 0.0);
        }
    }

    #[test]
    fn hole_indices_follow_the_outer_loop() {
        let outer = pts(&[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]);
        let hole = pts(&[[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]]);
        let tris = triangulate_2d(&outer, &[hole]).unwrap();
        assert_eq!(tris.len(), 8);
        assert!(tris.iter().flatten().any(|&i| i >= 4));
        assert!(tris.iter().flatten().all(|&i| i < 8));
    }

    #[test]
    fn too_short_loop_is_rejected() {
        let outer = pts(&[[0.0, 0.0], [1.0, 0.0]]);
        assert!(triangulate_2d(&outer, &[]).is_err());
    }
}
