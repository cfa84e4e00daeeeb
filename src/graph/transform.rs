//! Node-level transforms, hole management and texturing.
//!
//! A node is moved as one rigid set: every identity-unique vertex of its outer
//! loop and holes is touched once, and "about the centroid" always means the
//! centroid of the outer loop. The planar (`*_2d`) operations edit every loop
//! in the outer loop's frame and then re-fit the holes of every node sharing
//! vertices with the edited one.

use super::{Loop, Model, NodeId, Nodes, VertexId};
use crate::errors::{ModelError, ModelResult};
use crate::face::{Face2D, Face3D};
use crate::float_types::Real;
use crate::vertex::{Axis, Vertex2D, Vertex3D};
use hashbrown::HashSet;
use nalgebra::{Point2, Point3, Vector3};
use tracing::{debug, instrument, trace};

impl Model {
    /// Identity-unique vertices of every loop of `id`, first-seen order.
    fn node_vertices(&self, id: NodeId) -> ModelResult<Vec<VertexId>> {
        let mut seen = HashSet::new();
        Ok(self
            .node(id)?
            .loops()
            .flat_map(|lp| lp.vertices.iter().copied())
            .filter(|v| seen.insert(*v))
            .collect())
    }

    fn for_node_vertices(&mut self, id: NodeId, mut f: impl FnMut(&mut Vertex3D)) -> ModelResult<()> {
        for v in self.node_vertices(id)? {
            f(self.vertex_mut(v)?);
        }
        Ok(())
    }

    fn about_centroid(&mut self, id: NodeId, mut f: impl FnMut(&mut Vertex3D)) -> ModelResult<()> {
        let cen = self.centroid(id)?.coords;
        self.for_node_vertices(id, |v| {
            v.translate_vector(&-cen);
            f(v);
            v.translate_vector(&cen);
        })
    }

    pub fn translate(&mut self, id: NodeId, x: Real, y: Real, z: Real) -> ModelResult<()> {
        self.for_node_vertices(id, |v| v.translate(x, y, z))
    }

    /// Rotate about a world axis through the outer centroid.
    pub fn rotate(&mut self, id: NodeId, deg: Real, axis: Axis) -> ModelResult<()> {
        self.about_centroid(id, |v| v.rotate(deg, axis))
    }

    /// Rotate about a world axis through the origin.
    pub fn rotate_fixed(&mut self, id: NodeId, deg: Real, axis: Axis) -> ModelResult<()> {
        self.for_node_vertices(id, |v| v.rotate(deg, axis))
    }

    pub fn scale(&mut self, id: NodeId, x: Real, y: Real, z: Real) -> ModelResult<()> {
        self.about_centroid(id, |v| v.scale(x, y, z))
    }

    pub fn scale_fixed(&mut self, id: NodeId, x: Real, y: Real, z: Real) -> ModelResult<()> {
        self.for_node_vertices(id, |v| v.scale(x, y, z))
    }

    pub fn mul(&mut self, id: NodeId, magnitude: Real) -> ModelResult<()> {
        self.about_centroid(id, |v| v.mul(magnitude))
    }

    pub fn mul_fixed(&mut self, id: NodeId, magnitude: Real) -> ModelResult<()> {
        self.for_node_vertices(id, |v| v.mul(magnitude))
    }

    pub fn mirror(&mut self, id: NodeId, axis: Axis) -> ModelResult<()> {
        self.for_node_vertices(id, |v| v.mirror(axis))
    }

    pub fn round_vertices(&mut self, id: NodeId, precision: i32) -> ModelResult<()> {
        self.for_node_vertices(id, |v| v.round(precision))
    }

    /// Translate so the outer centroid lands on `(x, y, z)`.
    pub fn move_to(&mut self, id: NodeId, x: Real, y: Real, z: Real) -> ModelResult<()> {
        let d = Point3::new(x, y, z) - self.centroid(id)?;
        self.for_node_vertices(id, |v| v.translate_vector(&d))
    }

    /// Translate so the node's vertex nearest `point` lands on it.
    pub fn snap(&mut self, id: NodeId, point: &Point3<Real>) -> ModelResult<()> {
        Nodes::from(vec![id]).snap(self, point)
    }

    /// Translate `id` so its outer centroid lands on `other`'s.
    pub fn align(&mut self, id: NodeId, other: NodeId) -> ModelResult<()> {
        let d: Vector3<Real> = self.centroid(other)? - self.centroid(id)?;
        self.for_node_vertices(id, |v| v.translate_vector(&d))
    }

    /// Reverse the winding of every loop.
    ///
    /// Holes are fit in the outer loop's upright frame, whose horizontal axis
    /// follows the normal. The stored hole shapes are therefore mirrored as
    /// well as reversed, so a later re-fit puts every hole back where it was.
    pub fn flip(&mut self, id: NodeId) -> ModelResult<()> {
        let node = self.node_mut(id)?;
        node.outer.flip();
        for hole in &mut node.inner {
            hole.flip();
            if let Some(perc) = hole.perc_shape.as_mut() {
                perc.flip();
                perc.mirror_unit_x();
            }
        }
        Ok(())
    }

    // ─── planar edits ────────────────────────────────────────────────────────

    /// Apply one planar edit to every loop of `id`, all in the outer loop's
    /// frame, then re-fit connected holes.
    ///
    /// `op` gets the flattened loop and the outer loop's 2D centroid, which is
    /// the pivot for scaling and rotation.
    fn edit_loops_2d(
        &mut self,
        id: NodeId,
        op: impl Fn(&mut Face2D, Point2<Real>),
    ) -> ModelResult<()> {
        let node = self.node(id)?;
        let loops: Vec<Loop> = node.loops().cloned().collect();
        let outer = self.face(&node.outer)?.to_2d()?;
        let pd = outer
            .projection
            .clone()
            .ok_or(ModelError::MissingProjectionContext)?;
        let pivot = outer.centroid();
        for lp in &loops {
            let mut face = self.face(lp)?;
            let mut flat = face.project_with(pd.clone());
            op(&mut flat, pivot);
            flat.to_3d_onto(&mut face)?;
            self.write_face(lp, &face)?;
        }
        self.realign_connected_inner(id)
    }

    /// Translate every loop within the outer loop's plane, then re-fit
    /// connected holes.
    pub fn translate_2d(&mut self, id: NodeId, x: Real, y: Real) -> ModelResult<()> {
        self.edit_loops_2d(id, |f, _| f.translate(x, y))
    }

    pub fn scale_2d(&mut self, id: NodeId, x: Real, y: Real) -> ModelResult<()> {
        self.edit_loops_2d(id, |f, pivot| f.about_point(pivot, |f| f.scale_fixed(x, y)))
    }

    pub fn rotate_2d(&mut self, id: NodeId, deg: Real) -> ModelResult<()> {
        self.edit_loops_2d(id, |f, pivot| f.about_point(pivot, |f| f.rotate_fixed(deg)))
    }

    pub fn mul_2d(&mut self, id: NodeId, magnitude: Real) -> ModelResult<()> {
        self.edit_loops_2d(id, |f, pivot| f.about_point(pivot, |f| f.mul_fixed(magnitude)))
    }

    /// Re-fit the holes of `id` and of every node connected to it against
    /// their (possibly moved) outer loops.
    ///
    /// Each hole's stored unit-frame shape is fit again and the resulting
    /// positions are written onto the hole's existing vertex instances. Holes
    /// that were never fit carry no shape and are left alone.
    pub fn realign_connected_inner(&mut self, id: NodeId) -> ModelResult<()> {
        let mut targets = vec![id];
        targets.extend(self.connected(id)?);
        for node_id in targets {
            let node = self.node(node_id)?;
            if node.inner.is_empty() {
                continue;
            }
            let holes = node.inner.clone();
            let outer = self.face(&node.outer)?;
            for hole in &holes {
                let Some(perc) = &hole.perc_shape else {
                    trace!(node = ?node_id, "hole without a stored shape, skipping re-fit");
                    continue;
                };
                let mut shape = perc.clone();
                shape.fit_3d(&outer)?;
                let lifted = shape.to_3d_projected()?;
                let mut face = self.face(hole)?;
                if lifted.vertices.len() != face.vertices.len() {
                    return Err(ModelError::invalid(format!(
                        "stored hole shape has {} vertices, hole has {}",
                        lifted.vertices.len(),
                        face.vertices.len()
                    )));
                }
                for (dst, src) in face.vertices.iter_mut().zip(&lifted.vertices) {
                    dst.pos = src.pos;
                }
                self.write_face(hole, &face)?;
            }
        }
        Ok(())
    }

    // ─── holes ───────────────────────────────────────────────────────────────

    /// Fit unit-frame hole shapes into the outer loop and add them as holes.
    ///
    /// Shapes are authored in `[0, 1]²` relative to the outer loop's bounds,
    /// with `y` pointing down. Nothing is added unless every shape fits.
    #[instrument(skip(self, holes), fields(holes = holes.len()))]
    pub fn add_holes(&mut self, id: NodeId, holes: &[Face2D]) -> ModelResult<()> {
        let outer = self.outer_face(id)?;
        let fitted = holes
            .iter()
            .map(|h| {
                let mut shape = h.clone();
                shape.fit_3d(&outer)?;
                shape.to_3d_projected()
            })
            .collect::<ModelResult<Vec<_>>>()?;
        self.push_holes(id, fitted)
    }

    /// Add holes sized in the outer loop's own units and centered in it.
    ///
    /// Each shape keeps its outline; only its bounding box is used to size and
    /// place it.
    pub fn add_holes_middle_fixed(&mut self, id: NodeId, holes: &[Face2D]) -> ModelResult<()> {
        let outer = self.outer_face(id)?;
        let flat = outer.to_2d_upright()?;
        let (node_w, node_h) = (flat.width(), flat.height());
        if node_w <= 0.0 || node_h <= 0.0 {
            return Err(ModelError::invalid("outer loop has a collapsed extent"));
        }

        let mut fitted = Vec::with_capacity(holes.len());
        for hole in holes {
            let (min, max) = hole.min_max();
            let (hole_w, hole_h) = (max.x - min.x, max.y - min.y);
            if hole_w <= 0.0 || hole_h <= 0.0 {
                return Err(ModelError::invalid("hole shape has a collapsed extent"));
            }
            let (w_perc, h_perc) = (hole_w / node_w, hole_h / node_h);
            let x_perc = (node_w - hole_w) / 2.0 / node_w;
            let y_perc = (node_h - hole_h) / 2.0 / node_h;

            let vertices = hole
                .vertices
                .iter()
                .map(|v| {
                    let mut out = v.clone();
                    out.move_to(
                        x_perc + (v.x() - min.x) / hole_w * w_perc,
                        y_perc + (v.y() - min.y) / hole_h * h_perc,
                    );
                    out
                })
                .collect();
            let mut shape = Face2D::new(vertices)?;
            shape.fit_3d(&outer)?;
            fitted.push(shape.to_3d_projected()?);
        }
        self.push_holes(id, fitted)
    }

    fn push_holes(&mut self, id: NodeId, faces: Vec<Face3D>) -> ModelResult<()> {
        self.node(id)?;
        let loops: Vec<Loop> = faces.into_iter().map(|f| self.insert_face(f)).collect();
        debug!(added = loops.len(), "added holes");
        self.node_mut(id)?.inner.extend(loops);
        Ok(())
    }

    /// Turn a copy of every hole into a node of its own, attached to the end
    /// of `id`'s list. The holes stay in place.
    pub fn detach_holes(&mut self, id: NodeId) -> ModelResult<Nodes> {
        let count = self.node(id)?.inner.len();
        (0..count).map(|i| self.detach_hole(id, i)).collect()
    }

    /// [`Model::detach_holes`] for a single hole.
    pub fn detach_hole(&mut self, id: NodeId, index: usize) -> ModelResult<NodeId> {
        let node = self.node(id)?;
        let hole = node.inner.get(index).ok_or(ModelError::UnknownHole {
            index,
            count: node.inner.len(),
        })?;
        let mut face = self.face(hole)?;
        face.perc_shape = None;
        let copy = self.add_node(face, Vec::new())?;
        self.attach(id, copy)?;
        Ok(copy)
    }

    // ─── texturing and placement ─────────────────────────────────────────────

    /// Texture the outer loop with the image at `path`.
    ///
    /// The path becomes the node's tag (and material name on export).
    pub fn add_texture(&mut self, id: NodeId, path: &str, uvs: Option<&[Vertex2D]>) -> ModelResult<()> {
        let outer = self.node(id)?.outer.clone();
        let mut face = self.face(&outer)?;
        face.add_texture(uvs)?;
        self.write_face(&outer, &face)?;
        let node = self.node_mut(id)?;
        node.tag = path.to_string();
        node.image_texture = true;
        Ok(())
    }

    /// Translate the whole list so the mean of its outer centroids is the origin.
    pub fn center(&mut self, id: NodeId) -> ModelResult<()> {
        let nodes = self.nodes(id)?;
        let cen = nodes.centroid(self)?;
        nodes.translate(self, -cen.x, -cen.y, -cen.z)
    }

    /// Scale and translate the whole list so its bounding box becomes
    /// `[min, max]`. Axes along which the list is flat are only translated.
    pub fn fit_box(&mut self, id: NodeId, min: Point3<Real>, max: Point3<Real>) -> ModelResult<()> {
        let nodes = self.nodes(id)?;
        let (lo, hi) = self.bounds(&nodes)?;
        let extent = hi - lo;
        let target = max - min;
        let factor = |have: Real, want: Real| if have > 0.0 { want / have } else { 1.0 };

        nodes.translate(self, -lo.x, -lo.y, -lo.z)?;
        nodes.scale_fixed(
            self,
            factor(extent.x, target.x),
            factor(extent.y, target.y),
            factor(extent.z, target.z),
        )?;
        nodes.translate(self, min.x, min.y, min.z)
    }

    fn bounds(&self, nodes: &Nodes) -> ModelResult<(Point3<Real>, Point3<Real>)> {
        let mut lo = Point3::from(Vector3::repeat(Real::MAX));
        let mut hi = Point3::from(Vector3::repeat(-Real::MAX));
        for v in nodes.unique_vertices(self)? {
            let p = self.vertex(v)?.pos;
            lo = lo.inf(&p);
            hi = hi.sup(&p);
        }
        if hi.x < lo.x {
            return Err(ModelError::invalid("bounds of an empty list"));
        }
        Ok((lo, hi))
    }
}
