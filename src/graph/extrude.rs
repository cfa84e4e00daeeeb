//! Extrusion: grow side walls and a cap out of a node's loops.
//!
//! The offset direction is the negated normal of the node's outer face, so a
//! base that faces outward (e.g. a floor facing down) grows into the solid.
//! The cap is a translated copy of the extruded loop and keeps its winding,
//! which makes it face back towards the base; flip it (or use
//! [`Model::extrude_flip`]) when the cap is an outside surface.
//!
//! Side walls always face out of the material:
//!
//! * an outer wall over the edge `v1 → v2` is `[t1, t2, v2, v1]` for
//!   `height >= 0` and `[v1, v2, t2, t1]` otherwise;
//! * a hole wall uses the same ordering and is reversed when the hole winds
//!   the same way as the outer loop, so it faces into the opening whatever
//!   winding the hole was authored with.

use super::{ExtrudeTags, Loop, Model, Node, NodeId, Nodes};
use crate::errors::ModelResult;
use crate::face::Face3D;
use crate::float_types::Real;
use nalgebra::Vector3;
use tracing::{debug, instrument};

/// One loop taking part in an extrusion: where its walls start and where its
/// translated copy ends up.
struct Ring {
    base: Loop,
    top: Loop,
    reverse_walls: bool,
}

impl Model {
    /// Extrude the outer loop and every hole by `height`.
    ///
    /// The side walls and the cap are spliced right after `id`; `id` stays in
    /// the list. Returns the cap.
    #[instrument(skip(self, tags))]
    pub fn extrude(&mut self, id: NodeId, height: Real, tags: &ExtrudeTags) -> ModelResult<NodeId> {
        self.extrude_outer_rings(id, height, true, tags)
    }

    /// [`Model::extrude`], then unlink `id`, whose face is now buried inside
    /// the solid.
    pub fn extrude_drop(&mut self, id: NodeId, height: Real, tags: &ExtrudeTags) -> ModelResult<NodeId> {
        let top = self.extrude(id, height, tags)?;
        self.drop_node(id)?;
        Ok(top)
    }

    /// [`Model::extrude`] with the cap flipped to face away from the base.
    pub fn extrude_flip(&mut self, id: NodeId, height: Real, tags: &ExtrudeTags) -> ModelResult<NodeId> {
        let top = self.extrude(id, height, tags)?;
        self.flip(top)?;
        Ok(top)
    }

    /// Extrude the outer loop only. Holes get neither walls nor copies on the cap.
    pub fn extrude_outer(&mut self, id: NodeId, height: Real, tags: &ExtrudeTags) -> ModelResult<NodeId> {
        self.extrude_outer_rings(id, height, false, tags)
    }

    /// Extrude each hole on its own into a separate cap, e.g. to sink window
    /// recesses into a wall.
    ///
    /// Positive heights move away from the outer face's front (into the
    /// recess). Every cap faces the same way as the outer face. Tags restart
    /// for each hole. Each hole's walls and cap follow the previous hole's cap
    /// in the list, so the list reads in hole order. Returns the caps in hole
    /// order.
    #[instrument(skip(self, tags))]
    pub fn extrude_inner(&mut self, id: NodeId, height: Real, tags: &ExtrudeTags) -> ModelResult<Nodes> {
        let node = self.node(id)?.clone();
        let outer_normal = self.face(&node.outer)?.normal()?;
        let dir = -outer_normal * height;

        let mut caps = Nodes::new();
        let mut anchor = id;
        for hole in &node.inner {
            let hole_face = self.face(hole)?;
            let same_winding = hole_face.normal()?.dot(&outer_normal) > 0.0;
            let top = self.translated_copy(hole, &dir)?;
            let ring = Ring {
                base: hole.clone(),
                top: top.clone(),
                reverse_walls: same_winding,
            };

            let mut cap = top;
            if !same_winding {
                cap.flip();
            }
            let cap = self.nodes.insert(Node::new(tags.tag_at(0), cap, Vec::new()));
            self.build_walls(anchor, &[ring], height, cap, tags)?;
            caps.push(cap);
            anchor = cap;
        }
        debug!(caps = caps.len(), "extruded holes");
        Ok(caps)
    }

    /// Repeatedly extrude, letting `step` reshape the current frontier and
    /// choose the height before each extrusion.
    ///
    /// `step(i, model, frontier)` runs for `i in 0..num_iter` and returns the
    /// height of extrusion `i`; it runs once more with `i == num_iter` on the
    /// final cap. Every intermediate frontier is dropped; the original `id`
    /// stays. Returns the final cap.
    pub fn extrude_loop<F>(
        &mut self,
        id: NodeId,
        num_iter: usize,
        mut step: F,
        tags: &ExtrudeTags,
    ) -> ModelResult<NodeId>
    where
        F: FnMut(usize, &mut Model, NodeId) -> ModelResult<Real>,
    {
        let mut frontier = id;
        for i in 0..num_iter {
            let height = step(i, self, frontier)?;
            let top = self.extrude(frontier, height, tags)?;
            if i > 0 {
                self.drop_node(frontier)?;
            }
            frontier = top;
        }
        step(num_iter, self, frontier)?;
        Ok(frontier)
    }

    /// Build a pyramid: one triangle per outer edge, meeting at the outer
    /// centroid offset by `height` along the negated normal.
    ///
    /// Triangles are tagged like side walls (`tags` index `i + 1`) and spliced
    /// after `id`. Returns `id`.
    #[instrument(skip(self, tags))]
    pub fn extrude_point(&mut self, id: NodeId, height: Real, tags: &ExtrudeTags) -> ModelResult<NodeId> {
        let outer = self.node(id)?.outer.clone();
        let face = self.face(&outer)?;
        let apex = face.centroid() - face.normal()? * height;
        let apex = self.vertices.insert(apex.into());

        let n = outer.len();
        let mut chain = Vec::with_capacity(n);
        for i in 0..n {
            let (v1, v2) = (outer.vertices[i], outer.vertices[(i + 1) % n]);
            let vertices = if height < 0.0 {
                vec![v1, v2, apex]
            } else {
                vec![apex, v2, v1]
            };
            let side = Loop {
                vertices,
                perc_shape: None,
            };
            chain.push(self.nodes.insert(Node::new(tags.tag_at(i + 1), side, Vec::new())));
        }
        self.splice_after(id, &chain)?;
        Ok(id)
    }

    /// Shared path of `extrude` and `extrude_outer`.
    fn extrude_outer_rings(
        &mut self,
        id: NodeId,
        height: Real,
        with_holes: bool,
        tags: &ExtrudeTags,
    ) -> ModelResult<NodeId> {
        let node = self.node(id)?.clone();
        let outer_normal = self.face(&node.outer)?.normal()?;
        let dir = -outer_normal * height;

        let mut rings = vec![Ring {
            base: node.outer.clone(),
            top: self.translated_copy(&node.outer, &dir)?,
            reverse_walls: false,
        }];
        if with_holes {
            for hole in &node.inner {
                let same_winding = self.face(hole)?.normal()?.dot(&outer_normal) > 0.0;
                rings.push(Ring {
                    base: hole.clone(),
                    top: self.translated_copy(hole, &dir)?,
                    reverse_walls: same_winding,
                });
            }
        }

        let cap_outer = rings[0].top.clone();
        let cap_holes = rings[1..].iter().map(|r| r.top.clone()).collect();
        let cap = self
            .nodes
            .insert(Node::new(tags.tag_at(0), cap_outer, cap_holes));
        self.build_walls(id, &rings, height, cap, tags)?;
        debug!(rings = rings.len(), ?cap, "extruded node");
        Ok(cap)
    }

    /// Fresh vertex instances for `lp`, offset by `dir`.
    fn translated_copy(&mut self, lp: &Loop, dir: &Vector3<Real>) -> ModelResult<Loop> {
        let mut face: Face3D = self.face(lp)?;
        face.translate(dir.x, dir.y, dir.z);
        Ok(self.insert_face(face))
    }

    /// Create the wall nodes for `rings` and splice walls plus `cap` after `anchor`.
    fn build_walls(
        &mut self,
        anchor: NodeId,
        rings: &[Ring],
        height: Real,
        cap: NodeId,
        tags: &ExtrudeTags,
    ) -> ModelResult<()> {
        let mut chain = Vec::new();
        for ring in rings {
            let n = ring.base.len();
            for i in 0..n {
                let j = (i + 1) % n;
                let (v1, v2) = (ring.base.vertices[i], ring.base.vertices[j]);
                let (t1, t2) = (ring.top.vertices[i], ring.top.vertices[j]);
                let mut side = Loop {
                    vertices: if height < 0.0 {
                        vec![v1, v2, t2, t1]
                    } else {
                        vec![t1, t2, v2, v1]
                    },
                    perc_shape: None,
                };
                if ring.reverse_walls {
                    side.flip();
                }
                let tag = tags.tag_at(chain.len() + 1);
                chain.push(self.nodes.insert(Node::new(tag, side, Vec::new())));
            }
        }
        chain.push(cap);
        self.splice_after(anchor, &chain)
    }
}
