//! `Nodes`: an ordered selection of node handles for bulk work.
//!
//! A `Nodes` never owns anything; every operation takes the [`Model`] the ids
//! belong to. Geometric bulk operations act on the identity-unique vertex set
//! of the selection, so a vertex shared by several selected faces is moved
//! exactly once.

use super::{ExtrudeTags, MetaValue, Model, NodeId, VertexId};
use crate::errors::{ModelError, ModelResult};
use crate::face::Face2D;
use crate::float_types::Real;
use crate::vertex::{Axis, Vertex3D};
use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nodes(Vec<NodeId>);

impl From<Vec<NodeId>> for Nodes {
    fn from(ids: Vec<NodeId>) -> Self {
        Nodes(ids)
    }
}

impl FromIterator<NodeId> for Nodes {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Nodes(iter.into_iter().collect())
    }
}

impl IntoIterator for Nodes {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Nodes {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Nodes {
    pub const fn new() -> Self {
        Nodes(Vec::new())
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.0.first().copied()
    }

    pub fn get_index(&self, index: usize) -> Option<NodeId> {
        self.0.get(index).copied()
    }

    pub fn push(&mut self, id: NodeId) {
        self.0.push(id);
    }

    pub fn extend(&mut self, other: Nodes) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains(&id)
    }

    /// Identity-unique vertices over every loop of every member, first-seen order.
    pub fn unique_vertices(&self, model: &Model) -> ModelResult<Vec<VertexId>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &id in &self.0 {
            for lp in model.node(id)?.loops() {
                for &v in &lp.vertices {
                    if seen.insert(v) {
                        out.push(v);
                    }
                }
            }
        }
        Ok(out)
    }

    fn for_each_vertex(&self, model: &mut Model, mut f: impl FnMut(&mut Vertex3D)) -> ModelResult<()> {
        for v in self.unique_vertices(model)? {
            f(model.vertex_mut(v)?);
        }
        Ok(())
    }

    /// Mean of the members' outer-face centroids.
    pub fn centroid(&self, model: &Model) -> ModelResult<Point3<Real>> {
        if self.0.is_empty() {
            return Err(ModelError::invalid("centroid of an empty selection"));
        }
        let mut sum = Vector3::zeros();
        for &id in &self.0 {
            sum += model.centroid(id)?.coords;
        }
        Ok(Point3::from(sum / self.0.len() as Real))
    }

    pub fn translate(&self, model: &mut Model, x: Real, y: Real, z: Real) -> ModelResult<()> {
        self.for_each_vertex(model, |v| v.translate(x, y, z))
    }

    /// Rotate about a world axis through the origin.
    pub fn rotate(&self, model: &mut Model, deg: Real, axis: Axis) -> ModelResult<()> {
        self.for_each_vertex(model, |v| v.rotate(deg, axis))
    }

    /// Scale about the selection's centroid.
    pub fn scale(&self, model: &mut Model, x: Real, y: Real, z: Real) -> ModelResult<()> {
        let cen = self.centroid(model)?;
        self.for_each_vertex(model, |v| {
            v.subtract(&Vertex3D::from(cen));
            v.scale(x, y, z);
            v.translate_vector(&cen.coords);
        })
    }

    /// Scale about the origin.
    pub fn scale_fixed(&self, model: &mut Model, x: Real, y: Real, z: Real) -> ModelResult<()> {
        self.for_each_vertex(model, |v| v.scale(x, y, z))
    }

    /// Uniform scale about the selection's centroid.
    pub fn mul(&self, model: &mut Model, magnitude: Real) -> ModelResult<()> {
        let cen = self.centroid(model)?;
        self.for_each_vertex(model, |v| {
            v.subtract(&Vertex3D::from(cen));
            v.mul(magnitude);
            v.translate_vector(&cen.coords);
        })
    }

    pub fn mirror(&self, model: &mut Model, axis: Axis) -> ModelResult<()> {
        self.for_each_vertex(model, |v| v.mirror(axis))
    }

    pub fn round_vertices(&self, model: &mut Model, precision: i32) -> ModelResult<()> {
        self.for_each_vertex(model, |v| v.round(precision))
    }

    /// Translate the selection so its vertex nearest `point` lands on it.
    pub fn snap(&self, model: &mut Model, point: &Point3<Real>) -> ModelResult<()> {
        let mut closest: Option<Point3<Real>> = None;
        for v in self.unique_vertices(model)? {
            let pos = model.vertex(v)?.pos;
            if closest.is_none_or(|c| nalgebra::distance(&pos, point) < nalgebra::distance(&c, point)) {
                closest = Some(pos);
            }
        }
        match closest {
            Some(c) => {
                let d = point - c;
                self.translate(model, d.x, d.y, d.z)
            }
            None => Ok(()),
        }
    }

    pub fn flip(&self, model: &mut Model) -> ModelResult<()> {
        for &id in &self.0 {
            model.flip(id)?;
        }
        Ok(())
    }

    fn extent(&self, model: &Model, axis: Axis) -> ModelResult<Real> {
        let (mut lo, mut hi) = (Real::MAX, -Real::MAX);
        for &id in &self.0 {
            let (a, b) = model.outer_face(id)?.min_max(axis);
            lo = lo.min(a);
            hi = hi.max(b);
        }
        Ok(if hi < lo { 0.0 } else { hi - lo })
    }

    /// Extent along X of the members' outer faces.
    pub fn width(&self, model: &Model) -> ModelResult<Real> {
        self.extent(model, Axis::X)
    }

    /// Extent along Y of the members' outer faces.
    pub fn height(&self, model: &Model) -> ModelResult<Real> {
        self.extent(model, Axis::Y)
    }

    /// Extent along Z of the members' outer faces.
    pub fn depth(&self, model: &Model) -> ModelResult<Real> {
        self.extent(model, Axis::Z)
    }

    // ─── tags and metadata ───────────────────────────────────────────────────

    /// Members carrying one of `tags`, in selection order.
    pub fn filter(&self, model: &Model, tags: &[&str]) -> ModelResult<Nodes> {
        let mut out = Vec::new();
        for &id in &self.0 {
            if tags.contains(&model.node(id)?.tag.as_str()) {
                out.push(id);
            }
        }
        Ok(Nodes(out))
    }

    pub fn tag(&self, model: &mut Model, tag: &str) -> ModelResult<()> {
        for &id in &self.0 {
            model.node_mut(id)?.tag = tag.to_string();
        }
        Ok(())
    }

    pub fn rename_tag(&self, model: &mut Model, from: &str, to: &str) -> ModelResult<()> {
        for &id in &self.0 {
            let node = model.node_mut(id)?;
            if node.tag == from {
                node.tag = to.to_string();
            }
        }
        Ok(())
    }

    pub fn set_meta(&self, model: &mut Model, key: &str, value: MetaValue) -> ModelResult<()> {
        for &id in &self.0 {
            model.node_mut(id)?.set_meta(key, value.clone());
        }
        Ok(())
    }

    /// Nodes carrying `tag` in the list of the first member.
    pub fn get_all(&self, model: &Model, tag: &str) -> ModelResult<Nodes> {
        match self.first() {
            Some(id) => model.get_all(id, &[tag]),
            None => Ok(Nodes::new()),
        }
    }

    // ─── list surgery ────────────────────────────────────────────────────────

    pub fn drop_all(&self, model: &mut Model) -> ModelResult<()> {
        for &id in &self.0 {
            model.drop_node(id)?;
        }
        Ok(())
    }

    /// [`Model::detach`] each member; returns the copies.
    pub fn detach(&self, model: &mut Model) -> ModelResult<Nodes> {
        self.0.iter().map(|&id| model.detach(id)).collect()
    }

    /// Attach an independent copy of `other`'s whole chain to each member's list.
    pub fn attach(&self, model: &mut Model, other: NodeId) -> ModelResult<()> {
        for &id in &self.0 {
            let copy = model.copy_all(other)?;
            if let Some(head) = copy.first() {
                model.attach(id, head)?;
            }
        }
        Ok(())
    }

    // ─── per-member operations ───────────────────────────────────────────────

    pub fn extrude(&self, model: &mut Model, height: Real, tags: &ExtrudeTags) -> ModelResult<Nodes> {
        self.0.iter().map(|&id| model.extrude(id, height, tags)).collect()
    }

    pub fn extrude_flip(&self, model: &mut Model, height: Real, tags: &ExtrudeTags) -> ModelResult<Nodes> {
        self.0
            .iter()
            .map(|&id| model.extrude_flip(id, height, tags))
            .collect()
    }

    pub fn extrude_drop(&self, model: &mut Model, height: Real, tags: &ExtrudeTags) -> ModelResult<Nodes> {
        self.0
            .iter()
            .map(|&id| model.extrude_drop(id, height, tags))
            .collect()
    }

    /// Caps of every member's inner extrusions, concatenated.
    pub fn extrude_inner(&self, model: &mut Model, height: Real, tags: &ExtrudeTags) -> ModelResult<Nodes> {
        let mut out = Nodes::new();
        for &id in &self.0 {
            out.extend(model.extrude_inner(id, height, tags)?);
        }
        Ok(out)
    }

    pub fn add_holes(&self, model: &mut Model, holes: &[Face2D]) -> ModelResult<()> {
        for &id in &self.0 {
            model.add_holes(id, holes)?;
        }
        Ok(())
    }

    pub fn translate_2d(&self, model: &mut Model, x: Real, y: Real) -> ModelResult<()> {
        for &id in &self.0 {
            model.translate_2d(id, x, y)?;
        }
        Ok(())
    }

    pub fn scale_2d(&self, model: &mut Model, x: Real, y: Real) -> ModelResult<()> {
        for &id in &self.0 {
            model.scale_2d(id, x, y)?;
        }
        Ok(())
    }

    pub fn rotate_2d(&self, model: &mut Model, deg: Real) -> ModelResult<()> {
        for &id in &self.0 {
            model.rotate_2d(id, deg)?;
        }
        Ok(())
    }

    pub fn mul_2d(&self, model: &mut Model, magnitude: Real) -> ModelResult<()> {
        for &id in &self.0 {
            model.mul_2d(id, magnitude)?;
        }
        Ok(())
    }
}
