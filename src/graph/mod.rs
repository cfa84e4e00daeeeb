//! The face graph: polygon-with-holes nodes chained in a doubly linked list
//! over a shared vertex arena.
//!
//! Nodes and vertices live in two [`SlotMap`] arenas owned by a [`Model`].
//! A [`Loop`] stores vertex *ids*, so two faces that hold the same id share
//! that vertex: moving it moves every face it belongs to. Value equality of
//! vertices ([`Vertex3D`]'s `PartialEq`) is a separate, weaker notion.
//!
//! `prev`/`next` are ids as well. Every public operation that touches them
//! leaves the list consistent: `prev.next == self` and `next.prev == self`
//! whenever either is set.

mod copy;
mod extrude;
mod links;
mod nodes;
mod transform;

pub use nodes::Nodes;

use crate::errors::{ModelError, ModelResult};
use crate::face::{Face2D, Face3D, FaceRef, ProjectionDetails, Ring};
use crate::float_types::Real;
use crate::vertex::Vertex3D;
use nalgebra::{Point3, Vector3};
use slotmap::{SlotMap, new_key_type};
use std::collections::BTreeMap;

new_key_type! {
    /// Handle of a node in a [`Model`].
    pub struct NodeId;
    /// Handle of a shared vertex in a [`Model`].
    pub struct VertexId;
}

/// A face stored in a model: an ordered loop of shared vertex ids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Loop {
    pub vertices: Vec<VertexId>,
    /// Unit-frame shape of this loop when it was fit into the outer loop as a hole.
    pub perc_shape: Option<Face2D>,
}

impl Loop {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True if this loop holds `id` itself (identity, not value).
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains(&id)
    }

    /// True if both loops hold at least one common vertex instance.
    pub fn shares_vertices(&self, other: &Loop) -> bool {
        self.vertices.iter().any(|v| other.vertices.contains(v))
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
    }
}

/// Typed metadata attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(Real),
    Text(String),
    List(Vec<MetaValue>),
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<Real> for MetaValue {
    fn from(v: Real) -> Self {
        MetaValue::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(v: Vec<T>) -> Self {
        MetaValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// One polygon with holes, linked into a model's node list.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub outer: Loop,
    pub inner: Vec<Loop>,
    /// Free-form label used for lookup and material assignment. Empty means untagged.
    pub tag: String,
    /// When set, `tag` is an image path and the outer loop carries UVs.
    pub image_texture: bool,
    pub meta: BTreeMap<String, MetaValue>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(tag: impl Into<String>, outer: Loop, inner: Vec<Loop>) -> Self {
        Node {
            outer,
            inner,
            tag: tag.into(),
            image_texture: false,
            meta: BTreeMap::new(),
            prev: None,
            next: None,
        }
    }

    pub const fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub const fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn is_tagged(&self) -> bool {
        !self.tag.is_empty()
    }

    /// Outer loop followed by every hole.
    pub fn loops(&self) -> impl Iterator<Item = &Loop> {
        std::iter::once(&self.outer).chain(self.inner.iter())
    }

    pub fn loop_at(&self, ring: Ring) -> Option<&Loop> {
        match ring {
            Ring::Outer => Some(&self.outer),
            Ring::Inner(i) => self.inner.get(i),
        }
    }

    pub fn loop_at_mut(&mut self, ring: Ring) -> Option<&mut Loop> {
        match ring {
            Ring::Outer => Some(&mut self.outer),
            Ring::Inner(i) => self.inner.get_mut(i),
        }
    }

    pub fn get_meta(&self, key: &str) -> Option<&MetaValue> {
        self.meta.get(key)
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Total vertex count over all holes.
    pub fn count_inner_vertices(&self) -> usize {
        self.inner.iter().map(Loop::len).sum()
    }
}

/// Tags for the faces an extrusion creates.
///
/// Index 0 is the cap (the new top face), index `i + 1` the i-th side face,
/// counted across the outer loop first and then each hole. Missing entries
/// leave the face untagged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtrudeTags {
    pub cap: Option<String>,
    pub sides: Vec<Option<String>>,
}

impl ExtrudeTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cap(mut self, tag: impl Into<String>) -> Self {
        self.cap = Some(tag.into());
        self
    }

    /// Tag side `index` (0-based, outer loop first).
    pub fn with_side(mut self, index: usize, tag: impl Into<String>) -> Self {
        if self.sides.len() <= index {
            self.sides.resize(index + 1, None);
        }
        self.sides[index] = Some(tag.into());
        self
    }

    /// Tag the sides in order, starting at side 0.
    pub fn with_sides<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sides = tags.into_iter().map(|t| Some(t.into())).collect();
        self
    }

    /// Positional lookup: 0 is the cap, `i + 1` is side `i`.
    pub fn get(&self, index: usize) -> Option<&str> {
        match index {
            0 => self.cap.as_deref(),
            i => self.sides.get(i - 1).and_then(|t| t.as_deref()),
        }
    }

    pub(crate) fn tag_at(&self, index: usize) -> String {
        self.get(index).unwrap_or_default().to_string()
    }
}

impl From<&[&str]> for ExtrudeTags {
    /// Positional form: `[cap, side0, side1, ...]`; empty strings stay untagged.
    fn from(tags: &[&str]) -> Self {
        let named = |t: &&str| (!t.is_empty()).then(|| t.to_string());
        ExtrudeTags {
            cap: tags.first().and_then(named),
            sides: tags.iter().skip(1).map(named).collect(),
        }
    }
}

impl<const N: usize> From<[&str; N]> for ExtrudeTags {
    fn from(tags: [&str; N]) -> Self {
        ExtrudeTags::from(&tags[..])
    }
}

/// Owner of every node and vertex of one mesh under construction.
#[derive(Debug, Clone, Default)]
pub struct Model {
    vertices: SlotMap<VertexId, Vertex3D>,
    nodes: SlotMap<NodeId, Node>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── arena access ────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> ModelResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| ModelError::UnknownNode(format!("{id:?}")))
    }

    pub fn node_mut(&mut self, id: NodeId) -> ModelResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownNode(format!("{id:?}")))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of node records, linked or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn add_vertex(&mut self, vertex: Vertex3D) -> VertexId {
        self.vertices.insert(vertex)
    }

    pub fn vertex(&self, id: VertexId) -> ModelResult<&Vertex3D> {
        self.vertices
            .get(id)
            .ok_or_else(|| ModelError::UnknownVertex(format!("{id:?}")))
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> ModelResult<&mut Vertex3D> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownVertex(format!("{id:?}")))
    }

    /// Store every vertex of `face` as a fresh instance and return the loop.
    pub fn insert_face(&mut self, face: Face3D) -> Loop {
        Loop {
            vertices: face
                .vertices
                .into_iter()
                .map(|v| self.vertices.insert(v))
                .collect(),
            perc_shape: face.perc_shape,
        }
    }

    /// Gather a loop's current vertex values.
    pub fn face(&self, lp: &Loop) -> ModelResult<Face3D> {
        let vertices = lp
            .vertices
            .iter()
            .map(|&id| self.vertex(id).cloned())
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Face3D {
            vertices,
            perc_shape: lp.perc_shape.clone(),
        })
    }

    /// Scatter `face`'s vertex values back onto the instances `lp` refers to.
    ///
    /// Shared instances are updated in place, so every other face holding
    /// them sees the change.
    pub fn write_face(&mut self, lp: &Loop, face: &Face3D) -> ModelResult<()> {
        if lp.len() != face.vertices.len() {
            return Err(ModelError::invalid(format!(
                "cannot write {} vertices into a loop of {}",
                face.vertices.len(),
                lp.len()
            )));
        }
        for (&id, v) in lp.vertices.iter().zip(&face.vertices) {
            *self.vertex_mut(id)? = v.clone();
        }
        Ok(())
    }

    pub fn outer_face(&self, id: NodeId) -> ModelResult<Face3D> {
        self.face(&self.node(id)?.outer)
    }

    /// The face of one loop of a node.
    pub fn ring_face(&self, id: NodeId, ring: Ring) -> ModelResult<Face3D> {
        let node = self.node(id)?;
        let lp = node.loop_at(ring).ok_or(ModelError::UnknownHole {
            index: ring_index(ring),
            count: node.inner.len(),
        })?;
        self.face(lp)
    }

    /// Outer face followed by the holes.
    pub fn faces(&self, id: NodeId) -> ModelResult<Vec<Face3D>> {
        self.node(id)?.loops().map(|lp| self.face(lp)).collect()
    }

    // ─── seeding ─────────────────────────────────────────────────────────────

    /// Create an unlinked, untagged node from fresh vertex instances.
    pub fn add_node(&mut self, outer: Face3D, inner: Vec<Face3D>) -> ModelResult<NodeId> {
        self.add_tagged_node("", outer, inner)
    }

    pub fn add_tagged_node(
        &mut self,
        tag: impl Into<String>,
        outer: Face3D,
        inner: Vec<Face3D>,
    ) -> ModelResult<NodeId> {
        if outer.vertices.len() < 3 {
            return Err(ModelError::invalid(format!(
                "a node's outer face needs at least 3 vertices, got {}",
                outer.vertices.len()
            )));
        }
        let outer = self.insert_face(outer);
        let inner = inner.into_iter().map(|f| self.insert_face(f)).collect();
        Ok(self.nodes.insert(Node::new(tag, outer, inner)))
    }

    /// Create one node per outer face and chain them in order. Returns the first.
    pub fn add_slice(&mut self, outers: Vec<Face3D>) -> ModelResult<NodeId> {
        let ids = outers
            .into_iter()
            .map(|f| self.add_node(f, Vec::new()))
            .collect::<ModelResult<Vec<_>>>()?;
        let first = *ids
            .first()
            .ok_or_else(|| ModelError::invalid("a slice needs at least one face"))?;
        self.link(&ids)?;
        Ok(first)
    }

    // ─── geometry queries ────────────────────────────────────────────────────

    /// Unit Newell normal of the node's outer face.
    pub fn normal(&self, id: NodeId) -> ModelResult<Vector3<Real>> {
        self.outer_face(id)?.normal()
    }

    /// Centroid of the node's outer face.
    pub fn centroid(&self, id: NodeId) -> ModelResult<Point3<Real>> {
        Ok(self.outer_face(id)?.centroid())
    }

    pub fn width(&self, id: NodeId) -> ModelResult<Real> {
        Ok(self.outer_face(id)?.width())
    }

    pub fn height(&self, id: NodeId) -> ModelResult<Real> {
        Ok(self.outer_face(id)?.height())
    }

    pub fn depth(&self, id: NodeId) -> ModelResult<Real> {
        Ok(self.outer_face(id)?.depth())
    }

    pub fn count_inner_vertices(&self, id: NodeId) -> ModelResult<usize> {
        Ok(self.node(id)?.count_inner_vertices())
    }

    // ─── projection ──────────────────────────────────────────────────────────

    /// Flatten one loop of a node, remembering where it came from.
    pub fn project_face(&self, id: NodeId, ring: Ring) -> ModelResult<Face2D> {
        let mut flat = self.ring_face(id, ring)?.to_2d()?;
        if let Some(pd) = flat.projection.as_mut() {
            pd.source = Some(FaceRef { node: id, ring });
        }
        Ok(flat)
    }

    /// Lift a flattened face back onto the model face it was projected from,
    /// overwriting the shared vertex positions in place.
    ///
    /// # Errors
    /// [`ModelError::MissingProjectionContext`] if `flat` was not produced by
    /// [`Model::project_face`] (or a face fit into one).
    pub fn lift_face(&mut self, flat: &Face2D) -> ModelResult<()> {
        let source = flat
            .projection
            .as_ref()
            .and_then(|pd: &ProjectionDetails| pd.source)
            .ok_or(ModelError::MissingProjectionContext)?;
        let node = self.node(source.node)?;
        let lp = node
            .loop_at(source.ring)
            .ok_or(ModelError::UnknownHole {
                index: ring_index(source.ring),
                count: node.inner.len(),
            })?
            .clone();
        let mut face = self.face(&lp)?;
        flat.to_3d_onto(&mut face)?;
        self.write_face(&lp, &face)?;
        if let Some(perc) = face.perc_shape {
            if let Some(target) = self.node_mut(source.node)?.loop_at_mut(source.ring) {
                target.perc_shape = Some(perc);
            }
        }
        Ok(())
    }
}

const fn ring_index(ring: Ring) -> usize {
    match ring {
        Ring::Outer => 0,
        Ring::Inner(i) => i,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Face3D {
        Face3D::from_points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn tags_are_positional() {
        let tags = ExtrudeTags::from(["roof", "", "wall"]);
        assert_eq!(tags.get(0), Some("roof"));
        assert_eq!(tags.get(1), None);
        assert_eq!(tags.get(2), Some("wall"));
        assert_eq!(tags.get(3), None);
        assert_eq!(tags.tag_at(7), "");

        let built = ExtrudeTags::new().with_cap("roof").with_side(1, "wall");
        assert_eq!(built, tags);
    }

    #[test]
    fn write_face_updates_shared_instances() {
        let mut model = Model::new();
        let a = model.add_node(unit_square(), Vec::new()).unwrap();
        let shared = model.node(a).unwrap().outer.clone();
        let b = model.add_node(unit_square(), Vec::new()).unwrap();
        model.node_mut(b).unwrap().outer = shared.clone();

        let mut face = model.outer_face(a).unwrap();
        face.translate(0.0, 0.0, 2.0);
        model.write_face(&shared, &face).unwrap();

        assert_eq!(model.outer_face(b).unwrap(), face);
    }

    #[test]
    fn lift_requires_model_source() {
        let mut model = Model::new();
        let flat = unit_square().to_2d().unwrap();
        assert!(matches!(
            model.lift_face(&flat),
            Err(ModelError::MissingProjectionContext)
        ));
    }

    #[test]
    fn project_then_lift_round_trips_in_place() {
        let mut model = Model::new();
        let id = model.add_node(unit_square(), Vec::new()).unwrap();
        let mut flat = model.project_face(id, Ring::Outer).unwrap();
        flat.translate(0.5, 0.0);
        model.lift_face(&flat).unwrap();
        let moved = model.outer_face(id).unwrap();
        assert!((moved.centroid().x - 1.0).abs() < 1e-12);
        assert!(moved.centroid().z.abs() < 1e-12);
    }

    #[test]
    fn metadata_deep_copies() {
        let mut node = Node::new("", Loop::default(), Vec::new());
        node.set_meta("floors", MetaValue::from(vec![1_i64, 2, 3]));
        let mut copy = node.clone();
        if let Some(MetaValue::List(items)) = copy.meta.get_mut("floors") {
            items.push(MetaValue::Int(4));
        }
        assert_eq!(
            node.get_meta("floors"),
            Some(&MetaValue::List(vec![
                MetaValue::Int(1),
                MetaValue::Int(2),
                MetaValue::Int(3)
            ]))
        );
    }
}
