//! Deep copies and vertex-sharing maintenance.

use super::{Loop, Model, Node, NodeId, Nodes, VertexId};
use crate::errors::ModelResult;
use crate::float_types::Real;
use crate::vertex::value_key;
use hashbrown::HashMap;
use tracing::{debug, instrument};

impl Model {
    /// Copy one node with private vertex instances. The copy is unlinked.
    pub fn copy(&mut self, id: NodeId) -> ModelResult<NodeId> {
        let node = self.node(id)?.clone();
        let mut fresh = HashMap::new();
        let copy = self.copy_node_with(&node, &mut fresh)?;
        Ok(self.nodes.insert(copy))
    }

    /// Copy the whole list `id` belongs to; see [`Nodes::copy`].
    pub fn copy_all(&mut self, id: NodeId) -> ModelResult<Nodes> {
        self.nodes(id)?.copy(self)
    }

    /// Give `id` private copies of all its vertices. The node stays linked
    /// but no longer moves together with its former neighbours.
    pub fn detach_vertices(&mut self, id: NodeId) -> ModelResult<()> {
        let loops: Vec<Loop> = self.node(id)?.loops().cloned().collect();
        let mut fresh = HashMap::new();
        let mut remapped = Vec::with_capacity(loops.len());
        for lp in &loops {
            remapped.push(self.remap_loop(lp, &mut fresh)?);
        }
        let mut remapped = remapped.into_iter();
        let node = self.node_mut(id)?;
        if let Some(outer) = remapped.next() {
            node.outer = outer;
        }
        node.inner = remapped.collect();
        Ok(())
    }

    /// Clone `lp` onto new vertex instances, reusing the instance already
    /// created for an id seen earlier through `fresh`.
    fn remap_loop(&mut self, lp: &Loop, fresh: &mut HashMap<VertexId, VertexId>) -> ModelResult<Loop> {
        let mut vertices = Vec::with_capacity(lp.len());
        for &v in &lp.vertices {
            let id = match fresh.get(&v) {
                Some(&id) => id,
                None => {
                    let copy = self.vertex(v)?.clone();
                    let id = self.vertices.insert(copy);
                    fresh.insert(v, id);
                    id
                }
            };
            vertices.push(id);
        }
        Ok(Loop {
            vertices,
            perc_shape: lp.perc_shape.clone(),
        })
    }

    fn copy_node_with(&mut self, node: &Node, fresh: &mut HashMap<VertexId, VertexId>) -> ModelResult<Node> {
        let outer = self.remap_loop(&node.outer, fresh)?;
        let inner = node
            .inner
            .iter()
            .map(|lp| self.remap_loop(lp, fresh))
            .collect::<ModelResult<Vec<_>>>()?;
        let mut copy = Node::new(node.tag.clone(), outer, inner);
        copy.image_texture = node.image_texture;
        copy.meta = node.meta.clone();
        Ok(copy)
    }
}

impl Nodes {
    /// Graph-isomorphic deep copy.
    ///
    /// Every identity-unique vertex of the selection gets exactly one new
    /// instance, so vertices shared between members are shared between the
    /// copies too. The copies are chained in selection order, as a list of
    /// their own.
    #[instrument(skip_all, fields(nodes = self.len()))]
    pub fn copy(&self, model: &mut Model) -> ModelResult<Nodes> {
        let mut fresh = HashMap::new();
        let mut out = Vec::with_capacity(self.len());
        for &id in self.iter() {
            let node = model.node(id)?.clone();
            let copy = model.copy_node_with(&node, &mut fresh)?;
            out.push(model.nodes.insert(copy));
        }
        model.link(&out)?;
        debug!(vertices = fresh.len(), "copied nodes");
        Ok(Nodes::from(out))
    }

    /// Chain the members in selection order.
    pub fn link_nodes(&self, model: &mut Model) -> ModelResult<()> {
        model.link(self.ids())
    }

    /// Merge value-equal vertices (position and UV, exact) into a single
    /// shared instance: the first one met in selection order.
    pub fn link_vertices(&self, model: &mut Model) -> ModelResult<()> {
        let mut canonical = HashMap::new();
        let mut replace: HashMap<VertexId, VertexId> = HashMap::new();
        for v in self.unique_vertices(model)? {
            let key = value_key(model.vertex(v)?);
            let keep = *canonical.entry(key).or_insert(v);
            if keep != v {
                replace.insert(v, keep);
            }
        }
        self.rewrite_ids(model, &replace)
    }

    /// Weld vertices closer than `distance` onto the first one met, then
    /// merge exact duplicates.
    pub fn join_within(&self, model: &mut Model, distance: Real) -> ModelResult<()> {
        let uniques = self.unique_vertices(model)?;
        let positions = uniques
            .iter()
            .map(|&v| model.vertex(v).map(|x| x.pos))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut replace: HashMap<VertexId, VertexId> = HashMap::new();
        for (j, &vj) in uniques.iter().enumerate() {
            let target = (0..j)
                .filter(|i| !replace.contains_key(&uniques[*i]))
                .find(|&i| nalgebra::distance(&positions[i], &positions[j]) < distance);
            if let Some(i) = target {
                replace.insert(vj, uniques[i]);
            }
        }
        debug!(welded = replace.len(), "joined nearby vertices");
        self.rewrite_ids(model, &replace)?;
        self.link_vertices(model)
    }

    fn rewrite_ids(&self, model: &mut Model, replace: &HashMap<VertexId, VertexId>) -> ModelResult<()> {
        if replace.is_empty() {
            return Ok(());
        }
        for &id in self.iter() {
            let node = model.node_mut(id)?;
            let rings = std::iter::once(&mut node.outer).chain(node.inner.iter_mut());
            for lp in rings {
                for v in &mut lp.vertices {
                    if let Some(&keep) = replace.get(v) {
                        *v = keep;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::face::Face3D;
    use crate::graph::{ExtrudeTags, MetaValue, Model, Nodes};
    use hashbrown::HashSet;

    fn seeded() -> (Model, crate::graph::NodeId) {
        let mut m = Model::new();
        let base = Face3D::from_points(&[
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
        ])
        .unwrap();
        let id = m.add_node(base, Vec::new()).unwrap();
        m.extrude(id, 1.0, &ExtrudeTags::default()).unwrap();
        (m, id)
    }

    #[test]
    fn copy_preserves_sharing_with_new_instances() {
        let (mut m, id) = seeded();
        let original = m.nodes(id).unwrap();
        let copy = original.copy(&mut m).unwrap();

        let a: HashSet<_> = original.unique_vertices(&m).unwrap().into_iter().collect();
        let b: HashSet<_> = copy.unique_vertices(&m).unwrap().into_iter().collect();
        assert_eq!(a.len(), b.len());
        assert!(a.is_disjoint(&b));
        assert_eq!(m.nodes(copy.ids()[0]).unwrap(), copy);
    }

    #[test]
    fn copy_deep_clones_metadata() {
        let (mut m, id) = seeded();
        m.node_mut(id).unwrap().set_meta("levels", vec![1_i64, 2]);
        let copy = m.copy(id).unwrap();
        m.node_mut(copy).unwrap().set_meta("levels", MetaValue::Int(0));
        assert_eq!(
            m.node(id).unwrap().get_meta("levels"),
            Some(&MetaValue::List(vec![MetaValue::Int(1), MetaValue::Int(2)]))
        );
    }

    #[test]
    fn link_vertices_merges_value_equal_instances() {
        let mut m = Model::new();
        let f = Face3D::from_points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
        let a = m.add_node(f.clone(), Vec::new()).unwrap();
        let b = m.add_node(f, Vec::new()).unwrap();
        let sel = Nodes::from(vec![a, b]);
        assert_eq!(sel.unique_vertices(&m).unwrap().len(), 6);
        sel.link_vertices(&mut m).unwrap();
        assert_eq!(sel.unique_vertices(&m).unwrap().len(), 3);
    }

    #[test]
    fn join_within_welds_close_vertices() {
        let mut m = Model::new();
        let f = Face3D::from_points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
        let g = Face3D::from_points(&[[1.0005, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 1.0, 0.0]]).unwrap();
        let sel = Nodes::from(vec![
            m.add_node(f, Vec::new()).unwrap(),
            m.add_node(g, Vec::new()).unwrap(),
        ]);
        sel.join_within(&mut m, 0.01).unwrap();
        assert_eq!(sel.unique_vertices(&m).unwrap().len(), 5);
    }

    #[test]
    fn detach_vertices_breaks_sharing_only_for_that_node() {
        let (mut m, id) = seeded();
        let side = m.node(id).unwrap().next().unwrap();
        m.detach_vertices(side).unwrap();
        let base = &m.node(id).unwrap().outer;
        assert!(!m.node(side).unwrap().outer.shares_vertices(base));
    }
}
