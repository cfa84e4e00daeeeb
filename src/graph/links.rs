//! List maintenance: traversal, splicing, lookup by tag and metadata.

use super::{MetaValue, Model, NodeId, Nodes, VertexId};
use crate::errors::{ModelError, ModelResult};
use hashbrown::HashSet;
use tracing::debug;

impl Model {
    /// Head of the list `id` belongs to.
    pub fn first(&self, id: NodeId) -> ModelResult<NodeId> {
        let mut cur = id;
        while let Some(prev) = self.node(cur)?.prev {
            cur = prev;
        }
        Ok(cur)
    }

    /// Tail of the list `id` belongs to.
    pub fn last(&self, id: NodeId) -> ModelResult<NodeId> {
        let mut cur = id;
        while let Some(next) = self.node(cur)?.next {
            cur = next;
        }
        Ok(cur)
    }

    /// Every node of the list `id` belongs to, head first.
    pub fn nodes(&self, id: NodeId) -> ModelResult<Nodes> {
        self.chain_from(self.first(id)?)
    }

    /// `id` and everything after it.
    pub(crate) fn chain_from(&self, id: NodeId) -> ModelResult<Nodes> {
        let mut out = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            out.push(c);
            cur = self.node(c)?.next;
        }
        Ok(Nodes::from(out))
    }

    /// Make `b` follow `a`, cutting whatever each was previously attached to
    /// on that side so both ends stay consistent.
    pub(crate) fn set_link(&mut self, a: NodeId, b: NodeId) -> ModelResult<()> {
        let old_next = self.node(a)?.next;
        let old_prev = self.node(b)?.prev;
        if let Some(n) = old_next.filter(|&n| n != b) {
            self.node_mut(n)?.prev = None;
        }
        if let Some(p) = old_prev.filter(|&p| p != a) {
            self.node_mut(p)?.next = None;
        }
        self.node_mut(a)?.next = Some(b);
        self.node_mut(b)?.prev = Some(a);
        Ok(())
    }

    /// Chain `ids` in the given order.
    pub fn link(&mut self, ids: &[NodeId]) -> ModelResult<()> {
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids {
            self.node(id)?;
            if !seen.insert(id) {
                return Err(ModelError::InvalidLink(format!("{id:?} listed twice")));
            }
        }
        for pair in ids.windows(2) {
            self.set_link(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// Insert freshly created, unlinked nodes right after `anchor`, keeping
    /// whatever followed `anchor` after the last of them.
    pub(crate) fn splice_after(&mut self, anchor: NodeId, chain: &[NodeId]) -> ModelResult<()> {
        let (Some(&head), Some(&tail)) = (chain.first(), chain.last()) else {
            return Ok(());
        };
        let old_next = self.node(anchor)?.next;
        for pair in chain.windows(2) {
            self.node_mut(pair[0])?.next = Some(pair[1]);
            self.node_mut(pair[1])?.prev = Some(pair[0]);
        }
        self.node_mut(anchor)?.next = Some(head);
        self.node_mut(head)?.prev = Some(anchor);
        self.node_mut(tail)?.next = old_next;
        if let Some(n) = old_next {
            self.node_mut(n)?.prev = Some(tail);
        }
        Ok(())
    }

    /// Splice the chain that starts at `other` (through its tail) right after
    /// `anchor`. `other` is cut from anything before it.
    pub fn insert_after(&mut self, anchor: NodeId, other: NodeId) -> ModelResult<()> {
        let chain = self.chain_from(other)?;
        if chain.contains(anchor) {
            return Err(ModelError::InvalidLink(format!(
                "cannot insert a chain containing {anchor:?} after itself"
            )));
        }
        if let Some(p) = self.node(other)?.prev {
            self.node_mut(p)?.next = None;
            self.node_mut(other)?.prev = None;
        }
        self.splice_after(anchor, chain.ids())
    }

    /// Move the single node `other` in front of `anchor`.
    pub fn insert_before(&mut self, anchor: NodeId, other: NodeId) -> ModelResult<()> {
        if anchor == other {
            return Err(ModelError::InvalidLink("a node cannot precede itself".into()));
        }
        self.drop_node(other)?;
        let prev = self.node(anchor)?.prev;
        if let Some(p) = prev {
            self.node_mut(p)?.next = Some(other);
        }
        let node = self.node_mut(other)?;
        node.prev = prev;
        node.next = Some(anchor);
        self.node_mut(anchor)?.prev = Some(other);
        Ok(())
    }

    /// Unlink `id`, joining its neighbours. The node record stays in the arena
    /// with both links cleared; see [`Model::collect_garbage`].
    pub fn drop_node(&mut self, id: NodeId) -> ModelResult<()> {
        let (prev, next) = {
            let n = self.node(id)?;
            (n.prev, n.next)
        };
        if let Some(p) = prev {
            self.node_mut(p)?.next = next;
        }
        if let Some(n) = next {
            self.node_mut(n)?.prev = prev;
        }
        let node = self.node_mut(id)?;
        node.prev = None;
        node.next = None;
        Ok(())
    }

    /// Append `other`'s whole chain after this chain's tail.
    pub fn attach(&mut self, id: NodeId, other: NodeId) -> ModelResult<()> {
        let tail = self.last(id)?;
        let head = self.first(other)?;
        self.insert_after(tail, head)
    }

    /// [`Model::attach`] for several chains, in order.
    pub fn merge(&mut self, id: NodeId, others: &[NodeId]) -> ModelResult<()> {
        for &other in others {
            self.attach(id, other)?;
        }
        Ok(())
    }

    /// Drop `id` and append an independent copy of it at the end of its list.
    ///
    /// The copy has private vertices, so it can be resized without dragging
    /// former neighbours along. Returns the copy.
    pub fn detach(&mut self, id: NodeId) -> ModelResult<NodeId> {
        let mut tail = self.last(id)?;
        if tail == id {
            tail = match self.node(id)?.prev {
                Some(p) => p,
                None => {
                    return self.copy(id);
                }
            };
        }
        self.drop_node(id)?;
        let copy = self.copy(id)?;
        self.splice_after(tail, &[copy])?;
        debug!(?id, ?copy, "detached node");
        Ok(copy)
    }

    /// First node of the list carrying `tag`.
    pub fn get(&self, id: NodeId, tag: &str) -> ModelResult<Option<NodeId>> {
        let nodes = self.nodes(id)?;
        for &n in nodes.iter() {
            if self.node(n)?.tag == tag {
                return Ok(Some(n));
            }
        }
        Ok(None)
    }

    /// Every node of the list carrying one of `tags`, in list order.
    pub fn get_all(&self, id: NodeId, tags: &[&str]) -> ModelResult<Nodes> {
        self.filter_list(id, |node| tags.contains(&node.tag.as_str()))
    }

    /// Up to `num` predecessors, nearest first.
    pub fn get_prev(&self, id: NodeId, num: usize) -> ModelResult<Nodes> {
        let mut out = Vec::with_capacity(num);
        let mut cur = self.node(id)?.prev;
        while let Some(c) = cur.filter(|_| out.len() < num) {
            out.push(c);
            cur = self.node(c)?.prev;
        }
        Ok(Nodes::from(out))
    }

    /// Up to `num` successors, nearest first.
    pub fn get_next(&self, id: NodeId, num: usize) -> ModelResult<Nodes> {
        let mut out = Vec::with_capacity(num);
        let mut cur = self.node(id)?.next;
        while let Some(c) = cur.filter(|_| out.len() < num) {
            out.push(c);
            cur = self.node(c)?.next;
        }
        Ok(Nodes::from(out))
    }

    /// The node `index` steps before `id` (`0` is `id` itself).
    pub fn get_prev_by_index(&self, id: NodeId, index: usize) -> ModelResult<Option<NodeId>> {
        let mut cur = id;
        for _ in 0..index {
            match self.node(cur)?.prev {
                Some(p) => cur = p,
                None => return Ok(None),
            }
        }
        Ok(Some(cur))
    }

    /// The node `index` steps after `id` (`0` is `id` itself).
    pub fn get_next_by_index(&self, id: NodeId, index: usize) -> ModelResult<Option<NodeId>> {
        let mut cur = id;
        for _ in 0..index {
            match self.node(cur)?.next {
                Some(n) => cur = n,
                None => return Ok(None),
            }
        }
        Ok(Some(cur))
    }

    pub fn tag_all(&mut self, id: NodeId, tag: &str) -> ModelResult<()> {
        for n in self.nodes(id)? {
            self.node_mut(n)?.tag = tag.to_string();
        }
        Ok(())
    }

    pub fn tag_all_untagged(&mut self, id: NodeId, tag: &str) -> ModelResult<()> {
        for n in self.nodes(id)? {
            let node = self.node_mut(n)?;
            if !node.is_tagged() {
                node.tag = tag.to_string();
            }
        }
        Ok(())
    }

    pub fn set_meta_all(&mut self, id: NodeId, key: &str, value: MetaValue) -> ModelResult<()> {
        for n in self.nodes(id)? {
            self.node_mut(n)?.set_meta(key, value.clone());
        }
        Ok(())
    }

    /// Nodes of the list whose metadata maps `key` to `value`.
    pub fn nodes_with_meta(&self, id: NodeId, key: &str, value: &MetaValue) -> ModelResult<Nodes> {
        self.filter_list(id, |node| node.get_meta(key) == Some(value))
    }

    fn filter_list(&self, id: NodeId, keep: impl Fn(&super::Node) -> bool) -> ModelResult<Nodes> {
        let mut out = Vec::new();
        for n in self.nodes(id)? {
            if keep(self.node(n)?) {
                out.push(n);
            }
        }
        Ok(Nodes::from(out))
    }

    /// Other nodes of the list whose outer loop holds at least one vertex
    /// instance of `id`'s outer loop.
    pub fn connected(&self, id: NodeId) -> ModelResult<Nodes> {
        let outer = self.node(id)?.outer.clone();
        self.filter_list(id, |node| node.outer.shares_vertices(&outer))
            .map(|nodes| nodes.into_iter().filter(|&n| n != id).collect())
    }

    /// Remove node records not reachable from `root`'s list, then vertices no
    /// remaining node refers to. Returns `(nodes_removed, vertices_removed)`.
    ///
    /// Handles to removed records become stale and report
    /// [`ModelError::UnknownNode`] / [`ModelError::UnknownVertex`].
    pub fn collect_garbage(&mut self, root: NodeId) -> ModelResult<(usize, usize)> {
        let live: HashSet<NodeId> = self.nodes(root)?.into_iter().collect();
        let before_nodes = self.nodes.len();
        self.nodes.retain(|id, _| live.contains(&id));

        let used: HashSet<VertexId> = self
            .nodes
            .values()
            .flat_map(|n| n.loops().flat_map(|lp| lp.vertices.iter().copied()))
            .collect();
        let before_vertices = self.vertices.len();
        self.vertices.retain(|id, _| used.contains(&id));

        let removed = (
            before_nodes - self.nodes.len(),
            before_vertices - self.vertices.len(),
        );
        debug!(nodes = removed.0, vertices = removed.1, "collected garbage");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use crate::face::Face3D;
    use crate::graph::Model;

    fn tri(model: &mut Model, tag: &str) -> crate::graph::NodeId {
        let f = Face3D::from_points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
        model.add_tagged_node(tag, f, Vec::new()).unwrap()
    }

    #[test]
    fn insert_after_splices_whole_chain() {
        let mut m = Model::new();
        let (a, b) = (tri(&mut m, "a"), tri(&mut m, "b"));
        let (x, y) = (tri(&mut m, "x"), tri(&mut m, "y"));
        m.link(&[a, b]).unwrap();
        m.link(&[x, y]).unwrap();

        m.insert_after(a, x).unwrap();
        assert_eq!(m.nodes(b).unwrap().ids(), &[a, x, y, b]);
    }

    #[test]
    fn insert_after_refuses_cycles() {
        let mut m = Model::new();
        let (a, b) = (tri(&mut m, "a"), tri(&mut m, "b"));
        m.link(&[a, b]).unwrap();
        assert!(m.insert_after(b, a).is_err());
    }

    #[test]
    fn insert_before_moves_single_node() {
        let mut m = Model::new();
        let (a, b, c) = (tri(&mut m, "a"), tri(&mut m, "b"), tri(&mut m, "c"));
        m.link(&[a, b, c]).unwrap();
        m.insert_before(a, c).unwrap();
        assert_eq!(m.nodes(a).unwrap().ids(), &[c, a, b]);
    }

    #[test]
    fn prev_next_queries_stop_at_the_ends() {
        let mut m = Model::new();
        let ids: Vec<_> = (0..4).map(|i| tri(&mut m, &i.to_string())).collect();
        m.link(&ids).unwrap();
        assert_eq!(m.get_prev(ids[2], 5).unwrap().ids(), &[ids[1], ids[0]]);
        assert_eq!(m.get_next(ids[0], 2).unwrap().ids(), &[ids[1], ids[2]]);
        assert_eq!(m.get_next_by_index(ids[0], 3).unwrap(), Some(ids[3]));
        assert_eq!(m.get_next_by_index(ids[0], 4).unwrap(), None);
        assert_eq!(m.get_prev_by_index(ids[3], 0).unwrap(), Some(ids[3]));
    }

    #[test]
    fn garbage_collection_removes_dropped_nodes_and_their_vertices() {
        let mut m = Model::new();
        let (a, b) = (tri(&mut m, "a"), tri(&mut m, "b"));
        m.link(&[a, b]).unwrap();
        m.drop_node(b).unwrap();
        assert_eq!(m.collect_garbage(a).unwrap(), (1, 3));
        assert!(m.node(b).is_err());
        assert_eq!(m.vertex_count(), 3);
    }
}
