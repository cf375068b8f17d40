use scene_core::Proposal;

use crate::{node::Node, node_id::NodeId};

/// A simple arena allocator for nodes in the search tree.
///
/// Nodes are appended only; none are ever removed during a run. Addressing
/// them by [`NodeId`] index rather than an owning `Rc`/`RefCell` graph means a
/// node's parent back-reference can never outlive (or keep alive) anything —
/// it's just a `usize` into this vector.
#[derive(Default)]
pub struct AreaAllocator {
    nodes: Vec<Node>,
}

impl AreaAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently allocated.
    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn new_root(&mut self, proposal: Proposal) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new_root(id, proposal));
        id
    }

    pub(crate) fn new_child(&mut self, parent: NodeId, proposal: Proposal) -> NodeId {
        let id = NodeId(self.nodes.len());
        let (parent_full_id, depth) = {
            let parent_node = self.get_node(parent);
            (parent_node.full_id.clone(), parent_node.depth + 1)
        };
        self.nodes.push(Node::new_child(id, parent, &parent_full_id, depth, proposal));
        id
    }

    #[must_use]
    pub fn get_node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
