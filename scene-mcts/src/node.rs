use std::fmt;

use scene_core::{Proposal, ProposalKind, RefinementHandle};

use crate::{node_id::NodeId, score::NodeScoreAggregator};

/// A vertex in the search tree.
///
/// Children are `None` until first materialization, `Some(vec![])` only for
/// an [`ProposalKind::End`] node (which never has children), and otherwise a
/// non-empty list of freshly allocated [`Node`]s. `full_id` is the
/// concatenation of the carried proposal's id with the parent's `full_id`,
/// guaranteeing uniqueness along any root-to-node path even though the
/// arena's [`NodeId`] is already unique on its own.
pub struct Node {
    pub id: NodeId,
    pub full_id: String,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub proposal: Proposal,
    pub score: NodeScoreAggregator,
    pub vis_n: u32,
    pub is_new: bool,
    pub children: Option<Vec<NodeId>>,
    pub explored_lock: bool,
    pub all_children_created: bool,
    pub refinement: Option<Box<dyn RefinementHandle>>,
}

impl Node {
    pub(crate) fn new_root(id: NodeId, proposal: Proposal) -> Self {
        let full_id = proposal.id().to_string();
        Self {
            id,
            full_id,
            parent: None,
            depth: 0,
            proposal,
            score: NodeScoreAggregator::new(),
            vis_n: 0,
            is_new: false,
            children: None,
            explored_lock: false,
            all_children_created: false,
            refinement: None,
        }
    }

    pub(crate) fn new_child(
        id: NodeId,
        parent: NodeId,
        parent_full_id: &str,
        depth: usize,
        proposal: Proposal,
    ) -> Self {
        let full_id = format!("{}::{parent_full_id}", proposal.id());
        // END nodes are born locked: they have no descendants left to explore.
        let explored_lock = proposal.kind() == ProposalKind::End;

        Self {
            id,
            full_id,
            parent: Some(parent),
            depth,
            proposal,
            score: NodeScoreAggregator::new(),
            vis_n: 0,
            is_new: true,
            children: if explored_lock { Some(Vec::new()) } else { None },
            explored_lock,
            all_children_created: explored_lock,
            refinement: None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("full_id", &self.full_id)
            .field("kind", &self.proposal.kind())
            .field("depth", &self.depth)
            .field("vis_n", &self.vis_n)
            .field("is_new", &self.is_new)
            .field("explored_lock", &self.explored_lock)
            .field("children", &self.children.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}
