use std::collections::HashSet;

use scene_core::{Proposal, ProposalKind, ProposalPool, SceneMctsError, SceneMctsResult};

use crate::{area_allocator::AreaAllocator, node_id::NodeId, options::TreeOptions, score::ScoreMode};

/// Owns the node forest and a cursor used purely as the driver's traversal
/// state. The root is created once, in [`Tree::new`], and is the unique node
/// of kind [`ProposalKind::Root`] for the life of the tree.
pub struct Tree {
    pub root: NodeId,
    pub allocator: AreaAllocator,
    cursor: NodeId,
    esc_counter: u64,
    end_counter: u64,
}

impl Tree {
    #[must_use]
    pub fn new() -> Self {
        let mut allocator = AreaAllocator::new();
        let root = allocator.new_root(Proposal::new("ROOT", ProposalKind::Root));
        Self {
            root,
            allocator,
            cursor: root,
            esc_counter: 0,
            end_counter: 0,
        }
    }

    // --- cursor -------------------------------------------------------

    pub fn set_curr(&mut self, node: NodeId) {
        self.cursor = node;
    }

    #[must_use]
    pub const fn get_curr(&self) -> NodeId {
        self.cursor
    }

    pub fn reset_current_node(&mut self) {
        self.cursor = self.root;
    }

    /// Moves the cursor to the current node's parent.
    ///
    /// # Errors
    ///
    /// Returns [`SceneMctsError::VisitParentOfRoot`] if the cursor is already at the root.
    pub fn visit_parent(&mut self) -> SceneMctsResult<()> {
        let parent = self
            .allocator
            .get_node(self.cursor)
            .parent
            .ok_or(SceneMctsError::VisitParentOfRoot)?;
        self.cursor = parent;
        Ok(())
    }

    // --- child materialization -----------------------------------------

    fn next_esc_id(&mut self) -> String {
        self.esc_counter += 1;
        format!("__esc_{}", self.esc_counter)
    }

    fn next_end_id(&mut self) -> String {
        self.end_counter += 1;
        format!("__end_{}", self.end_counter)
    }

    fn new_end_child(&mut self, parent: NodeId) -> NodeId {
        let proposal = Proposal::new(self.next_end_id(), ProposalKind::End);
        self.allocator.new_child(parent, proposal)
    }

    /// Materializes `node`'s children from the live pool `pool`, exactly
    /// once. Idempotent: if `node` already has children, this is a no-op.
    pub fn ensure_children(&mut self, node: NodeId, pool: &ProposalPool, opts: &TreeOptions) {
        if self.allocator.get_node(node).children.is_some() {
            return;
        }

        if pool.is_empty() {
            self.materialize_end_only(node);
            return;
        }

        let kind = self.allocator.get_node(node).proposal.kind();
        let mut candidates = match kind {
            ProposalKind::Root => {
                let seed = pool.first().expect("pool checked non-empty").clone();
                pool.intersection_with_ids(seed.incompatible())
            }
            ProposalKind::Esc => self.esc_candidates(node, pool),
            ProposalKind::Other => self.other_candidates(node, pool),
            ProposalKind::End => ProposalPool::new(),
        };

        if opts.sib_nodes_limit > 0 {
            candidates.truncate(opts.sib_nodes_limit);
        }

        if candidates.is_empty() {
            self.materialize_end_only(node);
            return;
        }

        if opts.add_esc_nodes {
            self.append_esc_child(node, &mut candidates);
        }

        let child_ids: Vec<NodeId> = candidates
            .iter()
            .cloned()
            .map(|candidate| self.allocator.new_child(node, candidate))
            .collect();

        let node_mut = self.allocator.get_node_mut(node);
        node_mut.children = Some(child_ids);
        node_mut.all_children_created = true;
    }

    fn materialize_end_only(&mut self, node: NodeId) {
        let end = self.new_end_child(node);
        let node_mut = self.allocator.get_node_mut(node);
        node_mut.children = Some(vec![end]);
        node_mut.all_children_created = true;
    }

    fn other_candidates(&mut self, node: NodeId, pool: &ProposalPool) -> ProposalPool {
        let proposal = self.allocator.get_node(node).proposal.clone();
        let mut neighborhood = pool.intersection_with_ids(proposal.neighbors());
        if neighborhood.is_empty() {
            neighborhood = pool.clone();
        }
        let seed = neighborhood.first().expect("non-empty by construction").clone();
        pool.intersection_with_ids(seed.incompatible())
    }

    fn esc_candidates(&mut self, node: NodeId, pool: &ProposalPool) -> ProposalPool {
        let proposal = self.allocator.get_node(node).proposal.clone();
        let mut neighborhood = pool.intersection_with_ids(proposal.neighbors());
        if neighborhood.is_empty() {
            neighborhood = pool.clone();
        }

        let parent = self
            .allocator
            .get_node(node)
            .parent
            .expect("ESC nodes always have a parent");
        let siblings = self.allocator.get_node(parent).children.clone().unwrap_or_default();

        let present: HashSet<_> = siblings
            .into_iter()
            .map(|sibling| self.allocator.get_node(sibling))
            .filter(|sibling| sibling.proposal.kind() != ProposalKind::Esc)
            .map(|sibling| sibling.proposal.id().clone())
            .collect();

        let remaining = neighborhood.difference_with_ids(&present);
        if remaining.is_empty() {
            return ProposalPool::new();
        }

        let seed = remaining.first().expect("non-empty by construction").clone();
        let candidates = remaining.intersection_with_ids(seed.incompatible());

        // A single-candidate ESC expansion would just re-offer the cohort's
        // own seed with nothing new excluded — treat as a degenerate dead end.
        if candidates.len() == 1 {
            ProposalPool::new()
        } else {
            candidates
        }
    }

    fn append_esc_child(&mut self, node: NodeId, candidates: &mut ProposalPool) {
        let neighbors = self.allocator.get_node(node).proposal.neighbors().clone();
        let mut esc = Proposal::new(self.next_esc_id(), ProposalKind::Esc);
        for candidate in candidates.iter() {
            esc.add_incompatible(candidate.id().clone());
        }
        esc.add_incompatible(esc.id().clone());
        for neighbor in &neighbors {
            esc.add_neighbor(neighbor.clone());
        }
        candidates.push(esc);
    }

    // --- locking ---------------------------------------------------------

    /// Walks from `from` toward the root, locking every node whose children
    /// are all locked, and stopping at the first node that is not (or at the
    /// root, which may itself become locked this way).
    pub fn check_and_lock(&mut self, from: NodeId) {
        let mut node_id = from;
        loop {
            let (all_children_locked, parent) = {
                let node = self.allocator.get_node(node_id);
                // `Some(empty)` is an END node's children: vacuously all-locked, so
                // it ascends past itself. `None` means not-yet-materialized and must
                // not be treated as locked.
                let all_locked = match &node.children {
                    Some(children) => children.iter().all(|child| self.allocator.get_node(*child).explored_lock),
                    None => false,
                };
                (all_locked, node.parent)
            };

            if !all_children_locked {
                break;
            }

            self.allocator.get_node_mut(node_id).explored_lock = true;

            match parent {
                Some(p) => node_id = p,
                None => break,
            }
        }
    }

    // --- best path ---------------------------------------------------------

    /// The node-id chain of the highest-`score(mode)` child at every level,
    /// from the root down to an END leaf or the first not-yet-expanded node.
    /// Restores the cursor to its prior value.
    pub fn best_path_node_ids(&mut self, mode: ScoreMode) -> Vec<NodeId> {
        let prior_cursor = self.cursor;
        let mut ids = Vec::new();
        let mut node_id = self.root;

        loop {
            let children = match &self.allocator.get_node(node_id).children {
                Some(children) if !children.is_empty() => children.clone(),
                _ => break,
            };

            let mut best_id = children[0];
            let mut best_score = {
                let node = self.allocator.get_node(best_id);
                node.score.score(mode, node.vis_n)
            };
            for &child in &children[1..] {
                let node = self.allocator.get_node(child);
                let score = node.score.score(mode, node.vis_n);
                if score > best_score {
                    best_id = child;
                    best_score = score;
                }
            }

            node_id = best_id;
            ids.push(node_id);

            if self.allocator.get_node(node_id).proposal.kind() == ProposalKind::End {
                break;
            }
        }

        self.cursor = prior_cursor;
        ids
    }

    /// The selected proposals along the best path, plus the terminal END
    /// leaf; ESC markers are omitted.
    pub fn best_path(&mut self, mode: ScoreMode) -> Vec<Proposal> {
        self.best_path_node_ids(mode)
            .into_iter()
            .map(|id| self.allocator.get_node(id).proposal.clone())
            .filter(|proposal| proposal.kind() != ProposalKind::Esc)
            .collect()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
