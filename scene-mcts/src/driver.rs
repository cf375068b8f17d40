use rand::{rngs::StdRng, Rng, SeedableRng};
use scene_core::{Game, GameState, Proposal, ProposalKind, SceneMctsError, SceneMctsResult};

use crate::{
    logger::{Logger, NoopLogger},
    node_id::NodeId,
    options::MCTSOptions,
    tree::Tree,
};

/// What `descend_tree` found at the node it moved the cursor to.
enum Descend {
    /// Landed on an END marker, new or already visited.
    End(NodeId),
    /// Landed on a not-yet-visited non-END child; triggers a simulation batch.
    New(NodeId),
    /// Landed on an already-visited non-END child; descent continues from here.
    Visited(NodeId),
    /// Every child was locked and locked descent is disabled.
    Halted,
}

struct IterationOutcome {
    score: f64,
    depth: usize,
}

/// Drives the four-phase search loop (select / expand / simulate /
/// backpropagate) over a [`Tree`] and a [`Game`] collaborator.
///
/// Generic over both capability sets rather than boxed behind `dyn`, the way
/// a board-game player generic over its policy and evaluator would be: most
/// consumers know `G` and `L` at compile time, and monomorphization avoids a
/// vtable indirection on every node visited during a search.
pub struct MCTSDriver<G: Game, L: Logger = NoopLogger> {
    game: G,
    logger: L,
    tree: Tree,
    options: MCTSOptions,
    rng: StdRng,
}

impl<G: Game> MCTSDriver<G, NoopLogger> {
    /// Builds a driver with a fresh tree and a [`NoopLogger`]. `options`
    /// defaults to [`MCTSOptions::default`] when `None`.
    pub fn new(game: G, options: Option<MCTSOptions>) -> Self {
        let options = options.unwrap_or_default();
        let rng = options
            .rng_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Self {
            game,
            logger: NoopLogger,
            tree: Tree::new(),
            options,
            rng,
        }
    }
}

impl<G: Game, L: Logger> MCTSDriver<G, L> {
    #[must_use]
    pub fn with_logger<L2: Logger>(self, logger: L2) -> MCTSDriver<G, L2> {
        MCTSDriver {
            game: self.game,
            logger,
            tree: self.tree,
            options: self.options,
            rng: self.rng,
        }
    }

    #[must_use]
    pub fn with_tree(mut self, tree: Tree) -> Self {
        self.tree = tree;
        self
    }

    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    #[must_use]
    pub const fn options(&self) -> &MCTSOptions {
        &self.options
    }

    /// The proposals making up the tree's current best path.
    pub fn get_best_path(&mut self) -> Vec<Proposal> {
        self.tree.best_path(self.options.ucb_score_type)
    }

    /// Runs the full search: `num_iters` outer iterations, each descending,
    /// expanding, simulating, and backing up, followed by an optional final
    /// refinement pass over the best path's leaf.
    ///
    /// # Errors
    ///
    /// Returns [`SceneMctsError::InvalidSettings`] if `num_iters` or
    /// `num_sim_iter` is zero, and propagates any error raised by the `Game`
    /// or `Logger` collaborators.
    pub fn run(&mut self) -> SceneMctsResult<()> {
        if self.options.num_iters == 0 {
            return Err(SceneMctsError::InvalidSettings {
                reason: "num_iters must be non-zero",
            });
        }
        if self.options.num_sim_iter == 0 {
            return Err(SceneMctsError::InvalidSettings {
                reason: "num_sim_iter must be non-zero",
            });
        }

        self.game.generate_proposals();
        self.logger.reset_logger()?;

        let mut last_score = 0.0_f64;
        let mut last_depth = 0_usize;

        for t in 0..self.options.num_iters {
            self.tree.reset_current_node();
            self.game.restart();

            let root_locked = self.tree.allocator.get_node(self.tree.root).explored_lock;
            if root_locked && !self.options.mcts_vis_locked {
                break;
            }

            let outcome = self.run_iteration(t)?;
            last_score = outcome.score;
            last_depth = outcome.depth;
            self.logger.log_mcts(t, last_score, last_depth, &self.tree)?;
        }

        self.logger
            .log_mcts(self.options.num_iters, last_score, last_depth, &self.tree)?;

        self.final_refinement()?;
        self.logger.log_final(&self.tree)?;

        let best = self.tree.best_path(self.options.ucb_score_type);
        self.logger.export_solution(&best)?;

        Ok(())
    }

    fn run_iteration(&mut self, t: usize) -> SceneMctsResult<IterationOutcome> {
        loop {
            match self.descend_tree(t)? {
                Descend::End(leaf) => {
                    let depth = self.tree.allocator.get_node(leaf).depth;
                    let score = self.score_and_attach_refinement(leaf)?;
                    self.backpropagate(leaf, score);
                    return Ok(IterationOutcome { score, depth });
                }
                Descend::New(node) => {
                    // A new non-END node's own proposal must be applied before it is
                    // expanded, the same as a visited node's — otherwise the pool
                    // snapshotted for simulation still contains the node's own
                    // proposal (and everything it excludes), letting incompatible
                    // siblings leak into this node's subtree.
                    let proposal = self.tree.allocator.get_node(node).proposal.clone();
                    self.game.step(&proposal)?;
                    return self.expand_and_simulate(node);
                }
                Descend::Visited(node) => {
                    let proposal = self.tree.allocator.get_node(node).proposal.clone();
                    self.game.step(&proposal)?;
                }
                Descend::Halted => return Err(SceneMctsError::DescentHalted),
            }
        }
    }

    fn descend_tree(&mut self, t: usize) -> SceneMctsResult<Descend> {
        let node = self.tree.get_curr();
        self.tree.ensure_children(node, self.game.pool(), &self.options.tree);
        let children = self
            .tree
            .allocator
            .get_node(node)
            .children
            .clone()
            .expect("just ensured");

        if let Some(&new_child) = children.iter().find(|&&c| self.tree.allocator.get_node(c).is_new) {
            self.tree.set_curr(new_child);
            return Ok(if self.tree.allocator.get_node(new_child).proposal.kind() == ProposalKind::End {
                Descend::End(new_child)
            } else {
                Descend::New(new_child)
            });
        }

        let parent_vis_n = self.tree.allocator.get_node(node).vis_n;
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &children {
            let child_node = self.tree.allocator.get_node(child);
            if child_node.explored_lock && !self.options.tree.vis_locked {
                continue;
            }
            let score = self.ucb(t, parent_vis_n, child);
            let better = match best {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if better {
                best = Some((child, score));
            }
        }

        match best {
            Some((child, _)) => {
                self.tree.set_curr(child);
                Ok(if self.tree.allocator.get_node(child).proposal.kind() == ProposalKind::End {
                    Descend::End(child)
                } else {
                    Descend::Visited(child)
                })
            }
            None => Ok(Descend::Halted),
        }
    }

    fn ucb(&self, t: usize, parent_vis_n: u32, child: NodeId) -> f64 {
        let child = self.tree.allocator.get_node(child);
        let exploit = self.options.exploit_coeff * child.score.score(self.options.ucb_score_type, child.vis_n);

        let frac = t as f64 / self.options.num_iters as f64;
        let explore_w = (1.0 - frac) * self.options.start_explore_coeff + frac * self.options.end_explore_coeff;
        let explore = explore_w * (2.0 * f64::from(parent_vis_n).ln() / f64::from(child.vis_n)).sqrt();

        exploit + explore
    }

    fn expand_and_simulate(&mut self, node: NodeId) -> SceneMctsResult<IterationOutcome> {
        self.tree.allocator.get_node_mut(node).is_new = false;

        let snapshot_state = self.game.get_state();
        let snapshot_cursor = self.tree.get_curr();

        let mut best_score = f64::MIN;
        let mut best_sequence = self.game.sequence().to_vec();
        let mut best_depth = self.tree.allocator.get_node(node).depth;

        for _ in 0..self.options.num_sim_iter {
            self.game.set_state(snapshot_state.clone());
            self.tree.set_curr(snapshot_cursor);

            let leaf = self.rollout_to_end()?;
            let depth = self.tree.allocator.get_node(leaf).depth;
            let score = self.score_and_attach_refinement(leaf)?;
            self.backpropagate(leaf, score);

            if score > best_score {
                best_score = score;
                best_sequence = self.game.sequence().to_vec();
                best_depth = depth;
            }
        }

        // The pool is deliberately left as whatever the last rollout produced;
        // only the sequence is restored to the best rollout's.
        let mut restored = self.game.get_state();
        restored.sequence = best_sequence;
        self.game.set_state(restored);
        self.tree.set_curr(snapshot_cursor);

        Ok(IterationOutcome {
            score: best_score,
            depth: best_depth,
        })
    }

    fn rollout_to_end(&mut self) -> SceneMctsResult<NodeId> {
        loop {
            let node = self.tree.get_curr();
            self.tree.ensure_children(node, self.game.pool(), &self.options.tree);
            let children = self
                .tree
                .allocator
                .get_node(node)
                .children
                .clone()
                .expect("just ensured");

            let idx = self.rng.gen_range(0..children.len());
            let child = children[idx];
            self.tree.set_curr(child);

            if self.tree.allocator.get_node(child).proposal.kind() == ProposalKind::End {
                return Ok(child);
            }

            let proposal = self.tree.allocator.get_node(child).proposal.clone();
            self.game.step(&proposal)?;
        }
    }

    fn score_and_attach_refinement(&mut self, leaf: NodeId) -> SceneMctsResult<f64> {
        let is_new = self.tree.allocator.get_node(leaf).is_new;
        if is_new {
            self.tree.allocator.get_node_mut(leaf).is_new = false;
            if self.options.refinement.optimize_steps > 0 {
                if let Some(mut handle) = self.game.make_refinement_handle() {
                    handle.optimize(self.options.refinement.optimize_steps, self.options.refinement.optimizer_lr);
                    self.tree.allocator.get_node_mut(leaf).refinement = Some(handle);
                }
            }
        }

        let mut handle = self.tree.allocator.get_node_mut(leaf).refinement.take();
        let score = self.game.calc_score_from_proposals(None, handle.as_deref_mut());
        self.tree.allocator.get_node_mut(leaf).refinement = handle;
        Ok(score)
    }

    fn backpropagate(&mut self, leaf: NodeId, score: f64) {
        let prior_cursor = self.tree.get_curr();
        let mut node_id = leaf;
        loop {
            let node = self.tree.allocator.get_node_mut(node_id);
            node.vis_n += 1;
            node.score.update(score);
            match node.parent {
                Some(parent) => node_id = parent,
                None => break,
            }
        }
        self.tree.check_and_lock(leaf);
        self.tree.set_curr(prior_cursor);
    }

    fn final_refinement(&mut self) -> SceneMctsResult<()> {
        if self.options.refinement.final_optimization_steps == 0 {
            return Ok(());
        }

        let node_ids = self.tree.best_path_node_ids(self.options.ucb_score_type);
        let Some(&leaf) = node_ids.last() else {
            return Ok(());
        };

        let mut handle = self.tree.allocator.get_node_mut(leaf).refinement.take();
        if let Some(handle_ref) = handle.as_mut() {
            let sequence: Vec<Proposal> = node_ids
                .iter()
                .map(|&id| self.tree.allocator.get_node(id).proposal.clone())
                .filter(|proposal| proposal.kind() == ProposalKind::Other)
                .collect();

            handle_ref.optimize(
                self.options.refinement.final_optimization_steps,
                self.options.refinement.optimizer_lr,
            );
            let rescored = self
                .game
                .calc_score_from_proposals(Some(&sequence), Some(handle_ref.as_mut()));
            self.tree.allocator.get_node_mut(leaf).score.update(rescored);
        }
        self.tree.allocator.get_node_mut(leaf).refinement = handle;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use scene_core::{ProposalId, ProposalPool, RefinementHandle};

    use super::*;
    use crate::options::TreeOptions;

    struct FixtureGame {
        universe: Vec<Proposal>,
        pool: ProposalPool,
        sequence: Vec<Proposal>,
        scores: HashMap<String, f64>,
    }

    impl FixtureGame {
        fn new(universe: Vec<Proposal>, scores: HashMap<String, f64>) -> Self {
            Self {
                universe,
                pool: ProposalPool::new(),
                sequence: Vec::new(),
                scores,
            }
        }
    }

    impl Game for FixtureGame {
        fn generate_proposals(&mut self) -> ProposalPool {
            ProposalPool::from_proposals(self.universe.iter().cloned())
        }

        fn restart(&mut self) {
            self.pool = ProposalPool::from_proposals(self.universe.iter().cloned());
            self.sequence.clear();
        }

        fn pool(&self) -> &ProposalPool {
            &self.pool
        }

        fn sequence(&self) -> &[Proposal] {
            &self.sequence
        }

        fn get_state(&self) -> GameState {
            GameState {
                pool: self.pool.clone(),
                sequence: self.sequence.clone(),
            }
        }

        fn set_state(&mut self, state: GameState) {
            self.pool = state.pool;
            self.sequence = state.sequence;
        }

        fn step(&mut self, proposal: &Proposal) -> SceneMctsResult<()> {
            if proposal.kind() == ProposalKind::Other {
                if !self.pool.contains(proposal.id()) {
                    return Err(SceneMctsError::ProposalNotInPool {
                        proposal: proposal.id().clone(),
                    });
                }
                self.sequence.push(proposal.clone());
            }
            self.pool = self.pool.remove_incompatible(proposal);
            Ok(())
        }

        fn calc_score_from_proposals(
            &mut self,
            sequence: Option<&[Proposal]>,
            _refinement: Option<&mut dyn RefinementHandle>,
        ) -> f64 {
            let seq = sequence.unwrap_or(&self.sequence);
            seq.iter().map(|p| *self.scores.get(p.id().as_ref()).unwrap_or(&0.0)).sum()
        }

        fn calc_loss_from_proposals(&mut self, sequence: Option<&[Proposal]>) -> f64 {
            -self.calc_score_from_proposals(sequence, None)
        }

        fn convert_loss_to_score(&self, loss: f64) -> f64 {
            -loss
        }
    }

    fn other(id: &str) -> Proposal {
        Proposal::new(id, ProposalKind::Other)
    }

    #[test]
    fn two_compatible_proposals_are_both_selected() {
        let mut a = other("a");
        a.add_incompatible(ProposalId::from("a"));
        let mut b = other("b");
        b.add_incompatible(ProposalId::from("b"));

        let scores = HashMap::from([("a".to_string(), 0.4), ("b".to_string(), 0.4)]);
        let game = FixtureGame::new(vec![a, b], scores);

        let options = MCTSOptions {
            num_iters: 60,
            num_sim_iter: 4,
            rng_seed: Some(7),
            tree: TreeOptions {
                add_esc_nodes: false,
                ..TreeOptions::default()
            },
            ..MCTSOptions::default()
        };

        let mut driver = MCTSDriver::new(game, Some(options));
        driver.run().unwrap();

        let path: Vec<_> = driver
            .get_best_path()
            .into_iter()
            .filter(|p| p.kind() == ProposalKind::Other)
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(path, vec!["a", "b"]);
    }

    #[test]
    fn incompatible_proposals_prefer_the_higher_scoring_one() {
        let mut a = other("a");
        a.add_incompatible(ProposalId::from("b"));
        let mut b = other("b");
        b.add_incompatible(ProposalId::from("a"));

        let scores = HashMap::from([("a".to_string(), 0.2), ("b".to_string(), 0.9)]);
        let game = FixtureGame::new(vec![a, b], scores);

        let options = MCTSOptions {
            num_iters: 80,
            num_sim_iter: 4,
            rng_seed: Some(11),
            tree: TreeOptions {
                add_esc_nodes: false,
                ..TreeOptions::default()
            },
            ..MCTSOptions::default()
        };

        let mut driver = MCTSDriver::new(game, Some(options));
        driver.run().unwrap();

        let path: Vec<_> = driver
            .get_best_path()
            .into_iter()
            .filter(|p| p.kind() == ProposalKind::Other)
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(path, vec!["b"]);
    }

    #[test]
    fn new_node_steps_its_own_proposal_before_expanding() {
        // a and b are mutually incompatible. Root offers [a, b]; forced
        // expansion descends into a first. Before expanding a's children, a's
        // own proposal must already be applied to the game, so the pool a's
        // children are materialized from excludes both a and b — a single END
        // child, never a reoffered "b" leaking into a's subtree.
        let mut a = other("a");
        a.add_incompatible(ProposalId::from("b"));
        let mut b = other("b");
        b.add_incompatible(ProposalId::from("a"));

        let scores = HashMap::from([("a".to_string(), 0.2), ("b".to_string(), 0.9)]);
        let game = FixtureGame::new(vec![a, b], scores);

        let options = MCTSOptions {
            num_iters: 1,
            num_sim_iter: 1,
            rng_seed: Some(3),
            tree: TreeOptions {
                add_esc_nodes: false,
                ..TreeOptions::default()
            },
            ..MCTSOptions::default()
        };

        let mut driver = MCTSDriver::new(game, Some(options));
        driver.run().unwrap();

        let tree = driver.tree();
        let root_children = tree.allocator.get_node(tree.root).children.clone().unwrap();
        let a_node = root_children
            .iter()
            .find(|&&id| tree.allocator.get_node(id).proposal.id().as_ref() == "a")
            .copied()
            .expect("root must have offered a");

        let a_children = tree
            .allocator
            .get_node(a_node)
            .children
            .clone()
            .expect("a must have been expanded during the forced-expansion descent");
        let kinds: Vec<_> = a_children.iter().map(|&id| tree.allocator.get_node(id).proposal.kind()).collect();
        assert_eq!(kinds, vec![ProposalKind::End]);
    }

    #[test]
    fn rejects_zero_iterations() {
        let game = FixtureGame::new(vec![other("a")], HashMap::new());
        let options = MCTSOptions {
            num_iters: 0,
            ..MCTSOptions::default()
        };
        let mut driver = MCTSDriver::new(game, Some(options));
        assert!(matches!(driver.run(), Err(SceneMctsError::InvalidSettings { .. })));
    }
}
