use crate::score::ScoreMode;

/// Knobs governing how children are materialized (see `Tree::ensure_children`).
#[derive(Clone, Debug)]
pub struct TreeOptions {
    /// Caps the number of materialized (non-ESC) children per node. `0` disables the cap.
    pub sib_nodes_limit: usize,
    /// Whether an "escape this cohort" child is appended after the domain candidates.
    pub add_esc_nodes: bool,
    /// Whether UCB selection may descend into a locked child.
    pub vis_locked: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            sib_nodes_limit: 0,
            add_esc_nodes: true,
            vis_locked: false,
        }
    }
}

/// Knobs governing the optional per-leaf gradient refinement pass.
#[derive(Clone, Debug)]
pub struct RefinementOptions {
    /// Refinement steps run on a freshly reached leaf before scoring it. `0` disables refinement.
    pub optimize_steps: u32,
    /// Refinement steps run once, after the search, on the best path's leaf.
    pub final_optimization_steps: u32,
    /// Learning rate passed through to the refinement handle.
    pub optimizer_lr: f64,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            optimize_steps: 0,
            final_optimization_steps: 0,
            optimizer_lr: 1e-2,
        }
    }
}

/// Settings for [`MCTSDriver`](crate::MCTSDriver).
#[derive(Clone, Debug)]
pub struct MCTSOptions {
    /// Total outer iterations to run.
    pub num_iters: usize,
    /// Rollouts performed per expansion.
    pub num_sim_iter: usize,
    /// Aggregation mode used both for UCB's exploit term and for best-path extraction.
    pub ucb_score_type: ScoreMode,
    /// Scale applied to the exploit term.
    pub exploit_coeff: f64,
    /// Explore weight at iteration `t = 0`.
    pub start_explore_coeff: f64,
    /// Explore weight at iteration `t = num_iters`.
    pub end_explore_coeff: f64,
    /// Whether the outer loop may keep running once the root is locked.
    pub mcts_vis_locked: bool,
    /// Seed for the rollout RNG; `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
    pub refinement: RefinementOptions,
    pub tree: TreeOptions,
}

impl Default for MCTSOptions {
    fn default() -> Self {
        Self {
            num_iters: 1_000,
            num_sim_iter: 4,
            ucb_score_type: ScoreMode::Avg,
            exploit_coeff: 1.0,
            start_explore_coeff: 2.0,
            end_explore_coeff: 0.5,
            mcts_vis_locked: false,
            rng_seed: None,
            refinement: RefinementOptions::default(),
            tree: TreeOptions::default(),
        }
    }
}
