use std::io::Write;

use scene_core::{Proposal, SceneMctsResult};

use crate::tree::Tree;

/// Observes a run of [`MCTSDriver`](crate::MCTSDriver) without participating
/// in its control flow. All methods default to doing nothing so a logger only
/// needs to implement the hooks it cares about.
pub trait Logger {
    /// Called once, right before the first iteration.
    fn reset_logger(&mut self) -> SceneMctsResult<()> {
        Ok(())
    }

    /// Called after every completed iteration.
    fn log_mcts(&mut self, iter: usize, last_score: f64, last_depth: usize, tree: &Tree) -> SceneMctsResult<()>;

    /// Called once, after the last iteration, before the final refinement pass.
    fn log_final(&mut self, tree: &Tree) -> SceneMctsResult<()>;

    /// Called once, with the proposals making up the best path.
    fn export_solution(&mut self, best_proposals: &[Proposal]) -> SceneMctsResult<()>;

    /// A free-form message, used by callers that want to surface something
    /// outside the fixed per-iteration/final hooks above.
    fn print_to_log(&mut self, message: &str) -> SceneMctsResult<()>;
}

/// A [`Logger`] that discards everything. The default for
/// [`MCTSDriver::new`](crate::MCTSDriver::new).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log_mcts(&mut self, _iter: usize, _last_score: f64, _last_depth: usize, _tree: &Tree) -> SceneMctsResult<()> {
        Ok(())
    }

    fn log_final(&mut self, _tree: &Tree) -> SceneMctsResult<()> {
        Ok(())
    }

    fn export_solution(&mut self, _best_proposals: &[Proposal]) -> SceneMctsResult<()> {
        Ok(())
    }

    fn print_to_log(&mut self, _message: &str) -> SceneMctsResult<()> {
        Ok(())
    }
}

/// A [`Logger`] that writes human-readable lines to any [`std::io::Write`].
pub struct WriterLogger<W: Write> {
    writer: W,
}

impl<W: Write> WriterLogger<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Logger for WriterLogger<W> {
    fn reset_logger(&mut self) -> SceneMctsResult<()> {
        writeln!(self.writer, "--- starting search ---")?;
        Ok(())
    }

    fn log_mcts(&mut self, iter: usize, last_score: f64, last_depth: usize, tree: &Tree) -> SceneMctsResult<()> {
        writeln!(
            self.writer,
            "iter {iter}: last_score={last_score:.4} last_depth={last_depth} nodes={} root_vis_n={}",
            tree.allocator.size(),
            tree.allocator.get_node(tree.root).vis_n,
        )?;
        Ok(())
    }

    fn log_final(&mut self, tree: &Tree) -> SceneMctsResult<()> {
        writeln!(
            self.writer,
            "--- search done: {} nodes, root visited {} times ---",
            tree.allocator.size(),
            tree.allocator.get_node(tree.root).vis_n,
        )?;
        Ok(())
    }

    fn export_solution(&mut self, best_proposals: &[Proposal]) -> SceneMctsResult<()> {
        let joined = best_proposals
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        writeln!(self.writer, "solution: {joined}")?;
        Ok(())
    }

    fn print_to_log(&mut self, message: &str) -> SceneMctsResult<()> {
        writeln!(self.writer, "{message}")?;
        Ok(())
    }
}
