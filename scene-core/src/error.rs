use thiserror::Error;

use crate::ProposalId;

/// Result alias used throughout the engine's public surface.
pub type SceneMctsResult<T> = Result<T, SceneMctsError>;

/// Every contract violation the driver can observe.
///
/// There are no recoverable errors inside the driver: a `SceneMctsError` is a
/// fatal condition that must halt the run. Genuinely internal invariants that
/// hold by construction regardless of collaborator behavior (e.g. "a
/// just-materialized child list is never empty") are enforced with
/// `debug_assert!` instead of a variant here.
#[derive(Debug, Error)]
pub enum SceneMctsError {
    /// `Game::step` was called with a proposal that is neither a member of
    /// the current pool nor a special marker.
    #[error("proposal {proposal:?} is not in the current pool and is not a special marker")]
    ProposalNotInPool { proposal: ProposalId },

    /// The tree cursor was asked to visit the parent of the root node.
    #[error("cannot visit the parent of the root node")]
    VisitParentOfRoot,

    /// Every child of the current node is locked and locked descent is
    /// disabled. The outer loop already guards on root-lock, so this is
    /// believed unreachable in correct usage; it exists to fail loudly if
    /// that invariant is ever violated.
    #[error("descent halted: every child is locked and locked descent is disabled")]
    DescentHalted,

    /// Settings that cannot produce a valid search, caught before `run()` starts.
    #[error("invalid MCTS settings: {reason}")]
    InvalidSettings { reason: &'static str },

    /// A logger or other collaborator failed on a write.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
