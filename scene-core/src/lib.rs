mod error;
mod game;
mod pool;
mod proposal;
mod refinement;

pub use error::{SceneMctsError, SceneMctsResult};
pub use game::{Game, GameState};
pub use pool::ProposalPool;
pub use proposal::{Proposal, ProposalId, ProposalKind};
pub use refinement::RefinementHandle;
