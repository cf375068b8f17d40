use crate::{Proposal, ProposalPool, RefinementHandle, SceneMctsResult};

/// A snapshot of a [`Game`]'s mutable state: the live pool and the sequence
/// selected so far. `get_state`/`set_state` pass this by value so the driver
/// can clone it defensively whenever it needs to preserve a snapshot across
/// further mutation (e.g. before a simulation batch).
#[derive(Clone, Debug, Default)]
pub struct GameState {
    pub pool: ProposalPool,
    pub sequence: Vec<Proposal>,
}

/// The domain collaborator the engine drives.
///
/// This is the only abstract contract the engine depends on: the consumer
/// supplies the proposal set, the incompatibility/neighbor relations baked
/// into those proposals, and a scoring function over complete selections.
/// Everything here is a state machine over a single mutable `Game` instance,
/// exclusively owned by the driver for the duration of a search — there is no
/// parallel access and no requirement that any of these calls be pure, though
/// a deterministic `calc_score_from_proposals` makes test fixtures far
/// easier to write.
pub trait Game {
    /// Enumerates every domain proposal. Invoked once, at search construction.
    fn generate_proposals(&mut self) -> ProposalPool;

    /// Resets the live pool to the full proposal set and clears the selected sequence.
    fn restart(&mut self);

    /// The proposals still legal given the current selection.
    fn pool(&self) -> &ProposalPool;

    /// The proposals selected so far, in selection order.
    fn sequence(&self) -> &[Proposal];

    /// Snapshots the current pool and sequence.
    fn get_state(&self) -> GameState;

    /// Restores a previously captured snapshot.
    fn set_state(&mut self, state: GameState);

    /// Applies `proposal`: if it is not a special marker, appends it to the
    /// selected sequence; in all cases narrows the pool to
    /// `current_pool \ proposal.incompatible()`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneMctsError::ProposalNotInPool`](crate::SceneMctsError::ProposalNotInPool)
    /// if `proposal` is neither in the current pool nor a special marker.
    fn step(&mut self, proposal: &Proposal) -> SceneMctsResult<()>;

    /// Scores `sequence` (defaulting to the current selected sequence). When
    /// `refinement` is supplied, the implementation may invoke it before
    /// scoring to tune continuous parameters attached to the selection.
    fn calc_score_from_proposals(
        &mut self,
        sequence: Option<&[Proposal]>,
        refinement: Option<&mut dyn RefinementHandle>,
    ) -> f64;

    /// Computes a loss (rather than a score) for `sequence`, suitable as the
    /// objective for gradient-based refinement. Only used when refinement is
    /// enabled.
    fn calc_loss_from_proposals(&mut self, sequence: Option<&[Proposal]>) -> f64;

    /// Monotone-decreasing transform from a loss to a score.
    fn convert_loss_to_score(&self, loss: f64) -> f64;

    /// Constructs a fresh refinement handle for a newly reached leaf, if this
    /// `Game` supports gradient refinement. Defaults to `None`, i.e.
    /// refinement disabled.
    fn make_refinement_handle(&self) -> Option<Box<dyn RefinementHandle>> {
        None
    }
}
