use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Stable identifier of a [`Proposal`]. Cheap to clone and share across the
/// pool, every incompatibility/neighbor set, and every tree node that carries
/// the proposal.
pub type ProposalId = Arc<str>;

/// What role a proposal plays in the tree.
///
/// Only [`ProposalKind::Other`] proposals participate in a scored selection;
/// the remaining three are synthesized by the tree as it searches and never
/// originate from a [`Game`](crate::Game).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProposalKind {
    /// The unique root of the search tree.
    Root,
    /// An "escape" child: skip the current cohort entirely.
    Esc,
    /// A terminal marker: the selection ending here is ready to be scored.
    End,
    /// An ordinary, domain-supplied proposal.
    Other,
}

impl ProposalKind {
    /// Whether this kind is one of the tree-synthesized markers (`Root`, `Esc`, `End`)
    /// rather than a domain proposal.
    #[must_use]
    pub const fn is_special(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// An atomic selectable item.
///
/// Identity, equality, and hashing are all by [`id`](Proposal::id) alone —
/// two proposals with the same id are the same proposal even if their
/// incompatible/neighbor sets were built up differently. The incompatible set
/// always contains the proposal's own id, so removing everything incompatible
/// with a chosen proposal also removes the proposal itself.
#[derive(Clone, Debug)]
pub struct Proposal {
    id: ProposalId,
    kind: ProposalKind,
    incompatible: HashSet<ProposalId>,
    neighbors: HashSet<ProposalId>,
}

impl Proposal {
    /// Creates a new proposal, self-incompatible and with no neighbors.
    pub fn new(id: impl Into<ProposalId>, kind: ProposalKind) -> Self {
        let id = id.into();
        let mut incompatible = HashSet::with_capacity(1);
        incompatible.insert(Arc::clone(&id));

        Self {
            id,
            kind,
            incompatible,
            neighbors: HashSet::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &ProposalId {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> ProposalKind {
        self.kind
    }

    #[must_use]
    pub fn is_special(&self) -> bool {
        self.kind.is_special()
    }

    pub fn add_incompatible(&mut self, other: ProposalId) {
        self.incompatible.insert(other);
    }

    pub fn add_neighbor(&mut self, other: ProposalId) {
        self.neighbors.insert(other);
    }

    #[must_use]
    pub const fn incompatible(&self) -> &HashSet<ProposalId> {
        &self.incompatible
    }

    #[must_use]
    pub const fn neighbors(&self) -> &HashSet<ProposalId> {
        &self.neighbors
    }

    #[must_use]
    pub fn is_incompatible_with(&self, id: &ProposalId) -> bool {
        self.incompatible.contains(id)
    }
}

impl PartialEq for Proposal {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Proposal {}

impl Hash for Proposal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
