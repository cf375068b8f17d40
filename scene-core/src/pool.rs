use std::collections::HashSet;

use crate::{Proposal, ProposalId};

/// An insertion-ordered set of proposals.
///
/// Order matters: the first surviving element after a filtering step seeds
/// the next tree level's candidate computation (see the Tree's child
/// materialization rules). Union-like construction and the `intersection`/
/// `difference` operations below all preserve the order of the left-hand
/// pool's surviving members; duplicates (by id) are silently collapsed on
/// insertion.
#[derive(Clone, Debug, Default)]
pub struct ProposalPool {
    items: Vec<Proposal>,
    index: HashSet<ProposalId>,
}

impl ProposalPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_proposals(items: impl IntoIterator<Item = Proposal>) -> Self {
        let mut pool = Self::new();
        for item in items {
            pool.push(item);
        }
        pool
    }

    /// Appends `proposal` unless a proposal with the same id is already present.
    pub fn push(&mut self, proposal: Proposal) {
        if self.index.insert(proposal.id().clone()) {
            self.items.push(proposal);
        }
    }

    #[must_use]
    pub fn contains(&self, id: &ProposalId) -> bool {
        self.index.contains(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Proposal> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Proposal> {
        self.items.iter()
    }

    /// Keeps only the first `len` proposals in insertion order.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.items.len() {
            return;
        }
        self.items.truncate(len);
        self.index = self.items.iter().map(|p| p.id().clone()).collect();
    }

    /// `self ∩ {p : p.id() ∈ ids}`, preserving `self`'s order.
    #[must_use]
    pub fn intersection_with_ids(&self, ids: &HashSet<ProposalId>) -> Self {
        Self::from_proposals(self.items.iter().filter(|p| ids.contains(p.id())).cloned())
    }

    /// `self \ {p : p.id() ∈ ids}`, preserving `self`'s order.
    #[must_use]
    pub fn difference_with_ids(&self, ids: &HashSet<ProposalId>) -> Self {
        Self::from_proposals(self.items.iter().filter(|p| !ids.contains(p.id())).cloned())
    }

    /// The pool remaining after selecting `proposal`: everything incompatible
    /// with it (including itself) is removed.
    #[must_use]
    pub fn remove_incompatible(&self, proposal: &Proposal) -> Self {
        self.difference_with_ids(proposal.incompatible())
    }
}

impl<'pool> IntoIterator for &'pool ProposalPool {
    type Item = &'pool Proposal;
    type IntoIter = std::slice::Iter<'pool, Proposal>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ProposalKind;

    fn p(id: &str) -> Proposal {
        Proposal::new(id, ProposalKind::Other)
    }

    #[test]
    fn intersection_preserves_left_operand_order() {
        let pool = ProposalPool::from_proposals([p("c"), p("a"), p("b")]);
        let ids: HashSet<ProposalId> = ["a", "b"].iter().map(|s| ProposalId::from(*s)).collect();

        let result = pool.intersection_with_ids(&ids);
        let ordered: Vec<_> = result.iter().map(|p| p.id().to_string()).collect();
        assert_eq!(ordered, vec!["a", "b"]);
    }

    #[test]
    fn difference_preserves_left_operand_order() {
        let pool = ProposalPool::from_proposals([p("c"), p("a"), p("b")]);
        let ids: HashSet<ProposalId> = ["a"].iter().map(|s| ProposalId::from(*s)).collect();

        let result = pool.difference_with_ids(&ids);
        let ordered: Vec<_> = result.iter().map(|p| p.id().to_string()).collect();
        assert_eq!(ordered, vec!["c", "b"]);
    }

    #[test]
    fn remove_incompatible_drops_the_proposal_itself() {
        let chosen = p("a");
        let pool = ProposalPool::from_proposals([p("a"), p("b")]);
        let remaining = pool.remove_incompatible(&chosen);
        assert!(!remaining.contains(chosen.id()));
        assert!(remaining.contains(&ProposalId::from("b")));
    }

    #[test]
    fn push_collapses_duplicate_ids() {
        let mut pool = ProposalPool::new();
        pool.push(p("a"));
        pool.push(p("a"));
        assert_eq!(pool.len(), 1);
    }
}
