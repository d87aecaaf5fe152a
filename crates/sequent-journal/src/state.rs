//! The projected proof state
//!
//! `ProofState` is the deterministic result of replaying the ledger,
//! optionally enriched with the ambient sidecar records (assumptions,
//! externals, pending definitions) that live outside the ledger. All
//! collections are `BTreeMap`/`Vec` so iteration order is identical
//! across runs and platforms.

use sequent_core::schema::{closes_scope, opens_scope};
use sequent_core::{
    Amendment, Assumption, Challenge, ChallengeId, Definition, External, Lemma, Node, NodeId,
    PendingDef, TaintState, Timestamp,
};
use std::collections::BTreeMap;

/// In-memory snapshot of the proof at a ledger sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProofState {
    /// Every node, keyed by id (parents sort before children)
    pub nodes: BTreeMap<NodeId, Node>,
    /// Append-only amendment log per node
    pub amendments: BTreeMap<NodeId, Vec<Amendment>>,
    /// Challenges per node, in raise order
    pub challenges: BTreeMap<NodeId, Vec<Challenge>>,
    /// Definitions keyed by name
    pub definitions: BTreeMap<String, Definition>,
    /// Extracted lemmas, in extraction order
    pub lemmas: Vec<Lemma>,
    /// The root conjecture, set by `ProofInitialized`
    pub conjecture: Option<String>,
    /// Ambient assumptions merged from the sidecar
    pub assumptions: Vec<Assumption>,
    /// Ambient externals merged from the sidecar
    pub externals: Vec<External>,
    /// Pending definition requests merged from the sidecar
    pub pending_defs: Vec<PendingDef>,
    /// Last taint value recorded by a `TaintRecomputed` event, per node.
    /// Nodes created but never audited are absent. The service diffs
    /// pure taint against this trail to decide which audit events to
    /// emit; `Node::taint` itself is always the derived value.
    pub taint_audit: BTreeMap<NodeId, TaintState>,
    /// Sequence of the last applied event (0 when empty)
    pub latest_sequence: u64,
}

impl ProofState {
    /// True once `ProofInitialized` has been applied.
    pub fn is_initialized(&self) -> bool {
        self.conjecture.is_some()
    }

    /// Look up a node.
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes in id order.
    pub fn all(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Sequence of the last applied event.
    pub fn latest_sequence(&self) -> u64 {
        self.latest_sequence
    }

    /// Direct children of `id`, in id order.
    pub fn children_of(&self, id: &NodeId) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|node| node.id.parent().as_ref() == Some(id))
            .collect()
    }

    /// Open critical/major challenges against `id`.
    pub fn blocking_challenges_for(&self, id: &NodeId) -> Vec<&Challenge> {
        self.challenges
            .get(id)
            .map(|list| list.iter().filter(|c| c.is_blocking()).collect())
            .unwrap_or_default()
    }

    /// The amendment log for `id`, oldest first.
    pub fn amendment_history(&self, id: &NodeId) -> &[Amendment] {
        self.amendments
            .get(id)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Find a challenge anywhere in the proof by id.
    pub fn challenge(&self, id: &ChallengeId) -> Option<&Challenge> {
        self.challenges
            .values()
            .flat_map(|list| list.iter())
            .find(|c| &c.id == id)
    }

    /// The open local assumptions in scope at `id`: local-assume
    /// ancestors (and the node itself) whose discharge has not appeared
    /// on the path. Discharges close the nearest open assume.
    pub fn open_scope(&self, id: &NodeId) -> Vec<NodeId> {
        let mut stack: Vec<NodeId> = Vec::new();
        let mut chain = id.ancestors();
        chain.push(id.clone());
        for link in chain {
            if let Some(node) = self.nodes.get(&link) {
                if opens_scope(node.kind) {
                    stack.push(link);
                } else if closes_scope(node.kind) {
                    stack.pop();
                }
            }
        }
        stack
    }

    /// Smallest k ≥ 1 such that `parent.k` does not exist yet.
    pub fn next_child_index(&self, parent: &NodeId) -> u32 {
        let mut k = 1;
        while self.nodes.contains_key(&parent.child(k)) {
            k += 1;
        }
        k
    }

    /// Nodes whose claim has lapsed as of `now`. Observational only: the
    /// ledger still records these as claimed.
    pub fn expired_claims(&self, now: &Timestamp) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|node| node.claim_expired(now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequent_core::{InferenceRule, NodeKind};

    fn state_with(kinds: &[(&str, NodeKind)]) -> ProofState {
        let mut state = ProofState::default();
        for (id, kind) in kinds {
            let id = NodeId::parse(id).unwrap();
            let node = Node::new(
                id.clone(),
                *kind,
                "s",
                InferenceRule::ModusPonens,
                Timestamp::now(),
            )
            .unwrap();
            state.nodes.insert(id, node);
        }
        state
    }

    #[test]
    fn scope_stacks_assumes_and_discharges() {
        let state = state_with(&[
            ("1", NodeKind::Claim),
            ("1.1", NodeKind::LocalAssume),
            ("1.1.1", NodeKind::Claim),
            ("1.1.1.1", NodeKind::LocalDischarge),
            ("1.1.1.1.1", NodeKind::Claim),
        ]);
        let assume = NodeId::parse("1.1").unwrap();
        assert_eq!(
            state.open_scope(&NodeId::parse("1.1.1").unwrap()),
            vec![assume.clone()]
        );
        // Past the discharge the scope is closed again.
        assert!(state
            .open_scope(&NodeId::parse("1.1.1.1.1").unwrap())
            .is_empty());
        assert_eq!(state.open_scope(&assume), vec![assume.clone()]);
    }

    #[test]
    fn next_child_index_skips_existing() {
        let state = state_with(&[("1", NodeKind::Claim), ("1.1", NodeKind::Claim)]);
        assert_eq!(state.next_child_index(&NodeId::root()), 2);
        assert_eq!(
            state.next_child_index(&NodeId::parse("1.1").unwrap()),
            1
        );
    }

    #[test]
    fn children_are_direct_only() {
        let state = state_with(&[
            ("1", NodeKind::Claim),
            ("1.1", NodeKind::Claim),
            ("1.1.1", NodeKind::Claim),
            ("1.2", NodeKind::Claim),
        ]);
        let children = state.children_of(&NodeId::root());
        let ids: Vec<String> = children.iter().map(|n| n.id.to_string()).collect();
        assert_eq!(ids, vec!["1.1", "1.2"]);
    }
}
