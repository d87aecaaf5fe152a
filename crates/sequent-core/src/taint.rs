//! Derived taint computation
//!
//! Taint is a pure function of a node's epistemic state and its ancestors'
//! taint. The ledger may store `TaintRecomputed` events as an audit trail,
//! but replay without them reconstructs identical values from these rules.

use crate::entity::Node;
use crate::identifiers::NodeId;
use crate::schema::{EpistemicState, TaintState};
use std::collections::BTreeMap;

/// Compute a node's taint from its own epistemic state and the taint of
/// its ancestors (root first).
///
/// Rules, in priority order:
/// 1. refuted or archived → unresolved
/// 2. admitted → self-admitted
/// 3. any ancestor self-admitted or tainted → tainted
/// 4. any ancestor unresolved → unresolved
/// 5. otherwise clean
pub fn compute(epistemic: EpistemicState, ancestors: &[TaintState]) -> TaintState {
    match epistemic {
        EpistemicState::Refuted | EpistemicState::Archived => TaintState::Unresolved,
        EpistemicState::Admitted => TaintState::SelfAdmitted,
        _ => {
            if ancestors
                .iter()
                .any(|t| matches!(t, TaintState::SelfAdmitted | TaintState::Tainted))
            {
                TaintState::Tainted
            } else if ancestors.iter().any(|t| *t == TaintState::Unresolved) {
                TaintState::Unresolved
            } else {
                TaintState::Clean
            }
        }
    }
}

/// Recompute pure taint for every node.
///
/// Iterates in id order, which places every parent before its children,
/// so ancestor values are always available from this pass.
pub fn recompute_all(nodes: &BTreeMap<NodeId, Node>) -> BTreeMap<NodeId, TaintState> {
    let mut computed: BTreeMap<NodeId, TaintState> = BTreeMap::new();
    for (id, node) in nodes {
        let ancestors: Vec<TaintState> = id
            .ancestors()
            .iter()
            .filter_map(|ancestor| computed.get(ancestor).copied())
            .collect();
        computed.insert(id.clone(), compute(node.epistemic, &ancestors));
    }
    computed
}

/// Re-evaluate the changed node and every descendant, returning only the
/// nodes whose taint actually differs from the stored value, in id order.
pub fn propagate(changed: &NodeId, nodes: &BTreeMap<NodeId, Node>) -> Vec<(NodeId, TaintState)> {
    let computed = recompute_all(nodes);
    computed
        .into_iter()
        .filter(|(id, _)| id == changed || changed.is_ancestor_of(id))
        .filter(|(id, taint)| nodes.get(id).map(|n| n.taint) != Some(*taint))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Node;
    use crate::schema::{InferenceRule, NodeKind};
    use crate::timestamp::Timestamp;

    fn tree(states: &[(&str, EpistemicState)]) -> BTreeMap<NodeId, Node> {
        states
            .iter()
            .map(|(id, epistemic)| {
                let id = NodeId::parse(id).unwrap();
                let mut node = Node::new(
                    id.clone(),
                    NodeKind::Claim,
                    "s",
                    InferenceRule::ModusPonens,
                    Timestamp::now(),
                )
                .unwrap();
                node.epistemic = *epistemic;
                (id, node)
            })
            .collect()
    }

    #[test]
    fn own_state_dominates() {
        assert_eq!(
            compute(EpistemicState::Refuted, &[TaintState::Clean]),
            TaintState::Unresolved
        );
        assert_eq!(
            compute(EpistemicState::Archived, &[]),
            TaintState::Unresolved
        );
        assert_eq!(
            compute(EpistemicState::Admitted, &[TaintState::Tainted]),
            TaintState::SelfAdmitted
        );
    }

    #[test]
    fn ancestor_taint_flows_down() {
        assert_eq!(
            compute(EpistemicState::Pending, &[TaintState::SelfAdmitted]),
            TaintState::Tainted
        );
        assert_eq!(
            compute(EpistemicState::Pending, &[TaintState::Tainted]),
            TaintState::Tainted
        );
        assert_eq!(
            compute(EpistemicState::Pending, &[TaintState::Unresolved]),
            TaintState::Unresolved
        );
        // Admitted-or-tainted ancestors win over unresolved ones.
        assert_eq!(
            compute(
                EpistemicState::Pending,
                &[TaintState::Unresolved, TaintState::Tainted]
            ),
            TaintState::Tainted
        );
        assert_eq!(
            compute(EpistemicState::Validated, &[TaintState::Clean]),
            TaintState::Clean
        );
    }

    #[test]
    fn admitted_root_taints_descendants() {
        let nodes = tree(&[
            ("1", EpistemicState::Admitted),
            ("1.1", EpistemicState::Pending),
            ("1.1.1", EpistemicState::Pending),
        ]);
        let computed = recompute_all(&nodes);
        assert_eq!(computed[&NodeId::parse("1").unwrap()], TaintState::SelfAdmitted);
        assert_eq!(computed[&NodeId::parse("1.1").unwrap()], TaintState::Tainted);
        assert_eq!(
            computed[&NodeId::parse("1.1.1").unwrap()],
            TaintState::Tainted
        );
    }

    #[test]
    fn propagate_reports_only_changes_in_subtree() {
        let mut nodes = tree(&[
            ("1", EpistemicState::Pending),
            ("1.1", EpistemicState::Admitted),
            ("1.1.1", EpistemicState::Pending),
            ("1.2", EpistemicState::Pending),
        ]);
        // Stored values are stale everywhere (all clean).
        let changed = NodeId::parse("1.1").unwrap();
        let diffs = propagate(&changed, &nodes);
        assert_eq!(
            diffs,
            vec![
                (NodeId::parse("1.1").unwrap(), TaintState::SelfAdmitted),
                (NodeId::parse("1.1.1").unwrap(), TaintState::Tainted),
            ],
            "sibling 1.2 and parent 1 are untouched"
        );

        // Apply the diffs; a second propagation is a no-op.
        for (id, taint) in diffs {
            if let Some(node) = nodes.get_mut(&id) {
                node.taint = taint;
            }
        }
        assert!(propagate(&changed, &nodes).is_empty());
    }
}
