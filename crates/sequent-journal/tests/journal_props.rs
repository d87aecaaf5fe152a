//! Property tests for replay determinism and taint purity.

#![allow(clippy::unwrap_used, missing_docs)]

use proptest::prelude::*;
use sequent_core::{
    taint, AgentId, EpistemicState, InferenceRule, Node, NodeId, NodeKind, Timestamp,
};
use sequent_journal::{replay, Event, EventKind};

/// Build a random tree shape: each entry picks its parent among the
/// nodes created so far.
fn tree_ids(parent_picks: &[usize]) -> Vec<NodeId> {
    let mut ids = vec![NodeId::root()];
    for pick in parent_picks {
        let parent = ids[pick % ids.len()].clone();
        let child_count = ids
            .iter()
            .filter(|id| id.parent().as_ref() == Some(&parent))
            .count() as u32;
        ids.push(parent.child(child_count + 1));
    }
    ids
}

/// One judgment per node: 0 = leave pending, 1 = admit, 2 = refute,
/// 3 = archive, 4 = validate.
fn judgment_event(id: &NodeId, judgment: u8) -> Option<EventKind> {
    match judgment % 5 {
        1 => Some(EventKind::NodeAdmitted { id: id.clone() }),
        2 => Some(EventKind::NodeRefuted { id: id.clone() }),
        3 => Some(EventKind::NodeArchived { id: id.clone() }),
        4 => Some(EventKind::NodeValidated {
            id: id.clone(),
            note: None,
        }),
        _ => None,
    }
}

fn build_events(parent_picks: &[usize], judgments: &[u8]) -> Vec<Event> {
    let ids = tree_ids(parent_picks);
    let mut kinds: Vec<EventKind> = vec![EventKind::ProofInitialized {
        conjecture: "the conjecture".to_string(),
        author: AgentId::from("init"),
    }];
    for id in &ids {
        kinds.push(EventKind::NodeCreated {
            node: Node::new(
                id.clone(),
                NodeKind::Claim,
                format!("statement {id}"),
                InferenceRule::ModusPonens,
                Timestamp::now(),
            )
            .unwrap(),
        });
    }
    for (index, id) in ids.iter().enumerate() {
        let judgment = judgments.get(index).copied().unwrap_or(0);
        if let Some(kind) = judgment_event(id, judgment) {
            kinds.push(kind);
        }
    }
    renumber(kinds)
}

fn renumber(kinds: Vec<EventKind>) -> Vec<Event> {
    kinds
        .into_iter()
        .enumerate()
        .map(|(i, kind)| Event::new(i as u64 + 1, kind))
        .collect()
}

proptest! {
    #[test]
    fn replay_is_deterministic(
        parent_picks in proptest::collection::vec(any::<usize>(), 0..24),
        judgments in proptest::collection::vec(any::<u8>(), 0..25),
    ) {
        let events = build_events(&parent_picks, &judgments);
        let first = replay(&events).unwrap();
        let second = replay(&events).unwrap();
        prop_assert_eq!(&first, &second);

        // Iteration order is id order, parents first.
        let ids: Vec<NodeId> = first.all().map(|n| n.id.clone()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        prop_assert_eq!(ids, sorted);
    }

    #[test]
    fn taint_matches_pure_rule_with_or_without_stored_events(
        parent_picks in proptest::collection::vec(any::<usize>(), 0..24),
        judgments in proptest::collection::vec(any::<u8>(), 0..25),
    ) {
        let base = build_events(&parent_picks, &judgments);
        let without = replay(&base).unwrap();

        // Emit the audit events the service would write, then replay the
        // enriched ledger: stored and derived taint must agree.
        let pure = taint::recompute_all(&without.nodes);
        let mut kinds: Vec<EventKind> = base.iter().map(|e| e.kind.clone()).collect();
        for (id, value) in &pure {
            kinds.push(EventKind::TaintRecomputed { id: id.clone(), taint: *value });
        }
        let with = replay(&renumber(kinds)).unwrap();

        for (id, node) in &with.nodes {
            prop_assert_eq!(node.taint, pure[id], "node {}", id);
            prop_assert_eq!(node.taint, without.nodes[id].taint, "node {}", id);
        }
    }

    #[test]
    fn replayed_epistemic_states_follow_judgments(
        parent_picks in proptest::collection::vec(any::<usize>(), 0..16),
        judgments in proptest::collection::vec(any::<u8>(), 0..17),
    ) {
        let events = build_events(&parent_picks, &judgments);
        let state = replay(&events).unwrap();
        let ids = tree_ids(&parent_picks);
        for (index, id) in ids.iter().enumerate() {
            let expected = match judgments.get(index).copied().unwrap_or(0) % 5 {
                1 => EpistemicState::Admitted,
                2 => EpistemicState::Refuted,
                3 => EpistemicState::Archived,
                4 => EpistemicState::Validated,
                _ => EpistemicState::Pending,
            };
            prop_assert_eq!(state.get(id).unwrap().epistemic, expected);
        }
    }
}
