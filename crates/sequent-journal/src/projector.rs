//! Deterministic replay of the ledger into a [`ProofState`]
//!
//! The projector wires stored fields into the state and recomputes
//! derived taint on a final pass. It does not enforce service-level
//! semantics: a well-formed ledger is trusted, and a ledger that
//! references unknown nodes or skips sequences is rejected as corrupt.

use crate::event::{Event, EventKind};
use crate::state::ProofState;
use sequent_core::schema::{EpistemicState, WorkflowState};
use sequent_core::{taint, ChallengeStatus, NodeId, ProofError, Result};
use tracing::debug;

/// Replay an event prefix into a state snapshot.
///
/// Deterministic: the same events yield a structurally identical state
/// on every run and platform. Stored `TaintRecomputed` values win; nodes
/// that never received one get the pure taint function's value on the
/// final pass.
pub fn replay(events: &[Event]) -> Result<ProofState> {
    let mut state = ProofState::default();

    for event in events {
        let expected = state.latest_sequence + 1;
        if event.sequence != expected {
            return Err(ProofError::storage(format!(
                "ledger sequence gap: expected {expected}, found {}",
                event.sequence
            )));
        }
        apply(&mut state, event)?;
        state.latest_sequence = event.sequence;
    }

    let computed = taint::recompute_all(&state.nodes);
    for (id, value) in computed {
        // Audited nodes keep their stored value.
        if state.taint_audit.contains_key(&id) {
            continue;
        }
        if let Some(node) = state.nodes.get_mut(&id) {
            node.taint = value;
        }
    }

    debug!(
        nodes = state.nodes.len(),
        latest = state.latest_sequence,
        "replay complete"
    );
    Ok(state)
}

fn apply(state: &mut ProofState, event: &Event) -> Result<()> {
    match &event.kind {
        EventKind::ProofInitialized { conjecture, .. } => {
            state.conjecture = Some(conjecture.clone());
        }
        EventKind::NodeCreated { node } => {
            if state.nodes.contains_key(&node.id) {
                return Err(corrupt(format!("duplicate node {}", node.id)));
            }
            state.nodes.insert(node.id.clone(), node.clone());
        }
        EventKind::NodesClaimed { ids, owner, expiry } => {
            for id in ids {
                let node = node_mut(state, id)?;
                node.workflow = WorkflowState::Claimed;
                node.claimed_by = Some(owner.clone());
                node.claim_expiry = Some(*expiry);
            }
        }
        EventKind::NodeClaimRefreshed { id, new_expiry, .. } => {
            let node = node_mut(state, id)?;
            node.claim_expiry = Some(*new_expiry);
        }
        EventKind::NodesReleased { ids } => {
            for id in ids {
                let node = node_mut(state, id)?;
                node.workflow = WorkflowState::Available;
                node.claimed_by = None;
                node.claim_expiry = None;
            }
        }
        EventKind::NodeValidated { id, .. } => {
            node_mut(state, id)?.epistemic = EpistemicState::Validated;
        }
        EventKind::NodeAdmitted { id } => {
            node_mut(state, id)?.epistemic = EpistemicState::Admitted;
        }
        EventKind::NodeRefuted { id } => {
            node_mut(state, id)?.epistemic = EpistemicState::Refuted;
        }
        EventKind::NodeArchived { id } => {
            node_mut(state, id)?.epistemic = EpistemicState::Archived;
        }
        EventKind::NodeAmended { amendment } => {
            let node = node_mut(state, &amendment.node)?;
            node.statement = amendment.new_statement.clone();
            state
                .amendments
                .entry(amendment.node.clone())
                .or_default()
                .push(amendment.clone());
        }
        EventKind::DefAdded { definition } => {
            state
                .definitions
                .insert(definition.name.clone(), definition.clone());
        }
        EventKind::LemmaExtracted { lemma } => {
            state.lemmas.push(lemma.clone());
        }
        EventKind::ChallengeRaised { challenge } => {
            state
                .challenges
                .entry(challenge.node.clone())
                .or_default()
                .push(challenge.clone());
        }
        EventKind::ChallengeAccepted { id, by } => {
            resolve_challenge(state, id, ChallengeStatus::Accepted, by.clone())?;
        }
        EventKind::ChallengeWithdrawn { id, by } => {
            resolve_challenge(state, id, ChallengeStatus::Withdrawn, by.clone())?;
        }
        EventKind::ChallengeOverridden { id, by } => {
            resolve_challenge(state, id, ChallengeStatus::Overridden, by.clone())?;
        }
        EventKind::TaintRecomputed { id, taint } => {
            node_mut(state, id)?.taint = *taint;
            state.taint_audit.insert(id.clone(), *taint);
        }
        EventKind::RefinementRequested { id, .. } => {
            node_mut(state, id)?.epistemic = EpistemicState::NeedsRefinement;
        }
    }
    Ok(())
}

fn node_mut<'a>(
    state: &'a mut ProofState,
    id: &NodeId,
) -> Result<&'a mut sequent_core::Node> {
    state
        .nodes
        .get_mut(id)
        .ok_or_else(|| corrupt(format!("event references unknown node {id}")))
}

fn resolve_challenge(
    state: &mut ProofState,
    id: &sequent_core::ChallengeId,
    status: ChallengeStatus,
    by: sequent_core::AgentId,
) -> Result<()> {
    for list in state.challenges.values_mut() {
        if let Some(challenge) = list.iter_mut().find(|c| &c.id == id) {
            challenge.status = status;
            challenge.resolved_by = Some(by);
            return Ok(());
        }
    }
    Err(corrupt(format!("event references unknown challenge {id}")))
}

fn corrupt(message: String) -> ProofError {
    ProofError::storage(format!("corrupt ledger: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequent_core::{
        AgentId, InferenceRule, Node, NodeKind, TaintState, Timestamp,
    };

    fn created(id: &str) -> EventKind {
        EventKind::NodeCreated {
            node: Node::new(
                NodeId::parse(id).unwrap(),
                NodeKind::Claim,
                "s",
                InferenceRule::ModusPonens,
                Timestamp::now(),
            )
            .unwrap(),
        }
    }

    fn events(kinds: Vec<EventKind>) -> Vec<Event> {
        kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Event::new(i as u64 + 1, kind))
            .collect()
    }

    #[test]
    fn replay_builds_nodes_and_sequence() {
        let log = events(vec![
            EventKind::ProofInitialized {
                conjecture: "P".into(),
                author: AgentId::from("alice"),
            },
            created("1"),
            created("1.1"),
        ]);
        let state = replay(&log).unwrap();
        assert!(state.is_initialized());
        assert_eq!(state.latest_sequence(), 3);
        assert_eq!(state.nodes.len(), 2);
    }

    #[test]
    fn sequence_gap_is_rejected() {
        let mut log = events(vec![created("1")]);
        log[0].sequence = 2;
        assert!(replay(&log).is_err());
    }

    #[test]
    fn event_against_missing_node_is_corrupt() {
        let log = events(vec![EventKind::NodeAdmitted {
            id: NodeId::root(),
        }]);
        assert!(replay(&log).is_err());
    }

    #[test]
    fn admit_event_yields_pure_taint_without_stored_events() {
        let log = events(vec![
            created("1"),
            created("1.1"),
            EventKind::NodeAdmitted {
                id: NodeId::root(),
            },
        ]);
        let state = replay(&log).unwrap();
        assert_eq!(
            state.get(&NodeId::root()).unwrap().taint,
            TaintState::SelfAdmitted
        );
        assert_eq!(
            state.get(&NodeId::parse("1.1").unwrap()).unwrap().taint,
            TaintState::Tainted
        );
    }

    #[test]
    fn stored_taint_event_wins_over_pure_value() {
        // A pinned value survives even where the pure rule disagrees;
        // the ledger's audit record is authoritative for replay.
        let log = events(vec![
            created("1"),
            EventKind::TaintRecomputed {
                id: NodeId::root(),
                taint: TaintState::Unresolved,
            },
        ]);
        let state = replay(&log).unwrap();
        assert_eq!(
            state.get(&NodeId::root()).unwrap().taint,
            TaintState::Unresolved
        );
    }

    #[test]
    fn amendment_updates_statement_and_log() {
        let amendment = sequent_core::Amendment::new(
            NodeId::root(),
            "s",
            "s, corrected",
            AgentId::from("alice"),
        )
        .unwrap();
        let log = events(vec![
            created("1"),
            EventKind::NodeAmended {
                amendment: amendment.clone(),
            },
        ]);
        let state = replay(&log).unwrap();
        assert_eq!(state.get(&NodeId::root()).unwrap().statement, "s, corrected");
        assert_eq!(state.amendment_history(&NodeId::root()), &[amendment]);
    }
}
