//! Verifier operations
//!
//! Judgments (accept, admit, refute, archive), refinement requests, and
//! the challenge lifecycle. Every epistemic transition consults the
//! schema transition table and is followed by a taint pass whose
//! failures are suppressed — the judgment itself is already durable.

use crate::service::ProofService;
use sequent_core::schema::epistemic_transition_allowed;
use sequent_core::{
    AgentId, Challenge, ChallengeAspect, ChallengeId, ChallengeSeverity, ChallengeStatus,
    EpistemicState, Node, NodeId, ProofError, Result,
};
use sequent_journal::{EventKind, ProofState};
use tracing::info;

impl ProofService {
    /// Accept a node as validated.
    pub fn accept(&self, id: &NodeId) -> Result<()> {
        self.accept_with_note(id, None)
    }

    /// Accept a node as validated, recording a reviewer note.
    pub fn accept_with_note(&self, id: &NodeId, note: Option<String>) -> Result<()> {
        let state = self.snapshot_initialized()?;
        let node = Self::node(&state, id)?;
        Self::check_acceptance(&state, node)?;

        self.ledger().append_if_sequence(
            EventKind::NodeValidated {
                id: id.clone(),
                note,
            },
            state.latest_sequence(),
        )?;
        info!(node = %id, "node validated");
        self.emit_taint_updates(id);
        Ok(())
    }

    /// Accept several nodes in one best-effort batch. Preconditions are
    /// pre-checked per id against the same snapshot; a node whose
    /// acceptance depends on another entry of the batch must wait for a
    /// later call.
    pub fn accept_bulk(&self, ids: &[NodeId]) -> Result<()> {
        if ids.is_empty() {
            return Err(ProofError::empty_input("ids"));
        }
        let state = self.snapshot_initialized()?;
        for id in ids {
            let node = Self::node(&state, id)?;
            Self::check_acceptance(&state, node)?;
        }

        let outcome = self.ledger().append_batch_if_sequence(
            ids.iter()
                .map(|id| EventKind::NodeValidated {
                    id: id.clone(),
                    note: None,
                })
                .collect(),
            state.latest_sequence(),
        )?;
        let committed = outcome.committed.len();
        for id in ids.iter().take(committed) {
            self.emit_taint_updates(id);
        }
        match outcome.failure {
            None => Ok(()),
            Some(err) => Err(ProofError::storage(format!(
                "bulk accept interrupted after committing {committed} of {}: {err}",
                ids.len()
            ))),
        }
    }

    /// Admit a pending node without full verification.
    pub fn admit(&self, id: &NodeId) -> Result<()> {
        self.judge(id, EpistemicState::Admitted, |id| EventKind::NodeAdmitted { id })
    }

    /// Refute a pending node.
    pub fn refute(&self, id: &NodeId) -> Result<()> {
        self.judge(id, EpistemicState::Refuted, |id| EventKind::NodeRefuted { id })
    }

    /// Archive a pending or needs-refinement node.
    pub fn archive(&self, id: &NodeId) -> Result<()> {
        self.judge(id, EpistemicState::Archived, |id| EventKind::NodeArchived { id })
    }

    fn judge(
        &self,
        id: &NodeId,
        to: EpistemicState,
        make_event: impl FnOnce(NodeId) -> EventKind,
    ) -> Result<()> {
        let state = self.snapshot_initialized()?;
        let node = Self::node(&state, id)?;

        let allowed = match to {
            // One-shot judgments come from pending; archive also accepts
            // a node sent back for refinement.
            EpistemicState::Archived => matches!(
                node.epistemic,
                EpistemicState::Pending | EpistemicState::NeedsRefinement
            ),
            _ => node.epistemic == EpistemicState::Pending,
        };
        if !allowed || !epistemic_transition_allowed(node.epistemic, to) {
            return Err(ProofError::invalid_state(format!(
                "cannot move node {id} from {} to {to}",
                node.epistemic
            )));
        }

        self.ledger()
            .append_if_sequence(make_event(id.clone()), state.latest_sequence())?;
        info!(node = %id, state = %to, "node judged");
        self.emit_taint_updates(id);
        Ok(())
    }

    /// Send a validated node back for refinement.
    pub fn request_refinement(&self, id: &NodeId, reason: &str, by: &AgentId) -> Result<()> {
        Self::require_agent(by, "requester")?;
        if reason.trim().is_empty() {
            return Err(ProofError::empty_input("reason"));
        }
        let state = self.snapshot_initialized()?;
        let node = Self::node(&state, id)?;
        if node.epistemic != EpistemicState::Validated
            || !epistemic_transition_allowed(node.epistemic, EpistemicState::NeedsRefinement)
        {
            return Err(ProofError::invalid_state(format!(
                "refinement can only be requested on a validated node; {id} is {}",
                node.epistemic
            )));
        }

        self.ledger().append_if_sequence(
            EventKind::RefinementRequested {
                id: id.clone(),
                reason: reason.to_string(),
                requested_by: by.clone(),
            },
            state.latest_sequence(),
        )?;
        info!(node = %id, by = %by, "refinement requested");
        self.emit_taint_updates(id);
        Ok(())
    }

    /// Raise a challenge against one aspect of a node.
    pub fn raise_challenge(
        &self,
        node: &NodeId,
        aspect: ChallengeAspect,
        text: &str,
        severity: ChallengeSeverity,
        by: &AgentId,
    ) -> Result<ChallengeId> {
        let state = self.snapshot_initialized()?;
        Self::node(&state, node)?;
        let challenge = Challenge::new(node.clone(), aspect, text, severity, by.clone())?;
        let id = challenge.id.clone();

        self.ledger().append_if_sequence(
            EventKind::ChallengeRaised { challenge },
            state.latest_sequence(),
        )?;
        info!(node = %node, challenge = %id, severity = ?severity, "challenge raised");
        Ok(id)
    }

    /// Resolve an open challenge as accepted, withdrawn, or overridden.
    pub fn resolve_challenge(
        &self,
        id: &ChallengeId,
        resolution: ChallengeStatus,
        by: &AgentId,
    ) -> Result<()> {
        Self::require_agent(by, "resolver")?;
        let state = self.snapshot_initialized()?;
        let challenge = state
            .challenge(id)
            .ok_or_else(|| ProofError::invalid_state(format!("challenge {id} not found")))?;
        if challenge.status != ChallengeStatus::Open {
            return Err(ProofError::invalid_state(format!(
                "challenge {id} is already resolved"
            )));
        }

        let kind = match resolution {
            ChallengeStatus::Accepted => EventKind::ChallengeAccepted {
                id: id.clone(),
                by: by.clone(),
            },
            ChallengeStatus::Withdrawn => EventKind::ChallengeWithdrawn {
                id: id.clone(),
                by: by.clone(),
            },
            ChallengeStatus::Overridden => EventKind::ChallengeOverridden {
                id: id.clone(),
                by: by.clone(),
            },
            ChallengeStatus::Open => {
                return Err(ProofError::schema_violation(
                    "open is not a challenge resolution",
                ))
            }
        };
        self.ledger()
            .append_if_sequence(kind, state.latest_sequence())?;
        info!(challenge = %id, resolution = ?resolution, "challenge resolved");
        Ok(())
    }

    /// The acceptance preconditions of one node against a snapshot.
    fn check_acceptance(state: &ProofState, node: &Node) -> Result<()> {
        if !epistemic_transition_allowed(node.epistemic, EpistemicState::Validated) {
            return Err(ProofError::invalid_state(format!(
                "cannot validate node {} in state {}",
                node.id, node.epistemic
            )));
        }

        let blocking = state.blocking_challenges_for(&node.id);
        if !blocking.is_empty() {
            return Err(ProofError::BlockingChallenges {
                id: node.id.clone(),
                count: blocking.len(),
            });
        }

        let children = state.children_of(&node.id);
        if node.epistemic == EpistemicState::NeedsRefinement && children.is_empty() {
            return Err(ProofError::invalid_state(format!(
                "node {} needs refinement but has no children",
                node.id
            )));
        }

        let settled = |n: &Node| {
            matches!(
                n.epistemic,
                EpistemicState::Validated | EpistemicState::Admitted
            )
        };
        let mut pending: Vec<NodeId> = Vec::new();
        for dep in &node.validation_deps {
            match state.get(dep) {
                Some(target) if settled(target) => {}
                Some(target) => pending.push(target.id.clone()),
                None => {
                    return Err(ProofError::InvalidDependency {
                        reference: dep.to_string(),
                    })
                }
            }
        }
        for child in children {
            if !settled(child) {
                pending.push(child.id.clone());
            }
        }
        if !pending.is_empty() {
            pending.sort();
            pending.dedup();
            return Err(ProofError::ValidationPending {
                id: node.id.clone(),
                pending,
            });
        }
        Ok(())
    }
}
