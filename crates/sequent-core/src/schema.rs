//! Closed enumerations and transition validators
//!
//! The transition tables in this module are the sole authority on which
//! workflow and epistemic moves are legal. The service never open-codes
//! string comparisons against these states.

use crate::errors::ProofError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural role of a node in the proof tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// An ordinary claim to be justified by its children
    Claim,
    /// Opens a local assumption scope
    LocalAssume,
    /// Closes the nearest open local assumption
    LocalDischarge,
    /// One branch of a case analysis
    Case,
    /// Terminal node; requires an empty assumption scope
    Qed,
    /// Placeholder marking a gap that needs further refinement
    NeedsRefinement,
}

/// Inference rule justifying a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InferenceRule {
    /// The root statement; asserted, not derived
    Conjecture,
    ModusPonens,
    AndIntro,
    AndElim,
    OrIntro,
    OrElim,
    ImplicationIntro,
    UniversalIntro,
    UniversalElim,
    ExistentialIntro,
    ExistentialElim,
    Induction,
    CaseAnalysis,
    Contradiction,
    Rewrite,
    DefinitionExpansion,
    ExternalCitation,
    /// Accepted without derivation; the only rule that introduces taint
    Admitted,
}

/// A node's availability for work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowState {
    /// Free for any agent to claim
    Available,
    /// Exclusively held by one agent until released or the claim lapses
    Claimed,
    /// Reserved for policy layers; never auto-entered by the engine
    Blocked,
}

/// A node's judgment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpistemicState {
    /// Awaiting judgment
    Pending,
    /// Accepted by a verifier
    Validated,
    /// Accepted without full verification
    Admitted,
    /// Judged false
    Refuted,
    /// Retired without judgment
    Archived,
    /// Sent back for further refinement
    NeedsRefinement,
}

/// Derived trust status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaintState {
    /// No admitted or unresolved material above or at this node
    Clean,
    /// This node itself was admitted
    SelfAdmitted,
    /// An ancestor was admitted or tainted
    Tainted,
    /// This node or an ancestor is refuted or archived
    Unresolved,
}

/// Severity of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeSeverity {
    Note,
    Minor,
    Major,
    Critical,
}

/// Aspect of a node a challenge targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeAspect {
    Statement,
    Inference,
    Context,
    Dependencies,
    Scope,
    Gap,
    TypeError,
    Domain,
    Completeness,
}

/// Lifecycle status of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeStatus {
    /// Raised and unresolved
    Open,
    /// Upheld by a verifier
    Accepted,
    /// Retracted by the challenger
    Withdrawn,
    /// Dismissed by a verifier
    Overridden,
}

impl fmt::Display for EpistemicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Admitted => "admitted",
            Self::Refuted => "refuted",
            Self::Archived => "archived",
            Self::NeedsRefinement => "needs-refinement",
        };
        write!(f, "{text}")
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Available => "available",
            Self::Claimed => "claimed",
            Self::Blocked => "blocked",
        };
        write!(f, "{text}")
    }
}

impl fmt::Display for TaintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Clean => "clean",
            Self::SelfAdmitted => "self-admitted",
            Self::Tainted => "tainted",
            Self::Unresolved => "unresolved",
        };
        write!(f, "{text}")
    }
}

/// True if `state` accepts no further transitions except the explicit
/// validated → needs-refinement refinement request.
pub fn is_terminal(state: EpistemicState) -> bool {
    matches!(
        state,
        EpistemicState::Validated
            | EpistemicState::Admitted
            | EpistemicState::Refuted
            | EpistemicState::Archived
    )
}

/// True if the epistemic transition `from → to` is legal.
pub fn epistemic_transition_allowed(from: EpistemicState, to: EpistemicState) -> bool {
    use EpistemicState::*;
    match (from, to) {
        (Pending, Validated | Admitted | Refuted | Archived | NeedsRefinement) => true,
        (NeedsRefinement, Validated | Admitted | Refuted | Archived) => true,
        // The only way out of a terminal state.
        (Validated, NeedsRefinement) => true,
        _ => false,
    }
}

/// Validate an epistemic transition, or fail with a schema violation.
pub fn validate_epistemic_transition(
    from: EpistemicState,
    to: EpistemicState,
) -> Result<(), ProofError> {
    if epistemic_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(ProofError::schema_violation(format!(
            "illegal epistemic transition {from} -> {to}"
        )))
    }
}

/// True if the workflow transition `from → to` is legal.
pub fn workflow_transition_allowed(from: WorkflowState, to: WorkflowState) -> bool {
    use WorkflowState::*;
    match (from, to) {
        (Available, Claimed) | (Claimed, Available) => true,
        // Entering and leaving blocked is policy-gated above the engine.
        (Available | Claimed, Blocked) | (Blocked, Available) => true,
        _ => false,
    }
}

/// Validate a workflow transition, or fail with a schema violation.
pub fn validate_workflow_transition(
    from: WorkflowState,
    to: WorkflowState,
) -> Result<(), ProofError> {
    if workflow_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(ProofError::schema_violation(format!(
            "illegal workflow transition {from} -> {to}"
        )))
    }
}

/// True if this node kind opens a local assumption scope.
pub fn opens_scope(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::LocalAssume)
}

/// True if this node kind closes a local assumption scope.
pub fn closes_scope(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::LocalDischarge)
}

/// True if this node kind terminates a branch of the proof.
pub fn is_final(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Qed)
}

/// True if a node justified by this rule is tainted by construction.
pub fn introduces_taint(rule: InferenceRule) -> bool {
    matches!(rule, InferenceRule::Admitted)
}

/// True if an open challenge of this severity blocks acceptance.
pub fn severity_blocks_acceptance(severity: ChallengeSeverity) -> bool {
    matches!(
        severity,
        ChallengeSeverity::Critical | ChallengeSeverity::Major
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_EPISTEMIC: [EpistemicState; 6] = [
        EpistemicState::Pending,
        EpistemicState::Validated,
        EpistemicState::Admitted,
        EpistemicState::Refuted,
        EpistemicState::Archived,
        EpistemicState::NeedsRefinement,
    ];

    #[test]
    fn pending_fans_out_to_every_judgment() {
        for to in [
            EpistemicState::Validated,
            EpistemicState::Admitted,
            EpistemicState::Refuted,
            EpistemicState::Archived,
            EpistemicState::NeedsRefinement,
        ] {
            assert!(epistemic_transition_allowed(EpistemicState::Pending, to));
        }
    }

    #[test]
    fn needs_refinement_reaches_terminals_only() {
        assert!(epistemic_transition_allowed(
            EpistemicState::NeedsRefinement,
            EpistemicState::Validated
        ));
        assert!(!epistemic_transition_allowed(
            EpistemicState::NeedsRefinement,
            EpistemicState::Pending
        ));
        assert!(!epistemic_transition_allowed(
            EpistemicState::NeedsRefinement,
            EpistemicState::NeedsRefinement
        ));
    }

    #[test]
    fn terminals_are_sticky() {
        for from in ALL_EPISTEMIC.into_iter().filter(|s| is_terminal(*s)) {
            for to in ALL_EPISTEMIC {
                let allowed = epistemic_transition_allowed(from, to);
                let refinement_request =
                    from == EpistemicState::Validated && to == EpistemicState::NeedsRefinement;
                assert_eq!(allowed, refinement_request, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn no_self_transitions() {
        for state in ALL_EPISTEMIC {
            assert!(!epistemic_transition_allowed(state, state), "{state}");
        }
    }

    #[test]
    fn workflow_round_trips_between_available_and_claimed() {
        assert!(workflow_transition_allowed(
            WorkflowState::Available,
            WorkflowState::Claimed
        ));
        assert!(workflow_transition_allowed(
            WorkflowState::Claimed,
            WorkflowState::Available
        ));
        assert!(!workflow_transition_allowed(
            WorkflowState::Blocked,
            WorkflowState::Claimed
        ));
    }

    #[test]
    fn severity_blocking_split() {
        assert!(severity_blocks_acceptance(ChallengeSeverity::Critical));
        assert!(severity_blocks_acceptance(ChallengeSeverity::Major));
        assert!(!severity_blocks_acceptance(ChallengeSeverity::Minor));
        assert!(!severity_blocks_acceptance(ChallengeSeverity::Note));
    }

    #[test]
    fn scope_helpers() {
        assert!(opens_scope(NodeKind::LocalAssume));
        assert!(closes_scope(NodeKind::LocalDischarge));
        assert!(is_final(NodeKind::Qed));
        assert!(!opens_scope(NodeKind::Claim));
        assert!(introduces_taint(InferenceRule::Admitted));
        assert!(!introduces_taint(InferenceRule::ModusPonens));
    }

    #[test]
    fn enums_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_string(&NodeKind::LocalAssume).unwrap(),
            "\"local-assume\""
        );
        assert_eq!(
            serde_json::to_string(&EpistemicState::NeedsRefinement).unwrap(),
            "\"needs-refinement\""
        );
        assert_eq!(
            serde_json::to_string(&ChallengeAspect::TypeError).unwrap(),
            "\"type-error\""
        );
        assert_eq!(
            serde_json::to_string(&TaintState::SelfAdmitted).unwrap(),
            "\"self-admitted\""
        );
        assert_eq!(
            serde_json::to_string(&InferenceRule::ModusPonens).unwrap(),
            "\"modus-ponens\""
        );
    }
}
