//! Proof entities: nodes and the records attached to them
//!
//! Constructors validate their inputs and reject bad values with a typed
//! error; they never silently normalize. Mutation happens only through
//! ledger events applied by the projector.

use crate::errors::{ProofError, Result};
use crate::identifiers::{
    AgentId, AmendmentId, AssumptionId, ChallengeId, DefId, ExternalId, LemmaId, NodeId,
    PendingDefId,
};
use crate::schema::{
    severity_blocks_acceptance, ChallengeAspect, ChallengeSeverity, ChallengeStatus,
    EpistemicState, InferenceRule, NodeKind, TaintState, WorkflowState,
};
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ProofError::empty_input(field))
    } else {
        Ok(())
    }
}

/// The fundamental unit of the proof tree.
///
/// Nodes form a tree by [`NodeId::parent`]; `dependencies` and
/// `validation_deps` add DAG edges over the same node set. A node is
/// created once by a `NodeCreated` event and never destroyed — archiving
/// is an epistemic transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Position in the tree
    pub id: NodeId,
    /// Structural role
    pub kind: NodeKind,
    /// The statement being claimed (non-empty after trim)
    pub statement: String,
    /// Rule justifying this node
    pub inference: InferenceRule,
    /// Logical references to other nodes
    #[serde(default)]
    pub dependencies: Vec<NodeId>,
    /// Nodes that must be validated before this one can be accepted
    #[serde(default)]
    pub validation_deps: Vec<NodeId>,
    /// Availability for work
    pub workflow: WorkflowState,
    /// Judgment status
    pub epistemic: EpistemicState,
    /// Derived trust status
    pub taint: TaintState,
    /// Holder of the claim; present iff workflow is claimed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<AgentId>,
    /// When the claim lapses; present iff claimed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_expiry: Option<Timestamp>,
    /// Creation instant
    pub created: Timestamp,
}

impl Node {
    /// Create a fresh node in its initial state (available, pending, clean).
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        statement: impl Into<String>,
        inference: InferenceRule,
        created: Timestamp,
    ) -> Result<Self> {
        let statement = statement.into();
        require_non_empty("statement", &statement)?;
        Ok(Self {
            id,
            kind,
            statement,
            inference,
            dependencies: Vec::new(),
            validation_deps: Vec::new(),
            workflow: WorkflowState::Available,
            epistemic: EpistemicState::Pending,
            taint: TaintState::Clean,
            claimed_by: None,
            claim_expiry: None,
            created,
        })
    }

    /// Attach logical dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, deps: Vec<NodeId>) -> Self {
        self.dependencies = deps;
        self
    }

    /// Attach validation dependencies.
    #[must_use]
    pub fn with_validation_deps(mut self, deps: Vec<NodeId>) -> Self {
        self.validation_deps = deps;
        self
    }

    /// True if `owner` currently holds the claim on this node.
    pub fn is_claimed_by(&self, owner: &AgentId) -> bool {
        self.workflow == WorkflowState::Claimed && self.claimed_by.as_ref() == Some(owner)
    }

    /// True if the node is claimed but the expiry has passed.
    ///
    /// Expiry is observational: the ledger still shows the claim until a
    /// release or re-claim event lands.
    pub fn claim_expired(&self, now: &Timestamp) -> bool {
        self.workflow == WorkflowState::Claimed
            && self
                .claim_expiry
                .as_ref()
                .is_some_and(|expiry| expiry.is_before(now))
    }
}

/// Named content, referenced by `def:NAME` citations in statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub id: DefId,
    pub name: String,
    pub content: String,
    pub created: Timestamp,
}

impl Definition {
    /// Create a definition, rejecting empty names or content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let content = content.into();
        require_non_empty("definition name", &name)?;
        require_non_empty("definition content", &content)?;
        Ok(Self {
            id: DefId::generate(),
            name,
            content,
            created: Timestamp::now(),
        })
    }
}

/// A global ambient assumption, stored in the filesystem sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumption {
    pub id: AssumptionId,
    pub statement: String,
    pub created: Timestamp,
}

impl Assumption {
    /// Create an assumption, rejecting empty statements.
    pub fn new(statement: impl Into<String>) -> Result<Self> {
        let statement = statement.into();
        require_non_empty("assumption statement", &statement)?;
        Ok(Self {
            id: AssumptionId::generate(),
            statement,
            created: Timestamp::now(),
        })
    }
}

/// An external fact, citable from statements as `ext:ID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct External {
    pub id: ExternalId,
    /// Where the fact comes from (paper, library, oracle)
    pub source: String,
    pub statement: String,
    pub created: Timestamp,
}

impl External {
    /// Create an external record, rejecting empty source or statement.
    pub fn new(source: impl Into<String>, statement: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let statement = statement.into();
        require_non_empty("external source", &source)?;
        require_non_empty("external statement", &statement)?;
        Ok(Self {
            id: ExternalId::generate(),
            source,
            statement,
            created: Timestamp::now(),
        })
    }
}

/// A lemma extracted from a proof node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemma {
    pub id: LemmaId,
    pub statement: String,
    /// The node this lemma was extracted from
    pub source_node: NodeId,
    pub created: Timestamp,
}

impl Lemma {
    /// Create a lemma, rejecting empty statements.
    pub fn new(statement: impl Into<String>, source_node: NodeId) -> Result<Self> {
        let statement = statement.into();
        require_non_empty("lemma statement", &statement)?;
        Ok(Self {
            id: LemmaId::generate(),
            statement,
            source_node,
            created: Timestamp::now(),
        })
    }
}

/// A definition requested for a node but not yet authored.
///
/// Stored in the sidecar keyed by the requesting node's id, so provers
/// can author the definition out of band before it enters the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDef {
    pub id: PendingDefId,
    /// The node whose statement needs this definition
    pub node: NodeId,
    /// The `def:NAME` name being requested
    pub name: String,
    pub created: Timestamp,
}

impl PendingDef {
    /// Create a pending-definition request, rejecting empty names.
    pub fn new(node: NodeId, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        require_non_empty("pending definition name", &name)?;
        Ok(Self {
            id: PendingDefId::generate(),
            node,
            name,
            created: Timestamp::now(),
        })
    }
}

/// A challenge raised against one aspect of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    /// The challenged node
    pub node: NodeId,
    /// Which aspect of the node is contested
    pub aspect: ChallengeAspect,
    pub text: String,
    pub severity: ChallengeSeverity,
    pub raised_by: AgentId,
    pub status: ChallengeStatus,
    pub created: Timestamp,
    /// Who resolved the challenge, once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<AgentId>,
}

impl Challenge {
    /// Raise a new challenge, rejecting empty text or a blank challenger.
    pub fn new(
        node: NodeId,
        aspect: ChallengeAspect,
        text: impl Into<String>,
        severity: ChallengeSeverity,
        raised_by: AgentId,
    ) -> Result<Self> {
        let text = text.into();
        require_non_empty("challenge text", &text)?;
        if raised_by.is_blank() {
            return Err(ProofError::empty_input("challenger"));
        }
        Ok(Self {
            id: ChallengeId::generate(),
            node,
            aspect,
            text,
            severity,
            raised_by,
            status: ChallengeStatus::Open,
            created: Timestamp::now(),
            resolved_by: None,
        })
    }

    /// True if this challenge currently blocks acceptance of its node.
    pub fn is_blocking(&self) -> bool {
        self.status == ChallengeStatus::Open && severity_blocks_acceptance(self.severity)
    }
}

/// One entry in a node's append-only amendment log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amendment {
    pub id: AmendmentId,
    pub node: NodeId,
    pub previous_statement: String,
    pub new_statement: String,
    pub owner: AgentId,
    pub timestamp: Timestamp,
}

impl Amendment {
    /// Record a statement change.
    pub fn new(
        node: NodeId,
        previous_statement: impl Into<String>,
        new_statement: impl Into<String>,
        owner: AgentId,
    ) -> Result<Self> {
        let new_statement = new_statement.into();
        require_non_empty("amended statement", &new_statement)?;
        Ok(Self {
            id: AmendmentId::generate(),
            node,
            previous_statement: previous_statement.into(),
            new_statement,
            owner,
            timestamp: Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn node(id: &str) -> Node {
        Node::new(
            NodeId::parse(id).unwrap(),
            NodeKind::Claim,
            "P holds",
            InferenceRule::ModusPonens,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn new_node_starts_available_pending_clean() {
        let n = node("1");
        assert_eq!(n.workflow, WorkflowState::Available);
        assert_eq!(n.epistemic, EpistemicState::Pending);
        assert_eq!(n.taint, TaintState::Clean);
        assert!(n.claimed_by.is_none());
        assert!(n.claim_expiry.is_none());
    }

    #[test]
    fn blank_statement_is_rejected() {
        let err = Node::new(
            NodeId::root(),
            NodeKind::Claim,
            "   \t ",
            InferenceRule::ModusPonens,
            Timestamp::now(),
        )
        .unwrap_err();
        assert_matches!(err, ProofError::EmptyInput { .. });
    }

    #[test]
    fn claim_expiry_is_observational() {
        let mut n = node("1");
        let now = Timestamp::now();
        n.workflow = WorkflowState::Claimed;
        n.claimed_by = Some(AgentId::from("alice"));
        n.claim_expiry = Some(now.plus(time::Duration::hours(-1)));
        assert!(n.claim_expired(&now));
        assert!(n.is_claimed_by(&AgentId::from("alice")), "still the holder");
    }

    #[test]
    fn entity_constructors_validate_inputs() {
        assert!(Definition::new("group", "a set with an operation").is_ok());
        assert_matches!(
            Definition::new(" ", "x").unwrap_err(),
            ProofError::EmptyInput { .. }
        );
        assert_matches!(
            External::new("", "ZFC").unwrap_err(),
            ProofError::EmptyInput { .. }
        );
        assert_matches!(
            Lemma::new("\n", NodeId::root()).unwrap_err(),
            ProofError::EmptyInput { .. }
        );
    }

    #[test]
    fn open_major_challenge_blocks() {
        let c = Challenge::new(
            NodeId::root(),
            ChallengeAspect::Inference,
            "the implication does not follow",
            ChallengeSeverity::Major,
            AgentId::from("bob"),
        )
        .unwrap();
        assert!(c.is_blocking());

        let mut withdrawn = c.clone();
        withdrawn.status = ChallengeStatus::Withdrawn;
        assert!(!withdrawn.is_blocking());

        let mut note = c;
        note.severity = ChallengeSeverity::Note;
        assert!(!note.is_blocking());
    }
}
