//! Ledger events
//!
//! Each committed event is one line of JSON: a `sequence` (strictly
//! increasing from 1), a UTC `timestamp`, a `kind` tag, and a `payload`
//! whose schema is fixed per kind. The enum is closed: a ledger holding
//! an unknown tag fails replay rather than being silently skipped.

use sequent_core::{
    AgentId, Amendment, Challenge, ChallengeId, Definition, Lemma, Node, NodeId, TaintState,
    Timestamp,
};
use serde::{Deserialize, Serialize};

/// A single committed ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence number, starting at 1
    pub sequence: u64,
    /// When the event was committed
    pub timestamp: Timestamp,
    /// The event variant and its payload
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Stamp a payload with its sequence number at commit time.
    pub fn new(sequence: u64, kind: EventKind) -> Self {
        Self {
            sequence,
            timestamp: Timestamp::now(),
            kind,
        }
    }
}

/// Every mutation the ledger can record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum EventKind {
    /// The proof was created with its root conjecture.
    ProofInitialized {
        conjecture: String,
        author: AgentId,
    },
    /// A node entered the tree; carries the full initial snapshot.
    NodeCreated { node: Node },
    /// One or more nodes were claimed by an agent.
    NodesClaimed {
        ids: Vec<NodeId>,
        owner: AgentId,
        expiry: Timestamp,
    },
    /// A held claim's expiry was pushed forward.
    NodeClaimRefreshed {
        id: NodeId,
        owner: AgentId,
        new_expiry: Timestamp,
    },
    /// One or more claims were released.
    NodesReleased { ids: Vec<NodeId> },
    /// A verifier accepted the node.
    NodeValidated {
        id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// A verifier admitted the node without full verification.
    NodeAdmitted { id: NodeId },
    /// A verifier refuted the node.
    NodeRefuted { id: NodeId },
    /// The node was retired without judgment.
    NodeArchived { id: NodeId },
    /// The node's statement changed; carries the full amendment record.
    NodeAmended { amendment: Amendment },
    /// A definition entered the ledger.
    DefAdded { definition: Definition },
    /// A lemma was extracted from a node.
    LemmaExtracted { lemma: Lemma },
    /// A challenge was raised; carries the full challenge record.
    ChallengeRaised { challenge: Challenge },
    /// The challenge was upheld.
    ChallengeAccepted { id: ChallengeId, by: AgentId },
    /// The challenger retracted the challenge.
    ChallengeWithdrawn { id: ChallengeId, by: AgentId },
    /// A verifier dismissed the challenge.
    ChallengeOverridden { id: ChallengeId, by: AgentId },
    /// Audit record of a derived taint change.
    TaintRecomputed { id: NodeId, taint: TaintState },
    /// A validated node was sent back for refinement.
    RefinementRequested {
        id: NodeId,
        reason: String,
        requested_by: AgentId,
    },
}

impl EventKind {
    /// The stable tag written to the ledger for this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ProofInitialized { .. } => "ProofInitialized",
            Self::NodeCreated { .. } => "NodeCreated",
            Self::NodesClaimed { .. } => "NodesClaimed",
            Self::NodeClaimRefreshed { .. } => "NodeClaimRefreshed",
            Self::NodesReleased { .. } => "NodesReleased",
            Self::NodeValidated { .. } => "NodeValidated",
            Self::NodeAdmitted { .. } => "NodeAdmitted",
            Self::NodeRefuted { .. } => "NodeRefuted",
            Self::NodeArchived { .. } => "NodeArchived",
            Self::NodeAmended { .. } => "NodeAmended",
            Self::DefAdded { .. } => "DefAdded",
            Self::LemmaExtracted { .. } => "LemmaExtracted",
            Self::ChallengeRaised { .. } => "ChallengeRaised",
            Self::ChallengeAccepted { .. } => "ChallengeAccepted",
            Self::ChallengeWithdrawn { .. } => "ChallengeWithdrawn",
            Self::ChallengeOverridden { .. } => "ChallengeOverridden",
            Self::TaintRecomputed { .. } => "TaintRecomputed",
            Self::RefinementRequested { .. } => "RefinementRequested",
        }
    }
}
