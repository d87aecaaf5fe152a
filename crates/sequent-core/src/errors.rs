//! Unified error type for the Sequent engine
//!
//! Every failure surfaced by the engine is a [`ProofError`]. Each variant
//! has a stable kind string and an exit-code class so callers can react
//! without matching on message text. Messages never embed absolute host
//! paths.

use crate::identifiers::{AgentId, NodeId};
use serde::{Deserialize, Serialize};

/// Exit-code class for an error kind.
///
/// Retriable failures (CAS races, lock contention) map to 1, failures
/// where the proof state currently forbids the operation map to 2, and
/// logic errors in the request map to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitClass {
    /// Reload and retry is expected to succeed.
    Retriable,
    /// The proof state blocks the operation; retrying unchanged will fail.
    Blocked,
    /// The request itself is wrong.
    Logic,
}

impl ExitClass {
    /// Stable numeric exit code.
    pub fn code(&self) -> i32 {
        match self {
            ExitClass::Retriable => 1,
            ExitClass::Blocked => 2,
            ExitClass::Logic => 3,
        }
    }
}

/// Unified error type for all proof operations.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ProofError {
    /// The ledger advanced between snapshot and append. Reload and retry.
    #[error("concurrent modification: expected sequence {expected}, ledger is at {actual}")]
    ConcurrentModification {
        /// Sequence the caller observed
        expected: u64,
        /// Sequence the ledger actually held
        actual: u64,
    },

    /// A mutating operation ran against an empty ledger.
    #[error("proof is not initialized")]
    NotInitialized,

    /// `init` ran against a non-empty ledger.
    #[error("proof is already initialized")]
    AlreadyInitialized,

    /// Node lookup failed.
    #[error("node {id} not found")]
    NodeNotFound {
        /// The missing id
        id: NodeId,
    },

    /// The parent of a node being created does not exist.
    #[error("parent {id} not found")]
    ParentNotFound {
        /// The missing parent id
        id: NodeId,
    },

    /// An entity with this identity already exists.
    #[error("{what} already exists")]
    AlreadyExists {
        /// Description of the duplicate (e.g. `node 1.2`)
        what: String,
    },

    /// A required string was empty or whitespace.
    #[error("{field} must not be empty")]
    EmptyInput {
        /// Which input was empty
        field: String,
    },

    /// A timeout argument was zero or negative.
    #[error("timeout must be positive")]
    InvalidTimeout,

    /// An epistemic or workflow precondition was violated.
    #[error("invalid state: {message}")]
    InvalidState {
        /// What was violated
        message: String,
    },

    /// The caller does not hold the claim on the node.
    #[error("node {id} is not claimed by the caller")]
    NotClaimHolder {
        /// The contested node
        id: NodeId,
        /// Current holder, if any
        holder: Option<AgentId>,
    },

    /// The named owner does not match the claim holder.
    #[error("owner mismatch on {id}: claim is held by {holder}")]
    OwnerMismatch {
        /// The contested node
        id: NodeId,
        /// Current holder
        holder: AgentId,
    },

    /// Unresolved critical or major challenges block the operation.
    #[error("{count} blocking challenge(s) on node {id}")]
    BlockingChallenges {
        /// The challenged node
        id: NodeId,
        /// Number of open blocking challenges
        count: usize,
    },

    /// Node depth would exceed the configured maximum.
    #[error("depth {depth} exceeds the maximum of {max}")]
    DepthExceeded {
        /// The offending depth
        depth: usize,
        /// Configured limit
        max: usize,
    },

    /// A refine would push a parent past the configured child limit.
    #[error("refining {parent} would exceed the limit of {max} children")]
    RefinementLimitExceeded {
        /// The parent node
        parent: NodeId,
        /// Configured limit
        max: usize,
    },

    /// The proposed dependency edge closes a cycle.
    #[error("dependency cycle: {}", format_cycle(.path))]
    DependencyCycle {
        /// The cycle, first node repeated at the end
        path: Vec<NodeId>,
    },

    /// A declared dependency or citation does not resolve.
    #[error("invalid dependency: {reference}")]
    InvalidDependency {
        /// The unresolvable reference
        reference: String,
    },

    /// A validation-dep or child is not yet validated or admitted.
    #[error("node {id} has unvalidated prerequisites: {}", format_ids(.pending))]
    ValidationPending {
        /// The node being accepted
        id: NodeId,
        /// Prerequisites still pending
        pending: Vec<NodeId>,
    },

    /// Unknown enum value or illegal state transition.
    #[error("schema violation: {message}")]
    SchemaViolation {
        /// What was violated
        message: String,
    },

    /// Filesystem or I/O failure.
    #[error("storage error: {message}")]
    Storage {
        /// Sanitized description (no absolute paths)
        message: String,
    },

    /// Encoding or decoding failure.
    #[error("serialization error: {message}")]
    Serialization {
        /// Sanitized description
        message: String,
    },

    /// The ledger append lock could not be acquired in time.
    #[error("timed out waiting for the ledger lock")]
    LockTimeout,
}

fn format_cycle(path: &[NodeId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProofError {
    /// Create an empty-input error for the named field.
    pub fn empty_input(field: impl Into<String>) -> Self {
        Self::EmptyInput {
            field: field.into(),
        }
    }

    /// Create an already-exists error.
    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists { what: what.into() }
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a schema-violation error.
    pub fn schema_violation(message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Stable identifier for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConcurrentModification { .. } => "concurrent-modification",
            Self::NotInitialized => "not-initialized",
            Self::AlreadyInitialized => "already-initialized",
            Self::NodeNotFound { .. } => "node-not-found",
            Self::ParentNotFound { .. } => "parent-not-found",
            Self::AlreadyExists { .. } => "already-exists",
            Self::EmptyInput { .. } => "empty-input",
            Self::InvalidTimeout => "invalid-timeout",
            Self::InvalidState { .. } => "invalid-state",
            Self::NotClaimHolder { .. } => "not-claim-holder",
            Self::OwnerMismatch { .. } => "owner-mismatch",
            Self::BlockingChallenges { .. } => "blocking-challenges",
            Self::DepthExceeded { .. } => "depth-exceeded",
            Self::RefinementLimitExceeded { .. } => "refinement-limit-exceeded",
            Self::DependencyCycle { .. } => "dependency-cycle",
            Self::InvalidDependency { .. } => "invalid-dependency",
            Self::ValidationPending { .. } => "validation-pending",
            Self::SchemaViolation { .. } => "schema-violation",
            Self::Storage { .. } => "storage",
            Self::Serialization { .. } => "serialization",
            Self::LockTimeout => "lock-timeout",
        }
    }

    /// Exit-code class for this error kind.
    pub fn exit_class(&self) -> ExitClass {
        match self {
            Self::ConcurrentModification { .. } | Self::LockTimeout | Self::Storage { .. } => {
                ExitClass::Retriable
            }
            Self::InvalidState { .. }
            | Self::NotClaimHolder { .. }
            | Self::OwnerMismatch { .. }
            | Self::BlockingChallenges { .. }
            | Self::ValidationPending { .. } => ExitClass::Blocked,
            _ => ExitClass::Logic,
        }
    }

    /// Whether reloading state and retrying can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.exit_class(), ExitClass::Retriable)
    }
}

/// Standard Result type for proof operations.
pub type Result<T> = std::result::Result<T, ProofError>;

impl From<serde_json::Error> for ProofError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for ProofError {
    fn from(err: std::io::Error) -> Self {
        // err.to_string() may embed a path; keep only the kind.
        Self::storage(err.kind().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_classes_are_stable() {
        let cm = ProofError::ConcurrentModification {
            expected: 3,
            actual: 5,
        };
        assert_eq!(cm.exit_class().code(), 1);
        assert!(cm.is_retryable());

        let blocked = ProofError::BlockingChallenges {
            id: NodeId::root(),
            count: 2,
        };
        assert_eq!(blocked.exit_class().code(), 2);
        assert!(!blocked.is_retryable());

        let logic = ProofError::InvalidTimeout;
        assert_eq!(logic.exit_class().code(), 3);
    }

    #[test]
    fn kinds_match_variants() {
        assert_eq!(ProofError::NotInitialized.kind(), "not-initialized");
        assert_eq!(
            ProofError::empty_input("statement").kind(),
            "empty-input"
        );
    }

    #[test]
    fn cycle_message_prints_path() {
        let path = vec![
            NodeId::parse("1.1").unwrap(),
            NodeId::parse("1.1.2").unwrap(),
            NodeId::parse("1.1").unwrap(),
        ];
        let err = ProofError::DependencyCycle { path };
        assert_eq!(
            err.to_string(),
            "dependency cycle: 1.1 -> 1.1.2 -> 1.1"
        );
    }

    #[test]
    fn io_errors_lose_path_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "/secret/host/path");
        let err = ProofError::from(io);
        assert!(!err.to_string().contains("/secret"));
    }
}
