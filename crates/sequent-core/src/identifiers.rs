//! Core identifier types used across the Sequent engine
//!
//! This module provides the fundamental identifier types that uniquely
//! identify nodes, agents, and the auxiliary entities attached to a proof.

use crate::errors::ProofError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Position of a node in the proof tree, written in dotted form.
///
/// A node id is an ordered sequence of positive integers: `"1"` is the
/// root, `"1.2"` its second child, `"1.2.3"` the third child of that one.
/// Depth equals the number of segments; ordering is lexicographic on the
/// segment sequence, so a parent always sorts before its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(Vec<u32>);

impl NodeId {
    /// The root node id, always `"1"`.
    pub fn root() -> Self {
        Self(vec![1])
    }

    /// Parse a dotted id, rejecting empty segments, non-positive integers,
    /// and any character outside digits and `.`.
    pub fn parse(text: &str) -> Result<Self, ProofError> {
        if text.trim().is_empty() {
            return Err(ProofError::empty_input("node id"));
        }
        let mut segments = Vec::new();
        for part in text.split('.') {
            if part.is_empty() {
                return Err(ProofError::schema_violation(format!(
                    "node id '{text}' contains an empty segment"
                )));
            }
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ProofError::schema_violation(format!(
                    "node id '{text}' contains a non-numeric segment '{part}'"
                )));
            }
            let value: u32 = part.parse().map_err(|_| {
                ProofError::schema_violation(format!("node id segment '{part}' is out of range"))
            })?;
            if value == 0 {
                return Err(ProofError::schema_violation(format!(
                    "node id '{text}' contains a non-positive segment"
                )));
            }
            segments.push(value);
        }
        Ok(Self(segments))
    }

    /// Build an id directly from segments. All segments must be positive.
    pub fn from_segments(segments: Vec<u32>) -> Result<Self, ProofError> {
        if segments.is_empty() {
            return Err(ProofError::empty_input("node id"));
        }
        if segments.iter().any(|&s| s == 0) {
            return Err(ProofError::schema_violation(
                "node id segments must be positive",
            ));
        }
        Ok(Self(segments))
    }

    /// The parent id, or `None` at the root.
    pub fn parent(&self) -> Option<NodeId> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The k-th child of this node.
    ///
    /// `k` is 1-based; `child(0)` would produce an invalid id and panics
    /// in debug builds.
    pub fn child(&self, k: u32) -> NodeId {
        debug_assert!(k >= 1, "child index must be positive");
        let mut segments = self.0.clone();
        segments.push(k);
        Self(segments)
    }

    /// Number of segments. The root has depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The final segment: this node's index among its siblings.
    pub fn last_segment(&self) -> u32 {
        *self.0.last().unwrap_or(&1)
    }

    /// True if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &NodeId) -> bool {
        other.0.len() > self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// True if this is the root id.
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// The chain of ancestors from the root down to (excluding) this node.
    pub fn ancestors(&self) -> Vec<NodeId> {
        (1..self.0.len())
            .map(|len| Self(self.0[..len].to_vec()))
            .collect()
    }

    /// The underlying segments.
    pub fn segments(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for NodeId {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodeId {
    type Error = ProofError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_string()
    }
}

/// Identity of an agent (prover or verifier) acting on the proof.
///
/// Agents are external processes; the engine only records their names on
/// claims, amendments, and challenges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new agent id. The service validates non-emptiness at the
    /// operation boundary; this constructor only wraps.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the name is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

fn short_uid(prefix: &str) -> String {
    let uuid = Uuid::new_v4();
    let simple = uuid.simple().to_string();
    format!("{prefix}-{}", &simple[..12])
}

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, unique id.
            pub fn generate() -> Self {
                Self(short_uid($prefix))
            }

            /// Wrap an existing id (e.g. read back from the ledger).
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

opaque_id!(
    /// Identifier for a named definition.
    DefId,
    "def"
);
opaque_id!(
    /// Identifier for a global ambient assumption.
    AssumptionId,
    "asm"
);
opaque_id!(
    /// Identifier for an external fact or reference.
    ExternalId,
    "ext"
);
opaque_id!(
    /// Identifier for a lemma extracted from a node.
    LemmaId,
    "lem"
);
opaque_id!(
    /// Identifier for a challenge raised against a node.
    ChallengeId,
    "chl"
);
opaque_id!(
    /// Identifier for an amendment record.
    AmendmentId,
    "amd"
);
opaque_id!(
    /// Identifier for a pending definition request.
    PendingDefId,
    "pdef"
);

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_and_display_round_trip() {
        for text in ["1", "1.2", "1.2.3", "10.20.30"] {
            let id = NodeId::parse(text).unwrap();
            assert_eq!(id.to_string(), text);
        }
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for text in ["", " ", "1..2", ".1", "1.", "0", "1.0", "a.b", "1,2", "-1", "1 .2"] {
            assert!(NodeId::parse(text).is_err(), "accepted {text:?}");
        }
    }

    #[test]
    fn parse_rejects_out_of_range_segment() {
        assert_matches!(
            NodeId::parse("99999999999999999999"),
            Err(ProofError::SchemaViolation { .. })
        );
    }

    #[test]
    fn parent_and_child_are_inverse() {
        let id = NodeId::parse("1.2.3").unwrap();
        let parent = id.parent().unwrap();
        assert_eq!(parent.to_string(), "1.2");
        assert_eq!(parent.child(3), id);
        assert_eq!(NodeId::root().parent(), None);
    }

    #[test]
    fn depth_counts_segments() {
        assert_eq!(NodeId::root().depth(), 1);
        assert_eq!(NodeId::parse("1.1.1.1").unwrap().depth(), 4);
    }

    #[test]
    fn ordering_is_lexicographic_on_segments() {
        let a = NodeId::parse("1.2").unwrap();
        let b = NodeId::parse("1.10").unwrap();
        let c = NodeId::parse("1.2.1").unwrap();
        assert!(a < b, "numeric segments, not string compare");
        assert!(a < c, "parent sorts before child");
        assert!(c < b);
    }

    #[test]
    fn ancestor_relation() {
        let root = NodeId::root();
        let deep = NodeId::parse("1.2.3").unwrap();
        assert!(root.is_ancestor_of(&deep));
        assert!(!deep.is_ancestor_of(&root));
        assert!(!deep.is_ancestor_of(&deep));
        assert_eq!(
            deep.ancestors(),
            vec![NodeId::parse("1").unwrap(), NodeId::parse("1.2").unwrap()]
        );
    }

    #[test]
    fn serde_uses_dotted_string() {
        let id = NodeId::parse("1.2.3").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"1.2.3\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<NodeId>("\"1..2\"").is_err());
    }

    #[test]
    fn opaque_ids_are_prefixed_and_unique() {
        let a = DefId::generate();
        let b = DefId::generate();
        assert!(a.as_str().starts_with("def-"));
        assert_ne!(a, b);
        assert!(ChallengeId::generate().as_str().starts_with("chl-"));
    }
}
