//! Admin operations
//!
//! Proof initialization, direct node creation, and the taint repair
//! sweep.

use crate::service::ProofService;
use sequent_core::{
    taint, AgentId, InferenceRule, Node, NodeId, NodeKind, ProofError, Result, TaintState,
    Timestamp,
};
use sequent_journal::EventKind;
use tracing::info;

impl ProofService {
    /// Initialize the proof: write `ProofInitialized` followed by the
    /// root node `"1"` carrying the conjecture as its statement.
    ///
    /// Requires an empty ledger; the emptiness check is enforced
    /// atomically by committing at sequence 0.
    pub fn init(&self, conjecture: &str, author: &AgentId) -> Result<NodeId> {
        Self::require_agent(author, "author")?;
        if conjecture.trim().is_empty() {
            return Err(ProofError::empty_input("conjecture"));
        }

        let root = NodeId::root();
        let root_node = Node::new(
            root.clone(),
            NodeKind::Claim,
            conjecture,
            InferenceRule::Conjecture,
            Timestamp::now(),
        )?;
        let outcome = self
            .ledger()
            .append_batch_if_sequence(
                vec![
                    EventKind::ProofInitialized {
                        conjecture: conjecture.to_string(),
                        author: author.clone(),
                    },
                    EventKind::NodeCreated { node: root_node },
                ],
                0,
            )
            .map_err(|err| match err {
                ProofError::ConcurrentModification { .. } => ProofError::AlreadyInitialized,
                other => other,
            })?;
        if let Some(err) = outcome.failure {
            return Err(err);
        }
        info!(author = %author, "proof initialized");
        Ok(root)
    }

    /// Create a node directly, bypassing claim ownership. The node still
    /// passes every structural check: parent existence, freshness,
    /// depth and fan-out limits, dependency existence, cycle-freedom,
    /// scope rules, and citation resolution.
    pub fn create_node(
        &self,
        id: &NodeId,
        kind: NodeKind,
        statement: &str,
        inference: InferenceRule,
        dependencies: Vec<NodeId>,
        validation_deps: Vec<NodeId>,
    ) -> Result<()> {
        let state = self.snapshot_initialized()?;
        let node = Node::new(id.clone(), kind, statement, inference, Timestamp::now())?
            .with_dependencies(dependencies)
            .with_validation_deps(validation_deps);
        self.validate_new_node(&state, &node)?;

        self.ledger()
            .append_if_sequence(EventKind::NodeCreated { node }, state.latest_sequence())?;
        info!(node = %id, "node created");
        Ok(())
    }

    /// Repair sweep: recompute pure taint for every node and write one
    /// `TaintRecomputed` per divergence. Returns what changed. Unlike
    /// the post-judgment pass, failures here surface to the caller.
    pub fn recompute_all_taint(&self) -> Result<Vec<(NodeId, TaintState)>> {
        let state = self.snapshot_initialized()?;
        let pure = taint::recompute_all(&state.nodes);
        let diffs: Vec<(NodeId, TaintState)> = pure
            .into_iter()
            .filter(|(id, value)| state.get(id).map(|n| n.taint) != Some(*value))
            .collect();
        if diffs.is_empty() {
            return Ok(diffs);
        }

        let outcome = self.ledger().append_batch_if_sequence(
            diffs
                .iter()
                .map(|(id, value)| EventKind::TaintRecomputed {
                    id: id.clone(),
                    taint: *value,
                })
                .collect(),
            state.latest_sequence(),
        )?;
        if let Some(err) = outcome.failure {
            return Err(ProofError::storage(format!(
                "taint sweep interrupted after {} of {} events: {err}",
                outcome.committed.len(),
                diffs.len()
            )));
        }
        info!(changed = diffs.len(), "taint sweep committed");
        Ok(diffs)
    }
}
