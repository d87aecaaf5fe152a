//! Query operations
//!
//! Read-only calls: replay and serve. No locks are taken and no events
//! are written.

use crate::service::ProofService;
use sequent_core::schema::is_terminal;
use sequent_core::{
    EpistemicState, Node, NodeId, ProofError, Result, Timestamp, WorkflowState,
};
use serde::Serialize;

/// Summary of one node for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    /// The node snapshot
    pub node: Node,
    /// Direct children, in id order
    pub children: Vec<NodeId>,
    /// Open challenges of any severity
    pub open_challenges: usize,
    /// Open critical/major challenges
    pub blocking_challenges: usize,
    /// Number of recorded amendments
    pub amendments: usize,
    /// Local assumptions open at this node
    pub open_scope: Vec<NodeId>,
}

impl ProofService {
    /// Nodes still awaiting judgment, in id order.
    pub fn pending_nodes(&self) -> Result<Vec<Node>> {
        let state = self.load_state()?;
        Ok(state
            .all()
            .filter(|node| node.epistemic == EpistemicState::Pending)
            .cloned()
            .collect())
    }

    /// Nodes an agent could claim right now: workflow available and not
    /// terminally judged.
    pub fn available_nodes(&self) -> Result<Vec<Node>> {
        let state = self.load_state()?;
        Ok(state
            .all()
            .filter(|node| {
                node.workflow == WorkflowState::Available && !is_terminal(node.epistemic)
            })
            .cloned()
            .collect())
    }

    /// Full status summary for one node.
    pub fn status(&self, id: &NodeId) -> Result<NodeStatus> {
        let state = self.load_state()?;
        let node = Self::node(&state, id)?.clone();
        let open_challenges = state
            .challenges
            .get(id)
            .map(|list| {
                list.iter()
                    .filter(|c| c.status == sequent_core::ChallengeStatus::Open)
                    .count()
            })
            .unwrap_or(0);
        Ok(NodeStatus {
            children: state.children_of(id).iter().map(|n| n.id.clone()).collect(),
            blocking_challenges: state.blocking_challenges_for(id).len(),
            amendments: state.amendment_history(id).len(),
            open_scope: state.open_scope(id),
            open_challenges,
            node,
        })
    }

    /// The chain of nodes from the root down to `id`, inclusive.
    pub fn path(&self, id: &NodeId) -> Result<Vec<Node>> {
        let state = self.load_state()?;
        Self::node(&state, id)?;
        let mut chain = id.ancestors();
        chain.push(id.clone());
        chain
            .into_iter()
            .map(|link| {
                state
                    .get(&link)
                    .cloned()
                    .ok_or(ProofError::NodeNotFound { id: link })
            })
            .collect()
    }

    /// Claims whose expiry has passed. Observational: the ledger still
    /// records these nodes as claimed until they are released.
    pub fn expired_claims(&self) -> Result<Vec<Node>> {
        let state = self.load_state()?;
        let now = Timestamp::now();
        Ok(state.expired_claims(&now).into_iter().cloned().collect())
    }
}
