//! The proof service facade
//!
//! `ProofService` is the single entry point for mutating and querying a
//! proof directory. Every mutating operation follows the same template:
//! validate arguments, load a state snapshot, check semantic
//! preconditions against it, then commit events with `append_if_sequence`
//! so that a concurrent writer causes a clean `ConcurrentModification`
//! instead of a corrupted proof. Derived taint events are emitted after
//! the authoritative transition and never roll it back.

use crate::citations::{self, Citation};
use sequent_core::schema::{closes_scope, is_final};
use sequent_core::{
    cycle, taint, AgentId, Node, NodeId, ProofConfig, ProofError, Result,
};
use sequent_journal::{EventKind, Ledger, ProofState};
use sequent_store::ProofDir;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Orchestrates ledger, projector, cycle detection, taint, and sidecar
/// for one proof directory.
#[derive(Debug)]
pub struct ProofService {
    dir: ProofDir,
    ledger: Ledger,
    config: ProofConfig,
}

/// A child node to be created under a claimed parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineSpec {
    /// Explicit child id; allocated automatically when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<NodeId>,
    /// Structural role of the new node
    pub kind: sequent_core::NodeKind,
    /// The statement being claimed
    pub statement: String,
    /// Rule justifying the new node
    pub inference: sequent_core::InferenceRule,
    /// Logical references
    #[serde(default)]
    pub dependencies: Vec<NodeId>,
    /// Nodes that must be validated before this one can be accepted
    #[serde(default)]
    pub validation_deps: Vec<NodeId>,
}

impl RefineSpec {
    /// A plain claim node with no dependencies.
    pub fn claim(statement: impl Into<String>, inference: sequent_core::InferenceRule) -> Self {
        Self {
            child: None,
            kind: sequent_core::NodeKind::Claim,
            statement: statement.into(),
            inference,
            dependencies: Vec::new(),
            validation_deps: Vec::new(),
        }
    }
}

impl ProofService {
    /// Open a proof directory, creating the layout if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let dir = ProofDir::new(root.as_ref());
        dir.ensure_layout()?;
        let config = dir.load_config()?;
        let ledger = Ledger::open(dir.ledger(), config.lock_timeout())?;
        Ok(Self {
            dir,
            ledger,
            config,
        })
    }

    /// The effective configuration.
    pub fn config(&self) -> &ProofConfig {
        &self.config
    }

    /// The underlying proof directory.
    pub fn proof_dir(&self) -> &ProofDir {
        &self.dir
    }

    pub(crate) fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Replay the ledger and merge the ambient sidecar records.
    ///
    /// Permissive by design: an uninitialized directory yields the empty
    /// state so tooling can inspect a proof before it starts. Mutating
    /// operations gate on initialization separately.
    pub fn load_state(&self) -> Result<ProofState> {
        let events = self.ledger.read_all()?;
        let mut state = sequent_journal::replay(&events)?;
        state.assumptions = self.dir.assumption_store().list()?;
        state.externals = self.dir.external_store().list()?;
        state.pending_defs = self.dir.pending_def_store().list()?;
        Ok(state)
    }

    /// Snapshot for a mutating operation: loaded state plus the
    /// initialization gate.
    pub(crate) fn snapshot_initialized(&self) -> Result<ProofState> {
        let state = self.load_state()?;
        if !state.is_initialized() {
            return Err(ProofError::NotInitialized);
        }
        Ok(state)
    }

    pub(crate) fn node<'a>(state: &'a ProofState, id: &NodeId) -> Result<&'a Node> {
        state
            .get(id)
            .ok_or_else(|| ProofError::NodeNotFound { id: id.clone() })
    }

    pub(crate) fn require_agent(owner: &AgentId, field: &'static str) -> Result<()> {
        if owner.is_blank() {
            return Err(ProofError::empty_input(field));
        }
        Ok(())
    }

    /// The caller must hold the claim on `node`.
    pub(crate) fn require_claim_holder(node: &Node, owner: &AgentId) -> Result<()> {
        match &node.claimed_by {
            Some(holder) if node.workflow == sequent_core::WorkflowState::Claimed => {
                if holder == owner {
                    Ok(())
                } else {
                    Err(ProofError::OwnerMismatch {
                        id: node.id.clone(),
                        holder: holder.clone(),
                    })
                }
            }
            _ => Err(ProofError::NotClaimHolder {
                id: node.id.clone(),
                holder: node.claimed_by.clone(),
            }),
        }
    }

    /// Every `def:`/`ext:` citation in `statement` must resolve against
    /// the ledger's definitions, the pending-def sidecar, and the
    /// externals sidecar.
    pub(crate) fn resolve_citations(state: &ProofState, statement: &str) -> Result<()> {
        for citation in citations::scan(statement) {
            match citation {
                Citation::Def(name) => {
                    let known = state.definitions.contains_key(&name)
                        || state.pending_defs.iter().any(|p| p.name == name);
                    if !known {
                        return Err(ProofError::InvalidDependency {
                            reference: format!("def:{name}"),
                        });
                    }
                }
                Citation::Ext(id) => {
                    if !state.externals.iter().any(|e| e.id.as_str() == id) {
                        return Err(ProofError::InvalidDependency {
                            reference: format!("ext:{id}"),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Full validation of a node about to be created: limits, parent,
    /// freshness, dependency existence, cycle-freedom, scope rules, and
    /// citation resolution.
    pub(crate) fn validate_new_node(&self, state: &ProofState, node: &Node) -> Result<()> {
        if node.id.depth() > self.config.max_depth {
            return Err(ProofError::DepthExceeded {
                depth: node.id.depth(),
                max: self.config.max_depth,
            });
        }
        let parent_id = node
            .id
            .parent()
            .ok_or_else(|| ProofError::already_exists(format!("node {}", node.id)))?;
        if state.get(&parent_id).is_none() {
            return Err(ProofError::ParentNotFound { id: parent_id });
        }
        if state.get(&node.id).is_some() {
            return Err(ProofError::already_exists(format!("node {}", node.id)));
        }
        if state.children_of(&parent_id).len() + 1 > self.config.max_children {
            return Err(ProofError::RefinementLimitExceeded {
                parent: parent_id,
                max: self.config.max_children,
            });
        }

        for dep in node.dependencies.iter().chain(&node.validation_deps) {
            if state.get(dep).is_none() {
                return Err(ProofError::InvalidDependency {
                    reference: dep.to_string(),
                });
            }
        }

        Self::resolve_citations(state, &node.statement)?;
        self.check_scope(state, node, &parent_id)?;
        self.check_cycles(state, node, &parent_id)?;
        Ok(())
    }

    /// Scope rules: qed needs an empty scope at the parent; a discharge
    /// needs an open assume to close.
    fn check_scope(&self, state: &ProofState, node: &Node, parent: &NodeId) -> Result<()> {
        let open = state.open_scope(parent);
        if is_final(node.kind) && !open.is_empty() {
            return Err(ProofError::invalid_state(format!(
                "qed under open local assumptions at {}",
                open.last().map(|id| id.to_string()).unwrap_or_default()
            )));
        }
        if closes_scope(node.kind) && open.is_empty() {
            return Err(ProofError::invalid_state(
                "local-discharge with no open local assumption",
            ));
        }
        Ok(())
    }

    /// The union graph (tree edges + dependencies + validation-deps)
    /// must stay acyclic with the proposed node overlaid.
    fn check_cycles(&self, state: &ProofState, node: &Node, parent: &NodeId) -> Result<()> {
        let provider = |id: &NodeId| -> Vec<NodeId> {
            let mut edges: Vec<NodeId> = Vec::new();
            if id == &node.id {
                edges.extend(node.dependencies.iter().cloned());
                edges.extend(node.validation_deps.iter().cloned());
                return edges;
            }
            if let Some(existing) = state.get(id) {
                edges.extend(state.children_of(id).iter().map(|c| c.id.clone()));
                edges.extend(existing.dependencies.iter().cloned());
                edges.extend(existing.validation_deps.iter().cloned());
            }
            if id == parent {
                edges.push(node.id.clone());
            }
            edges
        };
        if let Some(path) = cycle::find_cycle(parent, &provider) {
            return Err(ProofError::DependencyCycle { path });
        }
        Ok(())
    }

    /// After a judgment transition: reload and emit one
    /// `TaintRecomputed` per node in the changed subtree whose derived
    /// taint diverges from the audit trail.
    /// Failures are logged, never surfaced — the authoritative
    /// transition already committed and replay recomputes taint from
    /// the pure rules regardless.
    pub(crate) fn emit_taint_updates(&self, changed: &NodeId) {
        let state = match self.load_state() {
            Ok(state) => state,
            Err(err) => {
                warn!(node = %changed, error = %err, "taint pass skipped: reload failed");
                return;
            }
        };
        // Diff against what the ledger has audited so far, not against
        // the replayed values (those are already the pure ones).
        let mut audited = state.nodes.clone();
        for (id, node) in audited.iter_mut() {
            node.taint = state
                .taint_audit
                .get(id)
                .copied()
                .unwrap_or(sequent_core::TaintState::Clean);
        }
        for (id, value) in taint::propagate(changed, &audited) {
            if let Err(err) = self
                .ledger
                .append(EventKind::TaintRecomputed { id: id.clone(), taint: value })
            {
                warn!(node = %id, error = %err, "taint event suppressed");
                return;
            }
        }
    }
}
