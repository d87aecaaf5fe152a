//! Prover operations
//!
//! Claim management, refinement, amendment, and the ambient-resource
//! authoring calls. Ledger-backed mutations follow the CAS template;
//! assumption/external/pending-def authoring goes straight to the
//! filesystem sidecar and is deliberately exempt from the
//! initialization gate so material can be prepared before the proof
//! starts.

use crate::service::{ProofService, RefineSpec};
use sequent_core::schema::validate_workflow_transition;
use sequent_core::{
    Amendment, AgentId, Assumption, AssumptionId, DefId, Definition, External, ExternalId, Lemma,
    LemmaId, Node, NodeId, PendingDef, PendingDefId, ProofError, Result, Timestamp, WorkflowState,
};
use sequent_journal::EventKind;
use time::Duration;
use tracing::{info, warn};

impl ProofService {
    /// Take an exclusive claim on an available node. Returns the expiry.
    pub fn claim(&self, id: &NodeId, owner: &AgentId, timeout: Duration) -> Result<Timestamp> {
        Self::require_agent(owner, "owner")?;
        if timeout <= Duration::ZERO {
            return Err(ProofError::InvalidTimeout);
        }
        let state = self.snapshot_initialized()?;
        let node = Self::node(&state, id)?;
        validate_workflow_transition(node.workflow, WorkflowState::Claimed).map_err(|_| {
            ProofError::invalid_state(format!("node {id} is {}, not available", node.workflow))
        })?;

        let expiry = Timestamp::now().plus(timeout);
        self.ledger().append_if_sequence(
            EventKind::NodesClaimed {
                ids: vec![id.clone()],
                owner: owner.clone(),
                expiry,
            },
            state.latest_sequence(),
        )?;
        info!(node = %id, owner = %owner, "node claimed");
        Ok(expiry)
    }

    /// Push a held claim's expiry forward. Returns the new expiry.
    pub fn refresh_claim(
        &self,
        id: &NodeId,
        owner: &AgentId,
        timeout: Duration,
    ) -> Result<Timestamp> {
        Self::require_agent(owner, "owner")?;
        if timeout <= Duration::ZERO {
            return Err(ProofError::InvalidTimeout);
        }
        let state = self.snapshot_initialized()?;
        let node = Self::node(&state, id)?;
        Self::require_claim_holder(node, owner)?;

        let new_expiry = Timestamp::now().plus(timeout);
        self.ledger().append_if_sequence(
            EventKind::NodeClaimRefreshed {
                id: id.clone(),
                owner: owner.clone(),
                new_expiry,
            },
            state.latest_sequence(),
        )?;
        Ok(new_expiry)
    }

    /// Release a claim held by `owner`.
    pub fn release(&self, id: &NodeId, owner: &AgentId) -> Result<()> {
        Self::require_agent(owner, "owner")?;
        let state = self.snapshot_initialized()?;
        let node = Self::node(&state, id)?;
        Self::require_claim_holder(node, owner)?;

        self.ledger().append_if_sequence(
            EventKind::NodesReleased {
                ids: vec![id.clone()],
            },
            state.latest_sequence(),
        )?;
        info!(node = %id, owner = %owner, "claim released");
        Ok(())
    }

    /// Add one child under a parent claimed by `owner`. Returns the
    /// child's id (allocated when the spec leaves it unset).
    pub fn refine(&self, parent: &NodeId, owner: &AgentId, spec: RefineSpec) -> Result<NodeId> {
        Self::require_agent(owner, "owner")?;
        let state = self.snapshot_initialized()?;
        let parent_node = Self::node(&state, parent)?;
        Self::require_claim_holder(parent_node, owner)?;

        let child_id = match &spec.child {
            Some(id) => {
                if id.parent().as_ref() != Some(parent) {
                    return Err(ProofError::invalid_state(format!(
                        "{id} is not a child id of {parent}"
                    )));
                }
                id.clone()
            }
            None => parent.child(state.next_child_index(parent)),
        };

        let node = Node::new(
            child_id.clone(),
            spec.kind,
            spec.statement,
            spec.inference,
            Timestamp::now(),
        )?
        .with_dependencies(spec.dependencies)
        .with_validation_deps(spec.validation_deps);
        self.validate_new_node(&state, &node)?;

        self.ledger()
            .append_if_sequence(EventKind::NodeCreated { node }, state.latest_sequence())?;
        info!(parent = %parent, child = %child_id, "node refined");
        Ok(child_id)
    }

    /// Add several children in one best-effort batch. Ids are allocated
    /// sequentially, skipping existing children. Returns the ids in
    /// spec order.
    ///
    /// The first `NodeCreated` commits under CAS; the rest commit under
    /// the same held lock. On a mid-batch storage failure the ledger
    /// keeps the events that made it (each is self-valid) and the error
    /// names the committed ids, so callers must be idempotent under
    /// partial success.
    pub fn refine_bulk(
        &self,
        parent: &NodeId,
        owner: &AgentId,
        specs: Vec<RefineSpec>,
    ) -> Result<Vec<NodeId>> {
        Self::require_agent(owner, "owner")?;
        if specs.is_empty() {
            return Err(ProofError::empty_input("refine specs"));
        }
        let state = self.snapshot_initialized()?;
        let parent_node = Self::node(&state, parent)?;
        Self::require_claim_holder(parent_node, owner)?;

        if state.children_of(parent).len() + specs.len() > self.config().max_children {
            return Err(ProofError::RefinementLimitExceeded {
                parent: parent.clone(),
                max: self.config().max_children,
            });
        }

        let mut ids = Vec::with_capacity(specs.len());
        let mut nodes = Vec::with_capacity(specs.len());
        let mut next = 1;
        for spec in specs {
            if spec.child.is_some() {
                return Err(ProofError::invalid_state(
                    "refine_bulk allocates child ids; leave them unset",
                ));
            }
            while state.nodes.contains_key(&parent.child(next)) {
                next += 1;
            }
            let child_id = parent.child(next);
            next += 1;

            let node = Node::new(
                child_id.clone(),
                spec.kind,
                spec.statement,
                spec.inference,
                Timestamp::now(),
            )?
            .with_dependencies(spec.dependencies)
            .with_validation_deps(spec.validation_deps);
            self.validate_new_node(&state, &node)?;
            ids.push(child_id);
            nodes.push(node);
        }

        let outcome = self.ledger().append_batch_if_sequence(
            nodes
                .into_iter()
                .map(|node| EventKind::NodeCreated { node })
                .collect(),
            state.latest_sequence(),
        )?;
        match outcome.failure {
            None => {
                info!(parent = %parent, count = ids.len(), "bulk refine committed");
                Ok(ids)
            }
            Some(err) => {
                let committed: Vec<String> = ids
                    .iter()
                    .take(outcome.committed.len())
                    .map(|id| id.to_string())
                    .collect();
                Err(ProofError::storage(format!(
                    "bulk refine interrupted after committing [{}]: {err}",
                    committed.join(", ")
                )))
            }
        }
    }

    /// Change a pending node's statement, recording the amendment.
    pub fn amend(&self, id: &NodeId, owner: &AgentId, new_statement: &str) -> Result<()> {
        Self::require_agent(owner, "owner")?;
        let state = self.snapshot_initialized()?;
        let node = Self::node(&state, id)?;
        if node.epistemic != sequent_core::EpistemicState::Pending {
            return Err(ProofError::invalid_state(format!(
                "cannot amend node {id} in state {}",
                node.epistemic
            )));
        }
        if node.workflow == WorkflowState::Claimed {
            Self::require_claim_holder(node, owner)?;
        }
        Self::resolve_citations(&state, new_statement)?;

        let amendment = Amendment::new(
            id.clone(),
            node.statement.clone(),
            new_statement,
            owner.clone(),
        )?;
        self.ledger().append_if_sequence(
            EventKind::NodeAmended { amendment },
            state.latest_sequence(),
        )?;
        info!(node = %id, owner = %owner, "statement amended");
        Ok(())
    }

    /// Add a definition to the ledger. Any pending-def request for the
    /// same name is cleared from the sidecar on a best-effort basis.
    pub fn add_definition(&self, name: &str, content: &str) -> Result<DefId> {
        let definition = Definition::new(name, content)?;
        let state = self.snapshot_initialized()?;
        if state.definitions.contains_key(name) {
            return Err(ProofError::already_exists(format!("definition '{name}'")));
        }

        let id = definition.id.clone();
        self.ledger().append_if_sequence(
            EventKind::DefAdded { definition },
            state.latest_sequence(),
        )?;

        // Sidecar cleanup is not transactional with the ledger.
        let pending = self.proof_dir().pending_def_store();
        for request in state.pending_defs.iter().filter(|p| p.name == name) {
            if let Err(err) = pending.delete(&request.node.to_string()) {
                warn!(node = %request.node, error = %err, "pending-def cleanup failed");
            }
        }
        Ok(id)
    }

    /// Author a global assumption in the sidecar. Allowed before init.
    pub fn add_assumption(&self, statement: &str) -> Result<AssumptionId> {
        let assumption = Assumption::new(statement)?;
        let id = assumption.id.clone();
        self.proof_dir()
            .assumption_store()
            .write(id.as_str(), &assumption)?;
        Ok(id)
    }

    /// Author an external fact in the sidecar. Allowed before init.
    pub fn add_external(&self, source: &str, statement: &str) -> Result<ExternalId> {
        let external = External::new(source, statement)?;
        let id = external.id.clone();
        self.proof_dir()
            .external_store()
            .write(id.as_str(), &external)?;
        Ok(id)
    }

    /// Request a definition for a node's statement. The request lives in
    /// the sidecar until `add_definition` supplies the content.
    pub fn request_definition(&self, node: &NodeId, name: &str) -> Result<PendingDefId> {
        let state = self.snapshot_initialized()?;
        Self::node(&state, node)?;
        let request = PendingDef::new(node.clone(), name)?;
        let id = request.id.clone();
        self.proof_dir()
            .pending_def_store()
            .write(&node.to_string(), &request)?;
        Ok(id)
    }

    /// Drop a pending-def request. Idempotent.
    pub fn remove_pending_def(&self, node: &NodeId) -> Result<()> {
        self.proof_dir().pending_def_store().delete(&node.to_string())
    }

    /// Extract a lemma from a node. Defaults to the node's statement.
    pub fn extract_lemma(&self, node: &NodeId, statement: Option<&str>) -> Result<LemmaId> {
        let state = self.snapshot_initialized()?;
        let source = Self::node(&state, node)?;
        let lemma = Lemma::new(
            statement.unwrap_or(&source.statement),
            node.clone(),
        )?;
        let id = lemma.id.clone();
        self.ledger().append_if_sequence(
            EventKind::LemmaExtracted { lemma },
            state.latest_sequence(),
        )?;
        Ok(id)
    }

    /// The smallest unused child id under `parent`. Advisory only: no
    /// lock is held between this call and a later refine.
    pub fn allocate_child_id(&self, parent: &NodeId) -> Result<NodeId> {
        let state = self.snapshot_initialized()?;
        Self::node(&state, parent)?;
        Ok(parent.child(state.next_child_index(parent)))
    }
}
