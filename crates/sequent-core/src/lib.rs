//! # Sequent Core - Foundation
//!
//! Single source of truth for the proof engine's domain concepts:
//! identifiers, schema enumerations with their transition tables, entity
//! types, the unified error type, pure taint rules, cycle detection, and
//! configuration.
//!
//! This crate has zero dependencies on other workspace crates. It
//! contains no I/O beyond configuration loading and no orchestration
//! logic; the ledger lives in `sequent-journal`, sidecar persistence in
//! `sequent-store`, and invariant enforcement in `sequent-engine`.

#![forbid(unsafe_code)]

/// Engine limits loaded from `meta.json`
pub mod config;
/// Cycle detection over a dependency provider
pub mod cycle;
/// Node, definition, challenge, and amendment entities
pub mod entity;
/// Unified error handling
pub mod errors;
/// Node ids, agent ids, and opaque entity ids
pub mod identifiers;
/// Closed enumerations and transition validators
pub mod schema;
/// Pure taint computation and propagation
pub mod taint;
/// UTC instants, RFC-3339 on the wire
pub mod timestamp;

pub use config::ProofConfig;
pub use entity::{
    Amendment, Assumption, Challenge, Definition, External, Lemma, Node, PendingDef,
};
pub use errors::{ExitClass, ProofError, Result};
pub use identifiers::{
    AgentId, AmendmentId, AssumptionId, ChallengeId, DefId, ExternalId, LemmaId, NodeId,
    PendingDefId,
};
pub use schema::{
    ChallengeAspect, ChallengeSeverity, ChallengeStatus, EpistemicState, InferenceRule, NodeKind,
    TaintState, WorkflowState,
};
pub use timestamp::Timestamp;
