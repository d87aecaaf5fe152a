//! # Sequent Engine - the service facade
//!
//! `ProofService` composes the ledger, projector, cycle detection, taint
//! propagation, and filesystem sidecar into the single entry point that
//! enforces the proof's semantic invariants. Operations are grouped by
//! role:
//!
//! - **Query**: `load_state`, `pending_nodes`, `available_nodes`,
//!   `status`, `path`, `expired_claims`
//! - **Prover**: `claim`, `refresh_claim`, `release`, `refine`,
//!   `refine_bulk`, `amend`, `add_definition`, `add_assumption`,
//!   `add_external`, `request_definition`, `extract_lemma`,
//!   `allocate_child_id`
//! - **Verifier**: `accept`, `accept_with_note`, `accept_bulk`, `admit`,
//!   `refute`, `archive`, `request_refinement`, `raise_challenge`,
//!   `resolve_challenge`
//! - **Admin**: `init`, `create_node`, `recompute_all_taint`
//!
//! Concurrency is optimistic: every mutating call captures the ledger
//! sequence it loaded and commits with compare-and-swap. Losers of a
//! race receive `ConcurrentModification` and retry after reloading.

#![forbid(unsafe_code)]

/// Admin operations: init, create_node, taint sweep
mod admin;
/// `def:`/`ext:` citation scanning
pub mod citations;
/// Prover operations: claims, refinement, amendment, ambient authoring
mod prover;
/// Query operations
mod query;
/// The service type and shared mutation plumbing
mod service;
/// Verifier operations: judgments and challenges
mod verifier;

pub use query::NodeStatus;
pub use service::{ProofService, RefineSpec};
