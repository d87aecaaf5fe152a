//! # Sequent Store - the filesystem sidecar
//!
//! Owns the on-disk layout of a proof directory and the JSON-per-record
//! sidecar stores for assumptions, externals, and pending definitions.
//! These records are intentionally outside the ledger so they can be
//! authored out of band; the service merges them into the state at load
//! time.

#![forbid(unsafe_code)]

/// Proof directory layout and configuration loading
pub mod dir;
/// One-JSON-file-per-record stores
pub mod sidecar;

pub use dir::ProofDir;
pub use sidecar::SidecarStore;
