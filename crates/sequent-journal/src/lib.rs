//! # Sequent Journal - the proof ledger
//!
//! An append-only, crash-safe event log with compare-and-swap appends,
//! and the deterministic projector that replays it into a [`ProofState`]
//! snapshot. The ledger is the authoritative history of the proof;
//! everything in the state is derived from it (plus the ambient sidecar
//! records the service merges in).

#![forbid(unsafe_code)]

/// Event records and the closed event-kind sum
pub mod event;
/// Append-only storage with CAS and directory locking
pub mod ledger;
/// Deterministic replay
pub mod projector;
/// The projected state snapshot and its queries
pub mod state;

pub use event::{Event, EventKind};
pub use ledger::{BatchAppend, Ledger};
pub use projector::replay;
pub use state::ProofState;
