//! Proof directory layout
//!
//! ```text
//! <proof>/
//!   meta.json          configuration (absent means defaults)
//!   ledger/            append-only event log + lock file
//!   nodes/             advisory node snapshots
//!   defs/              advisory definition snapshots
//!   assumptions/       sidecar records, one JSON file per id
//!   externals/         sidecar records, one JSON file per id
//!   pending_defs/      sidecar records, one JSON file per node id
//!   lemmas/            advisory lemma snapshots
//!   locks/             auxiliary lock files
//! ```
//!
//! Only the ledger and the three sidecar directories carry state the
//! engine reads; the advisory directories exist for external tooling.

use sequent_core::{ProofConfig, ProofError, Result};
use std::path::{Path, PathBuf};

const SUBDIRS: [&str; 8] = [
    "ledger",
    "nodes",
    "defs",
    "assumptions",
    "externals",
    "pending_defs",
    "lemmas",
    "locks",
];

/// Root of one proof's on-disk layout.
#[derive(Debug, Clone)]
pub struct ProofDir {
    root: PathBuf,
}

impl ProofDir {
    /// Wrap an existing or soon-to-exist proof directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the full directory layout. Idempotent.
    pub fn ensure_layout(&self) -> Result<()> {
        for sub in SUBDIRS {
            std::fs::create_dir_all(self.root.join(sub)).map_err(|e| {
                ProofError::storage(format!("failed to create {sub} directory: {}", e.kind()))
            })?;
        }
        Ok(())
    }

    /// The proof root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The ledger directory.
    pub fn ledger(&self) -> PathBuf {
        self.root.join("ledger")
    }

    /// The assumptions sidecar directory.
    pub fn assumptions(&self) -> PathBuf {
        self.root.join("assumptions")
    }

    /// The externals sidecar directory.
    pub fn externals(&self) -> PathBuf {
        self.root.join("externals")
    }

    /// The pending-definitions sidecar directory.
    pub fn pending_defs(&self) -> PathBuf {
        self.root.join("pending_defs")
    }

    /// Load `meta.json`, falling back to defaults when absent.
    pub fn load_config(&self) -> Result<ProofConfig> {
        ProofConfig::load_or_default(&self.root.join("meta.json"))
    }
}
