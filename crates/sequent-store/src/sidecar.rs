//! JSON-per-record sidecar stores
//!
//! Assumptions, externals, and pending definitions live outside the
//! ledger as individual JSON files named by id, so they can be authored
//! out of band (including before the proof is initialized). Nothing here
//! is transactional with the ledger; the service merges these records
//! into the state at load time and never writes them back as events.

use crate::dir::ProofDir;
use sequent_core::{Assumption, External, PendingDef, ProofError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing::debug;

/// A directory of records, one JSON file per id.
#[derive(Debug, Clone)]
pub struct SidecarStore<T> {
    dir: PathBuf,
    _record: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> SidecarStore<T> {
    /// Open a store rooted at `dir` (created lazily on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _record: PhantomData,
        }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty()
            || id.contains(['/', '\\'])
            || id.contains("..")
        {
            return Err(ProofError::storage(format!(
                "sidecar id '{id}' is not filesystem-safe"
            )));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    /// Write (or overwrite) the record stored under `id`.
    pub fn write(&self, id: &str, record: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ProofError::storage(format!("failed to create sidecar dir: {}", e.kind()))
        })?;
        let path = self.path_for(id)?;
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json).map_err(|e| {
            ProofError::storage(format!("failed to write sidecar record {id}: {}", e.kind()))
        })?;
        debug!(id, "sidecar record written");
        Ok(())
    }

    /// Read the record stored under `id`, if present.
    pub fn read(&self, id: &str) -> Result<Option<T>> {
        let path = self.path_for(id)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ProofError::storage(format!(
                "failed to read sidecar record {id}: {}",
                err.kind()
            ))),
        }
    }

    /// All records, sorted by file name for deterministic order.
    pub fn list(&self) -> Result<Vec<T>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ProofError::storage(format!(
                    "failed to list sidecar dir: {}",
                    err.kind()
                )))
            }
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        files.sort();

        let mut records = Vec::with_capacity(files.len());
        for path in files {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ProofError::storage(format!("failed to read sidecar record: {}", e.kind()))
            })?;
            records.push(serde_json::from_str(&content)?);
        }
        Ok(records)
    }

    /// Delete the record stored under `id`. Idempotent: deleting a
    /// missing record succeeds.
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(id, "sidecar record deleted");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ProofError::storage(format!(
                "failed to delete sidecar record {id}: {}",
                err.kind()
            ))),
        }
    }
}

impl ProofDir {
    /// The assumptions sidecar.
    pub fn assumption_store(&self) -> SidecarStore<Assumption> {
        SidecarStore::new(self.assumptions())
    }

    /// The externals sidecar.
    pub fn external_store(&self) -> SidecarStore<External> {
        SidecarStore::new(self.externals())
    }

    /// The pending-definitions sidecar, keyed by requesting node id.
    pub fn pending_def_store(&self) -> SidecarStore<PendingDef> {
        SidecarStore::new(self.pending_defs())
    }
}
