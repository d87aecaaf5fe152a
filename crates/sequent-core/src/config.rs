//! Proof directory configuration
//!
//! Loaded from `meta.json` at the proof root. Absence of the file is not
//! an error; defaults apply. Unknown keys are ignored for forward
//! compatibility.

use crate::errors::{ProofError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default maximum node depth.
pub const DEFAULT_MAX_DEPTH: usize = 20;
/// Default maximum children per node.
pub const DEFAULT_MAX_CHILDREN: usize = 20;
/// Default maximum wait for the ledger append lock, in seconds.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 300;

/// Engine limits read from `meta.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    /// Reject operations whose node depth exceeds this.
    pub max_depth: usize,
    /// Reject refines that would push a parent's child count over this.
    pub max_children: usize,
    /// Maximum wait for the append lock, in seconds.
    #[serde(rename = "lock_timeout")]
    pub lock_timeout_secs: u64,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_children: DEFAULT_MAX_CHILDREN,
            lock_timeout_secs: DEFAULT_LOCK_TIMEOUT_SECS,
        }
    }
}

impl ProofConfig {
    /// The lock timeout as a [`Duration`].
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    /// Load from a `meta.json` path; a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProofError::storage(format!("failed to read meta.json: {}", e.kind())))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ProofError::serialization(format!("invalid meta.json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ProofError::schema_violation("max_depth must be positive"));
        }
        if self.max_children == 0 {
            return Err(ProofError::schema_violation(
                "max_children must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProofConfig::load_or_default(&dir.path().join("meta.json")).unwrap();
        assert_eq!(config, ProofConfig::default());
        assert_eq!(config.lock_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        std::fs::write(
            &path,
            r#"{"max_depth": 5, "lock_timeout": 10, "future_option": true}"#,
        )
        .unwrap();
        let config = ProofConfig::load_or_default(&path).unwrap();
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.max_children, DEFAULT_MAX_CHILDREN);
        assert_eq!(config.lock_timeout_secs, 10);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        std::fs::write(&path, r#"{"max_children": 0}"#).unwrap();
        assert!(ProofConfig::load_or_default(&path).is_err());
    }
}
