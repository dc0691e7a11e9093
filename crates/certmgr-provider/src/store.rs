//! JSON state file for a single tracked certificate.

use std::fs;
use std::path::{Path, PathBuf};

use certmgr_core::{Error, Result};
use tracing::debug;

use crate::state::CertificateState;

/// On-disk home of one resource's state.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load tracked state. A missing file means nothing is tracked.
    pub fn load(&self) -> Result<Option<CertificateState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::Config(format!(
                "Failed to read state file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let state = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse state file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(state))
    }

    /// Write state through a temp file and rename.
    pub fn save(&self, state: &CertificateState) -> Result<()> {
        let content = serde_json::to_string_pretty(state)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), "Saved certificate state");
        Ok(())
    }

    /// Stop tracking. Removing an absent file is not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
