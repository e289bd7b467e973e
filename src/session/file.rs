//! JSON-file session store.
//!
//! Used by the CLI so consecutive simulated page loads (and separate
//! `status` / `stop` invocations) see the same session slots. The file is
//! re-read on every access; nothing is cached between calls. A file that
//! does not parse reads as corrupt session state and is overwritten by the
//! next write or clear.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::SessionStore;
use crate::error::TourError;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    slots: BTreeMap<String, String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store backed by `<state_dir>/session.json`
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the slots were last written, if ever
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.load().ok().and_then(|f| f.updated_at)
    }

    fn load(&self) -> Result<SessionFile, TourError> {
        if !self.path.exists() {
            return Ok(SessionFile::default());
        }
        let contents = fs::read_to_string(&self.path)
            .context("Failed to read session file")
            .map_err(storage_error)?;
        serde_json::from_str(&contents).map_err(|e| {
            TourError::CorruptSessionState(format!("{}: {e}", self.path.display()))
        })
    }

    fn save(&self, file: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create state directory")?;
        }
        let contents = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), TourError> {
        let mut file = match self.load() {
            Ok(file) => file,
            Err(TourError::CorruptSessionState(reason)) => {
                warn!(path = %self.path.display(), %reason, "Replacing unreadable session file");
                SessionFile::default()
            }
            Err(e) => return Err(e),
        };
        apply(&mut file.slots);
        file.updated_at = Some(Utc::now());
        self.save(&file).map_err(storage_error)
    }
}

fn storage_error(err: anyhow::Error) -> TourError {
    TourError::Storage(format!("{err:#}"))
}

impl SessionStore for FileSessionStore {
    fn read_slot(&self, key: &str) -> Result<Option<String>, TourError> {
        let file = self.load()?;
        Ok(file.slots.get(key).cloned())
    }

    fn write_slot(&mut self, key: &str, value: &str) -> Result<(), TourError> {
        self.update(|slots| {
            slots.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_slot(&mut self, key: &str) -> Result<(), TourError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|slots| {
            slots.remove(key);
        })
    }
}
