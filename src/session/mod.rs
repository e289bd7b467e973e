//! Persistence bridge: the durable slot that carries a running tour across
//! full page reloads.
//!
//! The session triple lives in three independently named slots so that a
//! partially written triple can be told apart from "no tour". The bridge is
//! read exactly once per page load, before any other tour activity.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TourError;

pub const ACTIVE_SLOT: &str = "tourActive";
pub const NAME_SLOT: &str = "tourName";
pub const STEP_SLOT: &str = "tourStep";

/// Key/value storage that survives page reloads
pub trait SessionStore {
    fn read_slot(&self, key: &str) -> Result<Option<String>, TourError>;
    fn write_slot(&mut self, key: &str, value: &str) -> Result<(), TourError>;
    fn remove_slot(&mut self, key: &str) -> Result<(), TourError>;
}

/// Continuation token: where a tour picks up on the next page load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub tour_name: String,
    pub step_index: usize,
}

impl SessionToken {
    pub fn new(tour_name: impl Into<String>, step_index: usize) -> Self {
        Self {
            tour_name: tour_name.into(),
            step_index,
        }
    }
}

pub struct PersistenceBridge<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> PersistenceBridge<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Durably record `{active: true, name, index}`
    pub fn write(&mut self, token: &SessionToken) -> Result<(), TourError> {
        self.store.write_slot(ACTIVE_SLOT, "true")?;
        self.store.write_slot(NAME_SLOT, &token.tour_name)?;
        self.store.write_slot(STEP_SLOT, &token.step_index.to_string())?;
        info!(
            tour = %token.tour_name,
            index = token.step_index,
            "Persisted tour session"
        );
        Ok(())
    }

    /// The last written token, `None` if no tour is in progress, or
    /// `CorruptSessionState` if the slots are partially present or malformed
    pub fn read(&self) -> Result<Option<SessionToken>, TourError> {
        let active = self.store.read_slot(ACTIVE_SLOT)?;
        let name = self.store.read_slot(NAME_SLOT)?;
        let step = self.store.read_slot(STEP_SLOT)?;

        match (active, name, step) {
            (None, None, None) => Ok(None),
            (Some(active), Some(name), Some(step)) => {
                if active != "true" {
                    return Err(TourError::CorruptSessionState(format!(
                        "active flag is '{active}'"
                    )));
                }
                if name.trim().is_empty() {
                    return Err(TourError::CorruptSessionState(
                        "tour name is empty".to_string(),
                    ));
                }
                let step_index = step.trim().parse::<usize>().map_err(|_| {
                    TourError::CorruptSessionState(format!("step index '{step}' is not a number"))
                })?;
                Ok(Some(SessionToken {
                    tour_name: name,
                    step_index,
                }))
            }
            (active, name, step) => {
                let missing: Vec<&str> = [
                    (ACTIVE_SLOT, active.is_none()),
                    (NAME_SLOT, name.is_none()),
                    (STEP_SLOT, step.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(slot, _)| slot)
                .collect();
                Err(TourError::CorruptSessionState(format!(
                    "missing {}",
                    missing.join(", ")
                )))
            }
        }
    }

    pub fn clear(&mut self) -> Result<(), TourError> {
        self.store.remove_slot(ACTIVE_SLOT)?;
        self.store.remove_slot(NAME_SLOT)?;
        self.store.remove_slot(STEP_SLOT)?;
        debug!("Cleared tour session");
        Ok(())
    }
}
