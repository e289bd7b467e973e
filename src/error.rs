//! Error taxonomy for the tour engine.
//!
//! None of these ever escape as a panic: the engine either degrades a single
//! step (`TargetNotFound`) or aborts the whole tour cleanly.

use thiserror::Error;

/// Errors raised by tour control operations and the persistence bridge
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TourError {
    #[error("tour '{0}' is not defined in the catalog")]
    UnknownTour(String),

    /// Selector matched nothing. Swallowed by the interpreter; the step
    /// still advances on schedule.
    #[error("no element matches selector '{0}'")]
    TargetNotFound(String),

    #[error("persisted tour session is corrupt: {0}")]
    CorruptSessionState(String),

    #[error("session storage failed: {0}")]
    Storage(String),
}

/// Errors raised while loading or validating a step catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("tour '{0}' has no steps")]
    EmptyTour(String),

    #[error("tour '{tour}' step {index} references undefined branch '{branch}'")]
    UnknownBranch {
        tour: String,
        index: usize,
        branch: String,
    },

    #[error("branch '{branch}' arm {arm} contains a navigate step (step {index})")]
    NavigateInBranch {
        branch: String,
        arm: usize,
        index: usize,
    },

    #[error("branch '{0}' has no arms")]
    EmptyBranch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tour_message_names_the_tour() {
        let err = TourError::UnknownTour("editar-sala".to_string());
        assert_eq!(
            err.to_string(),
            "tour 'editar-sala' is not defined in the catalog"
        );
    }

    #[test]
    fn test_navigate_in_branch_message() {
        let err = CatalogError::NavigateInBranch {
            branch: "rooms".to_string(),
            arm: 1,
            index: 3,
        };
        assert!(err.to_string().contains("branch 'rooms' arm 1"));
    }
}
