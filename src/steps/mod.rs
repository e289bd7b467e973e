//! Tour scripts: step descriptors and the catalog that names them

pub mod catalog;
pub mod descriptor;

pub use catalog::{BranchArm, BranchDefinition, Probe, TourCatalog, TourDefinition};
pub use descriptor::{Fallback, Step, StepAction, StepKind};
