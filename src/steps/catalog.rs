//! Step catalog: named tour definitions and the branch tables that
//! `check_condition` steps swap in.
//!
//! The catalog is pure data. Deciding which branch arm applies is done by
//! [`crate::engine::branch`] against live page state.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::descriptor::{Step, StepAction, StepKind};
use crate::error::{CatalogError, TourError};

const BUILTIN_CATALOG: &str = include_str!("builtin.yaml");

/// A named, ordered, immutable sequence of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourDefinition {
    /// Filled in from the catalog key when loading
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
}

impl TourDefinition {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True if any step leaves the current document
    pub fn spans_pages(&self) -> bool {
        self.steps.iter().any(|s| s.kind() == StepKind::Navigate)
    }
}

/// What a branch measures on the live page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Probe {
    /// Number of elements matching `selector`
    Count { selector: String },
    /// Number of options offered by the select element matching `selector`
    OptionCount { selector: String },
}

impl Probe {
    pub fn selector(&self) -> &str {
        match self {
            Probe::Count { selector } | Probe::OptionCount { selector } => selector,
        }
    }
}

/// One alternate step sequence, chosen when the probe result falls in
/// `min..=max`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchArm {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    pub steps: Vec<Step>,
}

impl BranchArm {
    pub fn matches(&self, count: usize) -> bool {
        self.min.map_or(true, |min| count >= min) && self.max.map_or(true, |max| count <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDefinition {
    pub probe: Probe,
    pub arms: Vec<BranchArm>,
}

impl BranchDefinition {
    /// First arm whose range contains `count`
    pub fn arm_for(&self, count: usize) -> Option<&BranchArm> {
        self.arms.iter().find(|arm| arm.matches(count))
    }
}

/// Mapping from tour name to its script, plus the branch tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TourCatalog {
    #[serde(default)]
    tours: BTreeMap<String, TourDefinition>,
    #[serde(default)]
    branches: BTreeMap<String, BranchDefinition>,
}

impl TourCatalog {
    /// The scripts shipped with the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let mut catalog: TourCatalog = serde_yaml::from_str(yaml)?;
        for (name, tour) in &mut catalog.tours {
            tour.name = name.clone();
        }
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Check the structural rules every catalog must satisfy:
    /// tours are non-empty, branch references resolve, branches have arms,
    /// and no branch arm navigates (its index could not be re-derived after
    /// the page reloads).
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (name, tour) in &self.tours {
            if tour.is_empty() {
                return Err(CatalogError::EmptyTour(name.clone()));
            }
            self.check_branch_refs(name, &tour.steps)?;
        }

        for (name, branch) in &self.branches {
            if branch.arms.is_empty() {
                return Err(CatalogError::EmptyBranch(name.clone()));
            }
            for (arm_index, arm) in branch.arms.iter().enumerate() {
                if let Some(index) = arm
                    .steps
                    .iter()
                    .position(|s| s.kind() == StepKind::Navigate)
                {
                    return Err(CatalogError::NavigateInBranch {
                        branch: name.clone(),
                        arm: arm_index,
                        index,
                    });
                }
                self.check_branch_refs(name, &arm.steps)?;
            }
        }

        Ok(())
    }

    fn check_branch_refs(&self, owner: &str, steps: &[Step]) -> Result<(), CatalogError> {
        for (index, step) in steps.iter().enumerate() {
            if let StepAction::CheckCondition { branch } = &step.action {
                if !self.branches.contains_key(branch) {
                    return Err(CatalogError::UnknownBranch {
                        tour: owner.to_string(),
                        index,
                        branch: branch.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve a tour by name
    pub fn get(&self, name: &str) -> Result<&TourDefinition, TourError> {
        self.tours
            .get(name)
            .ok_or_else(|| TourError::UnknownTour(name.to_string()))
    }

    pub fn branch(&self, name: &str) -> Option<&BranchDefinition> {
        self.branches.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tours.contains_key(name)
    }

    /// Tour names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tours.keys().map(String::as_str)
    }

    pub fn tours(&self) -> impl Iterator<Item = &TourDefinition> {
        self.tours.values()
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    /// Add or replace a tour (used when assembling catalogs in code)
    pub fn insert_tour(&mut self, name: impl Into<String>, steps: Vec<Step>) {
        let name = name.into();
        self.tours
            .insert(name.clone(), TourDefinition::new(name, steps));
    }

    pub fn insert_branch(&mut self, name: impl Into<String>, branch: BranchDefinition) {
        self.branches.insert(name.into(), branch);
    }
}
