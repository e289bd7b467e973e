//! Multi-page site fixture.
//!
//! A site is a map from document location to the element tree rendered
//! there. Loading a location yields a fresh [`MemoryPage`], which is how a
//! full page reload is simulated: nothing from the previous load survives.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::memory::{MemoryPage, PageSpec};

const DEMO_SITE: &str = include_str!("demo_site.yaml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFixture {
    #[serde(default)]
    pages: BTreeMap<String, PageSpec>,
}

impl SiteFixture {
    /// Inventory admin screens the built-in tours are written against
    pub fn demo() -> Result<Self> {
        Self::from_yaml_str(DEMO_SITE).context("Failed to parse embedded demo site")
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read site fixture: {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse site fixture: {}", path.display()))
    }

    pub fn insert(&mut self, location: impl Into<String>, page: PageSpec) {
        self.pages.insert(location.into(), page);
    }

    pub fn contains(&self, location: &str) -> bool {
        self.pages.contains_key(document_name(location))
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Render `location` from scratch. Unknown documents load as an empty
    /// page so a tour still degrades step by step instead of failing.
    pub fn load_page(&self, location: &str) -> MemoryPage {
        let name = document_name(location);
        match self.pages.get(name) {
            Some(spec) => MemoryPage::from_spec(name, spec),
            None => {
                warn!(location = name, "Document not in site fixture, loading empty page");
                MemoryPage::new(name)
            }
        }
    }
}

/// Strip query string and fragment from a location
fn document_name(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    &location[..end]
}
