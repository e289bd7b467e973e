//! Branch resolution.
//!
//! Pure functions of page state: measure the probe, pick the arm, and
//! render the arm's copy. The engine only decides what to do with the
//! result.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::json;

use crate::page::Page;
use crate::steps::{BranchArm, BranchDefinition, Fallback, Probe, Step, StepAction};

/// Outcome of evaluating a branch against the live page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub count: usize,
    pub arm: Option<&'a BranchArm>,
}

pub fn evaluate_probe<P: Page + ?Sized>(page: &P, probe: &Probe) -> usize {
    match probe {
        Probe::Count { selector } => page.count(selector),
        Probe::OptionCount { selector } => page
            .query(selector)
            .map_or(0, |element| page.option_count(element)),
    }
}

pub fn resolve<'a, P: Page + ?Sized>(page: &P, branch: &'a BranchDefinition) -> Resolution<'a> {
    let count = evaluate_probe(page, &branch.probe);
    Resolution {
        count,
        arm: branch.arm_for(count),
    }
}

/// Renders `{{count}}` (and nothing else) into branch copy
pub struct BranchRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for BranchRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Copy is plain text
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(false);
        Self { handlebars }
    }

    pub fn render(&self, template: &str, count: usize) -> Result<String> {
        if !template.contains("{{") {
            return Ok(template.to_string());
        }
        self.handlebars
            .render_template(template, &json!({ "count": count }))
            .context("Failed to render branch copy")
    }

    /// The arm's steps with their copy rendered for `count`. Copy that
    /// fails to render is kept verbatim.
    pub fn render_arm(&self, arm: &BranchArm, count: usize) -> Vec<Step> {
        arm.steps
            .iter()
            .map(|step| {
                let mut step = step.clone();
                step.title = self.render_or_keep(&step.title, count);
                step.body = self.render_or_keep(&step.body, count);
                if let StepAction::Click {
                    fallback: Some(Fallback { title, body }),
                    ..
                } = &mut step.action
                {
                    *title = self.render_or_keep(title, count);
                    *body = self.render_or_keep(body, count);
                }
                step
            })
            .collect()
    }

    fn render_or_keep(&self, template: &str, count: usize) -> String {
        match self.render(template, count) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(error = %e, "Keeping unrendered branch copy");
                template.to_string()
            }
        }
    }
}
