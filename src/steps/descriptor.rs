//! Step descriptors: the inert unit of a tour script.
//!
//! Each action variant carries exactly the fields its kind needs, so a
//! descriptor can never hold parameters irrelevant to what it does.

use serde::{Deserialize, Serialize};

/// Discriminant of a step action, used for logging and dispatch tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Message,
    Highlight,
    FillField,
    Click,
    Navigate,
    CheckCondition,
    ClearForm,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Message => "message",
            StepKind::Highlight => "highlight",
            StepKind::FillField => "fill_field",
            StepKind::Click => "click",
            StepKind::Navigate => "navigate",
            StepKind::CheckCondition => "check_condition",
            StepKind::ClearForm => "clear_form",
        }
    }

    /// Steps whose missing target degrades to a no-op instead of aborting
    pub fn tolerates_missing_target(&self) -> bool {
        matches!(
            self,
            StepKind::Highlight | StepKind::Click | StepKind::FillField
        )
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alternate copy shown by a click step whose target is absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fallback {
    pub title: String,
    pub body: String,
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Narration only; the tooltip centers on screen
    Message,
    /// Emphasize one element
    Highlight { target: String },
    /// Type `value` into `target` one character at a time
    FillField { target: String, value: String },
    /// Emphasize `target`, then invoke its click behavior after a delay
    Click {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<Fallback>,
    },
    /// Persist the continuation and load another document
    Navigate { destination: String },
    /// Replace the remaining steps with one arm of a named branch
    CheckCondition { branch: String },
    /// Empty the listed fields and uncheck matching checkboxes
    ClearForm {
        fields: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uncheck: Option<String>,
    },
}

impl StepAction {
    pub fn kind(&self) -> StepKind {
        match self {
            StepAction::Message => StepKind::Message,
            StepAction::Highlight { .. } => StepKind::Highlight,
            StepAction::FillField { .. } => StepKind::FillField,
            StepAction::Click { .. } => StepKind::Click,
            StepAction::Navigate { .. } => StepKind::Navigate,
            StepAction::CheckCondition { .. } => StepKind::CheckCondition,
            StepAction::ClearForm { .. } => StepKind::ClearForm,
        }
    }

    /// Selector of the element this action operates on, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            StepAction::Highlight { target }
            | StepAction::FillField { target, .. }
            | StepAction::Click { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// One unit of tour script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    pub body: String,
    #[serde(flatten)]
    pub action: StepAction,
}

impl Step {
    pub fn new(title: impl Into<String>, body: impl Into<String>, action: StepAction) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            action,
        }
    }

    pub fn message(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, StepAction::Message)
    }

    pub fn highlight(
        title: impl Into<String>,
        body: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::new(
            title,
            body,
            StepAction::Highlight {
                target: target.into(),
            },
        )
    }

    pub fn fill(
        title: impl Into<String>,
        body: impl Into<String>,
        target: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(
            title,
            body,
            StepAction::FillField {
                target: target.into(),
                value: value.into(),
            },
        )
    }

    pub fn click(
        title: impl Into<String>,
        body: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::new(
            title,
            body,
            StepAction::Click {
                target: target.into(),
                fallback: None,
            },
        )
    }

    pub fn navigate(
        title: impl Into<String>,
        body: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self::new(
            title,
            body,
            StepAction::Navigate {
                destination: destination.into(),
            },
        )
    }

    pub fn check(
        title: impl Into<String>,
        body: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self::new(
            title,
            body,
            StepAction::CheckCondition {
                branch: branch.into(),
            },
        )
    }

    pub fn kind(&self) -> StepKind {
        self.action.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_action() {
        assert_eq!(Step::message("a", "b").kind(), StepKind::Message);
        assert_eq!(
            Step::fill("a", "b", "#nome", "Sala").kind(),
            StepKind::FillField
        );
        assert_eq!(
            Step::navigate("a", "b", "adicionar-sala.html").kind(),
            StepKind::Navigate
        );
    }

    #[test]
    fn test_target_only_for_element_actions() {
        assert_eq!(Step::highlight("a", "b", "#x").action.target(), Some("#x"));
        assert_eq!(Step::message("a", "b").action.target(), None);
        assert_eq!(Step::check("a", "b", "rooms").action.target(), None);
    }

    #[test]
    fn test_yaml_shape_is_flat() {
        let yaml = r##"
title: Name field
body: Typing the name
action: fill_field
target: "#nome"
value: Sala Demo Tour
"##;
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            step.action,
            StepAction::FillField {
                target: "#nome".to_string(),
                value: "Sala Demo Tour".to_string(),
            }
        );
    }

    #[test]
    fn test_click_fallback_is_optional() {
        let yaml = r#"
title: Submit
body: Clicking submit
action: click
target: button[type="submit"]
"#;
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(step.action, StepAction::Click { fallback: None, .. }));
    }

    #[test]
    fn test_missing_target_tolerance() {
        assert!(StepKind::Highlight.tolerates_missing_target());
        assert!(StepKind::Click.tolerates_missing_target());
        assert!(StepKind::FillField.tolerates_missing_target());
        assert!(!StepKind::CheckCondition.tolerates_missing_target());
    }
}
