//! Per-kind step execution.
//!
//! Every branch here either arms the advance or hands control to a
//! sub-action (typing, delayed click, navigation) that arms it later.

use tracing::{debug, info, warn};

use super::state::TourState;
use super::timers::Wakeup;
use super::{TourEngine, TypingJob};
use crate::error::TourError;
use crate::page::{ElementId, Page};
use crate::session::SessionStore;
use crate::steps::{Fallback, StepAction};
use crate::ui::Presenter;

impl<P: Page, S: SessionStore, V: Presenter> TourEngine<P, S, V> {
    /// Run the action of the step at the current index
    pub(super) fn execute_current(&mut self) {
        let Some(index) = self.state.index() else {
            return;
        };
        let Some(step) = self.steps.get(index).cloned() else {
            return;
        };
        debug!(
            tour = self.tour_label(),
            index,
            kind = %step.kind(),
            title = %step.title,
            "Executing step"
        );

        match &step.action {
            StepAction::Message => {
                self.highlighter.clear(&mut self.page);
                self.show_step_copy(&step.title, &step.body);
                self.arm_advance(self.timing.dwell());
            }
            StepAction::Highlight { target } => {
                self.highlight_target(target);
                self.show_step_copy(&step.title, &step.body);
                self.arm_advance(self.timing.dwell());
            }
            StepAction::FillField { target, value } => {
                self.start_fill(index, target, value, &step.title, &step.body);
            }
            StepAction::Click { target, fallback } => {
                self.start_click(index, target, fallback.as_ref(), &step.title, &step.body);
            }
            StepAction::Navigate { destination } => {
                self.start_navigation(index, destination, &step.title, &step.body);
            }
            StepAction::CheckCondition { branch } => {
                self.check_condition(branch, &step.title, &step.body);
            }
            StepAction::ClearForm { fields, uncheck } => {
                self.clear_form(fields, uncheck.as_deref());
                self.show_step_copy(&step.title, &step.body);
                self.arm_advance(self.timing.dwell());
            }
        }
    }

    /// Emphasize `target`, or drop any emphasis if it is not on the page
    fn highlight_target(&mut self, target: &str) -> Option<ElementId> {
        match self.page.query(target) {
            Some(element) => {
                self.highlighter.highlight(&mut self.page, element);
                Some(element)
            }
            None => {
                let missing = TourError::TargetNotFound(target.to_string());
                debug!(error = %missing, page = self.page.location(), "Step target absent");
                self.highlighter.clear(&mut self.page);
                None
            }
        }
    }

    // ─── Fill ───────────────────────────────────────────────────────────

    fn start_fill(&mut self, index: usize, target: &str, value: &str, title: &str, body: &str) {
        let Some(element) = self.highlight_target(target) else {
            self.show_step_copy(title, body);
            self.arm_advance(self.timing.dwell());
            return;
        };

        self.page.focus(element);
        self.page.set_value(element, "");
        if !self.injected.contains(&element) {
            self.injected.push(element);
        }
        self.show_step_copy(title, body);
        self.transition(TourState::AwaitingSubAction { index });

        self.typing = Some(TypingJob {
            element,
            chars: value.chars().collect(),
            typed: 0,
        });
        if value.is_empty() {
            self.finish_typing();
            return;
        }
        self.action = Some(
            self.timers
                .schedule(self.timing.type_interval(), Wakeup::TypeChar),
        );
    }

    /// Append one character and notify listeners; the last one hands over
    /// to the settle delay
    pub(super) fn type_next_char(&mut self) {
        let Some(job) = self.typing.as_mut() else {
            return;
        };
        let Some(&next) = job.chars.get(job.typed) else {
            self.finish_typing();
            return;
        };
        job.typed += 1;
        let element = job.element;
        let done = job.typed >= job.chars.len();

        let mut value = self.page.value(element);
        value.push(next);
        self.page.set_value(element, &value);
        self.page.dispatch_input(element);

        if done {
            self.finish_typing();
        } else {
            self.action = Some(
                self.timers
                    .schedule(self.timing.type_interval(), Wakeup::TypeChar),
            );
        }
    }

    fn finish_typing(&mut self) {
        let Some(job) = self.typing.take() else {
            return;
        };
        let Some(index) = self.state.index() else {
            return;
        };
        debug!(
            tour = self.tour_label(),
            index,
            chars = job.chars.len(),
            "Fill complete"
        );
        self.transition(TourState::Running { index });
        self.arm_advance(self.timing.fill_settle());
    }

    // ─── Click ──────────────────────────────────────────────────────────

    fn start_click(
        &mut self,
        index: usize,
        target: &str,
        fallback: Option<&Fallback>,
        title: &str,
        body: &str,
    ) {
        match self.highlight_target(target) {
            Some(element) => {
                self.show_step_copy(title, body);
                self.transition(TourState::AwaitingSubAction { index });
                self.action = Some(
                    self.timers
                        .schedule(self.timing.click_delay(), Wakeup::Click(element)),
                );
            }
            None => match fallback {
                Some(fallback) => self.show_step_copy(&fallback.title, &fallback.body),
                None => self.show_step_copy(title, body),
            },
        }
        self.arm_advance(self.timing.dwell());
    }

    pub(super) fn fire_click(&mut self, element: ElementId) {
        debug!(tour = self.tour_label(), element = element.0, "Clicking target");
        self.page.click(element);
        if self.is_unloading() {
            return;
        }
        if let TourState::AwaitingSubAction { index } = self.state {
            self.transition(TourState::Running { index });
        }
    }

    // ─── Navigate ───────────────────────────────────────────────────────

    fn start_navigation(&mut self, index: usize, destination: &str, title: &str, body: &str) {
        self.highlighter.clear(&mut self.page);
        self.persist(index + 1);
        self.show_step_copy(title, body);
        self.transition(TourState::AwaitingSubAction { index });
        if self.paused {
            debug!(to = destination, "Holding navigation while paused");
            self.held_navigation = Some(destination.to_string());
        } else {
            self.schedule_navigation(destination.to_string());
        }
    }

    // ─── Branch ─────────────────────────────────────────────────────────

    fn check_condition(&mut self, branch_name: &str, title: &str, body: &str) {
        let catalog = self.catalog.clone();
        let Some(branch) = catalog.branch(branch_name) else {
            warn!(branch = branch_name, "Unknown branch, continuing linearly");
            self.show_step_copy(title, body);
            self.arm_advance(self.timing.dwell());
            return;
        };

        let resolution = super::branch::resolve(&self.page, branch);
        let Some(arm) = resolution.arm else {
            warn!(
                branch = branch_name,
                count = resolution.count,
                "No branch arm matches, continuing linearly"
            );
            self.show_step_copy(title, body);
            self.arm_advance(self.timing.dwell());
            return;
        };

        info!(
            tour = self.tour_label(),
            branch = branch_name,
            arm = %arm.label,
            count = resolution.count,
            steps = arm.steps.len(),
            "Substituting branch"
        );
        self.steps = self.renderer.render_arm(arm, resolution.count);
        self.go_to(0);
    }

    // ─── Clear form ─────────────────────────────────────────────────────

    fn clear_form(&mut self, fields: &[String], uncheck: Option<&str>) {
        self.highlighter.clear(&mut self.page);
        for selector in fields {
            if let Some(element) = self.page.query(selector) {
                self.page.set_value(element, "");
                self.page.dispatch_input(element);
                self.injected.retain(|e| *e != element);
            }
        }
        if let Some(selector) = uncheck {
            for element in self.page.query_all(selector) {
                self.page.set_checked(element, false);
            }
        }
    }
}
