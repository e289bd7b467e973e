//! Tour engine: the step interpreter.
//!
//! One engine is built per page load. It owns the current step array, the
//! index, the single highlighted-element slot and the single pending
//! advance. All waiting goes through [`timers::TimerQueue`]; the owner
//! moves time forward with [`TourEngine::advance_by`].
//!
//! Control operations never panic and never surface missing elements:
//! a step whose target is absent degrades to its narration and still
//! advances on schedule.

mod actions;
pub mod branch;
pub mod state;
pub mod timers;


pub use state::TourState;
pub use timers::{TimerQueue, TimerToken, Wakeup};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{Config, TimingConfig, TooltipConfig};
use crate::error::TourError;
use crate::page::{ElementId, Page};
use crate::session::{PersistenceBridge, SessionStore, SessionToken};
use crate::steps::{Step, TourCatalog};
use crate::ui::{place, Highlighter, Notice, Presenter, Progress, Tooltip, TooltipSize};
use branch::BranchRenderer;

/// What the page-load session check found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    /// No tour in progress
    Fresh,
    /// A persisted tour resumes once the resume delay elapses
    ResumeScheduled(SessionToken),
    /// The session was unusable and has been cleared
    Discarded(TourError),
    /// The session was already consulted on this page load
    AlreadyBooted,
}

/// Character-by-character fill in progress
#[derive(Debug, Clone)]
struct TypingJob {
    element: ElementId,
    chars: Vec<char>,
    typed: usize,
}

pub struct TourEngine<P: Page, S: SessionStore, V: Presenter> {
    catalog: Arc<TourCatalog>,
    timing: TimingConfig,
    tooltip: TooltipConfig,
    page: P,
    bridge: PersistenceBridge<S>,
    presenter: V,
    highlighter: Highlighter,
    renderer: BranchRenderer,
    timers: TimerQueue,

    state: TourState,
    tour_name: Option<String>,
    steps: Vec<Step>,
    paused: bool,

    /// The one pending advance (dwell or fill settle)
    advance: Option<TimerToken>,
    /// Pending sub-action of the current step: pre-step delay, next typed
    /// character, delayed click or navigation
    action: Option<TimerToken>,
    notice: Option<TimerToken>,
    resume: Option<(TimerToken, SessionToken)>,

    typing: Option<TypingJob>,
    /// Destination of the navigation waiting in `action`
    navigation: Option<String>,
    /// Navigation deferred by a pause
    held_navigation: Option<String>,
    /// Fields typed into on this page load
    injected: Vec<ElementId>,
    booted: bool,
}

impl<P: Page, S: SessionStore, V: Presenter> TourEngine<P, S, V> {
    pub fn new(catalog: Arc<TourCatalog>, config: &Config, page: P, store: S, presenter: V) -> Self {
        Self {
            catalog,
            timing: config.timing.clone(),
            tooltip: config.tooltip.clone(),
            page,
            bridge: PersistenceBridge::new(store),
            presenter,
            highlighter: Highlighter::new(config.highlight.emphasis()),
            renderer: BranchRenderer::new(),
            timers: TimerQueue::new(),
            state: TourState::Idle,
            tour_name: None,
            steps: Vec::new(),
            paused: false,
            advance: None,
            action: None,
            notice: None,
            resume: None,
            typing: None,
            navigation: None,
            held_navigation: None,
            injected: Vec::new(),
            booted: false,
        }
    }

    // ─── Page-load lifecycle ────────────────────────────────────────────

    /// Consult the persisted session. Only the first call per engine reads
    /// it, and only if no tour has been started on this page yet; a tour
    /// found there resumes after the resume delay.
    pub fn on_page_load(&mut self) -> BootOutcome {
        if self.booted {
            return BootOutcome::AlreadyBooted;
        }
        self.booted = true;

        match self.bridge.read() {
            Ok(None) => {
                debug!(page = self.page.location(), "No tour in progress");
                BootOutcome::Fresh
            }
            Ok(Some(token)) => {
                info!(
                    page = self.page.location(),
                    tour = %token.tour_name,
                    index = token.step_index,
                    "Tour in progress, scheduling resume"
                );
                let timer = self
                    .timers
                    .schedule(self.timing.resume_delay(), Wakeup::Resume);
                self.resume = Some((timer, token.clone()));
                BootOutcome::ResumeScheduled(token)
            }
            Err(e) => {
                warn!(error = %e, "Discarding unusable tour session");
                self.clear_session();
                BootOutcome::Discarded(e)
            }
        }
    }

    // ─── Control surface ────────────────────────────────────────────────

    /// Begin `name` at its first step, stopping any tour already running.
    /// An unknown name leaves the engine untouched.
    pub fn start(&mut self, name: &str) -> Result<(), TourError> {
        let steps = match self.catalog.get(name) {
            Ok(tour) => tour.steps.clone(),
            Err(e) => {
                warn!(tour = name, "Cannot start tour: not in catalog");
                return Err(e);
            }
        };

        // The session now belongs to this tour
        self.booted = true;
        if self.state.is_active() || self.resume.is_some() {
            self.stop();
        }

        info!(tour = name, steps = steps.len(), "Starting tour");
        self.load_tour(name, steps);
        self.persist(0);
        self.transition(TourState::Running { index: 0 });
        self.go_to(0);
        Ok(())
    }

    /// Continue `name` at `index`, as read from the session on page load
    pub fn resume_tour(&mut self, name: &str, index: usize) -> Result<(), TourError> {
        if let Some((timer, _)) = self.resume.take() {
            self.timers.cancel(timer);
        }

        let steps = match self.catalog.get(name) {
            Ok(tour) => tour.steps.clone(),
            Err(e) => {
                warn!(tour = name, index, "Cannot resume tour: not in catalog");
                self.clear_session();
                return Err(e);
            }
        };

        self.booted = true;
        if self.state.is_active() {
            self.stop();
        }

        info!(tour = name, index, "Resuming tour");
        self.load_tour(name, steps);
        self.persist(index);
        self.transition(TourState::Running { index });
        self.go_to(index);
        Ok(())
    }

    /// Move to the next step immediately, cancelling whatever the current
    /// step is waiting on (including typing in progress)
    pub fn next_step(&mut self) {
        let Some(index) = self.controllable_index() else {
            return;
        };
        info!(tour = self.tour_label(), from = index, "Skipping to next step");
        self.go_to(index + 1);
    }

    pub fn skip(&mut self) {
        self.next_step();
    }

    pub fn previous_step(&mut self) {
        let Some(index) = self.controllable_index() else {
            return;
        };
        if index == 0 {
            return;
        }
        info!(tour = self.tour_label(), from = index, "Going back one step");
        self.go_to(index - 1);
    }

    /// Freeze progression. Visible sub-actions (typing, a delayed click)
    /// finish, but nothing advances and a pending navigation is held.
    pub fn pause(&mut self) {
        if self.paused || self.controllable_index().is_none() {
            return;
        }
        self.paused = true;
        self.cancel_advance();
        if let Some(destination) = self.navigation.take() {
            if let Some(timer) = self.action.take() {
                self.timers.cancel(timer);
            }
            self.held_navigation = Some(destination);
        }
        self.presenter.set_paused(true);
        info!(tour = self.tour_label(), index = self.index(), "Tour paused");
    }

    pub fn resume_from_pause(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.presenter.set_paused(false);
        let Some(index) = self.controllable_index() else {
            return;
        };
        info!(tour = self.tour_label(), index, "Tour unpaused");

        if let Some(destination) = self.held_navigation.take() {
            self.schedule_navigation(destination);
            return;
        }
        // Typing completion drives the advance
        if self.typing.is_some() {
            return;
        }
        // Pre-step delay still pending: the step arms its own advance
        if matches!(self.state, TourState::Running { .. }) && self.action.is_some() {
            return;
        }
        self.arm_advance(self.timing.dwell());
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume_from_pause();
        } else {
            self.pause();
        }
    }

    /// Abandon the tour: cancel every timer, clear the session, tear down
    /// the UI and empty any field this page load typed into. Safe to call
    /// repeatedly.
    pub fn stop(&mut self) {
        if self.is_unloading() {
            debug!("Ignoring stop: page is unloading");
            return;
        }
        self.cancel_step_timers();
        if let Some((timer, _)) = self.resume.take() {
            self.timers.cancel(timer);
        }
        self.clear_session();
        self.highlighter.clear(&mut self.page);
        self.presenter.hide_tooltip();
        self.presenter.set_controls_visible(false);
        if self.paused {
            self.paused = false;
            self.presenter.set_paused(false);
        }
        self.clear_injected();

        if self.state != TourState::Stopped {
            info!(tour = self.tour_label(), state = %self.state, "Tour stopped");
        }
        self.transition(TourState::Stopped);
        self.tour_name = None;
        self.steps.clear();
    }

    // ─── Time ───────────────────────────────────────────────────────────

    /// Let `elapsed` pass, firing every wakeup that falls due in order.
    /// Processing halts once the page starts unloading.
    pub fn advance_by(&mut self, elapsed: Duration) {
        let until = self.timers.now() + elapsed;
        while !self.is_unloading() {
            let Some((token, wakeup)) = self.timers.pop_due(until) else {
                break;
            };
            self.fire(token, wakeup);
        }
        self.timers.advance_clock(until);
    }

    /// Time until the next wakeup, if any
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers
            .next_due()
            .map(|due| due.saturating_sub(self.timers.now()))
    }

    /// Time elapsed on this engine's clock since the page loaded
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    // ─── Accessors ──────────────────────────────────────────────────────

    pub fn state(&self) -> TourState {
        self.state
    }

    pub fn index(&self) -> Option<usize> {
        self.state.index()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_some()
    }

    pub fn tour_name(&self) -> Option<&str> {
        self.tour_name.as_deref()
    }

    /// Current step array (after any branch substitution)
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.index().and_then(|i| self.steps.get(i))
    }

    pub fn has_pending_advance(&self) -> bool {
        self.advance.is_some()
    }

    pub fn has_pending_resume(&self) -> bool {
        self.resume.is_some()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn highlighted(&self) -> Option<ElementId> {
        self.highlighter.current()
    }

    /// Where the page is navigating to; once set, this engine is done
    pub fn navigation_request(&self) -> Option<&str> {
        self.page.navigation_request()
    }

    pub fn is_unloading(&self) -> bool {
        self.page.navigation_request().is_some()
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn presenter(&self) -> &V {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut V {
        &mut self.presenter
    }

    pub fn session(&self) -> &S {
        self.bridge.store()
    }

    /// Tear the engine down, handing back the page and presenter
    pub fn into_parts(self) -> (P, V) {
        (self.page, self.presenter)
    }

    // ─── Internals ──────────────────────────────────────────────────────

    fn fire(&mut self, token: TimerToken, wakeup: Wakeup) {
        if self.advance == Some(token) {
            self.advance = None;
        }
        if self.action == Some(token) {
            self.action = None;
        }
        if self.notice == Some(token) {
            self.notice = None;
        }

        match wakeup {
            Wakeup::ExecuteStep => self.execute_current(),
            Wakeup::Advance => {
                if let Some(index) = self.state.index() {
                    debug!(tour = self.tour_label(), index, "Auto-advancing");
                    self.go_to(index + 1);
                }
            }
            Wakeup::TypeChar => self.type_next_char(),
            Wakeup::Click(element) => self.fire_click(element),
            Wakeup::Navigate(destination) => {
                self.navigation = None;
                info!(
                    tour = self.tour_label(),
                    from = self.page.location(),
                    to = %destination,
                    "Leaving page"
                );
                self.page.navigate(&destination);
            }
            Wakeup::DismissNotice => {
                self.presenter.hide_notice();
                if self.state == TourState::Finished {
                    self.transition(TourState::Idle);
                }
            }
            Wakeup::Resume => {
                let Some((_, token)) = self.resume.take() else {
                    return;
                };
                if let Err(e) = self.resume_tour(&token.tour_name, token.step_index) {
                    warn!(error = %e, "Persisted tour could not be resumed");
                }
            }
        }
    }

    /// Enter `Running(index)`, or finish if the array is exhausted. Every
    /// pending timer of the previous step is cancelled first.
    fn go_to(&mut self, index: usize) {
        self.cancel_step_timers();
        if index >= self.steps.len() {
            self.finish();
            return;
        }
        self.transition(TourState::Running { index });
        if self.timing.step_delay_ms > 0 {
            self.action = Some(
                self.timers
                    .schedule(self.timing.step_delay(), Wakeup::ExecuteStep),
            );
        } else {
            self.execute_current();
        }
    }

    fn finish(&mut self) {
        self.cancel_step_timers();
        self.clear_session();
        self.clear_injected();
        self.highlighter.clear(&mut self.page);
        self.presenter.hide_tooltip();
        self.presenter.set_controls_visible(false);
        if self.paused {
            self.paused = false;
            self.presenter.set_paused(false);
        }
        info!(tour = self.tour_label(), "Tour finished");
        self.transition(TourState::Finished);

        self.presenter.show_notice(&Notice::completion());
        if let Some(timer) = self.notice.take() {
            self.timers.cancel(timer);
        }
        self.notice = Some(
            self.timers
                .schedule(self.timing.notice(), Wakeup::DismissNotice),
        );
        self.tour_name = None;
        self.steps.clear();
    }

    fn load_tour(&mut self, name: &str, steps: Vec<Step>) {
        self.tour_name = Some(name.to_string());
        self.steps = steps;
        self.paused = false;
        self.presenter.set_paused(false);
        self.presenter.set_controls_visible(true);
    }

    fn transition(&mut self, next: TourState) {
        if !state::allowed(self.state, next) {
            error!(from = %self.state, to = %next, "Refusing illegal tour state transition");
            return;
        }
        if self.state != next {
            debug!(from = %self.state, to = %next, "Tour state transition");
        }
        self.state = next;
    }

    /// Index of the running step, unless the page is on its way out
    fn controllable_index(&self) -> Option<usize> {
        if self.is_unloading() {
            return None;
        }
        self.state.index()
    }

    fn tour_label(&self) -> &str {
        self.tour_name.as_deref().unwrap_or("-")
    }

    fn persist(&mut self, index: usize) {
        let Some(name) = self.tour_name.clone() else {
            return;
        };
        if let Err(e) = self.bridge.write(&SessionToken::new(name, index)) {
            error!(error = %e, index, "Failed to persist tour session");
        }
    }

    fn clear_session(&mut self) {
        if let Err(e) = self.bridge.clear() {
            error!(error = %e, "Failed to clear tour session");
        }
    }

    /// Schedule the advance, replacing any already pending. Does nothing
    /// while paused.
    fn arm_advance(&mut self, delay: Duration) {
        if self.paused {
            return;
        }
        self.cancel_advance();
        self.advance = Some(self.timers.schedule(delay, Wakeup::Advance));
    }

    fn cancel_advance(&mut self) {
        if let Some(timer) = self.advance.take() {
            self.timers.cancel(timer);
        }
    }

    fn cancel_step_timers(&mut self) {
        self.cancel_advance();
        if let Some(timer) = self.action.take() {
            self.timers.cancel(timer);
        }
        if let Some(job) = self.typing.take() {
            debug!(
                typed = job.typed,
                of = job.chars.len(),
                "Typing cut short"
            );
        }
        self.navigation = None;
        self.held_navigation = None;
    }

    fn schedule_navigation(&mut self, destination: String) {
        self.action = Some(self.timers.schedule(
            self.timing.navigate_delay(),
            Wakeup::Navigate(destination.clone()),
        ));
        self.navigation = Some(destination);
    }

    fn clear_injected(&mut self) {
        for element in std::mem::take(&mut self.injected) {
            self.page.set_value(element, "");
            self.page.dispatch_input(element);
        }
    }

    fn show_step_copy(&mut self, title: &str, body: &str) {
        let Some(index) = self.state.index() else {
            return;
        };
        let anchor = self.highlighter.current().map(|el| self.page.bounds(el));
        let size = self
            .presenter
            .measure_tooltip()
            .unwrap_or_else(|| TooltipSize::from(&self.tooltip));
        let placement = place(anchor, self.page.viewport(), size, &self.tooltip);
        self.presenter.show_tooltip(&Tooltip {
            title: title.to_string(),
            body: body.to_string(),
            progress: Progress {
                index,
                total: self.steps.len(),
            },
            placement,
        });
    }
}
