//! Presentation layer: what the engine asks to have displayed.
//!
//! A presenter renders; it owns no tour logic. The control bar's buttons
//! call back into the engine through the host, never through the presenter.

use serde::{Deserialize, Serialize};

use super::placement::{Placement, TooltipSize};

/// Position within the current step array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Zero-based index of the step on screen
    pub index: usize,
    pub total: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {}", self.index + 1, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub title: String,
    pub body: String,
    pub progress: Progress,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn completion() -> Self {
        Self {
            title: "Tour complete!".to_string(),
            body: "Thanks for exploring the system.".to_string(),
        }
    }
}

pub trait Presenter {
    fn show_tooltip(&mut self, tooltip: &Tooltip);

    fn hide_tooltip(&mut self);

    /// Show or hide the pause/skip/stop bar
    fn set_controls_visible(&mut self, visible: bool);

    /// Reflect the pause state on the pause button
    fn set_paused(&mut self, paused: bool);

    fn show_notice(&mut self, notice: &Notice);

    fn hide_notice(&mut self);

    /// Rendered tooltip size, if the presenter can measure it
    fn measure_tooltip(&self) -> Option<TooltipSize> {
        None
    }
}

/// Everything a presenter was asked to do, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresenterEvent {
    Tooltip(Tooltip),
    TooltipHidden,
    Controls(bool),
    Paused(bool),
    Notice(Notice),
    NoticeHidden,
}

/// Presenter that only records, for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    events: Vec<PresenterEvent>,
    tooltip: Option<Tooltip>,
    notice: Option<Notice>,
    controls_visible: bool,
    paused: bool,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[PresenterEvent] {
        &self.events
    }

    /// Tooltip currently on screen
    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Titles of every tooltip shown so far
    pub fn titles(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Tooltip(t) => Some(t.title.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn show_tooltip(&mut self, tooltip: &Tooltip) {
        self.tooltip = Some(tooltip.clone());
        self.events.push(PresenterEvent::Tooltip(tooltip.clone()));
    }

    fn hide_tooltip(&mut self) {
        self.tooltip = None;
        self.events.push(PresenterEvent::TooltipHidden);
    }

    fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
        self.events.push(PresenterEvent::Controls(visible));
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.events.push(PresenterEvent::Paused(paused));
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.notice = Some(notice.clone());
        self.events.push(PresenterEvent::Notice(notice.clone()));
    }

    fn hide_notice(&mut self) {
        self.notice = None;
        self.events.push(PresenterEvent::NoticeHidden);
    }
}
