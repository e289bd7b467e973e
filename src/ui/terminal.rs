//! Terminal presenter.
//!
//! Draws the tooltip and control bar with ratatui widgets into an
//! off-screen buffer, then prints the buffer as plain lines. Used by the
//! CLI `run` command.

use std::io::Write;

use ratatui::{
    buffer::Buffer,
    layout::Rect as Area,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use tracing::warn;

use super::presenter::{Notice, Presenter, Tooltip};

const DEFAULT_WIDTH: u16 = 64;

pub struct TerminalPresenter<W: Write> {
    out: W,
    width: u16,
    controls_visible: bool,
    paused: bool,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: DEFAULT_WIDTH,
            controls_visible: false,
            paused: false,
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width.max(24);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, buffer: &Buffer) {
        if let Err(e) = self.out.write_all(buffer_to_string(buffer).as_bytes()) {
            warn!(error = %e, "Failed to write tour output");
        }
        let _ = self.out.flush();
    }

    fn emit_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            warn!(error = %e, "Failed to write tour output");
        }
    }
}

/// Lines the body occupies when wrapped to `inner` columns
fn wrapped_height(text: &str, inner: u16) -> u16 {
    let inner = usize::from(inner.max(1));
    text.lines()
        .map(|l| l.chars().count().div_ceil(inner).max(1))
        .sum::<usize>()
        .max(1) as u16
}

pub fn render_tooltip(tooltip: &Tooltip, controls: Option<bool>, width: u16) -> Buffer {
    let inner = width.saturating_sub(2);
    // Word wrapping can spill one extra line per paragraph
    let body_height = wrapped_height(&tooltip.body, inner) + 1;
    let controls_height = if controls.is_some() { 2 } else { 0 };
    let height = body_height + 4 + controls_height;

    let area = Area::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);

    let mut lines = vec![Line::from(tooltip.body.clone()), Line::from("")];
    lines.push(Line::from(vec![
        Span::styled(
            tooltip.progress.to_string(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!(
            "  ({:?} @ {:.0},{:.0})",
            tooltip.placement.side, tooltip.placement.x, tooltip.placement.y
        )),
    ]));
    if let Some(paused) = controls {
        let pause_label = if paused { "[ Resume ]" } else { "[ Pause ]" };
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(pause_label, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" [ Skip ] [ Back ] [ Stop ]"),
        ]));
    }

    let block = Block::default()
        .title(format!(" {} ", tooltip.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .render(area, &mut buffer);

    buffer
}

pub fn render_notice(notice: &Notice, width: u16) -> Buffer {
    let area = Area::new(0, 0, width, 4);
    let mut buffer = Buffer::empty(area);
    Paragraph::new(Line::from(notice.body.clone()))
        .block(
            Block::default()
                .title(format!(" {} ", notice.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: true })
        .render(area, &mut buffer);
    buffer
}

/// Plain-text dump of a buffer, one line per row, trailing blanks trimmed
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buffer[(x, y)].symbol());
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn show_tooltip(&mut self, tooltip: &Tooltip) {
        let controls = self.controls_visible.then_some(self.paused);
        let buffer = render_tooltip(tooltip, controls, self.width);
        self.emit(&buffer);
    }

    fn hide_tooltip(&mut self) {}

    fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.emit_line(if paused { "-- paused --" } else { "-- resumed --" });
        }
        self.paused = paused;
    }

    fn show_notice(&mut self, notice: &Notice) {
        let buffer = render_notice(notice, self.width);
        self.emit(&buffer);
    }

    fn hide_notice(&mut self) {}
}
