pub mod highlight;
pub mod placement;
pub mod presenter;
pub mod terminal;

pub use highlight::Highlighter;
pub use placement::{place, Placement, Side, TooltipSize};
pub use presenter::{Notice, Presenter, PresenterEvent, Progress, RecordingPresenter, Tooltip};
pub use terminal::TerminalPresenter;
