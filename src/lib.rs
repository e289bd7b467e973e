//! tourguide - guided walkthroughs for multi-page admin screens
//!
//! A tour is a scripted sequence of steps played over a live page: each
//! step narrates, emphasizes an element, types into a field, clicks, or
//! navigates to another document. Tours survive full page reloads through
//! a small persisted session, and can swap in alternate step sequences
//! depending on what the page currently shows.

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod logging;
pub mod page;
pub mod session;
pub mod steps;
pub mod ui;

pub use config::Config;
pub use engine::{BootOutcome, TourEngine, TourState};
pub use error::{CatalogError, TourError};
pub use host::{RunReport, TourHost};
pub use page::{MemoryPage, Page, SiteFixture};
pub use session::{FileSessionStore, MemorySessionStore, PersistenceBridge, SessionStore};
pub use steps::{Step, StepAction, TourCatalog};
