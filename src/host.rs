//! Page-load driver.
//!
//! Plays the role of the browser: loads a document from the site fixture,
//! boots a fresh engine on it, lets time pass, and when the engine's page
//! starts navigating loads the next document with a brand-new engine that
//! shares only the session store. Nothing else carries over between loads.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Config;
use crate::engine::{BootOutcome, TourEngine, TourState};
use crate::page::{MemoryPage, SiteFixture};
use crate::session::SessionStore;
use crate::steps::TourCatalog;
use crate::ui::Presenter;

const DEFAULT_MAX_PAGE_LOADS: usize = 32;

pub type PageEngine<S, V> = TourEngine<MemoryPage, S, V>;

/// One document load during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub location: String,
    pub boot: String,
    /// Time spent on this page
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub visits: Vec<Visit>,
    pub final_state: String,
    pub elapsed_ms: u64,
    pub interrupted: bool,
}

impl RunReport {
    pub fn locations(&self) -> Vec<&str> {
        self.visits.iter().map(|v| v.location.as_str()).collect()
    }
}

pub struct TourHost<S: SessionStore + Clone> {
    catalog: Arc<TourCatalog>,
    config: Config,
    site: SiteFixture,
    store: S,
    max_page_loads: usize,
    shutdown_rx: Option<mpsc::Receiver<()>>,
}

impl<S: SessionStore + Clone> TourHost<S> {
    pub fn new(catalog: Arc<TourCatalog>, config: Config, site: SiteFixture, store: S) -> Self {
        Self {
            catalog,
            config,
            site,
            store,
            max_page_loads: DEFAULT_MAX_PAGE_LOADS,
            shutdown_rx: None,
        }
    }

    pub fn with_max_page_loads(mut self, max: usize) -> Self {
        self.max_page_loads = max.max(1);
        self
    }

    /// Stop the tour when a message arrives (wall-clock runs only)
    pub fn with_shutdown(mut self, rx: mpsc::Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load `location` from scratch and run the page-load session check
    pub fn open<V: Presenter>(&self, location: &str, presenter: V) -> (PageEngine<S, V>, BootOutcome) {
        let page = self.site.load_page(location);
        let mut engine = TourEngine::new(
            self.catalog.clone(),
            &self.config,
            page,
            self.store.clone(),
            presenter,
        );
        let boot = engine.on_page_load();
        debug!(location, boot = ?boot, "Page loaded");
        (engine, boot)
    }

    /// Run on a virtual clock until no page has anything left to do.
    /// `start` begins a tour on the first page, as a user click would.
    pub fn run_virtual<V: Presenter>(
        &mut self,
        location: &str,
        start: Option<&str>,
        presenter: V,
    ) -> Result<(RunReport, V)> {
        let mut run = Run::new(location, start, presenter);
        loop {
            run.check_budget(self.max_page_loads)?;
            let mut engine = run.load(self)?;
            while let Some(wait) = engine.next_deadline() {
                if engine.is_unloading() {
                    break;
                }
                engine.advance_by(wait);
            }
            if run.leave(engine) {
                return run.finish(false);
            }
        }
    }

    /// Run against the wall clock, sleeping until each wakeup is due. A
    /// shutdown message stops the tour the way the Stop button would.
    pub async fn run_realtime<V: Presenter>(
        &mut self,
        location: &str,
        start: Option<&str>,
        presenter: V,
    ) -> Result<(RunReport, V)> {
        let mut run = Run::new(location, start, presenter);
        let mut interrupted = false;
        loop {
            run.check_budget(self.max_page_loads)?;
            let mut engine = run.load(self)?;
            while let Some(wait) = engine.next_deadline() {
                if engine.is_unloading() {
                    break;
                }
                tokio::select! {
                    () = tokio::time::sleep(wait) => engine.advance_by(wait),
                    _ = async {
                        if let Some(ref mut rx) = self.shutdown_rx {
                            rx.recv().await
                        } else {
                            std::future::pending::<Option<()>>().await
                        }
                    } => {
                        info!("Shutdown requested, stopping tour");
                        engine.stop();
                        interrupted = true;
                        break;
                    }
                }
            }
            if run.leave(engine) || interrupted {
                return run.finish(interrupted);
            }
        }
    }
}

/// Bookkeeping shared by the virtual and wall-clock drivers
struct Run<V> {
    location: String,
    start: Option<String>,
    presenter: Option<V>,
    visits: Vec<Visit>,
    elapsed: Duration,
    final_state: TourState,
}

impl<V: Presenter> Run<V> {
    fn new(location: &str, start: Option<&str>, presenter: V) -> Self {
        Self {
            location: location.to_string(),
            start: start.map(str::to_string),
            presenter: Some(presenter),
            visits: Vec::new(),
            elapsed: Duration::ZERO,
            final_state: TourState::Idle,
        }
    }

    fn check_budget(&self, max_page_loads: usize) -> Result<()> {
        if self.visits.len() >= max_page_loads {
            bail!(
                "Tour did not settle after {} page loads (last: {})",
                self.visits.len(),
                self.location
            );
        }
        Ok(())
    }

    fn load<S: SessionStore + Clone>(&mut self, host: &TourHost<S>) -> Result<PageEngine<S, V>> {
        let Some(presenter) = self.presenter.take() else {
            bail!("Presenter already consumed");
        };
        let (mut engine, boot) = host.open(&self.location, presenter);
        self.visits.push(Visit {
            location: self.location.clone(),
            boot: boot_label(&boot),
            elapsed_ms: 0,
        });
        if let Some(name) = self.start.take() {
            engine.start(&name)?;
        }
        Ok(engine)
    }

    /// Record the page's outcome. Returns true when no navigation follows.
    fn leave<S: SessionStore>(&mut self, engine: PageEngine<S, V>) -> bool {
        let spent = engine.now();
        self.elapsed += spent;
        if let Some(visit) = self.visits.last_mut() {
            visit.elapsed_ms = millis(spent);
        }
        self.final_state = engine.state();
        let next = engine.navigation_request().map(str::to_string);
        let (_, presenter) = engine.into_parts();
        self.presenter = Some(presenter);

        match next {
            Some(destination) => {
                info!(from = %self.location, to = %destination, "Following navigation");
                self.location = destination;
                false
            }
            None => true,
        }
    }

    fn finish(mut self, interrupted: bool) -> Result<(RunReport, V)> {
        let Some(presenter) = self.presenter.take() else {
            bail!("Presenter was not returned by the last page");
        };
        let report = RunReport {
            visits: std::mem::take(&mut self.visits),
            final_state: self.final_state.to_string(),
            elapsed_ms: millis(self.elapsed),
            interrupted,
        };
        Ok((report, presenter))
    }
}

fn boot_label(boot: &BootOutcome) -> String {
    match boot {
        BootOutcome::Fresh => "fresh".to_string(),
        BootOutcome::ResumeScheduled(token) => {
            format!("resume {}@{}", token.tour_name, token.step_index)
        }
        BootOutcome::Discarded(e) => format!("discarded: {e}"),
        BootOutcome::AlreadyBooted => "already booted".to_string(),
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, ACTIVE_SLOT, NAME_SLOT, STEP_SLOT};
    use crate::ui::RecordingPresenter;

    fn host() -> TourHost<MemorySessionStore> {
        TourHost::new(
            Arc::new(TourCatalog::builtin().unwrap()),
            Config::default(),
            SiteFixture::demo().unwrap(),
            MemorySessionStore::new(),
        )
    }

    #[test]
    fn test_open_fresh_page() {
        let host = host();
        let (engine, boot) = host.open("config-admin.html", RecordingPresenter::new());
        assert_eq!(boot, BootOutcome::Fresh);
        assert_eq!(engine.state(), TourState::Idle);
    }

    #[test]
    fn test_run_without_tour_ends_immediately() {
        let mut host = host();
        let (report, _) = host
            .run_virtual("config-admin.html", None, RecordingPresenter::new())
            .unwrap();
        assert_eq!(report.locations(), vec!["config-admin.html"]);
        assert_eq!(report.elapsed_ms, 0);
        assert_eq!(report.final_state, "idle");
    }

    #[test]
    fn test_unknown_tour_fails_run() {
        let mut host = host();
        let result = host.run_virtual("config-admin.html", Some("nope"), RecordingPresenter::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_page_load_budget() {
        let store = MemorySessionStore::new();
        store.set(ACTIVE_SLOT, "true");
        store.set(NAME_SLOT, "criar-sala");
        store.set(STEP_SLOT, "1");
        let mut host = TourHost::new(
            Arc::new(TourCatalog::builtin().unwrap()),
            Config::default(),
            SiteFixture::demo().unwrap(),
            store,
        )
        .with_max_page_loads(1);
        // Step 1 of criar-sala navigates, which needs a second load
        let result = host.run_virtual("config-admin.html", None, RecordingPresenter::new());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_realtime_shutdown_stops_tour() {
        let (tx, rx) = mpsc::channel(1);
        let mut host = host().with_shutdown(rx);
        tx.send(()).await.unwrap();
        let (report, presenter) = host
            .run_realtime("config-admin.html", Some("config-admin"), RecordingPresenter::new())
            .await
            .unwrap();
        assert!(report.interrupted);
        assert_eq!(report.final_state, "stopped");
        assert!(!presenter.controls_visible());
        assert!(host.store().is_empty());
    }
}
