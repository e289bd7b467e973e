//! Integration tests for tours played across page loads
//!
//! These drive the built-in catalog against the demo site fixture the way
//! a browser would: each document load gets a fresh engine, and only the
//! session store survives from one load to the next.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use tourguide::config::Config;
use tourguide::engine::{BootOutcome, TourEngine, TourState};
use tourguide::error::TourError;
use tourguide::host::TourHost;
use tourguide::page::{Page, SiteFixture};
use tourguide::session::{
    FileSessionStore, MemorySessionStore, PersistenceBridge, SessionStore, SessionToken,
    ACTIVE_SLOT, NAME_SLOT, STEP_SLOT,
};
use tourguide::steps::TourCatalog;
use tourguide::ui::{Presenter, PresenterEvent, RecordingPresenter};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn demo_host<S: SessionStore + Clone>(store: S) -> TourHost<S> {
    TourHost::new(
        Arc::new(TourCatalog::builtin().unwrap()),
        Config::default(),
        SiteFixture::demo().unwrap(),
        store,
    )
}

/// Fire every wakeup until nothing is left or the page starts unloading
fn settle<P: Page, S: SessionStore, V: Presenter>(engine: &mut TourEngine<P, S, V>) {
    while let Some(wait) = engine.next_deadline() {
        if engine.is_unloading() {
            break;
        }
        engine.advance_by(wait);
    }
}

fn tooltip_bodies(presenter: &RecordingPresenter) -> Vec<String> {
    presenter
        .events()
        .iter()
        .filter_map(|e| match e {
            PresenterEvent::Tooltip(t) => Some(t.body.clone()),
            _ => None,
        })
        .collect()
}

// ─── Linear tours ─────────────────────────────────────────────────────────────

#[test]
fn test_three_message_tour_finishes_after_three_dwells() {
    let yaml = r"
tours:
  T:
    steps:
      - { title: One, body: first, action: message }
      - { title: Two, body: second, action: message }
      - { title: Three, body: third, action: message }
";
    let catalog = TourCatalog::from_yaml_str(yaml).unwrap();
    let store = MemorySessionStore::new();
    let site = SiteFixture::demo().unwrap();
    let mut engine = TourEngine::new(
        Arc::new(catalog),
        &Config::default(),
        site.load_page("config-admin.html"),
        store.clone(),
        RecordingPresenter::new(),
    );

    engine.start("T").unwrap();
    engine.advance_by(ms(17_999));
    assert_eq!(engine.state(), TourState::Running { index: 2 });
    engine.advance_by(ms(1));
    assert_eq!(engine.state(), TourState::Finished);
    assert!(store.is_empty());
    assert_eq!(engine.presenter().titles(), vec!["One", "Two", "Three"]);
}

#[test]
fn test_config_admin_tour_degrades_over_missing_buttons() {
    let host = demo_host(MemorySessionStore::new());
    let (mut engine, _) = host.open("config-admin.html", RecordingPresenter::new());
    let total = TourCatalog::builtin().unwrap().get("config-admin").unwrap().len();

    engine.start("config-admin").unwrap();
    settle(&mut engine);

    assert_eq!(engine.state(), TourState::Idle);
    // Every step was shown, even those whose buttons are absent from the page
    assert_eq!(engine.presenter().titles().len(), total);
    assert!(engine.page().emphasized().is_empty());
    assert!(host.store().is_empty());
}

// ─── Cross-page continuation ─────────────────────────────────────────────────

#[test]
fn test_navigate_persists_and_next_page_resumes() {
    let store = MemorySessionStore::new();
    let host = demo_host(store.clone());

    let (mut first, boot) = host.open("config-admin.html", RecordingPresenter::new());
    assert_eq!(boot, BootOutcome::Fresh);
    first.start("criar-sala").unwrap();
    first.advance_by(ms(6_000));

    assert_eq!(store.get(ACTIVE_SLOT).as_deref(), Some("true"));
    assert_eq!(store.get(NAME_SLOT).as_deref(), Some("criar-sala"));
    assert_eq!(store.get(STEP_SLOT).as_deref(), Some("2"));

    first.advance_by(ms(2_000));
    assert_eq!(first.navigation_request(), Some("adicionar-sala.html"));

    let (mut second, boot) = host.open("adicionar-sala.html", RecordingPresenter::new());
    assert_eq!(
        boot,
        BootOutcome::ResumeScheduled(SessionToken::new("criar-sala", 2))
    );
    second.advance_by(ms(1_000));
    assert_eq!(second.index(), Some(2));
    // Steps 0 and 1 are not replayed
    assert_eq!(second.presenter().titles(), vec!["Room Name"]);
}

#[test]
fn test_create_room_tour_runs_across_pages() {
    let mut host = demo_host(MemorySessionStore::new());
    let (report, presenter) = host
        .run_virtual("config-admin.html", Some("criar-sala"), RecordingPresenter::new())
        .unwrap();

    assert_eq!(
        report.locations(),
        vec!["config-admin.html", "adicionar-sala.html"]
    );
    assert!(report.visits[1].boot.starts_with("resume criar-sala@2"));
    assert_eq!(report.final_state, "idle");
    assert!(!report.interrupted);
    assert!(host.store().is_empty());

    let titles = presenter.titles();
    assert_eq!(titles.first(), Some(&"Tour: Create a New Room"));
    assert_eq!(titles.last(), Some(&"Tour Complete!"));
    assert_eq!(
        titles.iter().filter(|t| **t == "Opening the page...").count(),
        1
    );
}

#[test]
fn test_file_store_carries_session_between_loads() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSessionStore::new(temp_dir.path());
    let mut host = demo_host(store.clone());

    let (report, _) = host
        .run_virtual("config-admin.html", Some("criar-sala"), RecordingPresenter::new())
        .unwrap();
    assert_eq!(report.visits.len(), 2);

    let bridge = PersistenceBridge::new(store);
    assert_eq!(bridge.read().unwrap(), None);
    assert!(bridge.store().updated_at().is_some());
}

// ─── Typing ───────────────────────────────────────────────────────────────────

#[test]
fn test_typing_emits_one_input_per_character() {
    let store = MemorySessionStore::new();
    store.set(ACTIVE_SLOT, "true");
    store.set(NAME_SLOT, "criar-sala");
    store.set(STEP_SLOT, "2");
    let host = demo_host(store);
    let (mut engine, _) = host.open("adicionar-sala.html", RecordingPresenter::new());
    engine.advance_by(ms(1_000));
    let field = engine.page().query("#nome").unwrap();

    // "Sala Demo Tour" is 14 characters at 150ms each
    engine.advance_by(ms(2_100));
    assert_eq!(
        engine.page().value_of("#nome").as_deref(),
        Some("Sala Demo Tour")
    );
    assert_eq!(engine.page().input_count(field), 14);

    engine.advance_by(ms(1_999));
    assert_eq!(engine.index(), Some(2));
    engine.advance_by(ms(1));
    assert_eq!(engine.index(), Some(3));
}

// ─── Branch substitution ─────────────────────────────────────────────────────

#[test]
fn test_add_room_tour_takes_no_images_branch_and_clears_form() {
    let host = demo_host(MemorySessionStore::new());
    let (mut engine, _) = host.open("adicionar-sala.html", RecordingPresenter::new());
    engine.start("adicionar-sala").unwrap();
    settle(&mut engine);

    let titles = engine.presenter().titles();
    assert!(titles.contains(&"No Images Available"));
    assert!(!titles.contains(&"Room Image"));

    for field in ["#nome", "#tipo", "#descricao", "#andar_id"] {
        assert_eq!(engine.page().value_of(field).as_deref(), Some(""), "{field}");
    }
    let boxes = engine.page().query_all(".equipamento-checkbox");
    assert_eq!(boxes.len(), 2);
    assert!(boxes.iter().all(|b| !engine.page().is_checked(*b)));
}

#[test]
fn test_edit_room_tour_clicks_through_populated_branch() {
    let host = demo_host(MemorySessionStore::new());
    let (mut engine, _) = host.open("editar-sala.html", RecordingPresenter::new());
    engine.start("editar-sala").unwrap();
    settle(&mut engine);

    let titles = engine.presenter().titles();
    assert!(titles.contains(&"Rooms Available"));
    assert!(titles.contains(&"Edit Form"));
    // The cancel button was revealed by the card click
    assert!(titles.contains(&"Back to the List"));
    assert!(!titles.contains(&"Form Not Open"));
    assert!(tooltip_bodies(engine.presenter())
        .iter()
        .any(|b| b.starts_with("Found 2 room(s) to edit")));

    // Cancelling hid the form again
    assert!(engine.page().query("#formEditarSala").is_none());
    assert_eq!(engine.page().clicks().len(), 2);
}

#[test]
fn test_delete_room_tour_takes_empty_branch() {
    let host = demo_host(MemorySessionStore::new());
    let (mut engine, _) = host.open("excluir-sala.html", RecordingPresenter::new());
    engine.start("excluir-sala").unwrap();
    engine.advance_by(ms(6_000));

    assert_eq!(engine.index(), Some(0));
    assert_eq!(
        engine.presenter().tooltip().map(|t| t.title.as_str()),
        Some("No Rooms Available")
    );
}

#[test]
fn test_branch_choice_is_stable_on_unchanged_page() {
    let host = demo_host(MemorySessionStore::new());
    let mut picked = Vec::new();
    for _ in 0..2 {
        let (mut engine, _) = host.open("ver-salas.html", RecordingPresenter::new());
        engine.start("ver-salas").unwrap();
        engine.advance_by(ms(6_000));
        picked.push(engine.steps().to_vec());
        engine.stop();
    }
    assert_eq!(picked[0], picked[1]);
    assert_eq!(picked[0][0].title, "Rooms Available");
    assert_eq!(picked[0][0].body, "Found 1 room(s) to view. Let me show how it works.");
}

// ─── Stop / session hygiene ──────────────────────────────────────────────────

#[test]
fn test_stop_twice_matches_stop_once() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSessionStore::new(temp_dir.path());
    let host = demo_host(store.clone());
    let (mut engine, _) = host.open("adicionar-sala.html", RecordingPresenter::new());
    engine.start("adicionar-sala").unwrap();
    engine.advance_by(ms(6_450));
    assert_eq!(engine.page().value_of("#nome").as_deref(), Some("Sal"));

    engine.stop();
    let once = (engine.state(), engine.pending_timers(), engine.highlighted());
    engine.stop();
    let twice = (engine.state(), engine.pending_timers(), engine.highlighted());

    assert_eq!(once, twice);
    assert_eq!(engine.state(), TourState::Stopped);
    assert_eq!(engine.page().value_of("#nome").as_deref(), Some(""));
    assert_eq!(PersistenceBridge::new(store).read().unwrap(), None);
}

#[test]
fn test_partial_session_is_discarded_on_load() {
    let store = MemorySessionStore::new();
    store.set(NAME_SLOT, "criar-sala");
    store.set(STEP_SLOT, "2");
    let host = demo_host(store.clone());

    let (mut engine, boot) = host.open("adicionar-sala.html", RecordingPresenter::new());
    assert!(matches!(
        boot,
        BootOutcome::Discarded(TourError::CorruptSessionState(_))
    ));
    assert!(store.is_empty());
    settle(&mut engine);
    assert_eq!(engine.state(), TourState::Idle);
}

#[test]
fn test_unreadable_session_file_is_replaced() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("session.json"), "{not json").unwrap();
    let store = FileSessionStore::new(temp_dir.path());
    let host = demo_host(store.clone());

    let (mut first, boot) = host.open("config-admin.html", RecordingPresenter::new());
    assert!(matches!(
        boot,
        BootOutcome::Discarded(TourError::CorruptSessionState(_))
    ));
    assert_eq!(PersistenceBridge::new(store.clone()).read().unwrap(), None);

    first.start("criar-sala").unwrap();
    first.advance_by(ms(8_000));
    assert_eq!(first.navigation_request(), Some("adicionar-sala.html"));

    let (_, boot) = host.open("adicionar-sala.html", RecordingPresenter::new());
    assert_eq!(
        boot,
        BootOutcome::ResumeScheduled(SessionToken::new("criar-sala", 2))
    );
}

#[test]
fn test_session_for_removed_tour_is_cleared() {
    let store = MemorySessionStore::new();
    store.set(ACTIVE_SLOT, "true");
    store.set(NAME_SLOT, "retired-tour");
    store.set(STEP_SLOT, "4");
    let host = demo_host(store.clone());

    let (mut engine, _) = host.open("config-admin.html", RecordingPresenter::new());
    settle(&mut engine);
    assert_eq!(engine.state(), TourState::Idle);
    assert!(store.is_empty());
}

#[test]
fn test_start_unknown_tour_is_rejected() {
    let host = demo_host(MemorySessionStore::new());
    let (mut engine, _) = host.open("config-admin.html", RecordingPresenter::new());
    assert_eq!(
        engine.start("no-such-tour"),
        Err(TourError::UnknownTour("no-such-tour".to_string()))
    );
    assert_eq!(engine.state(), TourState::Idle);
    assert_eq!(engine.pending_timers(), 0);
    assert!(host.store().is_empty());
}
