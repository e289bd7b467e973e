use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::debug;

use tourguide::config::Config;
use tourguide::host::{RunReport, TourHost};
use tourguide::logging;
use tourguide::page::SiteFixture;
use tourguide::session::{FileSessionStore, PersistenceBridge};
use tourguide::steps::{StepAction, TourCatalog};
use tourguide::ui::TerminalPresenter;

#[derive(Parser)]
#[command(name = "tourguide")]
#[command(about = "Guided walkthroughs for the inventory administration screens")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available tours
    List,

    /// Print the steps of a tour
    Show {
        /// Tour name
        tour: String,
    },

    /// Check a catalog file (defaults to the configured catalog)
    Validate {
        /// Catalog YAML to check
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Play a tour against the site fixture
    Run {
        /// Document to load first
        #[arg(short, long, default_value = "config-admin.html")]
        page: String,

        /// Tour to start on the first page (omit to only resume)
        #[arg(short, long)]
        tour: Option<String>,

        /// Site fixture YAML (default: built-in demo site)
        #[arg(long)]
        site: Option<PathBuf>,

        /// Wait in real time instead of on a virtual clock
        #[arg(long)]
        realtime: bool,

        /// Tooltip width in columns
        #[arg(short, long, default_value_t = 64)]
        width: u16,
    },

    /// Show the persisted tour session
    Status,

    /// Clear the persisted tour session
    Stop,

    /// Write the effective configuration to .tourguide/config.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let tour_run = match &cli.command {
        Commands::Run { page, tour, .. } => Some(logging::TourRun {
            page: page.as_str(),
            tour: tour.as_deref(),
        }),
        _ => None,
    };
    let logging_handle = logging::init_logging(&config, tour_run, cli.debug)?;

    match cli.command {
        Commands::List => cmd_list(&config)?,
        Commands::Show { tour } => cmd_show(&config, &tour)?,
        Commands::Validate { catalog } => cmd_validate(&config, catalog)?,
        Commands::Run {
            page,
            tour,
            site,
            realtime,
            width,
        } => {
            cmd_run(&config, &page, tour.as_deref(), site, realtime, width).await?;
        }
        Commands::Status => cmd_status(&config)?,
        Commands::Stop => cmd_stop(&config)?,
        Commands::Init => cmd_init(&config)?,
    }

    if let Some(log_path) = logging_handle.log_file_path {
        if log_path.metadata().map(|m| m.len() > 0).unwrap_or(false) {
            eprintln!("Session log: {}", log_path.display());
        }
    }

    Ok(())
}

fn load_catalog(config: &Config) -> Result<TourCatalog> {
    let catalog = match config.catalog_path() {
        Some(path) => TourCatalog::load(&path)
            .with_context(|| format!("Failed to load catalog: {}", path.display()))?,
        None => TourCatalog::builtin().context("Failed to load built-in catalog")?,
    };
    catalog.validate().context("Catalog is invalid")?;
    Ok(catalog)
}

fn cmd_list(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;

    println!("Tours ({})", catalog.len());
    println!("{}", "─".repeat(60));
    for tour in catalog.tours() {
        let pages = if tour.spans_pages() { " ↪" } else { "" };
        println!(
            "{:<24} {:>3} steps{}  {}",
            tour.name,
            tour.len(),
            pages,
            tour.description
        );
    }
    Ok(())
}

fn cmd_show(config: &Config, name: &str) -> Result<()> {
    let catalog = load_catalog(config)?;
    let tour = catalog.get(name)?;

    println!("{} ({} steps)", tour.name, tour.len());
    println!("{}", "─".repeat(60));
    for (index, step) in tour.steps.iter().enumerate() {
        let detail = match &step.action {
            StepAction::Message => String::new(),
            StepAction::Highlight { target } => target.clone(),
            StepAction::FillField { target, value } => format!("{target} ← \"{value}\""),
            StepAction::Click { target, .. } => target.clone(),
            StepAction::Navigate { destination } => format!("→ {destination}"),
            StepAction::CheckCondition { branch } => format!("branch {branch}"),
            StepAction::ClearForm { fields, .. } => fields.join(", "),
        };
        println!("{:>3}. [{}] {}  {}", index + 1, step.kind(), step.title, detail);
    }
    Ok(())
}

fn cmd_validate(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let catalog = match path.or_else(|| config.catalog_path()) {
        Some(path) => TourCatalog::load(&path)
            .with_context(|| format!("Failed to load catalog: {}", path.display()))?,
        None => TourCatalog::builtin()?,
    };
    catalog.validate()?;
    println!("Catalog OK: {} tours", catalog.len());
    Ok(())
}

async fn cmd_run(
    config: &Config,
    page: &str,
    tour: Option<&str>,
    site: Option<PathBuf>,
    realtime: bool,
    width: u16,
) -> Result<()> {
    let catalog = Arc::new(load_catalog(config)?);
    let site = match site {
        Some(path) => SiteFixture::load(&path)?,
        None => SiteFixture::demo()?,
    };
    let store = FileSessionStore::new(&config.state_path());
    let presenter = TerminalPresenter::new(std::io::stdout()).with_width(width);
    let mut host = TourHost::new(catalog, config.clone(), site, store);

    let (report, _) = if realtime {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() && tx.send(()).await.is_err() {
                debug!("Ctrl-C after the run ended, nothing to stop");
            }
        });
        host = host.with_shutdown(rx);
        host.run_realtime(page, tour, presenter).await?
    } else {
        host.run_virtual(page, tour, presenter)?
    };

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!("{}", "─".repeat(60));
    for visit in &report.visits {
        println!(
            "{:<28} {:>8} ms  {}",
            visit.location, visit.elapsed_ms, visit.boot
        );
    }
    println!(
        "Final state: {}  ({} ms{})",
        report.final_state,
        report.elapsed_ms,
        if report.interrupted { ", interrupted" } else { "" }
    );
}

fn cmd_status(config: &Config) -> Result<()> {
    let store = FileSessionStore::new(&config.state_path());
    let bridge = PersistenceBridge::new(store);

    match bridge.read() {
        Ok(Some(token)) => {
            println!(
                "Tour in progress: {} at step {}",
                token.tour_name,
                token.step_index + 1
            );
            if let Some(updated) = bridge.store().updated_at() {
                println!("Last written: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        Ok(None) => println!("No tour in progress"),
        Err(e) => println!("Session unusable: {e}"),
    }
    Ok(())
}

fn cmd_stop(config: &Config) -> Result<()> {
    let store = FileSessionStore::new(&config.state_path());
    let mut bridge = PersistenceBridge::new(store);
    bridge.clear()?;
    println!("Tour session cleared");
    Ok(())
}

fn cmd_init(config: &Config) -> Result<()> {
    config.save()?;
    println!("Wrote .tourguide/config.toml");
    Ok(())
}
