//! Logging initialization for tourguide.
//!
//! `run` with file logging: logs to
//! `<state>/logs/tourguide-{tour}-{datetime}.log` so they do not interleave
//! with the rendered tooltips. Everything else: logs to stderr.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Result of logging initialization
pub struct LoggingHandle {
    /// Guard that must be kept alive for the duration of the program.
    /// When dropped, ensures all buffered logs are flushed.
    pub _guard: Option<WorkerGuard>,

    /// Path to the log file (only set when logging to file)
    pub log_file_path: Option<PathBuf>,
}

/// The tour a `run` invocation plays. Its presence means stdout carries
/// rendered tooltips.
#[derive(Debug, Clone, Copy)]
pub struct TourRun<'a> {
    pub page: &'a str,
    /// `None` when the run only resumes a persisted session
    pub tour: Option<&'a str>,
}

/// File name for a log started now. Tour names are reduced to characters
/// that are safe in a path.
pub fn log_file_name(tour: Option<&str>) -> String {
    let label: String = tour
        .unwrap_or("resume")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    format!("tourguide-{label}-{timestamp}.log")
}

/// Initialize logging.
///
/// # Arguments
/// * `config` - Application configuration
/// * `run` - The tour being rendered, if this is a `run` invocation
/// * `debug_override` - If true, override log level to "debug" (from --debug flag)
pub fn init_logging(
    config: &Config,
    run: Option<TourRun<'_>>,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let log_level = if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };

    let filter =
        tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or(log_level));

    let handle = match run {
        Some(run) if config.logging.to_file => {
            let logs_dir = config.logs_path();
            std::fs::create_dir_all(&logs_dir).context("Failed to create logs directory")?;

            let log_filename = log_file_name(run.tour);
            let log_file_path = logs_dir.join(&log_filename);

            let file_appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .init();

            LoggingHandle {
                _guard: Some(guard),
                log_file_path: Some(log_file_path),
            }
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();

            LoggingHandle {
                _guard: None,
                log_file_path: None,
            }
        }
    };

    if let Some(run) = run {
        info!(
            page = run.page,
            tour = run.tour.unwrap_or("-"),
            resumed = run.tour.is_none(),
            "Tour run started"
        );
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();
        config
    }

    #[test]
    fn test_logs_path_under_state_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let logs_dir = config.logs_path();
        assert!(logs_dir.ends_with("logs"));
        assert!(logs_dir.starts_with(temp_dir.path()));
    }

    #[test]
    fn test_log_file_name_carries_tour() {
        let name = log_file_name(Some("criar-sala"));
        assert!(name.starts_with("tourguide-criar-sala-"));
        assert!(name.ends_with("Z.log"));
    }

    #[test]
    fn test_log_file_name_without_tour() {
        assert!(log_file_name(None).starts_with("tourguide-resume-"));
    }

    #[test]
    fn test_log_file_name_sanitizes_tour() {
        let name = log_file_name(Some("../rooms list"));
        assert!(name.starts_with("tourguide-___rooms_list-"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_file_logging_off_by_default() {
        // init_logging installs a global subscriber, so only the condition
        // that selects the sink is checked here
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        assert!(!config.logging.to_file);
    }
}
