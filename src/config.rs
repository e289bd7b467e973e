use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::page::Emphasis;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub tooltip: TooltipConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Autoplay timing, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait before advancing past a step with no other completion signal
    #[serde(default = "default_dwell")]
    pub dwell_ms: u64,
    /// Wait before each step's action runs (0 = run immediately)
    #[serde(default)]
    pub step_delay_ms: u64,
    /// Interval between typed characters
    #[serde(default = "default_type_interval")]
    pub type_interval_ms: u64,
    /// Wait after the last typed character before advancing
    #[serde(default = "default_fill_settle")]
    pub fill_settle_ms: u64,
    /// Wait between highlighting a click target and clicking it
    #[serde(default = "default_click_delay")]
    pub click_delay_ms: u64,
    /// Wait between persisting a navigation and leaving the page
    #[serde(default = "default_navigate_delay")]
    pub navigate_delay_ms: u64,
    /// Wait between page load and resuming a persisted tour
    #[serde(default = "default_resume_delay")]
    pub resume_delay_ms: u64,
    /// How long the completion notice stays up
    #[serde(default = "default_notice")]
    pub notice_ms: u64,
}

fn default_dwell() -> u64 {
    6000
}

fn default_type_interval() -> u64 {
    150
}

fn default_fill_settle() -> u64 {
    2000
}

fn default_click_delay() -> u64 {
    4000
}

fn default_navigate_delay() -> u64 {
    2000
}

fn default_resume_delay() -> u64 {
    1000
}

fn default_notice() -> u64 {
    3000
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dwell_ms: default_dwell(),
            step_delay_ms: 0,
            type_interval_ms: default_type_interval(),
            fill_settle_ms: default_fill_settle(),
            click_delay_ms: default_click_delay(),
            navigate_delay_ms: default_navigate_delay(),
            resume_delay_ms: default_resume_delay(),
            notice_ms: default_notice(),
        }
    }
}

impl TimingConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn type_interval(&self) -> Duration {
        Duration::from_millis(self.type_interval_ms)
    }

    pub fn fill_settle(&self) -> Duration {
        Duration::from_millis(self.fill_settle_ms)
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }

    pub fn navigate_delay(&self) -> Duration {
        Duration::from_millis(self.navigate_delay_ms)
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }

    pub fn notice(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }
}

/// Emphasis applied to the highlighted element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    #[serde(default = "default_highlight_color")]
    pub color: String,
    #[serde(default = "default_outline_px")]
    pub outline_px: u32,
    #[serde(default = "default_offset_px")]
    pub offset_px: u32,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_z_index")]
    pub z_index: i32,
}

fn default_highlight_color() -> String {
    "#3b82f6".to_string()
}

fn default_outline_px() -> u32 {
    4
}

fn default_offset_px() -> u32 {
    3
}

fn default_scale() -> f64 {
    1.05
}

fn default_z_index() -> i32 {
    1000
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            color: default_highlight_color(),
            outline_px: default_outline_px(),
            offset_px: default_offset_px(),
            scale: default_scale(),
            z_index: default_z_index(),
        }
    }
}

impl HighlightConfig {
    pub fn emphasis(&self) -> Emphasis {
        Emphasis {
            outline_color: self.color.clone(),
            outline_px: self.outline_px,
            offset_px: self.offset_px,
            scale: self.scale,
            z_index: self.z_index,
        }
    }
}

/// Tooltip geometry, in CSS pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TooltipConfig {
    /// Assumed size when the presenter cannot measure the tooltip
    #[serde(default = "default_tooltip_width")]
    pub width: f64,
    #[serde(default = "default_tooltip_height")]
    pub height: f64,
    /// Distance between the tooltip and the highlighted element
    #[serde(default = "default_tooltip_gap")]
    pub gap: f64,
    /// Free space a side needs beyond the tooltip to be chosen
    #[serde(default = "default_tooltip_margin")]
    pub margin: f64,
    /// Distance kept from the viewport edge when clamping
    #[serde(default = "default_edge_padding")]
    pub edge_padding: f64,
}

fn default_tooltip_width() -> f64 {
    320.0
}

fn default_tooltip_height() -> f64 {
    160.0
}

fn default_tooltip_gap() -> f64 {
    15.0
}

fn default_tooltip_margin() -> f64 {
    20.0
}

fn default_edge_padding() -> f64 {
    10.0
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            width: default_tooltip_width(),
            height: default_tooltip_height(),
            gap: default_tooltip_gap(),
            margin: default_tooltip_margin(),
            edge_padding: default_edge_padding(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Session file and logs live here
    #[serde(default = "default_state_path")]
    pub state: String,
    /// YAML catalog replacing the built-in tours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
}

fn default_state_path() -> String {
    ".tourguide".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state: default_state_path(),
            catalog: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to `<state>/logs` instead of stderr
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Embedded defaults so tours run without any config file
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // Project config in .tourguide/
        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/tourguide/
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tourguide").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with TOURGUIDE__ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("TOURGUIDE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .tourguide/config.toml
    pub fn save(&self) -> Result<()> {
        let config_path = Self::project_config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(&config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    fn project_config_path() -> PathBuf {
        PathBuf::from(".tourguide").join("config.toml")
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.paths.catalog.as_ref().map(PathBuf::from)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            highlight: HighlightConfig::default(),
            tooltip: TooltipConfig::default(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
