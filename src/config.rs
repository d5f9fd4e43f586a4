//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::events::{
    default_catalog, CandidateOptions, CatalogEntry, CurveShape, ScheduleOptions, SimulatedEventSpec, TrimWindow,
};
use crate::output::{stream_file_name, OutputLayout};
use crate::util::parse_stream_time;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stream synthesis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// First stream second, `MM/dd/yyyy HH:mm:ss` UTC
    #[serde(default = "default_start")]
    pub start: String,

    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,

    /// Stream length; the whole archive when absent
    #[serde(default)]
    pub limit_minutes: Option<u32>,

    #[serde(default = "default_scale_percent")]
    pub scale_percent: u32,

    #[serde(default = "default_archive")]
    pub archive: String,

    /// Fixed seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_start() -> String {
    "01/01/2000 00:00:00".to_string()
}

fn default_window_minutes() -> u32 {
    1
}

fn default_scale_percent() -> u32 {
    100
}

fn default_archive() -> String {
    "./data/stream.zip".to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            window_minutes: default_window_minutes(),
            limit_minutes: None,
            scale_percent: default_scale_percent(),
            archive: default_archive(),
            seed: None,
        }
    }
}

/// Record stream output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Single-stream file; derived from the stream settings when absent
    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub split_hourly: bool,

    #[serde(default = "default_header")]
    pub header: bool,

    #[serde(default)]
    pub comments: bool,
}

fn default_output_dir() -> String {
    "./data/output".to_string()
}

fn default_header() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file: None,
            split_hourly: false,
            header: default_header(),
            comments: false,
        }
    }
}

/// Event injection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_idf_window")]
    pub idf_window_seconds: u32,

    #[serde(default = "default_trim")]
    pub trim: bool,

    #[serde(default = "default_minutes_before_start")]
    pub minutes_before_start: u32,

    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    #[serde(default = "default_automatic")]
    pub automatic: bool,

    #[serde(default = "default_amount")]
    pub amount: usize,

    #[serde(default = "default_min_distance")]
    pub min_distance_minutes: u32,

    #[serde(default = "default_event_dir")]
    pub data_dir: String,

    #[serde(default = "default_manual_delay")]
    pub manual_delay_minutes: u32,

    /// Event ids placed in manual mode; all candidates when empty
    #[serde(default)]
    pub manual: Vec<String>,

    #[serde(default = "default_min_idf")]
    pub simulated_min_idf: f64,

    #[serde(default = "default_max_idf")]
    pub simulated_max_idf: f64,

    #[serde(default = "default_catalog")]
    pub catalog: Vec<CatalogEntry>,

    #[serde(default)]
    pub simulated: Vec<SimulatedEventSpec>,
}

fn default_idf_window() -> u32 {
    1
}

fn default_trim() -> bool {
    true
}

fn default_minutes_before_start() -> u32 {
    2
}

fn default_duration_minutes() -> u32 {
    20
}

fn default_automatic() -> bool {
    true
}

fn default_amount() -> usize {
    10
}

fn default_min_distance() -> u32 {
    3
}

fn default_event_dir() -> String {
    "./data/events".to_string()
}

fn default_manual_delay() -> u32 {
    2
}

fn default_min_idf() -> f64 {
    2.0
}

fn default_max_idf() -> f64 {
    6.0
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            idf_window_seconds: default_idf_window(),
            trim: default_trim(),
            minutes_before_start: default_minutes_before_start(),
            duration_minutes: default_duration_minutes(),
            automatic: default_automatic(),
            amount: default_amount(),
            min_distance_minutes: default_min_distance(),
            data_dir: default_event_dir(),
            manual_delay_minutes: default_manual_delay(),
            manual: Vec::new(),
            simulated_min_idf: default_min_idf(),
            simulated_max_idf: default_max_idf(),
            catalog: default_catalog(),
            simulated: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("twistor").join("config.toml")),
            Some(PathBuf::from("/etc/twistor/config.toml")),
            Some(PathBuf::from("./twistor.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(archive) = std::env::var("TWISTOR_ARCHIVE") {
            self.stream.archive = archive;
        }
        if let Ok(seed) = std::env::var("TWISTOR_SEED") {
            match seed.parse() {
                Ok(s) => self.stream.seed = Some(s),
                Err(_) => tracing::warn!("Ignoring invalid TWISTOR_SEED {:?}", seed),
            }
        }

        if let Ok(dir) = std::env::var("TWISTOR_OUTPUT_DIR") {
            self.output.dir = dir;
        }

        if let Ok(dir) = std::env::var("TWISTOR_EVENT_DIR") {
            self.events.data_dir = dir;
        }

        if let Ok(level) = std::env::var("TWISTOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TWISTOR_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Reject values outside their ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        self.stream_start()?;

        let stream = &self.stream;
        if !(1..=60).contains(&stream.window_minutes) {
            return invalid(format!(
                "stream.window_minutes must be between 1 and 60, got {}",
                stream.window_minutes
            ));
        }
        if stream.limit_minutes == Some(0) {
            return invalid("stream.limit_minutes must be at least 1".to_string());
        }
        if stream.scale_percent == 0 {
            return invalid("stream.scale_percent must be at least 1".to_string());
        }

        let events = &self.events;
        if events.idf_window_seconds == 0 {
            return invalid("events.idf_window_seconds must be at least 1".to_string());
        }
        if events.minutes_before_start > 15 {
            return invalid(format!(
                "events.minutes_before_start must be at most 15, got {}",
                events.minutes_before_start
            ));
        }
        if !(1..=180).contains(&events.duration_minutes) {
            return invalid(format!(
                "events.duration_minutes must be between 1 and 180, got {}",
                events.duration_minutes
            ));
        }
        if events.minutes_before_start > events.duration_minutes {
            return invalid("events.minutes_before_start exceeds events.duration_minutes".to_string());
        }
        if !(events.simulated_min_idf.is_finite()
            && events.simulated_max_idf.is_finite()
            && events.simulated_min_idf < events.simulated_max_idf)
        {
            return invalid(format!(
                "events.simulated_min_idf ({}) must be below events.simulated_max_idf ({})",
                events.simulated_min_idf, events.simulated_max_idf
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return invalid(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            ));
        }

        Ok(())
    }

    /// Stream start in epoch seconds
    pub fn stream_start(&self) -> Result<i64, ConfigError> {
        parse_stream_time(&self.stream.start).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "stream.start must be MM/dd/yyyy HH:mm:ss, got {:?}",
                self.stream.start
            ))
        })
    }

    /// Clip for historical events
    pub fn trim_window(&self) -> Option<TrimWindow> {
        self.events.trim.then_some(TrimWindow {
            lead_minutes: self.events.minutes_before_start,
            duration_minutes: self.events.duration_minutes,
        })
    }

    pub fn curve_shape(&self) -> CurveShape {
        CurveShape {
            min_idf: self.events.simulated_min_idf,
            max_idf: self.events.simulated_max_idf,
            lead_minutes: self.events.minutes_before_start,
            duration_minutes: self.events.duration_minutes,
        }
    }

    pub fn candidate_options(&self, stream_start: i64) -> CandidateOptions {
        CandidateOptions {
            data_dir: PathBuf::from(&self.events.data_dir),
            stream_start,
            trim: self.trim_window(),
            shape: self.curve_shape(),
        }
    }

    /// Scheduling settings for a stream of `limit_minutes`
    pub fn schedule_options(&self, limit_minutes: u32) -> ScheduleOptions {
        ScheduleOptions {
            automatic: self.events.automatic,
            amount: self.events.amount,
            min_distance_minutes: self.events.min_distance_minutes,
            duration_minutes: self.events.duration_minutes,
            limit_minutes,
            manual: self.events.manual.clone(),
            manual_delay_minutes: self.events.manual_delay_minutes,
        }
    }

    pub fn output_layout(&self, stream_start: i64) -> OutputLayout {
        let dir = PathBuf::from(&self.output.dir);
        if self.output.split_hourly {
            return OutputLayout::Hourly {
                dir,
                stream_start,
                window_minutes: self.stream.window_minutes,
                scale_percent: self.stream.scale_percent,
            };
        }

        let file = match &self.output.file {
            Some(file) => PathBuf::from(file),
            None => dir.join(stream_file_name(
                stream_start,
                self.stream.window_minutes,
                self.stream.limit_minutes,
                self.stream.scale_percent,
            )),
        };
        OutputLayout::Single(file)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Twistor Configuration
#
# Environment variables override these settings:
# - TWISTOR_ARCHIVE
# - TWISTOR_SEED
# - TWISTOR_OUTPUT_DIR
# - TWISTOR_EVENT_DIR
# - TWISTOR_LOG_LEVEL
# - TWISTOR_LOG_FORMAT

[stream]
# First stream second (MM/dd/yyyy HH:mm:ss, UTC)
start = "01/01/2000 00:00:00"

# Minutes synthesized per window (1-60)
window_minutes = 1

# Stream length in minutes; omit to use the whole archive
limit_minutes = 60

# Sampling percentage (the archive is stored at 10)
scale_percent = 100

# Distribution archive
archive = "./data/stream.zip"

# Fixed seed for reproducible runs; omit for a random run
# seed = 42

[output]
# Output directory
dir = "./data/output"

# Single-stream file; derived from the stream settings when omitted
# file = "./data/output/stream.txt"

# One file per hour of stream time
split_hourly = false

# TWEET_ID / TWEET_CREATIONDATE / TWEET_CONTENT header line
header = true

# Window and injection comments (lines starting with #)
comments = false

[events]
# Seconds per injection sub-window
idf_window_seconds = 1

# Clip historical events around their real start
trim = true

# Minutes kept before the event starts (max 15)
minutes_before_start = 2

# Event length in minutes (max 180)
duration_minutes = 20

# Pick and place events at random; false places the manual list
automatic = true

# Events per run
amount = 10

# Minimum minutes between two event starts
min_distance_minutes = 3

# Event sample files: <data_dir>/<event id>/data.txt
data_dir = "./data/events"

# Manual mode: delay of every event and the events to place
manual_delay_minutes = 2
manual = []

# IDF range of simulated events
simulated_min_idf = 2.0
simulated_max_idf = 6.0

# Simulated events join the candidates
# [[events.simulated]]
# id = "SIMULATED"
# delay_seconds = 60
# terms = [
#     { term = "test1", start_input = 4, drop_input = 10, ramp_minutes = 1, recovery_input = 1 },
#     { term = "test2", start_input = 5, drop_input = 10, ramp_minutes = 4, recovery_input = 2 },
# ]

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/twistor/twistor.log"
"#
    .to_string()
}
