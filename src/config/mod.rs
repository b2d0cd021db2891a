//! Application configuration management

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::cli::CliOptions;

/// Options consumed by the detection-and-decision engine
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    /// Items whose `updatedAt - addedAt` falls below this are suspicious (0 disables)
    pub time_diff_threshold_secs: f64,

    /// Black ratio at or above which a thumbnail counts as black
    pub blackness_threshold: f64,

    /// Classify every item's thumbnail, not only suspicious ones
    pub force_black_check: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            time_diff_threshold_secs: 180.0,
            blackness_threshold: 0.95,
            force_black_check: false,
        }
    }
}

impl AnalyzerSettings {
    /// Reject thresholds the engine cannot interpret
    pub fn validate(&self) -> Result<()> {
        if !self.time_diff_threshold_secs.is_finite() || self.time_diff_threshold_secs < 0.0 {
            bail!(
                "Time diff threshold must be a non-negative number, got {}",
                self.time_diff_threshold_secs
            );
        }
        if !(0.0..=1.0).contains(&self.blackness_threshold) {
            bail!(
                "Blackness threshold must be within [0, 1], got {}",
                self.blackness_threshold
            );
        }
        Ok(())
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Plex server host
    pub plex_server: String,

    /// Plex server port
    pub plex_port: u16,

    /// Plex auth token
    pub plex_token: String,

    /// Library section to scan
    pub library_id: String,

    /// File that receives the JSON log stream
    pub log_file: PathBuf,

    /// Enable debug-level logging
    pub debug: bool,

    /// Deadline applied to every HTTP request
    pub request_timeout: Duration,

    pub analyzer: AnalyzerSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let time_diff_minutes: f64 = var("TIME_DIFF_MINUTES", "3.0")
            .parse()
            .context("Invalid TIME_DIFF_MINUTES")?;

        let config = Self {
            plex_server: var("PLEX_SERVER", "192.168.10.20"),

            plex_port: var("PLEX_PORT", "32400")
                .parse()
                .context("Invalid PLEX_PORT")?,

            plex_token: var("PLEX_TOKEN", "YOUR_TOKEN"),

            library_id: var("LIBRARY_ID", "5"),

            log_file: PathBuf::from(var("LOG_FILE_PATH", "/var/log/plex_black_analyzer.log")),

            debug: parse_flag(lookup("DEBUG").as_deref()),

            request_timeout: Duration::from_secs(
                var("REQUEST_TIMEOUT_SECS", "10")
                    .parse()
                    .context("Invalid REQUEST_TIMEOUT_SECS")?,
            ),

            analyzer: AnalyzerSettings {
                time_diff_threshold_secs: time_diff_minutes * 60.0,
                blackness_threshold: var("BLACKNESS_THRESHOLD", "0.95")
                    .parse()
                    .context("Invalid BLACKNESS_THRESHOLD")?,
                force_black_check: parse_flag(lookup("FORCE_BLACK_CHECK").as_deref()),
            },
        };

        config.analyzer.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the environment
    pub fn apply_cli(mut self, cli: CliOptions) -> Result<Self> {
        if let Some(server) = cli.plex_server {
            self.plex_server = server;
        }
        if let Some(port) = cli.plex_port {
            self.plex_port = port.parse().context("Invalid --plex-port")?;
        }
        if let Some(token) = cli.plex_token {
            self.plex_token = token;
        }
        if let Some(library_id) = cli.library_id {
            self.library_id = library_id;
        }
        if let Some(log_file) = cli.log_file {
            self.log_file = PathBuf::from(log_file);
        }
        if let Some(minutes) = cli.time_diff_minutes {
            let minutes: f64 = minutes.parse().context("Invalid --time-diff-minutes")?;
            self.analyzer.time_diff_threshold_secs = minutes * 60.0;
        }
        if let Some(threshold) = cli.blackness_threshold {
            self.analyzer.blackness_threshold =
                threshold.parse().context("Invalid --blackness-threshold")?;
        }
        if let Some(secs) = cli.timeout_secs {
            self.request_timeout =
                Duration::from_secs(secs.parse().context("Invalid --timeout")?);
        }
        self.debug |= cli.debug;
        self.analyzer.force_black_check |= cli.force_black_check;

        self.analyzer.validate()?;
        Ok(self)
    }

    /// Base URL of the Plex server
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.plex_server, self.plex_port)
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    value
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}
