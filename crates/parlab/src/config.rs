//! Service configuration
//!
//! Handles loading and validating the service configuration using the
//! config crate. Every field has a default, so an empty file (or no file
//! at all) yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as ConfigBuilder, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::types::ExecMode;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../parlab.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for the parlab service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory for per-job workspaces
    /// (uses the system temp directory if not specified).
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Wall-clock budget for a compiler invocation, in seconds
    #[serde(default = "default_compile_timeout")]
    pub compile_timeout_secs: u64,

    /// Wall-clock budget for an OpenMP batch run, in seconds
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    /// Wall-clock budget for an MPI batch run, in seconds.
    /// Higher than the OpenMP budget: process spawn and barrier overhead.
    #[serde(default = "default_mpi_run_timeout")]
    pub mpi_run_timeout_secs: u64,

    /// Budget for each toolchain version probe, in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Workspaces older than this are removed by the periodic sweep
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,

    /// Interval between sweep passes, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Maximum lifetime of an interactive session, in seconds.
    /// Bounds the streaming path the way per-stage timeouts bound the
    /// batch path.
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: u64,

    /// Screen submissions for obvious language mismatch before compiling
    #[serde(default = "default_language_screen")]
    pub language_screen: bool,
}

fn default_compile_timeout() -> u64 {
    10
}
fn default_run_timeout() -> u64 {
    10
}
fn default_mpi_run_timeout() -> u64 {
    30
}
fn default_probe_timeout() -> u64 {
    5
}
fn default_stale_after() -> u64 {
    3600
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_session_lifetime() -> u64 {
    300
}
fn default_language_screen() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Resolved workspace root directory
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("parlab"))
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }

    /// Run budget for the given execution mode
    pub fn run_timeout(&self, mode: ExecMode) -> Duration {
        match mode {
            ExecMode::OpenMp => Duration::from_secs(self.run_timeout_secs),
            ExecMode::Mpi => Duration::from_secs(self.mpi_run_timeout_secs),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime_secs)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("compile_timeout_secs", self.compile_timeout_secs),
            ("run_timeout_secs", self.run_timeout_secs),
            ("mpi_run_timeout_secs", self.mpi_run_timeout_secs),
            ("probe_timeout_secs", self.probe_timeout_secs),
            ("sweep_interval_secs", self.sweep_interval_secs),
            ("session_lifetime_secs", self.session_lifetime_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_embedded_example() {
        let config = Config::default();
        assert_eq!(config.compile_timeout_secs, 10);
        assert_eq!(config.run_timeout_secs, 10);
        assert_eq!(config.mpi_run_timeout_secs, 30);
        assert_eq!(config.stale_after_secs, 3600);
        assert_eq!(config.session_lifetime_secs, 300);
        assert!(config.language_screen);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.compile_timeout_secs, 10);
        assert_eq!(config.mpi_run_timeout_secs, 30);
        assert!(config.workspace_root.is_none());
    }

    #[test]
    fn run_timeout_is_mode_dependent() {
        let config = Config::default();
        assert_eq!(
            config.run_timeout(ExecMode::OpenMp),
            Duration::from_secs(10)
        );
        assert_eq!(config.run_timeout(ExecMode::Mpi), Duration::from_secs(30));
    }

    #[test]
    fn workspace_root_defaults_to_temp_dir() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.workspace_root(), std::env::temp_dir().join("parlab"));
    }

    #[test]
    fn workspace_root_override() {
        let config = Config::parse_toml("workspace_root = \"/var/lib/parlab\"").unwrap();
        assert_eq!(config.workspace_root(), PathBuf::from("/var/lib/parlab"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let result = Config::parse_toml("compile_timeout_secs = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = Config::parse_toml("run_timeout_secs = 20").unwrap();
        assert_eq!(config.run_timeout_secs, 20);
        assert_eq!(config.compile_timeout_secs, 10);
        assert_eq!(config.mpi_run_timeout_secs, 30);
    }

    #[test]
    fn language_screen_can_be_disabled() {
        let config = Config::parse_toml("language_screen = false").unwrap();
        assert!(!config.language_screen);
    }
}
