//! Configuration file
//!
//! JSON, every field optional:
//!
//! ```json
//! { "channel_capacity": 1000, "format": "csv", "headers": true, "log_level": "warn" }
//! ```
//!
//! Command-line flags override values from the file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::executor::DEFAULT_CHANNEL_CAPACITY;
use crate::observability::Severity;

use super::args::RunArgs;
use super::errors::{CliError, CliResult};

/// Result output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Queue length between pipeline stages (default 1000)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub format: OutputFormat,

    /// Write a CSV header row (default true)
    #[serde(default = "default_headers")]
    pub headers: bool,

    /// One of trace, info, warn, error (default warn)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}
fn default_headers() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            format: OutputFormat::default(),
            headers: default_headers(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.channel_capacity == 0 {
            return Err(CliError::config_error("channel_capacity must be > 0"));
        }
        self.severity()?;
        Ok(())
    }

    /// The configured minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    /// Applies command-line flags on top of this configuration
    pub fn with_overrides(mut self, args: &RunArgs) -> Self {
        if args.json {
            self.format = OutputFormat::Json;
        }
        if args.no_headers {
            self.headers = false;
        }
        let verbose = match args.verbose {
            0 => None,
            1 => Some(Severity::Info),
            _ => Some(Severity::Trace),
        };
        if let Some(level) = verbose {
            let current = self.severity().unwrap_or(Severity::Warn);
            if level < current {
                self.log_level = level.as_str().to_lowercase();
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.channel_capacity, 1000);
        assert_eq!(config.format, OutputFormat::Csv);
        assert!(config.headers);
        assert_eq!(config.severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"channel_capacity": 8, "format": "json", "headers": false, "log_level": "info"}}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.headers);
        assert_eq!(config.severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_json(r#"{"channel_capacity": 0}"#).is_err());
        assert!(Config::from_json(r#"{"log_level": "loud"}"#).is_err());
        assert!(Config::from_json(r#"{"format": "xml"}"#).is_err());
        assert!(Config::from_json("not json").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/dirql.json")).unwrap_err();
        assert_eq!(err.code_str(), "DIRQL_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_flags_override_file() {
        let args = RunArgs {
            json: true,
            no_headers: true,
            verbose: 1,
            ..RunArgs::default()
        };
        let config = Config::default().with_overrides(&args);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.headers);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_verbose_never_raises_level() {
        let config = Config {
            log_level: "trace".into(),
            ..Config::default()
        };
        let args = RunArgs {
            verbose: 1,
            ..RunArgs::default()
        };
        assert_eq!(config.with_overrides(&args).log_level, "trace");
    }
}
