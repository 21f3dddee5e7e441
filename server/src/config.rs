//! Server configuration.
//!
//! Loaded from a TOML file. Every table has defaults, so an empty file (or
//! no file at all) yields a runnable server.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Server configuration loaded from a TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP listener
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Worker process configuration
    #[serde(default)]
    pub workers: WorkersConfig,

    /// Status report endpoint
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            workers: WorkersConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    /// Address every worker binds with SO_REUSEPORT
    #[serde(default = "default_listen_address")]
    pub address: SocketAddr,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
        }
    }
}

/// Worker process configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkersConfig {
    /// Number of worker processes (default: number of CPUs)
    pub count: Option<usize>,
}

/// Status report endpoint configuration.
///
/// When enabled, the report handler is installed at `path`. The completion
/// observer is installed unconditionally for the whole server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Install the report handler
    #[serde(default = "default_report_enabled")]
    pub enabled: bool,

    /// Path the report is served at
    #[serde(default = "default_report_path")]
    pub path: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: default_report_enabled(),
            path: default_report_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", or "compact"
    #[serde(default)]
    pub format: LogFormat,

    /// Include timestamps
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Include module target
    #[serde(default = "default_true")]
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            timestamps: true,
            target: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// Structured JSON output
    Json,
    /// Single-line compact output
    Compact,
}

// Default value functions

fn default_listen_address() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_report_enabled() -> bool {
    true
}

fn default_report_path() -> String {
    "/status".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.report.enabled {
            if !self.report.path.starts_with('/') {
                return Err(format!(
                    "report path must start with '/': '{}'",
                    self.report.path
                )
                .into());
            }
            if self.report.path == "/health" {
                return Err("report path '/health' collides with the liveness probe".into());
            }
        }

        if self.workers.count == Some(0) {
            return Err("workers.count must be at least 1".into());
        }

        Ok(())
    }

    /// Number of worker processes to fork.
    pub fn worker_count(&self) -> usize {
        self.workers.count.unwrap_or_else(num_cpus::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listener.address.port(), 8080);
        assert!(config.report.enabled);
        assert_eq!(config.report.path, "/status");
        assert!(config.worker_count() >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [listener]
            address = "127.0.0.1:9000"

            [workers]
            count = 4

            [report]
            enabled = true
            path = "/counters"

            [logging]
            level = "debug"
            format = "json"
            timestamps = false
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.address.to_string(), "127.0.0.1:9000");
        assert_eq!(config.worker_count(), 4);
        assert_eq!(config.report.path, "/counters");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.logging.timestamps);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [report]
            enable = true
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_report_path() {
        let config: Config = toml::from_str(
            r#"
            [report]
            path = "status"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_health_path_collision() {
        let config: Config = toml::from_str(
            r#"
            [report]
            path = "/health"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config: Config = toml::from_str(
            r#"
            [workers]
            count = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
