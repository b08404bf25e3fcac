//! Configuration module for nassync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! This file only covers process-level settings (where the database lives,
//! which external binaries to run, timeouts, logging). The NAS endpoint,
//! mappings and schedule are user data and live in the configuration store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for nassync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub tools: ToolsConfig,
    pub timeouts: TimeoutsConfig,
    pub logging: LoggingConfig,
}

/// Location of the SQLite configuration store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// External binaries the engine shells out to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Remote-copy tool used for transfers.
    pub rsync: PathBuf,
    /// Secure shell client used for connection tests and as rsync's transport.
    pub ssh: PathBuf,
    /// Reachability probe.
    pub ping: PathBuf,
}

/// Bounds on blocking network operations, in seconds.
///
/// Transfers themselves are unbounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Reachability probe.
    pub probe_secs: u64,
    /// SSH connection test.
    pub connect_secs: u64,
    /// Post-sync HTTP calls.
    pub http_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/nassync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("nassync")
            .join("config.yaml")
    }
}

impl DatabaseConfig {
    /// Lock file next to the database, held by whichever process is syncing
    pub fn run_lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }
}

impl TimeoutsConfig {
    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("nassync")
                .join("nassync.db"),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            rsync: PathBuf::from("rsync"),
            ssh: PathBuf::from("ssh"),
            ping: PathBuf::from("ping"),
        }
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            probe_secs: 2,
            connect_secs: 5,
            http_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"timeouts.probe_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- database ---
        if self.database.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "database.path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- tools ---
        for (field, tool) in [
            ("tools.rsync", &self.tools.rsync),
            ("tools.ssh", &self.tools.ssh),
            ("tools.ping", &self.tools.ping),
        ] {
            if tool.as_os_str().is_empty() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must not be empty".into(),
                });
            }
        }

        // --- timeouts ---
        if self.timeouts.probe_secs == 0 {
            errors.push(ValidationError {
                field: "timeouts.probe_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.timeouts.connect_secs == 0 {
            errors.push(ValidationError {
                field: "timeouts.connect_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.timeouts.http_secs == 0 {
            errors.push(ValidationError {
                field: "timeouts.http_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use nassync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .database_path(PathBuf::from("/config/nas_sync.db"))
///     .probe_timeout_secs(3)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- database ---

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.database.path = path;
        self
    }

    // --- tools ---

    pub fn rsync_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tools.rsync = path.into();
        self
    }

    pub fn ssh_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tools.ssh = path.into();
        self
    }

    pub fn ping_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tools.ping = path.into();
        self
    }

    // --- timeouts ---

    pub fn probe_timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeouts.probe_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeouts.connect_secs = secs;
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeouts.http_secs = secs;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert!(cfg.database.path.to_string_lossy().ends_with("nassync.db"));
        assert_eq!(cfg.tools.rsync, PathBuf::from("rsync"));
        assert_eq!(cfg.tools.ssh, PathBuf::from("ssh"));
        assert_eq!(cfg.tools.ping, PathBuf::from("ping"));
        assert_eq!(cfg.timeouts.probe(), Duration::from_secs(2));
        assert_eq!(cfg.timeouts.connect(), Duration::from_secs(5));
        assert_eq!(cfg.timeouts.http(), Duration::from_secs(10));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn run_lock_sits_next_to_the_database() {
        let db = DatabaseConfig {
            path: PathBuf::from("/var/lib/nassync/nassync.db"),
        };
        assert_eq!(db.run_lock_path(), PathBuf::from("/var/lib/nassync/nassync.lock"));
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
database:
  path: /config/nas_sync.db
tools:
  rsync: /usr/local/bin/rsync
  ssh: /usr/bin/ssh
  ping: /bin/ping
timeouts:
  probe_secs: 3
  connect_secs: 8
  http_secs: 20
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.database.path, PathBuf::from("/config/nas_sync.db"));
        assert_eq!(cfg.tools.rsync, PathBuf::from("/usr/local/bin/rsync"));
        assert_eq!(cfg.tools.ping, PathBuf::from("/bin/ping"));
        assert_eq!(cfg.timeouts.probe_secs, 3);
        assert_eq!(cfg.timeouts.connect_secs, 8);
        assert_eq!(cfg.timeouts.http_secs, 20);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn load_partial_file_fills_missing_sections() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"logging:\n  level: warn\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.timeouts.probe_secs, 2);
        assert_eq!(cfg.tools.rsync, PathBuf::from("rsync"));
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.timeouts.http_secs, 10);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        let result = Config::load(tmp.path());
        assert!(result.is_err());
    }

    // -- Validation --

    #[test]
    fn validate_catches_zero_timeouts() {
        let mut cfg = Config::default();
        cfg.timeouts.probe_secs = 0;
        cfg.timeouts.connect_secs = 0;
        cfg.timeouts.http_secs = 0;
        let errors = cfg.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"timeouts.probe_secs"));
        assert!(fields.contains(&"timeouts.connect_secs"));
        assert!(fields.contains(&"timeouts.http_secs"));
    }

    #[test]
    fn validate_catches_empty_tool_paths() {
        let mut cfg = Config::default();
        cfg.tools.rsync = PathBuf::new();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "tools.rsync"));
        assert!(!errors.iter().any(|e| e.field == "tools.ssh"));
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let mut cfg = Config::default();
            cfg.logging.level = level.to_string();
            let errors = cfg.validate();
            assert!(
                !errors.iter().any(|e| e.field == "logging.level"),
                "level '{level}' should be valid"
            );
        }
    }

    // -- Builder --

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .database_path(PathBuf::from("/tmp/nassync.db"))
            .rsync_binary("/opt/rsync")
            .ssh_binary("/opt/ssh")
            .ping_binary("/opt/ping")
            .probe_timeout_secs(1)
            .connect_timeout_secs(2)
            .http_timeout_secs(3)
            .logging_level("trace")
            .build();

        assert_eq!(cfg.database.path, PathBuf::from("/tmp/nassync.db"));
        assert_eq!(cfg.tools.rsync, PathBuf::from("/opt/rsync"));
        assert_eq!(cfg.tools.ssh, PathBuf::from("/opt/ssh"));
        assert_eq!(cfg.tools.ping, PathBuf::from("/opt/ping"));
        assert_eq!(cfg.timeouts.probe_secs, 1);
        assert_eq!(cfg.timeouts.connect_secs, 2);
        assert_eq!(cfg.timeouts.http_secs, 3);
        assert_eq!(cfg.logging.level, "trace");
    }

    #[test]
    fn build_validated_rejects_invalid_config() {
        let result = ConfigBuilder::new().http_timeout_secs(0).build_validated();
        let errors = result.expect_err("zero timeout must be rejected");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.http_secs");
        assert_eq!(
            errors[0].to_string(),
            "timeouts.http_secs: must be greater than 0"
        );
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("nassync/config.yaml"));
    }
}
