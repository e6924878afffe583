//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Process-wide settings, read once at startup.
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Debug, Clone, Getters, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    host: String,

    /// Port to bind.
    port: u16,

    /// Directory served under `/static/`.
    static_dir: PathBuf,

    /// Directory holding `index.html`.
    frontend_dir: PathBuf,

    /// Newline-separated play words.
    word_file: PathBuf,

    /// Newline-separated words used to name auto-generated games.
    game_id_file: PathBuf,

    /// Analytics tracking id injected into the index page.
    analytics_id: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9091,
            static_dir: PathBuf::from("frontend/static"),
            frontend_dir: PathBuf::from("frontend"),
            word_file: PathBuf::from("assets/original.txt"),
            game_id_file: PathBuf::from("assets/game-id-words.txt"),
            analytics_id: None,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// See [`ServerConfig::host`].
    pub host: Option<String>,
    /// See [`ServerConfig::port`].
    pub port: Option<u16>,
    /// See [`ServerConfig::static_dir`].
    pub static_dir: Option<PathBuf>,
    /// See [`ServerConfig::frontend_dir`].
    pub frontend_dir: Option<PathBuf>,
    /// See [`ServerConfig::word_file`].
    pub word_file: Option<PathBuf>,
    /// See [`ServerConfig::game_id_file`].
    pub game_id_file: Option<PathBuf>,
    /// See [`ServerConfig::analytics_id`].
    pub analytics_id: Option<String>,
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if given, otherwise starts from defaults, then applies
    /// `overrides`.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(overrides))
    }

    /// Replaces fields for which an override is present.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(dir) = overrides.static_dir {
            self.static_dir = dir;
        }
        if let Some(dir) = overrides.frontend_dir {
            self.frontend_dir = dir;
        }
        if let Some(file) = overrides.word_file {
            self.word_file = file;
        }
        if let Some(file) = overrides.game_id_file {
            self.game_id_file = file;
        }
        if overrides.analytics_id.is_some() {
            self.analytics_id = overrides.analytics_id;
        }
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
