//! Host configuration with layered loading.

use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::{Error as FigmentError, Figment};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing host configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error from the Figment configuration library.
    #[error("Configuration error: {0}")]
    Figment(Box<FigmentError>),

    /// The specified configuration file was not found.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<FigmentError> for ConfigError {
    fn from(err: FigmentError) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Top-level host configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostConfig {
    /// Blob writer settings.
    #[serde(default)]
    pub writer: WriterConfig,

    /// Causality stamping settings.
    #[serde(default)]
    pub causality: CausalityConfig,
}

impl HostConfig {
    /// Loads configuration from the default path (`meridian.toml`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("meridian.toml")
    }

    /// Loads configuration from the specified file path.
    ///
    /// Environment variables prefixed with `MERIDIAN_` override file
    /// settings, with `__` separating nested keys.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("MERIDIAN_").split("__").lowercase(false));

        figment
            .extract::<Self>()
            .map_err(ConfigError::from)?
            .validate()
    }

    /// Parses configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new().merge(Toml::string(content));
        figment
            .extract::<Self>()
            .map_err(ConfigError::from)?
            .validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.writer.buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "writer.buffer_size must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Blob writer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WriterConfig {
    /// Bytes buffered in the writer handle before flushing to the
    /// underlying stream.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

const fn default_buffer_size() -> usize {
    1024
}

/// Causality stamping configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CausalityConfig {
    /// Whether outbound queue messages are stamped with the producing
    /// invocation's id and trace context.
    #[serde(default = "default_true")]
    pub stamp_outbound: bool,
}

impl Default for CausalityConfig {
    fn default() -> Self {
        Self {
            stamp_outbound: default_true(),
        }
    }
}

const fn default_true() -> bool {
    true
}
