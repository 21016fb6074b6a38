//! Configuration management for routebox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `ROUTEBOX__<section>__<key>`
//!
//! Examples:
//! - `ROUTEBOX__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `ROUTEBOX__NEGOTIATION__FALLBACK_MEDIA_TYPE=application/json`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/routebox.toml`.
//! This can be overridden using the `ROUTEBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, NegotiationConfig, ServerConfig};
pub use validation::ValidationError;

use crate::media::MediaRange;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// The validated wildcard-fallback media range.
    pub fn fallback_media(&self) -> Result<MediaRange, ConfigError> {
        MediaRange::parse(&self.negotiation.fallback_media_type).map_err(|_| {
            ConfigError::ValidationError(ValidationError::InvalidFallbackMediaType {
                value: self.negotiation.fallback_media_type.clone(),
            })
        })
    }
}
