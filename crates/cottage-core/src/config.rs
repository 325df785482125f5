//! Configuration Management
//!
//! Handles configuration from environment variables and TOML files with
//! defaults matching a local development store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Graph store endpoints and vocabulary
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by environment key; unset keys keep the
    /// current value
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Store endpoints
        if let Some(url) = lookup("RDF_ENDPOINT_URL") {
            self.store.query_endpoint = url;
        }
        if let Some(url) = lookup("RDF_UPDATE_URL") {
            self.store.update_endpoint = url;
        }

        // Vocabulary
        if let Some(ns) = lookup("RDF_DATA_NAMESPACE") {
            self.store.data_namespace = ns;
        }
        if let Some(ns) = lookup("RDF_ONTOLOGY_NAMESPACE") {
            self.store.ontology_namespace = ns;
        }

        if let Some(secs) = lookup("RDF_TIMEOUT_SECS") {
            self.store.timeout_secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RDF_TIMEOUT_SECS".to_string(),
                value: secs,
            })?;
        }
        if let Some(mode) = lookup("RDF_UPDATE_MODE") {
            self.store.update_mode = mode.parse()?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = parse_flag("LOG_JSON", &json)?;
        }

        Ok(self)
    }

    /// Check values that would otherwise fail on first use
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("store.query_endpoint", &self.store.query_endpoint),
            ("store.update_endpoint", &self.store.update_endpoint),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired(key.to_string()));
            }
        }
        for (key, value) in [
            ("store.data_namespace", &self.store.data_namespace),
            ("store.ontology_namespace", &self.store.ontology_namespace),
        ] {
            if value.is_empty() || value.contains(['<', '>', '"', ' ']) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Graph store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SPARQL query endpoint URL
    pub query_endpoint: String,

    /// SPARQL update endpoint URL
    pub update_endpoint: String,

    /// Base IRI for cottage resources
    pub data_namespace: String,

    /// Base IRI of the cottage ontology (the default `:` prefix)
    pub ontology_namespace: String,

    /// Transport timeout per store call in seconds
    pub timeout_secs: u64,

    /// How `update` replaces an existing cottage
    pub update_mode: UpdateMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            query_endpoint: "http://localhost:7200/repositories/cottages".to_string(),
            update_endpoint: "http://localhost:7200/repositories/cottages/statements".to_string(),
            data_namespace: "http://localhost:8080/cottageBooking/data/cottage#".to_string(),
            ontology_namespace: "http://localhost:8080/cottageBooking/onto/CottageOntology.owl#"
                .to_string(),
            timeout_secs: 30,
            update_mode: UpdateMode::Atomic,
        }
    }
}

/// Strategy for replacing a cottage on update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Delete and insert as two operations of a single update request
    #[default]
    Atomic,
    /// Two separate requests; a failure in between loses the cottage
    DeleteThenInsert,
}

impl std::str::FromStr for UpdateMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "atomic" => Ok(Self::Atomic),
            "delete_then_insert" => Ok(Self::DeleteThenInsert),
            _ => Err(ConfigError::InvalidValue {
                key: "RDF_UPDATE_MODE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
