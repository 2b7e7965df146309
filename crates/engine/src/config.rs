//! Configuration via `tessera.toml`
//!
//! Global association layout defaults and the error handling mode. A default,
//! commented `tessera.toml` can be written on first use; to change settings,
//! edit the file and reopen.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tessera_concurrency::{
    ContinueErrorHandler, DefaultErrorHandler, ErrorHandler, LoggingErrorHandler,
};
use tessera_core::{Error, Result};
use tessera_document::{AssociationStorageType, MapStorageType, StorageSettings};
use tracing::debug;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tessera.toml";

/// Built-in error handler selected by `error_handling`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorHandlingMode {
    /// Abort on the first failure
    Abort,
    /// Ignore failures and apply the remaining operations
    Continue,
    /// Log failures with the applied operations, then abort
    Log,
}

/// Configuration loaded from `tessera.toml`.
///
/// # Example
///
/// ```toml
/// # "in_entity" or "association_document"
/// association_storage = "in_entity"
/// # "by_key" or "as_list"
/// map_storage = "by_key"
/// # "abort" (default), "continue" or "log"
/// error_handling = "abort"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TesseraConfig {
    /// Global association storage; the datastore default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_storage: Option<AssociationStorageType>,
    /// Global map storage; the datastore default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_storage: Option<MapStorageType>,
    /// Error handling mode: `"abort"`, `"continue"` or `"log"`
    #[serde(default = "default_error_handling")]
    pub error_handling: String,
}

fn default_error_handling() -> String {
    "abort".to_string()
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self {
            association_storage: None,
            map_storage: None,
            error_handling: default_error_handling(),
        }
    }
}

impl TesseraConfig {
    /// Parse the error handling mode.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` for an unknown mode.
    pub fn error_handling_mode(&self) -> Result<ErrorHandlingMode> {
        match self.error_handling.as_str() {
            "abort" => Ok(ErrorHandlingMode::Abort),
            "continue" => Ok(ErrorHandlingMode::Continue),
            "log" => Ok(ErrorHandlingMode::Log),
            other => Err(Error::invalid_config(format!(
                "Invalid error_handling '{}' in {}. Expected \"abort\", \"continue\" or \"log\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Build the configured built-in error handler
    pub fn error_handler(&self) -> Result<Arc<dyn ErrorHandler>> {
        Ok(match self.error_handling_mode()? {
            ErrorHandlingMode::Abort => Arc::new(DefaultErrorHandler),
            ErrorHandlingMode::Continue => Arc::new(ContinueErrorHandler),
            ErrorHandlingMode::Log => Arc::new(LoggingErrorHandler),
        })
    }

    /// Global storage settings
    pub fn storage_settings(&self) -> StorageSettings {
        StorageSettings {
            association_storage: self.association_storage,
            map_storage: self.map_storage,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Tessera configuration
#
# Where association rows are stored (default: datastore default)
#   "in_entity"            = embedded in the owning entity's document
#   "association_document" = one dedicated document per association
# association_storage = "in_entity"

# How map-typed associations are stored (default: datastore default)
#   "by_key"  = object keyed by the map key (single string key only)
#   "as_list" = list of entries
# map_storage = "by_key"

# What to do when a backend operation fails
#   "abort"    = stop the unit of work and return the error
#   "continue" = ignore the failure and apply the remaining operations
#   "log"      = log the failure and the applied operations, then abort
error_handling = "abort"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read and
    /// `Error::InvalidConfig` if it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            )
        })?;
        let config: TesseraConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        // Validate the handling mode eagerly
        config.error_handling_mode()?;
        debug!(target: "tessera::config", path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
            debug!(
                target: "tessera::config",
                path = %path.display(),
                "Wrote default configuration"
            );
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
