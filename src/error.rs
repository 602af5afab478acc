//! Error types for spoolkeeper
//!
//! All modules use `SpoolResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spoolkeeper operations
pub type SpoolResult<T> = Result<T, SpoolError>;

/// All errors that can occur in spoolkeeper
#[derive(Error, Debug)]
pub enum SpoolError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Catalog errors
    #[error("No API key configured for the design catalog")]
    ApiKeyMissing,

    #[error("API Error: {0}")]
    ApiStatus(u16),

    #[error("API request failed: {0}")]
    ApiTransport(String),

    #[error("Design not found: {0}")]
    DesignNotFound(String),

    // Image cache errors
    #[error("Image fetch failed for {url}: {reason}")]
    ImageFetch { url: String, reason: String },

    #[error("Image store unavailable at {path}: {reason}")]
    StoreUnavailable { path: PathBuf, reason: String },

    // Inventory errors
    #[error("Filament not found: {0}")]
    FilamentNotFound(String),

    #[error("Invalid bundled filament catalog: {0}")]
    CatalogInvalid(String),

    #[error("Failed to persist {region} state: {reason}")]
    Persist { region: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SpoolError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an image fetch error
    pub fn image_fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImageFetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a persistence error for a named region
    pub fn persist(region: impl Into<String>, reason: impl ToString) -> Self {
        Self::Persist {
            region: region.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ApiTransport(_) | Self::ImageFetch { .. })
            || matches!(self, Self::ApiStatus(code) if *code >= 500)
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ApiKeyMissing => {
                Some("Set SPOOLKEEPER_API_KEY or run: spoolkeeper config set catalog.api_key <key>")
            }
            Self::ApiStatus(401) | Self::ApiStatus(403) => Some("Check that your API key is valid"),
            Self::DesignNotFound(_) => Some("Run: spoolkeeper designs to list available slugs"),
            Self::FilamentNotFound(_) => Some("Run: spoolkeeper stock to list filament IDs"),
            _ => None,
        }
    }
}
