//! Wayback-Archive: offline copies of archived websites
//!
//! This crate crawls a web-archive mirror starting from a single snapshot URL,
//! resolves every asset the snapshot depends on (falling back to nearby
//! timestamps and a CDN mirror when the archive is incomplete), and rewrites
//! all references so the resulting directory tree can be browsed offline.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod filters;
pub mod integrity;
pub mod output;
pub mod rewrite;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Wayback-Archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Archive entry point could not be retrieved: {url}")]
    EntryPointUnreachable { url: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("{0} is required")]
    MissingKey(&'static str),

    #[error("{first} and {second} are mutually exclusive")]
    Conflict {
        first: &'static str,
        second: &'static str,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Content that could not be mined for references
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{kind} payload looks binary")]
    Binary { kind: &'static str },

    #[error("{kind} payload is empty")]
    Empty { kind: &'static str },
}

/// Result type alias for Wayback-Archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Frontier};
pub use state::{ContentKind, FetchedResource, ResourceStatus};
pub use url::{ArchiveReference, CanonicalUrl, Canonicalizer};
