//! Configuration module for Wayback-Archive
//!
//! Settings are layered from lowest to highest precedence: an optional TOML
//! file, a `.env` file, the process environment, then command-line overrides.
//! The merged key/value map is validated once into an immutable [`Config`].
//!
//! # Example
//!
//! ```no_run
//! use wayback_archive::config::load_config;
//!
//! let config = load_config(None, None).unwrap();
//! println!("Snapshot host: {}", config.archive.root);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExternalLinkPolicy, FallbackConfig, FileConfig, FilterConfig,
    LinkConfig, OptimizeConfig, WwwPolicy, DEFAULT_CDN_MIRROR, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    collect_settings, compute_config_hash, describe_config, load_config, load_env_file,
    load_file_config, Settings, KEYS,
};
