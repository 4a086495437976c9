use crate::config::types::{Config, ExternalLinkPolicy, FileConfig, WwwPolicy};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Every configuration key understood by Wayback-Archive
pub const KEYS: &[&str] = &[
    "WAYBACK_URL",
    "OUTPUT_DIR",
    "OPTIMIZE_HTML",
    "OPTIMIZE_IMAGES",
    "MINIFY_JS",
    "MINIFY_CSS",
    "REMOVE_TRACKERS",
    "REMOVE_ADS",
    "REMOVE_EXTERNAL_LINKS_KEEP_ANCHORS",
    "REMOVE_EXTERNAL_LINKS_REMOVE_ANCHORS",
    "REMOVE_CLICKABLE_CONTACTS",
    "REMOVE_EXTERNAL_IFRAMES",
    "MAKE_INTERNAL_LINKS_RELATIVE",
    "MAKE_NON_WWW",
    "MAKE_WWW",
    "KEEP_REDIRECTIONS",
    "MAX_FILES",
    "MAX_CONCURRENT_FETCHES",
    "REQUEST_TIMEOUT_SECS",
    "FALLBACK_MAX_PROBES",
    "CDN_FALLBACK",
    "CDN_MIRROR_URL",
    "DOWNLOAD_EXTERNAL_ASSETS",
    "KEEP_MISSING_REFERENCES",
    "USER_AGENT",
];

/// Raw key/value settings collected from all configuration sources
///
/// Later sources override earlier ones. Values stay untyped until
/// [`Settings::resolve`] validates them into a [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: BTreeMap<&'static str, String>,
}

impl Settings {
    /// Creates an empty settings map (every key at its default)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key, ignoring names that are not configuration keys
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Some(known) = KEYS.iter().copied().find(|k| *k == key) {
            self.values.insert(known, value.into());
        } else {
            tracing::debug!("Ignoring unknown configuration key {}", key);
        }
    }

    /// Returns the raw value of a key, treating empty strings as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Overlays values from an environment-style lookup function
    pub fn overlay_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for &key in KEYS {
            if let Some(value) = lookup(key) {
                self.values.insert(key, value);
            }
        }
    }

    /// Overlays values from the process environment
    pub fn overlay_env(&mut self) {
        self.overlay_lookup(|key| std::env::var(key).ok());
    }

    /// Overlays values from a parsed TOML file
    pub fn overlay_file(&mut self, file: &FileConfig) {
        let mut put = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                self.values.insert(key, value);
            }
        };
        let b = |v: Option<bool>| v.map(|v| v.to_string());
        let n = |v: Option<u64>| v.map(|v| v.to_string());

        put("WAYBACK_URL", file.wayback_url.clone());
        put("OUTPUT_DIR", file.output_dir.clone());
        put("OPTIMIZE_HTML", b(file.optimize_html));
        put("OPTIMIZE_IMAGES", b(file.optimize_images));
        put("MINIFY_JS", b(file.minify_js));
        put("MINIFY_CSS", b(file.minify_css));
        put("REMOVE_TRACKERS", b(file.remove_trackers));
        put("REMOVE_ADS", b(file.remove_ads));
        put(
            "REMOVE_EXTERNAL_LINKS_KEEP_ANCHORS",
            b(file.remove_external_links_keep_anchors),
        );
        put(
            "REMOVE_EXTERNAL_LINKS_REMOVE_ANCHORS",
            b(file.remove_external_links_remove_anchors),
        );
        put("REMOVE_CLICKABLE_CONTACTS", b(file.remove_clickable_contacts));
        put("REMOVE_EXTERNAL_IFRAMES", b(file.remove_external_iframes));
        put(
            "MAKE_INTERNAL_LINKS_RELATIVE",
            b(file.make_internal_links_relative),
        );
        put("MAKE_NON_WWW", b(file.make_non_www));
        put("MAKE_WWW", b(file.make_www));
        put("KEEP_REDIRECTIONS", b(file.keep_redirections));
        put("MAX_FILES", n(file.max_files));
        put("MAX_CONCURRENT_FETCHES", n(file.max_concurrent_fetches));
        put("REQUEST_TIMEOUT_SECS", n(file.request_timeout_secs));
        put("FALLBACK_MAX_PROBES", n(file.fallback_max_probes));
        put("CDN_FALLBACK", b(file.cdn_fallback));
        put("CDN_MIRROR_URL", file.cdn_mirror_url.clone());
        put("DOWNLOAD_EXTERNAL_ASSETS", b(file.download_external_assets));
        put("KEEP_MISSING_REFERENCES", b(file.keep_missing_references));
        put("USER_AGENT", file.user_agent.clone());
    }

    /// Validates the collected settings into a [`Config`]
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        validate(self)
    }
}

/// Reads and parses a TOML configuration file
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let file: FileConfig = toml::from_str(&content)?;
    Ok(file)
}

/// Loads a `.env` file into the process environment
///
/// With an explicit path the file must exist; without one, a `.env` in the
/// working directory is loaded when present.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenv::from_path(path).map(|_| ()).map_err(|e| {
            ConfigError::Validation(format!("Failed to load {}: {}", path.display(), e))
        }),
        None => {
            if let Ok(found) = dotenv::dotenv() {
                tracing::debug!("Loaded environment from {}", found.display());
            }
            Ok(())
        }
    }
}

/// Collects settings from the optional TOML file, `.env` and the process environment
///
/// # Arguments
///
/// * `config_file` - Optional TOML configuration file (lowest precedence)
/// * `env_file` - Optional `.env` file; defaults to `./.env` when present
///
/// # Example
///
/// ```no_run
/// use wayback_archive::config::collect_settings;
///
/// let settings = collect_settings(None, None).unwrap();
/// let config = settings.resolve().unwrap();
/// println!("Writing to {}", config.output_dir.display());
/// ```
pub fn collect_settings(
    config_file: Option<&Path>,
    env_file: Option<&Path>,
) -> Result<Settings, ConfigError> {
    let mut settings = Settings::new();

    if let Some(path) = config_file {
        let file = load_file_config(path)?;
        settings.overlay_file(&file);
    }

    load_env_file(env_file)?;
    settings.overlay_env();

    Ok(settings)
}

/// Loads the configuration from all sources and validates it
pub fn load_config(
    config_file: Option<&Path>,
    env_file: Option<&Path>,
) -> Result<Config, ConfigError> {
    collect_settings(config_file, env_file)?.resolve()
}

/// Renders the resolved configuration as `KEY=value` lines, one per key
pub fn describe_config(config: &Config) -> Vec<(&'static str, String)> {
    let flag = |v: bool| v.to_string();
    let keep_anchors = config.filters.external_links == ExternalLinkPolicy::Unlink;
    let remove_anchors = config.filters.external_links == ExternalLinkPolicy::Remove;

    vec![
        ("WAYBACK_URL", config.wayback_url.clone()),
        ("OUTPUT_DIR", config.output_dir.display().to_string()),
        ("OPTIMIZE_HTML", flag(config.optimize.html)),
        ("OPTIMIZE_IMAGES", flag(config.optimize.images)),
        ("MINIFY_JS", flag(config.optimize.js)),
        ("MINIFY_CSS", flag(config.optimize.css)),
        ("REMOVE_TRACKERS", flag(config.filters.remove_trackers)),
        ("REMOVE_ADS", flag(config.filters.remove_ads)),
        ("REMOVE_EXTERNAL_LINKS_KEEP_ANCHORS", flag(keep_anchors)),
        ("REMOVE_EXTERNAL_LINKS_REMOVE_ANCHORS", flag(remove_anchors)),
        (
            "REMOVE_CLICKABLE_CONTACTS",
            flag(config.filters.remove_clickable_contacts),
        ),
        (
            "REMOVE_EXTERNAL_IFRAMES",
            flag(config.filters.remove_external_iframes),
        ),
        (
            "MAKE_INTERNAL_LINKS_RELATIVE",
            flag(config.links.make_internal_links_relative),
        ),
        ("MAKE_NON_WWW", flag(config.links.www == WwwPolicy::NonWww)),
        ("MAKE_WWW", flag(config.links.www == WwwPolicy::Www)),
        ("KEEP_REDIRECTIONS", flag(config.links.keep_redirections)),
        (
            "MAX_FILES",
            config
                .crawler
                .max_files
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unlimited".to_string()),
        ),
        (
            "MAX_CONCURRENT_FETCHES",
            config.crawler.max_concurrent_fetches.to_string(),
        ),
        (
            "REQUEST_TIMEOUT_SECS",
            config.crawler.request_timeout_secs.to_string(),
        ),
        ("FALLBACK_MAX_PROBES", config.fallback.max_probes.to_string()),
        ("CDN_FALLBACK", flag(config.fallback.cdn_enabled)),
        ("CDN_MIRROR_URL", config.fallback.cdn_mirror_url.to_string()),
        (
            "DOWNLOAD_EXTERNAL_ASSETS",
            flag(config.links.download_external_assets),
        ),
        (
            "KEEP_MISSING_REFERENCES",
            flag(config.links.keep_missing_references),
        ),
        ("USER_AGENT", config.crawler.user_agent.clone()),
    ]
}

/// Computes a SHA-256 fingerprint of the resolved configuration
///
/// Two runs with the same fingerprint produced their output under identical
/// settings.
///
/// # Returns
///
/// Hex-encoded SHA-256 hash (64 characters)
pub fn compute_config_hash(config: &Config) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in describe_config(config) {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
