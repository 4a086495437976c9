use crate::url::ArchiveSource;
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Default browser-like user agent; the archive serves some assets only to browsers
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Default CDN mirror for well-known library files
pub const DEFAULT_CDN_MIRROR: &str = "https://cdnjs.cloudflare.com/ajax/libs";

/// Main configuration structure for Wayback-Archive
///
/// Built once at startup by [`crate::config::Settings::resolve`]; every
/// mutually-exclusive flag pair has already been collapsed into a single enum.
#[derive(Debug, Clone)]
pub struct Config {
    /// The snapshot entry point, as given
    pub wayback_url: String,

    /// Parsed entry point (archive base, timestamp, live root URL)
    pub archive: ArchiveSource,

    /// Root of the offline tree
    pub output_dir: PathBuf,

    pub crawler: CrawlerConfig,
    pub fallback: FallbackConfig,
    pub links: LinkConfig,
    pub filters: FilterConfig,
    pub optimize: OptimizeConfig,
}

/// Crawl loop behavior
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Stop handing out URLs once this many have been visited
    pub max_files: Option<usize>,

    /// Maximum number of archive fetches in flight
    pub max_concurrent_fetches: usize,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// User agent sent to the archive
    pub user_agent: String,
}

/// Fallback resolution behavior
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// Upper bound on nearby-timestamp probes per resource
    pub max_probes: usize,

    /// Whether the CDN mirror is consulted for well-known library files
    pub cdn_enabled: bool,

    /// Base URL of the CDN mirror
    pub cdn_mirror_url: Url,
}

/// Reference rewriting behavior
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Rewrite internal references as document-relative paths
    pub make_internal_links_relative: bool,

    /// Host normalization for the site's own domain
    pub www: WwwPolicy,

    /// Keep redirect sources as stub pages instead of collapsing to the target
    pub keep_redirections: bool,

    /// Point references to missing or corrupted resources at the live URL instead of dropping them
    pub keep_missing_references: bool,

    /// Download non-hyperlink assets hosted on other domains
    pub download_external_assets: bool,
}

/// Content removal behavior
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub remove_trackers: bool,
    pub remove_ads: bool,
    pub remove_clickable_contacts: bool,
    pub remove_external_iframes: bool,
    pub external_links: ExternalLinkPolicy,
}

/// Optimizer routing; the optimizers themselves are external capabilities
#[derive(Debug, Clone, Copy)]
pub struct OptimizeConfig {
    pub html: bool,
    pub images: bool,
    pub js: bool,
    pub css: bool,
}

/// www / non-www normalization of the site's host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WwwPolicy {
    /// Strip a leading `www.`
    NonWww,
    /// Add a leading `www.`
    Www,
    /// Leave hosts untouched
    Keep,
}

/// What happens to anchors that leave the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalLinkPolicy {
    /// Remove the link but keep its contents in place
    Unlink,
    /// Remove the anchor element entirely
    Remove,
    /// Keep the anchor pointing at the live external URL
    Keep,
}

/// TOML configuration file
///
/// Keys mirror the environment variable names in kebab-case, e.g.
/// `wayback-url` or `make-non-www`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub wayback_url: Option<String>,
    pub output_dir: Option<String>,
    pub optimize_html: Option<bool>,
    pub optimize_images: Option<bool>,
    pub minify_js: Option<bool>,
    pub minify_css: Option<bool>,
    pub remove_trackers: Option<bool>,
    pub remove_ads: Option<bool>,
    pub remove_external_links_keep_anchors: Option<bool>,
    pub remove_external_links_remove_anchors: Option<bool>,
    pub remove_clickable_contacts: Option<bool>,
    pub remove_external_iframes: Option<bool>,
    pub make_internal_links_relative: Option<bool>,
    pub make_non_www: Option<bool>,
    pub make_www: Option<bool>,
    pub keep_redirections: Option<bool>,
    pub max_files: Option<u64>,
    pub max_concurrent_fetches: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub fallback_max_probes: Option<u64>,
    pub cdn_fallback: Option<bool>,
    pub cdn_mirror_url: Option<String>,
    pub download_external_assets: Option<bool>,
    pub keep_missing_references: Option<bool>,
    pub user_agent: Option<String>,
}
