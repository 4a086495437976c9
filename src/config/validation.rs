use crate::config::parser::Settings;
use crate::config::types::{
    Config, CrawlerConfig, ExternalLinkPolicy, FallbackConfig, FilterConfig, LinkConfig,
    OptimizeConfig, WwwPolicy, DEFAULT_CDN_MIRROR, DEFAULT_USER_AGENT,
};
use crate::url::ArchiveSource;
use crate::ConfigError;
use std::path::PathBuf;
use url::Url;

const DEFAULT_OUTPUT_DIR: &str = "./output";
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FALLBACK_MAX_PROBES: usize = 40;

/// Validates raw settings and builds the effective configuration
pub fn validate(settings: &Settings) -> Result<Config, ConfigError> {
    let wayback_url = settings
        .get("WAYBACK_URL")
        .ok_or(ConfigError::MissingKey("WAYBACK_URL"))?
        .to_string();
    let archive = ArchiveSource::parse(&wayback_url)
        .map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid WAYBACK_URL '{}': {}", wayback_url, e))
        })?;

    let output_dir = PathBuf::from(settings.get("OUTPUT_DIR").unwrap_or(DEFAULT_OUTPUT_DIR));

    let crawler = validate_crawler_config(settings)?;
    let fallback = validate_fallback_config(settings)?;
    let links = validate_link_config(settings)?;
    let filters = validate_filter_config(settings)?;
    let optimize = OptimizeConfig {
        html: parse_bool(settings, "OPTIMIZE_HTML", true)?,
        images: parse_bool(settings, "OPTIMIZE_IMAGES", false)?,
        js: parse_bool(settings, "MINIFY_JS", false)?,
        css: parse_bool(settings, "MINIFY_CSS", false)?,
    };

    Ok(Config {
        wayback_url,
        archive,
        output_dir,
        crawler,
        fallback,
        links,
        filters,
        optimize,
    })
}

/// Validates crawl loop settings
fn validate_crawler_config(settings: &Settings) -> Result<CrawlerConfig, ConfigError> {
    let max_files = match settings.get("MAX_FILES") {
        None => None,
        Some(_) => {
            let n = parse_number(settings, "MAX_FILES", 0)?;
            if n < 1 {
                return Err(ConfigError::Validation(format!(
                    "MAX_FILES must be >= 1, got {}",
                    n
                )));
            }
            Some(n as usize)
        }
    };

    let max_concurrent_fetches = parse_number(
        settings,
        "MAX_CONCURRENT_FETCHES",
        DEFAULT_MAX_CONCURRENT_FETCHES as u64,
    )? as usize;
    if !(1..=64).contains(&max_concurrent_fetches) {
        return Err(ConfigError::Validation(format!(
            "MAX_CONCURRENT_FETCHES must be between 1 and 64, got {}",
            max_concurrent_fetches
        )));
    }

    let request_timeout_secs =
        parse_number(settings, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
    if request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "REQUEST_TIMEOUT_SECS must be >= 1, got {}",
            request_timeout_secs
        )));
    }

    let user_agent = settings
        .get("USER_AGENT")
        .unwrap_or(DEFAULT_USER_AGENT)
        .to_string();

    Ok(CrawlerConfig {
        max_files,
        max_concurrent_fetches,
        request_timeout_secs,
        user_agent,
    })
}

/// Validates fallback settings
fn validate_fallback_config(settings: &Settings) -> Result<FallbackConfig, ConfigError> {
    let max_probes = parse_number(
        settings,
        "FALLBACK_MAX_PROBES",
        DEFAULT_FALLBACK_MAX_PROBES as u64,
    )? as usize;

    let mirror = settings.get("CDN_MIRROR_URL").unwrap_or(DEFAULT_CDN_MIRROR);
    let cdn_mirror_url = Url::parse(mirror.trim_end_matches('/'))
        .map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid CDN_MIRROR_URL '{}': {}", mirror, e))
        })?;

    if cdn_mirror_url.scheme() != "https" && cdn_mirror_url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "CDN_MIRROR_URL must use http or https, got '{}'",
            mirror
        )));
    }

    Ok(FallbackConfig {
        max_probes,
        cdn_enabled: parse_bool(settings, "CDN_FALLBACK", true)?,
        cdn_mirror_url,
    })
}

/// Validates link rewriting settings
///
/// When both www flags are set, non-www wins.
fn validate_link_config(settings: &Settings) -> Result<LinkConfig, ConfigError> {
    let make_non_www = parse_bool(settings, "MAKE_NON_WWW", true)?;
    let make_www = parse_bool(settings, "MAKE_WWW", false)?;

    let www = match (make_non_www, make_www) {
        (true, true) => {
            tracing::warn!("MAKE_NON_WWW and MAKE_WWW are both set; using non-www");
            WwwPolicy::NonWww
        }
        (true, false) => WwwPolicy::NonWww,
        (false, true) => WwwPolicy::Www,
        (false, false) => WwwPolicy::Keep,
    };

    Ok(LinkConfig {
        make_internal_links_relative: parse_bool(settings, "MAKE_INTERNAL_LINKS_RELATIVE", true)?,
        www,
        keep_redirections: parse_bool(settings, "KEEP_REDIRECTIONS", false)?,
        keep_missing_references: parse_bool(settings, "KEEP_MISSING_REFERENCES", false)?,
        download_external_assets: parse_bool(settings, "DOWNLOAD_EXTERNAL_ASSETS", false)?,
    })
}

/// Validates content filter settings
///
/// Setting only REMOVE_EXTERNAL_LINKS_REMOVE_ANCHORS overrides the keep-anchors
/// default; setting both explicitly is a conflict.
fn validate_filter_config(settings: &Settings) -> Result<FilterConfig, ConfigError> {
    const KEEP: &str = "REMOVE_EXTERNAL_LINKS_KEEP_ANCHORS";
    const REMOVE: &str = "REMOVE_EXTERNAL_LINKS_REMOVE_ANCHORS";

    let keep_explicit = settings.get(KEEP).is_some();
    let keep_anchors = parse_bool(settings, KEEP, true)?;
    let remove_anchors = parse_bool(settings, REMOVE, false)?;

    let external_links = match (keep_anchors, remove_anchors) {
        (true, true) if keep_explicit => {
            return Err(ConfigError::Conflict {
                first: KEEP,
                second: REMOVE,
            })
        }
        (_, true) => ExternalLinkPolicy::Remove,
        (true, false) => ExternalLinkPolicy::Unlink,
        (false, false) => ExternalLinkPolicy::Keep,
    };

    Ok(FilterConfig {
        remove_trackers: parse_bool(settings, "REMOVE_TRACKERS", true)?,
        remove_ads: parse_bool(settings, "REMOVE_ADS", true)?,
        remove_clickable_contacts: parse_bool(settings, "REMOVE_CLICKABLE_CONTACTS", true)?,
        remove_external_iframes: parse_bool(settings, "REMOVE_EXTERNAL_IFRAMES", false)?,
        external_links,
    })
}

/// Parses a boolean flag, accepting true/1/yes/on and false/0/no/off
fn parse_bool(settings: &Settings, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = settings.get(key) else {
        return Ok(default);
    };

    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Parses a non-negative integer setting
fn parse_number(settings: &Settings, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match settings.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
