//! Pattern tables for archive chrome, trackers, ads and contact links
//!
//! Shared by discovery (so filtered resources are never fetched) and the
//! rewriter (so their elements are removed from pages).

use url::Url;

/// Hosts and host fragments of analytics and tag-manager services
const TRACKER_HOSTS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "tagmanager.google.com",
    "facebook.net",
    "doubleclick.net",
    "googlesyndication.com",
    "hotjar.com",
    "clarity.ms",
    "scorecardresearch.com",
    "quantserve.com",
];

/// Host prefixes used by self-hosted analytics endpoints
const TRACKER_HOST_PREFIXES: &[&str] = &["analytics.", "stats.", "tracking.", "metrics."];

/// Script file names of common trackers
const TRACKER_FILES: &[&str] = &[
    "gtag.js",
    "ga.js",
    "analytics.js",
    "urchin.js",
    "fbevents.js",
    "gtm.js",
];

/// Substrings marking inline analytics or cookie-consent scripts
const TRACKER_INLINE_MARKERS: &[&str] = &[
    "google-analytics",
    "googletagmanager",
    "gtag(",
    "datalayer",
    "_gaq",
    "fbq(",
    "cookieyes",
    "cookie consent",
    "cookie banner",
    "cookiebar",
];

/// Class fragments of cookie and consent banners
const CONSENT_CLASS_MARKERS: &[&str] = &["cookie", "consent", "gdpr"];

/// Ad-serving hosts
const AD_HOSTS: &[&str] = &[
    "doubleclick.net",
    "googlesyndication.com",
    "advertising.com",
    "adnxs.com",
    "taboola.com",
    "outbrain.com",
];

/// Host prefixes of ad servers
const AD_HOST_PREFIXES: &[&str] = &["ads.", "ad.", "adserver.", "googleads."];

/// Generic ad words; only meaningful on URLs that leave the site
const AD_WORDS: &[&str] = &["banner", "popup", "sponsor"];

/// Schemes of clickable contact links
pub const CONTACT_SCHEMES: &[&str] = &["mailto:", "tel:", "sms:", "whatsapp:", "callto:"];

/// References that never name a fetchable resource
const INERT_PREFIXES: &[&str] = &["javascript:", "data:", "vbscript:", "about:", "blob:", "#"];

/// Element ids of the archive toolbar
const CHROME_IDS: &[&str] = &["wm-ipp", "wm-bipp", "wm-toolbar", "donato"];

/// Script sources injected by the archive
const CHROME_SCRIPTS: &[&str] = &[
    "bundle-playback.js",
    "wombat.js",
    "ruffle.js",
    "web-static.archive.org",
    "archive.org/_static",
];

/// Style sheets injected by the archive
const CHROME_STYLESHEETS: &[&str] = &[
    "banner-styles.css",
    "iconochive.css",
    "web-static.archive.org",
    "archive.org/_static",
];

/// Inline script markers of the archive's playback runtime
const CHROME_INLINE_MARKERS: &[&str] = &["__wm", "wombat", "RufflePlayer", "archive_analytics"];

/// Comment markers added by the archive
const CHROME_COMMENT_MARKERS: &[&str] = &[
    "BEGIN WAYBACK TOOLBAR",
    "END WAYBACK TOOLBAR",
    "FILE ARCHIVED ON",
    "playback timings",
    "web.archive.org",
];

/// Returns true if the reference can never be fetched (`#`, `javascript:`, `data:` ...)
pub fn is_inert_reference(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || INERT_PREFIXES.iter().any(|p| starts_with_ignore_case(trimmed, p))
}

/// Returns the contact scheme of a reference, if any
pub fn contact_scheme(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    CONTACT_SCHEMES
        .iter()
        .copied()
        .find(|scheme| starts_with_ignore_case(trimmed, scheme))
}

/// Returns true if the URL points at an analytics or tag-manager resource
pub fn is_tracker_url(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let path = url.path().to_ascii_lowercase();

    TRACKER_HOSTS.iter().any(|h| host_matches(host, h))
        || TRACKER_HOST_PREFIXES.iter().any(|p| host.starts_with(p))
        || (host_matches(host, "facebook.com") && (path == "/tr" || path.starts_with("/tr/")))
        || file_name(&path).is_some_and(|name| TRACKER_FILES.contains(&name))
}

/// Returns true if inline script text looks like analytics or consent code
pub fn is_tracker_inline_script(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    TRACKER_INLINE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Returns true if a class attribute marks a cookie or consent banner
pub fn is_consent_class(classes: &str) -> bool {
    let lower = classes.to_ascii_lowercase();
    CONSENT_CLASS_MARKERS.iter().any(|m| lower.contains(m))
}

/// Returns true if the URL points at an ad resource
///
/// Host patterns always apply; generic words only when `external` is set.
pub fn is_ad_url(url: &Url, external: bool) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let path = url.path().to_ascii_lowercase();

    if AD_HOSTS.iter().any(|h| host_matches(host, h))
        || AD_HOST_PREFIXES.iter().any(|p| host.starts_with(p))
    {
        return true;
    }

    external && AD_WORDS.iter().any(|w| path.contains(w) || host.contains(w))
}

/// Returns true if an element id belongs to the archive toolbar
pub fn is_chrome_id(id: &str) -> bool {
    let lower = id.to_ascii_lowercase();
    CHROME_IDS.iter().any(|c| lower.starts_with(c))
}

pub fn is_chrome_script(src: &str) -> bool {
    CHROME_SCRIPTS.iter().any(|c| src.contains(c))
}

pub fn is_chrome_stylesheet(href: &str) -> bool {
    CHROME_STYLESHEETS.iter().any(|c| href.contains(c))
}

pub fn is_chrome_inline_script(text: &str) -> bool {
    CHROME_INLINE_MARKERS.iter().any(|m| text.contains(m))
}

pub fn is_chrome_comment(text: &str) -> bool {
    CHROME_COMMENT_MARKERS.iter().any(|m| text.contains(m))
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

fn file_name(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}
