//! Archive addressing: snapshot timestamps, entry-point parsing and the
//! mapping between live URLs and archive fetch URLs.

use crate::state::ContentKind;
use crate::url::CanonicalUrl;
use crate::UrlError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use url::Url;

/// Host of the public Wayback Machine, always recognized as an archive prefix
pub const WAYBACK_HOST: &str = "web.archive.org";

/// Padding used for partial timestamps (`2020` → `20200101000000`)
const TIMESTAMP_TEMPLATE: &str = "00000101000000";

/// Schemes that may appear directly after an archive prefix
const LIVE_SCHEMES: &[&str] = &[
    "http://",
    "https://",
    "mailto:",
    "tel:",
    "sms:",
    "callto:",
    "whatsapp:",
];

/// A snapshot timestamp (`YYYYMMDDhhmmss`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Parses 4 to 14 digits, padding missing fields with their earliest value
    ///
    /// # Examples
    ///
    /// ```
    /// use wayback_archive::url::Timestamp;
    ///
    /// let ts = Timestamp::parse("202501").unwrap();
    /// assert_eq!(ts.to_string(), "20250101000000");
    /// ```
    pub fn parse(digits: &str) -> Result<Self, UrlError> {
        if digits.len() < 4 || digits.len() > 14 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UrlError::Malformed(format!(
                "Archive timestamp must be 4-14 digits, got '{}'",
                digits
            )));
        }

        let padded = format!("{}{}", digits, &TIMESTAMP_TEMPLATE[digits.len()..]);
        let field = |range: std::ops::Range<usize>| -> u32 {
            padded[range].parse::<u32>().unwrap_or(0)
        };

        NaiveDate::from_ymd_opt(field(0..4) as i32, field(4..6), field(6..8))
            .and_then(|date| date.and_hms_opt(field(8..10), field(10..12), field(12..14)))
            .map(Timestamp)
            .ok_or_else(|| UrlError::Malformed(format!("Invalid archive timestamp '{}'", digits)))
    }

    /// Returns the timestamp shifted by a number of hours, if representable
    pub fn offset_hours(&self, hours: i64) -> Option<Self> {
        self.0.checked_add_signed(Duration::hours(hours)).map(Timestamp)
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.0;
        write!(
            f,
            "{:04}{:02}{:02}{:02}{:02}{:02}",
            d.year(),
            d.month(),
            d.day(),
            d.hour(),
            d.minute(),
            d.second()
        )
    }
}

/// The snapshot being reconstructed, parsed from `WAYBACK_URL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    /// Archive origin without trailing slash, e.g. `https://web.archive.org`
    pub base: String,

    /// Snapshot timestamp of the entry point
    pub timestamp: Timestamp,

    /// Live URL of the entry point
    pub root: Url,
}

impl ArchiveSource {
    /// Parses `<scheme>://<host>/web/<digits>[modifier_]/<live-url>`
    ///
    /// The live part may be a bare host (`http://` is assumed) and may carry
    /// a query string.
    pub fn parse(wayback_url: &str) -> Result<Self, UrlError> {
        let raw = wayback_url.trim();
        let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }
        let host = url.host_str().ok_or(UrlError::MissingDomain)?;
        let base = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        let after_scheme = raw
            .split_once("://")
            .map(|(_, rest)| rest)
            .ok_or_else(|| UrlError::Malformed(raw.to_string()))?;
        let path = after_scheme
            .find('/')
            .map(|i| &after_scheme[i..])
            .ok_or_else(|| UrlError::Malformed(format!("No snapshot path in '{}'", raw)))?;

        let (stamp, live) = split_snapshot_path(path)
            .ok_or_else(|| {
                UrlError::Malformed(format!("Expected /web/<timestamp>/<url> in '{}'", raw))
            })?;
        let timestamp = Timestamp::parse(stamp)?;

        let root = Url::parse(&repair_live_url(live)).map_err(|e| UrlError::Parse(e.to_string()))?;
        if root.scheme() != "http" && root.scheme() != "https" {
            return Err(UrlError::InvalidScheme(root.scheme().to_string()));
        }
        if root.host_str().is_none() {
            return Err(UrlError::MissingDomain);
        }

        Ok(Self {
            base,
            timestamp,
            root,
        })
    }

    /// Authority (`host[:port]`) of the archive mirror
    pub fn archive_authority(&self) -> &str {
        self.base
            .split_once("://")
            .map(|(_, authority)| authority)
            .unwrap_or(&self.base)
    }

    /// Builds the fetch URL for a live URL at a given timestamp
    ///
    /// Images, style sheets and scripts get the archive's raw-content flag
    /// (`im_`, `cs_`, `js_`) so the mirror serves them without its toolbar.
    pub fn fetch_url(&self, live: &Url, timestamp: &Timestamp, kind: ContentKind) -> String {
        format!(
            "{}/web/{}{}/{}",
            self.base,
            timestamp,
            kind.archive_flag(),
            live
        )
    }
}

/// A live resource addressed at one snapshot timestamp
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveReference {
    pub url: CanonicalUrl,
    pub timestamp: Timestamp,
}

impl ArchiveReference {
    pub fn new(url: CanonicalUrl, timestamp: Timestamp) -> Self {
        Self { url, timestamp }
    }

    /// The same resource at another timestamp
    pub fn at(&self, timestamp: Timestamp) -> Self {
        Self {
            url: self.url.clone(),
            timestamp,
        }
    }

    pub fn fetch_url(&self, source: &ArchiveSource, kind: ContentKind) -> String {
        source.fetch_url(self.url.as_url(), &self.timestamp, kind)
    }
}

/// Recovers the live URL from an archive-prefixed reference
///
/// Recognizes absolute (`https://web.archive.org/web/...` or one of
/// `archive_hosts`), protocol-relative and root-relative (`/web/...`) forms.
/// A root-relative path only counts when its tail names a live URL (a
/// scheme or a host), so site paths like `/web/2019/report` are left alone.
/// Returns `None` when `raw` is not an archive reference.
///
/// # Examples
///
/// ```
/// use wayback_archive::url::strip_archive_prefix;
///
/// let live = strip_archive_prefix("/web/20200101000000im_/http://example.com/a.png", &[]);
/// assert_eq!(live.as_deref(), Some("http://example.com/a.png"));
/// ```
pub fn strip_archive_prefix(raw: &str, archive_hosts: &[String]) -> Option<String> {
    let raw = raw.trim();

    let root_relative = raw.starts_with("/web/");
    let path = if root_relative {
        raw
    } else {
        let rest = raw
            .strip_prefix("https://")
            .or_else(|| raw.strip_prefix("http://"))
            .or_else(|| raw.strip_prefix("//"))?;
        let slash = rest.find('/')?;
        let authority = &rest[..slash];
        let known = authority.eq_ignore_ascii_case(WAYBACK_HOST)
            || archive_hosts.iter().any(|h| h.eq_ignore_ascii_case(authority));
        if !known {
            return None;
        }
        &rest[slash..]
    };

    let (_, live) = split_snapshot_path(path)?;
    if root_relative && !is_live_target(live) {
        return None;
    }
    Some(repair_live_url(live))
}

/// Snapshot timestamp embedded in an archive fetch URL
pub fn archive_timestamp(url: &Url) -> Option<Timestamp> {
    split_snapshot_path(url.path()).and_then(|(stamp, _)| Timestamp::parse(stamp).ok())
}

/// Splits `/web/<digits>[xx_]/<rest>` into the timestamp digits and the rest
fn split_snapshot_path(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix("/web/")?;
    let (stamp, live) = rest.split_once('/')?;

    let digits_end = stamp
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(stamp.len());
    if digits_end == 0 {
        return None;
    }

    let modifier = &stamp[digits_end..];
    let valid_modifier = modifier.is_empty()
        || (modifier.len() == 3
            && modifier.ends_with('_')
            && modifier[..2].bytes().all(|b| b.is_ascii_lowercase()));
    if !valid_modifier || live.is_empty() {
        return None;
    }

    Some((&stamp[..digits_end], live))
}

/// Returns true if the tail of a snapshot path starts with a scheme or a host
fn is_live_target(live: &str) -> bool {
    let lower = live.to_ascii_lowercase();
    if lower.starts_with("//")
        || lower.starts_with("http:")
        || lower.starts_with("https:")
        || LIVE_SCHEMES.iter().any(|s| lower.starts_with(s))
    {
        return true;
    }

    let end = lower.find(['/', '?', '#']).unwrap_or(lower.len());
    let authority = &lower[..end];
    let host = match authority.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => authority,
    };

    let labels: Vec<&str> = host.split('.').collect();
    let well_formed = labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty() && l.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        });
    let tld_like = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic()));
    // `logo.png` and friends are file names, not hosts
    let file_like = ContentKind::from_extension(host).is_some_and(|k| k != ContentKind::Other);

    well_formed && tld_like && !file_like
}

/// Repairs live URLs mangled by path normalization inside archive paths
///
/// `http:/example.com` regains its second slash, protocol-relative forms get
/// `https:` and bare hosts get `http://`.
fn repair_live_url(live: &str) -> String {
    for scheme in ["http:", "https:"] {
        if let Some(rest) = live.strip_prefix(scheme) {
            if rest.starts_with('/') && !rest.starts_with("//") {
                return format!("{}/{}", scheme, rest);
            }
        }
    }

    if let Some(rest) = live.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    let lower = live.to_ascii_lowercase();
    if LIVE_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        live.to_string()
    } else {
        format!("http://{}", live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_timestamp() {
        let ts = Timestamp::parse("20250417203037").unwrap();
        assert_eq!(ts.to_string(), "20250417203037");
    }

    #[test]
    fn test_parse_partial_timestamp() {
        assert_eq!(Timestamp::parse("2020").unwrap().to_string(), "20200101000000");
        assert_eq!(Timestamp::parse("20200315").unwrap().to_string(), "20200315000000");
    }

    #[test]
    fn test_parse_invalid_timestamp() {
        assert!(Timestamp::parse("20").is_err());
        assert!(Timestamp::parse("202013").is_err());
        assert!(Timestamp::parse("2020ab").is_err());
        assert!(Timestamp::parse("202001011200000").is_err());
    }

    #[test]
    fn test_offset_hours_crosses_days() {
        let ts = Timestamp::parse("20200101230000").unwrap();
        assert_eq!(ts.offset_hours(2).unwrap().to_string(), "20200102010000");
        assert_eq!(ts.offset_hours(-24).unwrap().to_string(), "20191231230000");
    }

    #[test]
    fn test_parse_archive_source() {
        let source =
            ArchiveSource::parse("https://web.archive.org/web/20250417203037/https://example.com/")
                .unwrap();
        assert_eq!(source.base, "https://web.archive.org");
        assert_eq!(source.timestamp.to_string(), "20250417203037");
        assert_eq!(source.root.as_str(), "https://example.com/");
        assert_eq!(source.archive_authority(), "web.archive.org");
    }

    #[test]
    fn test_parse_archive_source_bare_host_and_port() {
        let source = ArchiveSource::parse("http://127.0.0.1:8080/web/2020id_/example.com").unwrap();
        assert_eq!(source.base, "http://127.0.0.1:8080");
        assert_eq!(source.archive_authority(), "127.0.0.1:8080");
        assert_eq!(source.root.as_str(), "http://example.com/");
    }

    #[test]
    fn test_parse_archive_source_keeps_query() {
        let source =
            ArchiveSource::parse("https://web.archive.org/web/2020/http://example.com/?page=2").unwrap();
        assert_eq!(source.root.query(), Some("page=2"));
    }

    #[test]
    fn test_parse_archive_source_rejects_plain_url() {
        assert!(ArchiveSource::parse("https://example.com/").is_err());
        assert!(ArchiveSource::parse("https://web.archive.org/web/").is_err());
        assert!(ArchiveSource::parse("ftp://web.archive.org/web/2020/http://x.com/").is_err());
    }

    #[test]
    fn test_fetch_url_flags() {
        let source =
            ArchiveSource::parse("https://web.archive.org/web/20250417203037/https://example.com/")
                .unwrap();
        let live = Url::parse("https://example.com/a.png").unwrap();
        let ts = source.timestamp;

        assert_eq!(
            source.fetch_url(&live, &ts, ContentKind::Image),
            "https://web.archive.org/web/20250417203037im_/https://example.com/a.png"
        );
        assert_eq!(
            source.fetch_url(&live, &ts, ContentKind::Html),
            "https://web.archive.org/web/20250417203037/https://example.com/a.png"
        );
    }

    #[test]
    fn test_strip_absolute_prefix() {
        let live = strip_archive_prefix(
            "https://web.archive.org/web/20250417203037cs_/https://example.com/s.css",
            &[],
        );
        assert_eq!(live.as_deref(), Some("https://example.com/s.css"));
    }

    #[test]
    fn test_strip_protocol_relative_prefix() {
        let live = strip_archive_prefix("//web.archive.org/web/2020/http://example.com/", &[]);
        assert_eq!(live.as_deref(), Some("http://example.com/"));
    }

    #[test]
    fn test_strip_configured_host() {
        let hosts = vec!["127.0.0.1:9000".to_string()];
        let live = strip_archive_prefix("http://127.0.0.1:9000/web/2020/http://example.com/x", &hosts);
        assert_eq!(live.as_deref(), Some("http://example.com/x"));
    }

    #[test]
    fn test_strip_repairs_single_slash() {
        let live = strip_archive_prefix("/web/2020/http:/example.com/x", &[]);
        assert_eq!(live.as_deref(), Some("http://example.com/x"));

        let bare = strip_archive_prefix("/web/2020/example.com/x", &[]);
        assert_eq!(bare.as_deref(), Some("http://example.com/x"));
    }

    #[test]
    fn test_strip_embedded_contact() {
        let live = strip_archive_prefix("/web/2020/mailto:info@example.com", &[]);
        assert_eq!(live.as_deref(), Some("mailto:info@example.com"));
    }

    #[test]
    fn test_archive_timestamp() {
        let url = Url::parse("https://web.archive.org/web/20200102030405im_/https://example.com/a.png")
            .unwrap();
        assert_eq!(archive_timestamp(&url).unwrap().to_string(), "20200102030405");
        assert!(archive_timestamp(&Url::parse("https://example.com/a.png").unwrap()).is_none());
    }

    #[test]
    fn test_strip_ignores_non_archive() {
        assert!(strip_archive_prefix("https://example.com/web/2020/x", &[]).is_none());
        assert!(strip_archive_prefix("/web/about/x", &[]).is_none());
        assert!(strip_archive_prefix("/images/a.png", &[]).is_none());
    }

    #[test]
    fn test_strip_keeps_site_paths_under_web() {
        assert!(strip_archive_prefix("/web/2019/report", &[]).is_none());
        assert!(strip_archive_prefix("/web/2019/photos/a.png", &[]).is_none());
        assert!(strip_archive_prefix("/web/2019/logo.png", &[]).is_none());
        assert!(strip_archive_prefix("/web/2019/", &[]).is_none());

        let host = strip_archive_prefix("/web/2019/www.example.com:8080/x", &[]);
        assert_eq!(host.as_deref(), Some("http://www.example.com:8080/x"));
    }
}
