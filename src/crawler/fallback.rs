//! Fallback resolution for resources the archive is missing
//!
//! Resolution order per resource:
//! 1. Exact fetch at the snapshot timestamp
//! 2. Nearby timestamps, nearest first, in widening windows
//! 3. The CDN mirror, for well-known library files
//! 4. Missing

use crate::config::FallbackConfig;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::state::{ContentKind, ResolutionSource};
use crate::url::{archive_timestamp, ArchiveReference, ArchiveSource, CanonicalUrl, Timestamp};
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use url::Url;

/// Nearby search windows (hours either side of the snapshot)
pub const NEARBY_WINDOWS_HOURS: [i64; 4] = [6, 24, 72, 168];

/// New timestamps tried per window
const PROBES_PER_WINDOW: usize = 10;

/// Bytes obtained for a resource and where they came from
#[derive(Debug, Clone)]
pub struct Resolved {
    /// URL that actually served the bytes (after redirects)
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub source: ResolutionSource,
    /// Effective archive timestamp; `None` for CDN results
    pub timestamp: Option<Timestamp>,
}

/// Outcome of resolving one archive reference
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Resolved),
    Missing {
        /// Number of fetches attempted
        attempts: usize,
    },
}

/// Tries exact, nearby and CDN sources for each resource
#[derive(Clone)]
pub struct FallbackResolver {
    fetcher: Arc<dyn Fetcher>,
    source: ArchiveSource,
    config: FallbackConfig,
}

impl FallbackResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, source: ArchiveSource, config: FallbackConfig) -> Self {
        Self {
            fetcher,
            source,
            config,
        }
    }

    /// Resolves a reference, trying each source in order until one succeeds
    pub async fn resolve(&self, reference: &ArchiveReference, kind: ContentKind) -> Resolution {
        let mut attempts = 1;

        // Step 1: Exact
        let exact_url = reference.fetch_url(&self.source, kind);
        match self.fetcher.fetch(&exact_url).await {
            FetchResult::Success {
                final_url,
                content_type,
                body,
                ..
            } => {
                let timestamp = archive_timestamp(&final_url).unwrap_or(reference.timestamp);
                return Resolution::Found(Resolved {
                    final_url,
                    content_type,
                    body,
                    source: ResolutionSource::Exact,
                    timestamp: Some(timestamp),
                });
            }
            failure => {
                tracing::debug!(
                    "{} not available at {} ({}); searching nearby timestamps",
                    reference.url,
                    reference.timestamp,
                    failure.describe()
                );
            }
        }

        // Step 2: Nearby timestamps
        for timestamp in nearby_plan(reference.timestamp, self.config.max_probes) {
            attempts += 1;
            let url = reference.at(timestamp).fetch_url(&self.source, kind);

            if let FetchResult::Success {
                final_url,
                content_type,
                body,
                ..
            } = self.fetcher.fetch(&url).await
            {
                let offset =
                    (timestamp.as_datetime() - reference.timestamp.as_datetime()).num_hours();
                tracing::info!(
                    "Found {} at nearby timestamp {} ({:+}h)",
                    reference.url,
                    timestamp,
                    offset
                );
                let effective = archive_timestamp(&final_url).unwrap_or(timestamp);
                return Resolution::Found(Resolved {
                    final_url,
                    content_type,
                    body,
                    source: ResolutionSource::Nearby,
                    timestamp: Some(effective),
                });
            }
        }

        // Step 3: CDN mirror
        if self.config.cdn_enabled {
            if let Some(cdn) = cdn_url(&reference.url, &self.config.cdn_mirror_url) {
                attempts += 1;
                match self.fetcher.fetch(&cdn).await {
                    FetchResult::Success {
                        final_url,
                        content_type,
                        body,
                        ..
                    } => {
                        tracing::info!("Recovered {} from CDN mirror {}", reference.url, cdn);
                        return Resolution::Found(Resolved {
                            final_url,
                            content_type,
                            body,
                            source: ResolutionSource::Cdn,
                            timestamp: None,
                        });
                    }
                    failure => {
                        tracing::debug!("CDN mirror failed for {}: {}", cdn, failure.describe());
                    }
                }
            }
        }

        // Step 4: Missing
        Resolution::Missing { attempts }
    }
}

/// Nearby timestamps to try, in order
///
/// Each window is stepped by `max(1, window / 12)` hours; offsets are sorted
/// by distance with earlier timestamps first on ties. At most ten new
/// timestamps per window are taken, and `max_probes` in total.
pub fn nearby_plan(origin: Timestamp, max_probes: usize) -> Vec<Timestamp> {
    let mut seen = HashSet::new();
    let mut plan = Vec::new();

    for window in NEARBY_WINDOWS_HOURS {
        let step = (window / 12).max(1) as usize;
        let mut offsets: Vec<i64> = (-window..=window)
            .step_by(step)
            .filter(|offset| *offset != 0)
            .collect();
        offsets.sort_by_key(|offset| (offset.abs(), *offset));

        let mut added = 0;
        for offset in offsets {
            if added == PROBES_PER_WINDOW || plan.len() >= max_probes {
                break;
            }
            if let Some(timestamp) = origin.offset_hours(offset) {
                if seen.insert(timestamp) {
                    plan.push(timestamp);
                    added += 1;
                }
            }
        }
    }

    plan
}

/// A well-known library served by the CDN mirror
struct CdnLibrary {
    /// Library name on the mirror
    library: &'static str,
    /// File name stem as it appears in sites
    stem: &'static str,
    extension: &'static str,
    /// Directory inside the library's version folder
    dir: &'static str,
    /// Minified-file marker used by the mirror (`.min` or `-min`)
    min_marker: &'static str,
    /// Substring the URL path must contain, for generic stems
    path_hint: Option<&'static str>,
}

const CDN_LIBRARIES: &[CdnLibrary] = &[
    CdnLibrary {
        library: "jquery-migrate",
        stem: "jquery-migrate",
        extension: "js",
        dir: "",
        min_marker: ".min",
        path_hint: None,
    },
    CdnLibrary {
        library: "jquery",
        stem: "jquery",
        extension: "js",
        dir: "",
        min_marker: ".min",
        path_hint: None,
    },
    CdnLibrary {
        library: "twitter-bootstrap",
        stem: "bootstrap",
        extension: "js",
        dir: "js/",
        min_marker: ".min",
        path_hint: None,
    },
    CdnLibrary {
        library: "twitter-bootstrap",
        stem: "bootstrap",
        extension: "css",
        dir: "css/",
        min_marker: ".min",
        path_hint: None,
    },
    CdnLibrary {
        library: "font-awesome",
        stem: "font-awesome",
        extension: "css",
        dir: "css/",
        min_marker: ".min",
        path_hint: None,
    },
    CdnLibrary {
        library: "font-awesome",
        stem: "all",
        extension: "css",
        dir: "css/",
        min_marker: ".min",
        path_hint: Some("awesome"),
    },
    CdnLibrary {
        library: "modernizr",
        stem: "modernizr",
        extension: "js",
        dir: "",
        min_marker: ".min",
        path_hint: None,
    },
    CdnLibrary {
        library: "underscore.js",
        stem: "underscore",
        extension: "js",
        dir: "",
        min_marker: "-min",
        path_hint: None,
    },
    CdnLibrary {
        library: "lodash.js",
        stem: "lodash",
        extension: "js",
        dir: "",
        min_marker: ".min",
        path_hint: None,
    },
    CdnLibrary {
        library: "moment.js",
        stem: "moment",
        extension: "js",
        dir: "",
        min_marker: ".min",
        path_hint: None,
    },
];

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v?(\d+\.\d+(?:\.\d+)?)$").unwrap())
}

fn file_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<stem>[a-z][a-z-]*?)(?:[-.]v?(?P<ver>\d+\.\d+(?:\.\d+)?))?(?P<bundle>\.bundle)?(?P<min>[.-]min)?\.(?P<ext>js|css)$",
        )
        .unwrap()
    })
}

/// Maps a well-known library file to its CDN mirror URL
///
/// The version comes from the file name, a path segment or a `ver=`/`v=`
/// query parameter. Returns `None` for unknown files or when no version can
/// be found.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wayback_archive::config::WwwPolicy;
/// use wayback_archive::crawler::cdn_url;
/// use wayback_archive::url::{ArchiveSource, Canonicalizer};
///
/// let source = ArchiveSource::parse("https://web.archive.org/web/2020/https://example.com/").unwrap();
/// let canon = Canonicalizer::new(&source, WwwPolicy::NonWww);
/// let mirror = Url::parse("https://cdnjs.cloudflare.com/ajax/libs").unwrap();
///
/// let url = canon.canonicalize("https://example.com/js/jquery-3.5.1.min.js", None).unwrap();
/// assert_eq!(
///     cdn_url(&url, &mirror).as_deref(),
///     Some("https://cdnjs.cloudflare.com/ajax/libs/jquery/3.5.1/jquery.min.js")
/// );
/// ```
pub fn cdn_url(url: &CanonicalUrl, mirror: &Url) -> Option<String> {
    let path = url.path().to_ascii_lowercase();
    let file_name = path.rsplit('/').next()?;
    let captures = file_name_regex().captures(file_name)?;

    let stem = captures.name("stem")?.as_str();
    let extension = captures.name("ext")?.as_str();
    let library = CDN_LIBRARIES.iter().find(|lib| {
        lib.stem == stem
            && lib.extension == extension
            && lib.path_hint.map_or(true, |hint| path.contains(hint))
    })?;

    let version = captures
        .name("ver")
        .map(|m| m.as_str().to_string())
        .or_else(|| version_from_path(&path))
        .or_else(|| version_from_query(url.as_url()))?;

    let bundle = captures.name("bundle").map_or("", |m| m.as_str());
    let min = if captures.name("min").is_some() {
        library.min_marker
    } else {
        ""
    };

    Some(format!(
        "{}/{}/{}/{}{}{}{}.{}",
        mirror.as_str().trim_end_matches('/'),
        library.library,
        version,
        library.dir,
        library.stem,
        bundle,
        min,
        library.extension
    ))
}

fn version_from_path(path: &str) -> Option<String> {
    path.split('/')
        .filter_map(|segment| version_regex().captures(segment))
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .last()
}

fn version_from_query(url: &Url) -> Option<String> {
    url.query_pairs()
        .filter(|(key, _)| key == "ver" || key == "v")
        .find_map(|(_, value)| {
            version_regex()
                .captures(&value)
                .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{WwwPolicy, DEFAULT_CDN_MIRROR};
    use crate::crawler::mock::MockFetcher;
    use crate::url::Canonicalizer;

    const ENTRY: &str = "https://web.archive.org/web/20200101120000/https://example.com/";

    fn source() -> ArchiveSource {
        ArchiveSource::parse(ENTRY).unwrap()
    }

    fn url(raw: &str) -> CanonicalUrl {
        Canonicalizer::new(&source(), WwwPolicy::NonWww)
            .canonicalize(raw, None)
            .unwrap()
    }

    fn mirror() -> Url {
        Url::parse(DEFAULT_CDN_MIRROR).unwrap()
    }

    fn fallback_config() -> FallbackConfig {
        FallbackConfig {
            max_probes: 40,
            cdn_enabled: true,
            cdn_mirror_url: mirror(),
        }
    }

    fn reference(raw: &str) -> ArchiveReference {
        ArchiveReference::new(url(raw), source().timestamp)
    }

    #[test]
    fn test_nearby_plan_order() {
        let origin = Timestamp::parse("20200101120000").unwrap();
        let plan = nearby_plan(origin, 40);
        let first: Vec<String> = plan.iter().take(4).map(|t| t.to_string()).collect();

        assert_eq!(
            first,
            vec![
                "20200101110000",
                "20200101130000",
                "20200101100000",
                "20200101140000"
            ]
        );
    }

    #[test]
    fn test_nearby_plan_dedup_and_cap() {
        let origin = Timestamp::parse("20200101120000").unwrap();
        let plan = nearby_plan(origin, 40);

        let unique: HashSet<_> = plan.iter().collect();
        assert_eq!(unique.len(), plan.len());
        assert_eq!(plan.len(), 40);
        assert!(!plan.contains(&origin));

        assert_eq!(nearby_plan(origin, 3).len(), 3);
        assert!(nearby_plan(origin, 0).is_empty());
    }

    #[test]
    fn test_nearby_plan_first_window() {
        let origin = Timestamp::parse("20200101120000").unwrap();
        let plan = nearby_plan(origin, 40);

        // First window: ±1h..±5h
        for ts in &plan[..10] {
            let hours = (ts.as_datetime() - origin.as_datetime()).num_hours().abs();
            assert!((1..=5).contains(&hours), "{}", ts);
        }
    }

    #[test]
    fn test_cdn_url_from_file_name() {
        let cdn = cdn_url(&url("https://example.com/js/jquery-1.12.4.min.js"), &mirror());
        assert_eq!(
            cdn.as_deref(),
            Some("https://cdnjs.cloudflare.com/ajax/libs/jquery/1.12.4/jquery.min.js")
        );
    }

    #[test]
    fn test_cdn_url_from_query() {
        let cdn = cdn_url(
            &url("https://example.com/wp-includes/js/jquery/jquery-migrate.min.js?ver=3.3.2"),
            &mirror(),
        );
        assert_eq!(
            cdn.as_deref(),
            Some("https://cdnjs.cloudflare.com/ajax/libs/jquery-migrate/3.3.2/jquery-migrate.min.js")
        );
    }

    #[test]
    fn test_cdn_url_from_path_segment() {
        let cdn = cdn_url(
            &url("https://example.com/vendor/bootstrap/4.6.0/css/bootstrap.min.css"),
            &mirror(),
        );
        assert_eq!(
            cdn.as_deref(),
            Some("https://cdnjs.cloudflare.com/ajax/libs/twitter-bootstrap/4.6.0/css/bootstrap.min.css")
        );

        let underscore = cdn_url(&url("https://example.com/lib/1.13.1/underscore.min.js"), &mirror());
        assert_eq!(
            underscore.as_deref(),
            Some("https://cdnjs.cloudflare.com/ajax/libs/underscore.js/1.13.1/underscore-min.js")
        );
    }

    #[test]
    fn test_cdn_url_font_awesome_all() {
        let cdn = cdn_url(
            &url("https://example.com/fontawesome/5.15.4/css/all.min.css"),
            &mirror(),
        );
        assert_eq!(
            cdn.as_deref(),
            Some("https://cdnjs.cloudflare.com/ajax/libs/font-awesome/5.15.4/css/all.min.css")
        );
        assert!(cdn_url(&url("https://example.com/theme/1.0/all.min.css"), &mirror()).is_none());
    }

    #[test]
    fn test_cdn_url_unknown_or_unversioned() {
        assert!(cdn_url(&url("https://example.com/js/app-1.0.js"), &mirror()).is_none());
        assert!(cdn_url(&url("https://example.com/js/jquery.min.js"), &mirror()).is_none());
    }

    #[tokio::test]
    async fn test_exact_hit() {
        let fetcher = Arc::new(MockFetcher::new().with(
            "https://web.archive.org/web/20200101120000cs_/https://example.com/s.css",
            "text/css",
            b"body{}",
        ));
        let resolver = FallbackResolver::new(fetcher.clone(), source(), fallback_config());

        let resolution = resolver
            .resolve(&reference("https://example.com/s.css"), ContentKind::Css)
            .await;

        match resolution {
            Resolution::Found(resolved) => {
                assert_eq!(resolved.source, ResolutionSource::Exact);
                assert_eq!(resolved.body, b"body{}");
                assert_eq!(resolved.timestamp.unwrap().to_string(), "20200101120000");
            }
            other => panic!("expected exact hit, got {:?}", other),
        }
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_nearby_hit_records_timestamp() {
        let fetcher = Arc::new(MockFetcher::new().with(
            "https://web.archive.org/web/20200101130000im_/https://example.com/a.png",
            "image/png",
            b"\x89PNG\r\n\x1a\n",
        ));
        let resolver = FallbackResolver::new(fetcher.clone(), source(), fallback_config());

        let resolution = resolver
            .resolve(&reference("https://example.com/a.png"), ContentKind::Image)
            .await;

        match resolution {
            Resolution::Found(resolved) => {
                assert_eq!(resolved.source, ResolutionSource::Nearby);
                assert_eq!(resolved.timestamp.unwrap().to_string(), "20200101130000");
            }
            other => panic!("expected nearby hit, got {:?}", other),
        }

        // exact, -1h, +1h
        assert_eq!(fetcher.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_cdn_fallback() {
        let fetcher = Arc::new(MockFetcher::new().with(
            "https://cdnjs.cloudflare.com/ajax/libs/jquery/3.5.1/jquery.min.js",
            "application/javascript",
            b"/*! jQuery */",
        ));
        let resolver = FallbackResolver::new(fetcher.clone(), source(), fallback_config());

        let resolution = resolver
            .resolve(&reference("https://example.com/js/jquery-3.5.1.min.js"), ContentKind::Script)
            .await;

        match resolution {
            Resolution::Found(resolved) => {
                assert_eq!(resolved.source, ResolutionSource::Cdn);
                assert!(resolved.timestamp.is_none());
            }
            other => panic!("expected CDN hit, got {:?}", other),
        }
        assert_eq!(fetcher.requests().len(), 42);
    }

    #[tokio::test]
    async fn test_missing_after_all_sources() {
        let fetcher = Arc::new(MockFetcher::new());
        let mut config = fallback_config();
        config.max_probes = 5;
        let resolver = FallbackResolver::new(fetcher.clone(), source(), config);

        let resolution = resolver
            .resolve(&reference("https://example.com/gone.html"), ContentKind::Html)
            .await;

        assert!(matches!(resolution, Resolution::Missing { attempts: 6 }));
        assert_eq!(fetcher.requests().len(), 6);
    }

    #[tokio::test]
    async fn test_cdn_disabled() {
        let fetcher = Arc::new(MockFetcher::new());
        let mut config = fallback_config();
        config.max_probes = 0;
        config.cdn_enabled = false;
        let resolver = FallbackResolver::new(fetcher.clone(), source(), config);

        let resolution = resolver
            .resolve(&reference("https://example.com/js/jquery-3.5.1.min.js"), ContentKind::Script)
            .await;

        assert!(matches!(resolution, Resolution::Missing { attempts: 1 }));
    }
}
