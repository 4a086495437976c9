use crate::config::{Config, WwwPolicy};
use crate::url::archive::{strip_archive_prefix, ArchiveSource};
use crate::UrlError;
use std::fmt;
use url::Url;

/// A normalized absolute identity for a live resource
///
/// Only [`Canonicalizer`] constructs these, so two values compare equal
/// exactly when they name the same retrievable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Lowercased host
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.0.query()
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps raw references to canonical URLs for one snapshot
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    /// Site host without any `www.` prefix
    site_host: String,
    www: WwwPolicy,
    /// Archive mirror authorities recognized besides the public Wayback host
    archive_hosts: Vec<String>,
}

impl Canonicalizer {
    pub fn new(source: &ArchiveSource, www: WwwPolicy) -> Self {
        let host = source.root.host_str().unwrap_or_default().to_ascii_lowercase();
        let site_host = host.strip_prefix("www.").unwrap_or(&host).to_string();

        Self {
            site_host,
            www,
            archive_hosts: vec![source.archive_authority().to_ascii_lowercase()],
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.archive, config.links.www)
    }

    /// The site's own host, without `www.`
    pub fn site_host(&self) -> &str {
        &self.site_host
    }

    pub fn archive_hosts(&self) -> &[String] {
        &self.archive_hosts
    }

    /// Canonicalizes a raw reference found in (or naming) a document
    ///
    /// # Canonicalization Steps
    ///
    /// 1. Strip an embedded archive prefix to recover the live URL
    /// 2. Resolve protocol-relative and relative forms against `base`
    /// 3. Drop the fragment
    /// 4. Force the `https` scheme; reject anything that is not http(s)
    /// 5. Apply the www policy to the site's own host
    /// 6. Collapse repeated slashes in the path (trailing slash kept)
    /// 7. Keep the query verbatim, dropping only an empty `?`
    ///
    /// # Arguments
    ///
    /// * `raw` - Reference as written in the document
    /// * `base` - Canonical URL of the referencing document, if any
    ///
    /// # Examples
    ///
    /// ```
    /// use wayback_archive::config::WwwPolicy;
    /// use wayback_archive::url::{ArchiveSource, Canonicalizer};
    ///
    /// let source = ArchiveSource::parse(
    ///     "https://web.archive.org/web/20250417203037/http://www.example.com/",
    /// ).unwrap();
    /// let canon = Canonicalizer::new(&source, WwwPolicy::NonWww);
    ///
    /// let url = canon.canonicalize("http://WWW.EXAMPLE.COM/a#top", None).unwrap();
    /// assert_eq!(url.as_str(), "https://example.com/a");
    /// ```
    pub fn canonicalize(
        &self,
        raw: &str,
        base: Option<&CanonicalUrl>,
    ) -> Result<CanonicalUrl, UrlError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UrlError::Malformed("empty reference".to_string()));
        }

        // Step 1: Strip archive prefix
        let live = strip_archive_prefix(raw, &self.archive_hosts);
        let reference = live.as_deref().unwrap_or(raw);

        // Step 2: Resolve against the referencing document
        let url = match base {
            Some(base) => base.as_url().join(reference),
            None if reference.starts_with("//") => Url::parse(&format!("https:{}", reference)),
            None => Url::parse(reference),
        }
        .map_err(|e| UrlError::Parse(format!("{}: {}", reference, e)))?;

        self.canonicalize_url(url)
    }

    /// Canonicalizes an already absolute URL (steps 3 to 7)
    pub fn canonicalize_url(&self, mut url: Url) -> Result<CanonicalUrl, UrlError> {
        // Step 3: Remove fragment
        url.set_fragment(None);

        // Step 4: Single scheme
        match url.scheme() {
            "https" => {}
            "http" => {
                let port = url.port();
                url.set_scheme("https")
                    .map_err(|_| UrlError::Malformed(format!("Cannot upgrade {}", url)))?;
                if port == Some(443) {
                    let _ = url.set_port(None);
                }
            }
            other => return Err(UrlError::InvalidScheme(other.to_string())),
        }

        // Step 5: www policy for the site's own host
        let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_string();
        if let Some(normalized) = self.apply_www_policy(&host) {
            url.set_host(Some(&normalized))
                .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
        }

        // Step 6: Normalize path
        let path = collapse_slashes(url.path());
        if path != url.path() {
            url.set_path(&path);
        }

        // Step 7: Query kept as-is
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(CanonicalUrl(url))
    }

    /// Returns true if the URL belongs to the site (bare or `www.` host)
    pub fn is_internal(&self, url: &CanonicalUrl) -> bool {
        self.is_site_host(url.host())
    }

    fn is_site_host(&self, host: &str) -> bool {
        host == self.site_host
            || host
                .strip_prefix("www.")
                .is_some_and(|bare| bare == self.site_host)
    }

    fn apply_www_policy(&self, host: &str) -> Option<String> {
        if !self.is_site_host(host) {
            return None;
        }

        let target = match self.www {
            WwwPolicy::NonWww => self.site_host.clone(),
            WwwPolicy::Www => format!("www.{}", self.site_host),
            WwwPolicy::Keep => return None,
        };
        (target != host).then_some(target)
    }
}

/// Collapses runs of `/` into one, keeping a trailing slash
fn collapse_slashes(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut result = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        result.push(c);
    }
    result
}
