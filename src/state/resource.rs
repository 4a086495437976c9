//! Resource kinds, statuses and the resolution table built during a crawl
use crate::url::{is_font_service_host, CanonicalUrl, Timestamp};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Content kind of a resource, deciding which extractor and checks apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    Css,
    Script,
    Image,
    Font,
    Other,
}

impl ContentKind {
    /// Classifies by file extension of the URL path
    pub fn from_extension(path: &str) -> Option<Self> {
        let name = path.rsplit('/').next().unwrap_or_default();
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();

        let kind = match ext.as_str() {
            "html" | "htm" | "xhtml" | "shtml" | "php" | "asp" | "aspx" | "jsp" => Self::Html,
            "css" => Self::Css,
            "js" | "mjs" => Self::Script,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "bmp" | "avif" | "tif"
            | "tiff" | "cur" => Self::Image,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Self::Font,
            _ => Self::Other,
        };
        Some(kind)
    }

    /// Classifies by a declared `Content-Type` value
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime.is_empty() {
            return None;
        }

        let kind = match mime.as_str() {
            "text/html" | "application/xhtml+xml" => Self::Html,
            "text/css" => Self::Css,
            "application/vnd.ms-fontobject" => Self::Font,
            m if m.contains("javascript") || m.contains("ecmascript") => Self::Script,
            m if m.starts_with("image/") => Self::Image,
            m if m.starts_with("font/") || m.contains("font-") || m.contains("x-font") => {
                Self::Font
            }
            _ => Self::Other,
        };
        Some(kind)
    }

    /// Classifies by leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG")
            || bytes.starts_with(b"\xFF\xD8\xFF")
            || bytes.starts_with(b"GIF8")
            || (bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP")
        {
            return Some(Self::Image);
        }
        if bytes.starts_with(b"wOFF") || bytes.starts_with(b"wOF2") {
            return Some(Self::Font);
        }

        let text = leading_text(bytes);
        if text.starts_with("<!doctype html") || text.starts_with("<html") {
            Some(Self::Html)
        } else if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
            Some(Self::Image)
        } else if text.starts_with("@charset")
            || text.starts_with("@import")
            || text.starts_with("@font-face")
        {
            Some(Self::Css)
        } else {
            None
        }
    }

    /// Best guess before any bytes are known
    pub fn guess(url: &CanonicalUrl) -> Self {
        if let Some(kind) = Self::from_extension(url.path()) {
            return kind;
        }
        if let Some(kind) = Self::from_font_service(url.host()) {
            return kind;
        }
        if url.query().is_none() {
            Self::Html
        } else {
            Self::Other
        }
    }

    /// Classifies a fetched resource
    ///
    /// Order: extension, font-service host, declared type, sniffing. An
    /// extension-less path without query is then taken to be a page.
    pub fn classify(url: &CanonicalUrl, declared: Option<&str>, bytes: &[u8]) -> Self {
        Self::from_extension(url.path())
            .or_else(|| Self::from_font_service(url.host()))
            .or_else(|| declared.and_then(Self::from_mime))
            .or_else(|| Self::sniff(bytes))
            .unwrap_or(if url.query().is_none() {
                Self::Html
            } else {
                Self::Other
            })
    }

    fn from_font_service(host: &str) -> Option<Self> {
        if !is_font_service_host(host) {
            return None;
        }
        if host.eq_ignore_ascii_case("fonts.gstatic.com") {
            Some(Self::Font)
        } else {
            Some(Self::Css)
        }
    }

    /// Raw-content flag appended to the archive timestamp
    pub fn archive_flag(&self) -> &'static str {
        match self {
            Self::Image => "im_",
            Self::Css => "cs_",
            Self::Script => "js_",
            _ => "",
        }
    }

    /// Binary kinds screened by the integrity checker
    pub fn is_binary_asset(&self) -> bool {
        matches!(self, Self::Image | Self::Font)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
            Self::Script => "script",
            Self::Image => "image",
            Self::Font => "font",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercased text after a BOM and leading whitespace, for markup sniffing
pub(crate) fn leading_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = (start + 256).min(bytes.len());
    String::from_utf8_lossy(&bytes[start..end]).to_ascii_lowercase()
}

/// Where a resource's bytes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionSource {
    /// The archive at the snapshot's own timestamp
    Exact,
    /// The archive at a nearby timestamp
    Nearby,
    /// The CDN mirror
    Cdn,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Nearby => "nearby",
            Self::Cdn => "cdn",
        }
    }
}

/// Final status of a fetched resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceStatus {
    /// Bytes retrieved and (for binary assets) validated
    Success,

    /// Bytes retrieved but do not match the expected kind
    Corrupted,

    /// No source could provide the resource
    Missing,
}

impl ResourceStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if references to this resource are pruned
    pub fn is_pruned(&self) -> bool {
        matches!(self, Self::Corrupted | Self::Missing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Corrupted => "corrupted",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resolved resource; created once per canonical URL and never mutated
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: CanonicalUrl,
    pub bytes: Vec<u8>,
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
    pub kind: ContentKind,
    /// Output-relative path
    pub local_path: PathBuf,
    pub status: ResourceStatus,
    /// `None` for missing resources
    pub source: Option<ResolutionSource>,
    /// Effective archive timestamp (archive sources only)
    pub timestamp: Option<Timestamp>,
}

impl FetchedResource {
    /// A resource that no source could provide
    pub fn missing(url: CanonicalUrl, kind: ContentKind, local_path: PathBuf) -> Self {
        Self {
            url,
            bytes: Vec::new(),
            content_type: None,
            kind,
            local_path,
            status: ResourceStatus::Missing,
            source: None,
            timestamp: None,
        }
    }
}

/// Canonical URL → resolved resource, plus redirect aliases
///
/// Owned by the crawl coordinator while fetching, then handed read-only to
/// the rewriter.
#[derive(Debug, Default)]
pub struct ResolutionTable {
    resources: HashMap<CanonicalUrl, FetchedResource>,
    order: Vec<CanonicalUrl>,
    aliases: HashMap<CanonicalUrl, CanonicalUrl>,
}

/// Alias chains longer than this are treated as loops
const MAX_ALIAS_HOPS: usize = 8;

impl ResolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a resource; returns false (and keeps the first) on duplicates
    pub fn insert(&mut self, resource: FetchedResource) -> bool {
        if self.resources.contains_key(&resource.url) {
            tracing::warn!("Resource {} already resolved; keeping first result", resource.url);
            return false;
        }
        self.order.push(resource.url.clone());
        self.resources.insert(resource.url.clone(), resource);
        true
    }

    /// Records that `from` redirected to `to`
    pub fn add_alias(&mut self, from: CanonicalUrl, to: CanonicalUrl) {
        if from != to {
            self.aliases.insert(from, to);
        }
    }

    pub fn get(&self, url: &CanonicalUrl) -> Option<&FetchedResource> {
        self.resources.get(url)
    }

    /// Redirect destination recorded for `url`, if any
    pub fn alias_target(&self, url: &CanonicalUrl) -> Option<&CanonicalUrl> {
        self.aliases.get(url)
    }

    /// Follows redirect aliases to the resource that holds the bytes
    pub fn resolve(&self, url: &CanonicalUrl) -> Option<&FetchedResource> {
        let mut current = url;
        for _ in 0..MAX_ALIAS_HOPS {
            if let Some(resource) = self.resources.get(current) {
                return Some(resource);
            }
            current = self.aliases.get(current)?;
        }
        None
    }

    /// Resources in the order they were resolved
    pub fn iter(&self) -> impl Iterator<Item = &FetchedResource> {
        self.order.iter().filter_map(|url| self.resources.get(url))
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&CanonicalUrl, &CanonicalUrl)> {
        self.aliases.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn count_status(&self, status: ResourceStatus) -> usize {
        self.resources.values().filter(|r| r.status == status).count()
    }

    pub fn count_source(&self, source: ResolutionSource) -> usize {
        self.resources
            .values()
            .filter(|r| r.source == Some(source))
            .count()
    }
}
