//! Local file layout for fetched resources

use crate::state::ContentKind;
use crate::url::CanonicalUrl;
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Directory holding resources from hosts other than the site's own
pub const EXTERNAL_DIR: &str = "_external";

/// Computes the output-relative path where a resource is written
///
/// # Layout Rules
///
/// 1. The percent-decoded URL path is mirrored
/// 2. Directory URLs map to `index.html`
/// 3. Extension-less pages gain `.html`, extension-less style sheets `.css`
/// 4. A non-empty query adds `-<8 hex of SHA-256(query)>` before the extension
/// 5. Other hosts live under `_external/<host>/`
///
/// # Examples
///
/// ```
/// use wayback_archive::state::ContentKind;
/// use wayback_archive::url::{local_path, ArchiveSource, Canonicalizer};
/// use wayback_archive::config::WwwPolicy;
///
/// let source = ArchiveSource::parse("https://web.archive.org/web/2020/https://example.com/").unwrap();
/// let canon = Canonicalizer::new(&source, WwwPolicy::NonWww);
/// let url = canon.canonicalize("https://example.com/about", None).unwrap();
///
/// assert_eq!(local_path(&url, ContentKind::Html, true).to_str(), Some("about.html"));
/// ```
pub fn local_path(url: &CanonicalUrl, kind: ContentKind, internal: bool) -> PathBuf {
    let decoded = percent_decode_str(url.path()).decode_utf8_lossy();

    let mut segments: Vec<String> = decoded
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(sanitize_segment)
        .collect();

    if decoded.ends_with('/') || segments.is_empty() {
        segments.push("index.html".to_string());
    } else if let Some(last) = segments.last_mut() {
        if Path::new(last.as_str()).extension().is_none() {
            match kind {
                ContentKind::Html => last.push_str(".html"),
                ContentKind::Css => last.push_str(".css"),
                _ => {}
            }
        }
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        if let Some(last) = segments.last_mut() {
            *last = with_query_suffix(last, query);
        }
    }

    let mut path = PathBuf::new();
    if !internal {
        path.push(EXTERNAL_DIR);
        path.push(sanitize_segment(url.host()));
    }
    for segment in segments {
        path.push(segment);
    }
    path
}

/// Inserts the query hash before the file extension
fn with_query_suffix(name: &str, query: &str) -> String {
    let digest = Sha256::digest(query.as_bytes());
    let suffix = &hex::encode(digest)[..8];

    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &name[..dot], suffix, &name[dot..]),
        _ => format!("{}-{}", name, suffix),
    }
}

/// Replaces characters that are not portable in file names
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c => c,
        })
        .collect()
}
