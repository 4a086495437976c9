//! Asset integrity checks
//!
//! The archive answers many requests for missing assets with an HTML page
//! and a 200 status. This module decides whether fetched bytes really are
//! the kind of resource that was asked for.

use crate::state::{leading_text, ContentKind};
use crate::url::CanonicalUrl;
use std::fmt;
use std::path::Path;

/// Why a resource was judged corrupted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// No bytes at all
    Empty,
    /// The payload is an HTML document
    Markup,
    /// The declared `Content-Type` contradicts the expected kind
    DeclaredMismatch(String),
    /// No known file signature for the expected kind
    MissingSignature,
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty body"),
            Self::Markup => write!(f, "body is an HTML document"),
            Self::DeclaredMismatch(declared) => write!(f, "declared as {}", declared),
            Self::MissingSignature => write!(f, "no valid file signature"),
        }
    }
}

/// Outcome of an integrity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Corrupted(Corruption),
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Checks that `bytes` are a plausible resource of `kind`
///
/// # Rules
///
/// - Fonts and raster images must carry a known signature; a valid signature
///   is accepted regardless of the declared type
/// - Formats without a signature (SVG, style sheets, scripts, other files)
///   are rejected when they are HTML documents or declared as `text/html`
/// - Pages are always accepted
///
/// # Example
///
/// ```
/// use wayback_archive::integrity::{check, Verdict};
/// use wayback_archive::state::ContentKind;
///
/// assert!(check(ContentKind::Font, "woff2", None, b"wOF2\x00\x01").is_ok());
/// assert!(!check(ContentKind::Font, "woff2", Some("text/html"), b"<!DOCTYPE html>").is_ok());
/// ```
pub fn check(kind: ContentKind, extension: &str, declared: Option<&str>, bytes: &[u8]) -> Verdict {
    if kind == ContentKind::Html {
        return Verdict::Ok;
    }
    if bytes.is_empty() {
        return Verdict::Corrupted(Corruption::Empty);
    }

    let signature = match kind {
        ContentKind::Font => Some(has_font_signature(bytes)),
        ContentKind::Image if !extension.eq_ignore_ascii_case("svg") => {
            Some(has_image_signature(bytes))
        }
        _ => None,
    };

    match signature {
        Some(true) => Verdict::Ok,
        Some(false) if is_markup(bytes) => Verdict::Corrupted(Corruption::Markup),
        Some(false) => Verdict::Corrupted(Corruption::MissingSignature),
        None if is_markup(bytes) => Verdict::Corrupted(Corruption::Markup),
        None => match declared.filter(|d| declares_html(d)) {
            Some(d) => Verdict::Corrupted(Corruption::DeclaredMismatch(d.to_string())),
            None => Verdict::Ok,
        },
    }
}

/// Checks a fetched resource by its canonical URL
pub fn check_resource(
    url: &CanonicalUrl,
    kind: ContentKind,
    declared: Option<&str>,
    bytes: &[u8],
) -> Verdict {
    let extension = Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    check(kind, extension, declared, bytes)
}

/// Returns true if the bytes start like an HTML document
pub fn is_markup(bytes: &[u8]) -> bool {
    let text = leading_text(bytes);
    let starts = ["<!doctype html", "<html", "<head", "<body"];
    starts.iter().any(|s| text.starts_with(s))
        || (text.starts_with("<!--") && text.contains("<html"))
}

fn declares_html(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("text/html") || mime.eq_ignore_ascii_case("application/xhtml+xml")
}

/// WOFF, WOFF2, TrueType, OpenType, collections and EOT
pub fn has_font_signature(bytes: &[u8]) -> bool {
    const MAGIC: &[&[u8]] = &[
        b"wOFF",
        b"wOF2",
        b"\x00\x01\x00\x00",
        b"true",
        b"typ1",
        b"OTTO",
        b"ttcf",
    ];

    MAGIC.iter().any(|m| bytes.starts_with(m))
        // EOT magic number sits at offset 34
        || (bytes.len() >= 36 && &bytes[34..36] == b"LP")
}

/// PNG, JPEG, GIF, WebP, BMP, ICO/CUR, AVIF/HEIF and TIFF
pub fn has_image_signature(bytes: &[u8]) -> bool {
    const MAGIC: &[&[u8]] = &[
        b"\x89PNG\r\n\x1a\n",
        b"\xFF\xD8\xFF",
        b"GIF87a",
        b"GIF89a",
        b"BM",
        b"\x00\x00\x01\x00",
        b"\x00\x00\x02\x00",
        b"II*\x00",
        b"MM\x00*",
    ];

    MAGIC.iter().any(|m| bytes.starts_with(m))
        || (bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP")
        || (bytes.len() >= 12 && &bytes[4..8] == b"ftyp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_declared_as_font_is_corrupted() {
        let verdict = check(
            ContentKind::Font,
            "woff2",
            Some("text/html; charset=utf-8"),
            b"<!DOCTYPE html><html><body>Not found</body></html>",
        );
        assert_eq!(verdict, Verdict::Corrupted(Corruption::Markup));
    }

    #[test]
    fn test_valid_font_signatures() {
        assert!(check(ContentKind::Font, "woff2", None, b"wOF2\x00\x01\x00\x00").is_ok());
        assert!(check(ContentKind::Font, "woff", None, b"wOFF\x00\x01\x00\x00").is_ok());
        assert!(check(ContentKind::Font, "ttf", None, b"\x00\x01\x00\x00\x00\x10").is_ok());
        assert!(check(ContentKind::Font, "otf", None, b"OTTO\x00\x0a").is_ok());

        let mut eot = vec![0u8; 64];
        eot[34] = b'L';
        eot[35] = b'P';
        assert!(check(ContentKind::Font, "eot", None, &eot).is_ok());
    }

    #[test]
    fn test_signature_beats_declared_type() {
        let verdict = check(ContentKind::Font, "woff2", Some("text/html"), b"wOF2\x00\x01");
        assert!(verdict.is_ok());
    }

    #[test]
    fn test_font_without_signature() {
        assert_eq!(
            check(ContentKind::Font, "woff", None, b"garbage bytes"),
            Verdict::Corrupted(Corruption::MissingSignature)
        );
    }

    #[test]
    fn test_image_signatures() {
        assert!(check(ContentKind::Image, "png", None, b"\x89PNG\r\n\x1a\n\x00").is_ok());
        assert!(check(ContentKind::Image, "jpg", None, b"\xFF\xD8\xFF\xE0").is_ok());
        assert!(check(ContentKind::Image, "gif", None, b"GIF89a\x01\x00").is_ok());
        assert!(check(ContentKind::Image, "webp", None, b"RIFF\x10\x00\x00\x00WEBPVP8 ").is_ok());
        assert!(check(ContentKind::Image, "ico", None, b"\x00\x00\x01\x00\x01\x00").is_ok());
        assert!(check(ContentKind::Image, "avif", None, b"\x00\x00\x00\x1cftypavif").is_ok());
        assert!(!check(ContentKind::Image, "png", None, b"<html><body>404</body></html>").is_ok());
    }

    #[test]
    fn test_svg_markup_only() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        assert!(check(ContentKind::Image, "svg", Some("image/svg+xml"), svg).is_ok());
        assert!(!check(ContentKind::Image, "svg", None, b"<!doctype html><html></html>").is_ok());
        assert_eq!(
            check(ContentKind::Image, "svg", Some("text/html"), b"<svg></svg>"),
            Verdict::Corrupted(Corruption::DeclaredMismatch("text/html".to_string()))
        );
    }

    #[test]
    fn test_text_assets() {
        assert!(check(ContentKind::Css, "css", Some("text/css"), b"body { color: red }").is_ok());
        assert!(!check(ContentKind::Css, "css", None, b"\n  <html><head></head></html>").is_ok());
        assert!(!check(ContentKind::Script, "js", None, b"").is_ok());
    }

    #[test]
    fn test_pages_always_pass() {
        assert!(check(ContentKind::Html, "html", Some("text/html"), b"<html></html>").is_ok());
        assert!(check(ContentKind::Html, "", None, b"").is_ok());
    }

    #[test]
    fn test_markup_heuristic() {
        assert!(is_markup(b"\xEF\xBB\xBF  <!DOCTYPE HTML PUBLIC>"));
        assert!(is_markup(b"<!-- archived --><html>"));
        assert!(!is_markup(b"<svg></svg>"));
        assert!(!is_markup(b"wOF2"));
    }
}
