//! HTML reference extraction
//!
//! This module walks a parsed page once and collects:
//! - Hyperlinks (`<a>`, `<area>`, canonical and alternate `<link>`)
//! - Subresources (images, `srcset`, scripts, style sheets, frames, media)
//! - References inside `style` attributes and `<style>` blocks
//! - URL literals inside inline scripts
//! - URL-like `data-*` attribute values
//!
//! Archive chrome (the toolbar subtree, playback scripts and banner styles)
//! and contact links are skipped.

use crate::extract::{css, script, LinkReference, ReferenceKind, ReferenceSet};
use crate::filters;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// `<link rel>` values that never name a resource worth fetching
const IGNORED_LINK_RELS: &[&str] = &[
    "preconnect",
    "dns-prefetch",
    "pingback",
    "edituri",
    "wlwmanifest",
    "shortlink",
    "profile",
];

/// `<link rel>` values that navigate rather than load
const HYPERLINK_RELS: &[&str] = &["canonical", "alternate", "next", "prev", "home"];

fn data_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:(?:https?:)?//[^\s]+|/[^/\s][^\s]*|[^\s<>{}]+\.(?:png|jpe?g|gif|svg|webp|avif|ico|css|js|woff2?|ttf|otf|eot|mp4|webm|mp3|ogg|pdf)(?:[?#][^\s]*)?)$",
        )
        .unwrap()
    })
}

/// Extracts every reference from an HTML document, in document order
///
/// # Example
///
/// ```
/// use wayback_archive::extract::html::extract_html;
/// use wayback_archive::extract::ReferenceKind;
///
/// let refs = extract_html(r#"<a href="/about">About</a><img src="logo.png">"#);
/// assert_eq!(refs[0].raw, "/about");
/// assert_eq!(refs[1].kind, ReferenceKind::Image);
/// ```
pub fn extract_html(html: &str) -> Vec<LinkReference> {
    let document = Html::parse_document(html);
    let mut refs = ReferenceSet::default();

    let Ok(all) = Selector::parse("*") else {
        return Vec::new();
    };

    for element in document.select(&all) {
        if in_archive_chrome(element) {
            continue;
        }
        extract_element(element, &mut refs);
    }

    refs.into_vec()
}

/// Parses a `srcset` value into its candidate URLs and descriptors
///
/// Descriptors keep their original text (`2x`, `480w`) or are empty.
pub fn parse_srcset(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let descriptor = parts.collect::<Vec<_>>().join(" ");
            Some((url.to_string(), descriptor))
        })
        .collect()
}

/// Returns true if a `data-*` value looks like a URL
pub fn looks_like_url(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.len() < 2048 && data_url_regex().is_match(value)
}

fn extract_element(element: ElementRef, refs: &mut ReferenceSet) {
    let el = element.value();
    let attr = |name: &str| el.attr(name);

    match el.name() {
        "a" | "area" => {
            if let Some(href) = attr("href") {
                push_link(refs, href, ReferenceKind::Hyperlink);
            }
        }
        "link" => {
            if let Some(href) = attr("href") {
                if let Some(kind) = link_kind(attr("rel").unwrap_or_default(), attr("as")) {
                    if !filters::is_chrome_stylesheet(href) {
                        push_link(refs, href, kind);
                    }
                }
            }
        }
        "img" => {
            if let Some(src) = attr("src") {
                refs.push(src, ReferenceKind::Image);
            }
            if let Some(srcset) = attr("srcset") {
                push_srcset(refs, srcset);
            }
        }
        "source" => {
            if let Some(src) = attr("src") {
                refs.push(src, ReferenceKind::Media);
            }
            if let Some(srcset) = attr("srcset") {
                push_srcset(refs, srcset);
            }
        }
        "script" => match attr("src") {
            Some(src) => {
                if !filters::is_chrome_script(src) {
                    refs.push(src, ReferenceKind::Script);
                }
            }
            None => {
                let text = element.text().collect::<String>();
                if !filters::is_chrome_inline_script(&text) && is_javascript(attr("type")) {
                    refs.extend(script::extract_script(&text));
                }
            }
        },
        "style" => {
            let text = element.text().collect::<String>();
            refs.extend(css::extract_css(&text));
        }
        "iframe" | "frame" => {
            if let Some(src) = attr("src") {
                push_link(refs, src, ReferenceKind::Frame);
            }
        }
        "video" => {
            if let Some(src) = attr("src") {
                refs.push(src, ReferenceKind::Media);
            }
            if let Some(poster) = attr("poster") {
                refs.push(poster, ReferenceKind::Image);
            }
        }
        "audio" | "embed" | "track" => {
            if let Some(src) = attr("src") {
                refs.push(src, ReferenceKind::Media);
            }
        }
        "object" => {
            if let Some(data) = attr("data") {
                refs.push(data, ReferenceKind::Media);
            }
        }
        "input" => {
            if attr("type").is_some_and(|t| t.eq_ignore_ascii_case("image")) {
                if let Some(src) = attr("src") {
                    refs.push(src, ReferenceKind::Image);
                }
            }
        }
        _ => {}
    }

    for (name, value) in el.attrs() {
        if name == "style" {
            refs.extend(css::extract_css(value));
        } else if let Some(data_name) = name.strip_prefix("data-") {
            if data_name.ends_with("srcset") {
                push_srcset(refs, value);
            } else if looks_like_url(value) && filters::contact_scheme(value).is_none() {
                refs.push(value, ReferenceKind::DataAttribute);
            }
        }
    }
}

/// Kind of a `<link>` target, `None` when it should not be followed
pub(crate) fn link_kind(rel: &str, as_attr: Option<&str>) -> Option<ReferenceKind> {
    let rels: Vec<String> = rel
        .split_whitespace()
        .map(|r| r.to_ascii_lowercase())
        .collect();
    let has = |name: &str| rels.iter().any(|r| r == name);

    if IGNORED_LINK_RELS.iter().any(|r| has(r)) {
        return None;
    }
    if has("stylesheet") {
        return Some(ReferenceKind::Stylesheet);
    }
    if rels.iter().any(|r| r.contains("icon")) {
        return Some(ReferenceKind::Image);
    }
    if has("preload") || has("prefetch") || has("modulepreload") {
        return Some(match as_attr.map(str::to_ascii_lowercase).as_deref() {
            Some("style") => ReferenceKind::Stylesheet,
            Some("font") => ReferenceKind::Font,
            Some("script") => ReferenceKind::Script,
            Some("image") => ReferenceKind::Image,
            _ => ReferenceKind::Asset,
        });
    }
    if HYPERLINK_RELS.iter().any(|r| has(r)) {
        return Some(ReferenceKind::Hyperlink);
    }

    Some(ReferenceKind::Asset)
}

fn push_link(refs: &mut ReferenceSet, raw: &str, kind: ReferenceKind) {
    if filters::contact_scheme(raw).is_none() {
        refs.push(raw, kind);
    }
}

fn push_srcset(refs: &mut ReferenceSet, value: &str) {
    for (url, _) in parse_srcset(value) {
        refs.push(&url, ReferenceKind::Image);
    }
}

/// Inline scripts with a non-JavaScript `type` (templates, JSON) are skipped
pub(crate) fn is_javascript(script_type: Option<&str>) -> bool {
    match script_type.map(|t| t.trim().to_ascii_lowercase()) {
        None => true,
        Some(t) => {
            t.is_empty() || t == "module" || t.contains("javascript") || t.contains("ecmascript")
        }
    }
}

/// Returns true if the element is, or sits inside, the archive toolbar
fn in_archive_chrome(element: ElementRef) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|e| e.value().id().is_some_and(filters::is_chrome_id))
}
