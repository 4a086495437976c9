//! Style sheet reference extraction (`@import` and `url()`)

use crate::extract::{LinkReference, ReferenceKind, ReferenceSet};
use crate::state::ContentKind;
use regex::Regex;
use std::sync::OnceLock;

pub(crate) fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap())
}

/// `@import "x.css";`, `@import 'x.css';` and `@import url(x.css);`
pub(crate) fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)@import\s+(?:url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"\s]*))\s*\)|"([^"]*)"|'([^']*)')[^;]*;?"#,
        )
        .unwrap()
    })
}

/// `url(x)`, `url("x")` and `url('x')`
pub(crate) fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"]*?))\s*\)"#).unwrap()
    })
}

/// First non-empty capture group
pub(crate) fn first_group<'t>(captures: &regex::Captures<'t>) -> Option<regex::Match<'t>> {
    (1..captures.len()).find_map(|i| captures.get(i))
}

/// Reference kind of a `url()` target, by extension
pub(crate) fn url_kind(raw: &str) -> ReferenceKind {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    match ContentKind::from_extension(path) {
        Some(ContentKind::Font) => ReferenceKind::Font,
        Some(ContentKind::Css) => ReferenceKind::Stylesheet,
        _ => ReferenceKind::Image,
    }
}

/// Extracts references from a style sheet or inline `style` attribute
///
/// Comments are ignored. `@import` targets are style sheets; `url()`
/// targets are fonts or images depending on their extension. Nested at-rules
/// (`@media`, `@supports`, `@font-face`) need no special casing.
///
/// # Example
///
/// ```
/// use wayback_archive::extract::css::extract_css;
///
/// let refs = extract_css("@import 'base.css'; body { background: url(bg.png) }");
/// assert_eq!(refs.len(), 2);
/// ```
pub fn extract_css(css: &str) -> Vec<LinkReference> {
    let css = comment_regex().replace_all(css, " ");
    let mut refs = ReferenceSet::default();

    for captures in import_regex().captures_iter(&css) {
        if let Some(m) = first_group(&captures) {
            refs.push(m.as_str(), ReferenceKind::Stylesheet);
        }
    }

    let without_imports = import_regex().replace_all(&css, " ");
    for captures in url_regex().captures_iter(&without_imports) {
        if let Some(m) = first_group(&captures) {
            let raw = m.as_str().trim();
            refs.push(raw, url_kind(raw));
        }
    }

    refs.into_vec()
}
