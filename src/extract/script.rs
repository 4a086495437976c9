//! Heuristic URL scan for scripts
//!
//! Only literal strings are considered; nothing is evaluated. The patterns
//! are deliberately narrow so code fragments are not mistaken for URLs.

use crate::extract::{LinkReference, ReferenceKind, ReferenceSet};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Tokens that mark a captured string as code rather than a URL
const CODE_MARKERS: &[&str] = &["function", "return", "var ", "let ", "const ", "=>", "{", "}"];

fn patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            // fetch/ajax style calls
            r#"(?:fetch|XMLHttpRequest|axios\.get|axios\.post|\.load|\.ajax)\s*\(\s*["']([^"']+)["']"#,
            // element source assignments
            r#"\.src\s*=\s*["']([^"']+)["']"#,
            r#"\.href\s*=\s*["']([^"']+)["']"#,
            // url properties
            r#"url\s*[:=]\s*["'](https?://[^"']+)["']"#,
            // absolute asset literals
            r#"["'](https?://[^"']+\.(?:jpg|jpeg|png|gif|svg|webp|css|js|woff|woff2|ttf|eot|otf)[^"']*)["']"#,
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Extracts URL literals from script text
///
/// Results must be absolute (`http://`, `https://`, `//`) or root-relative;
/// bare relative strings are too ambiguous to follow.
pub fn extract_script(js: &str) -> Vec<LinkReference> {
    let mut refs = ReferenceSet::default();
    for span in literal_spans(js) {
        refs.push(&js[span], ReferenceKind::ScriptLiteral);
    }
    refs.into_vec()
}

/// Byte ranges of the URL literals in `js`, sorted and non-overlapping
///
/// Ranges cover the trimmed literal without its quotes. Where two patterns
/// match the same literal the first range wins.
pub(crate) fn literal_spans(js: &str) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = Vec::new();

    for pattern in patterns() {
        for captures in pattern.captures_iter(js) {
            let Some(m) = captures.get(1) else {
                continue;
            };
            let text = m.as_str();
            let candidate = text.trim();
            if !is_url_literal(candidate) {
                continue;
            }
            let start = m.start() + (text.len() - text.trim_start().len());
            spans.push(start..start + candidate.len());
        }
    }

    spans.sort_by_key(|s| s.start);
    let mut out: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        if out.last().map_or(true, |last| span.start >= last.end) {
            out.push(span);
        }
    }
    out
}

fn is_url_literal(candidate: &str) -> bool {
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    if CODE_MARKERS.iter().any(|m| candidate.contains(m)) {
        return false;
    }
    candidate.starts_with("http://")
        || candidate.starts_with("https://")
        || candidate.starts_with('/')
}
