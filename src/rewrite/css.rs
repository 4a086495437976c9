//! Style sheet rewriting
//!
//! Every `@import`, `@font-face` source and `url()` reference is passed to a
//! resolver. Pruned targets are removed from the sheet:
//! - `@import` statements are dropped
//! - `@font-face` source entries are dropped, and the rule with them once no
//!   source is left
//! - any other `url()` becomes `none`

use crate::extract::css::{first_group, import_regex, url_kind, url_regex};
use crate::extract::ReferenceKind;
use crate::rewrite::Target;
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn rule_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?is)(?P<face>@font-face\s*\{[^}]*\})|(?P<import>@import\s+(?:url\(\s*(?:"[^"]*"|'[^']*'|[^)'"\s]*)\s*\)|"[^"]*"|'[^']*')[^;]*;?)|(?P<url>url\(\s*(?:"[^"]*"|'[^']*'|[^)'"]*?)\s*\))"#,
        )
        .unwrap()
    })
}

fn src_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bsrc\s*:").unwrap())
}

/// Rewrites all references in a style sheet or `style` attribute
///
/// # Example
///
/// ```
/// use wayback_archive::rewrite::{rewrite_css, Target};
///
/// let css = rewrite_css("a { background: url(/bg.png) }", &mut |raw: &str, _| {
///     Target::Rewrite(format!("..{}", raw))
/// });
/// assert_eq!(css, "a { background: url(../bg.png) }");
/// ```
pub fn rewrite_css<F>(css: &str, resolve: &mut F) -> String
where
    F: FnMut(&str, ReferenceKind) -> Target,
{
    rule_regex()
        .replace_all(css, |caps: &Captures| {
            if let Some(face) = caps.name("face") {
                rewrite_font_face(face.as_str(), resolve)
            } else if let Some(import) = caps.name("import") {
                rewrite_import(import.as_str(), resolve)
            } else {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                rewrite_url(whole, resolve, None).unwrap_or_else(|| "none".to_string())
            }
        })
        .into_owned()
}

/// Rewrites one `url(...)` token; `None` when its target is pruned
fn rewrite_url<F>(token: &str, resolve: &mut F, kind: Option<ReferenceKind>) -> Option<String>
where
    F: FnMut(&str, ReferenceKind) -> Target,
{
    let Some(caps) = url_regex().captures(token) else {
        return Some(token.to_string());
    };
    let Some(target) = first_group(&caps) else {
        return Some(token.to_string());
    };

    let raw = target.as_str().trim();
    match resolve(raw, kind.unwrap_or_else(|| url_kind(raw))) {
        Target::Keep => Some(token.to_string()),
        Target::Prune => None,
        Target::Rewrite(href) => Some(splice(token, target.start(), target.end(), &href)),
    }
}

fn rewrite_import<F>(statement: &str, resolve: &mut F) -> String
where
    F: FnMut(&str, ReferenceKind) -> Target,
{
    let Some(caps) = import_regex().captures(statement) else {
        return statement.to_string();
    };
    let Some(target) = first_group(&caps) else {
        return statement.to_string();
    };

    match resolve(target.as_str().trim(), ReferenceKind::Stylesheet) {
        Target::Keep => statement.to_string(),
        Target::Prune => String::new(),
        Target::Rewrite(href) => splice(statement, target.start(), target.end(), &href),
    }
}

fn rewrite_font_face<F>(block: &str, resolve: &mut F) -> String
where
    F: FnMut(&str, ReferenceKind) -> Target,
{
    let mut out = String::with_capacity(block.len());
    let mut cursor = 0;
    let mut had_sources = false;
    let mut kept_sources = false;

    for m in src_regex().find_iter(block) {
        if m.start() < cursor {
            continue;
        }
        had_sources = true;

        let end = value_end(block, m.end());
        let value = &block[m.end()..end];
        let terminator = usize::from(block[end..].starts_with(';'));

        let items: Vec<String> = split_top_level(value)
            .into_iter()
            .filter_map(|item| {
                if item.to_ascii_lowercase().contains("url(") {
                    rewrite_src_item(item, resolve)
                } else {
                    Some(item.to_string())
                }
            })
            .collect();

        out.push_str(&block[cursor..m.start()]);
        if !items.is_empty() {
            kept_sources = true;
            out.push_str(&format!("src: {};", items.join(", ")));
        }
        cursor = end + terminator;
    }

    if had_sources && !kept_sources {
        return String::new();
    }
    out.push_str(&block[cursor..]);
    out
}

/// End of a declaration value: the first `;` or `}` outside parentheses and quotes
fn value_end(text: &str, start: usize) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in text[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') | (None, '}') if depth == 0 => return start + i,
            _ => {}
        }
    }
    text.len()
}

fn rewrite_src_item<F>(item: &str, resolve: &mut F) -> Option<String>
where
    F: FnMut(&str, ReferenceKind) -> Target,
{
    let Some(token) = url_regex().find(item) else {
        return Some(item.to_string());
    };
    let rewritten = rewrite_url(token.as_str(), resolve, Some(ReferenceKind::Font))?;
    Some(splice(item, token.start(), token.end(), &rewritten))
}

fn splice(text: &str, start: usize, end: usize, replacement: &str) -> String {
    format!("{}{}{}", &text[..start], replacement, &text[end..])
}

/// Splits a declaration value on commas outside parentheses and quotes
fn split_top_level(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}
