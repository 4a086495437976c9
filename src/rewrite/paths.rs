//! Relative references between files of the offline tree

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Component, Path};

/// Characters that cannot appear literally in a path segment of an href
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'\\');

fn segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Href that leads from the document at `from` to the file at `to`
///
/// Both paths are relative to the output root. The result is
/// percent-encoded and never empty.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use wayback_archive::rewrite::relative_href;
///
/// assert_eq!(relative_href(Path::new("blog/post.html"), Path::new("img/a.png")), "../img/a.png");
/// assert_eq!(relative_href(Path::new("index.html"), Path::new("about.html")), "about.html");
/// ```
pub fn relative_href(from: &Path, to: &Path) -> String {
    let from = segments(from);
    let to = segments(to);

    // Directory of the referencing document
    let from_dir = &from[..from.len().saturating_sub(1)];

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    // Never consume the target's file name
    let common = common.min(to.len().saturating_sub(1));

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from_dir.len() {
        parts.push("..".to_string());
    }
    for segment in &to[common..] {
        parts.push(utf8_percent_encode(segment, SEGMENT).to_string());
    }

    if parts.is_empty() {
        return "./".to_string();
    }
    parts.join("/")
}
