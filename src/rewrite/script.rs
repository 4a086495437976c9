//! Script literal rewriting
//!
//! Only the literals the script extractor follows are touched. Pruned
//! targets become an empty string so the script keeps its shape.

use crate::extract::script::literal_spans;
use crate::rewrite::Target;

/// Rewrites the URL literals of a script
///
/// # Example
///
/// ```
/// use wayback_archive::rewrite::{rewrite_script, Target};
///
/// let js = rewrite_script(r#"img.src = "/a.png";"#, &mut |raw: &str| {
///     Target::Rewrite(format!("..{}", raw))
/// });
/// assert_eq!(js, r#"img.src = "../a.png";"#);
/// ```
pub fn rewrite_script<F>(js: &str, resolve: &mut F) -> String
where
    F: FnMut(&str) -> Target,
{
    let mut out = String::with_capacity(js.len());
    let mut cursor = 0;

    for span in literal_spans(js) {
        let replacement = match resolve(&js[span.clone()]) {
            Target::Keep => continue,
            Target::Rewrite(href) => href,
            Target::Prune => String::new(),
        };
        out.push_str(&js[cursor..span.start]);
        out.push_str(&escape_literal(&replacement));
        cursor = span.end;
    }

    out.push_str(&js[cursor..]);
    out
}

/// Keeps a spliced path from closing the surrounding string literal
fn escape_literal(href: &str) -> String {
    href.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\'")
}
