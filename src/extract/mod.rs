//! Link extractors for pages, style sheets and scripts
//!
//! Extractors are pure: they take the decoded content of one resource and
//! return the raw references it contains, in document order and without
//! duplicates. Resolving, filtering and scope checks happen in discovery.

pub mod css;
pub mod html;
pub mod script;

use crate::state::ContentKind;
use crate::ExtractError;
use std::collections::HashSet;

/// Construct a reference was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `<a href>`, `<area href>`, canonical and alternate links
    Hyperlink,
    /// `<iframe src>`, `<frame src>`
    Frame,
    /// Images, icons, posters and `srcset` candidates
    Image,
    /// `<link rel=stylesheet>` and CSS `@import`
    Stylesheet,
    /// Font files from CSS `url()`
    Font,
    /// `<script src>`
    Script,
    /// Audio, video, embeds and objects
    Media,
    /// Other `<link href>` targets (manifests, preloads)
    Asset,
    /// URL-like `data-*` attribute values
    DataAttribute,
    /// URL literals found in script text
    ScriptLiteral,
}

impl ReferenceKind {
    /// Navigable references; external ones are never downloaded
    pub fn is_hyperlink(&self) -> bool {
        matches!(self, Self::Hyperlink | Self::Frame)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hyperlink => "hyperlink",
            Self::Frame => "frame",
            Self::Image => "image",
            Self::Stylesheet => "stylesheet",
            Self::Font => "font",
            Self::Script => "script",
            Self::Media => "media",
            Self::Asset => "asset",
            Self::DataAttribute => "data-attribute",
            Self::ScriptLiteral => "script-literal",
        }
    }
}

/// A raw reference as written in a document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkReference {
    pub raw: String,
    pub kind: ReferenceKind,
}

impl LinkReference {
    pub fn new(raw: impl Into<String>, kind: ReferenceKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
        }
    }
}

/// Ordered, duplicate-free collection of references
#[derive(Debug, Default)]
pub(crate) struct ReferenceSet {
    seen: HashSet<(String, ReferenceKind)>,
    items: Vec<LinkReference>,
}

impl ReferenceSet {
    pub(crate) fn push(&mut self, raw: &str, kind: ReferenceKind) {
        let raw = raw.trim();
        if crate::filters::is_inert_reference(raw) {
            return;
        }
        if self.seen.insert((raw.to_string(), kind)) {
            self.items.push(LinkReference::new(raw, kind));
        }
    }

    pub(crate) fn extend(&mut self, refs: Vec<LinkReference>) {
        for r in refs {
            self.push(&r.raw, r.kind);
        }
    }

    pub(crate) fn into_vec(self) -> Vec<LinkReference> {
        self.items
    }
}

/// Decodes a text payload, refusing empty or binary-looking content
pub fn decode_text(bytes: &[u8], kind: &'static str) -> Result<String, ExtractError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ExtractError::Empty { kind });
    }

    let head = &bytes[..bytes.len().min(1024)];
    if head.contains(&0) {
        return Err(ExtractError::Binary { kind });
    }

    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// Runs the extractor matching the content kind
///
/// Kinds without an extractor yield no references.
pub fn extract(kind: ContentKind, bytes: &[u8]) -> Result<Vec<LinkReference>, ExtractError> {
    match kind {
        ContentKind::Html => Ok(html::extract_html(&decode_text(bytes, "html")?)),
        ContentKind::Css => Ok(css::extract_css(&decode_text(bytes, "css")?)),
        ContentKind::Script => Ok(script::extract_script(&decode_text(bytes, "script")?)),
        _ => Ok(Vec::new()),
    }
}
