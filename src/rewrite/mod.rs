//! Final reference rewriting
//!
//! Runs once the frontier has drained and every resource status is
//! committed. Each reference in a page, style sheet or script is looked up in the
//! resolution table and replaced by a path into the offline tree, the live
//! URL, or nothing at all when its target is missing or corrupted.

pub mod css;
pub mod html;
pub mod paths;
pub mod script;

pub use css::rewrite_css;
pub use html::rewrite_html;
pub use paths::relative_href;
pub use script::rewrite_script;

use crate::config::{Config, FilterConfig, LinkConfig};
use crate::filters;
use crate::state::{ContentKind, FetchedResource, ResolutionTable};
use crate::url::{local_path, CanonicalUrl, Canonicalizer};
use std::path::PathBuf;

/// What a single reference becomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Replace the reference with this string
    Rewrite(String),
    /// The target is missing or corrupted; remove the reference
    Prune,
    /// Leave the reference untouched (fragments, `data:` URIs, unparsable input)
    Keep,
}

/// Applies the rewrite rules of one run to its fetched documents
pub struct Rewriter<'a> {
    canonicalizer: &'a Canonicalizer,
    table: &'a ResolutionTable,
    links: &'a LinkConfig,
    filters: &'a FilterConfig,
    optimize_html: bool,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        config: &'a Config,
        canonicalizer: &'a Canonicalizer,
        table: &'a ResolutionTable,
    ) -> Self {
        Self {
            canonicalizer,
            table,
            links: &config.links,
            filters: &config.filters,
            optimize_html: config.optimize.html,
        }
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        self.canonicalizer
    }

    pub(crate) fn filters(&self) -> &FilterConfig {
        self.filters
    }

    pub(crate) fn strip_all_comments(&self) -> bool {
        self.optimize_html
    }

    /// Canonical form of a reference found in `doc`
    pub fn canonical(&self, raw: &str, doc: &FetchedResource) -> Option<CanonicalUrl> {
        self.canonicalizer.canonicalize(raw, Some(&doc.url)).ok()
    }

    /// Returns true if the reference resolves to a resource written to the tree
    pub fn is_local(&self, url: &CanonicalUrl) -> bool {
        self.table
            .resolve(url)
            .is_some_and(|r| r.status.is_success())
    }

    /// Final form of a reference found in `doc`
    ///
    /// # Rewrite Rules
    ///
    /// 1. Fragments, `data:` and `javascript:` references are kept
    /// 2. Written targets become a relative path from `doc` (or their
    ///    canonical URL when relative links are disabled); redirect sources
    ///    keep their own path when redirections are kept
    /// 3. Missing or corrupted targets are pruned, or point at the live URL
    ///    when missing references are kept
    /// 4. Targets that were never fetched point at the live URL
    ///
    /// The original fragment is carried over in every rewritten form.
    pub fn resolve(&self, raw: &str, doc: &FetchedResource) -> Target {
        let raw = raw.trim();
        if filters::is_inert_reference(raw) {
            return Target::Keep;
        }
        let Some(url) = self.canonical(raw, doc) else {
            return Target::Keep;
        };
        let fragment = raw.find('#').map_or("", |i| &raw[i..]);

        match self.table.resolve(&url) {
            Some(resource) if resource.status.is_success() => {
                let (path, canonical) = self.redirect_source(&url, resource).unwrap_or_else(|| {
                    (resource.local_path.clone(), &resource.url)
                });
                let href = if self.links.make_internal_links_relative {
                    relative_href(&doc.local_path, &path)
                } else {
                    canonical.to_string()
                };
                Target::Rewrite(format!("{}{}", href, fragment))
            }
            Some(_) if !self.links.keep_missing_references => Target::Prune,
            _ => Target::Rewrite(format!("{}{}", url, fragment)),
        }
    }

    /// Path of the stub page kept for a redirected page, if any
    fn redirect_source<'r>(
        &self,
        url: &'r CanonicalUrl,
        resource: &FetchedResource,
    ) -> Option<(PathBuf, &'r CanonicalUrl)> {
        if !self.links.keep_redirections || resource.kind != ContentKind::Html {
            return None;
        }
        self.table.alias_target(url)?;
        let internal = self.canonicalizer.is_internal(url);
        Some((local_path(url, resource.kind, internal), url))
    }

    /// Rewritten bytes of a written resource
    pub fn rewrite(&self, resource: &FetchedResource) -> Vec<u8> {
        match resource.kind {
            ContentKind::Html => {
                let text = String::from_utf8_lossy(&resource.bytes);
                rewrite_html(&text, self, resource)
            }
            ContentKind::Css => {
                let text = String::from_utf8_lossy(&resource.bytes);
                rewrite_css(&text, &mut |raw: &str, _| self.resolve(raw, resource)).into_bytes()
            }
            ContentKind::Script => match std::str::from_utf8(&resource.bytes) {
                Ok(text) => {
                    rewrite_script(text, &mut |raw: &str| self.resolve(raw, resource)).into_bytes()
                }
                Err(_) => resource.bytes.clone(),
            },
            _ => resource.bytes.clone(),
        }
    }

    /// Redirect stub pages to write when redirections are kept
    ///
    /// One stub per redirected page, at the redirect source's own path,
    /// pointing at the destination's local file.
    pub fn redirect_stubs(&self) -> Vec<(PathBuf, Vec<u8>)> {
        if !self.links.keep_redirections {
            return Vec::new();
        }

        let mut stubs: Vec<(PathBuf, Vec<u8>)> = self
            .table
            .aliases()
            .filter_map(|(from, _)| {
                let resource = self.table.resolve(from)?;
                if !resource.status.is_success() || resource.kind != ContentKind::Html {
                    return None;
                }
                let path = local_path(from, resource.kind, self.canonicalizer.is_internal(from));
                if path == resource.local_path {
                    return None;
                }
                let href = relative_href(&path, &resource.local_path);
                Some((path, redirect_stub(&href).into_bytes()))
            })
            .collect();

        stubs.sort_by(|a, b| a.0.cmp(&b.0));
        stubs
    }
}

/// Minimal page that forwards the browser to `href`
pub fn redirect_stub(href: &str) -> String {
    let escaped = href
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;");
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"0; url={0}\">\
         <link rel=\"canonical\" href=\"{0}\"><title>Redirecting</title></head>\
         <body><a href=\"{0}\">Redirecting</a></body></html>\n",
        escaped
    )
}
