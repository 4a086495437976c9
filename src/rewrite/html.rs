//! Page rewriting on an `html5ever` DOM
//!
//! One walk over the tree removes archive chrome and filtered content,
//! applies the external-link and contact policies, and rewrites every
//! reference through [`Rewriter::resolve`], including the URL literals of
//! inline scripts.

use crate::config::ExternalLinkPolicy;
use crate::extract::html::{is_javascript, link_kind, looks_like_url, parse_srcset};
use crate::filters;
use crate::rewrite::{rewrite_css, rewrite_script, Rewriter, Target};
use crate::state::FetchedResource;
use crate::url::{strip_archive_prefix, CanonicalUrl};
use html5ever::interface::{Attribute, QualName};
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{namespace_url, ns, parse_document, LocalName, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::rc::Rc;

/// Elements never treated as consent banners even when their class says so
const STRUCTURAL: &[&str] = &["html", "head", "body", "main"];

/// What happens to a node after it has been visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Keep,
    Remove,
    /// Replace the element with its children
    Unwrap,
}

/// Result of rewriting one reference attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Absent,
    Kept,
    Pruned,
}

/// Rewrites one page and serializes it back to bytes
///
/// On a serialization failure the original text is returned.
pub fn rewrite_html(html: &str, rewriter: &Rewriter, doc: &FetchedResource) -> Vec<u8> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let dom = parse_document(RcDom::default(), opts).one(html);

    let pass = PagePass { rewriter, doc };
    pass.walk(&dom.document);

    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = dom.document.clone().into();
    match serialize(&mut buf, &serializable, SerializeOpts::default()) {
        Ok(()) => buf,
        Err(e) => {
            tracing::warn!("Failed to serialize {}: {}", doc.url, e);
            html.as_bytes().to_vec()
        }
    }
}

struct PagePass<'a, 'r> {
    rewriter: &'a Rewriter<'r>,
    doc: &'a FetchedResource,
}

impl PagePass<'_, '_> {
    fn walk(&self, node: &Handle) {
        let children: Vec<Handle> = node.children.borrow().clone();
        let mut kept = Vec::with_capacity(children.len());

        for child in children {
            match self.visit(&child) {
                Action::Keep => {
                    self.walk(&child);
                    kept.push(child);
                }
                Action::Remove => {}
                Action::Unwrap => {
                    self.walk(&child);
                    for grandchild in child.children.borrow().iter() {
                        grandchild.parent.set(Some(Rc::downgrade(node)));
                        kept.push(grandchild.clone());
                    }
                }
            }
        }

        *node.children.borrow_mut() = kept;
    }

    fn visit(&self, node: &Handle) -> Action {
        match &node.data {
            NodeData::Comment { contents } => {
                if self.rewriter.strip_all_comments() || filters::is_chrome_comment(contents) {
                    Action::Remove
                } else {
                    Action::Keep
                }
            }
            NodeData::Element { name, .. } => {
                let action = self.visit_element(node, name.local.as_ref());
                if action != Action::Remove {
                    self.rewrite_common_attrs(node);
                }
                action
            }
            _ => Action::Keep,
        }
    }

    fn visit_element(&self, node: &Handle, tag: &str) -> Action {
        let filters = self.rewriter.filters();

        if get_attr(node, "id").is_some_and(|id| filters::is_chrome_id(&id)) {
            return Action::Remove;
        }
        if let Some(class) = get_attr(node, "class") {
            if filters.remove_trackers
                && !STRUCTURAL.contains(&tag)
                && filters::is_consent_class(&class)
            {
                return Action::Remove;
            }
            if filters.remove_ads && class.split_whitespace().any(|c| c == "adsbygoogle") {
                return Action::Remove;
            }
        }

        match tag {
            "base" => Action::Remove,
            "meta" => self.meta(node),
            "script" => self.script(node),
            "link" => self.link(node),
            "a" | "area" => self.anchor(node),
            "img" => self.image(node),
            "source" => self.source(node),
            "iframe" | "frame" => self.frame(node),
            "video" => {
                if self.apply(node, "poster") == Outcome::Pruned {
                    set_attr(node, "poster", None);
                }
                self.required(node, "src")
            }
            "audio" | "embed" | "track" => self.required(node, "src"),
            "object" => self.required(node, "data"),
            "input" => {
                let is_image =
                    get_attr(node, "type").is_some_and(|t| t.eq_ignore_ascii_case("image"));
                if is_image {
                    self.required(node, "src")
                } else {
                    Action::Keep
                }
            }
            "style" => {
                self.rewrite_style_text(node);
                Action::Keep
            }
            _ => Action::Keep,
        }
    }

    /// `og:url` and similar tags that point back into the archive
    fn meta(&self, node: &Handle) -> Action {
        let property = get_attr(node, "property")
            .or_else(|| get_attr(node, "name"))
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content = get_attr(node, "content").unwrap_or_default();

        let points_at_archive = content.contains("/web/")
            || self
                .rewriter
                .canonicalizer()
                .archive_hosts()
                .iter()
                .any(|h| content.contains(h.as_str()));

        if property.ends_with(":url") && points_at_archive {
            Action::Remove
        } else {
            Action::Keep
        }
    }

    fn script(&self, node: &Handle) -> Action {
        let filters = self.rewriter.filters();

        match get_attr(node, "src") {
            Some(src) => {
                if filters::is_chrome_script(&src) || self.is_blocked(&src) {
                    return Action::Remove;
                }
                set_attr(node, "integrity", None);
                self.required(node, "src")
            }
            None => {
                let text = text_content(node);
                if filters::is_chrome_inline_script(&text)
                    || (filters.remove_trackers && filters::is_tracker_inline_script(&text))
                {
                    return Action::Remove;
                }
                if is_javascript(get_attr(node, "type").as_deref()) {
                    let rewritten = rewrite_script(&text, &mut |raw: &str| {
                        self.rewriter.resolve(raw, self.doc)
                    });
                    replace_text(node, &text, &rewritten);
                }
                Action::Keep
            }
        }
    }

    fn link(&self, node: &Handle) -> Action {
        let Some(href) = get_attr(node, "href") else {
            return Action::Keep;
        };
        if filters::is_chrome_stylesheet(&href) || self.is_blocked(&href) {
            return Action::Remove;
        }

        let rel = get_attr(node, "rel").unwrap_or_default();
        let as_attr = get_attr(node, "as");
        if link_kind(&rel, as_attr.as_deref()).is_none() {
            return Action::Keep;
        }

        set_attr(node, "integrity", None);
        self.required(node, "href")
    }

    /// # Anchor Rules
    ///
    /// - Contact links follow the contact policy
    /// - Links leaving the site follow the external-link policy
    /// - Internal links to pruned targets lose their `href`
    fn anchor(&self, node: &Handle) -> Action {
        let filters = self.rewriter.filters();
        let Some(href) = get_attr(node, "href") else {
            return Action::Keep;
        };

        let live = strip_archive_prefix(&href, self.rewriter.canonicalizer().archive_hosts());
        let plain = live.clone().unwrap_or_else(|| href.clone());

        if filters::contact_scheme(&plain).is_some() {
            if !filters.remove_clickable_contacts {
                set_attr(node, "href", Some(plain));
                return Action::Keep;
            }
            return match filters.external_links {
                ExternalLinkPolicy::Remove => Action::Remove,
                _ => Action::Unwrap,
            };
        }

        if filters::is_inert_reference(&href) {
            return Action::Keep;
        }
        let Some(url) = self.canonical(&href) else {
            return Action::Keep;
        };

        if self.is_external(&url) {
            return match filters.external_links {
                ExternalLinkPolicy::Unlink => Action::Unwrap,
                ExternalLinkPolicy::Remove => Action::Remove,
                ExternalLinkPolicy::Keep => {
                    set_attr(node, "href", Some(live.unwrap_or(href)));
                    Action::Keep
                }
            };
        }

        if self.apply(node, "href") == Outcome::Pruned {
            set_attr(node, "href", None);
        }
        Action::Keep
    }

    fn image(&self, node: &Handle) -> Action {
        if get_attr(node, "src").is_some_and(|src| self.is_blocked(&src)) {
            return Action::Remove;
        }

        let src = self.apply(node, "src");
        let srcset = self.rewrite_srcset(node, "srcset");
        match (src, srcset) {
            (Outcome::Pruned, _) => Action::Remove,
            (Outcome::Absent, Outcome::Pruned) => Action::Remove,
            _ => Action::Keep,
        }
    }

    fn source(&self, node: &Handle) -> Action {
        let src = self.apply(node, "src");
        let srcset = self.rewrite_srcset(node, "srcset");
        match (src, srcset) {
            (Outcome::Pruned, _) | (_, Outcome::Pruned) => Action::Remove,
            _ => Action::Keep,
        }
    }

    fn frame(&self, node: &Handle) -> Action {
        let Some(src) = get_attr(node, "src") else {
            return Action::Keep;
        };
        if self.is_blocked(&src) {
            return Action::Remove;
        }
        let external = self.canonical(&src).is_some_and(|url| self.is_external(&url));
        if external && self.rewriter.filters().remove_external_iframes {
            return Action::Remove;
        }
        self.required(node, "src")
    }

    /// Removes the element if its reference attribute is pruned
    fn required(&self, node: &Handle, attr: &str) -> Action {
        match self.apply(node, attr) {
            Outcome::Pruned => Action::Remove,
            _ => Action::Keep,
        }
    }

    /// `style` attributes and URL-like `data-*` attributes on any element
    fn rewrite_common_attrs(&self, node: &Handle) {
        let names: Vec<(String, String)> = match &node.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect(),
            _ => return,
        };

        for (name, value) in names {
            if name == "style" {
                let css =
                    rewrite_css(&value, &mut |raw: &str, _| self.rewriter.resolve(raw, self.doc));
                if css != value {
                    set_attr(node, "style", Some(css));
                }
            } else if let Some(data_name) = name.strip_prefix("data-") {
                if data_name.ends_with("srcset") {
                    self.rewrite_srcset(node, &name);
                } else if looks_like_url(&value) && self.apply(node, &name) == Outcome::Pruned {
                    set_attr(node, &name, None);
                }
            }
        }
    }

    /// Rewrites a `srcset`-style attribute, dropping pruned candidates
    ///
    /// Reports `Pruned` when no candidate is left (the attribute is removed).
    fn rewrite_srcset(&self, node: &Handle, attr: &str) -> Outcome {
        let Some(value) = get_attr(node, attr) else {
            return Outcome::Absent;
        };

        let candidates: Vec<String> = parse_srcset(&value)
            .into_iter()
            .filter_map(|(url, descriptor)| {
                let url = match self.rewriter.resolve(&url, self.doc) {
                    Target::Keep => url,
                    Target::Rewrite(href) => href,
                    Target::Prune => return None,
                };
                Some(if descriptor.is_empty() {
                    url
                } else {
                    format!("{} {}", url, descriptor)
                })
            })
            .collect();

        if candidates.is_empty() {
            set_attr(node, attr, None);
            return Outcome::Pruned;
        }
        set_attr(node, attr, Some(candidates.join(", ")));
        Outcome::Kept
    }

    fn rewrite_style_text(&self, node: &Handle) {
        let css = text_content(node);
        let rewritten = rewrite_css(&css, &mut |raw: &str, _| self.rewriter.resolve(raw, self.doc));
        replace_text(node, &css, &rewritten);
    }

    /// Rewrites one reference attribute in place
    fn apply(&self, node: &Handle, attr: &str) -> Outcome {
        let Some(raw) = get_attr(node, attr) else {
            return Outcome::Absent;
        };
        match self.rewriter.resolve(&raw, self.doc) {
            Target::Keep => Outcome::Kept,
            Target::Rewrite(href) => {
                set_attr(node, attr, Some(href));
                Outcome::Kept
            }
            Target::Prune => Outcome::Pruned,
        }
    }

    fn canonical(&self, raw: &str) -> Option<CanonicalUrl> {
        self.rewriter.canonical(raw, self.doc)
    }

    /// Outside the site and not part of the offline tree
    fn is_external(&self, url: &CanonicalUrl) -> bool {
        !self.rewriter.canonicalizer().is_internal(url) && !self.rewriter.is_local(url)
    }

    /// Tracker or ad reference that the filters remove
    fn is_blocked(&self, raw: &str) -> bool {
        let filters = self.rewriter.filters();
        let Some(url) = self.canonical(raw) else {
            return false;
        };
        let internal = self.rewriter.canonicalizer().is_internal(&url);

        (filters.remove_trackers && filters::is_tracker_url(url.as_url()))
            || (filters.remove_ads && filters::is_ad_url(url.as_url(), !internal))
    }
}

fn get_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == attr_name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Sets an attribute, adding it if needed; `None` removes it
fn set_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        match attr_value {
            Some(value) => {
                if let Some(existing) = attrs.iter_mut().find(|a| &*a.name.local == attr_name) {
                    existing.value = format_tendril!("{}", value);
                } else {
                    attrs.push(Attribute {
                        name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                        value: format_tendril!("{}", value),
                    });
                }
            }
            None => attrs.retain(|a| &*a.name.local != attr_name),
        }
    }
}

/// Puts `rewritten` in the first text child and empties the others
fn replace_text(node: &Handle, original: &str, rewritten: &str) {
    if rewritten == original {
        return;
    }

    let mut first = true;
    for child in node.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            let replacement = if first { rewritten } else { "" };
            *contents.borrow_mut() = StrTendril::from_slice(replacement);
            first = false;
        }
    }
}

fn text_content(node: &Handle) -> String {
    node.children
        .borrow()
        .iter()
        .filter_map(|child| match &child.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        })
        .collect()
}
