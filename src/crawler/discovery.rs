//! Feeds extracted references back into the frontier
//!
//! Each raw reference is canonicalized against the document it came from,
//! screened for scope and filters, and enqueued. Duplicates collapse in the
//! frontier itself.

use crate::config::{FilterConfig, LinkConfig};
use crate::crawler::frontier::Frontier;
use crate::extract::{LinkReference, ReferenceKind};
use crate::filters;
use crate::state::ContentKind;
use crate::url::{is_font_service_host, CanonicalUrl, Canonicalizer};

/// Why a reference was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Could not be canonicalized (bad syntax or non-http scheme)
    Unresolvable,
    /// Points outside the site
    OutOfScope,
    Tracker,
    Ad,
}

/// Scope and filter rules applied to every discovered reference
#[derive(Debug, Clone)]
pub struct Discovery {
    canonicalizer: Canonicalizer,
    links: LinkConfig,
    filters: FilterConfig,
}

impl Discovery {
    pub fn new(canonicalizer: Canonicalizer, links: LinkConfig, filters: FilterConfig) -> Self {
        Self {
            canonicalizer,
            links,
            filters,
        }
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Decides whether a single reference should be fetched
    ///
    /// # Admission Rules
    ///
    /// **Admit:**
    /// - Internal references of any construct
    /// - Font-service style sheets and font files
    /// - External non-hyperlink assets when external downloads are enabled
    ///
    /// **Reject:**
    /// - Tracker and ad URLs when the matching filter is on
    /// - External hyperlinks and frames
    /// - External script literals
    pub fn screen(
        &self,
        reference: &LinkReference,
        base: &CanonicalUrl,
    ) -> Result<CanonicalUrl, Rejection> {
        let url = self
            .canonicalizer
            .canonicalize(&reference.raw, Some(base))
            .map_err(|e| {
                tracing::debug!("Skipping reference {} in {}: {}", reference.raw, base, e);
                Rejection::Unresolvable
            })?;

        let internal = self.canonicalizer.is_internal(&url);

        if self.filters.remove_trackers && filters::is_tracker_url(url.as_url()) {
            return Err(Rejection::Tracker);
        }
        if self.filters.remove_ads && filters::is_ad_url(url.as_url(), !internal) {
            return Err(Rejection::Ad);
        }

        if !internal {
            let asset =
                !reference.kind.is_hyperlink() && reference.kind != ReferenceKind::ScriptLiteral;
            let allowed =
                asset && (is_font_service_host(url.host()) || self.links.download_external_assets);
            if !allowed {
                return Err(Rejection::OutOfScope);
            }
        }

        Ok(url)
    }

    /// Screens and enqueues a batch of references from one document
    ///
    /// Returns the newly enqueued URLs with the content kind the reference
    /// implies, used to pick the archive's raw-content flag.
    pub fn admit(
        &self,
        references: &[LinkReference],
        base: &CanonicalUrl,
        frontier: &mut Frontier,
    ) -> Vec<(CanonicalUrl, ContentKind)> {
        let mut admitted = Vec::new();

        for reference in references {
            let url = match self.screen(reference, base) {
                Ok(url) => url,
                Err(reason) => {
                    if !matches!(reason, Rejection::Unresolvable | Rejection::OutOfScope) {
                        tracing::debug!("Filtered {} ({:?})", reference.raw, reason);
                    }
                    continue;
                }
            };

            let kind = expected_kind(reference.kind, &url);
            if frontier.enqueue(url.clone()) {
                admitted.push((url, kind));
            }
        }

        admitted
    }
}

/// Content kind implied by the referencing construct
///
/// Asset constructs decide on their own; other references fall back to the
/// URL shape.
pub fn expected_kind(reference: ReferenceKind, url: &CanonicalUrl) -> ContentKind {
    match reference {
        ReferenceKind::Stylesheet => ContentKind::Css,
        ReferenceKind::Font => ContentKind::Font,
        ReferenceKind::Image => ContentKind::Image,
        ReferenceKind::Script => ContentKind::Script,
        _ => ContentKind::guess(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExternalLinkPolicy, WwwPolicy};
    use crate::url::ArchiveSource;

    fn discovery(download_external_assets: bool) -> Discovery {
        let source =
            ArchiveSource::parse("https://web.archive.org/web/20200101000000/https://example.com/")
                .unwrap();
        Discovery::new(
            Canonicalizer::new(&source, WwwPolicy::NonWww),
            LinkConfig {
                make_internal_links_relative: true,
                www: WwwPolicy::NonWww,
                keep_redirections: false,
                keep_missing_references: false,
                download_external_assets,
            },
            FilterConfig {
                remove_trackers: true,
                remove_ads: true,
                remove_clickable_contacts: true,
                remove_external_iframes: false,
                external_links: ExternalLinkPolicy::Unlink,
            },
        )
    }

    fn base(d: &Discovery) -> CanonicalUrl {
        d.canonicalizer()
            .canonicalize("https://example.com/blog/post.html", None)
            .unwrap()
    }

    fn reference(raw: &str, kind: ReferenceKind) -> LinkReference {
        LinkReference::new(raw, kind)
    }

    #[test]
    fn test_admit_internal_and_dedup() {
        let d = discovery(false);
        let mut frontier = Frontier::new(None);
        let refs = vec![
            reference("/img/logo.png", ReferenceKind::Image),
            reference("../img/logo.png", ReferenceKind::Image),
            reference("https://www.example.com/img/logo.png", ReferenceKind::Image),
            reference("other.html", ReferenceKind::Hyperlink),
        ];

        let admitted = d.admit(&refs, &base(&d), &mut frontier);

        assert_eq!(admitted.len(), 2);
        assert_eq!(admitted[0].0.as_str(), "https://example.com/img/logo.png");
        assert_eq!(admitted[0].1, ContentKind::Image);
        assert_eq!(admitted[1].0.as_str(), "https://example.com/blog/other.html");
        assert_eq!(frontier.pending_count(), 2);
    }

    #[test]
    fn test_archive_prefixed_reference_is_internal() {
        let d = discovery(false);
        let url = d
            .screen(
                &reference(
                    "/web/20200101000000cs_/http://example.com/css/site.css",
                    ReferenceKind::Stylesheet,
                ),
                &base(&d),
            )
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/css/site.css");
    }

    #[test]
    fn test_external_scope() {
        let d = discovery(false);
        let b = base(&d);

        assert_eq!(
            d.screen(&reference("https://other.com/page", ReferenceKind::Hyperlink), &b),
            Err(Rejection::OutOfScope)
        );
        assert_eq!(
            d.screen(&reference("https://cdn.other.com/a.png", ReferenceKind::Image), &b),
            Err(Rejection::OutOfScope)
        );
        assert!(d
            .screen(
                &reference("https://fonts.googleapis.com/css?family=Roboto", ReferenceKind::Stylesheet),
                &b
            )
            .is_ok());
        assert!(d
            .screen(&reference("https://fonts.gstatic.com/s/roboto/v1/a.woff2", ReferenceKind::Font), &b)
            .is_ok());
    }

    #[test]
    fn test_external_assets_when_enabled() {
        let d = discovery(true);
        let b = base(&d);

        assert!(d
            .screen(&reference("https://cdn.other.com/a.png", ReferenceKind::Image), &b)
            .is_ok());
        assert_eq!(
            d.screen(&reference("https://other.com/page", ReferenceKind::Hyperlink), &b),
            Err(Rejection::OutOfScope)
        );
        assert_eq!(
            d.screen(&reference("https://other.com/x.png", ReferenceKind::ScriptLiteral), &b),
            Err(Rejection::OutOfScope)
        );
    }

    #[test]
    fn test_filters() {
        let d = discovery(true);
        let b = base(&d);

        assert_eq!(
            d.screen(
                &reference("https://www.googletagmanager.com/gtag/js?id=G-1", ReferenceKind::Script),
                &b
            ),
            Err(Rejection::Tracker)
        );
        assert_eq!(
            d.screen(&reference("https://ads.other.net/banner.js", ReferenceKind::Script), &b),
            Err(Rejection::Ad)
        );
        assert_eq!(
            d.screen(&reference("ftp://example.com/file", ReferenceKind::Hyperlink), &b),
            Err(Rejection::Unresolvable)
        );
    }

    #[test]
    fn test_expected_kind() {
        let d = discovery(false);
        let url = |raw: &str| d.canonicalizer().canonicalize(raw, None).unwrap();

        assert_eq!(
            expected_kind(ReferenceKind::Stylesheet, &url("https://example.com/style.php?v=1")),
            ContentKind::Css
        );
        assert_eq!(
            expected_kind(ReferenceKind::DataAttribute, &url("https://example.com/i/a.png")),
            ContentKind::Image
        );
        assert_eq!(
            expected_kind(ReferenceKind::Hyperlink, &url("https://example.com/about")),
            ContentKind::Html
        );
    }
}
