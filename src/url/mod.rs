//! URL handling module for Wayback-Archive
//!
//! This module provides canonicalization, archive addressing (timestamps,
//! prefixes, fetch URLs) and the local file layout.

mod archive;
mod layout;
mod normalize;

// Re-export main types and functions
pub use archive::{
    archive_timestamp, strip_archive_prefix, ArchiveReference, ArchiveSource, Timestamp,
    WAYBACK_HOST,
};
pub use layout::{local_path, EXTERNAL_DIR};
pub use normalize::{CanonicalUrl, Canonicalizer};

/// Hosts serving web-font style sheets and font files
const FONT_SERVICE_HOSTS: &[&str] = &[
    "fonts.googleapis.com",
    "fonts.gstatic.com",
    "use.typekit.net",
    "p.typekit.net",
    "use.fontawesome.com",
    "fonts.bunny.net",
];

/// Returns true if the host is a known web-font service
pub fn is_font_service_host(host: &str) -> bool {
    FONT_SERVICE_HOSTS
        .iter()
        .any(|h| host.eq_ignore_ascii_case(h))
}
