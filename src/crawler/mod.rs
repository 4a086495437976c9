//! Crawler module for archive fetching and discovery
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Fallback resolution over nearby timestamps and a CDN mirror
//! - The frontier of pending and visited canonical URLs
//! - Screening extracted references before they are enqueued
//! - Overall crawl coordination

mod coordinator;
mod discovery;
mod fallback;
mod fetcher;
mod frontier;
#[cfg(test)]
mod mock;

pub use coordinator::Coordinator;
pub use discovery::{expected_kind, Discovery, Rejection};
pub use fallback::{
    cdn_url, nearby_plan, FallbackResolver, Resolution, Resolved, NEARBY_WINDOWS_HOURS,
};
pub use fetcher::{build_http_client, fetch_url, ArchiveClient, FetchResult, Fetcher};
pub use frontier::Frontier;
