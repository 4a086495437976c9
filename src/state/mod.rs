//! State module for tracking crawl results
//!
//! # Components
//!
//! - `ContentKind`: What a resource is (page, style sheet, script, image, font)
//! - `ResourceStatus`: Final outcome of resolving a resource
//! - `ResolutionTable`: Every resolved resource plus redirect aliases

mod resource;

// Re-export main types
pub(crate) use resource::leading_text;
pub use resource::{
    ContentKind, FetchedResource, ResolutionSource, ResolutionTable, ResourceStatus,
};
