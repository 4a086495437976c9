//! In-memory fetcher for unit tests

use crate::crawler::fetcher::{FetchResult, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Serves canned responses keyed by exact request URL; everything else is a 404
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, FetchResult>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` at `url` with the given content type
    pub fn with(mut self, url: &str, content_type: &str, body: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResult::Success {
                final_url: Url::parse(url).unwrap(),
                status_code: 200,
                content_type: Some(content_type.to_string()),
                body: body.to_vec(),
            },
        );
        self
    }

    /// Serves `body` at `url` as if reached through a redirect to `final_url`
    pub fn with_redirect(
        mut self,
        url: &str,
        final_url: &str,
        content_type: &str,
        body: &[u8],
    ) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResult::Success {
                final_url: Url::parse(final_url).unwrap(),
                status_code: 200,
                content_type: Some(content_type.to_string()),
                body: body.to_vec(),
            },
        );
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(FetchResult::HttpError { status_code: 404 })
    }
}
