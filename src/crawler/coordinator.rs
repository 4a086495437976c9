//! Crawler coordinator - main reconstruction logic
//!
//! This module contains the crawl loop that coordinates:
//! - Handing frontier URLs to a bounded set of fetch tasks
//! - Committing each resolution (redirects, classification, integrity)
//! - Feeding extracted references back into the frontier
//! - Rewriting and writing the offline tree once the frontier has drained

use crate::config::{compute_config_hash, Config};
use crate::crawler::discovery::Discovery;
use crate::crawler::fallback::{FallbackResolver, Resolution, Resolved};
use crate::crawler::fetcher::{ArchiveClient, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::extract::extract;
use crate::integrity::{check_resource, Verdict};
use crate::output::{OptimizerRegistry, OutputWriter, RunSummary};
use crate::rewrite::Rewriter;
use crate::state::{
    ContentKind, FetchedResource, ResolutionSource, ResolutionTable, ResourceStatus,
};
use crate::url::{
    local_path, strip_archive_prefix, ArchiveReference, CanonicalUrl, Canonicalizer,
};
use crate::{ArchiveError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Resources committed between progress reports
const PROGRESS_INTERVAL: usize = 10;

/// Result of one fetch task
struct FetchOutcome {
    url: CanonicalUrl,
    /// Kind implied by the referencing construct
    hint: ContentKind,
    resolution: Resolution,
}

/// Main crawl coordinator structure
///
/// Sole owner of the frontier and the resolution table. Fetch tasks only
/// see the resolver; everything they return is committed here.
pub struct Coordinator {
    config: Arc<Config>,
    resolver: FallbackResolver,
    discovery: Discovery,
    frontier: Frontier,
    table: ResolutionTable,
    hints: HashMap<CanonicalUrl, ContentKind>,
    optimizers: OptimizerRegistry,
    cancel: CancellationToken,
    entry: CanonicalUrl,
}

impl Coordinator {
    /// Creates a coordinator that fetches from the configured archive
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = ArchiveClient::new(&config.crawler)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a coordinator with a custom fetch capability
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let discovery = Discovery::new(
            Canonicalizer::from_config(&config),
            config.links.clone(),
            config.filters.clone(),
        );
        let entry = discovery
            .canonicalizer()
            .canonicalize_url(config.archive.root.clone())?;

        let mut frontier = Frontier::new(config.crawler.max_files);
        frontier.enqueue(entry.clone());
        let mut hints = HashMap::new();
        hints.insert(entry.clone(), ContentKind::Html);

        let resolver =
            FallbackResolver::new(fetcher, config.archive.clone(), config.fallback.clone());

        Ok(Self {
            optimizers: OptimizerRegistry::new(config.optimize),
            config: Arc::new(config),
            resolver,
            discovery,
            frontier,
            table: ResolutionTable::new(),
            hints,
            cancel: CancellationToken::new(),
            entry,
        })
    }

    /// Token that stops the run; already fetched resources are still written
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Registry for optimizer backends
    pub fn optimizers_mut(&mut self) -> &mut OptimizerRegistry {
        &mut self.optimizers
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn table(&self) -> &ResolutionTable {
        &self.table
    }

    /// Canonical URL of the snapshot's entry page
    pub fn entry(&self) -> &CanonicalUrl {
        &self.entry
    }

    /// Runs the crawl loop until the frontier drains
    ///
    /// This is the core crawling logic that:
    /// 1. Tops up the in-flight fetches from the frontier
    /// 2. Waits for the next fetch to finish (or for cancellation)
    /// 3. Commits the result and admits the references it contains
    ///
    /// Returns true if the crawl was cancelled.
    pub async fn crawl(&mut self) -> Result<bool> {
        tracing::info!("Starting crawl of {}", self.entry);

        let max_in_flight = self.config.crawler.max_concurrent_fetches.max(1);
        let cancel = self.cancel.clone();
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
        let mut committed = 0usize;
        let start_time = Instant::now();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            // Phase 1: Top up in-flight fetches
            while in_flight.len() < max_in_flight {
                let Some(url) = self.frontier.next() else {
                    break;
                };
                self.spawn_fetch(&mut in_flight, url);
            }

            if in_flight.is_empty() {
                break;
            }

            // Phase 2: Reap the next finished fetch
            let joined = tokio::select! {
                _ = cancel.cancelled() => break,
                joined = in_flight.join_next() => joined,
            };

            match joined {
                Some(Ok(outcome)) => {
                    self.commit(outcome)?;
                    committed += 1;

                    if committed % PROGRESS_INTERVAL == 0 {
                        let rate = committed as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} resources resolved, {} pending, {} in flight, {:.2}/sec",
                            committed,
                            self.frontier.pending_count(),
                            in_flight.len(),
                            rate
                        );
                    }
                }
                Some(Err(e)) => tracing::error!("Fetch task failed: {}", e),
                None => break,
            }
        }

        let cancelled = cancel.is_cancelled();
        if cancelled {
            tracing::warn!(
                "Crawl cancelled: aborting {} in-flight fetches, {} URLs left unvisited",
                in_flight.len(),
                self.frontier.pending_count()
            );
            in_flight.abort_all();
        } else if self.frontier.is_capped() && self.frontier.pending_count() > 0 {
            tracing::info!(
                "MAX_FILES reached; {} URLs left unvisited",
                self.frontier.pending_count()
            );
        }

        tracing::info!(
            "Crawl finished: {} resources resolved in {:?}",
            committed,
            start_time.elapsed()
        );

        Ok(cancelled)
    }

    fn spawn_fetch(&self, in_flight: &mut JoinSet<FetchOutcome>, url: CanonicalUrl) {
        let hint = self
            .hints
            .get(&url)
            .copied()
            .unwrap_or_else(|| ContentKind::guess(&url));
        let reference = ArchiveReference::new(url, self.config.archive.timestamp);
        let resolver = self.resolver.clone();

        tracing::debug!("Fetching {} as {}", reference.url, hint.as_str());
        in_flight.spawn(async move {
            let resolution = resolver.resolve(&reference, hint).await;
            FetchOutcome {
                url: reference.url,
                hint,
                resolution,
            }
        });
    }

    /// Records one resolution in the table
    ///
    /// A missing entry point aborts the run.
    fn commit(&mut self, outcome: FetchOutcome) -> Result<()> {
        let FetchOutcome {
            url,
            hint,
            resolution,
        } = outcome;

        match resolution {
            Resolution::Missing { attempts } => {
                if url == self.entry {
                    tracing::error!("Entry point {} could not be retrieved", url);
                    return Err(ArchiveError::EntryPointUnreachable {
                        url: self.config.wayback_url.clone(),
                    });
                }
                tracing::warn!("{} is missing after {} attempts", url, attempts);
                let path = local_path(&url, hint, self.discovery.canonicalizer().is_internal(&url));
                self.table.insert(FetchedResource::missing(url, hint, path));
            }
            Resolution::Found(resolved) => self.commit_found(url, hint, resolved),
        }

        Ok(())
    }

    /// # Commit Steps
    ///
    /// 1. Follow redirects: the requested URL becomes an alias of the final one
    /// 2. Classify (asset constructs keep their kind)
    /// 3. Check integrity
    /// 4. Extract and admit references from valid text resources
    fn commit_found(&mut self, requested: CanonicalUrl, hint: ContentKind, resolved: Resolved) {
        // Step 1: Redirects
        let mut url = requested.clone();
        if resolved.source != ResolutionSource::Cdn {
            if let Some(target) = self.redirect_target(&resolved) {
                if target != requested {
                    tracing::debug!("{} redirected to {}", requested, target);
                    self.table.add_alias(requested.clone(), target.clone());
                    if !self.frontier.claim(&target) {
                        // The destination has its own fetch
                        return;
                    }
                    url = target;
                }
            }
        }

        // Step 2: Classification
        let kind = match hint {
            ContentKind::Css | ContentKind::Script | ContentKind::Image | ContentKind::Font => hint,
            _ => ContentKind::classify(&url, resolved.content_type.as_deref(), &resolved.body),
        };

        // Step 3: Integrity
        let declared = resolved.content_type.as_deref();
        let status = match check_resource(&url, kind, declared, &resolved.body) {
            Verdict::Ok => ResourceStatus::Success,
            Verdict::Corrupted(reason) => {
                tracing::warn!("Corrupted {} {}: {}", kind.as_str(), url, reason);
                ResourceStatus::Corrupted
            }
        };

        let internal = self.discovery.canonicalizer().is_internal(&url);
        let path = local_path(&url, kind, internal);

        // Step 4: Discovery
        if status.is_success() {
            match extract(kind, &resolved.body) {
                Ok(references) => {
                    let admitted = self.discovery.admit(&references, &url, &mut self.frontier);
                    tracing::debug!(
                        "{}: {} references, {} new",
                        url,
                        references.len(),
                        admitted.len()
                    );
                    self.hints.extend(admitted);
                }
                Err(e) => tracing::debug!("Skipping extraction for {}: {}", url, e),
            }
        }

        tracing::debug!("Resolved {} ({}, {})", url, status, resolved.source.as_str());
        self.table.insert(FetchedResource {
            url,
            bytes: resolved.body,
            content_type: resolved.content_type,
            kind,
            local_path: path,
            status,
            source: Some(resolved.source),
            timestamp: resolved.timestamp,
        });
    }

    /// Canonical live URL the archive ended up serving
    fn redirect_target(&self, resolved: &Resolved) -> Option<CanonicalUrl> {
        let canonicalizer = self.discovery.canonicalizer();
        let live =
            strip_archive_prefix(resolved.final_url.as_str(), canonicalizer.archive_hosts())?;
        canonicalizer.canonicalize(&live, None).ok()
    }

    /// Runs the whole reconstruction: crawl, rewrite, write
    ///
    /// A cancelled crawl still writes the resources fetched so far.
    pub async fn run(mut self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let fingerprint = compute_config_hash(&self.config);
        tracing::info!("Config fingerprint: {}", fingerprint);

        let cancelled = self.crawl().await?;
        let unvisited = self.frontier.drain_pending().len();

        let mut summary = RunSummary::from_table(&self.table);
        summary.visited = self.frontier.iterations();
        summary.unvisited = unvisited;
        summary.cancelled = cancelled;
        summary.fingerprint = fingerprint;

        self.write_output(&mut summary).await;

        summary.elapsed = start_time.elapsed();
        Ok(summary)
    }

    /// Rewrites every written resource and stores it below the output root
    async fn write_output(&self, summary: &mut RunSummary) {
        let writer = OutputWriter::new(&self.config.output_dir);
        let rewriter = Rewriter::new(&self.config, self.discovery.canonicalizer(), &self.table);
        tracing::info!("Writing offline tree to {}", writer.root().display());

        let mut files: Vec<(&Path, Vec<u8>)> = Vec::new();
        for resource in self.table.iter().filter(|r| r.status.is_success()) {
            let bytes = rewriter.rewrite(resource);
            files.push((resource.local_path.as_path(), self.optimizers.process(resource, bytes)));
        }
        let stubs = rewriter.redirect_stubs();
        files.extend(stubs.iter().map(|(path, bytes)| (path.as_path(), bytes.clone())));

        for (path, bytes) in files {
            match writer.write(path, &bytes).await {
                Ok(written) => {
                    summary.written += 1;
                    summary.bytes_written += written;
                }
                Err(e) => {
                    tracing::warn!("Failed to write {}: {}", path.display(), e);
                    summary.write_failures += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::crawler::mock::MockFetcher;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const ENTRY: &str = "https://web.archive.org/web/20200101000000/https://example.com/";

    fn config(output: &Path, extra: &[(&str, &str)]) -> Config {
        let mut settings = Settings::new();
        settings.set("WAYBACK_URL", ENTRY);
        settings.set("OUTPUT_DIR", output.to_string_lossy().to_string());
        for (key, value) in extra {
            settings.set(key, *value);
        }
        settings.resolve().unwrap()
    }

    fn archived(flag: &str, live: &str) -> String {
        format!("https://web.archive.org/web/20200101000000{}/{}", flag, live)
    }

    /// Every file below `root` with its text
    fn written_files(root: &Path) -> Vec<(PathBuf, String)> {
        let mut files = Vec::new();
        let mut dirs = vec![root.to_path_buf()];
        while let Some(dir) = dirs.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    dirs.push(path);
                } else {
                    let bytes = std::fs::read(&path).unwrap();
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    files.push((path.strip_prefix(root).unwrap().to_path_buf(), text));
                }
            }
        }
        files.sort();
        files
    }

    fn read(dir: &TempDir, relative: &str) -> String {
        std::fs::read_to_string(dir.path().join(relative)).unwrap()
    }

    fn url(coordinator: &Coordinator, raw: &str) -> CanonicalUrl {
        coordinator.discovery.canonicalizer().canonicalize(raw, None).unwrap()
    }

    /// A → B, A → style sheet, style sheet → font
    fn two_page_site() -> MockFetcher {
        MockFetcher::new()
            .with(
                ENTRY,
                "text/html",
                br#"<html><head><link rel="stylesheet" href="/css/site.css"></head>
                    <body><a href="/b">B</a></body></html>"#,
            )
            .with(
                &archived("", "https://example.com/b"),
                "text/html",
                br#"<html><body><a href="/">Home</a></body></html>"#,
            )
            .with(
                &archived("cs_", "https://example.com/css/site.css"),
                "text/css",
                b"@font-face { font-family: S; src: url(../f/s.woff2) format('woff2'); }",
            )
            .with(
                &archived("", "https://example.com/f/s.woff2"),
                "font/woff2",
                b"wOF2\x00\x01\x00\x00",
            )
    }

    #[tokio::test]
    async fn test_two_page_fixture() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(two_page_site());
        let mut coordinator =
            Coordinator::with_fetcher(config(dir.path(), &[]), fetcher.clone()).unwrap();

        let cancelled = coordinator.crawl().await.unwrap();

        assert!(!cancelled);
        assert_eq!(coordinator.table().len(), 4);
        assert_eq!(coordinator.frontier().iterations(), 4);
        assert_eq!(coordinator.frontier().pending_count(), 0);
        assert_eq!(fetcher.requests().len(), 4);
        assert_eq!(coordinator.table().count_status(ResourceStatus::Success), 4);

        let font = url(&coordinator, "https://example.com/f/s.woff2");
        assert_eq!(coordinator.table().get(&font).unwrap().kind, ContentKind::Font);
    }

    #[tokio::test]
    async fn test_nearby_timestamp_recovery() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new()
            .with(ENTRY, "text/html", br#"<img src="/img/a.png">"#)
            .with(
                "https://web.archive.org/web/20200101010000im_/https://example.com/img/a.png",
                "image/png",
                b"\x89PNG\r\n\x1a\n\x00\x00",
            );
        let mut coordinator =
            Coordinator::with_fetcher(config(dir.path(), &[]), Arc::new(fetcher)).unwrap();

        coordinator.crawl().await.unwrap();

        let image = url(&coordinator, "https://example.com/img/a.png");
        let resource = coordinator.table().get(&image).unwrap();
        assert_eq!(resource.status, ResourceStatus::Success);
        assert_eq!(resource.source, Some(ResolutionSource::Nearby));
        assert_eq!(resource.timestamp.unwrap().to_string(), "20200101010000");
    }

    #[tokio::test]
    async fn test_corrupted_asset_is_pruned() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new()
            .with(
                ENTRY,
                "text/html",
                br#"<html><head><style>@font-face{font-family:X;src:url(/f/x.woff2)}</style></head><body>Hi</body></html>"#,
            )
            .with(
                &archived("", "https://example.com/f/x.woff2"),
                "text/html",
                b"<!DOCTYPE html><html><body>Not found</body></html>",
            );
        let coordinator =
            Coordinator::with_fetcher(config(dir.path(), &[]), Arc::new(fetcher)).unwrap();

        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.corrupted, 1);
        assert_eq!(summary.written, 1);
        assert!(!dir.path().join("f/x.woff2").exists());
        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(!index.contains("x.woff2"), "{}", index);
    }

    #[tokio::test]
    async fn test_redirect_becomes_alias() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            MockFetcher::new()
                .with(ENTRY, "text/html", br#"<a href="/old">Old</a> <a href="/new">New</a>"#)
                .with_redirect(
                    &archived("", "https://example.com/old"),
                    &archived("", "https://example.com/new"),
                    "text/html",
                    b"<p>new</p>",
                ),
        );
        let mut coordinator = Coordinator::with_fetcher(
            config(dir.path(), &[("MAX_CONCURRENT_FETCHES", "1")]),
            fetcher.clone(),
        )
        .unwrap();

        coordinator.crawl().await.unwrap();

        let old = url(&coordinator, "https://example.com/old");
        let new = url(&coordinator, "https://example.com/new");
        assert_eq!(coordinator.table().alias_target(&old), Some(&new));
        assert!(coordinator.table().get(&new).unwrap().status.is_success());
        assert!(coordinator.table().get(&old).is_none());
        assert!(!fetcher.requests().contains(&archived("", "https://example.com/new")));
    }

    #[tokio::test]
    async fn test_unreachable_entry_point() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = Coordinator::with_fetcher(
            config(dir.path(), &[("FALLBACK_MAX_PROBES", "2")]),
            Arc::new(MockFetcher::new()),
        )
        .unwrap();

        let err = coordinator.crawl().await.unwrap_err();
        assert!(matches!(err, ArchiveError::EntryPointUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_max_files_leaves_rest_unvisited() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::with_fetcher(
            config(dir.path(), &[("MAX_FILES", "2"), ("MAX_CONCURRENT_FETCHES", "1")]),
            Arc::new(two_page_site()),
        )
        .unwrap();

        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.visited, 2);
        assert!(summary.unvisited > 0);
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn test_output_has_no_pruned_references() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new()
            .with(
                ENTRY,
                "text/html",
                br#"<html><head><link rel="stylesheet" href="/css/site.css">
                    <script src="/js/app.js"></script></head>
                    <body><img src="/img/gone.png" alt="x"><a href="/img/gone.png">Picture</a>
                    <script>var pic = new Image(); pic.src = "/img/lost.gif";</script></body></html>"#,
            )
            .with(
                &archived("cs_", "https://example.com/css/site.css"),
                "text/css",
                b"@font-face{font-family:X;src:url(/f/broken.woff2)} body{background:url(/img/missing-bg.png)}",
            )
            .with(
                &archived("js_", "https://example.com/js/app.js"),
                "application/javascript",
                br#"fetch("/data/absent.json"); el.src = "/img/logo.png";"#,
            )
            .with(
                &archived("im_", "https://example.com/img/logo.png"),
                "image/png",
                b"\x89PNG\r\n\x1a\n\x00\x00",
            )
            .with(
                &archived("", "https://example.com/f/broken.woff2"),
                "text/html",
                b"<!DOCTYPE html><html><body>Not found</body></html>",
            );
        let coordinator = Coordinator::with_fetcher(
            config(dir.path(), &[("FALLBACK_MAX_PROBES", "2")]),
            Arc::new(fetcher),
        )
        .unwrap();

        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.downloaded, 4);
        assert_eq!(summary.missing, 4);
        assert_eq!(summary.corrupted, 1);

        let pruned = ["gone.png", "missing-bg.png", "lost.gif", "absent.json", "broken.woff2"];
        let files = written_files(dir.path());
        assert_eq!(files.len(), 4, "{:?}", files);
        for (path, text) in &files {
            for name in pruned {
                assert!(!text.contains(name), "{} still in {}: {}", name, path.display(), text);
            }
        }

        assert!(read(&dir, "js/app.js").contains(r#"el.src = "../img/logo.png";"#));
        assert!(read(&dir, "index.html").contains(r#"pic.src = "";"#));
        assert!(read(&dir, "index.html").contains("<a>Picture</a>"));
    }

    #[tokio::test]
    async fn test_kept_redirection_writes_stub() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new()
            .with(ENTRY, "text/html", br#"<a href="/old">Old</a>"#)
            .with_redirect(
                &archived("", "https://example.com/old"),
                &archived("", "https://example.com/new"),
                "text/html",
                b"<p>new</p>",
            );
        let coordinator = Coordinator::with_fetcher(
            config(dir.path(), &[("KEEP_REDIRECTIONS", "true")]),
            Arc::new(fetcher),
        )
        .unwrap();

        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.redirected, 1);
        assert_eq!(summary.written, 3);
        assert!(read(&dir, "index.html").contains(r#"href="old.html""#));
        assert!(read(&dir, "old.html").contains("url=new.html"));
        assert!(read(&dir, "new.html").contains("<p>new</p>"));
    }

    #[tokio::test]
    async fn test_collapsed_redirection_has_no_stub() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new()
            .with(ENTRY, "text/html", br#"<a href="/old">Old</a>"#)
            .with_redirect(
                &archived("", "https://example.com/old"),
                &archived("", "https://example.com/new"),
                "text/html",
                b"<p>new</p>",
            );
        let coordinator =
            Coordinator::with_fetcher(config(dir.path(), &[]), Arc::new(fetcher)).unwrap();

        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.written, 2);
        assert!(read(&dir, "index.html").contains(r#"href="new.html""#));
        assert!(!dir.path().join("old.html").exists());
    }

    #[tokio::test]
    async fn test_absolute_internal_links() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::with_fetcher(
            config(dir.path(), &[("MAKE_INTERNAL_LINKS_RELATIVE", "false")]),
            Arc::new(two_page_site()),
        )
        .unwrap();

        let summary = coordinator.run().await.unwrap();
        assert_eq!(summary.written, 4);

        let index = read(&dir, "index.html");
        assert!(index.contains(r#"href="https://example.com/css/site.css""#), "{}", index);
        assert!(index.contains(r#"href="https://example.com/b""#), "{}", index);
        assert!(read(&dir, "b.html").contains(r#"href="https://example.com/""#));
        assert!(read(&dir, "css/site.css").contains("url(https://example.com/f/s.woff2)"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let coordinator =
            Coordinator::with_fetcher(config(dir.path(), &[]), Arc::new(two_page_site())).unwrap();
        coordinator.cancellation_token().cancel();

        let summary = coordinator.run().await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.visited, 0);
        assert_eq!(summary.unvisited, 1);
        assert_eq!(summary.written, 0);
    }
}
