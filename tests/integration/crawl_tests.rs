//! Integration tests for the reconstruction pipeline
//!
//! These tests use wiremock to stand in for the archive mirror and run the
//! full crawl, rewrite and write cycle into a temporary directory.

use std::path::Path;
use tempfile::TempDir;
use wayback_archive::config::{Config, Settings};
use wayback_archive::crawler::Coordinator;
use wayback_archive::{ArchiveError, ConfigError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SNAPSHOT: &str = "20200101000000";

/// Archive path of a live URL at the snapshot timestamp
fn archived(flag: &str, live: &str) -> String {
    format!("/web/{}{}/{}", SNAPSHOT, flag, live)
}

/// Creates a test configuration for a snapshot served by `server`
fn create_test_config(server: &MockServer, output: &Path, extra: &[(&str, &str)]) -> Config {
    let mut settings = Settings::new();
    settings.set(
        "WAYBACK_URL",
        format!("{}/web/{}/https://example.com/", server.uri(), SNAPSHOT),
    );
    settings.set("OUTPUT_DIR", output.to_string_lossy().to_string());
    settings.set("REQUEST_TIMEOUT_SECS", "5");
    settings.set("FALLBACK_MAX_PROBES", "4");
    for (key, value) in extra {
        settings.set(key, *value);
    }
    settings.resolve().expect("Test configuration should be valid")
}

async fn serve(server: &MockServer, archive_path: &str, mime: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(archive_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), mime))
        .mount(server)
        .await;
}

/// Entry page → second page and style sheet; style sheet → font
async fn mount_two_page_site(server: &MockServer) {
    serve(
        server,
        &archived("", "https://example.com/"),
        "text/html",
        br#"<!DOCTYPE html><html><head>
            <link rel="stylesheet" href="/web/20200101000000cs_/https://example.com/css/site.css">
            </head><body><a href="/web/20200101000000/https://example.com/b">Second page</a></body></html>"#,
    )
    .await;
    serve(
        server,
        &archived("", "https://example.com/b"),
        "text/html",
        br#"<html><body><a href="/">Home</a></body></html>"#,
    )
    .await;
    serve(
        server,
        &archived("cs_", "https://example.com/css/site.css"),
        "text/css",
        b"@font-face { font-family: Site; src: url(../fonts/site.woff2) format('woff2'); }",
    )
    .await;
}

fn read(dir: &TempDir, relative: &str) -> String {
    std::fs::read_to_string(dir.path().join(relative))
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative, e))
}

#[tokio::test]
async fn test_full_reconstruction() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_two_page_site(&server).await;
    serve(
        &server,
        &archived("", "https://example.com/fonts/site.woff2"),
        "font/woff2",
        b"wOF2\x00\x01\x00\x00font-data",
    )
    .await;

    let config = create_test_config(&server, dir.path(), &[]);
    let coordinator = Coordinator::new(config).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.visited, 4);
    assert_eq!(summary.downloaded, 4);
    assert_eq!(summary.missing, 0);
    assert_eq!(summary.written, 4);
    assert!(!summary.cancelled);
    assert_eq!(summary.fingerprint.len(), 64);

    let index = read(&dir, "index.html");
    assert!(index.contains(r#"href="css/site.css""#), "{}", index);
    assert!(index.contains(r#"href="b.html""#), "{}", index);
    assert!(!index.contains("/web/"));

    let page = read(&dir, "b.html");
    assert!(page.contains(r#"href="index.html""#), "{}", page);

    let css = read(&dir, "css/site.css");
    assert!(css.contains("url(../fonts/site.woff2)"), "{}", css);
    assert!(dir.path().join("fonts/site.woff2").exists());
}

#[tokio::test]
async fn test_nearby_snapshot_fallback() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    serve(
        &server,
        &archived("", "https://example.com/"),
        "text/html",
        br#"<html><body><img src="/img/logo.png"></body></html>"#,
    )
    .await;
    // Only the snapshot one hour later has the image
    serve(
        &server,
        "/web/20200101010000im_/https://example.com/img/logo.png",
        "image/png",
        b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR",
    )
    .await;

    let config = create_test_config(&server, dir.path(), &[]);
    let summary = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.nearby_hits, 1);
    assert_eq!(summary.missing, 0);
    assert!(dir.path().join("img/logo.png").exists());
    assert!(read(&dir, "index.html").contains(r#"src="img/logo.png""#));
}

#[tokio::test]
async fn test_corrupted_font_is_pruned() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_two_page_site(&server).await;
    // The archive answers the font request with an error page
    serve(
        &server,
        &archived("", "https://example.com/fonts/site.woff2"),
        "text/html",
        b"<!DOCTYPE html><html><body>Hrm. The Wayback Machine has not archived that URL.</body></html>",
    )
    .await;

    let config = create_test_config(&server, dir.path(), &[]);
    let summary = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.corrupted, 1);
    assert_eq!(summary.downloaded, 3);
    assert!(!dir.path().join("fonts/site.woff2").exists());

    let css = read(&dir, "css/site.css");
    assert!(!css.contains("site.woff2"), "{}", css);
    assert!(!css.contains("@font-face"), "{}", css);
}

#[tokio::test]
async fn test_missing_image_is_pruned() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    serve(
        &server,
        &archived("", "https://example.com/"),
        "text/html",
        br#"<html><body><img src="/img/missing.png" alt="gone"><p>Welcome</p></body></html>"#,
    )
    .await;

    let config = create_test_config(&server, dir.path(), &[("CDN_FALLBACK", "false")]);
    let summary = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.missing, 1);
    let index = read(&dir, "index.html");
    assert!(!index.contains("missing.png"), "{}", index);
    assert!(index.contains("<p>Welcome</p>"));
}

#[tokio::test]
async fn test_redirect_stub_is_kept() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    serve(
        &server,
        &archived("", "https://example.com/"),
        "text/html",
        br#"<html><body><a href="/old-page">Moved</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path(archived("", "https://example.com/old-page")))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/web/20200101000000/https://example.com/new-page"),
        )
        .mount(&server)
        .await;
    serve(
        &server,
        &archived("", "https://example.com/new-page"),
        "text/html",
        b"<html><body>New home</body></html>",
    )
    .await;

    let config = create_test_config(&server, dir.path(), &[("KEEP_REDIRECTIONS", "true")]);
    let summary = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.redirected, 1);
    assert!(read(&dir, "new-page.html").contains("New home"));
    assert!(read(&dir, "old-page.html").contains("url=new-page.html"));
    assert!(read(&dir, "index.html").contains(r#"href="old-page.html""#));
}

#[tokio::test]
async fn test_unreachable_entry_point() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let config = create_test_config(&server, dir.path(), &[("FALLBACK_MAX_PROBES", "1")]);
    let err = Coordinator::new(config).unwrap().run().await.unwrap_err();

    assert!(matches!(err, ArchiveError::EntryPointUnreachable { .. }));
}

#[test]
fn test_config_validation() {
    let base = |pairs: &[(&str, &str)]| {
        let mut settings = Settings::new();
        for (key, value) in pairs {
            settings.set(key, *value);
        }
        settings.resolve()
    };
    let url = "https://web.archive.org/web/20200101000000/https://example.com/";

    assert!(matches!(base(&[]), Err(ConfigError::MissingKey("WAYBACK_URL"))));
    assert!(matches!(
        base(&[
            ("WAYBACK_URL", url),
            ("REMOVE_EXTERNAL_LINKS_KEEP_ANCHORS", "true"),
            ("REMOVE_EXTERNAL_LINKS_REMOVE_ANCHORS", "true"),
        ]),
        Err(ConfigError::Conflict { .. })
    ));
    assert!(matches!(
        base(&[("WAYBACK_URL", url), ("MAX_FILES", "0")]),
        Err(ConfigError::Validation(_))
    ));
    assert!(matches!(
        base(&[("WAYBACK_URL", "https://example.com/no-snapshot")]),
        Err(ConfigError::InvalidUrl(_))
    ));
    assert!(base(&[("WAYBACK_URL", url)]).is_ok());
}
