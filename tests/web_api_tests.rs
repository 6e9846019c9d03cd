//! Integration tests for the StartDeck Web API.
//!
//! These tests require the `web` feature to be enabled:
//! ```bash
//! cargo test --features web web_api
//! ```

#![cfg(feature = "web")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use startdeck::db::Repository;
use startdeck::icons::sync::{FaviconFetcher, FetchFuture, IconSyncError};
use startdeck::icons::FaviconProvider;
use startdeck::web::{create_router, AppState};

mod fixtures;
use fixtures::{png_bytes, sample_snapshot};

/// Fetcher that serves a fixed PNG, or fails with HTTP 404.
struct StubFetcher {
    fail: bool,
    calls: AtomicUsize,
}

impl FaviconFetcher for StubFetcher {
    fn fetch<'a>(&'a self, _url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(IconSyncError::Status(404))
            } else {
                Ok(png_bytes())
            }
        })
    }
}

/// Creates a test AppState backed by an in-memory database.
fn create_test_state(fail_downloads: bool) -> (AppState, Arc<StubFetcher>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let repo = Repository::open_in_memory().expect("Failed to open database");
    let fetcher = Arc::new(StubFetcher {
        fail: fail_downloads,
        calls: AtomicUsize::new(0),
    });

    let state = AppState::new(
        repo,
        fetcher.clone(),
        temp_dir.path().join("icons"),
        "https://icons.example/{host}.png",
    );
    (state, fetcher, temp_dir)
}

/// Sends a request and returns the status and parsed JSON body.
async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = create_router(state.clone());

    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn seed(state: &AppState) {
    let (status, body) = send(state, "POST", "/api/import", Some(sample_snapshot())).await;
    assert_eq!(status, StatusCode::OK, "seed import failed: {body}");
}

fn site_ids(catalog: &Value) -> Vec<String> {
    catalog["sites"]
        .as_array()
        .unwrap()
        .iter()
        .map(|site| site["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Health and catalog
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (state, _, _temp) = create_test_state(false);
    let (status, body) = send(&state, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_empty_catalog_has_defaults() {
    let (state, _, _temp) = create_test_state(false);
    let (status, body) = send(&state, "GET", "/api/catalog", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sites"], json!([]));
    assert_eq!(body["layout"]["gridCols"], 4);
    assert_eq!(body["theme"], "auto");
}

#[tokio::test]
async fn test_import_then_read_catalog() {
    let (state, _, _temp) = create_test_state(false);
    let (status, report) = send(&state, "POST", "/api/import", Some(sample_snapshot())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["skippedFonts"], json!([]));
    assert!(report["applied"].as_array().unwrap().contains(&json!("sites")));

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(site_ids(&catalog), ["gh", "docs", "rd"]);
    assert_eq!(catalog["categoryColors"]["Dev"], "#112233");
    assert!(catalog["categoryColors"]["Fun"].is_string());
    assert_eq!(catalog["hiddenCategories"], json!(["Fun"]));
    assert_eq!(catalog["layout"]["gridCols"], 5);
    assert_eq!(catalog["config"]["siteTitle"], "My Deck");
    assert_eq!(catalog["theme"], "dark");
    assert_eq!(catalog["customFonts"][0]["id"], "inter");
    assert_eq!(catalog["sites"][1]["icon"], json!({ "type": "library", "key": "book" }));
}

#[tokio::test]
async fn test_import_is_replay_safe() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;
    let (_, first) = send(&state, "GET", "/api/catalog", None).await;

    seed(&state).await;
    let (_, second) = send(&state, "GET", "/api/catalog", None).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_import_bare_category_names_reorders() {
    let (state, _, _temp) = create_test_state(false);
    let names = |catalog: &Value| -> Vec<String> {
        catalog["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|category| category["name"].as_str().unwrap().to_string())
            .collect()
    };

    send(&state, "POST", "/api/import", Some(json!({ "categories": ["A", "B", "C"] }))).await;
    let (status, _) = send(&state, "POST", "/api/import", Some(json!({ "categories": ["C", "B", "A"] }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(names(&catalog), ["C", "B", "A"]);
    assert_eq!(catalog["categories"][0]["order"], 0);
    assert_eq!(catalog["categories"][2]["order"], 2);
}

#[tokio::test]
async fn test_partial_import_merges_layout() {
    let (state, _, _temp) = create_test_state(false);
    send(
        &state,
        "POST",
        "/api/import",
        Some(json!({ "layout": { "gridCols": 4, "cardHeight": 100 } })),
    )
    .await;
    seed(&state).await;

    let (status, report) = send(
        &state,
        "POST",
        "/api/import",
        Some(json!({ "layout": { "cardHeight": 120 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["applied"], json!(["layout"]));

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(catalog["layout"]["gridCols"], 5);
    assert_eq!(catalog["layout"]["cardHeight"], 120);
    assert_eq!(site_ids(&catalog).len(), 3);
}

#[tokio::test]
async fn test_invalid_import_changes_nothing() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/import",
        Some(json!({ "theme": "light", "sites": { "not": "an array" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid import");
    assert!(body["details"].as_str().unwrap().contains("sites"));

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(catalog["theme"], "dark");
}

#[tokio::test]
async fn test_import_skips_bad_fonts() {
    let (state, _, _temp) = create_test_state(false);
    let (status, report) = send(
        &state,
        "POST",
        "/api/import",
        Some(json!({
            "customFonts": [
                { "id": "ok", "name": "Ok", "family": "Ok", "url": "u" },
                { "id": "broken" },
                { "id": "blank", "name": "Blank", "family": "  ", "url": "u" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["skippedFonts"], json!(["broken", "blank"]));

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(catalog["customFonts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_export_suggests_filename() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;
    let (status, body) = send(&state, "GET", "/api/export", None).await;

    assert_eq!(status, StatusCode::OK);
    let filename = body["suggestedFilename"].as_str().unwrap();
    assert!(filename.starts_with("startdeck-backup-"));
    assert!(filename.ends_with(".json"));
    assert_eq!(site_ids(&body["catalog"]).len(), 3);
}

// ============================================================================
// Sites
// ============================================================================

#[tokio::test]
async fn test_put_site_creates_and_replaces() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;

    let (status, site) = send(
        &state,
        "PUT",
        "/api/sites/new",
        Some(json!({ "name": "Crates", "url": "https://crates.io", "category": "Dev" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(site["id"], "new");
    assert_eq!(site["order"], 3);

    let (status, site) = send(
        &state,
        "PUT",
        "/api/sites/gh",
        Some(json!({ "id": "ignored", "name": "GitHub!", "url": "https://github.com", "category": "Dev" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(site["id"], "gh");
    assert_eq!(site["order"], 0);

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(site_ids(&catalog), ["gh", "docs", "rd", "new"]);
    assert_eq!(catalog["sites"][0]["name"], "GitHub!");
}

#[tokio::test]
async fn test_put_site_unknown_category() {
    let (state, _, _temp) = create_test_state(false);
    let (status, body) = send(
        &state,
        "PUT",
        "/api/sites/x",
        Some(json!({ "name": "X", "url": "https://x.com", "category": "Nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("Nope"));
}

#[tokio::test]
async fn test_delete_site() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;

    let (status, _) = send(&state, "DELETE", "/api/sites/docs", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&state, "DELETE", "/api/sites/docs", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(site_ids(&catalog), ["gh", "rd"]);
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_put_category_latest_color_wins() {
    let (state, _, _temp) = create_test_state(false);

    let (status, category) =
        send(&state, "PUT", "/api/categories/Work", Some(json!({ "color": "#AA0000" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(category, json!({ "name": "Work", "order": 0 }));

    send(&state, "PUT", "/api/categories/Work", Some(json!({ "color": "#00BB00" }))).await;

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(catalog["categories"].as_array().unwrap().len(), 1);
    assert_eq!(catalog["categoryColors"]["Work"], "#00BB00");
}

#[tokio::test]
async fn test_put_category_hides_and_keeps_order() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;

    let (status, category) =
        send(&state, "PUT", "/api/categories/Dev", Some(json!({ "hidden": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(category["order"], 0);

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(catalog["hiddenCategories"], json!(["Dev", "Fun"]));
    assert_eq!(catalog["categoryColors"]["Dev"], "#112233");
}

#[tokio::test]
async fn test_put_category_rejects_reserved_name() {
    let (state, _, _temp) = create_test_state(false);
    let (status, _) = send(&state, "PUT", "/api/categories/All", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_category_cascade() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;

    let (status, body) = send(&state, "DELETE", "/api/categories/Dev?cascade=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Dev", "removedSites": 2 }));

    let (_, catalog) = send(&state, "GET", "/api/catalog", None).await;
    assert_eq!(site_ids(&catalog), ["rd"]);
    assert_eq!(catalog["categories"], json!([{ "name": "Fun", "order": 0 }]));

    let (status, _) = send(&state, "DELETE", "/api/categories/Dev?cascade=true", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_category_single_record() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;

    let (status, body) = send(&state, "DELETE", "/api/categories/Fun", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removedSites"], 0);

    let (status, _) = send(&state, "DELETE", "/api/categories/Missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Icons
// ============================================================================

#[tokio::test]
async fn test_icons_start_at_first_provider() {
    let (state, _, _temp) = create_test_state(false);
    seed(&state).await;

    let (status, body) = send(&state, "GET", "/api/icons", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["providers"][0]["name"], "google");
    assert_eq!(body["glyphs"]["gh"]["kind"], "image");
    assert_eq!(body["glyphs"]["gh"]["provider"], "google");
    assert_eq!(body["glyphs"]["docs"]["kind"], "library");
    assert_eq!(body["glyphs"]["docs"]["key"], "book");
}

#[tokio::test]
async fn test_icons_use_configured_providers() {
    let (state, _, _temp) = create_test_state(false);
    let state = state.with_providers(vec![FaviconProvider::new("local", "https://icons.local/{host}.ico")]);
    seed(&state).await;

    let (_, body) = send(&state, "GET", "/api/icons", None).await;
    assert_eq!(body["providers"].as_array().unwrap().len(), 1);
    assert_eq!(body["glyphs"]["gh"]["src"], "https://icons.local/github.com.ico");
    assert_eq!(body["glyphs"]["gh"]["provider"], "local");
}

#[tokio::test]
async fn test_sync_icon_stores_content_addressed_file() {
    let (state, fetcher, _temp) = create_test_state(false);
    seed(&state).await;

    let (status, body) = send(&state, "POST", "/api/icons/sync", Some(json!({ "siteId": "gh" }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["siteId"], "gh");
    assert_eq!(body["hostname"], "github.com");

    let asset = body["asset"].as_str().unwrap();
    assert!(asset.ends_with(".png"));
    assert_eq!(asset.len(), 64 + ".png".len());
    assert!(state.icon_dir().join(asset).exists());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sync_icon_unknown_site() {
    let (state, fetcher, _temp) = create_test_state(false);
    let (status, _) = send(&state, "POST", "/api/icons/sync", Some(json!({ "siteId": "nope" }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sync_icon_invalid_url() {
    let (state, fetcher, _temp) = create_test_state(false);
    seed(&state).await;
    send(
        &state,
        "PUT",
        "/api/sites/mail",
        Some(json!({ "name": "Mail", "url": "mailto:me@example.com", "category": "Dev" })),
    )
    .await;

    let (status, _) = send(&state, "POST", "/api/icons/sync", Some(json!({ "siteId": "mail" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sync_icon_download_failure() {
    let (state, _, _temp) = create_test_state(true);
    seed(&state).await;

    let (status, body) = send(&state, "POST", "/api/icons/sync", Some(json!({ "siteId": "gh" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["details"].as_str().unwrap().contains("404"));
}
