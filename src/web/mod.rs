//! Web API module for StartDeck.
//!
//! This module provides the REST API the dashboard frontend talks to. The
//! catalog lives in the relational store; every handler takes the
//! repository lock briefly and never holds it across an `.await`.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/catalog` - Full catalog snapshot
//! - `GET /api/export` - Snapshot plus a suggested backup file name
//! - `POST /api/import` - Validate and upsert a (partial) snapshot
//! - `GET /api/icons` - Provider chain and each site's initial glyph
//! - `POST /api/icons/sync` - Download and cache a site's favicon
//! - `PUT /api/sites/{id}` - Create or replace a site
//! - `DELETE /api/sites/{id}` - Delete a site
//! - `PUT /api/categories/{name}` - Create or update a category
//! - `DELETE /api/categories/{name}` - Delete a category (`?cascade=true`
//!   deletes its sites too)

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db::Repository;
use crate::error::CatalogError;
use crate::icons::sync::{sync_icon, FaviconFetcher, HttpFaviconFetcher, IconSyncError};
use crate::icons::{FaviconProvider, Glyph, IconCursorTable, IconResolver};
use crate::models::{CatalogSnapshot, Category, RgbColor, Site, SiteId};
use crate::services::import::{ImportReconciler, ImportReport};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the web API.
#[derive(Clone)]
pub struct AppState {
    /// Relational store, shared by every handler
    repo: Arc<Mutex<Repository>>,
    /// Favicon downloader
    fetcher: Arc<dyn FaviconFetcher>,
    /// Directory downloaded favicons are stored in
    icon_dir: PathBuf,
    /// Provider template used by the icon-sync endpoint
    sync_provider: String,
    /// Resolver over the configured favicon providers
    resolver: Arc<IconResolver>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        repo: Repository,
        fetcher: Arc<dyn FaviconFetcher>,
        icon_dir: PathBuf,
        sync_provider: impl Into<String>,
    ) -> Self {
        Self {
            repo: Arc::new(Mutex::new(repo)),
            fetcher,
            icon_dir,
            sync_provider: sync_provider.into(),
            resolver: Arc::new(IconResolver::default()),
        }
    }

    /// Replaces the favicon provider chain used to resolve automatic icons.
    #[must_use]
    pub fn with_providers(mut self, providers: Vec<FaviconProvider>) -> Self {
        self.resolver = Arc::new(IconResolver::new(providers));
        self
    }

    /// Returns the icon cache directory.
    #[must_use]
    pub fn icon_dir(&self) -> &FsPath {
        &self.icon_dir
    }

    fn repo(&self) -> Result<MutexGuard<'_, Repository>, (StatusCode, Json<ApiError>)> {
        self.repo.lock().map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("Catalog store unavailable")),
            )
        })
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Current health status (e.g., "healthy").
    pub status: String,
    /// Application version.
    pub version: String,
}

/// Catalog export response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    /// The full catalog.
    pub catalog: CatalogSnapshot,
    /// Suggested filename for download.
    pub suggested_filename: String,
}

/// Body of `PUT /api/categories/{name}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryUpdate {
    /// New color; unchanged when absent.
    pub color: Option<RgbColor>,
    /// New visibility; unchanged when absent.
    pub hidden: Option<bool>,
    /// New position; unchanged (or appended, for a new category) when absent.
    pub order: Option<i64>,
}

/// Query parameters for category deletion.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteCategoryQuery {
    /// Delete the category's sites in the same transaction.
    pub cascade: bool,
}

/// Category deletion response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCategoryResponse {
    /// The deleted category.
    pub name: String,
    /// Number of sites deleted with it.
    pub removed_sites: usize,
}

/// Body of `POST /api/icons/sync`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncIconRequest {
    /// Site whose favicon should be downloaded.
    pub site_id: SiteId,
}

/// Icon sync response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncIconResponse {
    /// The site.
    pub site_id: SiteId,
    /// Hostname the icon was fetched for.
    pub hostname: String,
    /// Cache file name (`<sha256>.<ext>`).
    pub asset: String,
}

/// Icon overview response.
#[derive(Debug, Serialize)]
pub struct IconsResponse {
    /// Providers tried in order for automatic icons.
    pub providers: Vec<FaviconProvider>,
    /// Glyph each site starts with, by site id.
    pub glyphs: BTreeMap<SiteId, Glyph>,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error message.
    pub error: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Creates an API error with details.
    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Maps a catalog error to a response.
fn catalog_failure(context: &str, err: &CatalogError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        CatalogError::UnknownCategory(_)
        | CatalogError::InvalidCategoryName { .. }
        | CatalogError::InvalidSnapshot(_)
        | CatalogError::Json(_) => StatusCode::BAD_REQUEST,
        CatalogError::CategoryNotFound(_) | CatalogError::SiteNotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Database(_)
        | CatalogError::Io(_)
        | CatalogError::CascadeIncomplete { .. }
        | CatalogError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        warn!(error = %err, "{context}");
    }
    (status, Json(ApiError::with_details(context, err.to_string())))
}

/// Maps an icon sync error to a response.
fn sync_failure(err: &IconSyncError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        IconSyncError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        IconSyncError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        IconSyncError::Request(_)
        | IconSyncError::Status(_)
        | IconSyncError::Empty
        | IconSyncError::TooLarge { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ApiError::with_details("Icon sync failed", err.to_string())))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Reads the stored catalog and repairs it the way a client hydration would.
fn load_catalog(state: &AppState) -> ApiResult<CatalogSnapshot> {
    let snapshot = state
        .repo()?
        .load_snapshot()
        .map_err(|e| catalog_failure("Failed to load catalog", &e))?;
    Ok(CatalogStore::from_snapshot(snapshot).snapshot())
}

/// GET /api/catalog - Full catalog snapshot.
async fn get_catalog(State(state): State<AppState>) -> ApiResult<Json<CatalogSnapshot>> {
    load_catalog(&state).map(Json)
}

/// GET /api/export - Catalog snapshot with a dated backup file name.
async fn export_catalog(State(state): State<AppState>) -> ApiResult<Json<ExportResponse>> {
    let catalog = load_catalog(&state)?;
    let suggested_filename = format!(
        "startdeck-backup-{}.json",
        chrono::Local::now().format("%Y-%m-%d")
    );

    Ok(Json(ExportResponse {
        catalog,
        suggested_filename,
    }))
}

/// POST /api/import - Validate a snapshot and upsert it as one transaction.
async fn import_catalog(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<ImportReport>> {
    let payload = ImportReconciler::validate(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::with_details("Invalid import", e.to_string())),
        )
    })?;

    let report = state
        .repo()?
        .import(&payload)
        .map_err(|e| catalog_failure("Failed to import catalog", &e))?;

    Ok(Json(report))
}

/// PUT /api/sites/{id} - Create or replace a site.
///
/// The path id wins over any id in the body. A new site is appended after
/// every existing one; a replaced site keeps its position unless the body
/// carries a non-zero order.
async fn put_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut site): Json<Site>,
) -> ApiResult<Json<Site>> {
    let repo = state.repo()?;
    site.id = SiteId::new(id);

    let existing = repo
        .get_site(&site.id)
        .map_err(|e| catalog_failure("Failed to read site", &e))?;
    if site.order == 0 {
        site.order = match existing {
            Some(existing) => existing.order,
            None => repo
                .next_site_order()
                .map_err(|e| catalog_failure("Failed to read site order", &e))?,
        };
    }

    repo.upsert_site(&site)
        .map_err(|e| catalog_failure("Failed to save site", &e))?;
    Ok(Json(site))
}

/// DELETE /api/sites/{id} - Delete a single site.
async fn delete_site(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = SiteId::new(id);
    let deleted = state
        .repo()?
        .delete_site(&id)
        .map_err(|e| catalog_failure("Failed to delete site", &e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(catalog_failure("Site not found", &CatalogError::SiteNotFound(id)))
    }
}

/// PUT /api/categories/{name} - Create or update a category.
async fn put_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(update): Json<CategoryUpdate>,
) -> ApiResult<Json<Category>> {
    let name = Category::validate_name(&name).map_err(|e| catalog_failure("Invalid category", &e))?;
    let repo = state.repo()?;

    let existing_order = repo
        .list_categories()
        .map_err(|e| catalog_failure("Failed to read categories", &e))?
        .into_iter()
        .find(|row| row.category.name == name)
        .map(|row| row.category.order);
    let order = match update.order.or(existing_order) {
        Some(order) => order,
        None => repo
            .next_category_order()
            .map_err(|e| catalog_failure("Failed to read category order", &e))?,
    };

    let category = Category { name, order };
    repo.upsert_category(&category, update.color, update.hidden)
        .map_err(|e| catalog_failure("Failed to save category", &e))?;
    Ok(Json(category))
}

/// DELETE /api/categories/{name} - Delete a category.
///
/// Without `cascade` only the category row goes; with `cascade=true` its
/// sites are deleted in the same transaction.
async fn delete_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DeleteCategoryQuery>,
) -> ApiResult<Json<DeleteCategoryResponse>> {
    let mut repo = state.repo()?;

    let removed_sites = if query.cascade {
        repo.delete_category_cascade(&name)
            .map_err(|e| catalog_failure("Failed to delete category", &e))?
    } else {
        let deleted = repo
            .delete_category(&name)
            .map_err(|e| catalog_failure("Failed to delete category", &e))?;
        if !deleted {
            return Err(catalog_failure(
                "Category not found",
                &CatalogError::CategoryNotFound(name),
            ));
        }
        0
    };

    Ok(Json(DeleteCategoryResponse {
        name,
        removed_sites,
    }))
}

/// GET /api/icons - The provider chain and every site's first glyph.
///
/// Cursors are not kept server side; each site resolves from the start of
/// the chain and the client advances on load failures.
async fn get_icons(State(state): State<AppState>) -> ApiResult<Json<IconsResponse>> {
    let sites = state
        .repo()?
        .list_sites()
        .map_err(|e| catalog_failure("Failed to read sites", &e))?;

    let mut cursors = IconCursorTable::new();
    let glyphs = sites
        .iter()
        .map(|site| (site.id.clone(), state.resolver.resolve(site, &mut cursors)))
        .collect();

    Ok(Json(IconsResponse {
        providers: state.resolver.providers().to_vec(),
        glyphs,
    }))
}

/// POST /api/icons/sync - Download a site's favicon into the icon cache.
async fn sync_icons(
    State(state): State<AppState>,
    Json(request): Json<SyncIconRequest>,
) -> ApiResult<Json<SyncIconResponse>> {
    let site_url = {
        let repo = state.repo()?;
        let site = repo
            .get_site(&request.site_id)
            .map_err(|e| catalog_failure("Failed to read site", &e))?
            .ok_or_else(|| {
                catalog_failure(
                    "Site not found",
                    &CatalogError::SiteNotFound(request.site_id.clone()),
                )
            })?;
        site.url
    };
    let stored = sync_icon(
        state.fetcher.as_ref(),
        &state.sync_provider,
        &site_url,
        &state.icon_dir,
    )
    .await
    .map_err(|e| {
        warn!(site = %request.site_id, error = %e, "Icon sync failed");
        sync_failure(&e)
    })?;

    state
        .repo()?
        .record_icon(&stored.hostname, &stored.asset)
        .map_err(|e| catalog_failure("Failed to record icon", &e))?;

    Ok(Json(SyncIconResponse {
        site_id: request.site_id,
        hostname: stored.hostname,
        asset: stored.asset,
    }))
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    // The server runs next to the frontend on the user's machine.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Whole-catalog endpoints
        .route("/api/catalog", get(get_catalog))
        .route("/api/export", get(export_catalog))
        .route("/api/import", post(import_catalog))
        // Record endpoints
        .route("/api/sites/{id}", put(put_site).delete(delete_site))
        .route(
            "/api/categories/{name}",
            put(put_category).delete(delete_category),
        )
        // Icons
        .route("/api/icons", get(get_icons))
        .route("/api/icons/sync", post(sync_icons))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the web server.
///
/// # Arguments
///
/// * `config` - Application configuration
/// * `addr` - Socket address to bind to
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the server fails
/// to start.
pub async fn run_server(config: Config, addr: SocketAddr) -> anyhow::Result<()> {
    let database = config.paths.database()?;
    let repo = Repository::open(&database)?;
    let fetcher = HttpFaviconFetcher::new(config.icons.timeout())?;
    let state = AppState::new(
        repo,
        Arc::new(fetcher),
        config.paths.icon_cache()?,
        config.icons.sync_provider.clone(),
    )
    .with_providers(config.icons.providers.clone());
    let app = create_router(state);

    info!(database = %database.display(), "Starting StartDeck web server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_failure_status() {
        let (status, _) = catalog_failure("x", &CatalogError::UnknownCategory("Dev".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = catalog_failure("x", &CatalogError::SiteNotFound(SiteId::new("gh")));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, Json(body)) = catalog_failure("x", &CatalogError::Other("disk".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.details.as_deref(), Some("disk"));
    }

    #[test]
    fn test_sync_failure_status() {
        let (status, _) = sync_failure(&IconSyncError::InvalidUrl(String::new()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = sync_failure(&IconSyncError::Status(404));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = sync_failure(&IconSyncError::Empty);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_api_error_omits_missing_details() {
        let json = serde_json::to_value(ApiError::new("boom")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "boom" }));
    }
}
