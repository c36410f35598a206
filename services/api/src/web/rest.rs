//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::session::SessionIdentity;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use elice_core::domain::{NewSavedItem, SavedItem, VideoResult};
use elice_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};

/// Query used when the client sends none (kept from the original frontend).
const DEFAULT_SEARCH_QUERY: &str = "C++ programming";

/// Single-page result limit for the video search proxy.
const SEARCH_MAX_RESULTS: u32 = 20;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        get_session_handler,
        list_saved_handler,
        add_saved_handler,
        delete_saved_handler,
        list_progress_handler,
        upsert_progress_handler,
        search_videos_handler,
    ),
    components(schemas(
        HealthResponse,
        SessionResponse,
        SavedItemPayload,
        SavedListResponse,
        AddSavedRequest,
        OkResponse,
        ProgressEntry,
        ProgressListResponse,
        UpsertProgressRequest,
        VideoPayload,
        SearchResponse,
    )),
    tags(
        (name = "Elice Learning Platform API", description = "Anonymous per-browser sessions, saved resources, reading progress and video search.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    /// The id the request arrived with; null on first contact, when the
    /// freshly minted id travels only on the Set-Cookie header.
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// A saved item as sent to the frontend. `id` carries the external resource
/// id, not the numeric row id.
#[derive(Serialize, ToSchema)]
pub struct SavedItemPayload {
    id: String,
    title: String,
    author: Option<String>,
    year: Option<String>,
    source: String,
    url: Option<String>,
}

impl SavedItemPayload {
    fn from_domain(item: SavedItem) -> Self {
        Self {
            id: item.resource_id,
            title: item.title,
            author: item.author,
            year: item.year,
            source: item.source,
            url: item.url,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SavedListResponse {
    items: Vec<SavedItemPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddSavedRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    /// Accepted as either a string or a bare number; stored as text.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    year: Option<Value>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct OkResponse {
    ok: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressEntry {
    status: String,
    percent: f64,
    #[serde(rename = "updatedAt")]
    updated_at: String,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressListResponse {
    progress: BTreeMap<String, ProgressEntry>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpsertProgressRequest {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    percent: Option<f64>,
}

#[derive(Deserialize, IntoParams)]
pub struct SearchQuery {
    /// The text to search for.
    q: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct VideoPayload {
    id: String,
    title: String,
    description: String,
    thumbnail: String,
    channel: String,
    #[serde(rename = "publishedAt")]
    published_at: String,
    duration: String,
    url: String,
    source: String,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    items: Vec<VideoPayload>,
}

impl VideoPayload {
    fn from_domain(video: VideoResult) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            thumbnail: video.thumbnail,
            channel: video.channel,
            published_at: video.published_at,
            duration: video.duration,
            url: video.url,
            source: video.source,
        }
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a port failure onto the wire taxonomy: configuration and unexpected
/// failures become 500s, upstream failures keep the upstream status code.
fn port_error_response(err: PortError) -> (StatusCode, String) {
    match err {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Configuration(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        PortError::Upstream { status, message } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            message,
        ),
        PortError::Unexpected(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Returns the session id the request arrived with.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "The current session id, or null on first contact", body = SessionResponse))
)]
pub async fn get_session_handler(
    Extension(session): Extension<SessionIdentity>,
) -> Json<SessionResponse> {
    let user_id = if session.minted {
        None
    } else {
        Some(session.id)
    };
    Json(SessionResponse { user_id })
}

/// Lists the session's saved items in insertion order.
#[utoipa::path(
    get,
    path = "/api/saved",
    responses(
        (status = 200, description = "Saved items for this session", body = SavedListResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_saved_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionIdentity>,
) -> Result<Json<SavedListResponse>, (StatusCode, String)> {
    let items = state.db.list_saved_items(&session.id).await.map_err(|e| {
        error!("Failed to list saved items: {:?}", e);
        port_error_response(e)
    })?;

    Ok(Json(SavedListResponse {
        items: items.into_iter().map(SavedItemPayload::from_domain).collect(),
    }))
}

/// Saves a resource for the session. Adding an already-saved resource is a
/// silent no-op; the first write wins.
#[utoipa::path(
    post,
    path = "/api/saved",
    request_body = AddSavedRequest,
    responses(
        (status = 200, description = "Item saved (or already present)", body = OkResponse),
        (status = 400, description = "Missing id or title"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn add_saved_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionIdentity>,
    Json(req): Json<AddSavedRequest>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    let resource_id = req.id.filter(|v| !v.is_empty());
    let title = req.title.filter(|v| !v.is_empty());
    let (resource_id, title) = match (resource_id, title) {
        (Some(resource_id), Some(title)) => (resource_id, title),
        _ => return Err((StatusCode::BAD_REQUEST, "Missing id or title".to_string())),
    };

    let item = NewSavedItem {
        session_id: session.id,
        resource_id,
        title,
        author: req.author,
        year: req.year.as_ref().and_then(year_to_string),
        source: req
            .source
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "openlibrary".to_string()),
        url: req.url,
    };

    state.db.add_saved_item(item).await.map_err(|e| {
        error!("Failed to add saved item: {:?}", e);
        port_error_response(e)
    })?;

    Ok(Json(OkResponse { ok: true }))
}

fn year_to_string(year: &Value) -> Option<String> {
    match year {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Removes a saved resource. Deleting a resource that was never saved is
/// not an error.
#[utoipa::path(
    delete,
    path = "/api/saved/{resource_id}",
    params(("resource_id" = String, Path, description = "External resource identifier")),
    responses(
        (status = 200, description = "Item removed (or was absent)", body = OkResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_saved_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionIdentity>,
    Path(resource_id): Path<String>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    state
        .db
        .delete_saved_item(&session.id, &resource_id)
        .await
        .map_err(|e| {
            error!("Failed to delete saved item: {:?}", e);
            port_error_response(e)
        })?;

    Ok(Json(OkResponse { ok: true }))
}

/// Returns the session's progress records, keyed by resource id.
#[utoipa::path(
    get,
    path = "/api/progress",
    responses(
        (status = 200, description = "Progress per tracked resource", body = ProgressListResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionIdentity>,
) -> Result<Json<ProgressListResponse>, (StatusCode, String)> {
    let rows = state.db.list_progress(&session.id).await.map_err(|e| {
        error!("Failed to list progress: {:?}", e);
        port_error_response(e)
    })?;

    let progress = rows
        .into_iter()
        .map(|row| {
            let entry = ProgressEntry {
                status: row.status,
                percent: row.percent,
                updated_at: row.updated_at.to_rfc3339(),
            };
            (row.resource_id, entry)
        })
        .collect();

    Ok(Json(ProgressListResponse { progress }))
}

/// Creates or overwrites the progress record for a resource. A missing or
/// empty status falls back to "in_progress" even when a prior call set
/// something else; percent is clamped into [0, 100].
#[utoipa::path(
    put,
    path = "/api/progress/{resource_id}",
    params(("resource_id" = String, Path, description = "External resource identifier")),
    request_body = UpsertProgressRequest,
    responses(
        (status = 200, description = "Progress stored", body = OkResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upsert_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionIdentity>,
    Path(resource_id): Path<String>,
    Json(req): Json<UpsertProgressRequest>,
) -> Result<Json<OkResponse>, (StatusCode, String)> {
    let status = req
        .status
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "in_progress".to_string());
    let percent = req.percent.unwrap_or(0.0).clamp(0.0, 100.0);

    state
        .db
        .upsert_progress(&session.id, &resource_id, &status, percent, Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to upsert progress: {:?}", e);
            port_error_response(e)
        })?;

    Ok(Json(OkResponse { ok: true }))
}

/// Proxies a search query to the external video platform.
#[utoipa::path(
    get,
    path = "/api/youtube/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching videos with duration metadata", body = SearchResponse),
        (status = 500, description = "Missing API credential or unexpected failure")
    )
)]
pub async fn search_videos_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let query = params
        .q
        .unwrap_or_else(|| DEFAULT_SEARCH_QUERY.to_string());

    let items = state
        .video_search
        .search(&query, SEARCH_MAX_RESULTS)
        .await
        .map_err(|e| {
            error!("YouTube search failed: {:?}", e);
            port_error_response(e)
        })?;

    Ok(Json(SearchResponse {
        items: items.into_iter().map(VideoPayload::from_domain).collect(),
    }))
}
