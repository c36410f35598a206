//! Integration tests for the Elice Learning Platform API
//!
//! Drives the full router (session middleware included) over an in-memory
//! SQLite database:
//! - Health check
//! - Session cookie minting and echo
//! - Saved items (idempotent add, validation, idempotent delete)
//! - Progress (clamping, overwrite semantics)
//! - Cross-session isolation
//! - Video search configuration failure

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use api_lib::adapters::{DbAdapter, YoutubeAdapter};
use api_lib::config::Config;
use api_lib::web::{self, state::AppState};

/// Test helper to build the application router over a fresh in-memory store.
async fn setup_test_app() -> axum::Router {
    // A single connection, so every statement sees the same in-memory
    // database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    let db_adapter = Arc::new(DbAdapter::new(pool));
    db_adapter
        .run_migrations()
        .await
        .expect("Failed to run migrations");

    let config = Arc::new(Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        log_level: tracing::Level::INFO,
        frontend_origin: "http://localhost:5173".to_string(),
        youtube_api_key: None,
    });

    let state = Arc::new(AppState {
        db: db_adapter,
        video_search: Arc::new(YoutubeAdapter::new(None)),
        config,
    });

    web::router(state)
}

/// Helper function to make one request against the router.
///
/// Returns the status, the response headers and the body parsed as JSON when
/// it is JSON (error responses are plain text).
async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Option<Value>) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    let request = if let Some(json_body) = body {
        request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap()
    } else {
        request.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_body = serde_json::from_slice(&bytes).ok();

    (status, headers, json_body)
}

/// Pulls the minted session id out of a `Set-Cookie` response header.
fn minted_session_id(headers: &HeaderMap) -> Option<String> {
    let set_cookie = headers.get(header::SET_COOKIE)?.to_str().ok()?;
    let value = set_cookie.split(';').next()?.strip_prefix("elice_session=")?;
    Some(value.to_string())
}

fn as_cookie(session_id: &str) -> String {
    format!("elice_session={}", session_id)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app().await;

    let (status, headers, body) =
        make_request(&app, Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["status"], "ok");

    // Even the health check passes through the session middleware.
    let id = minted_session_id(&headers).expect("Expected a Set-Cookie header");
    assert_eq!(id.len(), 16);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(headers.get("x-user-id").unwrap().to_str().unwrap(), id);
}

#[tokio::test]
async fn test_session_cookie_minting_and_echo() {
    let app = setup_test_app().await;

    // First contact: a fresh id is minted but the endpoint reports null,
    // since the inbound request carried no cookie.
    let (status, headers, body) =
        make_request(&app, Method::GET, "/api/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["userId"], Value::Null);

    let set_cookie = headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("Max-Age=31536000"));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(!set_cookie.contains("Secure"));

    // Repeat request with the cookie: same id echoed, no new cookie set.
    let id = minted_session_id(&headers).unwrap();
    let (status, headers, body) =
        make_request(&app, Method::GET, "/api/session", Some(&as_cookie(&id)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["userId"], id.as_str());
    assert!(headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_duplicate_add_keeps_first_metadata() {
    let app = setup_test_app().await;
    let cookie = as_cookie("aaaabbbbccccdddd");

    let (status, _, body) = make_request(
        &app,
        Method::POST,
        "/api/saved",
        Some(&cookie),
        Some(json!({"id": "book1", "title": "First Title", "author": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["ok"], true);

    // Second add for the same resource is a silent no-op; the new metadata
    // is discarded, not merged.
    let (status, _, _) = make_request(
        &app,
        Method::POST,
        "/api/saved",
        Some(&cookie),
        Some(json!({"id": "book1", "title": "Second Title", "author": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) =
        make_request(&app, Method::GET, "/api/saved", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.unwrap()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "book1");
    assert_eq!(items[0]["title"], "First Title");
    assert_eq!(items[0]["author"], "Ada");
    assert_eq!(items[0]["source"], "openlibrary");
}

#[tokio::test]
async fn test_add_coerces_numeric_year() {
    let app = setup_test_app().await;
    let cookie = as_cookie("aaaabbbbccccdddd");

    let (status, _, _) = make_request(
        &app,
        Method::POST,
        "/api/saved",
        Some(&cookie),
        Some(json!({"id": "book2", "title": "Title", "year": 1984})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = make_request(&app, Method::GET, "/api/saved", Some(&cookie), None).await;
    let items = body.unwrap()["items"].as_array().unwrap().clone();
    assert_eq!(items[0]["year"], "1984");
}

#[tokio::test]
async fn test_add_requires_id_and_title() {
    let app = setup_test_app().await;
    let cookie = as_cookie("aaaabbbbccccdddd");

    for payload in [
        json!({"title": "No id"}),
        json!({"id": "book1"}),
        json!({"id": "", "title": "Empty id"}),
        json!({"id": "book1", "title": ""}),
    ] {
        let (status, _, _) =
            make_request(&app, Method::POST, "/api/saved", Some(&cookie), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, _, body) = make_request(&app, Method::GET, "/api/saved", Some(&cookie), None).await;
    assert!(body.unwrap()["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let app = setup_test_app().await;
    let cookie = as_cookie("aaaabbbbccccdddd");

    make_request(
        &app,
        Method::POST,
        "/api/saved",
        Some(&cookie),
        Some(json!({"id": "book1", "title": "Keep me"})),
    )
    .await;

    // Deleting a record that does not exist is not an error and leaves the
    // list unchanged.
    let (status, _, body) = make_request(
        &app,
        Method::DELETE,
        "/api/saved/never-saved",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["ok"], true);

    let (_, _, body) = make_request(&app, Method::GET, "/api/saved", Some(&cookie), None).await;
    assert_eq!(body.unwrap()["items"].as_array().unwrap().len(), 1);

    let (status, _, _) = make_request(
        &app,
        Method::DELETE,
        "/api/saved/book1",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = make_request(&app, Method::GET, "/api/saved", Some(&cookie), None).await;
    assert!(body.unwrap()["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_percent_is_clamped() {
    let app = setup_test_app().await;
    let cookie = as_cookie("aaaabbbbccccdddd");

    let (status, _, _) = make_request(
        &app,
        Method::PUT,
        "/api/progress/book1",
        Some(&cookie),
        Some(json!({"percent": 150})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = make_request(&app, Method::GET, "/api/progress", Some(&cookie), None).await;
    let progress = body.unwrap()["progress"].clone();
    assert_eq!(progress["book1"]["percent"], 100.0);
    assert_eq!(progress["book1"]["status"], "in_progress");

    make_request(
        &app,
        Method::PUT,
        "/api/progress/book1",
        Some(&cookie),
        Some(json!({"percent": -10})),
    )
    .await;

    let (_, _, body) = make_request(&app, Method::GET, "/api/progress", Some(&cookie), None).await;
    assert_eq!(body.unwrap()["progress"]["book1"]["percent"], 0.0);
}

#[tokio::test]
async fn test_progress_upsert_overwrites_and_resets_status() {
    let app = setup_test_app().await;
    let cookie = as_cookie("aaaabbbbccccdddd");

    make_request(
        &app,
        Method::PUT,
        "/api/progress/book1",
        Some(&cookie),
        Some(json!({"status": "done", "percent": 100})),
    )
    .await;

    // A follow-up that omits status falls back to the default instead of
    // carrying the previous value over.
    make_request(
        &app,
        Method::PUT,
        "/api/progress/book1",
        Some(&cookie),
        Some(json!({"percent": 50})),
    )
    .await;

    let (_, _, body) = make_request(&app, Method::GET, "/api/progress", Some(&cookie), None).await;
    let progress = body.unwrap()["progress"].clone();
    assert_eq!(progress.as_object().unwrap().len(), 1);
    assert_eq!(progress["book1"]["status"], "in_progress");
    assert_eq!(progress["book1"]["percent"], 50.0);

    // updatedAt is an ISO-8601 timestamp.
    let updated_at = progress["book1"]["updatedAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(updated_at).is_ok());
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = setup_test_app().await;
    let first = as_cookie("1111111111111111");
    let second = as_cookie("2222222222222222");

    make_request(
        &app,
        Method::POST,
        "/api/saved",
        Some(&first),
        Some(json!({"id": "book1", "title": "Mine"})),
    )
    .await;
    make_request(
        &app,
        Method::POST,
        "/api/saved",
        Some(&second),
        Some(json!({"id": "book1", "title": "Yours"})),
    )
    .await;
    make_request(
        &app,
        Method::PUT,
        "/api/progress/book1",
        Some(&first),
        Some(json!({"percent": 25})),
    )
    .await;

    let (_, _, body) = make_request(&app, Method::GET, "/api/saved", Some(&first), None).await;
    let items = body.unwrap()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Mine");

    let (_, _, body) = make_request(&app, Method::GET, "/api/saved", Some(&second), None).await;
    let items = body.unwrap()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Yours");

    let (_, _, body) = make_request(&app, Method::GET, "/api/progress", Some(&second), None).await;
    assert!(body.unwrap()["progress"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_without_credential_is_a_server_error() {
    let app = setup_test_app().await;

    let (status, _, _) = make_request(
        &app,
        Method::GET,
        "/api/youtube/search?q=rust",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
