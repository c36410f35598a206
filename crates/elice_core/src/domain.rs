//! crates/elice_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// Represents a resource a session has bookmarked (e.g. an Open Library
/// catalog entry). At most one row exists per (session, resource) pair.
#[derive(Debug, Clone)]
pub struct SavedItem {
    pub id: i64,
    pub session_id: String,
    pub resource_id: String,
    pub title: String,
    pub author: Option<String>,
    pub year: Option<String>,
    pub source: String,
    pub url: Option<String>,
}

/// The data needed to create a new saved item. The numeric row id is
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSavedItem {
    pub session_id: String,
    pub resource_id: String,
    pub title: String,
    pub author: Option<String>,
    pub year: Option<String>,
    pub source: String,
    pub url: Option<String>,
}

/// Represents reading/viewing progress on a resource. Percent is always
/// within [0, 100]; callers clamp before handing it to the store.
#[derive(Debug, Clone)]
pub struct ProgressRecord {
    pub id: i64,
    pub session_id: String,
    pub resource_id: String,
    pub status: String,
    pub percent: f64,
    pub updated_at: DateTime<Utc>,
}

/// A single video search result as returned by the external video platform,
/// reshaped for the frontend. Not persisted.
#[derive(Debug, Clone)]
pub struct VideoResult {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub channel: String,
    pub published_at: String,
    pub duration: String,
    pub url: String,
    pub source: String,
}
