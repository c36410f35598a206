//! crates/elice_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewSavedItem, ProgressRecord, SavedItem, VideoResult};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A non-success response from an external API. The status code is
    /// surfaced to the caller unmodified.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Saved Items ---
    async fn list_saved_items(&self, session_id: &str) -> PortResult<Vec<SavedItem>>;

    /// Inserts a new saved item. If the (session, resource) pair already
    /// exists this is a silent no-op; the first write wins.
    async fn add_saved_item(&self, item: NewSavedItem) -> PortResult<()>;

    /// Removes the matching record. Deleting a non-existent record is not
    /// an error.
    async fn delete_saved_item(&self, session_id: &str, resource_id: &str) -> PortResult<()>;

    // --- Progress ---
    async fn list_progress(&self, session_id: &str) -> PortResult<Vec<ProgressRecord>>;

    /// Insert-if-absent, else overwrite status, percent and timestamp in
    /// place, keyed by the (session, resource) pair. Last write wins.
    async fn upsert_progress(
        &self,
        session_id: &str,
        resource_id: &str,
        status: &str,
        percent: f64,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()>;
}

#[async_trait]
pub trait VideoSearchService: Send + Sync {
    /// Searches the external video platform and resolves per-item duration
    /// metadata.
    async fn search(&self, query: &str, max_results: u32) -> PortResult<Vec<VideoResult>>;
}
