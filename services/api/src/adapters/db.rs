//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use elice_core::domain::{NewSavedItem, ProgressRecord, SavedItem};
use elice_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, SqlitePool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SavedItemRecord {
    id: i64,
    session_id: String,
    resource_id: String,
    title: String,
    author: Option<String>,
    year: Option<String>,
    source: String,
    url: Option<String>,
}
impl SavedItemRecord {
    fn to_domain(self) -> SavedItem {
        SavedItem {
            id: self.id,
            session_id: self.session_id,
            resource_id: self.resource_id,
            title: self.title,
            author: self.author,
            year: self.year,
            source: self.source,
            url: self.url,
        }
    }
}

#[derive(FromRow)]
struct ProgressRow {
    id: i64,
    session_id: String,
    resource_id: String,
    status: String,
    percent: f64,
    updated_at: DateTime<Utc>,
}
impl ProgressRow {
    fn to_domain(self) -> ProgressRecord {
        ProgressRecord {
            id: self.id,
            session_id: self.session_id,
            resource_id: self.resource_id,
            status: self.status,
            percent: self.percent,
            updated_at: self.updated_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn list_saved_items(&self, session_id: &str) -> PortResult<Vec<SavedItem>> {
        let records = sqlx::query_as::<_, SavedItemRecord>(
            "SELECT id, session_id, resource_id, title, author, year, source, url \
             FROM saved_items WHERE session_id = ? ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn add_saved_item(&self, item: NewSavedItem) -> PortResult<()> {
        // First write wins: a duplicate (session, resource) pair is a no-op
        // and the new metadata is discarded.
        sqlx::query(
            "INSERT INTO saved_items (session_id, resource_id, title, author, year, source, url) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(session_id, resource_id) DO NOTHING",
        )
        .bind(&item.session_id)
        .bind(&item.resource_id)
        .bind(&item.title)
        .bind(&item.author)
        .bind(&item.year)
        .bind(&item.source)
        .bind(&item.url)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn delete_saved_item(&self, session_id: &str, resource_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM saved_items WHERE session_id = ? AND resource_id = ?")
            .bind(session_id)
            .bind(resource_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn list_progress(&self, session_id: &str) -> PortResult<Vec<ProgressRecord>> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            "SELECT id, session_id, resource_id, status, percent, updated_at \
             FROM progress WHERE session_id = ? ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn upsert_progress(
        &self,
        session_id: &str,
        resource_id: &str,
        status: &str,
        percent: f64,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        // Last write wins; status, percent and timestamp are overwritten in
        // place for an existing (session, resource) pair.
        sqlx::query(
            "INSERT INTO progress (session_id, resource_id, status, percent, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(session_id, resource_id) DO UPDATE SET \
                 status = excluded.status, \
                 percent = excluded.percent, \
                 updated_at = excluded.updated_at",
        )
        .bind(session_id)
        .bind(resource_id)
        .bind(status)
        .bind(percent)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
