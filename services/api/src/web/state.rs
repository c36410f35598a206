//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use elice_core::ports::{DatabaseService, VideoSearchService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Beyond the connection pool held inside the database adapter there is no
/// cross-request mutable state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub video_search: Arc<dyn VideoSearchService>,
    pub config: Arc<Config>,
}
