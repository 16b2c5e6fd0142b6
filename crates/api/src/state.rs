use std::sync::Arc;

use idioms_pipeline::generator::IdiomGenerator;
use idioms_pipeline::thumbnail::ThumbnailService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: idioms_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Text generation for examples and descriptions.
    pub generator: Arc<IdiomGenerator>,
    /// Thumbnail upload, import and draft generation.
    pub thumbnails: Arc<ThumbnailService>,
}
