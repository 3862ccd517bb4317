//! # API REST
//!
//! REST API for CourseViewer.
//!
//! Handles:
//! - HTTP endpoints with axum (`/api/tree`, `/content/*`, `/api/mark-read/*`, `/api/read-status`)
//! - OpenAPI documentation at `/api-docs/openapi.json`
//! - The browser UI assets, embedded or read from disk
//!
//! Uses `courseviewer-core` for everything that touches the filesystem or the read-status store.

#![warn(rust_2018_idioms)]

pub mod assets;
pub mod handlers;
pub mod types;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use courseviewer_core::{ContentService, CoreConfig, FileNode, ReadStatusStore, TreeService};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

pub use assets::AssetSource;

/// Application state shared across REST API handlers
///
/// Holds the startup configuration and the core services built from it. Cloning is cheap; all
/// services share the same `CoreConfig` and read-status connection.
#[derive(Clone, Debug)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    tree: TreeService,
    content: ContentService,
    read_status: Arc<ReadStatusStore>,
    assets: AssetSource,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, read_status: Arc<ReadStatusStore>, assets: AssetSource) -> Self {
        Self {
            tree: TreeService::new(cfg.clone()),
            content: ContentService::new(cfg.clone()),
            cfg,
            read_status,
            assets,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::tree,
        handlers::content,
        handlers::mark_read,
        handlers::read_status,
    ),
    components(schemas(
        FileNode,
        types::HealthRes,
        types::LastReadRes,
        types::ReadStatusRes,
    ))
)]
pub struct ApiDoc;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/tree", get(handlers::tree))
        .route("/api/read-status", get(handlers::read_status))
        .route("/api/mark-read/*path", post(handlers::mark_read))
        .route("/content/*path", get(handlers::content))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(assets::routes(&state.assets))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
