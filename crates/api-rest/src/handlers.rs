//! HTTP handlers for the tree, content and read-status endpoints.
//!
//! Core calls block on the filesystem or SQLite, so every one of them runs on the blocking pool.
//! Error bodies are generic; details only go to the log.

use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{Json, Response},
};
use courseviewer_core::{
    content::unsatisfied_content_range, CoreError, CoreResult, FileNode, RelativePath,
};
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

use crate::types::{HealthRes, LastReadRes, ReadStatusRes};
use crate::AppState;

// 64KiB
const STREAM_CAPACITY: usize = 65536;

type ApiError = (StatusCode, &'static str);

const INTERNAL_ERROR: ApiError = (StatusCode::INTERNAL_SERVER_ERROR, "Internal error");
const NOT_FOUND: ApiError = (StatusCode::NOT_FOUND, "File not found");

/// Run a blocking core call on the blocking pool.
async fn run_blocking<T, F>(label: &'static str, task: F) -> Result<CoreResult<T>, ApiError>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        tracing::error!("{} task failed: {:?}", label, e);
        INTERNAL_ERROR
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "CourseViewer is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/api/tree",
    responses(
        (status = 200, description = "File tree of the course directory", body = FileNode),
        (status = 500, description = "Internal server error")
    )
)]
/// Build the file tree of the base directory
///
/// The tree is rebuilt from disk on every call. Files with a hidden extension are left out.
///
/// # Errors
/// Returns `500 Internal Server Error` if the base directory or one of its entries cannot be
/// inspected.
pub async fn tree(State(state): State<AppState>) -> Result<Json<FileNode>, ApiError> {
    tracing::info!(
        "Building file tree from path: {}",
        state.cfg.base_path().display()
    );

    let service = state.tree.clone();
    match run_blocking("build tree", move || service.build()).await? {
        Ok(tree) => Ok(Json(tree)),
        Err(e) => {
            tracing::error!("Build tree error: {:?}", e);
            Err(INTERNAL_ERROR)
        }
    }
}

#[utoipa::path(
    get,
    path = "/content/{path}",
    params(
        ("path" = String, Path, description = "Content path relative to the base directory"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. bytes=10-")
    ),
    responses(
        (status = 200, description = "Whole file"),
        (status = 206, description = "Requested byte range"),
        (status = 404, description = "File not found"),
        (status = 416, description = "Range not satisfiable")
    )
)]
/// Stream a file, honouring a single byte range
///
/// # Errors
/// Returns `404 Not Found` for missing files and paths outside the base directory,
/// `416 Range Not Satisfiable` for multi-range or out-of-bounds ranges, and
/// `500 Internal Server Error` if the file cannot be read.
pub async fn content(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    tracing::info!("Accessing file: {}", path);

    let service = state.content.clone();
    let requested = path.clone();
    let opened = run_blocking("open content", move || {
        service.open(&requested, range.as_deref())
    })
    .await?;

    let content = match opened {
        Ok(content) => content,
        Err(CoreError::RangeNotSatisfiable { size }) => {
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, unsatisfied_content_range(size))
                .header(header::ACCEPT_RANGES, "bytes")
                .body(Body::empty())
                .map_err(|e| {
                    tracing::error!("Build response error: {:?}", e);
                    INTERNAL_ERROR
                });
        }
        Err(e @ (CoreError::NotFound(_) | CoreError::InvalidPath(_))) => {
            tracing::warn!("Error opening file: {}", e);
            return Err(NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Open content error: {:?}", e);
            return Err(INTERNAL_ERROR);
        }
    };

    let status = if content.is_partial() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content.content_type())
        .header(header::CONTENT_LENGTH, content.content_length())
        .header(header::ACCEPT_RANGES, "bytes");
    if let Some(content_range) = content.content_range() {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }

    let (file, length) = content.into_parts();
    let reader = tokio::fs::File::from_std(file).take(length);
    let stream = ReaderStream::with_capacity(reader, STREAM_CAPACITY)
        .inspect_err(move |e| tracing::warn!("Error copying file {}: {}", path, e));

    builder.body(Body::from_stream(stream)).map_err(|e| {
        tracing::error!("Build response error: {:?}", e);
        INTERNAL_ERROR
    })
}

#[utoipa::path(
    post,
    path = "/api/mark-read/{path}",
    params(
        ("path" = String, Path, description = "Content path relative to the base directory")
    ),
    responses(
        (status = 200, description = "Path marked as read"),
        (status = 400, description = "Invalid path"),
        (status = 500, description = "Internal server error")
    )
)]
/// Mark a path as read
///
/// Re-marking a path replaces its timestamp, so it becomes the last read path.
///
/// # Errors
/// Returns `400 Bad Request` for empty paths or paths that leave the base directory and
/// `500 Internal Server Error` if the write fails.
pub async fn mark_read(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let relative = match RelativePath::parse(&path) {
        Ok(relative) if !relative.is_root() => relative,
        Ok(_) | Err(_) => {
            tracing::warn!("Rejected mark-read path: {}", path);
            return Err((StatusCode::BAD_REQUEST, "Invalid path"));
        }
    };

    let store = state.read_status.clone();
    match run_blocking("mark read", move || store.mark_read(relative.as_str())).await? {
        Ok(_) => Ok(StatusCode::OK),
        Err(e) => {
            tracing::error!("Mark read error: {:?}", e);
            Err(INTERNAL_ERROR)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/read-status",
    responses(
        (status = 200, description = "Read paths and the last read path", body = ReadStatusRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Read status of the course
///
/// # Errors
/// Returns `500 Internal Server Error` if the store cannot be queried.
pub async fn read_status(State(state): State<AppState>) -> Result<Json<ReadStatusRes>, ApiError> {
    tracing::info!("Fetching read status...");

    let store = state.read_status.clone();
    let result = run_blocking("read status", move || {
        let paths = store.list_read_paths()?;
        let last_read = store.last_read()?;
        Ok((paths, last_read))
    })
    .await?;

    match result {
        Ok((paths, last_read)) => Ok(Json(ReadStatusRes {
            paths,
            last_read: last_read.map(LastReadRes::from),
        })),
        Err(e) => {
            tracing::error!("Read status error: {:?}", e);
            Err(INTERNAL_ERROR)
        }
    }
}
