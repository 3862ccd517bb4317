//! Browser UI assets.
//!
//! Release builds serve the `web/` directory embedded at compile time. In dev mode the same
//! layout is read from disk on every request so UI changes show up without a rebuild:
//!
//! ```text
//! web/
//! ├── static/      # served under /static/
//! └── templates/
//!     └── index.html   # served at /
//! ```

use axum::{
    extract::{Path as AxumPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use courseviewer_core::RelativePath;
use include_dir::{include_dir, Dir};
use std::path::PathBuf;
use tower_http::services::ServeDir;

use crate::AppState;

static WEB_ASSETS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/../../web");

const INDEX_TEMPLATE: &str = "templates/index.html";

/// Where UI assets are read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    /// Assets compiled into the binary.
    Embedded,
    /// Assets read from a `web/` directory on disk.
    Local(PathBuf),
}

/// Routes for `/` and `/static/*`.
pub(crate) fn routes(source: &AssetSource) -> Router<AppState> {
    let router = Router::new().route("/", get(index));
    match source {
        AssetSource::Embedded => router.route("/static/*path", get(embedded_static)),
        AssetSource::Local(root) => {
            router.nest_service("/static", ServeDir::new(root.join("static")))
        }
    }
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, &'static str)> {
    match &state.assets {
        AssetSource::Embedded => WEB_ASSETS
            .get_file(INDEX_TEMPLATE)
            .and_then(|file| file.contents_utf8())
            .map(|html| Html(html.to_string()))
            .ok_or_else(|| {
                tracing::error!("embedded index template missing");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }),
        AssetSource::Local(root) => tokio::fs::read_to_string(root.join(INDEX_TEMPLATE))
            .await
            .map(Html)
            .map_err(|e| {
                tracing::error!("Read index template error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }),
    }
}

async fn embedded_static(AxumPath(path): AxumPath<String>) -> Response {
    let Ok(relative) = RelativePath::parse(&path) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    match WEB_ASSETS.get_file(format!("static/{}", relative)) {
        Some(file) => {
            let mime = mime_guess::from_path(file.path()).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], file.contents()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
