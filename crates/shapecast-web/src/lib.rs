//! Scene presenter: the browser page, embedded into the binary.
//!
//! `index.html`, `style.css` and the three.js `app.js` under `ui/` are
//! compiled in, debug builds included, so `shapecast serve` needs no asset
//! directory next to it. Only the page itself is served; any other path
//! is a 404.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;
use tracing::debug;

#[derive(Embed)]
#[folder = "ui/"]
struct UiAssets;

/// Build an axum `Router` that serves the embedded page.
///
/// Merge this **after** the API routes so they take priority over the
/// catch-all.
pub fn ui_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/{*path}", get(static_handler))
}

async fn index_handler() -> Response {
    serve_file("index.html")
}

async fn static_handler(Path(path): Path<String>) -> Response {
    serve_file(&path)
}

fn serve_file(path: &str) -> Response {
    match UiAssets::get(path) {
        Some(asset) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                asset.data.into_owned(),
            )
                .into_response()
        }
        None => {
            debug!(path, "Asset not found");
            (StatusCode::NOT_FOUND, Html("<h1>404</h1>")).into_response()
        }
    }
}
