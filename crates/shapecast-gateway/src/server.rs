//! Axum-based HTTP server.

use std::sync::Arc;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::routes;
use crate::state::AppState;

/// Build the application router.
///
/// When `ui_enabled` is true, the embedded page is served at `/`.
pub fn build_router(state: Arc<AppState>, ui_enabled: bool) -> Router {
    // API routes are registered first so they take priority over the UI catch-all
    let mut app = Router::new()
        .route("/generate-text", post(routes::generate_text))
        .route("/groqThreeJs", post(routes::generate_shape))
        .route("/generate-audio", post(routes::generate_audio))
        .route("/health", get(routes::health))
        .with_state(state);

    if ui_enabled {
        app = app.merge(shapecast_web::ui_router());
    }

    app.layer(
        TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
            info_span!(
                "request",
                method = %req.method(),
                path = %req.uri().path(),
                request_id = %uuid::Uuid::new_v4().simple(),
            )
        }),
    )
}

/// Start the HTTP server and run until Ctrl-C.
pub async fn start_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let bind_addr = state.config.bind();
    let port = state.config.port();
    let ui_enabled = state.config.ui_enabled();

    let app = build_router(state, ui_enabled);

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{addr}");
    if ui_enabled {
        info!("Scene page available at http://{addr}/");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
