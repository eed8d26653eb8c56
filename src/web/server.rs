//! HTTP server wiring
//!
//! One axum router over shared state. The progress endpoints are long-lived
//! SSE connections; everything else is plain JSON.

use crate::core::probe::ToolCapabilities;
use crate::events::ProgressHub;
use crate::jobs::store::JobStore;
use crate::web::handlers;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub hub: Arc<ProgressHub>,
    pub caps: Arc<ToolCapabilities>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/youtube/info", get(handlers::youtube_info))
        .route("/api/youtube/download", post(handlers::start_download))
        .route("/api/youtube/download/{job_id}", get(handlers::download_status))
        .route("/api/youtube/progress/{job_id}", get(handlers::progress_stream))
        .route("/api/youtube/videos/{video_id}/state", get(handlers::video_state))
        .route("/api/generate/series", post(handlers::start_generation))
        .route("/api/generate/status/{job_id}", get(handlers::generation_status))
        .route("/api/generate/progress/{job_id}", get(handlers::progress_stream))
        .with_state(state)
}

/// Starts the web server and serves until the process exits.
pub async fn serve(port: u16, state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    log::info!("Starting web server on http://{}", addr);
    log::info!("  POST /api/youtube/download          - start a download job");
    log::info!("  GET  /api/youtube/progress/{{id}}     - download progress (SSE)");
    log::info!("  POST /api/generate/series           - start a clip-generation job");
    log::info!("  GET  /api/generate/progress/{{id}}    - generation progress (SSE)");
    log::info!("  GET  /health                        - health check");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
