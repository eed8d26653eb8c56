//! HTTP handlers: job submission, status polling, and SSE progress streams

use crate::core::config;
use crate::core::error::AppError;
use crate::core::validation::{parse_video_id, resolve_video_id};
use crate::download::metadata::fetch_video_info;
use crate::download::pipeline::{playable_url, run_download_job, source_video_path};
use crate::jobs::generation::run_generation_job;
use crate::jobs::types::{DownloadJob, GenerationJob};
use crate::web::server::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

/// GET /health — simple liveness check.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Debug, Deserialize)]
pub struct InfoParams {
    pub url: Option<String>,
}

/// GET /api/youtube/info?url=… — validates the URL and returns metadata
/// fetched through the same strategy catalogue the download path uses.
pub async fn youtube_info(State(state): State<AppState>, Query(params): Query<InfoParams>) -> Response {
    let Some(url) = params.url else {
        return error_response(StatusCode::BAD_REQUEST, "missing url parameter");
    };

    let video_id = match resolve_video_id(&url) {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    match fetch_video_info(&state.caps, &video_id).await {
        Ok(metadata) => {
            let mut body = json!(metadata);
            if let Some(obj) = body.as_object_mut() {
                obj.insert("success".to_string(), json!(true));
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
}

/// POST /api/youtube/download — starts an asynchronous download job.
pub async fn start_download(State(state): State<AppState>, Json(request): Json<DownloadRequest>) -> Response {
    // Rejected here, synchronously, before any subprocess exists
    let video_id = match resolve_video_id(&request.url) {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let job = DownloadJob::new(video_id.watch_url(), video_id.as_str().to_string());
    let job_id = job.id.clone();
    state.store.insert_download(job);

    log::info!("📥 download job {} queued for {}", job_id, video_id);
    tokio::spawn(run_download_job(
        state.store.clone(),
        state.hub.clone(),
        state.caps.clone(),
        job_id.clone(),
    ));

    (
        StatusCode::OK,
        Json(json!({
            "jobId": job_id,
            "videoId": video_id.as_str(),
            "status": "pending",
        })),
    )
        .into_response()
}

/// GET /api/youtube/videos/{video_id}/state — is the source ready to use?
pub async fn video_state(State(state): State<AppState>, Path(video_id): Path<String>) -> Response {
    let video_id = match parse_video_id(&video_id) {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let path = source_video_path(video_id.as_str());
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return (StatusCode::OK, Json(json!({ "success": false, "ready": false }))).into_response();
    }

    let duration = state
        .store
        .download_by_video(video_id.as_str())
        .and_then(|job| job.duration_secs);

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "ready": true,
            "duration": duration,
            "fileSizeBytes": size,
            "playableUrl": playable_url(video_id.as_str()),
        })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub video_id: String,
    #[serde(default)]
    pub trim_start: u64,
    pub trim_end: Option<u64>,
    #[serde(default = "default_cut_duration")]
    pub cut_duration: u64,
}

fn default_cut_duration() -> u64 {
    60
}

/// POST /api/generate/series — starts a clip-generation job. The clip count
/// is derived from the window and cut duration, never taken from the caller.
pub async fn start_generation(State(state): State<AppState>, Json(request): Json<GenerateRequest>) -> Response {
    let video_id = match parse_video_id(&request.video_id) {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    if request.cut_duration == 0 {
        return error_response(StatusCode::BAD_REQUEST, "cutDuration must be positive");
    }
    if let Some(end) = request.trim_end {
        if end <= request.trim_start {
            return error_response(StatusCode::BAD_REQUEST, "trimEnd must be greater than trimStart");
        }
    }

    let job = GenerationJob::new(
        video_id.as_str().to_string(),
        request.trim_start,
        request.trim_end,
        request.cut_duration,
    );
    let job_id = job.id.clone();
    let series_id = job.series_id.clone();
    state.store.insert_generation(job);

    log::info!("🎬 generation job {} queued (series {})", job_id, series_id);
    tokio::spawn(run_generation_job(
        state.store.clone(),
        state.hub.clone(),
        state.caps.clone(),
        job_id.clone(),
    ));

    (
        StatusCode::OK,
        Json(json!({
            "jobId": job_id,
            "seriesId": series_id,
            "status": "processing",
        })),
    )
        .into_response()
}

/// GET /api/generate/status/{job_id} — poll a generation job.
pub async fn generation_status(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    match state.store.generation(&job_id) {
        Some(job) => (StatusCode::OK, Json(json!(job))).into_response(),
        None => error_response(StatusCode::NOT_FOUND, &AppError::JobNotFound(job_id).to_string()),
    }
}

/// GET /api/youtube/download/{job_id} — poll a download job.
pub async fn download_status(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    match state.store.download(&job_id) {
        Some(job) => (StatusCode::OK, Json(json!(job))).into_response(),
        None => error_response(StatusCode::NOT_FOUND, &AppError::JobNotFound(job_id).to_string()),
    }
}

/// GET /api/youtube/progress/{job_id} and /api/generate/progress/{job_id} —
/// long-lived SSE stream of progress events for one job.
///
/// A subscriber joining after progress has already happened immediately
/// receives the last known event; the heartbeat comment keeps idle
/// connections alive through intermediaries.
pub async fn progress_stream(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    let known = state.store.download(&job_id).is_some() || state.store.generation(&job_id).is_some();
    if !known {
        return error_response(StatusCode::NOT_FOUND, &AppError::JobNotFound(job_id).to_string());
    }

    let rx = state.hub.subscribe(&job_id);
    let stream = ReceiverStream::new(rx).map(|event| {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok::<Event, Infallible>(Event::default().data(payload))
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(config::sse::keepalive()).text("keepalive"))
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}
