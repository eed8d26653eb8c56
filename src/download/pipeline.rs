//! End-to-end runner for a tracked download job
//!
//! Owns the job from `pending` to its terminal state: drives the
//! orchestrator, mirrors progress into the registry and the event hub, and
//! always lands the job in `completed` or `failed` — failures are captured
//! into the job record and surfaced through the hub, never thrown past the
//! job boundary.

use crate::clips::probe_duration_secs;
use crate::core::config;
use crate::core::probe::ToolCapabilities;
use crate::core::validation::parse_video_id;
use crate::download::orchestrator::acquire;
use crate::events::{ProgressEvent, ProgressHub};
use crate::jobs::store::JobStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Directory path for a source video file: one file per downloaded video.
pub fn source_video_path(video_id: &str) -> PathBuf {
    PathBuf::from(config::expand_path(&config::DOWNLOAD_DIR)).join(format!("{}.mp4", video_id))
}

/// Playable URL contract for a downloaded source (served elsewhere).
pub fn playable_url(video_id: &str) -> String {
    format!("/api/youtube/play/{}", video_id)
}

/// Runs one download job to a terminal state.
pub async fn run_download_job(
    store: Arc<dyn JobStore>,
    hub: Arc<ProgressHub>,
    caps: Arc<ToolCapabilities>,
    job_id: String,
) {
    let Some(job) = store.download(&job_id) else {
        log::error!("download job {} vanished before start", job_id);
        return;
    };

    let video_id = match parse_video_id(&job.video_id) {
        Ok(id) => id,
        Err(e) => {
            store.fail_download(&job_id, e.to_string());
            hub.publish(ProgressEvent::failure(&job_id, "failed", e.to_string()));
            return;
        }
    };

    let output_path = source_video_path(video_id.as_str());
    if let Some(dir) = output_path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            store.fail_download(&job_id, format!("cannot create download dir: {}", e));
            hub.publish(ProgressEvent::failure(&job_id, "failed", format!("cannot create download dir: {}", e)));
            return;
        }
    }

    store.mark_downloading(&job_id);
    hub.publish(ProgressEvent::update(&job_id, 0, "downloading", "Starting download…"));

    let acquired = acquire(&caps, &video_id, &output_path, |update| {
        store.set_download_progress(&job_id, update.percent);
        hub.publish(ProgressEvent::update(
            &job_id,
            update.percent,
            "downloading",
            format!("Downloading… {}%", update.percent),
        ));
    })
    .await;

    match acquired {
        Ok(acquisition) => {
            let duration_secs = match probe_duration_secs(&caps, &acquisition.output_path).await {
                Ok(d) => Some(d.floor() as u64),
                Err(e) => {
                    log::warn!("duration probe failed for {}: {}", video_id, e);
                    None
                }
            };

            store.record_attempts(&job_id, acquisition.attempts.clone());
            store.complete_download(
                &job_id,
                acquisition.output_path.to_string_lossy().to_string(),
                acquisition.file_size_bytes,
                duration_secs,
                acquisition.strategy.to_string(),
            );

            // Terminal event carries everything a subscriber needs to move on
            let mut event = ProgressEvent::update(&job_id, 100, "completed", "Download complete");
            event.completed = Some(true);
            event.video_id = Some(video_id.as_str().to_string());
            event.duration_secs = duration_secs;
            event.playable_url = Some(playable_url(video_id.as_str()));
            hub.publish(event);
        }
        Err(e) => {
            store.record_attempts(&job_id, e.attempts().to_vec());
            let message = e.to_string();
            log::error!("download job {} failed: {}", job_id, message);
            store.fail_download(&job_id, message.clone());
            hub.publish(ProgressEvent::failure(&job_id, "failed", message));
        }
    }
}
