//! Clip-generation state machine
//!
//! Sequences source acquisition → trim → split behind a single job record.
//! Progress is apportioned across the phases with fixed weight bands —
//! 0–20 acquiring the source, 20–50 trimming the requested window, 50–100
//! split proportional per clip — so a subscriber sees continuous monotonic
//! movement across fundamentally different sub-operations.

use crate::clips::{clip_count, probe_duration_secs, split_into_clips, trim_segment};
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::probe::ToolCapabilities;
use crate::core::validation::parse_video_id;
use crate::download::orchestrator::acquire_robust;
use crate::download::pipeline::source_video_path;
use crate::events::{ProgressEvent, ProgressHub};
use crate::jobs::store::JobStore;
use crate::jobs::types::{ClipRef, DownloadStatus, GenerationJob};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;

/// Upper bound of the source-acquisition band.
const ACQUIRE_BAND_END: u8 = 20;
/// Upper bound of the trim band.
const TRIM_BAND_END: u8 = 50;

/// Runs one generation job to a terminal state. Any failure in any phase
/// lands in `status=error` with a human-readable message; the job never
/// stays non-terminal.
pub async fn run_generation_job(
    store: Arc<dyn JobStore>,
    hub: Arc<ProgressHub>,
    caps: Arc<ToolCapabilities>,
    job_id: String,
) {
    let Some(job) = store.generation(&job_id) else {
        log::error!("generation job {} vanished before start", job_id);
        return;
    };

    match generate(&store, &hub, &caps, &job).await {
        Ok(clips) => {
            store.complete_generation(&job_id, clips.clone());
            let mut event = ProgressEvent::update(&job_id, 100, "completed", format!("{} clip(s) ready", clips.len()));
            event.completed = Some(true);
            event.video_id = Some(job.video_id.clone());
            event.clips = Some(clips);
            hub.publish(event);
        }
        Err(e) => {
            let message = e.to_string();
            log::error!("generation job {} failed: {}", job_id, message);
            store.fail_generation(&job_id, message.clone());
            hub.publish(ProgressEvent::failure(&job_id, "error", message));
        }
    }
}

/// The three-phase pipeline. Returns the complete clip list or the first
/// error; partial clip sets never escape.
async fn generate(
    store: &Arc<dyn JobStore>,
    hub: &Arc<ProgressHub>,
    caps: &Arc<ToolCapabilities>,
    job: &GenerationJob,
) -> AppResult<Vec<ClipRef>> {
    publish_progress(store, hub, &job.id, 1, "Preparing source video…");

    // Phase 1 (0–20): make sure the source file exists locally
    let source_path = resolve_source(store, hub, caps, job).await?;
    publish_progress(store, hub, &job.id, ACQUIRE_BAND_END, "Source video ready");

    let source_duration = probe_duration_secs(caps, &source_path).await?.floor() as u64;
    let start = job.trim_start_secs;
    let end = job.trim_end_secs.unwrap_or(source_duration).min(source_duration);
    let count = clip_count(start, end, job.cut_duration_secs)?;
    store.set_generation_cut_count(&job.id, count);

    let series_dir = PathBuf::from(config::expand_path(&config::CLIPS_DIR)).join(&job.series_id);

    // Phase 2 (20–50): trim to the requested window when it's a real subset
    let needs_trim = start > 0 || end < source_duration;
    let (work_path, split_start, split_end) = if needs_trim {
        publish_progress(store, hub, &job.id, 35, "Trimming selected window…");
        std::fs::create_dir_all(&series_dir)?;
        let trimmed = series_dir.join("source_trimmed.mp4");
        trim_segment(caps, &source_path, &trimmed, start as f64, (end - start) as f64).await?;
        (trimmed, 0, end - start)
    } else {
        (source_path, start, end)
    };
    publish_progress(store, hub, &job.id, TRIM_BAND_END, "Window ready, cutting clips…");

    // Phase 3 (50–100): sequential split, proportional progress per clip
    let job_id = job.id.clone();
    let clips = split_into_clips(
        caps,
        &work_path,
        &series_dir,
        job.cut_duration_secs,
        split_start,
        split_end,
        |produced, total| {
            let span = (100 - TRIM_BAND_END) as f64;
            let percent = TRIM_BAND_END + ((produced as f64 / total as f64) * span) as u8;
            publish_progress(store, hub, &job_id, percent, format!("Clip {}/{} done", produced, total));
        },
    )
    .await?;

    // The trimmed intermediate is job-scoped scratch, not a clip
    if needs_trim {
        let _ = std::fs::remove_file(series_dir.join("source_trimmed.mp4"));
    }

    Ok(clips)
}

/// Locates the source video for a generation job, in order of preference:
/// already on disk → wait for an in-flight download of the same source
/// (bounded) → start an acquisition of our own.
async fn resolve_source(
    store: &Arc<dyn JobStore>,
    hub: &Arc<ProgressHub>,
    caps: &Arc<ToolCapabilities>,
    job: &GenerationJob,
) -> AppResult<PathBuf> {
    let expected = source_video_path(&job.video_id);
    if file_non_empty(&expected) {
        return Ok(expected);
    }

    if let Some(download) = store.download_by_video(&job.video_id) {
        match download.status {
            DownloadStatus::Completed => {
                if let Some(path) = download.output_path {
                    let path = PathBuf::from(path);
                    if file_non_empty(&path) {
                        return Ok(path);
                    }
                }
                // Completed job but the file is gone (evicted/cleaned);
                // fall through to a fresh acquisition
            }
            DownloadStatus::Pending | DownloadStatus::Downloading => {
                // Another job already acquires this source: wait for it
                // instead of issuing a duplicate external request
                return wait_for_download(store, hub, job, &download.id).await;
            }
            DownloadStatus::Failed => {
                log::warn!(
                    "previous download of {} failed ({}), acquiring fresh",
                    job.video_id,
                    download.terminal_error.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    acquire_source(store, hub, caps, job, &expected).await?;
    Ok(expected)
}

/// Bounded wait for an in-flight download of the same source, mirroring its
/// progress into this job's 0–20 band.
async fn wait_for_download(
    store: &Arc<dyn JobStore>,
    hub: &Arc<ProgressHub>,
    job: &GenerationJob,
    download_job_id: &str,
) -> AppResult<PathBuf> {
    log::info!(
        "⏳ generation {} waiting on in-flight download {} of {}",
        job.id,
        download_job_id,
        job.video_id
    );
    let deadline = Instant::now() + config::generation::source_wait_timeout();

    loop {
        tokio::time::sleep(config::generation::source_poll_interval()).await;

        let current = store
            .download(download_job_id)
            .ok_or_else(|| AppError::Download("in-flight source download disappeared".to_string()))?;

        match current.status {
            DownloadStatus::Completed => {
                let path = current
                    .output_path
                    .map(PathBuf::from)
                    .filter(|p| file_non_empty(p))
                    .ok_or_else(|| AppError::Download("source download completed without a usable file".to_string()))?;
                return Ok(path);
            }
            DownloadStatus::Failed => {
                return Err(AppError::Download(format!(
                    "source download failed: {}",
                    current.terminal_error.unwrap_or_else(|| "unknown error".to_string())
                )));
            }
            _ => {
                let band = scale_to_band(current.progress_percent);
                publish_progress(store, hub, &job.id, band, format!("Waiting for source download… {}%", current.progress_percent));
            }
        }

        if Instant::now() >= deadline {
            return Err(AppError::Download(format!(
                "timed out after {}s waiting for in-flight download of {}",
                config::generation::SOURCE_WAIT_TIMEOUT_SECS,
                job.video_id
            )));
        }
    }
}

/// Starts an acquisition of our own (robust variant — this path is a worker
/// with nobody watching a dedicated download job, so transient network
/// trouble retries the same profile before advancing).
async fn acquire_source(
    store: &Arc<dyn JobStore>,
    hub: &Arc<ProgressHub>,
    caps: &Arc<ToolCapabilities>,
    job: &GenerationJob,
    output_path: &std::path::Path,
) -> AppResult<()> {
    let video_id = parse_video_id(&job.video_id)?;
    if let Some(dir) = output_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let job_id = job.id.clone();
    acquire_robust(caps, &video_id, output_path, |update| {
        let band = scale_to_band(update.percent);
        publish_progress(store, hub, &job_id, band, format!("Downloading source… {}%", update.percent));
    })
    .await
    .map_err(|e| AppError::Download(e.to_string()))?;

    Ok(())
}

/// True when `path` names a file that exists on disk and is non-empty.
fn file_non_empty(path: &std::path::Path) -> bool {
    std::fs::metadata(path).map_or(false, |meta| meta.len() > 0)
}

/// Maps a raw 0–100 download percent into the 0–20 acquisition band.
fn scale_to_band(percent: u8) -> u8 {
    ((percent as u16 * ACQUIRE_BAND_END as u16) / 100) as u8
}

fn publish_progress(
    store: &Arc<dyn JobStore>,
    hub: &Arc<ProgressHub>,
    job_id: &str,
    percent: u8,
    message: impl Into<String>,
) {
    store.set_generation_progress(job_id, percent);
    hub.publish(ProgressEvent::update(job_id, percent, "processing", message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_scaling_is_proportional() {
        assert_eq!(scale_to_band(0), 0);
        assert_eq!(scale_to_band(50), 10);
        assert_eq!(scale_to_band(100), 20);
    }
}
