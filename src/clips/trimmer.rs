//! Single-segment trimming and duration probing via ffmpeg/ffprobe
//!
//! Every cut is re-encoded rather than stream-copied: a stream copy can only
//! start on the source's own keyframes, which puts the real cut seconds away
//! from the requested one. Re-encoding guarantees each output starts on a
//! clean keyframe exactly at the requested boundary.

use crate::core::error::{AppError, AppResult};
use crate::core::probe::ToolCapabilities;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Re-encodes `[start, start+duration)` of `input` into `output`.
pub async fn trim_segment(
    caps: &ToolCapabilities,
    input: &Path,
    output: &Path,
    start_secs: f64,
    duration_secs: f64,
) -> AppResult<()> {
    validate_input(input)?;
    if duration_secs <= 0.0 {
        return Err(AppError::Media(format!(
            "invalid trim duration: {:.2}s (start {:.2}s)",
            duration_secs, start_secs
        )));
    }
    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir)?;
    }

    log::info!(
        "✂️ trimming {} [{:.2}s +{:.2}s] -> {}",
        input.display(),
        start_secs,
        duration_secs,
        output.display()
    );

    // -ss before -i: fast input seeking; -t for the exact duration.
    // Timestamps are regenerated so clips starting mid-stream don't carry
    // negative PTS into players.
    let result = Command::new(&caps.ffmpeg_bin)
        .arg("-ss")
        .arg(format!("{:.3}", start_secs))
        .arg("-i")
        .arg(input)
        .arg("-t")
        .arg(format!("{:.3}", duration_secs))
        .arg("-c:v")
        .arg("libx264")
        .arg("-c:a")
        .arg("aac")
        .arg("-preset")
        .arg("veryfast")
        .arg("-crf")
        .arg("23")
        .arg("-movflags")
        .arg("+faststart")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-avoid_negative_ts")
        .arg("make_zero")
        .arg("-fflags")
        .arg("+genpts")
        .arg("-y")
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| AppError::Media(format!("failed to launch ffmpeg: {}", e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let tail: String = stderr.chars().rev().take(400).collect::<Vec<_>>().into_iter().rev().collect();
        return Err(AppError::Media(format!("ffmpeg trim failed: {}", tail.trim())));
    }

    let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        let _ = std::fs::remove_file(output);
        return Err(AppError::Media(format!(
            "ffmpeg produced an empty file: {}",
            output.display()
        )));
    }

    log::info!("✅ trim done: {} ({:.2} MB)", output.display(), size as f64 / 1024.0 / 1024.0);
    Ok(())
}

/// Probes the container duration in seconds via ffprobe.
pub async fn probe_duration_secs(caps: &ToolCapabilities, input: &Path) -> AppResult<f64> {
    validate_input(input)?;

    let result = Command::new(&caps.ffprobe_bin)
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("json")
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| AppError::Media(format!("failed to launch ffprobe: {}", e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(AppError::Media(format!("ffprobe failed: {}", stderr.trim())));
    }

    let doc: serde_json::Value = serde_json::from_slice(&result.stdout)?;
    let duration = doc
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    if duration <= 0.0 {
        return Err(AppError::Media(format!(
            "ffprobe reported no duration for {}",
            input.display()
        )));
    }
    Ok(duration)
}

/// Input must exist and be non-empty before any process is spawned.
fn validate_input(input: &Path) -> AppResult<()> {
    let meta = std::fs::metadata(input)
        .map_err(|_| AppError::Media(format!("source file not found: {}", input.display())))?;
    if meta.len() == 0 {
        return Err(AppError::Media(format!("source file is empty: {}", input.display())));
    }
    Ok(())
}
