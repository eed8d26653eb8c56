//! Deterministic segmentation of a bounded window into fixed-duration clips
//!
//! `count = floor((end - start) / clip_duration)`; fractional remainders are
//! dropped, never rounded. Clips are produced sequentially — one ffmpeg at a
//! time bounds peak CPU and disk — and each clip starts exactly where the
//! previous one ended, so there are no gaps or overlaps.

use crate::core::error::{AppError, AppResult};
use crate::core::probe::ToolCapabilities;
use crate::clips::trimmer::trim_segment;
use crate::jobs::types::ClipRef;
use std::path::Path;

/// Derives the clip count for a window, failing fast when the selected
/// window is shorter than a single clip.
pub fn clip_count(start_secs: u64, end_secs: u64, clip_duration_secs: u64) -> AppResult<usize> {
    if clip_duration_secs == 0 {
        return Err(AppError::Media("clip duration must be positive".to_string()));
    }
    if end_secs <= start_secs {
        return Err(AppError::Media(format!(
            "invalid window: end {}s must be greater than start {}s",
            end_secs, start_secs
        )));
    }

    let window = end_secs - start_secs;
    let count = (window / clip_duration_secs) as usize;
    if count == 0 {
        return Err(AppError::ClipCountTooLow {
            window_secs: window,
            clip_secs: clip_duration_secs,
        });
    }
    Ok(count)
}

/// Splits `[start, end)` of `source` into sequential fixed-duration clips
/// under `out_dir`, validating every output before it is accepted.
///
/// `on_clip(produced, total)` fires after each clip so callers can report
/// proportional progress. A failure on any individual clip aborts the
/// remaining sequence — partial results are never silently accepted.
pub async fn split_into_clips<F>(
    caps: &ToolCapabilities,
    source: &Path,
    out_dir: &Path,
    clip_duration_secs: u64,
    start_secs: u64,
    end_secs: u64,
    mut on_clip: F,
) -> AppResult<Vec<ClipRef>>
where
    F: FnMut(usize, usize),
{
    let count = clip_count(start_secs, end_secs, clip_duration_secs)?;
    std::fs::create_dir_all(out_dir)?;

    log::info!(
        "🎬 splitting {} into {} clip(s) of {}s ({}s–{}s)",
        source.display(),
        count,
        clip_duration_secs,
        start_secs,
        end_secs
    );

    let mut clips = Vec::with_capacity(count);
    for i in 0..count {
        let clip_start = start_secs + (i as u64) * clip_duration_secs;
        let clip_path = out_dir.join(format!("clip_{:03}.mp4", i + 1));

        trim_segment(
            caps,
            source,
            &clip_path,
            clip_start as f64,
            clip_duration_secs as f64,
        )
        .await
        .map_err(|e| AppError::Media(format!("clip {}/{} failed: {}", i + 1, count, e)))?;

        let size = std::fs::metadata(&clip_path).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            let _ = std::fs::remove_file(&clip_path);
            return Err(AppError::Media(format!(
                "clip {}/{} is empty: {}",
                i + 1,
                count,
                clip_path.display()
            )));
        }

        clips.push(ClipRef {
            index: i + 1,
            path: clip_path.to_string_lossy().to_string(),
            file_size_bytes: size,
        });
        on_clip(i + 1, count);
    }

    log::info!("✅ produced all {} clip(s)", clips.len());
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn count_drops_fractional_remainder() {
        // 185s window at 60s per clip: the trailing 5s are discarded
        assert_eq!(clip_count(0, 185, 60).unwrap(), 3);
        assert_eq!(clip_count(0, 180, 60).unwrap(), 3);
        assert_eq!(clip_count(0, 179, 60).unwrap(), 2);
        assert_eq!(clip_count(10, 70, 60).unwrap(), 1);
        assert_eq!(clip_count(30, 330, 120).unwrap(), 2);
    }

    #[test]
    fn count_too_low_is_an_error() {
        match clip_count(0, 45, 60) {
            Err(AppError::ClipCountTooLow { window_secs, clip_secs }) => {
                assert_eq!(window_secs, 45);
                assert_eq!(clip_secs, 60);
            }
            other => panic!("expected ClipCountTooLow, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_degenerate_windows() {
        assert!(clip_count(100, 100, 60).is_err());
        assert!(clip_count(100, 50, 60).is_err());
        assert!(clip_count(0, 100, 0).is_err());
    }
}
