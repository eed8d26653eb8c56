//! Video metadata lookup through the strategy catalogue
//!
//! Uses `--dump-json` so nothing is downloaded. The same profiles, in the
//! same order, as the download path — a video that previews through the
//! `ios` profile will also fetch through it. Results are cached per video id
//! with a TTL so repeated previews of the same video don't hammer the source.

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::probe::ToolCapabilities;
use crate::core::validation::VideoId;
use crate::download::classify::{classify_failure, error_excerpt, FailureKind};
use crate::download::cookies;
use crate::download::strategy::CATALOGUE;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::process::Stdio;
use tokio::time::timeout;

/// Metadata returned by the info-lookup path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub duration_secs: u64,
    pub thumbnail: String,
    pub uploader: String,
    pub view_count: u64,
    /// Name of the profile that answered
    pub strategy: &'static str,
}

static INFO_CACHE: Lazy<DashMap<String, (VideoMetadata, DateTime<Utc>)>> = Lazy::new(DashMap::new);

/// Fetches metadata for a video, serving from cache when fresh.
pub async fn fetch_video_info(caps: &ToolCapabilities, video_id: &VideoId) -> AppResult<VideoMetadata> {
    if let Some(entry) = INFO_CACHE.get(video_id.as_str()) {
        let (cached, stored_at) = entry.value();
        let age = Utc::now().signed_duration_since(*stored_at).num_seconds();
        if age < config::info::CACHE_TTL_SECS {
            log::debug!("info cache hit for {} (age {}s)", video_id, age);
            return Ok(cached.clone());
        }
    }

    let metadata = lookup_through_catalogue(caps, video_id).await?;
    INFO_CACHE.insert(video_id.as_str().to_string(), (metadata.clone(), Utc::now()));
    Ok(metadata)
}

/// Walks the catalogue with `--dump-json` until one profile answers.
async fn lookup_through_catalogue(caps: &ToolCapabilities, video_id: &VideoId) -> AppResult<VideoMetadata> {
    let url = video_id.watch_url();
    let cookie_file = cookies::cookies_path();
    let mut last_excerpt = String::new();

    for strategy in CATALOGUE {
        log::info!("🔍 [{}] info lookup for {}", strategy.name, video_id);

        let output = timeout(
            config::info::timeout(),
            caps.ytdlp
                .command()
                .args(strategy.info_args(&url, cookie_file))
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match output {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(AppError::Download(format!("failed to launch downloader: {}", e)));
            }
            Err(_) => {
                log::warn!("⏱️ [{}] info lookup timed out, advancing", strategy.name);
                continue;
            }
        };

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            return parse_metadata(&stdout, video_id, strategy.name);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        last_excerpt = error_excerpt(&stderr, 300);
        match classify_failure(&stderr) {
            FailureKind::Fatal => {
                return Err(AppError::Download(format!("source video unavailable: {}", last_excerpt)));
            }
            kind => {
                log::warn!("⚠️ [{}] info lookup classified {:?}, advancing", strategy.name, kind);
            }
        }
    }

    Err(AppError::Download(format!(
        "info lookup rejected by all client profiles: {}",
        last_excerpt
    )))
}

/// Maps the `--dump-json` document to our metadata shape.
fn parse_metadata(raw: &str, video_id: &VideoId, strategy: &'static str) -> AppResult<VideoMetadata> {
    let doc: serde_json::Value =
        serde_json::from_str(raw.trim()).map_err(|e| AppError::Download(format!("invalid metadata JSON: {}", e)))?;

    Ok(VideoMetadata {
        video_id: doc
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or(video_id.as_str())
            .to_string(),
        title: doc
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Untitled")
            .to_string(),
        duration_secs: doc.get("duration").and_then(|v| v.as_f64()).unwrap_or(0.0) as u64,
        thumbnail: doc
            .get("thumbnail")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)),
        uploader: doc
            .get("uploader")
            .or_else(|| doc.get("channel"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string(),
        view_count: doc.get("view_count").and_then(|v| v.as_u64()).unwrap_or(0),
        strategy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::resolve_video_id;

    #[test]
    fn maps_dump_json_fields() {
        let id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let raw = r#"{"id":"dQw4w9WgXcQ","title":"Test","duration":212.5,"thumbnail":"https://i.ytimg.com/x.jpg","uploader":"Someone","view_count":42}"#;
        let meta = parse_metadata(raw, &id, "android").unwrap();
        assert_eq!(meta.title, "Test");
        assert_eq!(meta.duration_secs, 212);
        assert_eq!(meta.view_count, 42);
        assert_eq!(meta.strategy, "android");
    }

    #[test]
    fn fills_defaults_for_missing_fields() {
        let id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let meta = parse_metadata("{}", &id, "web").unwrap();
        assert_eq!(meta.video_id, "dQw4w9WgXcQ");
        assert_eq!(meta.title, "Untitled");
        assert!(meta.thumbnail.contains("dQw4w9WgXcQ"));
    }

    #[test]
    fn rejects_non_json_output() {
        let id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(parse_metadata("not json", &id, "web").is_err());
    }
}
