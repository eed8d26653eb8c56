//! YouTube URL validation and canonical video id extraction
//!
//! Whitelist-based validation that runs before any subprocess is spawned:
//! only HTTP/HTTPS URLs on youtube.com / youtu.be / youtube-nocookie.com
//! (plus subdomains) are accepted, and the 11-character video id is pulled
//! out of the watch / short-link / embed / shorts shapes. Playlist and radio
//! query parameters are dropped by construction: the canonical watch URL
//! carries only the video id.

use crate::core::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// A validated 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern, checked by tests
    Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap()
});

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL with playlist/radio parameters stripped.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates a raw URL string and extracts the canonical video id.
///
/// Accepted shapes:
/// - `https://www.youtube.com/watch?v=<id>` (extra query params ignored)
/// - `https://youtu.be/<id>`
/// - `https://www.youtube.com/embed/<id>`
/// - `https://www.youtube.com/shorts/<id>`
/// - `https://www.youtube.com/live/<id>`
///
/// Fails with [`AppError::InvalidUrl`] synchronously; no I/O happens here.
pub fn resolve_video_id(raw: &str) -> Result<VideoId, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("empty URL".to_string()));
    }

    let parsed = Url::parse(trimmed).map_err(|_| AppError::InvalidUrl(trimmed.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::InvalidUrl(format!(
            "{} (invalid scheme: {})",
            trimmed,
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::InvalidUrl(format!("{} (no host)", trimmed)))?;

    let is_youtube = host == "youtube.com"
        || host.ends_with(".youtube.com")
        || host == "youtu.be"
        || host == "youtube-nocookie.com"
        || host.ends_with(".youtube-nocookie.com");

    if !is_youtube {
        return Err(AppError::InvalidUrl(format!(
            "{} (not a YouTube domain: {})",
            trimmed, host
        )));
    }

    let candidate = extract_id_candidate(&parsed)
        .ok_or_else(|| AppError::InvalidUrl(format!("{} (no video id found)", trimmed)))?;

    if !VIDEO_ID_RE.is_match(&candidate) {
        return Err(AppError::InvalidUrl(format!(
            "{} (malformed video id: {})",
            trimmed, candidate
        )));
    }

    Ok(VideoId(candidate))
}

/// Validates a bare video id (as supplied by generation requests).
pub fn parse_video_id(raw: &str) -> Result<VideoId, AppError> {
    let trimmed = raw.trim();
    if VIDEO_ID_RE.is_match(trimmed) {
        Ok(VideoId(trimmed.to_string()))
    } else {
        Err(AppError::InvalidUrl(format!("malformed video id: {}", trimmed)))
    }
}

/// Pulls the id out of the known URL shapes, without validating it yet.
fn extract_id_candidate(url: &Url) -> Option<String> {
    let host = url.host_str()?;

    // Short links carry the id as the first path segment
    if host == "youtu.be" {
        return url.path_segments()?.next().map(|s| s.to_string()).filter(|s| !s.is_empty());
    }

    // watch?v=<id> — the only query parameter we honour; list=/start_radio=
    // and friends are dropped so the extractor never fetches a playlist
    if url.path() == "/watch" {
        return url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.to_string());
    }

    // embed/<id>, shorts/<id>, live/<id>
    let mut segments = url.path_segments()?;
    match segments.next() {
        Some("embed") | Some("shorts") | Some("live") | Some("v") => {
            segments.next().map(|s| s.to_string()).filter(|s| !s.is_empty())
        }
        _ => None,
    }
}
