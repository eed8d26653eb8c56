use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the service
/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Path to cookies file for YouTube authentication
/// Read from YTDL_COOKIES_FILE environment variable
/// If set, this takes priority over inline YTDLP_COOKIES content
/// Example: youtube_cookies.txt
pub static YTDL_COOKIES_FILE: Lazy<Option<String>> = Lazy::new(|| env::var("YTDL_COOKIES_FILE").ok());

/// Inline cookie material (Netscape HTTP Cookie File format)
/// Read from YTDLP_COOKIES environment variable and materialised to a temp
/// file at startup when no cookies file is configured
pub static YTDLP_COOKIES: Lazy<Option<String>> = Lazy::new(|| {
    env::var("YTDLP_COOKIES").ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
});

/// User-agent override applied to every strategy profile
/// Read from YTDL_USER_AGENT environment variable
/// When unset, each profile uses its own client fingerprint
pub static YTDL_USER_AGENT: Lazy<Option<String>> = Lazy::new(|| env::var("YTDL_USER_AGENT").ok());

/// Directory holding one file per downloaded source video
/// Read from DOWNLOAD_DIR environment variable
/// Supports tilde (~) expansion for home directory
pub static DOWNLOAD_DIR: Lazy<String> =
    Lazy::new(|| env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "/tmp/clipsmith/videos".to_string()));

/// Directory holding one sub-directory of numbered clips per generation job
/// Read from CLIPS_DIR environment variable
pub static CLIPS_DIR: Lazy<String> =
    Lazy::new(|| env::var("CLIPS_DIR").unwrap_or_else(|_| "/tmp/clipsmith/series".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: clipsmith.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "clipsmith.log".to_string()));

/// HTTP listen port
/// Read from WEB_PORT environment variable
/// Default: 3000
pub static WEB_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("WEB_PORT")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(3000)
});

/// Expands a possibly-relative, possibly-tilde path to an absolute string.
pub fn expand_path(raw: &str) -> String {
    shellexpand::tilde(raw).to_string()
}

/// Download orchestration configuration
pub mod download {
    use super::Duration;

    /// Budget for a single yt-dlp attempt; the child process is killed on
    /// expiry and the attempt is counted as failed, not crashed
    pub const ATTEMPT_TIMEOUT_SECS: u64 = 300; // 5 minutes

    /// Pause before switching to the next client profile
    /// Helps avoid hammering the source right after a rate-limit response
    pub const STRATEGY_SWITCH_DELAY_MS: u64 = 1000;

    /// Per-attempt timeout duration
    pub fn attempt_timeout() -> Duration {
        Duration::from_secs(ATTEMPT_TIMEOUT_SECS)
    }

    /// Strategy switch delay duration
    pub fn strategy_delay() -> Duration {
        Duration::from_millis(STRATEGY_SWITCH_DELAY_MS)
    }
}

/// Retry configuration for the robust acquisition variant
pub mod retry {
    use super::Duration;

    /// Extra same-strategy retries on transient network failures
    pub const MAX_RETRIES_PER_STRATEGY: u32 = 3;

    /// Base for exponential backoff calculation (seconds)
    pub const BACKOFF_BASE_SECS: u64 = 2;

    /// Backoff ceiling between same-strategy retries
    pub const MAX_BACKOFF_SECS: u64 = 30;

    /// Delay before retry attempt `n` (1-based): 2s -> 4s -> 8s, capped
    pub fn backoff_for_attempt(attempt: u32) -> Duration {
        let secs = BACKOFF_BASE_SECS.saturating_pow(attempt).min(MAX_BACKOFF_SECS);
        Duration::from_secs(secs)
    }
}

/// Video info lookup configuration
pub mod info {
    use super::Duration;

    /// Timeout for a single `--dump-json` probe
    pub const TIMEOUT_SECS: u64 = 30;

    /// How long cached metadata stays valid
    pub const CACHE_TTL_SECS: i64 = 3600; // 1 hour

    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

/// Clip generation configuration
pub mod generation {
    use super::Duration;

    /// Bounded wait for another job's in-flight download of the same source
    pub const SOURCE_WAIT_TIMEOUT_SECS: u64 = 180;

    /// Poll interval while waiting for an in-flight download
    pub const SOURCE_POLL_INTERVAL_MS: u64 = 500;

    pub fn source_wait_timeout() -> Duration {
        Duration::from_secs(SOURCE_WAIT_TIMEOUT_SECS)
    }

    pub fn source_poll_interval() -> Duration {
        Duration::from_millis(SOURCE_POLL_INTERVAL_MS)
    }
}

/// Live progress stream configuration
pub mod sse {
    use super::Duration;

    /// Heartbeat interval keeping idle connections alive through proxies
    pub const KEEPALIVE_SECS: u64 = 30;

    /// Per-subscriber channel capacity; a subscriber that falls this far
    /// behind is treated as disconnected
    pub const CHANNEL_CAPACITY: usize = 32;

    pub fn keepalive() -> Duration {
        Duration::from_secs(KEEPALIVE_SECS)
    }
}

/// Job registry retention configuration
pub mod jobs {
    use super::Duration;

    /// How long terminal job records are kept before eviction
    pub const TERMINAL_TTL_SECS: i64 = 3600; // 1 hour

    /// Interval between eviction sweeps
    pub const SWEEP_INTERVAL_SECS: u64 = 300;

    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}
