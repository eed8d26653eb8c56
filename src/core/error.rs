use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting. Strategy-level download failures are classified inside the
/// orchestrator and only reach this enum as a single synthesized error.
#[derive(Error, Debug)]
pub enum AppError {
    /// URL failed validation before any subprocess was spawned
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    /// Download/yt-dlp errors
    #[error("Download error: {0}")]
    Download(String),

    /// ffmpeg/ffprobe errors
    #[error("Media processing error: {0}")]
    Media(String),

    /// Selected window is shorter than one clip duration
    #[error("Selected window of {window_secs}s is shorter than one clip of {clip_secs}s")]
    ClipCountTooLow { window_secs: u64, clip_secs: u64 },

    /// Status query for an unknown job id
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Helper conversion so subprocess diagnostics can be raised as download errors
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Download(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Download(err.to_string())
    }
}
