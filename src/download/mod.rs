//! Download acquisition: strategy catalogue, orchestration, progress parsing

pub mod classify;
pub mod cookies;
pub mod error;
pub mod metadata;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod strategy;

// Re-exports for convenience
pub use error::{AcquireError, AttemptOutcome, DownloadAttempt};
pub use metadata::{fetch_video_info, VideoMetadata};
pub use orchestrator::{acquire, acquire_robust, acquire_with_options, AcquireOptions, Acquisition};
pub use progress::{parse_progress, ProgressTracker, ProgressUpdate};
pub use strategy::{Strategy, CATALOGUE};
