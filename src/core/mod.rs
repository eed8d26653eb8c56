//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;
pub mod probe;
pub mod validation;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::{init_logger, log_cookies_configuration};
pub use probe::{probe_tooling, ToolCapabilities};
pub use validation::{parse_video_id, resolve_video_id, VideoId};
