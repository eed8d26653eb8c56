//! Clipsmith - YouTube clip generation service
//!
//! Downloads a source video through a multi-strategy yt-dlp orchestrator,
//! splits it into fixed-duration clips with ffmpeg, and streams live
//! progress to any number of SSE subscribers.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, validation, tool probing
//! - `download`: strategy catalogue, orchestrator, progress parsing
//! - `jobs`: job registry and the clip-generation state machine
//! - `clips`: ffmpeg trimming and fixed-duration segmentation
//! - `events`: per-job progress fan-out
//! - `web`: HTTP surface

pub mod cli;
pub mod clips;
pub mod core;
pub mod download;
pub mod events;
pub mod jobs;
pub mod web;

// Re-export commonly used types for convenience
pub use core::{AppError, AppResult, ToolCapabilities, VideoId};
pub use events::{ProgressEvent, ProgressHub};
pub use jobs::{InMemoryJobStore, JobStore};
