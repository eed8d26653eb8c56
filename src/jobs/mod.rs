//! Job registry and the clip-generation state machine

pub mod generation;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use generation::run_generation_job;
pub use store::{spawn_eviction_sweeper, InMemoryJobStore, JobStore};
pub use types::{ClipRef, DownloadJob, DownloadStatus, GenerationJob, GenerationStatus};
