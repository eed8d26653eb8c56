//! Job records tracked by the registry
//!
//! Two kinds of asynchronous work are tracked: source-video downloads and
//! clip-generation runs. Both carry a one-way status and a monotonic
//! non-decreasing progress percent; the store enforces both invariants.

use crate::download::DownloadAttempt;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Download job lifecycle. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl DownloadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::Failed)
    }
}

/// One tracked source-video download.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadJob {
    pub id: String,
    pub source_url: String,
    pub video_id: String,
    pub status: DownloadStatus,
    pub progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    /// Name of the profile that eventually succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    pub attempts: Vec<DownloadAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl DownloadJob {
    pub fn new(source_url: String, video_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_url,
            video_id,
            status: DownloadStatus::Pending,
            progress_percent: 0,
            output_path: None,
            file_size_bytes: None,
            duration_secs: None,
            strategy: None,
            attempts: Vec::new(),
            terminal_error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Clip-generation job lifecycle. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Processing,
    Completed,
    Error,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Error)
    }
}

/// One clip produced by the splitter. The count is always derived from the
/// window and clip duration, never supplied by a caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipRef {
    pub index: usize,
    pub path: String,
    pub file_size_bytes: u64,
}

/// One tracked clip-generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub id: String,
    pub series_id: String,
    pub video_id: String,
    pub number_of_cuts: usize,
    pub trim_start_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_end_secs: Option<u64>,
    pub cut_duration_secs: u64,
    pub status: GenerationStatus,
    pub progress_percent: u8,
    pub clips: Vec<ClipRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    pub fn new(video_id: String, trim_start_secs: u64, trim_end_secs: Option<u64>, cut_duration_secs: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            series_id: uuid::Uuid::new_v4().to_string(),
            video_id,
            number_of_cuts: 0,
            trim_start_secs,
            trim_end_secs,
            cut_duration_secs,
            status: GenerationStatus::Processing,
            progress_percent: 0,
            clips: Vec::new(),
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}
