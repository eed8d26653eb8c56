//! Job registry: an explicit keyed store with enforced invariants
//!
//! The registry is injected as a trait object so the single-node in-memory
//! backing can be swapped without touching the orchestrator or the web
//! layer. The in-memory implementation enforces the two record invariants —
//! one-way status transitions and monotonic progress — and evicts terminal
//! records after a TTL so the maps don't grow for the process lifetime.

use crate::core::config;
use crate::download::DownloadAttempt;
use crate::jobs::types::{ClipRef, DownloadJob, DownloadStatus, GenerationJob, GenerationStatus};
use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Keyed access to job records. Each job has exactly one logical writer, so
/// methods take `&self` and the backing map only needs per-entry locking.
pub trait JobStore: Send + Sync + 'static {
    fn insert_download(&self, job: DownloadJob);
    fn download(&self, id: &str) -> Option<DownloadJob>;
    /// Most recent download job for a source video, any status.
    fn download_by_video(&self, video_id: &str) -> Option<DownloadJob>;
    fn mark_downloading(&self, id: &str);
    fn set_download_progress(&self, id: &str, percent: u8);
    fn record_attempts(&self, id: &str, attempts: Vec<DownloadAttempt>);
    fn complete_download(&self, id: &str, path: String, size: u64, duration_secs: Option<u64>, strategy: String);
    fn fail_download(&self, id: &str, error: String);

    fn insert_generation(&self, job: GenerationJob);
    fn generation(&self, id: &str) -> Option<GenerationJob>;
    fn set_generation_progress(&self, id: &str, percent: u8);
    fn set_generation_cut_count(&self, id: &str, count: usize);
    fn complete_generation(&self, id: &str, clips: Vec<ClipRef>);
    fn fail_generation(&self, id: &str, error: String);

    /// Removes terminal records older than the given TTL in seconds.
    /// Returns the number of evicted records.
    fn evict_terminal(&self, ttl_secs: i64) -> usize;
}

/// In-process implementation over concurrent maps.
#[derive(Default)]
pub struct InMemoryJobStore {
    downloads: DashMap<String, DownloadJob>,
    generations: DashMap<String, GenerationJob>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert_download(&self, job: DownloadJob) {
        self.downloads.insert(job.id.clone(), job);
    }

    fn download(&self, id: &str) -> Option<DownloadJob> {
        self.downloads.get(id).map(|j| j.clone())
    }

    fn download_by_video(&self, video_id: &str) -> Option<DownloadJob> {
        self.downloads
            .iter()
            .filter(|entry| entry.video_id == video_id)
            .max_by_key(|entry| entry.created_at)
            .map(|entry| entry.value().clone())
    }

    fn mark_downloading(&self, id: &str) {
        if let Some(mut job) = self.downloads.get_mut(id) {
            if !job.status.is_terminal() {
                job.status = DownloadStatus::Downloading;
            }
        }
    }

    fn set_download_progress(&self, id: &str, percent: u8) {
        if let Some(mut job) = self.downloads.get_mut(id) {
            if !job.status.is_terminal() {
                // Monotonic non-decreasing while active
                job.progress_percent = job.progress_percent.max(percent.min(100));
            }
        }
    }

    fn record_attempts(&self, id: &str, attempts: Vec<DownloadAttempt>) {
        if let Some(mut job) = self.downloads.get_mut(id) {
            job.attempts = attempts;
        }
    }

    fn complete_download(&self, id: &str, path: String, size: u64, duration_secs: Option<u64>, strategy: String) {
        if let Some(mut job) = self.downloads.get_mut(id) {
            if job.status.is_terminal() {
                return;
            }
            job.status = DownloadStatus::Completed;
            // Jumping straight to 100 on completion is allowed
            job.progress_percent = 100;
            job.output_path = Some(path);
            job.file_size_bytes = Some(size);
            job.duration_secs = duration_secs;
            job.strategy = Some(strategy);
            job.finished_at = Some(Utc::now());
        }
    }

    fn fail_download(&self, id: &str, error: String) {
        if let Some(mut job) = self.downloads.get_mut(id) {
            if job.status.is_terminal() {
                return;
            }
            job.status = DownloadStatus::Failed;
            job.terminal_error = Some(error);
            job.finished_at = Some(Utc::now());
        }
    }

    fn insert_generation(&self, job: GenerationJob) {
        self.generations.insert(job.id.clone(), job);
    }

    fn generation(&self, id: &str) -> Option<GenerationJob> {
        self.generations.get(id).map(|j| j.clone())
    }

    fn set_generation_progress(&self, id: &str, percent: u8) {
        if let Some(mut job) = self.generations.get_mut(id) {
            if !job.status.is_terminal() {
                job.progress_percent = job.progress_percent.max(percent.min(100));
            }
        }
    }

    fn set_generation_cut_count(&self, id: &str, count: usize) {
        if let Some(mut job) = self.generations.get_mut(id) {
            if !job.status.is_terminal() {
                job.number_of_cuts = count;
            }
        }
    }

    fn complete_generation(&self, id: &str, clips: Vec<ClipRef>) {
        if let Some(mut job) = self.generations.get_mut(id) {
            if job.status.is_terminal() {
                return;
            }
            job.status = GenerationStatus::Completed;
            job.progress_percent = 100;
            job.number_of_cuts = clips.len();
            job.clips = clips;
            job.finished_at = Some(Utc::now());
        }
    }

    fn fail_generation(&self, id: &str, error: String) {
        if let Some(mut job) = self.generations.get_mut(id) {
            if job.status.is_terminal() {
                return;
            }
            job.status = GenerationStatus::Error;
            job.error = Some(error);
            job.finished_at = Some(Utc::now());
        }
    }

    fn evict_terminal(&self, ttl_secs: i64) -> usize {
        let cutoff = Utc::now() - ChronoDuration::seconds(ttl_secs);
        let mut evicted = 0;

        self.downloads.retain(|_, job| {
            let stale = job.status.is_terminal() && job.finished_at.map(|t| t < cutoff).unwrap_or(false);
            if stale {
                evicted += 1;
            }
            !stale
        });
        self.generations.retain(|_, job| {
            let stale = job.status.is_terminal() && job.finished_at.map(|t| t < cutoff).unwrap_or(false);
            if stale {
                evicted += 1;
            }
            !stale
        });

        evicted
    }
}

/// Spawns the periodic eviction sweep for terminal records.
pub fn spawn_eviction_sweeper(store: Arc<dyn JobStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config::jobs::sweep_interval());
        loop {
            ticker.tick().await;
            let evicted = store.evict_terminal(config::jobs::TERMINAL_TTL_SECS);
            if evicted > 0 {
                log::info!("🧹 evicted {} terminal job record(s)", evicted);
            }
        }
    });
}
