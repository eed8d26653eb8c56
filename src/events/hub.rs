//! Progress event hub: per-job fan-out to live subscribers
//!
//! Multiplexes a job's progress events to any number of concurrently
//! subscribed channels. Subscribers arrive and disconnect while publishes
//! are in flight, so the per-job channel set lives in a concurrency-safe
//! map. The hub retains only the latest event per job, which is replayed to
//! late subscribers so they are never left blank.

use crate::core::config;
use crate::jobs::types::ClipRef;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;

/// One live progress message, also the SSE wire format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_id: String,
    pub progress: u8,
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playable_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clips: Option<Vec<ClipRef>>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Plain progress update for an active job.
    pub fn update(job_id: &str, progress: u8, status: &str, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.to_string(),
            progress,
            status: status.to_string(),
            message: message.into(),
            completed: None,
            error: None,
            video_id: None,
            duration_secs: None,
            playable_url: None,
            clips: None,
            timestamp: Utc::now(),
        }
    }

    /// Terminal error event; always delivered regardless of progress value.
    pub fn failure(job_id: &str, status: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            job_id: job_id.to_string(),
            progress: 100,
            status: status.to_string(),
            message: error.clone(),
            completed: Some(true),
            error: Some(error),
            video_id: None,
            duration_secs: None,
            playable_url: None,
            clips: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.completed == Some(true) || self.error.is_some()
    }
}

#[derive(Default)]
struct JobChannel {
    last: Option<ProgressEvent>,
    subscribers: Vec<mpsc::Sender<ProgressEvent>>,
    /// Set when the terminal event has been delivered; late subscribers get
    /// the replay and an immediately-closed stream
    closed: bool,
}

/// Publish/subscribe hub keyed by job id.
#[derive(Default)]
pub struct ProgressHub {
    jobs: DashMap<String, JobChannel>,
}

impl ProgressHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the event to every open channel for the job, pruning channels
    /// that refuse the write (disconnected or hopelessly lagging clients).
    ///
    /// Non-increasing progress with an unchanged status is suppressed so all
    /// subscribers observe one identical, deduplicated, monotonic sequence.
    /// Terminal events always pass, and close the job's subscriber set.
    pub fn publish(&self, event: ProgressEvent) {
        let mut channel = self.jobs.entry(event.job_id.clone()).or_default();

        if channel.closed {
            return;
        }
        if !event.is_terminal() {
            if let Some(last) = &channel.last {
                if event.progress <= last.progress && event.status == last.status {
                    return;
                }
            }
        }

        let terminal = event.is_terminal();
        channel.last = Some(event.clone());
        channel.subscribers.retain(|tx| tx.try_send(event.clone()).is_ok());

        if terminal {
            // Dropping the senders ends every subscriber's stream
            channel.subscribers.clear();
            channel.closed = true;
        }
    }

    /// Registers a new subscriber channel and immediately replays the last
    /// known event, if any. For already-terminal jobs the returned stream
    /// yields the terminal event and then ends.
    pub fn subscribe(&self, job_id: &str) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(config::sse::CHANNEL_CAPACITY);
        let mut channel = self.jobs.entry(job_id.to_string()).or_default();

        if let Some(last) = &channel.last {
            let _ = tx.try_send(last.clone());
        }
        if !channel.closed {
            channel.subscribers.push(tx);
        }
        rx
    }

    /// Latest retained event for a job, if any.
    pub fn last_event(&self, job_id: &str) -> Option<ProgressEvent> {
        self.jobs.get(job_id).and_then(|c| c.last.clone())
    }

    /// Open subscriber channels for a job (diagnostics).
    pub fn subscriber_count(&self, job_id: &str) -> usize {
        self.jobs.get(job_id).map(|c| c.subscribers.len()).unwrap_or(0)
    }

    /// Drops all retained state for a job. Used by the eviction sweep once
    /// the job record itself is gone.
    pub fn remove(&self, job_id: &str) {
        self.jobs.remove(job_id);
    }
}
