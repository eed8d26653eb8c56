//! Acquisition failure types and the per-attempt log
//!
//! Strategy-level failures never leave the orchestrator as raw errors; they
//! are folded into a single [`AcquireError`] carrying the full attempt log
//! so diagnostics survive the classification step.

use crate::core::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Outcome of a single execution of the extraction process under one
/// strategy. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Blocked,
    FormatUnavailable,
    Network,
    TimedOut,
    EmptyOutput,
    Fatal,
}

/// One entry of a job's attempt log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadAttempt {
    pub strategy: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_excerpt: Option<String>,
}

/// Terminal acquisition failures.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Every profile was classified blocked/format-unavailable/timed-out —
    /// the source is rejecting automated access at the network level
    #[error("source rejected all {} client profiles (network-level blocking)", .attempts.len())]
    AllStrategiesExhausted { attempts: Vec<DownloadAttempt> },

    /// The video itself is private/removed; retrying cannot fix it
    #[error("source video unavailable: {excerpt}")]
    FatalSource {
        excerpt: String,
        attempts: Vec<DownloadAttempt>,
    },

    /// The extraction process could not be launched at all
    #[error("failed to launch downloader: {0}")]
    Spawn(String),
}

impl AcquireError {
    /// The attempt log accumulated before the failure, when one exists.
    pub fn attempts(&self) -> &[DownloadAttempt] {
        match self {
            AcquireError::AllStrategiesExhausted { attempts } => attempts,
            AcquireError::FatalSource { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

impl From<AcquireError> for AppError {
    fn from(err: AcquireError) -> Self {
        AppError::Download(err.to_string())
    }
}
