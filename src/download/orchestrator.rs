//! Multi-strategy download orchestrator
//!
//! Drives the client-profile catalogue against a hostile, rate-limiting
//! source: for each profile it spawns one extraction process, watches its
//! output for progress, classifies the failure and decides whether to retry
//! the same profile, fall back to the next one, or abort. The whole
//! acquisition is modelled as a plain loop over `{strategy, attempt}` with a
//! single terminating check, so the exhaustion condition is auditable in one
//! place.

use crate::core::config;
use crate::core::probe::ToolCapabilities;
use crate::core::validation::VideoId;
use crate::download::classify::{classify_failure, error_excerpt, FailureKind};
use crate::download::cookies;
use crate::download::error::{AcquireError, AttemptOutcome, DownloadAttempt};
use crate::download::progress::{parse_progress, ProgressTracker, ProgressUpdate};
use crate::download::strategy::{Strategy, CATALOGUE};
use chrono::Utc;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Lines of process output kept for failure classification.
const OUTPUT_TAIL_LINES: usize = 200;

/// Characters of diagnostics recorded per attempt.
const EXCERPT_CHARS: usize = 400;

/// Tuning knobs for one acquisition. Defaults come from config; tests and
/// the robust variant override them.
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    pub attempt_timeout: Duration,
    pub strategy_delay: Duration,
    /// Extra same-strategy retries on transient network failures.
    /// 0 = plain variant: every failure advances to the next profile.
    pub retries_per_strategy: u32,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            attempt_timeout: config::download::attempt_timeout(),
            strategy_delay: config::download::strategy_delay(),
            retries_per_strategy: 0,
        }
    }
}

impl AcquireOptions {
    /// Options for the robust variant: transient network failures retry the
    /// same profile with exponential backoff before advancing.
    pub fn robust() -> Self {
        Self {
            retries_per_strategy: config::retry::MAX_RETRIES_PER_STRATEGY,
            ..Self::default()
        }
    }
}

/// Result of a successful acquisition.
#[derive(Debug)]
pub struct Acquisition {
    pub output_path: PathBuf,
    pub file_size_bytes: u64,
    /// Name of the profile that succeeded
    pub strategy: &'static str,
    /// Full attempt log, successful attempt included
    pub attempts: Vec<DownloadAttempt>,
}

/// Acquires a source video: `acquire(url) -> outputPath` in contract terms.
///
/// Plain variant: every classified failure except `Fatal` advances to the
/// next profile; `Fatal` aborts the whole acquisition immediately.
pub async fn acquire<F>(
    caps: &ToolCapabilities,
    video_id: &VideoId,
    output_path: &Path,
    on_progress: F,
) -> Result<Acquisition, AcquireError>
where
    F: FnMut(ProgressUpdate),
{
    acquire_with_options(caps, video_id, output_path, AcquireOptions::default(), on_progress).await
}

/// Robust variant: additionally retries the same profile up to a fixed cap
/// with exponential backoff on transient network failures.
pub async fn acquire_robust<F>(
    caps: &ToolCapabilities,
    video_id: &VideoId,
    output_path: &Path,
    on_progress: F,
) -> Result<Acquisition, AcquireError>
where
    F: FnMut(ProgressUpdate),
{
    acquire_with_options(caps, video_id, output_path, AcquireOptions::robust(), on_progress).await
}

/// The finite loop over `{strategy index, attempt index}` both variants share.
pub async fn acquire_with_options<F>(
    caps: &ToolCapabilities,
    video_id: &VideoId,
    output_path: &Path,
    options: AcquireOptions,
    mut on_progress: F,
) -> Result<Acquisition, AcquireError>
where
    F: FnMut(ProgressUpdate),
{
    let url = video_id.watch_url();
    let cookie_file = cookies::cookies_path();
    let mut attempts: Vec<DownloadAttempt> = Vec::new();
    // One tracker across all attempts: a retry restarting from 0% must not
    // regress the progress consumers already saw
    let mut tracker = ProgressTracker::new();

    for (index, strategy) in CATALOGUE.iter().enumerate() {
        let mut same_strategy_try: u32 = 0;

        loop {
            same_strategy_try += 1;
            let started_at = Utc::now();
            let t0 = Instant::now();

            log::info!(
                "📡 [{}] attempt {} for {} ({}/{} profiles)",
                strategy.name,
                same_strategy_try,
                video_id,
                index + 1,
                CATALOGUE.len()
            );

            let result = run_attempt(
                caps,
                strategy,
                &url,
                output_path,
                cookie_file,
                options.attempt_timeout,
                &mut tracker,
                &mut on_progress,
            )
            .await?;
            let duration_ms = t0.elapsed().as_millis() as u64;

            match result {
                AttemptResult::Success { file_size } => {
                    attempts.push(DownloadAttempt {
                        strategy: strategy.name.to_string(),
                        started_at,
                        duration_ms,
                        outcome: AttemptOutcome::Success,
                        error_excerpt: None,
                    });
                    if let Some(final_update) = tracker.finish(file_size) {
                        on_progress(final_update);
                    }
                    log::info!(
                        "✅ [{}] downloaded {} ({:.2} MB, {} attempt(s))",
                        strategy.name,
                        video_id,
                        file_size as f64 / 1024.0 / 1024.0,
                        attempts.len()
                    );
                    return Ok(Acquisition {
                        output_path: output_path.to_path_buf(),
                        file_size_bytes: file_size,
                        strategy: strategy.name,
                        attempts,
                    });
                }
                AttemptResult::TimedOut => {
                    log::warn!("⏱️ [{}] attempt timed out, advancing", strategy.name);
                    attempts.push(DownloadAttempt {
                        strategy: strategy.name.to_string(),
                        started_at,
                        duration_ms,
                        outcome: AttemptOutcome::TimedOut,
                        error_excerpt: None,
                    });
                    break;
                }
                AttemptResult::EmptyOutput => {
                    log::warn!("🗑️ [{}] produced an empty file, advancing", strategy.name);
                    attempts.push(DownloadAttempt {
                        strategy: strategy.name.to_string(),
                        started_at,
                        duration_ms,
                        outcome: AttemptOutcome::EmptyOutput,
                        error_excerpt: None,
                    });
                    break;
                }
                AttemptResult::Failed { kind, excerpt } => {
                    let outcome = match kind {
                        FailureKind::Blocked => AttemptOutcome::Blocked,
                        FailureKind::FormatUnavailable => AttemptOutcome::FormatUnavailable,
                        FailureKind::Network => AttemptOutcome::Network,
                        FailureKind::Fatal => AttemptOutcome::Fatal,
                    };
                    attempts.push(DownloadAttempt {
                        strategy: strategy.name.to_string(),
                        started_at,
                        duration_ms,
                        outcome,
                        error_excerpt: Some(excerpt.clone()),
                    });

                    match kind {
                        // Retrying cannot fix an unavailable video: stop here
                        // without touching the remaining profiles
                        FailureKind::Fatal => {
                            log::error!("💀 [{}] fatal source error: {}", strategy.name, excerpt);
                            return Err(AcquireError::FatalSource { excerpt, attempts });
                        }
                        FailureKind::Network if same_strategy_try <= options.retries_per_strategy => {
                            let backoff = config::retry::backoff_for_attempt(same_strategy_try);
                            log::warn!(
                                "🔄 [{}] transient network failure, retrying same profile in {:?}",
                                strategy.name,
                                backoff
                            );
                            tokio::time::sleep(backoff).await;
                            continue;
                        }
                        _ => {
                            log::warn!("⚠️ [{}] classified {:?}, advancing", strategy.name, kind);
                            break;
                        }
                    }
                }
            }
        }

        if index + 1 < CATALOGUE.len() {
            tokio::time::sleep(options.strategy_delay).await;
        }
    }

    log::error!(
        "❌ all {} profiles failed for {} ({} attempts)",
        CATALOGUE.len(),
        video_id,
        attempts.len()
    );
    Err(AcquireError::AllStrategiesExhausted { attempts })
}

/// Outcome of one child-process execution.
enum AttemptResult {
    Success { file_size: u64 },
    Failed { kind: FailureKind, excerpt: String },
    TimedOut,
    EmptyOutput,
}

/// Runs one extraction process under one strategy.
#[allow(clippy::too_many_arguments)]
async fn run_attempt<F>(
    caps: &ToolCapabilities,
    strategy: &Strategy,
    url: &str,
    output_path: &Path,
    cookie_file: Option<&Path>,
    attempt_timeout: Duration,
    tracker: &mut ProgressTracker,
    on_progress: &mut F,
) -> Result<AttemptResult, AcquireError>
where
    F: FnMut(ProgressUpdate),
{
    cleanup_partial_download(output_path);

    let args = strategy.download_args(output_path, url, cookie_file);
    log::debug!("spawning {} {}", caps.ytdlp.display(), args.join(" "));

    let mut child = caps
        .ytdlp
        .command()
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AcquireError::Spawn(format!("{}: {}", caps.ytdlp.display(), e)))?;

    // Pump both streams into one line channel; yt-dlp reports progress on
    // either depending on version and flags
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        let tx = line_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let tx = line_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }
    drop(line_tx);

    let mut tail: VecDeque<String> = VecDeque::with_capacity(OUTPUT_TAIL_LINES);
    let waited = timeout(
        attempt_timeout,
        drain_and_wait(&mut child, &mut line_rx, &mut tail, tracker, on_progress),
    )
    .await;

    let status = match waited {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            return Ok(AttemptResult::Failed {
                kind: FailureKind::Network,
                excerpt: format!("downloader process failed: {}", e),
            });
        }
        Err(_elapsed) => {
            // Budget exceeded: kill the child and count a failed attempt
            let _ = child.kill().await;
            cleanup_partial_download(output_path);
            return Ok(AttemptResult::TimedOut);
        }
    };

    if status.success() {
        return match locate_output(output_path) {
            Some(file_size) => Ok(AttemptResult::Success { file_size }),
            None => {
                // Exit 0 with a zero-byte (or missing) file is a hard
                // failure, never a partial success; the file is removed so
                // it can't show up in later listings
                cleanup_partial_download(output_path);
                Ok(AttemptResult::EmptyOutput)
            }
        };
    }

    let combined = tail.make_contiguous().join("\n");
    let kind = classify_failure(&combined);
    cleanup_partial_download(output_path);
    Ok(AttemptResult::Failed {
        kind,
        excerpt: error_excerpt(&combined, EXCERPT_CHARS),
    })
}

/// Drains output lines (forwarding progress) until EOF, then reaps the child.
async fn drain_and_wait<F>(
    child: &mut Child,
    line_rx: &mut mpsc::UnboundedReceiver<String>,
    tail: &mut VecDeque<String>,
    tracker: &mut ProgressTracker,
    on_progress: &mut F,
) -> std::io::Result<std::process::ExitStatus>
where
    F: FnMut(ProgressUpdate),
{
    while let Some(line) = line_rx.recv().await {
        log::trace!("yt-dlp: {}", line);
        if tail.len() >= OUTPUT_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line.clone());

        if let Some(update) = parse_progress(&line) {
            if let Some(forward) = tracker.advance(update) {
                on_progress(forward);
            }
        }
    }
    child.wait().await
}

/// Finds the downloaded file and returns its size.
///
/// The merge step occasionally leaves the result under a different extension
/// than the requested template; scan the directory for the same stem and
/// rename it into place, like any caller expects.
fn locate_output(expected: &Path) -> Option<u64> {
    if let Ok(meta) = std::fs::metadata(expected) {
        if meta.len() > 0 {
            return Some(meta.len());
        }
        return None;
    }

    let dir = expected.parent()?;
    let stem = expected.file_stem()?.to_string_lossy().to_string();
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let matches_stem = name.starts_with(&stem)
            && (name.ends_with(".mp4") || name.ends_with(".webm") || name.ends_with(".mkv"));
        if !matches_stem {
            continue;
        }
        let found = entry.path();
        if let Ok(meta) = std::fs::metadata(&found) {
            if meta.len() > 0 {
                if std::fs::rename(&found, expected).is_ok() {
                    log::debug!("renamed {} -> {}", found.display(), expected.display());
                    return Some(meta.len());
                }
                return Some(meta.len());
            }
        }
    }
    None
}

/// Removes the output file and the partial/temp artifacts yt-dlp leaves behind.
fn cleanup_partial_download(output_path: &Path) {
    let _ = std::fs::remove_file(output_path);
    let as_str = output_path.to_string_lossy();
    let _ = std::fs::remove_file(format!("{}.part", as_str));
    let _ = std::fs::remove_file(format!("{}.ytdl", as_str));
}
