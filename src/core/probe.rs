//! One-time startup capability probe for external tooling
//!
//! Runs once before the server accepts requests and produces an immutable
//! [`ToolCapabilities`] value that is passed into the orchestrator and the
//! clip splitter. yt-dlp may be installed as a standalone binary or as a
//! Python module; the probe walks the candidate invocations and keeps the
//! first one that answers `--version`.

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// How a working yt-dlp is invoked: a program plus fixed prefix arguments
/// (empty for a standalone binary, `["-m", "yt_dlp"]` for the module form).
#[derive(Debug, Clone)]
pub struct YtdlpInvocation {
    pub program: String,
    pub prefix_args: Vec<String>,
}

impl YtdlpInvocation {
    pub fn binary(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    pub fn python_module(interpreter: impl Into<String>) -> Self {
        Self {
            program: interpreter.into(),
            prefix_args: vec!["-m".to_string(), "yt_dlp".to_string()],
        }
    }

    /// Builds a command with the prefix arguments already applied.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args);
        cmd
    }

    /// Human-readable form for logs.
    pub fn display(&self) -> String {
        if self.prefix_args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.prefix_args.join(" "))
        }
    }
}

/// Immutable snapshot of the external tooling available to this process.
#[derive(Debug, Clone)]
pub struct ToolCapabilities {
    pub ytdlp: YtdlpInvocation,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub cookies_configured: bool,
}

/// Probes yt-dlp, ffmpeg and ffprobe and returns the resolved capabilities.
///
/// Fails hard when ffmpeg/ffprobe are missing: the clip splitter cannot work
/// without them. A missing yt-dlp is also fatal since every acquisition path
/// goes through it.
pub async fn probe_tooling() -> AppResult<ToolCapabilities> {
    let ytdlp = detect_ytdlp().await.ok_or_else(|| {
        AppError::Download(
            "yt-dlp not found. Install it as a binary in PATH or as a Python module (pip install yt-dlp)".to_string(),
        )
    })?;
    log::info!("✅ yt-dlp detected: {}", ytdlp.display());

    if !answers_version("ffmpeg").await {
        return Err(AppError::Media("ffmpeg not found in PATH".to_string()));
    }
    if !answers_version("ffprobe").await {
        return Err(AppError::Media("ffprobe not found in PATH".to_string()));
    }
    log::info!("✅ ffmpeg/ffprobe detected");

    let cookies_configured = config::YTDL_COOKIES_FILE.is_some() || config::YTDLP_COOKIES.is_some();

    Ok(ToolCapabilities {
        ytdlp,
        ffmpeg_bin: "ffmpeg".to_string(),
        ffprobe_bin: "ffprobe".to_string(),
        cookies_configured,
    })
}

/// Walks candidate yt-dlp invocations and returns the first working one.
async fn detect_ytdlp() -> Option<YtdlpInvocation> {
    let configured = config::YTDL_BIN.clone();
    let candidates = vec![
        YtdlpInvocation::binary(configured),
        YtdlpInvocation::binary("/usr/local/bin/yt-dlp"),
        YtdlpInvocation::binary("/usr/bin/yt-dlp"),
        YtdlpInvocation::python_module("python3"),
        YtdlpInvocation::python_module("python"),
    ];

    for candidate in candidates {
        let probe = timeout(
            Duration::from_secs(5),
            candidate.command().arg("--version").output(),
        )
        .await;

        match probe {
            Ok(Ok(output)) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                log::debug!("yt-dlp candidate {} answered: {}", candidate.display(), version);
                return Some(candidate);
            }
            Ok(Ok(_)) | Ok(Err(_)) => continue,
            Err(_) => {
                log::debug!("yt-dlp candidate {} timed out", candidate.display());
                continue;
            }
        }
    }

    None
}

/// Checks whether a binary answers `-version` (the ffmpeg family spelling).
async fn answers_version(bin: &str) -> bool {
    matches!(
        timeout(Duration::from_secs(5), Command::new(bin).arg("-version").output()).await,
        Ok(Ok(output)) if output.status.success()
    )
}
