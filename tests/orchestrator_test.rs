//! Integration tests for the download orchestrator
//!
//! The extraction tool is replaced by generated shell scripts, so the suite
//! exercises the real spawn/classify/fallback path hermetically: no network,
//! no yt-dlp installation required.
//!
//! Run with: cargo test --test orchestrator_test

#![cfg(unix)]

use clipsmith::core::probe::{ToolCapabilities, YtdlpInvocation};
use clipsmith::core::validation::resolve_video_id;
use clipsmith::download::error::{AcquireError, AttemptOutcome};
use clipsmith::download::orchestrator::{acquire_with_options, AcquireOptions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Writes an executable fake downloader script.
fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-ytdlp.sh");
    let script = format!("#!/bin/sh\n{}\n", body);
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Shell fragment extracting the `-o` argument into `$out` and appending the
/// full invocation to the spawn log.
fn script_prelude(spawn_log: &Path) -> String {
    format!(
        r#"echo "$*" >> "{log}"
out=""
prev=""
for a in "$@"; do
  [ "$prev" = "-o" ] && out="$a"
  prev="$a"
done"#,
        log = spawn_log.display()
    )
}

fn caps_for(script: &Path) -> ToolCapabilities {
    ToolCapabilities {
        ytdlp: YtdlpInvocation::binary(script.to_string_lossy().to_string()),
        ffmpeg_bin: "ffmpeg".to_string(),
        ffprobe_bin: "ffprobe".to_string(),
        cookies_configured: false,
    }
}

fn fast_options() -> AcquireOptions {
    AcquireOptions {
        attempt_timeout: Duration::from_secs(10),
        strategy_delay: Duration::from_millis(10),
        retries_per_strategy: 0,
    }
}

fn spawn_count(spawn_log: &Path) -> usize {
    std::fs::read_to_string(spawn_log)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

#[tokio::test]
async fn falls_back_to_next_strategy_and_stops_at_first_success() {
    let dir = TempDir::new().unwrap();
    let spawn_log = dir.path().join("spawn.log");
    // android is blocked; everything else succeeds with one progress line
    let script = write_script(
        dir.path(),
        &format!(
            r#"{prelude}
case "$*" in
  *player_client=android*)
    echo "ERROR: HTTP Error 403: Forbidden" >&2
    exit 1
    ;;
esac
echo "[download]  42.0% of 10.00MiB at 1.00MiB/s ETA 00:10"
printf 'fake-video-bytes' > "$out"
exit 0"#,
            prelude = script_prelude(&spawn_log)
        ),
    );

    let caps = caps_for(&script);
    let video_id = resolve_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
    let output = dir.path().join("dQw4w9WgXcQ.mp4");

    let mut percents = Vec::new();
    let acquisition = acquire_with_options(&caps, &video_id, &output, fast_options(), |u| {
        percents.push(u.percent);
    })
    .await
    .expect("second strategy must succeed");

    // Declared order: android fails, ios wins, nothing after is tried
    assert_eq!(acquisition.strategy, "ios");
    assert_eq!(acquisition.attempts.len(), 2);
    assert_eq!(acquisition.attempts[0].strategy, "android");
    assert_eq!(acquisition.attempts[0].outcome, AttemptOutcome::Blocked);
    assert!(acquisition.attempts[0].error_excerpt.as_deref().unwrap().contains("403"));
    assert_eq!(acquisition.attempts[1].outcome, AttemptOutcome::Success);
    assert_eq!(spawn_count(&spawn_log), 2);

    // Forwarded progress is monotonic and ends in a synthesized 100
    assert_eq!(percents, vec![42, 100]);

    let size = std::fs::metadata(&output).unwrap().len();
    assert!(size > 0);
}

#[tokio::test]
async fn fatal_failure_short_circuits_remaining_strategies() {
    let dir = TempDir::new().unwrap();
    let spawn_log = dir.path().join("spawn.log");
    let script = write_script(
        dir.path(),
        &format!(
            r#"{prelude}
echo "ERROR: Private video" >&2
exit 1"#,
            prelude = script_prelude(&spawn_log)
        ),
    );

    let caps = caps_for(&script);
    let video_id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
    let output = dir.path().join("dQw4w9WgXcQ.mp4");

    let err = acquire_with_options(&caps, &video_id, &output, fast_options(), |_| {})
        .await
        .expect_err("private video must abort");

    match err {
        AcquireError::FatalSource { attempts, .. } => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].outcome, AttemptOutcome::Fatal);
        }
        other => panic!("expected FatalSource, got {:?}", other),
    }
    // No strategy after the first was ever attempted
    assert_eq!(spawn_count(&spawn_log), 1);
}

#[tokio::test]
async fn empty_output_is_deleted_and_exhausts_strategies() {
    let dir = TempDir::new().unwrap();
    let spawn_log = dir.path().join("spawn.log");
    // Exit 0 but produce a zero-byte file every time
    let script = write_script(
        dir.path(),
        &format!(
            r#"{prelude}
: > "$out"
exit 0"#,
            prelude = script_prelude(&spawn_log)
        ),
    );

    let caps = caps_for(&script);
    let video_id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
    let output = dir.path().join("dQw4w9WgXcQ.mp4");

    let err = acquire_with_options(&caps, &video_id, &output, fast_options(), |_| {})
        .await
        .expect_err("empty output is never a success");

    match err {
        AcquireError::AllStrategiesExhausted { attempts } => {
            assert_eq!(attempts.len(), 5);
            assert!(attempts.iter().all(|a| a.outcome == AttemptOutcome::EmptyOutput));
        }
        other => panic!("expected AllStrategiesExhausted, got {:?}", other),
    }
    // The zero-byte file must not appear in any later listing
    assert!(!output.exists());
}

#[tokio::test]
async fn attempt_timeout_kills_the_child_and_counts_as_failure() {
    let dir = TempDir::new().unwrap();
    let spawn_log = dir.path().join("spawn.log");
    let script = write_script(
        dir.path(),
        &format!(
            r#"{prelude}
sleep 5
printf 'too-late' > "$out"
exit 0"#,
            prelude = script_prelude(&spawn_log)
        ),
    );

    let caps = caps_for(&script);
    let video_id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
    let output = dir.path().join("dQw4w9WgXcQ.mp4");

    let options = AcquireOptions {
        attempt_timeout: Duration::from_millis(300),
        strategy_delay: Duration::from_millis(10),
        retries_per_strategy: 0,
    };

    let err = acquire_with_options(&caps, &video_id, &output, options, |_| {})
        .await
        .expect_err("every attempt times out");

    match err {
        AcquireError::AllStrategiesExhausted { attempts } => {
            assert_eq!(attempts.len(), 5);
            assert!(attempts.iter().all(|a| a.outcome == AttemptOutcome::TimedOut));
        }
        other => panic!("expected AllStrategiesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn robust_variant_retries_same_strategy_on_transient_network_failures() {
    let dir = TempDir::new().unwrap();
    let spawn_log = dir.path().join("spawn.log");
    let script = write_script(
        dir.path(),
        &format!(
            r#"{prelude}
echo "Connection reset by peer" >&2
exit 1"#,
            prelude = script_prelude(&spawn_log)
        ),
    );

    let caps = caps_for(&script);
    let video_id = resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
    let output = dir.path().join("dQw4w9WgXcQ.mp4");

    let options = AcquireOptions {
        attempt_timeout: Duration::from_secs(10),
        strategy_delay: Duration::from_millis(10),
        retries_per_strategy: 1,
    };

    let err = acquire_with_options(&caps, &video_id, &output, options, |_| {})
        .await
        .expect_err("network failures everywhere");

    match err {
        AcquireError::AllStrategiesExhausted { attempts } => {
            // 5 profiles x (1 attempt + 1 same-strategy retry)
            assert_eq!(attempts.len(), 10);
            assert!(attempts.iter().all(|a| a.outcome == AttemptOutcome::Network));
            assert_eq!(attempts[0].strategy, attempts[1].strategy);
        }
        other => panic!("expected AllStrategiesExhausted, got {:?}", other),
    }
    assert_eq!(spawn_count(&spawn_log), 10);
}

#[tokio::test]
async fn invalid_url_is_rejected_before_any_process_spawns() {
    let dir = TempDir::new().unwrap();
    let spawn_log = dir.path().join("spawn.log");
    let script = write_script(
        dir.path(),
        &format!(
            r#"{prelude}
exit 0"#,
            prelude = script_prelude(&spawn_log)
        ),
    );
    let _caps = caps_for(&script);

    // The handler flow: resolve first, acquire only on success. Resolution
    // fails synchronously, so the fake downloader never runs.
    let resolved = resolve_video_id("not-a-url");
    assert!(resolved.is_err());
    assert_eq!(spawn_count(&spawn_log), 0);
}
