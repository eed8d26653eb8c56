//! Integration tests for the job registry
//!
//! Run with: cargo test --test job_store_test

use clipsmith::jobs::store::{InMemoryJobStore, JobStore};
use clipsmith::jobs::types::{ClipRef, DownloadJob, DownloadStatus, GenerationJob, GenerationStatus};
use pretty_assertions::assert_eq;

fn download_job(video_id: &str) -> DownloadJob {
    DownloadJob::new(
        format!("https://www.youtube.com/watch?v={}", video_id),
        video_id.to_string(),
    )
}

fn generation_job(video_id: &str) -> GenerationJob {
    GenerationJob::new(video_id.to_string(), 0, Some(185), 60)
}

#[test]
fn download_progress_is_monotonic_non_decreasing() {
    let store = InMemoryJobStore::new();
    let job = download_job("dQw4w9WgXcQ");
    let id = job.id.clone();
    store.insert_download(job);
    store.mark_downloading(&id);

    store.set_download_progress(&id, 40);
    store.set_download_progress(&id, 25); // regression must be ignored
    assert_eq!(store.download(&id).unwrap().progress_percent, 40);

    store.set_download_progress(&id, 90);
    assert_eq!(store.download(&id).unwrap().progress_percent, 90);

    // Jumping straight to 100 on completion is allowed
    store.complete_download(&id, "/tmp/v.mp4".to_string(), 1024, Some(200), "ios".to_string());
    assert_eq!(store.download(&id).unwrap().progress_percent, 100);
}

#[test]
fn terminal_download_states_are_never_left() {
    let store = InMemoryJobStore::new();
    let job = download_job("dQw4w9WgXcQ");
    let id = job.id.clone();
    store.insert_download(job);

    store.fail_download(&id, "blocked".to_string());
    let failed = store.download(&id).unwrap();
    assert_eq!(failed.status, DownloadStatus::Failed);

    // Any later transition attempt is ignored
    store.mark_downloading(&id);
    store.set_download_progress(&id, 50);
    store.complete_download(&id, "/tmp/v.mp4".to_string(), 1024, None, "web".to_string());

    let after = store.download(&id).unwrap();
    assert_eq!(after.status, DownloadStatus::Failed);
    assert_eq!(after.terminal_error.as_deref(), Some("blocked"));
    assert!(after.output_path.is_none());
}

#[test]
fn generation_transitions_are_one_way() {
    let store = InMemoryJobStore::new();
    let job = generation_job("dQw4w9WgXcQ");
    let id = job.id.clone();
    store.insert_generation(job);

    store.complete_generation(
        &id,
        vec![ClipRef {
            index: 1,
            path: "/tmp/clip_001.mp4".to_string(),
            file_size_bytes: 2048,
        }],
    );
    let done = store.generation(&id).unwrap();
    assert_eq!(done.status, GenerationStatus::Completed);
    assert_eq!(done.number_of_cuts, 1);
    assert_eq!(done.progress_percent, 100);

    store.fail_generation(&id, "too late".to_string());
    let after = store.generation(&id).unwrap();
    assert_eq!(after.status, GenerationStatus::Completed);
    assert!(after.error.is_none());
}

#[test]
fn unknown_job_ids_return_none() {
    let store = InMemoryJobStore::new();
    assert!(store.download("nope").is_none());
    assert!(store.generation("nope").is_none());
    assert!(store.download_by_video("dQw4w9WgXcQ").is_none());
}

#[test]
fn download_lookup_by_video_returns_most_recent() {
    let store = InMemoryJobStore::new();

    let old = download_job("dQw4w9WgXcQ");
    let old_id = old.id.clone();
    store.insert_download(old);
    store.fail_download(&old_id, "blocked".to_string());

    std::thread::sleep(std::time::Duration::from_millis(5));
    let new = download_job("dQw4w9WgXcQ");
    let new_id = new.id.clone();
    store.insert_download(new);

    let found = store.download_by_video("dQw4w9WgXcQ").unwrap();
    assert_eq!(found.id, new_id);
}

#[test]
fn eviction_removes_only_stale_terminal_records() {
    let store = InMemoryJobStore::new();

    let active = download_job("dQw4w9WgXcQ");
    let active_id = active.id.clone();
    store.insert_download(active);
    store.mark_downloading(&active_id);

    let finished = download_job("oHg5SJYRHA0");
    let finished_id = finished.id.clone();
    store.insert_download(finished);
    store.complete_download(&finished_id, "/tmp/v.mp4".to_string(), 1024, None, "android".to_string());

    let done_gen = generation_job("oHg5SJYRHA0");
    let done_gen_id = done_gen.id.clone();
    store.insert_generation(done_gen);
    store.fail_generation(&done_gen_id, "nope".to_string());

    // Nothing is old enough yet at a 1-hour TTL
    assert_eq!(store.evict_terminal(3600), 0);

    // With a zero TTL every terminal record is stale; the active one stays
    std::thread::sleep(std::time::Duration::from_millis(10));
    assert_eq!(store.evict_terminal(0), 2);
    assert!(store.download(&active_id).is_some());
    assert!(store.download(&finished_id).is_none());
    assert!(store.generation(&done_gen_id).is_none());
}
