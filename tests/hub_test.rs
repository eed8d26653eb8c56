//! Integration tests for the progress event hub
//!
//! Run with: cargo test --test hub_test

use clipsmith::events::{ProgressEvent, ProgressHub};
use clipsmith::jobs::ClipRef;
use std::sync::Arc;
use std::time::Duration;

fn update(job_id: &str, percent: u8) -> ProgressEvent {
    ProgressEvent::update(job_id, percent, "downloading", format!("{}%", percent))
}

fn terminal(job_id: &str) -> ProgressEvent {
    let mut event = ProgressEvent::update(job_id, 100, "completed", "done");
    event.completed = Some(true);
    event
}

/// Drains a receiver until the terminal event (or it closes), with a budget.
async fn collect_events(
    mut rx: tokio::sync::mpsc::Receiver<ProgressEvent>,
) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    loop {
        match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            Ok(Some(event)) => {
                let is_terminal = event.is_terminal();
                events.push(event);
                if is_terminal {
                    // The hub should close the channel right after
                    let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
                    assert!(matches!(closed, Ok(None)), "channel must close after terminal event");
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => panic!("timed out waiting for events"),
        }
    }
    events
}

#[tokio::test]
async fn two_subscribers_observe_identical_deduplicated_sequence() {
    let hub = Arc::new(ProgressHub::new());
    let rx_a = hub.subscribe("job-1");
    let rx_b = hub.subscribe("job-1");

    // Published: 10, 25, 25, 60, 100(terminal) — the duplicate 25 must be
    // suppressed for everyone
    for percent in [10, 25, 25, 60] {
        hub.publish(update("job-1", percent));
    }
    hub.publish(terminal("job-1"));

    let events_a = collect_events(rx_a).await;
    let events_b = collect_events(rx_b).await;

    let percents_a: Vec<u8> = events_a.iter().map(|e| e.progress).collect();
    let percents_b: Vec<u8> = events_b.iter().map(|e| e.progress).collect();
    assert_eq!(percents_a, vec![10, 25, 60, 100]);
    assert_eq!(percents_a, percents_b);
}

#[tokio::test]
async fn progress_regressions_are_suppressed() {
    let hub = ProgressHub::new();
    let rx = hub.subscribe("job-2");

    hub.publish(update("job-2", 60));
    hub.publish(update("job-2", 30)); // out-of-order line, must not surface
    hub.publish(update("job-2", 80));
    hub.publish(terminal("job-2"));

    let percents: Vec<u8> = collect_events(rx).await.iter().map(|e| e.progress).collect();
    assert_eq!(percents, vec![60, 80, 100]);
}

#[tokio::test]
async fn late_subscriber_receives_last_known_event_immediately() {
    let hub = ProgressHub::new();

    hub.publish(update("job-3", 10));
    hub.publish(update("job-3", 45));

    // Joins after progress already happened — must not be left blank
    let mut rx = hub.subscribe("job-3");
    let replayed = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed");
    assert_eq!(replayed.progress, 45);
}

#[tokio::test]
async fn subscriber_after_terminal_gets_replay_then_closed_stream() {
    let hub = ProgressHub::new();

    hub.publish(update("job-4", 50));
    hub.publish(terminal("job-4"));

    let mut rx = hub.subscribe("job-4");
    let replayed = rx.recv().await.expect("expected terminal replay");
    assert!(replayed.is_terminal());
    assert!(rx.recv().await.is_none(), "stream must end after terminal replay");
}

#[tokio::test]
async fn dropped_subscribers_are_pruned_on_publish() {
    let hub = ProgressHub::new();
    let rx_live = hub.subscribe("job-5");
    let rx_dead = hub.subscribe("job-5");
    drop(rx_dead);

    hub.publish(update("job-5", 30));
    assert_eq!(hub.subscriber_count("job-5"), 1);

    hub.publish(terminal("job-5"));
    let events = collect_events(rx_live).await;
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn terminal_event_carries_clip_payload() {
    let hub = ProgressHub::new();
    let mut rx = hub.subscribe("job-6");

    let mut event = terminal("job-6");
    event.clips = Some(vec![ClipRef {
        index: 1,
        path: "/tmp/clips/clip_001.mp4".to_string(),
        file_size_bytes: 1024,
    }]);
    hub.publish(event);

    let received = rx.recv().await.expect("expected terminal event");
    let clips = received.clips.expect("clips must ride on the terminal event");
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].index, 1);
}
