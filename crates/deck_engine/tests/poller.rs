mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{api_for, job_json, TestSink};
use deck_engine::{EngineEvent, PollerManager};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(server: &MockServer, sink: &TestSink, interval_ms: u64) -> PollerManager {
    PollerManager::new(
        Arc::new(api_for(server)),
        Arc::new(sink.clone()),
        Duration::from_millis(interval_ms),
    )
}

fn polled_seqs(events: &[EngineEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::JobPolled { seq, .. } => Some(*seq),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn starting_twice_runs_one_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("j1", "complete", 100.0)))
        .expect(1)
        .mount(&server)
        .await;

    let sink = TestSink::new();
    let pollers = manager(&server, &sink, 20);
    assert!(pollers.start("j1"));
    assert!(!pollers.start("j1"));
    assert_eq!(pollers.active_count(), 1);

    let events = sink.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // A terminal status ends the loop after one fetch.
    assert_eq!(events.len(), 1);
    assert_eq!(sink.len(), 1);
    assert!(!pollers.is_polling("j1"));
    match &events[0] {
        EngineEvent::JobPolled { job_id, result, .. } => {
            assert_eq!(job_id, "j1");
            let envelope = result.clone().unwrap().unwrap();
            assert_eq!(envelope.job.unwrap().status.as_deref(), Some("complete"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn stop_halts_further_polls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("j1", "processing", 5.0)))
        .mount(&server)
        .await;

    let sink = TestSink::new();
    let pollers = manager(&server, &sink, 20);
    pollers.start("j1");
    let events = sink.wait_for(2).await;
    let seqs = polled_seqs(&events);
    assert!(seqs.len() >= 2);
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));

    pollers.stop("j1");
    pollers.stop("j1");
    assert!(!pollers.is_polling("j1"));
    let seen = sink.len();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(sink.len(), seen);
}

#[tokio::test]
async fn not_found_ends_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let sink = TestSink::new();
    let pollers = manager(&server, &sink, 20);
    pollers.start("ghost");
    let events = sink.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(matches!(
        &events[0],
        EngineEvent::JobPolled { result: Ok(None), .. }
    ));
    assert_eq!(sink.len(), 1);
    assert!(!pollers.is_polling("ghost"));
}

#[tokio::test]
async fn transport_failure_is_reported_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/j1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let sink = TestSink::new();
    let pollers = manager(&server, &sink, 20);
    pollers.start("j1");
    let events = sink.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(matches!(
        &events[0],
        EngineEvent::JobPolled { result: Err(_), .. }
    ));
    assert_eq!(sink.len(), 1);

    // The loop is gone, so a fresh start is accepted.
    assert!(pollers.start("j1"));
    pollers.stop("j1");
}
