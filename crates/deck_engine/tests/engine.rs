mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{api_for, job_json};
use deck_engine::{EngineEvent, EngineHandle, EngineSettings, SearchTarget};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn next_event(engine: &EngineHandle) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
            return event;
        }
    }
    panic!("engine produced no event");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_then_poll_until_complete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(202).set_body_json(job_json("j1", "queued", 0.0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("j1", "completed", 100.0)))
        .mount(&server)
        .await;

    let engine = EngineHandle::with_api(
        Arc::new(api_for(&server)),
        EngineSettings {
            poll_interval: Duration::from_millis(20),
            ..EngineSettings::default()
        },
    );

    engine.create_job(Default::default());
    let EngineEvent::JobCreated(Ok(envelope)) = next_event(&engine) else {
        panic!("expected created event");
    };
    let job_id = envelope.job.and_then(|job| job.id).unwrap();

    engine.start_poller(job_id.clone());
    engine.start_poller(job_id.clone());
    match next_event(&engine) {
        EngineEvent::JobPolled {
            job_id: polled,
            result: Ok(Some(_)),
            ..
        } => assert_eq!(polled, job_id),
        other => panic!("unexpected event {other:?}"),
    }

    // Terminal status ended the only loop; aborting an idle search is harmless.
    engine.abort_search(SearchTarget::Video);
    assert!(engine.recv_timeout(Duration::from_millis(150)).is_none());
    engine.shutdown();
}
