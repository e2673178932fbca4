mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{api_for, TestSink};
use deck_engine::{
    ApiError, CatalogHit, EngineEvent, SearchRunner, SearchSource, VideoSource,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers with the query as the hit title after a delay read from the query
/// itself ("slow" takes longer than anything else).
#[derive(Clone, Default)]
struct ScriptedSource {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl SearchSource for ScriptedSource {
    type Output = Vec<CatalogHit>;

    async fn search(&self, query: &str) -> Result<Self::Output, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = if query == "slow" { 150 } else { 10 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![CatalogHit {
            title: query.to_string(),
            ..CatalogHit::default()
        }])
    }

    fn finished(&self, token: u64, result: Result<Self::Output, ApiError>) -> EngineEvent {
        EngineEvent::CatalogSearchFinished { token, result }
    }
}

fn finished_tokens(events: &[EngineEvent]) -> Vec<(u64, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::CatalogSearchFinished {
                token,
                result: Ok(hits),
            } => Some((*token, hits[0].title.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn superseded_run_never_reports() {
    let sink = TestSink::new();
    let source = ScriptedSource::default();
    let runner = SearchRunner::new(source.clone(), Arc::new(sink.clone()));

    runner.run(1, "slow".to_string(), None);
    tokio::time::sleep(Duration::from_millis(20)).await;
    runner.run(2, "fast".to_string(), None);

    sink.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(finished_tokens(&sink.snapshot()), vec![(2, "fast".to_string())]);
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn debounce_collapses_rapid_input() {
    let sink = TestSink::new();
    let source = ScriptedSource::default();
    let runner = SearchRunner::new(source.clone(), Arc::new(sink.clone()));

    let debounce = Some(Duration::from_millis(40));
    runner.run(1, "h".to_string(), debounce);
    runner.run(2, "he".to_string(), debounce);
    runner.run(3, "heat".to_string(), debounce);

    sink.wait_for(1).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(finished_tokens(&sink.snapshot()), vec![(3, "heat".to_string())]);
}

#[tokio::test]
async fn cancel_aborts_without_reporting() {
    let sink = TestSink::new();
    let source = ScriptedSource::default();
    let runner = SearchRunner::new(source.clone(), Arc::new(sink.clone()));

    runner.run(1, "heat".to_string(), Some(Duration::from_millis(30)));
    assert!(runner.is_busy());
    runner.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(sink.len(), 0);
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn video_source_reports_backend_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/search"))
        .and(query_param("query", "heat"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{ "title": "Heat trailer", "url": "https://youtu.be/a" }],
            "cached": false
        })))
        .mount(&server)
        .await;

    let sink = TestSink::new();
    let runner = SearchRunner::new(
        VideoSource::new(Arc::new(api_for(&server)), 5),
        Arc::new(sink.clone()),
    );
    runner.run(7, "heat".to_string(), None);

    let events = sink.wait_for(1).await;
    match &events[0] {
        EngineEvent::VideoSearchFinished { token, result } => {
            assert_eq!(*token, 7);
            let response = result.clone().unwrap();
            assert_eq!(response.results[0].url.as_deref(), Some("https://youtu.be/a"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}
