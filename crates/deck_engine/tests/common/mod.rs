#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use deck_engine::{ApiSettings, EngineEvent, EventSink, ReqwestApi};
use wiremock::MockServer;

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Wait until at least `count` events arrived, or give up after two seconds.
    pub async fn wait_for(&self, count: usize) -> Vec<EngineEvent> {
        for _ in 0..400 {
            if self.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.snapshot()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn api_for(server: &MockServer) -> ReqwestApi {
    ReqwestApi::new(ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    })
    .expect("api")
}

pub fn job_json(id: &str, status: &str, progress: f64) -> serde_json::Value {
    serde_json::json!({
        "job": {
            "id": id,
            "status": status,
            "progress": progress,
            "label": "Heat – Trailer",
            "logs": ["Job queued.", "DEBUG: argv"],
            "started_at": "2025-01-02T03:04:05.000000Z",
            "updated_at": "2025-01-02T03:04:06.000000Z"
        },
        "debug_mode": false
    })
}
