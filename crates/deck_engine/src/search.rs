//! Debounced, cancellable search slots.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deck_logging::deck_debug;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::poller::EventSink;
use crate::{ApiError, EngineEvent};

pub const DEFAULT_VIDEO_SEARCH_LIMIT: u32 = 10;

/// One kind of search request and how its answer is reported.
#[async_trait::async_trait]
pub trait SearchSource: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn search(&self, query: &str) -> Result<Self::Output, ApiError>;

    fn finished(&self, token: u64, result: Result<Self::Output, ApiError>) -> EngineEvent;
}

pub struct VideoSource {
    api: Arc<dyn ApiClient>,
    limit: u32,
}

impl VideoSource {
    pub fn new(api: Arc<dyn ApiClient>, limit: u32) -> Self {
        Self { api, limit }
    }
}

#[async_trait::async_trait]
impl SearchSource for VideoSource {
    type Output = crate::VideoSearchResponse;

    async fn search(&self, query: &str) -> Result<Self::Output, ApiError> {
        self.api.search_videos(query, self.limit).await
    }

    fn finished(&self, token: u64, result: Result<Self::Output, ApiError>) -> EngineEvent {
        EngineEvent::VideoSearchFinished { token, result }
    }
}

pub struct CatalogSource {
    api: Arc<dyn ApiClient>,
}

impl CatalogSource {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl SearchSource for CatalogSource {
    type Output = Vec<crate::CatalogHit>;

    async fn search(&self, query: &str) -> Result<Self::Output, ApiError> {
        self.api.search_catalog(query).await
    }

    fn finished(&self, token: u64, result: Result<Self::Output, ApiError>) -> EngineEvent {
        EngineEvent::CatalogSearchFinished { token, result }
    }
}

struct ActiveSearch {
    token: u64,
    cancel: CancellationToken,
}

/// A single search slot: a new run supersedes the previous one, and only the
/// run whose token is still current gets to report.
pub struct SearchRunner<S: SearchSource> {
    source: Arc<S>,
    sink: Arc<dyn EventSink>,
    active: Arc<Mutex<Option<ActiveSearch>>>,
}

impl<S: SearchSource> SearchRunner<S> {
    pub fn new(source: S, sink: Arc<dyn EventSink>) -> Self {
        Self {
            source: Arc::new(source),
            sink,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Must be called from inside a tokio runtime.
    pub fn run(&self, token: u64, query: String, delay: Option<Duration>) {
        let cancel = CancellationToken::new();
        let previous = match self.active.lock() {
            Ok(mut active) => active.replace(ActiveSearch {
                token,
                cancel: cancel.clone(),
            }),
            Err(_) => return,
        };
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }

        let source = self.source.clone();
        let sink = self.sink.clone();
        let active = self.active.clone();
        tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            deck_debug!("search token {} dispatched", token);
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                result = source.search(&query) => result,
            };

            let current = match active.lock() {
                Ok(mut slot) => {
                    let current = slot.as_ref().is_some_and(|run| run.token == token);
                    if current {
                        slot.take();
                    }
                    current
                }
                Err(_) => false,
            };
            if current && !cancel.is_cancelled() {
                sink.emit(source.finished(token, result));
            }
        });
    }

    /// Abort pending or in-flight work without reporting anything.
    pub fn cancel(&self) {
        let previous = match self.active.lock() {
            Ok(mut active) => active.take(),
            Err(_) => None,
        };
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.active
            .lock()
            .map(|active| active.is_some())
            .unwrap_or(false)
    }
}
