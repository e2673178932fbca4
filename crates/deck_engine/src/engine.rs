use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use deck_logging::{deck_error, deck_info};

use crate::api::{ApiClient, ApiSettings, ReqwestApi};
use crate::poller::{ChannelEventSink, EventSink, PollerManager, DEFAULT_POLL_INTERVAL};
use crate::search::{CatalogSource, SearchRunner, VideoSource, DEFAULT_VIDEO_SEARCH_LIMIT};
use crate::{ApiError, CreateJobBody, EngineEvent, JobId, SearchTarget};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub poll_interval: Duration,
    pub video_search_limit: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            video_search_limit: DEFAULT_VIDEO_SEARCH_LIMIT,
        }
    }
}

enum EngineCommand {
    CreateJob(CreateJobBody),
    FetchJobs,
    StartPoller(JobId),
    StopPoller(JobId),
    CancelJob(JobId),
    RunSearch {
        target: SearchTarget,
        token: u64,
        query: String,
        delay: Option<Duration>,
    },
    AbortSearch(SearchTarget),
    AddMovie(u64),
    RefreshLibrary,
    PreviewPlaylist(String),
    Shutdown,
}

/// Owns the engine thread. Commands go in through the methods; results come
/// back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, ApiError> {
        let api: Arc<dyn ApiClient> = Arc::new(ReqwestApi::new(settings.api.clone())?);
        Ok(Self::with_api(api, settings))
    }

    /// Run against any [`ApiClient`].
    pub fn with_api(api: Arc<dyn ApiClient>, settings: EngineSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    deck_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            let _guard = runtime.enter();
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let workers = Workers {
                pollers: PollerManager::new(api.clone(), sink.clone(), settings.poll_interval),
                videos: SearchRunner::new(
                    VideoSource::new(api.clone(), settings.video_search_limit),
                    sink.clone(),
                ),
                catalog: SearchRunner::new(CatalogSource::new(api.clone()), sink.clone()),
                api,
                sink,
            };

            while let Ok(command) = cmd_rx.recv() {
                if matches!(command, EngineCommand::Shutdown) {
                    break;
                }
                workers.handle(command, &runtime);
            }
            workers.pollers.stop_all();
            workers.videos.cancel();
            workers.catalog.cancel();
            deck_info!("engine stopped");
        });

        Self { cmd_tx, event_rx }
    }

    pub fn create_job(&self, body: CreateJobBody) {
        self.send(EngineCommand::CreateJob(body));
    }

    pub fn fetch_jobs(&self) {
        self.send(EngineCommand::FetchJobs);
    }

    pub fn start_poller(&self, job_id: JobId) {
        self.send(EngineCommand::StartPoller(job_id));
    }

    pub fn stop_poller(&self, job_id: JobId) {
        self.send(EngineCommand::StopPoller(job_id));
    }

    pub fn cancel_job(&self, job_id: JobId) {
        self.send(EngineCommand::CancelJob(job_id));
    }

    pub fn run_search(
        &self,
        target: SearchTarget,
        token: u64,
        query: String,
        delay: Option<Duration>,
    ) {
        self.send(EngineCommand::RunSearch {
            target,
            token,
            query,
            delay,
        });
    }

    pub fn abort_search(&self, target: SearchTarget) {
        self.send(EngineCommand::AbortSearch(target));
    }

    pub fn add_movie(&self, tmdb_id: u64) {
        self.send(EngineCommand::AddMovie(tmdb_id));
    }

    pub fn refresh_library(&self) {
        self.send(EngineCommand::RefreshLibrary);
    }

    pub fn preview_playlist(&self, url: String) {
        self.send(EngineCommand::PreviewPlaylist(url));
    }

    /// Stop every poller and search and let the engine thread exit.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

struct Workers {
    api: Arc<dyn ApiClient>,
    sink: Arc<dyn EventSink>,
    pollers: PollerManager,
    videos: SearchRunner<VideoSource>,
    catalog: SearchRunner<CatalogSource>,
}

impl Workers {
    fn handle(&self, command: EngineCommand, runtime: &tokio::runtime::Runtime) {
        match command {
            EngineCommand::StartPoller(job_id) => {
                self.pollers.start(&job_id);
            }
            EngineCommand::StopPoller(job_id) => self.pollers.stop(&job_id),
            EngineCommand::RunSearch {
                target,
                token,
                query,
                delay,
            } => match target {
                SearchTarget::Video => self.videos.run(token, query, delay),
                SearchTarget::Catalog => self.catalog.run(token, query, delay),
            },
            EngineCommand::AbortSearch(SearchTarget::Video) => self.videos.cancel(),
            EngineCommand::AbortSearch(SearchTarget::Catalog) => self.catalog.cancel(),
            EngineCommand::Shutdown => {}
            request => {
                let api = self.api.clone();
                let sink = self.sink.clone();
                runtime.spawn(async move {
                    let event = execute(api.as_ref(), request).await;
                    if let Some(event) = event {
                        sink.emit(event);
                    }
                });
            }
        }
    }
}

async fn execute(api: &dyn ApiClient, command: EngineCommand) -> Option<EngineEvent> {
    let event = match command {
        EngineCommand::CreateJob(body) => EngineEvent::JobCreated(api.create_job(&body).await),
        EngineCommand::FetchJobs => EngineEvent::JobsListed(api.list_jobs().await),
        EngineCommand::CancelJob(job_id) => {
            let result = api.cancel_job(&job_id).await;
            EngineEvent::CancelFinished { job_id, result }
        }
        EngineCommand::AddMovie(tmdb_id) => EngineEvent::MovieAdded(api.add_movie(tmdb_id).await),
        EngineCommand::RefreshLibrary => EngineEvent::LibraryLoaded(api.refresh_library().await),
        EngineCommand::PreviewPlaylist(url) => {
            let result = api.preview_playlist(&url).await;
            EngineEvent::PlaylistPreviewed { url, result }
        }
        EngineCommand::StartPoller(_)
        | EngineCommand::StopPoller(_)
        | EngineCommand::RunSearch { .. }
        | EngineCommand::AbortSearch(_)
        | EngineCommand::Shutdown => return None,
    };
    Some(event)
}
