//! Job deck engine: backend HTTP client, pollers, search slots and the
//! engine thread that runs them.
mod api;
mod engine;
mod poller;
mod search;
mod types;

pub use api::{ApiClient, ApiSettings, ReqwestApi, DEFAULT_SERVER_URL};
pub use engine::{EngineHandle, EngineSettings};
pub use poller::{ChannelEventSink, EventSink, PollerManager, DEFAULT_POLL_INTERVAL};
pub use search::{
    CatalogSource, SearchRunner, SearchSource, VideoSource, DEFAULT_VIDEO_SEARCH_LIMIT,
};
pub use types::{
    ApiError, CatalogHit, CatalogImage, CreateJobBody, EngineEvent, FailureKind, JobEnvelope,
    JobId, JobList, JobPayload, LibraryMoviePayload, PlaylistEntryPayload, PlaylistExtraBody,
    PlaylistPreviewPayload, SearchTarget, VideoHit, VideoSearchResponse,
};
