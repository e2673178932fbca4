//! Wire shapes exchanged with the yt2radarr backend plus engine events.
use std::fmt;

use serde::{Deserialize, Serialize};

pub type JobId = String;

/// One job as the backend serialises it. Every field is optional; unknown
/// fields are ignored.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct JobPayload {
    pub id: Option<String>,
    pub label: Option<String>,
    pub subtitle: Option<String>,
    pub status: Option<String>,
    pub progress: Option<f64>,
    pub metadata: Option<Vec<String>>,
    pub message: Option<String>,
    pub logs: Option<Vec<String>>,
    pub created_at: Option<String>,
    pub started_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Body of `/create`, `/jobs/{id}` and `/jobs/{id}/cancel` responses.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct JobEnvelope {
    pub job: Option<JobPayload>,
    pub logs: Option<Vec<String>>,
    pub debug_mode: Option<bool>,
    pub message: Option<String>,
}

impl JobEnvelope {
    /// Log lines for the console: the job's own array, else the top-level one.
    pub fn log_lines(&self) -> Option<&[String]> {
        self.job
            .as_ref()
            .and_then(|job| job.logs.as_deref())
            .or(self.logs.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct JobList {
    pub jobs: Vec<JobPayload>,
    pub debug_mode: Option<bool>,
}

/// `POST /create` body, field names as the backend expects them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CreateJobBody {
    pub yturl: String,
    #[serde(rename = "movieName")]
    pub movie_name: String,
    #[serde(rename = "movieId")]
    pub movie_id: String,
    pub title: String,
    pub year: String,
    pub tmdb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub extra: bool,
    #[serde(rename = "extraType")]
    pub extra_type: String,
    pub extra_name: String,
    pub playlist_mode: String,
    pub merge_playlist: bool,
    pub playlist_extra_types: Vec<String>,
    pub playlist_extra_entries: Vec<PlaylistExtraBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlaylistExtraBody {
    pub index: u32,
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub extra_type: String,
    pub name: String,
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct VideoHit {
    pub title: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub channel: Option<String>,
    pub duration_text: Option<String>,
    pub upload_date: Option<String>,
    pub view_count: Option<u64>,
    pub live: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct VideoSearchResponse {
    pub results: Vec<VideoHit>,
    pub cached: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogImage {
    pub cover_type: Option<String>,
    pub remote_url: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogHit {
    pub tmdb_id: u64,
    pub title: String,
    pub year: Option<u32>,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub overview: Option<String>,
    pub images: Vec<CatalogImage>,
    pub remote_poster: Option<String>,
}

impl CatalogHit {
    /// `remotePoster` when present, else the first poster image.
    pub fn poster_url(&self) -> Option<String> {
        if let Some(poster) = self.remote_poster.as_deref().filter(|p| !p.is_empty()) {
            return Some(poster.to_string());
        }
        self.images
            .iter()
            .filter(|image| {
                image
                    .cover_type
                    .as_deref()
                    .is_some_and(|kind| kind.eq_ignore_ascii_case("poster"))
            })
            .find_map(|image| image.remote_url.clone().or_else(|| image.url.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CatalogSearchResponse {
    pub results: Vec<CatalogHit>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LibraryMoviePayload {
    pub id: u64,
    pub tmdb_id: u64,
    pub title: String,
    pub year: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MovieResponse {
    pub movie: Option<LibraryMoviePayload>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LibraryResponse {
    pub movies: Vec<LibraryMoviePayload>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistEntryPayload {
    pub index: u32,
    pub id: String,
    pub title: String,
    pub duration: Option<u64>,
    pub duration_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistPreviewPayload {
    pub entries: Vec<PlaylistEntryPayload>,
    pub playlist_title: String,
    pub total_count: usize,
    pub truncated: bool,
    pub error: Option<String>,
}

/// Error bodies carry an `error` string, a `logs` array, or both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    pub logs: Vec<String>,
}

/// Which search slot a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Video,
    Catalog,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    JobCreated(Result<JobEnvelope, ApiError>),
    JobsListed(Result<JobList, ApiError>),
    /// One poll tick. `Ok(None)` means the backend no longer knows the job.
    JobPolled {
        job_id: JobId,
        seq: u64,
        result: Result<Option<JobEnvelope>, ApiError>,
    },
    CancelFinished {
        job_id: JobId,
        result: Result<JobEnvelope, ApiError>,
    },
    VideoSearchFinished {
        token: u64,
        result: Result<VideoSearchResponse, ApiError>,
    },
    CatalogSearchFinished {
        token: u64,
        result: Result<Vec<CatalogHit>, ApiError>,
    },
    MovieAdded(Result<LibraryMoviePayload, ApiError>),
    LibraryLoaded(Result<Vec<LibraryMoviePayload>, ApiError>),
    PlaylistPreviewed {
        url: String,
        result: Result<PlaylistPreviewPayload, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
    /// Backend log lines that explain the failure, if any.
    pub logs: Vec<String>,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            logs: Vec::new(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, FailureKind::Cancelled.to_string())
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal statuses as the backend spells them.
pub(crate) fn is_terminal_status(status: &str) -> bool {
    matches!(
        status.trim().to_ascii_lowercase().as_str(),
        "complete" | "completed" | "failed" | "cancelled"
    )
}
