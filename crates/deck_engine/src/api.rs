use std::time::Duration;

use deck_logging::{deck_debug, deck_warn};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::types::{
    CatalogHit, CatalogSearchResponse, CreateJobBody, ErrorBody, JobEnvelope, JobList,
    LibraryMoviePayload, LibraryResponse, MovieResponse, PlaylistPreviewPayload,
    VideoSearchResponse,
};
use crate::{ApiError, FailureKind};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applied to every request except job polls, which may hang as long as
    /// the backend needs.
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The backend endpoints the deck talks to.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn create_job(&self, body: &CreateJobBody) -> Result<JobEnvelope, ApiError>;
    async fn list_jobs(&self) -> Result<JobList, ApiError>;
    /// `Ok(None)` when the backend answers 404 or omits the job.
    async fn fetch_job(&self, job_id: &str) -> Result<Option<JobEnvelope>, ApiError>;
    async fn cancel_job(&self, job_id: &str) -> Result<JobEnvelope, ApiError>;
    async fn search_videos(&self, query: &str, limit: u32)
        -> Result<VideoSearchResponse, ApiError>;
    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogHit>, ApiError>;
    async fn add_movie(&self, tmdb_id: u64) -> Result<LibraryMoviePayload, ApiError>;
    async fn refresh_library(&self) -> Result<Vec<LibraryMoviePayload>, ApiError>;
    async fn preview_playlist(&self, url: &str) -> Result<PlaylistPreviewPayload, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ApiSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(settings.base_url.trim())
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("unsupported server url {base}"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, "server url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, timeout: bool) -> Result<T, ApiError> {
        let mut request = self.client.get(url.clone());
        if timeout {
            request = request.timeout(self.settings.request_timeout);
        }
        let bytes = self.send(request, &url).await?;
        decode(&bytes)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<&impl Serialize>,
    ) -> Result<T, ApiError> {
        let mut request = self
            .client
            .post(url.clone())
            .timeout(self.settings.request_timeout);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body)
                .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
            request = request.header(CONTENT_TYPE, "application/json").body(payload);
        }
        let bytes = self.send(request, &url).await?;
        decode(&bytes)
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<Vec<u8>, ApiError> {
        deck_debug!("request {}", url.path());
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let kind = FailureKind::HttpStatus(status.as_u16());
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        let message = body
            .error
            .or(body.message)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| kind.to_string());
        deck_warn!("{} {} failed: {}", status.as_u16(), url.path(), message);
        Err(ApiError {
            kind,
            message,
            logs: body.logs,
        })
    }
}

#[async_trait::async_trait]
impl ApiClient for ReqwestApi {
    async fn create_job(&self, body: &CreateJobBody) -> Result<JobEnvelope, ApiError> {
        let url = self.endpoint(&["create"])?;
        self.post(url, Some(body)).await
    }

    async fn list_jobs(&self) -> Result<JobList, ApiError> {
        let url = self.endpoint(&["jobs"])?;
        self.get(url, true).await
    }

    async fn fetch_job(&self, job_id: &str) -> Result<Option<JobEnvelope>, ApiError> {
        let url = self.endpoint(&["jobs", job_id])?;
        match self.get::<JobEnvelope>(url, false).await {
            Ok(envelope) if envelope.job.is_some() => Ok(Some(envelope)),
            Ok(_) => Ok(None),
            Err(err) if err.kind == FailureKind::HttpStatus(404) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn cancel_job(&self, job_id: &str) -> Result<JobEnvelope, ApiError> {
        let url = self.endpoint(&["jobs", job_id, "cancel"])?;
        self.post(url, None::<&()>).await
    }

    async fn search_videos(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<VideoSearchResponse, ApiError> {
        let mut url = self.endpoint(&["youtube", "search"])?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &limit.to_string());
        let response: VideoSearchResponse = self.get(url, true).await?;
        reject_error_field(response.error.as_deref(), response.results.is_empty())?;
        Ok(response)
    }

    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogHit>, ApiError> {
        let mut url = self.endpoint(&["radarr", "search"])?;
        url.query_pairs_mut().append_pair("query", query);
        let response: CatalogSearchResponse = self.get(url, true).await?;
        reject_error_field(response.error.as_deref(), response.results.is_empty())?;
        Ok(response.results)
    }

    async fn add_movie(&self, tmdb_id: u64) -> Result<LibraryMoviePayload, ApiError> {
        let url = self.endpoint(&["radarr", "movies"])?;
        let body = serde_json::json!({ "tmdbId": tmdb_id, "search": true });
        let response: MovieResponse = self.post(url, Some(&body)).await?;
        match response.movie {
            Some(movie) => Ok(movie),
            None => Err(ApiError::new(
                FailureKind::Decode,
                response
                    .error
                    .unwrap_or_else(|| "response did not include the movie".to_string()),
            )),
        }
    }

    async fn refresh_library(&self) -> Result<Vec<LibraryMoviePayload>, ApiError> {
        let url = self.endpoint(&["radarr", "movies", "refresh"])?;
        let response: LibraryResponse = self.post(url, None::<&()>).await?;
        reject_error_field(response.error.as_deref(), response.movies.is_empty())?;
        Ok(response.movies)
    }

    async fn preview_playlist(&self, url: &str) -> Result<PlaylistPreviewPayload, ApiError> {
        let endpoint = self.endpoint(&["playlist_preview"])?;
        let body = serde_json::json!({ "yturl": url });
        let response: PlaylistPreviewPayload = self.post(endpoint, Some(&body)).await?;
        reject_error_field(response.error.as_deref(), response.entries.is_empty())?;
        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice(b"{}")
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()));
    }
    serde_json::from_slice(bytes).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

/// A 2xx body that carries only an `error` string is still a failure.
fn reject_error_field(error: Option<&str>, empty: bool) -> Result<(), ApiError> {
    match error.map(str::trim) {
        Some(message) if empty && !message.is_empty() => {
            Err(ApiError::new(FailureKind::HttpStatus(200), message))
        }
        _ => Ok(()),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
