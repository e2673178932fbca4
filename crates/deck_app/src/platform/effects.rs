use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use deck_core::{
    CancelReply, CatalogResult, CreateJobRequest, Effect, ExtraType, JobSnapshot, JobStatus,
    JobUpdate, LibraryMovie, Msg, PlaylistEntry, PlaylistPreview, PollOutcome, RequestFailure,
    SearchHits, SearchKind, Timestamp, VideoResult,
};
use deck_engine::{
    ApiError, CatalogHit, CreateJobBody, EngineEvent, EngineHandle, JobEnvelope, JobPayload,
    LibraryMoviePayload, PlaylistExtraBody, PlaylistPreviewPayload, SearchTarget, VideoHit,
};
use deck_logging::{deck_debug, deck_info, deck_warn};

/// Timestamp layout the backend writes (`%f` is microseconds there).
const BACKEND_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Executes core effects against the engine and turns engine events back
/// into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CreateJob(request) => {
                    deck_info!("CreateJob url={} movie={}", request.yturl, request.movie_name);
                    self.engine.create_job(create_body(request));
                }
                Effect::FetchJobs => self.engine.fetch_jobs(),
                Effect::StartPoller { job_id } => {
                    deck_debug!("StartPoller job_id={}", job_id);
                    self.engine.start_poller(job_id);
                }
                Effect::StopPoller { job_id } => {
                    deck_debug!("StopPoller job_id={}", job_id);
                    self.engine.stop_poller(job_id);
                }
                Effect::CancelJob { job_id } => {
                    deck_info!("CancelJob job_id={}", job_id);
                    self.engine.cancel_job(job_id);
                }
                Effect::RunSearch {
                    kind,
                    token,
                    query,
                    delay,
                } => self.engine.run_search(search_target(kind), token, query, delay),
                Effect::AbortSearch { kind } => self.engine.abort_search(search_target(kind)),
                Effect::AddCatalogMovie { tmdb_id } => {
                    deck_info!("AddCatalogMovie tmdb_id={}", tmdb_id);
                    self.engine.add_movie(tmdb_id);
                }
                Effect::RefreshLibrary => self.engine.refresh_library(),
                Effect::PreviewPlaylist { url } => self.engine.preview_playlist(url),
            }
        }
    }

    /// Wait up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

fn search_target(kind: SearchKind) -> SearchTarget {
    match kind {
        SearchKind::Video => SearchTarget::Video,
        SearchKind::Catalog => SearchTarget::Catalog,
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::JobCreated(result) => Msg::JobCreated(result.map(snapshot).map_err(failure)),
        EngineEvent::JobsListed(result) => Msg::JobsListed(
            result
                .map(|list| {
                    let jobs = list.jobs.into_iter().map(job_update).collect();
                    (jobs, list.debug_mode)
                })
                .map_err(failure),
        ),
        EngineEvent::JobPolled {
            job_id,
            seq,
            result,
        } => {
            let outcome = match result {
                Ok(Some(envelope)) => PollOutcome::Found(snapshot(envelope)),
                Ok(None) => PollOutcome::NotFound,
                Err(err) => PollOutcome::Failed(failure(err)),
            };
            Msg::JobPolled {
                job_id,
                seq,
                outcome,
            }
        }
        EngineEvent::CancelFinished { job_id, result } => Msg::CancelFinished {
            job_id,
            result: result
                .map(|envelope| CancelReply {
                    job: envelope.job.map(job_update),
                    message: envelope.message,
                })
                .map_err(failure),
        },
        EngineEvent::VideoSearchFinished { token, result } => Msg::VideoSearchCompleted {
            token,
            result: result
                .map(|response| SearchHits {
                    results: response.results.into_iter().map(video_result).collect(),
                    cached: response.cached,
                })
                .map_err(failure),
        },
        EngineEvent::CatalogSearchFinished { token, result } => Msg::CatalogSearchCompleted {
            token,
            result: result
                .map(|hits| SearchHits {
                    results: hits.into_iter().map(catalog_result).collect(),
                    cached: false,
                })
                .map_err(failure),
        },
        EngineEvent::MovieAdded(result) => {
            Msg::CatalogMovieAdded(result.map(library_movie).map_err(failure))
        }
        EngineEvent::LibraryLoaded(result) => Msg::LibraryLoaded(
            result
                .map(|movies| movies.into_iter().map(library_movie).collect())
                .map_err(failure),
        ),
        EngineEvent::PlaylistPreviewed { url, result } => Msg::PlaylistPreviewLoaded(
            result
                .map(|payload| playlist_preview(url, payload))
                .map_err(failure),
        ),
    }
}

fn failure(err: ApiError) -> RequestFailure {
    if err.is_cancelled() {
        return RequestFailure::cancelled();
    }
    deck_warn!("request failed: {} ({})", err.message, err.kind);
    RequestFailure {
        message: err.message,
        logs: err.logs,
        cancelled: false,
    }
}

fn snapshot(envelope: JobEnvelope) -> JobSnapshot {
    let logs = envelope.log_lines().map(<[String]>::to_vec);
    JobSnapshot {
        job: envelope.job.map(job_update).unwrap_or_default(),
        logs,
        debug_mode: envelope.debug_mode,
    }
}

pub(crate) fn job_update(payload: JobPayload) -> JobUpdate {
    let started_at = payload
        .started_at
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| payload.created_at.as_deref().and_then(parse_timestamp));
    JobUpdate {
        id: payload.id.filter(|id| !id.trim().is_empty()),
        label: payload.label,
        subtitle: payload.subtitle,
        status: payload.status.as_deref().map(JobStatus::parse),
        progress: payload.progress,
        metadata: payload.metadata,
        message: payload.message,
        started_at,
        updated_at: payload.updated_at.as_deref().and_then(parse_timestamp),
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, BACKEND_TIME_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
}

fn video_result(hit: VideoHit) -> VideoResult {
    VideoResult {
        title: hit.title.unwrap_or_default(),
        url: hit.url.unwrap_or_default(),
        thumbnail: hit.thumbnail.filter(|t| !t.is_empty()),
        channel: hit.channel.unwrap_or_default(),
        duration_text: hit.duration_text.unwrap_or_default(),
        upload_date: hit.upload_date.unwrap_or_default(),
        view_count: hit.view_count,
        live: hit.live.unwrap_or(false),
        description: hit.description.unwrap_or_default(),
    }
}

fn catalog_result(hit: CatalogHit) -> CatalogResult {
    let poster_url = hit.poster_url();
    CatalogResult {
        tmdb_id: hit.tmdb_id,
        title: hit.title,
        year: hit.year,
        runtime: hit.runtime,
        genres: hit.genres,
        overview: hit.overview.unwrap_or_default(),
        poster_url,
    }
}

fn library_movie(payload: LibraryMoviePayload) -> LibraryMovie {
    LibraryMovie {
        id: payload.id,
        tmdb_id: payload.tmdb_id,
        title: payload.title,
        year: payload.year,
    }
}

fn playlist_preview(url: String, payload: PlaylistPreviewPayload) -> PlaylistPreview {
    let entries: Vec<PlaylistEntry> = payload
        .entries
        .into_iter()
        .map(|entry| PlaylistEntry {
            index: entry.index,
            id: entry.id,
            title: entry.title,
            duration: entry.duration,
            duration_text: entry.duration_text,
            included: true,
            extra_type: ExtraType::Trailer,
        })
        .collect();
    PlaylistPreview {
        url,
        title: payload.playlist_title,
        total_count: payload.total_count.max(entries.len()),
        truncated: payload.truncated,
        entries,
    }
}

fn create_body(request: CreateJobRequest) -> CreateJobBody {
    CreateJobBody {
        yturl: request.yturl,
        movie_name: request.movie_name,
        movie_id: request.movie_id,
        title: request.title,
        year: request.year,
        tmdb: request.tmdb,
        resolution: request.resolution,
        extension: request.extension,
        extra: request.extra,
        extra_type: request.extra_type,
        extra_name: request.extra_name,
        playlist_mode: request.playlist_mode,
        merge_playlist: request.merge_playlist,
        playlist_extra_types: request.playlist_extra_types,
        playlist_extra_entries: request
            .playlist_extra_entries
            .into_iter()
            .map(|entry| PlaylistExtraBody {
                index: entry.index,
                id: entry.id,
                title: entry.title,
                extra_type: entry.extra_type,
                name: entry.name,
                duration: entry.duration,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use deck_engine::FailureKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_backend_and_rfc3339_timestamps() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2025-01-02T03:04:05.000000Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-02T04:04:05+01:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn job_payload_maps_to_partial_update() {
        let update = job_update(JobPayload {
            id: Some("j1".to_string()),
            status: Some("Completed".to_string()),
            progress: Some(99.6),
            created_at: Some("2025-01-02T03:04:05.000000Z".to_string()),
            ..JobPayload::default()
        });
        assert_eq!(update.status, Some(JobStatus::Complete));
        assert_eq!(update.progress, Some(99.6));
        assert_eq!(
            update.started_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap())
        );
        assert_eq!(update.label, None);
        assert_eq!(update.updated_at, None);
    }

    #[test]
    fn blank_job_id_is_dropped() {
        let update = job_update(JobPayload {
            id: Some("  ".to_string()),
            ..JobPayload::default()
        });
        assert_eq!(update.id, None);
    }

    #[test]
    fn poll_events_map_to_outcomes() {
        let msg = map_event(EngineEvent::JobPolled {
            job_id: "j1".to_string(),
            seq: 4,
            result: Ok(None),
        });
        assert_eq!(
            msg,
            Msg::JobPolled {
                job_id: "j1".to_string(),
                seq: 4,
                outcome: PollOutcome::NotFound,
            }
        );

        let msg = map_event(EngineEvent::JobPolled {
            job_id: "j1".to_string(),
            seq: 5,
            result: Err(ApiError {
                kind: FailureKind::HttpStatus(500),
                message: "http status 500".to_string(),
                logs: Vec::new(),
            }),
        });
        let Msg::JobPolled {
            outcome: PollOutcome::Failed(failure),
            ..
        } = msg
        else {
            panic!("expected failure outcome");
        };
        assert_eq!(failure.message, "http status 500");
        assert!(!failure.cancelled);
    }

    #[test]
    fn cancelled_search_stays_cancelled() {
        let msg = map_event(EngineEvent::VideoSearchFinished {
            token: 3,
            result: Err(ApiError::cancelled()),
        });
        assert_eq!(
            msg,
            Msg::VideoSearchCompleted {
                token: 3,
                result: Err(RequestFailure::cancelled()),
            }
        );
    }

    #[test]
    fn snapshot_prefers_job_logs() {
        let envelope = JobEnvelope {
            job: Some(JobPayload {
                id: Some("j1".to_string()),
                logs: Some(vec!["from job".to_string()]),
                ..JobPayload::default()
            }),
            logs: Some(vec!["top level".to_string()]),
            debug_mode: Some(true),
            message: None,
        };
        let snapshot = snapshot(envelope);
        assert_eq!(snapshot.logs, Some(vec!["from job".to_string()]));
        assert_eq!(snapshot.debug_mode, Some(true));
    }
}
