use crate::form::{ExtraType, PlaylistMode};
use crate::job::{JobId, JobStatus, Timestamp};
use crate::log_filter::ClassifiedLine;
use crate::search::{Feedback, SearchState, SearchResult};
use crate::search::{CatalogResult, VideoResult};
use crate::state::AppState;

pub const METADATA_SEPARATOR: &str = " • ";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub jobs: Vec<JobCardView>,
    pub job_count: usize,
    pub polling_count: usize,
    pub console: Vec<ClassifiedLine>,
    pub attached_job: Option<JobId>,
    pub debug_mode: bool,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub form: FormView,
    pub video_search: SearchView,
    pub catalog_search: SearchView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardView {
    pub job_id: JobId,
    pub label: String,
    pub subtitle: String,
    pub status: JobStatus,
    pub status_label: &'static str,
    pub progress: u8,
    pub metadata_text: String,
    pub message: Option<String>,
    pub cancel: Option<CancelControl>,
    pub attached: bool,
    pub polling: bool,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelControl {
    pub enabled: bool,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchView {
    pub query: String,
    pub loading: bool,
    pub feedback: Option<Feedback>,
    pub rows: Vec<SearchRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRowView {
    pub title: String,
    pub detail: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormView {
    pub url: String,
    pub movie_query: String,
    pub selected_movie: Option<String>,
    pub extra: bool,
    pub extra_type: Option<ExtraType>,
    pub extra_name: String,
    pub extra_fields_enabled: bool,
    pub playlist_mode: PlaylistMode,
    pub playlist_title: Option<String>,
    pub playlist_entries: Vec<PlaylistEntryView>,
    pub preview_loading: bool,
    pub library_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntryView {
    pub index: u32,
    pub title: String,
    pub duration_text: String,
    pub included: bool,
    pub extra_type: ExtraType,
}

pub(crate) fn build(state: &AppState) -> AppViewModel {
    let jobs: Vec<JobCardView> = state
        .store
        .iter()
        .map(|record| {
            let pending = state.pending_cancel.contains(&record.id);
            let cancel = record.status.is_cancellable().then_some(CancelControl {
                enabled: !pending,
                label: if pending { "Cancelling…" } else { "Cancel" },
            });
            let message = matches!(record.status, JobStatus::Failed | JobStatus::Cancelled)
                .then(|| record.message.clone())
                .filter(|message| !message.is_empty());
            JobCardView {
                job_id: record.id.clone(),
                label: record.label.clone(),
                subtitle: record.subtitle.clone(),
                status: record.status,
                status_label: record.status.label(),
                progress: record.progress,
                metadata_text: record.metadata.join(METADATA_SEPARATOR),
                message,
                cancel,
                attached: state.console.is_attached_to(&record.id),
                polling: state.pollers.is_polling(&record.id),
                started_at: record.started_at,
                updated_at: record.updated_at,
            }
        })
        .collect();

    let form = &state.form;
    let playlist_entries = if form.playlist_choices_visible() {
        form.playlist
            .iter()
            .flat_map(|playlist| playlist.entries.iter())
            .map(|entry| PlaylistEntryView {
                index: entry.index,
                title: entry.title.clone(),
                duration_text: entry.duration_text.clone(),
                included: entry.included,
                extra_type: entry.extra_type,
            })
            .collect()
    } else {
        Vec::new()
    };

    AppViewModel {
        job_count: jobs.len(),
        jobs,
        polling_count: state.pollers.len(),
        console: state.console.lines().to_vec(),
        attached_job: state.console.attached().map(ToOwned::to_owned),
        debug_mode: state.debug_mode(),
        submit_enabled: !state.submitting,
        submit_label: if state.submitting { "Submitting…" } else { "Submit" },
        form: FormView {
            url: form.url.clone(),
            movie_query: form.movie_query.clone(),
            selected_movie: form.selected_movie.as_ref().map(|m| m.display_label()),
            extra: form.extra,
            extra_type: form.extra_fields_enabled().then_some(form.extra_type),
            extra_name: form.extra_name.clone(),
            extra_fields_enabled: form.extra_fields_enabled(),
            playlist_mode: form.playlist_mode,
            playlist_title: form.playlist.as_ref().map(|p| p.title.clone()),
            playlist_entries,
            preview_loading: state.preview_loading,
            library_count: state.library.len(),
        },
        video_search: search_view(&state.video_search, video_row),
        catalog_search: search_view(&state.catalog_search, catalog_row),
    }
}

fn search_view<R: SearchResult>(
    search: &SearchState<R>,
    row: fn(&R) -> SearchRowView,
) -> SearchView {
    SearchView {
        query: search.query().to_string(),
        loading: search.is_loading(),
        feedback: search.feedback().cloned(),
        rows: search.results().iter().map(row).collect(),
    }
}

fn video_row(result: &VideoResult) -> SearchRowView {
    let mut detail = Vec::new();
    if !result.channel.is_empty() {
        detail.push(result.channel.clone());
    }
    if result.live {
        detail.push("LIVE".to_string());
    } else if !result.duration_text.is_empty() {
        detail.push(result.duration_text.clone());
    }
    if let Some(views) = result.view_count {
        detail.push(format!("{views} views"));
    }
    SearchRowView {
        title: result.title.clone(),
        detail: detail.join(METADATA_SEPARATOR),
        value: result.field_value(),
    }
}

fn catalog_row(result: &CatalogResult) -> SearchRowView {
    let mut detail = Vec::new();
    if let Some(runtime) = result.runtime.filter(|r| *r > 0) {
        detail.push(format!("{runtime} min"));
    }
    if !result.genres.is_empty() {
        detail.push(result.genres.join(", "));
    }
    SearchRowView {
        title: result.display_label(),
        detail: detail.join(METADATA_SEPARATOR),
        value: result.field_value(),
    }
}
