use crate::form::{is_youtube_url, FormField, LibraryMovie, PlaylistMode, PlaylistPreview};
use crate::job::{JobId, JobUpdate};
use crate::msg::{CancelReply, JobSnapshot, PollOutcome};
use crate::search::{RequestFailure, SearchKind, SearchPlan, SearchResult};
use crate::store::Placement;
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FieldChanged { field, value } => field_changed(&mut state, field, &value),
        Msg::ExtraToggled(extra) => {
            state.form.extra = extra;
            state.mark_dirty();
            Vec::new()
        }
        Msg::ExtraTypeChosen(extra_type) => {
            state.form.extra_type = extra_type;
            state.mark_dirty();
            Vec::new()
        }
        Msg::PlaylistModeChosen(mode) => {
            state.form.playlist_mode = mode;
            state.mark_dirty();
            let preview_missing = state
                .form
                .playlist
                .as_ref()
                .map_or(true, |playlist| playlist.url != state.form.url.trim());
            if mode == PlaylistMode::Extras
                && preview_missing
                && !state.preview_loading
                && is_youtube_url(&state.form.url)
            {
                request_preview(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::PlaylistEntryChosen {
            index,
            included,
            extra_type,
        } => {
            state.form.set_entry_choice(index, included, extra_type);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::JobCreated(result) => job_created(&mut state, result),
        Msg::JobsRefreshRequested => vec![Effect::FetchJobs],
        Msg::JobsListed(Ok((jobs, debug))) => jobs_listed(&mut state, jobs, debug),
        Msg::JobsListed(Err(failure)) => {
            state.console_error(&format!("Failed to load jobs: {}", failure.message));
            Vec::new()
        }
        Msg::JobPolled {
            job_id,
            seq,
            outcome,
        } => job_polled(&mut state, job_id, seq, outcome),
        Msg::ConsoleAttachRequested(job_id) => {
            if !state.store.contains(&job_id) {
                return (state, Vec::new());
            }
            state.console.attach(&job_id);
            state.mark_dirty();
            start_polling(&mut state, &job_id, true)
                .into_iter()
                .collect()
        }
        Msg::ConsoleDetached => {
            state.console.detach();
            state.console.clear();
            state.mark_dirty();
            Vec::new()
        }
        Msg::DebugModeToggled => {
            state.toggle_debug();
            Vec::new()
        }
        Msg::CancelClicked(job_id) => cancel_clicked(&mut state, job_id),
        Msg::CancelFinished { job_id, result } => cancel_finished(&mut state, job_id, result),
        Msg::SearchInput { kind, query } => {
            let plan = match kind {
                SearchKind::Video => state.video_search.input_changed(&query),
                SearchKind::Catalog => state.catalog_search.input_changed(&query),
            };
            state.mark_dirty();
            search_effects(kind, plan)
        }
        Msg::SearchSubmitted { kind, query } => {
            let plan = match kind {
                SearchKind::Video => state.video_search.submit_now(&query),
                SearchKind::Catalog => state.catalog_search.submit_now(&query),
            };
            state.mark_dirty();
            search_effects(kind, plan)
        }
        Msg::VideoSearchCompleted { token, result } => {
            if state.video_search.complete(token, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CatalogSearchCompleted { token, result } => {
            if state.catalog_search.complete(token, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SearchResultSelected { kind, index } => result_selected(&mut state, kind, index),
        Msg::CatalogMovieAdded(result) => {
            state.pending_catalog_add = None;
            match result {
                Ok(movie) => {
                    state.form.movie_query = movie.display_label();
                    add_to_library(&mut state.library, movie);
                    state.form.match_movie(&state.library);
                }
                Err(failure) => {
                    state.console_error(&format!(
                        "Could not add movie to the library: {}",
                        failure.message
                    ));
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::LibraryRefreshRequested => {
            if state.library_loading {
                return (state, Vec::new());
            }
            state.library_loading = true;
            state.mark_dirty();
            vec![Effect::RefreshLibrary]
        }
        Msg::LibraryLoaded(result) => {
            state.library_loading = false;
            match result {
                Ok(movies) => {
                    state.library = movies;
                    state.form.match_movie(&state.library);
                }
                Err(failure) => {
                    state.console_error(&format!(
                        "Failed to refresh the movie library: {}",
                        failure.message
                    ));
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::PlaylistPreviewRequested => request_preview(&mut state),
        Msg::PlaylistPreviewLoaded(result) => preview_loaded(&mut state, result),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn field_changed(state: &mut AppState, field: FormField, value: &str) -> Vec<Effect> {
    state.form.set_field(field, value);
    match field {
        FormField::MovieQuery => state.form.match_movie(&state.library),
        FormField::Url => {
            let url = state.form.url.trim();
            if state
                .form
                .playlist
                .as_ref()
                .is_some_and(|playlist| playlist.url != url)
            {
                state.form.playlist = None;
            }
        }
        FormField::Resolution | FormField::Extension | FormField::ExtraName => {}
    }
    state.mark_dirty();
    Vec::new()
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.submitting {
        return Vec::new();
    }
    match state.form.validate() {
        Ok(request) => {
            state.submitting = true;
            state.mark_dirty();
            vec![Effect::CreateJob(request)]
        }
        Err(errors) => {
            for error in errors {
                state.console_error(&error);
            }
            Vec::new()
        }
    }
}

fn job_created(state: &mut AppState, result: Result<JobSnapshot, RequestFailure>) -> Vec<Effect> {
    state.submitting = false;
    state.mark_dirty();
    let snapshot = match result {
        Ok(snapshot) => snapshot,
        Err(failure) => {
            if failure.logs.is_empty() {
                state.console_error(&format!("Failed to create job: {}", failure.message));
            } else {
                for line in &failure.logs {
                    state.console_error(line);
                }
            }
            return Vec::new();
        }
    };

    state.apply_server_debug(snapshot.debug_mode);
    let Some(job_id) = snapshot.job.id.clone() else {
        state.console_error("Backend accepted the job but returned no job id.");
        return Vec::new();
    };

    let now = state.now();
    let outcome = state.store.upsert(snapshot.job, now, Placement::Head);
    let mut effects = evict(state, outcome.evicted);
    if !state.store.contains(&job_id) {
        return effects;
    }

    state.console.attach(&job_id);
    let logs = snapshot.logs.unwrap_or_default();
    let debug = state.debug_mode();
    state.console.render_log_lines(&logs, debug);

    if state.store.get(&job_id).is_some_and(|job| !job.status.is_terminal()) {
        effects.extend(start_polling(state, &job_id, true));
    }
    effects
}

fn jobs_listed(state: &mut AppState, jobs: Vec<JobUpdate>, debug: Option<bool>) -> Vec<Effect> {
    state.apply_server_debug(debug);
    let now = state.now();
    let mut effects = Vec::new();
    for job in jobs {
        let outcome = state.store.upsert(job, now, Placement::Tail);
        effects.extend(evict(state, outcome.evicted));
    }
    let active: Vec<JobId> = state
        .store
        .iter()
        .filter(|job| !job.status.is_terminal())
        .map(|job| job.id.clone())
        .collect();
    for job_id in active {
        effects.extend(start_polling(state, &job_id, false));
    }
    clear_stale_cancels(state);
    state.mark_dirty();
    effects
}

fn job_polled(state: &mut AppState, job_id: JobId, seq: u64, outcome: PollOutcome) -> Vec<Effect> {
    if !state.pollers.accept(&job_id, seq) {
        return Vec::new();
    }
    state.mark_dirty();

    match outcome {
        PollOutcome::Found(snapshot) => {
            state.apply_server_debug(snapshot.debug_mode);
            let mut job = snapshot.job;
            job.id.get_or_insert_with(|| job_id.clone());

            let now = state.now();
            let outcome = state.store.upsert(job, now, Placement::Tail);
            let mut effects = evict(state, outcome.evicted);
            let Some(status) = state.store.get(&job_id).map(|job| job.status) else {
                return effects;
            };

            let wants_console = state.pollers.take_console_request(&job_id);
            if let Some(logs) = snapshot.logs {
                if wants_console || state.console.is_attached_to(&job_id) {
                    state.console.attach(&job_id);
                    let debug = state.debug_mode();
                    state.console.render_log_lines(&logs, debug);
                }
            }

            clear_stale_cancels(state);
            if status.is_terminal() {
                state.pollers.stop(&job_id);
                effects.push(Effect::StopPoller { job_id });
            }
            effects
        }
        PollOutcome::NotFound => {
            state.pollers.stop(&job_id);
            state.pending_cancel.remove(&job_id);
            if state.console.is_attached_to(&job_id) {
                state.console.detach();
                state.console_error(&format!("Job {job_id} is no longer available on the server."));
            }
            vec![Effect::StopPoller { job_id }]
        }
        PollOutcome::Failed(failure) => {
            state.pollers.stop(&job_id);
            state.console_error(&format!(
                "Failed to refresh job {job_id}: {}",
                failure.message
            ));
            vec![Effect::StopPoller { job_id }]
        }
    }
}

fn cancel_clicked(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    let cancellable = state
        .store
        .get(&job_id)
        .is_some_and(|job| job.status.is_cancellable());
    if !cancellable || state.pending_cancel.contains(&job_id) {
        return Vec::new();
    }
    state.pending_cancel.insert(job_id.clone());
    state.mark_dirty();
    vec![Effect::CancelJob { job_id }]
}

fn cancel_finished(
    state: &mut AppState,
    job_id: JobId,
    result: Result<CancelReply, RequestFailure>,
) -> Vec<Effect> {
    state.mark_dirty();
    let reply = match result {
        Ok(reply) => reply,
        Err(failure) => {
            state.pending_cancel.remove(&job_id);
            state.console_error(&format!("Failed to cancel job {job_id}: {}", failure.message));
            return Vec::new();
        }
    };

    let mut effects = Vec::new();
    if let Some(mut job) = reply.job {
        job.id.get_or_insert_with(|| job_id.clone());
        let now = state.now();
        let outcome = state.store.upsert(job, now, Placement::Tail);
        effects.extend(evict(state, outcome.evicted));
    }
    if let Some(message) = reply.message.filter(|m| !m.trim().is_empty()) {
        if state.console.is_attached_to(&job_id) {
            state.console_muted(&message);
        }
    }
    clear_stale_cancels(state);

    // Not assumed dead: keep polling until a terminal status shows up.
    if state
        .store
        .get(&job_id)
        .is_some_and(|job| !job.status.is_terminal())
    {
        effects.extend(start_polling(state, &job_id, false));
    }
    effects
}

fn result_selected(state: &mut AppState, kind: SearchKind, index: usize) -> Vec<Effect> {
    match kind {
        SearchKind::Video => {
            let Some(value) = state.video_search.select(index).map(SearchResult::field_value)
            else {
                return Vec::new();
            };
            field_changed(state, FormField::Url, &value)
        }
        SearchKind::Catalog => {
            let Some(result) = state.catalog_search.select(index).cloned() else {
                return Vec::new();
            };
            let mut effects = field_changed(state, FormField::MovieQuery, &result.field_value());
            if state.form.selected_movie.is_none() && state.pending_catalog_add.is_none() {
                state.pending_catalog_add = Some(result.tmdb_id);
                state.console_muted(&format!(
                    "Adding {} to the library...",
                    result.display_label()
                ));
                effects.push(Effect::AddCatalogMovie {
                    tmdb_id: result.tmdb_id,
                });
            }
            effects
        }
    }
}

fn request_preview(state: &mut AppState) -> Vec<Effect> {
    let url = state.form.url.trim().to_string();
    if !is_youtube_url(&url) {
        state.console_error("Please provide a valid YouTube URL.");
        return Vec::new();
    }
    state.preview_loading = true;
    state.mark_dirty();
    vec![Effect::PreviewPlaylist { url }]
}

fn preview_loaded(state: &mut AppState, result: Result<PlaylistPreview, RequestFailure>) -> Vec<Effect> {
    state.preview_loading = false;
    state.mark_dirty();
    match result {
        Ok(mut preview) => {
            if preview.url != state.form.url.trim() {
                // URL changed while the preview was loading.
                return Vec::new();
            }
            if let Some(previous) = &state.form.playlist {
                preview.inherit_choices(previous);
            }
            state.form.playlist = Some(preview);
        }
        Err(failure) => {
            state.console_error(&format!("Playlist preview failed: {}", failure.message));
        }
    }
    Vec::new()
}

fn search_effects(kind: SearchKind, plan: SearchPlan) -> Vec<Effect> {
    let mut effects = vec![Effect::AbortSearch { kind }];
    if let SearchPlan::Run {
        token,
        query,
        delay,
    } = plan
    {
        effects.push(Effect::RunSearch {
            kind,
            token,
            query,
            delay,
        });
    }
    effects
}

fn start_polling(state: &mut AppState, job_id: &str, show_console: bool) -> Option<Effect> {
    state.pollers.start(job_id, show_console).then(|| {
        state.mark_dirty();
        Effect::StartPoller {
            job_id: job_id.to_string(),
        }
    })
}

fn evict(state: &mut AppState, evicted: Vec<JobId>) -> Vec<Effect> {
    evicted
        .into_iter()
        .map(|job_id| {
            state.pollers.forget(&job_id);
            state.pending_cancel.remove(&job_id);
            if state.console.is_attached_to(&job_id) {
                state.console.detach();
            }
            Effect::StopPoller { job_id }
        })
        .collect()
}

/// Invariant: only cancellable jobs can have a pending cancel flag.
fn clear_stale_cancels(state: &mut AppState) {
    let store = &state.store;
    state.pending_cancel.retain(|job_id| {
        store
            .get(job_id)
            .is_some_and(|job| job.status.is_cancellable())
    });
}

fn add_to_library(library: &mut Vec<LibraryMovie>, movie: LibraryMovie) {
    match library.iter_mut().find(|existing| existing.id == movie.id) {
        Some(existing) => *existing = movie,
        None => library.push(movie),
    }
}
