#![allow(dead_code)]

use std::sync::Once;

use deck_core::{
    update, AppState, Effect, FormField, JobSnapshot, JobStatus, JobUpdate, LibraryMovie, Msg,
    PollOutcome,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(deck_logging::initialize_for_tests);
}

pub fn heat() -> LibraryMovie {
    LibraryMovie {
        id: 7,
        tmdb_id: 949,
        title: "Heat".to_string(),
        year: Some(1995),
    }
}

pub fn apply(state: AppState, msgs: Vec<Msg>) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();
    let mut state = state;
    for msg in msgs {
        let (next, produced) = update(state, msg);
        state = next;
        effects.extend(produced);
    }
    (state, effects)
}

/// A state with the library loaded and a valid form filled in.
pub fn filled_form() -> AppState {
    let (state, _) = apply(
        AppState::new(),
        vec![
            Msg::LibraryLoaded(Ok(vec![heat()])),
            Msg::FieldChanged {
                field: FormField::Url,
                value: "https://www.youtube.com/watch?v=abc".to_string(),
            },
            Msg::FieldChanged {
                field: FormField::MovieQuery,
                value: "heat (1995)".to_string(),
            },
        ],
    );
    state
}

pub fn snapshot(job: JobUpdate, logs: Option<Vec<&str>>) -> JobSnapshot {
    JobSnapshot {
        job,
        logs: logs.map(|lines| lines.into_iter().map(str::to_string).collect()),
        debug_mode: Some(false),
    }
}

pub fn polled(job_id: &str, seq: u64, status: JobStatus, progress: f64) -> Msg {
    Msg::JobPolled {
        job_id: job_id.to_string(),
        seq,
        outcome: PollOutcome::Found(snapshot(
            JobUpdate::with_id(job_id).status(status).progress(progress),
            None,
        )),
    }
}

/// Create job `job_id` through the form and return the resulting state.
pub fn created(job_id: &str) -> AppState {
    let (state, _) = apply(
        filled_form(),
        vec![
            Msg::SubmitClicked,
            Msg::JobCreated(Ok(snapshot(
                JobUpdate::with_id(job_id).status(JobStatus::Queued),
                Some(vec!["Job queued."]),
            ))),
        ],
    );
    state
}
