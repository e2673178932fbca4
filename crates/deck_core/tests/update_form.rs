mod common;

use common::{apply, filled_form, init_logging};
use deck_core::{
    update, AppState, Effect, ExtraType, FormField, LogCategory, Msg, PlaylistEntry, PlaylistMode,
    PlaylistPreview,
};
use pretty_assertions::assert_eq;

const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PL123";

fn entry(index: u32, id: &str, included: bool) -> PlaylistEntry {
    PlaylistEntry {
        index,
        id: id.to_string(),
        title: format!("Clip {index}"),
        duration: Some(90),
        duration_text: "1:30".to_string(),
        included,
        extra_type: ExtraType::Trailer,
    }
}

fn preview(url: &str, entries: Vec<PlaylistEntry>) -> PlaylistPreview {
    PlaylistPreview {
        url: url.to_string(),
        title: "Heat extras".to_string(),
        total_count: entries.len(),
        truncated: false,
        entries,
    }
}

fn extras_form() -> AppState {
    let (state, effects) = apply(
        filled_form(),
        vec![
            Msg::FieldChanged {
                field: FormField::Url,
                value: PLAYLIST_URL.to_string(),
            },
            Msg::PlaylistModeChosen(PlaylistMode::Extras),
        ],
    );
    assert_eq!(
        effects,
        vec![Effect::PreviewPlaylist {
            url: PLAYLIST_URL.to_string()
        }]
    );
    state
}

#[test]
fn noop_leaves_state_untouched() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn invalid_form_reports_every_problem_to_console() {
    init_logging();
    let (state, effects) = apply(
        AppState::new(),
        vec![
            Msg::FieldChanged {
                field: FormField::Url,
                value: "https://vimeo.com/1".to_string(),
            },
            Msg::ExtraToggled(true),
            Msg::SubmitClicked,
        ],
    );
    assert!(effects.is_empty());
    assert!(!state.is_submitting());

    let console = state.view().console;
    let mut texts: Vec<_> = console.iter().map(|line| line.text.as_str()).collect();
    texts.sort_unstable();
    assert_eq!(
        texts,
        vec![
            "Extra name is required when storing in a subfolder.",
            "No movie selected. Please choose a movie from the suggestions list.",
            "Please provide a valid YouTube URL.",
        ]
    );
    assert!(console.iter().all(|line| line.category == LogCategory::Error));
}

#[test]
fn valid_form_builds_create_request() {
    init_logging();
    let (state, effects) = apply(
        filled_form(),
        vec![
            Msg::FieldChanged {
                field: FormField::Resolution,
                value: " 1080p ".to_string(),
            },
            Msg::ExtraToggled(true),
            Msg::ExtraTypeChosen(ExtraType::Featurette),
            Msg::FieldChanged {
                field: FormField::ExtraName,
                value: "Making of".to_string(),
            },
            Msg::SubmitClicked,
            Msg::SubmitClicked,
        ],
    );
    assert_eq!(effects.len(), 1, "second click while submitting is ignored");
    let Effect::CreateJob(request) = &effects[0] else {
        panic!("expected create effect, got {effects:?}");
    };
    assert_eq!(request.movie_name, "Heat (1995)");
    assert_eq!(request.movie_id, "7");
    assert_eq!(request.tmdb, "949");
    assert_eq!(request.resolution.as_deref(), Some("1080p"));
    assert_eq!(request.extension, None);
    assert!(request.extra);
    assert_eq!(request.extra_type, "featurette");
    assert_eq!(request.extra_name, "Making of");
    assert_eq!(request.playlist_mode, "single");
    assert!(!request.merge_playlist);

    let view = state.view();
    assert!(!view.submit_enabled);
    assert_eq!(view.submit_label, "Submitting…");
}

#[test]
fn extras_mode_requires_included_entries() {
    init_logging();
    let state = extras_form();
    assert!(state.view().form.preview_loading);

    let (state, _) = apply(
        state,
        vec![
            Msg::PlaylistPreviewLoaded(Ok(preview(
                PLAYLIST_URL,
                vec![entry(1, "a", false), entry(2, "b", false)],
            ))),
            Msg::SubmitClicked,
        ],
    );
    assert_eq!(
        state.view().console[0].text,
        "Provide at least one extra type for the playlist entries."
    );

    let (_, effects) = apply(
        state,
        vec![
            Msg::PlaylistEntryChosen {
                index: 2,
                included: true,
                extra_type: Some(ExtraType::Interview),
            },
            Msg::SubmitClicked,
        ],
    );
    let Some(Effect::CreateJob(request)) = effects.first() else {
        panic!("expected create effect, got {effects:?}");
    };
    assert_eq!(request.playlist_mode, "extras");
    assert!(request.extra);
    assert_eq!(request.extra_type, "interview");
    assert_eq!(request.playlist_extra_types, vec!["interview".to_string()]);
    assert_eq!(request.playlist_extra_entries.len(), 1);
    assert_eq!(request.playlist_extra_entries[0].id, "b");
    assert_eq!(request.playlist_extra_entries[0].index, 1);
}

#[test]
fn reloaded_preview_keeps_operator_choices() {
    init_logging();
    let (state, _) = apply(
        extras_form(),
        vec![
            Msg::PlaylistPreviewLoaded(Ok(preview(
                PLAYLIST_URL,
                vec![entry(1, "a", false), entry(2, "b", false)],
            ))),
            Msg::PlaylistEntryChosen {
                index: 1,
                included: true,
                extra_type: Some(ExtraType::Scene),
            },
        ],
    );

    let (state, effects) = update(state, Msg::PlaylistPreviewRequested);
    assert_eq!(
        effects,
        vec![Effect::PreviewPlaylist {
            url: PLAYLIST_URL.to_string()
        }]
    );
    let (state, _) = update(
        state,
        Msg::PlaylistPreviewLoaded(Ok(preview(
            PLAYLIST_URL,
            vec![entry(1, "a", false), entry(2, "b", false), entry(3, "c", true)],
        ))),
    );

    let playlist = state.form().playlist.clone().unwrap();
    assert!(playlist.entries[0].included);
    assert_eq!(playlist.entries[0].extra_type, ExtraType::Scene);
    assert!(!playlist.entries[1].included);
    assert!(playlist.entries[2].included);
}

#[test]
fn preview_for_a_replaced_url_is_ignored() {
    init_logging();
    let (state, _) = apply(
        extras_form(),
        vec![
            Msg::FieldChanged {
                field: FormField::Url,
                value: "https://youtu.be/other".to_string(),
            },
            Msg::PlaylistPreviewLoaded(Ok(preview(PLAYLIST_URL, vec![entry(1, "a", true)]))),
        ],
    );
    assert!(state.form().playlist.is_none());
    assert!(!state.view().form.preview_loading);
}
