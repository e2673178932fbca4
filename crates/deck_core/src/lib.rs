//! Job deck core: pure state machine and view-model helpers.
mod console;
mod effect;
mod form;
mod job;
mod log_filter;
mod msg;
mod search;
mod state;
mod store;
mod tracking;
mod update;
mod view_model;

pub use console::{ConsoleState, EMPTY_PLACEHOLDER, HIDDEN_PLACEHOLDER};
pub use effect::Effect;
pub use form::{
    is_youtube_url, CreateJobRequest, ExtraType, FormField, FormState, LibraryMovie,
    PlaylistEntry, PlaylistExtraEntry, PlaylistMode, PlaylistPreview,
};
pub use job::{clamp_progress, JobId, JobRecord, JobStatus, JobUpdate, Timestamp, DEFAULT_JOB_LABEL};
pub use log_filter::{
    classify, should_display, ClassifiedLine, ForcedCategory, LogCategory, ESSENTIAL_PHRASES,
    NOISY_WARNING_SNIPPETS,
};
pub use msg::{CancelReply, JobSnapshot, Msg, PollOutcome};
pub use search::{
    CatalogResult, Feedback, FeedbackLevel, RequestFailure, SearchHits, SearchKind, SearchPlan,
    SearchProfile, SearchResult, SearchState, VideoResult, CATALOG_SEARCH, VIDEO_SEARCH,
};
pub use state::AppState;
pub use store::{JobStore, Placement, UpsertOutcome, JOB_CAPACITY};
pub use tracking::{PollerBook, PollerEntry};
pub use update::update;
pub use view_model::{
    AppViewModel, CancelControl, FormView, JobCardView, PlaylistEntryView, SearchRowView,
    SearchView, METADATA_SEPARATOR,
};
