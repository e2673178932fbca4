use crate::form::{ExtraType, FormField, LibraryMovie, PlaylistMode, PlaylistPreview};
use crate::job::{JobId, JobUpdate};
use crate::search::{CatalogResult, RequestFailure, SearchHits, SearchKind, VideoResult};

/// Job snapshot plus the log array and debug flag that came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub job: JobUpdate,
    pub logs: Option<Vec<String>>,
    pub debug_mode: Option<bool>,
}

/// Result of one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Found(JobSnapshot),
    NotFound,
    Failed(RequestFailure),
}

/// Result of a cancel request: the refreshed job (if the backend sent one)
/// and its explanatory message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CancelReply {
    pub job: Option<JobUpdate>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited a free-text form field.
    FieldChanged { field: FormField, value: String },
    /// User toggled "store as extra".
    ExtraToggled(bool),
    /// User picked an extra type from the fixed option set.
    ExtraTypeChosen(ExtraType),
    /// User picked how playlists are handled.
    PlaylistModeChosen(PlaylistMode),
    /// User changed the choice for one playlist entry.
    PlaylistEntryChosen {
        index: u32,
        included: bool,
        extra_type: Option<ExtraType>,
    },
    /// User submitted the form.
    SubmitClicked,
    /// Backend answered the create request.
    JobCreated(Result<JobSnapshot, RequestFailure>),
    /// Request the full job list (initial load or refresh).
    JobsRefreshRequested,
    /// Backend answered the job-list request.
    JobsListed(Result<(Vec<JobUpdate>, Option<bool>), RequestFailure>),
    /// A poller tick finished.
    JobPolled {
        job_id: JobId,
        seq: u64,
        outcome: PollOutcome,
    },
    /// User opened the live console for a job.
    ConsoleAttachRequested(JobId),
    /// User closed the live console.
    ConsoleDetached,
    /// User toggled verbose output.
    DebugModeToggled,
    /// User clicked cancel on a job card.
    CancelClicked(JobId),
    /// Backend answered a cancel request.
    CancelFinished {
        job_id: JobId,
        result: Result<CancelReply, RequestFailure>,
    },
    /// Search box edited (debounced run).
    SearchInput { kind: SearchKind, query: String },
    /// Search submitted explicitly (immediate run).
    SearchSubmitted { kind: SearchKind, query: String },
    /// Video search response.
    VideoSearchCompleted {
        token: u64,
        result: Result<SearchHits<VideoResult>, RequestFailure>,
    },
    /// Catalog search response.
    CatalogSearchCompleted {
        token: u64,
        result: Result<SearchHits<CatalogResult>, RequestFailure>,
    },
    /// User picked a search result row.
    SearchResultSelected { kind: SearchKind, index: usize },
    /// Backend answered an add-to-library request.
    CatalogMovieAdded(Result<LibraryMovie, RequestFailure>),
    /// Request a fresh library listing.
    LibraryRefreshRequested,
    /// Backend answered the library listing.
    LibraryLoaded(Result<Vec<LibraryMovie>, RequestFailure>),
    /// Request a playlist preview for the current URL.
    PlaylistPreviewRequested,
    /// Backend answered the playlist preview.
    PlaylistPreviewLoaded(Result<PlaylistPreview, RequestFailure>),
    /// Fallback for placeholder wiring.
    NoOp,
}
