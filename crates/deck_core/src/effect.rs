use std::time::Duration;

use crate::form::CreateJobRequest;
use crate::job::JobId;
use crate::search::SearchKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateJob(CreateJobRequest),
    FetchJobs,
    StartPoller { job_id: JobId },
    StopPoller { job_id: JobId },
    CancelJob { job_id: JobId },
    RunSearch {
        kind: SearchKind,
        token: u64,
        query: String,
        delay: Option<Duration>,
    },
    AbortSearch { kind: SearchKind },
    AddCatalogMovie { tmdb_id: u64 },
    RefreshLibrary,
    PreviewPlaylist { url: String },
}
