use chrono::{DateTime, Utc};

pub type JobId = String;

pub type Timestamp = DateTime<Utc>;

pub const DEFAULT_JOB_LABEL: &str = "Radarr Download";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Complete,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Normalise a backend status string. Unknown values fall back to `Queued`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "processing" => JobStatus::Processing,
            "complete" | "completed" => JobStatus::Complete,
            "failed" => JobStatus::Failed,
            "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Queued,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Complete | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn is_cancellable(self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Processing)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Processing => "Processing",
            JobStatus::Complete => "Complete",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

/// Partial job snapshot as delivered by the backend. Every field is optional;
/// only the provided ones take part in a merge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobUpdate {
    pub id: Option<JobId>,
    pub label: Option<String>,
    pub subtitle: Option<String>,
    pub status: Option<JobStatus>,
    pub progress: Option<f64>,
    pub metadata: Option<Vec<String>>,
    pub message: Option<String>,
    pub started_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl JobUpdate {
    pub fn with_id(id: impl Into<JobId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn started_at(mut self, at: Timestamp) -> Self {
        self.started_at = Some(at);
        self
    }
}

/// The client's reconciled view of a backend job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub label: String,
    pub subtitle: String,
    pub status: JobStatus,
    pub progress: u8,
    pub metadata: Vec<String>,
    pub message: String,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobRecord {
    pub(crate) fn from_update(id: JobId, update: JobUpdate, now: Timestamp) -> Self {
        let started_at = update.started_at.unwrap_or(now);
        let mut record = Self {
            id,
            label: DEFAULT_JOB_LABEL.to_string(),
            subtitle: String::new(),
            status: JobStatus::Queued,
            progress: 0,
            metadata: Vec::new(),
            message: String::new(),
            started_at,
            updated_at: update.updated_at.unwrap_or(now),
        };
        record.apply_fields(update);
        record
    }

    /// Shallow merge of the provided fields. `started_at` stays pinned and
    /// `updated_at` never moves backwards.
    pub(crate) fn merge(&mut self, update: JobUpdate, now: Timestamp) {
        let updated_at = update.updated_at.unwrap_or(now);
        if updated_at > self.updated_at {
            self.updated_at = updated_at;
        }
        self.apply_fields(update);
    }

    fn apply_fields(&mut self, update: JobUpdate) {
        if let Some(label) = update.label.filter(|label| !label.trim().is_empty()) {
            self.label = label;
        }
        if let Some(subtitle) = update.subtitle {
            self.subtitle = subtitle;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(progress) = update.progress {
            self.progress = clamp_progress(progress);
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata
                .into_iter()
                .filter(|entry| !entry.trim().is_empty())
                .collect();
        }
        if let Some(message) = update.message {
            self.message = message;
        }
    }
}

pub fn clamp_progress(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
