use crate::job::JobId;
use crate::log_filter::{classify, should_display, ClassifiedLine, ForcedCategory};

pub const EMPTY_PLACEHOLDER: &str = "No output yet.";
pub const HIDDEN_PLACEHOLDER: &str = "Verbose output hidden. Enable debug mode to see every log line.";

/// Live output panel. Lines are kept most-recent-first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsoleState {
    attached: Option<JobId>,
    lines: Vec<ClassifiedLine>,
    last_snapshot: Option<Vec<String>>,
}

impl ConsoleState {
    pub fn attached(&self) -> Option<&str> {
        self.attached.as_deref()
    }

    pub fn is_attached_to(&self, job_id: &str) -> bool {
        self.attached.as_deref() == Some(job_id)
    }

    /// Attach to a job. Switching jobs clears the panel and forgets the
    /// previous log snapshot.
    pub fn attach(&mut self, job_id: &str) {
        if self.is_attached_to(job_id) {
            return;
        }
        self.attached = Some(job_id.to_string());
        self.lines.clear();
        self.last_snapshot = None;
    }

    pub fn detach(&mut self) {
        self.attached = None;
        self.last_snapshot = None;
    }

    pub fn lines(&self) -> &[ClassifiedLine] {
        &self.lines
    }

    pub fn push(&mut self, raw: &str, forced: Option<ForcedCategory>) {
        self.lines.insert(0, classify(raw, forced));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Rebuild the panel from a full log snapshot (oldest line first).
    pub fn render_log_lines(&mut self, raw: &[String], debug_mode: bool) {
        self.last_snapshot = Some(raw.to_vec());
        self.rebuild(raw, debug_mode);
    }

    /// Re-render the last snapshot under a new debug setting, without a fetch.
    pub fn set_debug_mode(&mut self, debug_mode: bool) {
        if let Some(snapshot) = self.last_snapshot.take() {
            self.rebuild(&snapshot, debug_mode);
            self.last_snapshot = Some(snapshot);
        }
    }

    fn rebuild(&mut self, raw: &[String], debug_mode: bool) {
        self.lines.clear();
        if raw.is_empty() {
            self.push(EMPTY_PLACEHOLDER, Some(ForcedCategory::Muted));
            return;
        }

        let visible: Vec<&String> = raw
            .iter()
            .filter(|line| debug_mode || should_display(line))
            .collect();
        if visible.is_empty() {
            self.push(HIDDEN_PLACEHOLDER, Some(ForcedCategory::Muted));
            return;
        }
        for line in visible {
            self.push(line.trim(), None);
        }
    }
}
