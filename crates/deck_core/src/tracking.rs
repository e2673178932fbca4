use std::collections::BTreeMap;

use crate::job::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollerEntry {
    pub show_console: bool,
}

/// Which jobs are being polled. A job is either absent or polling; there is
/// never more than one entry per id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollerBook {
    entries: BTreeMap<JobId, PollerEntry>,
    // Highest applied sequence per job; survives stop/start so an old
    // response still queued after a restart cannot win.
    applied: BTreeMap<JobId, u64>,
}

impl PollerBook {
    /// Returns `true` only on the absent -> polling transition. A repeated
    /// start merely upgrades the console flag.
    pub fn start(&mut self, job_id: &str, show_console: bool) -> bool {
        match self.entries.get_mut(job_id) {
            Some(entry) => {
                entry.show_console |= show_console;
                false
            }
            None => {
                self.entries
                    .insert(job_id.to_string(), PollerEntry { show_console });
                true
            }
        }
    }

    pub fn stop(&mut self, job_id: &str) -> bool {
        self.entries.remove(job_id).is_some()
    }

    pub fn get(&self, job_id: &str) -> Option<&PollerEntry> {
        self.entries.get(job_id)
    }

    /// Consume a pending "show console" request for this job.
    pub fn take_console_request(&mut self, job_id: &str) -> bool {
        match self.entries.get_mut(job_id) {
            Some(entry) => std::mem::take(&mut entry.show_console),
            None => false,
        }
    }

    pub fn is_polling(&self, job_id: &str) -> bool {
        self.entries.contains_key(job_id)
    }

    /// Record `seq` as applied. Returns `false` for a response older than one
    /// already applied, or for a job that is not being polled.
    pub fn accept(&mut self, job_id: &str, seq: u64) -> bool {
        if !self.entries.contains_key(job_id) {
            return false;
        }
        match self.applied.get_mut(job_id) {
            Some(last) if seq <= *last => false,
            Some(last) => {
                *last = seq;
                true
            }
            None => {
                self.applied.insert(job_id.to_string(), seq);
                true
            }
        }
    }

    /// Drop everything known about a job (used when it leaves the store).
    pub fn forget(&mut self, job_id: &str) {
        self.entries.remove(job_id);
        self.applied.remove(job_id);
    }

    pub fn active_ids(&self) -> impl Iterator<Item = &JobId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
