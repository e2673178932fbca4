use crate::job::{JobId, JobRecord, JobUpdate, Timestamp};

/// Maximum number of job cards kept on screen.
pub const JOB_CAPACITY: usize = 8;

/// Where a newly inserted record goes before the list is re-sorted. Only
/// matters for records sharing the same `started_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Head,
    Tail,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpsertOutcome {
    pub changed: bool,
    pub inserted: bool,
    pub evicted: Vec<JobId>,
}

/// Ordered, capped collection of job records, most recently started first.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStore {
    capacity: usize,
    records: Vec<JobRecord>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::with_capacity(JOB_CAPACITY)
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn upsert(&mut self, update: JobUpdate, now: Timestamp, placement: Placement) -> UpsertOutcome {
        let id = match update.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return UpsertOutcome::default(),
        };

        let inserted = match self.records.iter_mut().find(|record| record.id == id) {
            Some(existing) => {
                existing.merge(update, now);
                false
            }
            None => {
                let record = JobRecord::from_update(id, update, now);
                match placement {
                    Placement::Head => self.records.insert(0, record),
                    Placement::Tail => self.records.push(record),
                }
                true
            }
        };

        // Stable sort keeps the placement order for equal start times.
        self.records
            .sort_by(|a, b| b.started_at.cmp(&a.started_at));
        let evicted = if self.records.len() > self.capacity {
            self.records
                .split_off(self.capacity)
                .into_iter()
                .map(|record| record.id)
                .collect()
        } else {
            Vec::new()
        };

        UpsertOutcome {
            changed: true,
            inserted,
            evicted,
        }
    }

    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
