//! One polling task per tracked job.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use deck_logging::{deck_debug, deck_info, deck_warn};
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::types::is_terminal_status;
use crate::{EngineEvent, JobEnvelope, JobId};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

struct PollerSlot {
    generation: u64,
    token: CancellationToken,
}

type SlotMap = Arc<Mutex<HashMap<JobId, PollerSlot>>>;

/// Runs the polling loops. `start` and `stop` must be called from inside a
/// tokio runtime.
pub struct PollerManager {
    api: Arc<dyn ApiClient>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    slots: SlotMap,
    generation: AtomicU64,
    seq: Arc<AtomicU64>,
}

impl PollerManager {
    pub fn new(api: Arc<dyn ApiClient>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self {
            api,
            sink,
            interval,
            slots: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start polling `job_id`. Returns `false` (and spawns nothing) when a
    /// loop for it is already running.
    pub fn start(&self, job_id: &str) -> bool {
        let token = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        {
            let Ok(mut slots) = self.slots.lock() else {
                return false;
            };
            if slots.contains_key(job_id) {
                return false;
            }
            slots.insert(
                job_id.to_string(),
                PollerSlot {
                    generation,
                    token: token.clone(),
                },
            );
        }

        deck_info!("poller started for job {}", job_id);
        let task = PollTask {
            api: self.api.clone(),
            sink: self.sink.clone(),
            job_id: job_id.to_string(),
            interval: self.interval,
            token,
            seq: self.seq.clone(),
            slots: self.slots.clone(),
            generation,
        };
        tokio::spawn(task.run());
        true
    }

    /// Stop polling `job_id`. Safe on ids that are not being polled.
    pub fn stop(&self, job_id: &str) {
        let removed = match self.slots.lock() {
            Ok(mut slots) => slots.remove(job_id),
            Err(_) => None,
        };
        if let Some(slot) = removed {
            slot.token.cancel();
            deck_info!("poller stopped for job {}", job_id);
        }
    }

    pub fn is_polling(&self, job_id: &str) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.contains_key(job_id))
            .unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn stop_all(&self) {
        let drained: Vec<PollerSlot> = match self.slots.lock() {
            Ok(mut slots) => slots.drain().map(|(_, slot)| slot).collect(),
            Err(_) => Vec::new(),
        };
        for slot in drained {
            slot.token.cancel();
        }
    }
}

struct PollTask {
    api: Arc<dyn ApiClient>,
    sink: Arc<dyn EventSink>,
    job_id: JobId,
    interval: Duration,
    token: CancellationToken,
    seq: Arc<AtomicU64>,
    slots: SlotMap,
    generation: u64,
}

impl PollTask {
    async fn run(self) {
        loop {
            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                result = self.api.fetch_job(&self.job_id) => result,
            };
            if self.token.is_cancelled() {
                break;
            }

            let finished = match &result {
                Ok(Some(envelope)) => reached_terminal(envelope),
                Ok(None) => {
                    deck_debug!("job {} not found, poller ends", self.job_id);
                    true
                }
                Err(err) => {
                    deck_warn!("poll for job {} failed: {}", self.job_id, err);
                    true
                }
            };
            let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            self.sink.emit(EngineEvent::JobPolled {
                job_id: self.job_id.clone(),
                seq,
                result,
            });
            if finished {
                break;
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        self.release();
    }

    /// Drop this loop's bookkeeping unless a newer loop already replaced it.
    fn release(&self) {
        if let Ok(mut slots) = self.slots.lock() {
            if slots
                .get(&self.job_id)
                .is_some_and(|slot| slot.generation == self.generation)
            {
                slots.remove(&self.job_id);
            }
        }
    }
}

fn reached_terminal(envelope: &JobEnvelope) -> bool {
    envelope
        .job
        .as_ref()
        .and_then(|job| job.status.as_deref())
        .is_some_and(is_terminal_status)
}
