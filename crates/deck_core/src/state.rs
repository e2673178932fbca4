use std::collections::BTreeSet;

use chrono::Utc;

use crate::console::ConsoleState;
use crate::form::{FormState, LibraryMovie};
use crate::job::{JobId, Timestamp};
use crate::log_filter::ForcedCategory;
use crate::search::{CatalogResult, SearchState, VideoResult, CATALOG_SEARCH, VIDEO_SEARCH};
use crate::store::JobStore;
use crate::tracking::PollerBook;
use crate::view_model::{self, AppViewModel};

/// Everything the control panel knows. Owned by the dispatch loop and
/// threaded through [`crate::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) store: JobStore,
    pub(crate) pollers: PollerBook,
    pub(crate) console: ConsoleState,
    pub(crate) server_debug: bool,
    pub(crate) debug_override: Option<bool>,
    pub(crate) pending_cancel: BTreeSet<JobId>,
    pub(crate) submitting: bool,
    pub(crate) form: FormState,
    pub(crate) library: Vec<LibraryMovie>,
    pub(crate) library_loading: bool,
    pub(crate) pending_catalog_add: Option<u64>,
    pub(crate) preview_loading: bool,
    pub(crate) video_search: SearchState<VideoResult>,
    pub(crate) catalog_search: SearchState<CatalogResult>,
    pinned_now: Option<Timestamp>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            store: JobStore::new(),
            pollers: PollerBook::default(),
            console: ConsoleState::default(),
            server_debug: false,
            debug_override: None,
            pending_cancel: BTreeSet::new(),
            submitting: false,
            form: FormState::default(),
            library: Vec::new(),
            library_loading: false,
            pending_catalog_add: None,
            preview_loading: false,
            video_search: SearchState::new(VIDEO_SEARCH),
            catalog_search: SearchState::new(CATALOG_SEARCH),
            pinned_now: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the clock used for `started_at`/`updated_at` defaults.
    pub fn with_clock(mut self, now: Timestamp) -> Self {
        self.pinned_now = Some(now);
        self
    }

    pub fn set_clock(&mut self, now: Timestamp) {
        self.pinned_now = Some(now);
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    pub fn view(&self) -> AppViewModel {
        view_model::build(self)
    }

    pub fn jobs(&self) -> &JobStore {
        &self.store
    }

    pub fn pollers(&self) -> &PollerBook {
        &self.pollers
    }

    pub fn console(&self) -> &ConsoleState {
        &self.console
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn library(&self) -> &[LibraryMovie] {
        &self.library
    }

    pub fn video_search(&self) -> &SearchState<VideoResult> {
        &self.video_search
    }

    pub fn catalog_search(&self) -> &SearchState<CatalogResult> {
        &self.catalog_search
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_override.unwrap_or(self.server_debug)
    }

    pub fn is_cancel_pending(&self, job_id: &str) -> bool {
        self.pending_cancel.contains(job_id)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// True while a create, library, preview or catalog-add request is out.
    pub fn has_pending_requests(&self) -> bool {
        self.submitting
            || self.library_loading
            || self.preview_loading
            || self.pending_catalog_add.is_some()
            || !self.pending_cancel.is_empty()
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn console_error(&mut self, text: &str) {
        self.console.push(text, Some(ForcedCategory::Error));
        self.dirty = true;
    }

    pub(crate) fn console_muted(&mut self, text: &str) {
        self.console.push(text, Some(ForcedCategory::Muted));
        self.dirty = true;
    }

    /// Apply the backend's debug flag; re-render the console if the
    /// effective mode changed.
    pub(crate) fn apply_server_debug(&mut self, debug: Option<bool>) {
        let Some(debug) = debug else {
            return;
        };
        let before = self.debug_mode();
        self.server_debug = debug;
        let after = self.debug_mode();
        if before != after {
            self.console.set_debug_mode(after);
            self.dirty = true;
        }
    }

    pub(crate) fn toggle_debug(&mut self) {
        let next = !self.debug_mode();
        self.debug_override = Some(next);
        self.console.set_debug_mode(next);
        self.dirty = true;
    }
}
