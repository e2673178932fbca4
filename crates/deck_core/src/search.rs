//! Token-guarded search state shared by the video and catalog searches.
use std::time::Duration;

/// A result row that can be written back into a form field.
pub trait SearchResult: Clone {
    fn field_value(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Video,
    Catalog,
}

/// Static parameters of one search flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProfile {
    pub noun: &'static str,
    pub min_query_len: usize,
    pub debounce: Duration,
    pub guidance: &'static str,
}

pub const VIDEO_SEARCH: SearchProfile = SearchProfile {
    noun: "video",
    min_query_len: 3,
    debounce: Duration::from_millis(400),
    guidance: "Type at least 3 characters to search YouTube.",
};

pub const CATALOG_SEARCH: SearchProfile = SearchProfile {
    noun: "movie",
    min_query_len: 2,
    debounce: Duration::from_millis(350),
    guidance: "Type at least 2 characters to search the movie catalog.",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub text: String,
}

impl Feedback {
    pub fn new(level: FeedbackLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// What the caller must do after an input change or submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    /// Abort pending work and show the guidance message.
    Cleared,
    /// Abort pending work and run `query` under `token` after `delay`.
    Run {
        token: u64,
        query: String,
        delay: Option<Duration>,
    },
}

/// Successful search payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits<R> {
    pub results: Vec<R>,
    pub cached: bool,
}

/// Failed search payload. `cancelled` marks a deliberate abort, which is not
/// shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestFailure {
    pub message: String,
    pub logs: Vec<String>,
    pub cancelled: bool,
}

impl RequestFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn cancelled() -> Self {
        Self {
            message: "request cancelled".to_string(),
            cancelled: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchState<R> {
    profile: SearchProfile,
    token: u64,
    query: String,
    results: Vec<R>,
    feedback: Option<Feedback>,
    loading: bool,
}

impl<R: SearchResult> SearchState<R> {
    pub fn new(profile: SearchProfile) -> Self {
        Self {
            profile,
            token: 0,
            query: String::new(),
            results: Vec::new(),
            feedback: None,
            loading: false,
        }
    }

    pub fn profile(&self) -> &SearchProfile {
        &self.profile
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[R] {
        &self.results
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Input changed: supersede whatever was pending and debounce a new run.
    pub fn input_changed(&mut self, query: &str) -> SearchPlan {
        self.plan(query, Some(self.profile.debounce))
    }

    /// Explicit submit (Enter key, button): run without debounce.
    pub fn submit_now(&mut self, query: &str) -> SearchPlan {
        self.plan(query, None)
    }

    fn plan(&mut self, query: &str, delay: Option<Duration>) -> SearchPlan {
        self.token += 1;
        self.query = query.trim().to_string();
        if self.query.chars().count() < self.profile.min_query_len {
            self.results.clear();
            self.loading = false;
            self.feedback = Some(Feedback::new(FeedbackLevel::Info, self.profile.guidance));
            return SearchPlan::Cleared;
        }
        self.loading = true;
        self.feedback = Some(Feedback::new(
            FeedbackLevel::Info,
            format!("Searching for \"{}\"...", self.query),
        ));
        SearchPlan::Run {
            token: self.token,
            query: self.query.clone(),
            delay,
        }
    }

    /// Apply a response. Returns `false` when the response was stale and
    /// nothing changed.
    pub fn complete(&mut self, token: u64, result: Result<SearchHits<R>, RequestFailure>) -> bool {
        if token != self.token {
            return false;
        }
        match result {
            Ok(hits) => {
                self.loading = false;
                let count = hits.results.len();
                self.results = hits.results;
                self.feedback = Some(if count == 0 {
                    Feedback::new(
                        FeedbackLevel::Warning,
                        format!("No {} found for \"{}\".", plural(self.profile.noun, 0), self.query),
                    )
                } else {
                    let cached = if hits.cached { " (cached)" } else { "" };
                    Feedback::new(
                        FeedbackLevel::Success,
                        format!("Found {count} {}{cached}.", plural(self.profile.noun, count)),
                    )
                });
                true
            }
            Err(failure) if failure.cancelled => false,
            Err(failure) => {
                self.loading = false;
                self.results.clear();
                self.feedback = Some(Feedback::new(
                    FeedbackLevel::Error,
                    format!("{} search failed: {}", capitalize(self.profile.noun), failure.message),
                ));
                true
            }
        }
    }

    pub fn select(&self, index: usize) -> Option<&R> {
        self.results.get(index)
    }

    pub fn clear(&mut self) {
        self.token += 1;
        self.results.clear();
        self.feedback = None;
        self.loading = false;
    }
}

fn plural(noun: &str, count: usize) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

fn capitalize(noun: &str) -> String {
    let mut chars = noun.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoResult {
    pub title: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub channel: String,
    pub duration_text: String,
    pub upload_date: String,
    pub view_count: Option<u64>,
    pub live: bool,
    pub description: String,
}

impl SearchResult for VideoResult {
    fn field_value(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogResult {
    pub tmdb_id: u64,
    pub title: String,
    pub year: Option<u32>,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub overview: String,
    pub poster_url: Option<String>,
}

impl CatalogResult {
    pub fn display_label(&self) -> String {
        movie_label(&self.title, self.year)
    }
}

impl SearchResult for CatalogResult {
    fn field_value(&self) -> String {
        self.display_label()
    }
}

pub(crate) fn movie_label(title: &str, year: Option<u32>) -> String {
    match year {
        Some(year) if year > 0 => format!("{title} ({year})"),
        _ => title.to_string(),
    }
}
