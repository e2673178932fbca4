//! Job-creation form: library matching, dependent fields, playlist choices
//! and client-side validation.
use url::Url;

use crate::search::movie_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtraType {
    Trailer,
    BehindTheScenes,
    Deleted,
    Featurette,
    Interview,
    Scene,
    Short,
    Other,
}

impl ExtraType {
    pub const ALL: [ExtraType; 8] = [
        ExtraType::Trailer,
        ExtraType::BehindTheScenes,
        ExtraType::Deleted,
        ExtraType::Featurette,
        ExtraType::Interview,
        ExtraType::Scene,
        ExtraType::Short,
        ExtraType::Other,
    ];

    /// Wire key sent to the backend.
    pub fn key(self) -> &'static str {
        match self {
            ExtraType::Trailer => "trailer",
            ExtraType::BehindTheScenes => "behindthescenes",
            ExtraType::Deleted => "deleted",
            ExtraType::Featurette => "featurette",
            ExtraType::Interview => "interview",
            ExtraType::Scene => "scene",
            ExtraType::Short => "short",
            ExtraType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExtraType::Trailer => "Trailer",
            ExtraType::BehindTheScenes => "Behind the Scenes",
            ExtraType::Deleted => "Deleted Scene",
            ExtraType::Featurette => "Featurette",
            ExtraType::Interview => "Interview",
            ExtraType::Scene => "Scene",
            ExtraType::Short => "Short",
            ExtraType::Other => "Other",
        }
    }

    /// Accepts keys, labels and common plural spellings ("Deleted Scenes",
    /// "behind-the-scenes", "extras").
    pub fn normalize(raw: &str) -> Option<Self> {
        let token: String = raw
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if token.is_empty() {
            return None;
        }
        if let Some(found) = Self::ALL.iter().find(|extra| extra.key() == token) {
            return Some(*found);
        }
        let aliased = match token.as_str() {
            "trailers" => ExtraType::Trailer,
            "behindthescene" | "behindthescenesclip" | "behindthescenesfeature"
            | "behindthescenesfeaturette" => ExtraType::BehindTheScenes,
            "deletedscene" | "deletedscenes" => ExtraType::Deleted,
            "featurettes" => ExtraType::Featurette,
            "interviews" => ExtraType::Interview,
            "scenes" => ExtraType::Scene,
            "shorts" => ExtraType::Short,
            "extras" => ExtraType::Other,
            _ => return None,
        };
        Some(aliased)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaylistMode {
    #[default]
    Single,
    Merge,
    Extras,
}

impl PlaylistMode {
    pub fn key(self) -> &'static str {
        match self {
            PlaylistMode::Single => "single",
            PlaylistMode::Merge => "merge",
            PlaylistMode::Extras => "extras",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Some(PlaylistMode::Single),
            "merge" => Some(PlaylistMode::Merge),
            "extras" => Some(PlaylistMode::Extras),
            _ => None,
        }
    }
}

/// A movie already present in the library; the only valid form targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryMovie {
    pub id: u64,
    pub tmdb_id: u64,
    pub title: String,
    pub year: Option<u32>,
}

impl LibraryMovie {
    pub fn display_label(&self) -> String {
        movie_label(&self.title, self.year)
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        !query.is_empty()
            && (self.display_label().eq_ignore_ascii_case(query)
                || self.title.eq_ignore_ascii_case(query))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub index: u32,
    pub id: String,
    pub title: String,
    pub duration: Option<u64>,
    pub duration_text: String,
    pub included: bool,
    pub extra_type: ExtraType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaylistPreview {
    pub url: String,
    pub title: String,
    pub total_count: usize,
    pub truncated: bool,
    pub entries: Vec<PlaylistEntry>,
}

impl PlaylistPreview {
    /// Carry per-entry choices over from `previous` when it describes the
    /// same playlist URL. Unrelated playlists start fresh.
    pub fn inherit_choices(&mut self, previous: &PlaylistPreview) {
        if previous.url != self.url {
            return;
        }
        for entry in &mut self.entries {
            if entry.id.is_empty() {
                continue;
            }
            if let Some(old) = previous.entries.iter().find(|old| old.id == entry.id) {
                entry.included = old.included;
                entry.extra_type = old.extra_type;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Url,
    MovieQuery,
    Resolution,
    Extension,
    ExtraName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub url: String,
    pub movie_query: String,
    pub selected_movie: Option<LibraryMovie>,
    pub resolution: String,
    pub extension: String,
    pub extra: bool,
    pub extra_type: ExtraType,
    pub extra_name: String,
    pub playlist_mode: PlaylistMode,
    pub playlist: Option<PlaylistPreview>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            url: String::new(),
            movie_query: String::new(),
            selected_movie: None,
            resolution: String::new(),
            extension: String::new(),
            extra: false,
            extra_type: ExtraType::Trailer,
            extra_name: String::new(),
            playlist_mode: PlaylistMode::Single,
            playlist: None,
        }
    }
}

/// Body of `POST /create`, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateJobRequest {
    pub yturl: String,
    pub movie_name: String,
    pub movie_id: String,
    pub title: String,
    pub year: String,
    pub tmdb: String,
    pub resolution: Option<String>,
    pub extension: Option<String>,
    pub extra: bool,
    pub extra_type: String,
    pub extra_name: String,
    pub playlist_mode: String,
    pub merge_playlist: bool,
    pub playlist_extra_types: Vec<String>,
    pub playlist_extra_entries: Vec<PlaylistExtraEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistExtraEntry {
    pub index: u32,
    pub id: String,
    pub title: String,
    pub extra_type: String,
    pub name: String,
    pub duration: Option<u64>,
}

impl FormState {
    pub fn set_field(&mut self, field: FormField, value: &str) {
        match field {
            FormField::Url => self.url = value.to_string(),
            FormField::MovieQuery => self.movie_query = value.to_string(),
            FormField::Resolution => self.resolution = value.to_string(),
            FormField::Extension => self.extension = value.to_string(),
            FormField::ExtraName => self.extra_name = value.to_string(),
        }
    }

    /// Re-run the library lookup for the current movie text.
    pub fn match_movie(&mut self, library: &[LibraryMovie]) {
        self.selected_movie = library
            .iter()
            .find(|movie| movie.matches(&self.movie_query))
            .cloned();
    }

    /// Extra type and name are only editable when the job stores extras.
    pub fn extra_fields_enabled(&self) -> bool {
        self.extra || self.playlist_mode == PlaylistMode::Extras
    }

    pub fn playlist_choices_visible(&self) -> bool {
        self.playlist_mode == PlaylistMode::Extras && self.playlist.is_some()
    }

    pub fn set_entry_choice(&mut self, index: u32, included: bool, extra_type: Option<ExtraType>) {
        let Some(playlist) = self.playlist.as_mut() else {
            return;
        };
        if let Some(entry) = playlist.entries.iter_mut().find(|entry| entry.index == index) {
            entry.included = included;
            if let Some(extra_type) = extra_type {
                entry.extra_type = extra_type;
            }
        }
    }

    /// Validate the form. Every problem is reported, not just the first.
    pub fn validate(&self) -> Result<CreateJobRequest, Vec<String>> {
        let mut errors = Vec::new();

        let url = self.url.trim();
        if url.is_empty() {
            errors.push("YouTube URL is required.".to_string());
        } else if !is_youtube_url(url) {
            errors.push("Please provide a valid YouTube URL.".to_string());
        }

        if self.selected_movie.is_none() {
            errors.push(
                "No movie selected. Please choose a movie from the suggestions list.".to_string(),
            );
        }

        let entries = self.extra_entries();
        let extras_mode = self.playlist_mode == PlaylistMode::Extras;
        let extra_name = self.extra_name.trim();
        if extras_mode {
            if entries.is_empty() {
                errors.push("Provide at least one extra type for the playlist entries.".to_string());
            }
        } else if self.extra && extra_name.is_empty() {
            errors.push("Extra name is required when storing in a subfolder.".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let movie = match &self.selected_movie {
            Some(movie) => movie,
            None => return Err(errors),
        };
        let extra_type = if extras_mode {
            entries
                .first()
                .map(|entry| entry.extra_type.clone())
                .unwrap_or_else(|| self.extra_type.key().to_string())
        } else {
            self.extra_type.key().to_string()
        };

        Ok(CreateJobRequest {
            yturl: url.to_string(),
            movie_name: movie.display_label(),
            movie_id: movie.id.to_string(),
            title: movie.title.clone(),
            year: movie.year.map(|y| y.to_string()).unwrap_or_default(),
            tmdb: movie.tmdb_id.to_string(),
            resolution: non_empty(&self.resolution),
            extension: non_empty(&self.extension),
            extra: self.extra || extras_mode,
            extra_type,
            extra_name: extra_name.to_string(),
            playlist_mode: self.playlist_mode.key().to_string(),
            merge_playlist: self.playlist_mode == PlaylistMode::Merge,
            playlist_extra_types: entries.iter().map(|e| e.extra_type.clone()).collect(),
            playlist_extra_entries: entries,
        })
    }

    fn extra_entries(&self) -> Vec<PlaylistExtraEntry> {
        if self.playlist_mode != PlaylistMode::Extras {
            return Vec::new();
        }
        let Some(playlist) = &self.playlist else {
            return Vec::new();
        };
        playlist
            .entries
            .iter()
            .filter(|entry| entry.included)
            .enumerate()
            .map(|(position, entry)| PlaylistExtraEntry {
                index: position as u32 + 1,
                id: entry.id.clone(),
                title: entry.title.clone(),
                extra_type: entry.extra_type.key().to_string(),
                name: entry.title.clone(),
                duration: entry.duration,
            })
            .collect()
    }
}

pub fn is_youtube_url(raw: &str) -> bool {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    host == "youtu.be"
        || host == "youtube.com"
        || host.ends_with(".youtube.com")
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
