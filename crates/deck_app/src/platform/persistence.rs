use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use deck_engine::{
    ApiSettings, EngineSettings, DEFAULT_POLL_INTERVAL, DEFAULT_SERVER_URL,
    DEFAULT_VIDEO_SEARCH_LIMIT,
};
use deck_logging::{deck_info, deck_warn};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILENAME: &str = ".deck_settings.ron";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to write settings to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub video_search_limit: u32,
    pub log_to_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            request_timeout_secs: 30,
            video_search_limit: DEFAULT_VIDEO_SEARCH_LIMIT,
            log_to_file: true,
        }
    }
}

impl Settings {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            api: ApiSettings {
                base_url: self.server_url.clone(),
                request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
                ..ApiSettings::default()
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(100)),
            video_search_limit: self.video_search_limit.clamp(1, 50),
        }
    }
}

pub fn default_settings_path() -> PathBuf {
    PathBuf::from(".").join(SETTINGS_FILENAME)
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Settings::default();
        }
        Err(err) => {
            deck_warn!("Failed to read settings from {:?}: {}", path, err);
            return Settings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => {
            deck_info!("Loaded settings from {:?}", path);
            settings
        }
        Err(err) => {
            deck_warn!("Failed to parse settings from {:?}: {}", path, err);
            Settings::default()
        }
    }
}

/// Write through a temp file in the same directory, then rename over the
/// target so readers never see a partial file.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(settings, pretty)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_err = |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(&dir).map_err(io_err)?;
    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    file.write_all(content.as_bytes()).map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join(SETTINGS_FILENAME));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILENAME);
        let settings = Settings {
            server_url: "http://nas.local:5000".to_string(),
            poll_interval_ms: 2500,
            log_to_file: false,
            ..Settings::default()
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), settings);
    }

    #[test]
    fn partial_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);

        fs::write(&path, "(server_url: \"http://10.0.0.2:5000\")").unwrap();
        let settings = load_settings(&path);
        assert_eq!(settings.server_url, "http://10.0.0.2:5000");
        assert_eq!(settings.poll_interval_ms, 1000);

        fs::write(&path, "(server_url: ").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn engine_settings_are_sanitised() {
        let settings = Settings {
            poll_interval_ms: 5,
            request_timeout_secs: 0,
            video_search_limit: 500,
            ..Settings::default()
        };
        let engine = settings.engine_settings();
        assert_eq!(engine.poll_interval, Duration::from_millis(100));
        assert_eq!(engine.api.request_timeout, Duration::from_secs(1));
        assert_eq!(engine.video_search_limit, 50);
    }
}
