//! Log line classification and the non-debug visibility filter.

/// Warnings containing any of these (lowercased) snippets are download-tool
/// chatter and hidden unless debug mode is on.
pub const NOISY_WARNING_SNIPPETS: &[&str] = &[
    "[youtube]",
    "sabr streaming",
    "web client https formats have been skipped",
    "web_safari client https formats have been skipped",
    "tv client https formats have been skipped",
];

/// Plain lines are only shown when they carry one of these markers.
pub const ESSENTIAL_PHRASES: &[&str] = &[
    "success! video saved",
    "renaming downloaded file",
    "treating video as main video file",
    "storing video in subfolder",
    "created movie folder",
    "fetching radarr details",
    "resolved youtube format",
    "merging playlist videos",
    "saving playlist extra",
];

const ALWAYS_SHOWN_PREFIXES: &[&str] = &["error:", "warning:", "[download]", "[ffmpeg]", "[merger]"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Info,
    Error,
    Warning,
    Debug,
    Progress,
    Ffmpeg,
    Muted,
}

/// Category a caller can force onto a line, bypassing detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedCategory {
    Muted,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub text: String,
    pub category: LogCategory,
}

impl ClassifiedLine {
    pub fn new(text: impl Into<String>, category: LogCategory) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

pub fn classify(raw: &str, forced: Option<ForcedCategory>) -> ClassifiedLine {
    match forced {
        Some(ForcedCategory::Muted) => return ClassifiedLine::new(raw, LogCategory::Muted),
        Some(ForcedCategory::Error) => {
            let text = strip_prefix_ci(raw, "ERROR:").unwrap_or(raw);
            return ClassifiedLine::new(or_default(text, "Error"), LogCategory::Error);
        }
        Some(ForcedCategory::Warning) => {
            let text = strip_prefix_ci(raw, "WARNING:").unwrap_or(raw);
            return ClassifiedLine::new(or_default(text, "Warning"), LogCategory::Warning);
        }
        None => {}
    }

    if let Some(rest) = strip_prefix_ci(raw, "ERROR:") {
        return ClassifiedLine::new(or_default(rest, "Error"), LogCategory::Error);
    }
    if let Some(rest) = strip_prefix_ci(raw, "WARNING:") {
        return ClassifiedLine::new(or_default(rest, "Warning"), LogCategory::Warning);
    }
    if let Some(rest) = strip_prefix_ci(raw, "DEBUG:") {
        return ClassifiedLine::new(or_default(rest, "Debug"), LogCategory::Debug);
    }
    if starts_with_ci(raw, "[download]") {
        return ClassifiedLine::new(raw, LogCategory::Progress);
    }
    if starts_with_ci(raw, "[ffmpeg]") {
        return ClassifiedLine::new(raw, LogCategory::Ffmpeg);
    }
    ClassifiedLine::new(raw, LogCategory::Info)
}

/// Whether a raw line is shown while debug mode is off.
pub fn should_display(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with("debug:") {
        return false;
    }
    if lowered.starts_with("warning:")
        && NOISY_WARNING_SNIPPETS
            .iter()
            .any(|snippet| lowered.contains(snippet))
    {
        return false;
    }
    if ALWAYS_SHOWN_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return true;
    }
    ESSENTIAL_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

fn starts_with_ci(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if starts_with_ci(text, prefix) {
        Some(text[prefix.len()..].trim())
    } else {
        None
    }
}

fn or_default(text: &str, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, should_display, ClassifiedLine, ForcedCategory, LogCategory};

    #[test]
    fn detects_prefixed_categories() {
        assert_eq!(
            classify("ERROR: disk full", None),
            ClassifiedLine::new("disk full", LogCategory::Error)
        );
        assert_eq!(
            classify("[download] 42.0%", None),
            ClassifiedLine::new("[download] 42.0%", LogCategory::Progress)
        );
        assert_eq!(
            classify("plain line", None),
            ClassifiedLine::new("plain line", LogCategory::Info)
        );
        assert_eq!(
            classify("WARNING: slow mirror", None).category,
            LogCategory::Warning
        );
        assert_eq!(classify("DEBUG: argv", None).text, "argv");
        assert_eq!(
            classify("[ffmpeg] Merging formats", None).category,
            LogCategory::Ffmpeg
        );
    }

    #[test]
    fn empty_error_gets_default_text() {
        assert_eq!(classify("ERROR:", None).text, "Error");
        assert_eq!(classify("ERROR:   ", None).text, "Error");
    }

    #[test]
    fn forced_category_overrides_detection() {
        assert_eq!(
            classify("ERROR: boom", Some(ForcedCategory::Muted)),
            ClassifiedLine::new("ERROR: boom", LogCategory::Muted)
        );
        assert_eq!(
            classify("WARNING: careful", Some(ForcedCategory::Warning)),
            ClassifiedLine::new("careful", LogCategory::Warning)
        );
        assert_eq!(
            classify("[download] 10%", Some(ForcedCategory::Error)),
            ClassifiedLine::new("[download] 10%", LogCategory::Error)
        );
    }

    #[test]
    fn hides_debug_and_noisy_lines() {
        assert!(!should_display("DEBUG: verbose trace"));
        assert!(!should_display("   "));
        assert!(!should_display("WARNING: [youtube] cookie notice"));
        assert!(!should_display(
            "WARNING: Web client https formats have been skipped as they are missing a url"
        ));
        assert!(!should_display("Extracting URL: https://youtu.be/x"));
    }

    #[test]
    fn keeps_errors_warnings_progress_and_markers() {
        assert!(should_display("ERROR: boom"));
        assert!(should_display("WARNING: disk almost full"));
        assert!(should_display("[download]  12.5% of 30MiB"));
        assert!(should_display("[Merger] Merging formats into out.mkv"));
        assert!(should_display("Success! Video saved to /movies/Heat (1995)"));
        assert!(should_display("  Created movie folder /movies/Heat  "));
    }
}
