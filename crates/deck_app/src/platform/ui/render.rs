use deck_core::{
    AppViewModel, ClassifiedLine, FeedbackLevel, JobCardView, LogCategory, SearchView,
};

const PROGRESS_BAR_WIDTH: usize = 20;

/// One line per job card, newest first.
pub fn render_jobs(view: &AppViewModel) -> Vec<String> {
    if view.jobs.is_empty() {
        return vec!["No jobs yet.".to_string()];
    }
    let mut lines = Vec::new();
    for job in &view.jobs {
        lines.push(format_job_row(job));
        if !job.subtitle.is_empty() {
            lines.push(format!("    {}", job.subtitle));
        }
        if !job.metadata_text.is_empty() {
            lines.push(format!("    {}", job.metadata_text));
        }
        if let Some(message) = &job.message {
            lines.push(format!("    ! {message}"));
        }
    }
    lines
}

pub fn format_job_row(job: &JobCardView) -> String {
    let mut markers = Vec::new();
    if job.attached {
        markers.push("console");
    }
    if job.polling {
        markers.push("live");
    }
    if let Some(cancel) = job.cancel.filter(|cancel| !cancel.enabled) {
        markers.push(cancel.label);
    }
    let markers = if markers.is_empty() {
        String::new()
    } else {
        format!(" ({})", markers.join(", "))
    };
    format!(
        "[{id}] {label} {bar} {progress:>3}% {status}{markers} @ {time}",
        id = job.job_id,
        label = job.label,
        bar = progress_bar(job.progress),
        progress = job.progress,
        status = job.status_label,
        time = job.updated_at.format("%H:%M:%S"),
    )
}

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

pub fn format_console_line(line: &ClassifiedLine) -> String {
    let tag = match line.category {
        LogCategory::Info => "     ",
        LogCategory::Error => "ERR  ",
        LogCategory::Warning => "WARN ",
        LogCategory::Debug => "DBG  ",
        LogCategory::Progress => ">>   ",
        LogCategory::Ffmpeg => "FF   ",
        LogCategory::Muted => "..   ",
    };
    format!("{tag}{}", line.text)
}

/// Numbered result rows plus the feedback line, if any.
pub fn render_search(title: &str, search: &SearchView) -> Vec<String> {
    let mut lines = Vec::new();
    if search.loading {
        lines.push(format!("{title}: searching for \"{}\"...", search.query));
    }
    if let Some(feedback) = &search.feedback {
        let prefix = match feedback.level {
            FeedbackLevel::Info => "",
            FeedbackLevel::Success => "ok: ",
            FeedbackLevel::Warning => "warning: ",
            FeedbackLevel::Error => "error: ",
        };
        lines.push(format!("{title}: {prefix}{}", feedback.text));
    }
    for (number, row) in search.rows.iter().enumerate() {
        lines.push(format!("{:>2}. {}", number + 1, row.title));
        if !row.detail.is_empty() {
            lines.push(format!("    {}", row.detail));
        }
        lines.push(format!("    {}", row.value));
    }
    lines
}

pub fn render_playlist(view: &AppViewModel) -> Vec<String> {
    let form = &view.form;
    let mut lines = Vec::new();
    if let Some(title) = form.playlist_title.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("Playlist: {title}"));
    }
    for entry in &form.playlist_entries {
        let mark = if entry.included { 'x' } else { ' ' };
        lines.push(format!(
            "[{mark}] {:>3}. {} ({}) as {}",
            entry.index,
            entry.title,
            if entry.duration_text.is_empty() {
                "?"
            } else {
                entry.duration_text.as_str()
            },
            entry.extra_type.label()
        ));
    }
    lines
}
