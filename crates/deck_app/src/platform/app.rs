use std::io::{self, Write};
use std::time::{Duration, Instant};

use deck_core::{update, AppState, AppViewModel, ClassifiedLine, Msg};
use deck_logging::{deck_debug, deck_warn};

use super::effects::EffectRunner;
use super::ui::render;

/// How long a single wait for engine events blocks before re-checking the
/// stop condition.
const TICK: Duration = Duration::from_millis(75);

/// Owns the core state and drives it: messages in, effects out, redraw when
/// the state reports itself dirty.
pub struct App<W: Write = io::Stdout> {
    state: AppState,
    runner: EffectRunner,
    screen: Screen<W>,
}

impl App {
    pub fn new(runner: EffectRunner) -> Self {
        Self::with_output(runner, io::stdout())
    }
}

impl<W: Write> App<W> {
    pub fn with_output(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            screen: Screen::new(out),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.run(effects);
        if was_dirty {
            self.screen.draw(&self.state.view());
        }
    }

    /// Pump engine events until one matches `done`. Returns `false` when
    /// `limit` elapsed first.
    pub fn wait_for(&mut self, mut done: impl FnMut(&Msg) -> bool, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            let Some(msg) = self.runner.next_msg(TICK) else {
                continue;
            };
            let hit = done(&msg);
            self.dispatch(msg);
            if hit {
                return true;
            }
        }
        deck_warn!("gave up waiting after {:?}", limit);
        false
    }

    /// Pump engine events while `busy` holds. `None` waits indefinitely.
    pub fn run_while(&mut self, busy: impl Fn(&AppState) -> bool, limit: Option<Duration>) -> bool {
        let deadline = limit.map(|limit| Instant::now() + limit);
        while busy(&self.state) {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                deck_warn!("stopped waiting after {:?}", limit);
                return false;
            }
            if let Some(msg) = self.runner.next_msg(TICK) {
                self.dispatch(msg);
            }
        }
        true
    }

    pub fn print(&mut self, lines: &[String]) {
        self.screen.print(lines);
    }

    pub fn shutdown(&self) {
        deck_debug!("shutting down engine");
        self.runner.shutdown();
    }
}

/// Incremental terminal output: job cards are reprinted only when they
/// change, console lines only when new ones arrive.
pub struct Screen<W: Write> {
    out: W,
    jobs: Vec<String>,
    console: Vec<ClassifiedLine>,
    console_job: Option<String>,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            jobs: Vec::new(),
            console: Vec::new(),
            console_job: None,
        }
    }

    pub fn draw(&mut self, view: &AppViewModel) {
        let mut lines = Vec::new();

        let jobs = render::render_jobs(view);
        if !view.jobs.is_empty() && jobs != self.jobs {
            lines.push("-- jobs --".to_string());
            lines.extend(jobs.iter().cloned());
        }
        self.jobs = jobs;

        if view.attached_job != self.console_job {
            if let Some(job_id) = &view.attached_job {
                lines.push(format!("-- console: {job_id} --"));
            }
            self.console.clear();
            self.console_job = view.attached_job.clone();
        }
        let fresh = if view.console.starts_with(&self.console) {
            &view.console[self.console.len()..]
        } else {
            lines.push("-- console refreshed --".to_string());
            &view.console[..]
        };
        lines.extend(fresh.iter().map(render::format_console_line));
        self.console = view.console.clone();

        self.print(&lines);
    }

    pub fn print(&mut self, lines: &[String]) {
        for line in lines {
            if writeln!(self.out, "{line}").is_err() {
                return;
            }
        }
        let _ = self.out.flush();
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use deck_core::{JobStatus, JobUpdate, LogCategory};
    use pretty_assertions::assert_eq;

    fn printed(screen: &Screen<Vec<u8>>) -> Vec<String> {
        String::from_utf8_lossy(screen.output())
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn view_with_job(progress: f64) -> AppViewModel {
        let update = JobUpdate::with_id("j1")
            .status(JobStatus::Processing)
            .progress(progress);
        let clock = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        let (state, _) = deck_core::update(
            AppState::new().with_clock(clock),
            Msg::JobsListed(Ok((vec![update], None))),
        );
        state.view()
    }

    #[test]
    fn unchanged_jobs_are_not_reprinted() {
        let mut screen = Screen::new(Vec::new());
        screen.draw(&view_with_job(10.0));
        let first = printed(&screen).len();
        assert_eq!(printed(&screen)[0], "-- jobs --");

        screen.draw(&view_with_job(10.0));
        assert_eq!(printed(&screen).len(), first);

        screen.draw(&view_with_job(60.0));
        assert!(printed(&screen).len() > first);
    }

    #[test]
    fn console_prints_only_new_lines() {
        let mut screen = Screen::new(Vec::new());
        let mut view = AppViewModel {
            attached_job: Some("j1".to_string()),
            console: vec![ClassifiedLine::new("one", LogCategory::Info)],
            ..AppViewModel::default()
        };
        screen.draw(&view);
        view.console
            .push(ClassifiedLine::new("ERROR: two", LogCategory::Error));
        screen.draw(&view);

        assert_eq!(
            printed(&screen),
            vec!["-- console: j1 --", "     one", "ERR  ERROR: two"]
        );
    }

    #[test]
    fn rewritten_console_is_printed_again() {
        let mut screen = Screen::new(Vec::new());
        let mut view = AppViewModel {
            attached_job: Some("j1".to_string()),
            console: vec![ClassifiedLine::new("one", LogCategory::Info)],
            ..AppViewModel::default()
        };
        screen.draw(&view);
        view.console = vec![ClassifiedLine::new("other", LogCategory::Info)];
        screen.draw(&view);

        assert_eq!(
            printed(&screen),
            vec![
                "-- console: j1 --",
                "     one",
                "-- console refreshed --",
                "     other",
            ]
        );
    }
}
