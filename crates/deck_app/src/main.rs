mod platform;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use deck_core::{ExtraType, FormField, Msg, PlaylistMode, SearchKind};
use deck_engine::EngineHandle;
use deck_logging::{deck_info, LogDestination};
use log::LevelFilter;

use platform::app::App;
use platform::effects::EffectRunner;
use platform::persistence::{default_settings_path, load_settings, save_settings, Settings};
use platform::ui::render;

/// Upper bound for one-shot requests (listings, searches, previews).
const REQUEST_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(name = "deck")]
#[command(about = "Queue downloads on the media server and follow them until they finish")]
struct Cli {
    /// Backend base URL, overrides the settings file.
    #[arg(long)]
    server: Option<String>,
    /// Settings file to read (defaults to ./.deck_settings.ron).
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Poll interval in milliseconds, overrides the settings file.
    #[arg(long = "poll-ms")]
    poll_ms: Option<u64>,
    /// Show every console line instead of the filtered view.
    #[arg(long, default_value_t = false)]
    debug_console: bool,
    /// Mirror log output to stderr.
    #[arg(long, default_value_t = false)]
    log_stderr: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow the active jobs until none is running.
    Watch {
        /// Attach the live console to this job.
        #[arg(long)]
        job: Option<String>,
    },
    /// Queue a new download job.
    Submit(SubmitArgs),
    /// Search for videos.
    Videos { query: String },
    /// Search the movie catalog; `--add N` picks result N for the library.
    Movies {
        query: String,
        #[arg(long)]
        add: Option<usize>,
    },
    /// Request cancellation of a job and follow it until it stops.
    Cancel { job_id: String },
    /// List the entries of a playlist.
    Playlist { url: String },
    /// Print the effective settings, optionally writing them back.
    Config {
        #[arg(long, default_value_t = false)]
        save: bool,
    },
}

#[derive(Debug, Args)]
struct SubmitArgs {
    url: String,
    /// Library movie, as "Title" or "Title (Year)".
    #[arg(long)]
    movie: String,
    #[arg(long)]
    resolution: Option<String>,
    #[arg(long)]
    extension: Option<String>,
    /// Store the download as an extra of the movie.
    #[arg(long, default_value_t = false)]
    extra: bool,
    #[arg(long = "extra-type")]
    extra_type: Option<String>,
    #[arg(long = "extra-name")]
    extra_name: Option<String>,
    /// Playlist handling: single, merge or extras.
    #[arg(long)]
    playlist: Option<String>,
    /// Playlist entries (by index) to leave out in extras mode.
    #[arg(long = "skip")]
    skip: Vec<u32>,
    /// Return once the job is queued instead of following it.
    #[arg(long, default_value_t = false)]
    detach: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);
    let mut settings = load_settings(&settings_path);
    init_logging(&settings, cli.log_stderr);
    deck_info!("deck starting, settings from {:?}", settings_path);

    if let Some(server) = &cli.server {
        settings.server_url = server.clone();
    }
    if let Some(poll_ms) = cli.poll_ms {
        settings.poll_interval_ms = poll_ms;
    }

    if let Command::Config { save } = cli.command {
        return show_config(&settings, &settings_path, save);
    }

    let engine = EngineHandle::new(settings.engine_settings())
        .with_context(|| format!("cannot use server url {:?}", settings.server_url))?;
    let mut app = App::new(EffectRunner::new(engine));
    if cli.debug_console {
        app.dispatch(Msg::DebugModeToggled);
    }

    let outcome = match cli.command {
        Command::Watch { job } => watch(&mut app, job),
        Command::Submit(args) => submit(&mut app, args),
        Command::Videos { query } => videos(&mut app, query),
        Command::Movies { query, add } => movies(&mut app, query, add),
        Command::Cancel { job_id } => cancel(&mut app, job_id),
        Command::Playlist { url } => playlist(&mut app, url),
        Command::Config { .. } => Ok(()),
    };
    app.shutdown();
    outcome
}

fn init_logging(settings: &Settings, log_stderr: bool) {
    let destination = match (settings.log_to_file, log_stderr) {
        (true, true) => LogDestination::Both,
        (true, false) => LogDestination::File,
        (false, true) => LogDestination::Terminal,
        (false, false) => return,
    };
    deck_logging::initialize(destination, LevelFilter::Info);
}

fn show_config(settings: &Settings, path: &std::path::Path, save: bool) -> Result<()> {
    println!("server_url: {}", settings.server_url);
    println!("poll_interval_ms: {}", settings.poll_interval_ms);
    println!("request_timeout_secs: {}", settings.request_timeout_secs);
    println!("video_search_limit: {}", settings.video_search_limit);
    println!("log_to_file: {}", settings.log_to_file);
    if save {
        save_settings(path, settings)?;
        println!("saved to {}", path.display());
    }
    Ok(())
}

fn still_tracking(state: &deck_core::AppState) -> bool {
    !state.pollers().is_empty() || state.has_pending_requests()
}

fn load_jobs(app: &mut App) -> Result<()> {
    app.dispatch(Msg::JobsRefreshRequested);
    if !app.wait_for(|msg| matches!(msg, Msg::JobsListed(_)), REQUEST_WAIT) {
        bail!("the server did not answer the job list request");
    }
    Ok(())
}

fn load_library(app: &mut App) {
    app.dispatch(Msg::LibraryRefreshRequested);
    app.run_while(|state| state.has_pending_requests(), Some(REQUEST_WAIT));
}

fn watch(app: &mut App, job: Option<String>) -> Result<()> {
    load_jobs(app)?;
    if let Some(job_id) = job {
        if !app.state().jobs().contains(&job_id) {
            bail!("job {job_id} is not among the recent jobs");
        }
        app.dispatch(Msg::ConsoleAttachRequested(job_id));
    }
    app.run_while(still_tracking, None);
    app.print(&["No active jobs.".to_string()]);
    Ok(())
}

fn submit(app: &mut App, args: SubmitArgs) -> Result<()> {
    load_library(app);

    app.dispatch(Msg::FieldChanged {
        field: FormField::Url,
        value: args.url,
    });
    app.dispatch(Msg::FieldChanged {
        field: FormField::MovieQuery,
        value: args.movie,
    });
    if let Some(resolution) = args.resolution {
        app.dispatch(Msg::FieldChanged {
            field: FormField::Resolution,
            value: resolution,
        });
    }
    if let Some(extension) = args.extension {
        app.dispatch(Msg::FieldChanged {
            field: FormField::Extension,
            value: extension,
        });
    }
    if args.extra {
        app.dispatch(Msg::ExtraToggled(true));
    }
    if let Some(raw) = args.extra_type {
        let extra_type =
            ExtraType::normalize(&raw).with_context(|| format!("unknown extra type {raw:?}"))?;
        app.dispatch(Msg::ExtraTypeChosen(extra_type));
    }
    if let Some(name) = args.extra_name {
        app.dispatch(Msg::FieldChanged {
            field: FormField::ExtraName,
            value: name,
        });
    }
    if let Some(raw) = args.playlist {
        let mode =
            PlaylistMode::parse(&raw).with_context(|| format!("unknown playlist mode {raw:?}"))?;
        app.dispatch(Msg::PlaylistModeChosen(mode));
        app.run_while(|state| state.has_pending_requests(), Some(REQUEST_WAIT));
        for index in args.skip {
            app.dispatch(Msg::PlaylistEntryChosen {
                index,
                included: false,
                extra_type: None,
            });
        }
        app.print(&render::render_playlist(&app.view()));
    }

    app.dispatch(Msg::SubmitClicked);
    if !app.state().is_submitting() {
        bail!("the job was not submitted");
    }
    if !app.wait_for(|msg| matches!(msg, Msg::JobCreated(_)), REQUEST_WAIT) {
        bail!("the server did not answer the create request");
    }
    if args.detach {
        return Ok(());
    }
    app.run_while(still_tracking, None);
    Ok(())
}

fn videos(app: &mut App, query: String) -> Result<()> {
    app.dispatch(Msg::SearchSubmitted {
        kind: SearchKind::Video,
        query,
    });
    app.run_while(|state| state.video_search().is_loading(), Some(REQUEST_WAIT));
    app.print(&render::render_search("Videos", &app.view().video_search));
    Ok(())
}

fn movies(app: &mut App, query: String, add: Option<usize>) -> Result<()> {
    load_library(app);
    app.dispatch(Msg::SearchSubmitted {
        kind: SearchKind::Catalog,
        query,
    });
    app.run_while(|state| state.catalog_search().is_loading(), Some(REQUEST_WAIT));
    app.print(&render::render_search("Movies", &app.view().catalog_search));

    let Some(number) = add else {
        return Ok(());
    };
    if number == 0 || number > app.state().catalog_search().results().len() {
        bail!("there is no result number {number}");
    }
    app.dispatch(Msg::SearchResultSelected {
        kind: SearchKind::Catalog,
        index: number - 1,
    });
    app.run_while(|state| state.has_pending_requests(), Some(REQUEST_WAIT));
    let selected = app
        .state()
        .form()
        .selected_movie
        .as_ref()
        .map(|movie| movie.display_label());
    match selected {
        Some(label) => {
            app.print(&[format!("In library: {label}")]);
            Ok(())
        }
        None => bail!("the movie could not be added to the library"),
    }
}

fn cancel(app: &mut App, job_id: String) -> Result<()> {
    load_jobs(app)?;
    if !app.state().jobs().contains(&job_id) {
        bail!("job {job_id} is not among the recent jobs");
    }
    app.dispatch(Msg::ConsoleAttachRequested(job_id.clone()));
    app.dispatch(Msg::CancelClicked(job_id.clone()));
    app.run_while(
        |state| state.pollers().is_polling(&job_id) || state.is_cancel_pending(&job_id),
        None,
    );
    Ok(())
}

fn playlist(app: &mut App, url: String) -> Result<()> {
    app.dispatch(Msg::FieldChanged {
        field: FormField::Url,
        value: url,
    });
    app.dispatch(Msg::PlaylistModeChosen(PlaylistMode::Extras));
    app.run_while(|state| state.has_pending_requests(), Some(REQUEST_WAIT));
    let lines = render::render_playlist(&app.view());
    if lines.is_empty() {
        bail!("no playlist entries to show");
    }
    app.print(&lines);
    Ok(())
}
