use std::env;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::gateway;
use crate::sources::{ContentSources, SourceKind};

pub mod commands;

use self::commands::{ConfirmArgs, DeleteArgs, EditArgs, ListArgs, NewArgs, TodayArgs};

#[derive(Parser, Debug)]
#[command(
    name = "notetake",
    version,
    about = "Keyboard-first terminal notes with jokes and quotes on tap"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTETAKE_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over NOTETAKE_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Talk to a remote notes service instead of the embedded database
    #[arg(long)]
    pub backend_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Print every note
    List(ListArgs),
    /// Create a note from the command line
    New(NewArgs),
    /// Save a random dad joke as a note
    Joke,
    /// Save the quote of the day as a note
    Quote,
    /// Change the title or content of a note
    Edit(EditArgs),
    /// Delete one note
    Delete(DeleteArgs),
    /// Delete every note
    DeleteAll(ConfirmArgs),
    /// Print today's date
    Today(TodayArgs),
}

/// Where log lines go. The TUI owns the terminal, so it logs to a file.
enum LogSink<'a> {
    Stderr,
    File(&'a Path),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);
    let log_file = paths.log_file();
    let sink = match command {
        Commands::Tui => LogSink::File(&log_file),
        _ => LogSink::Stderr,
    };
    init_tracing(&cli.log_level, sink)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let mut config = loader.load_or_init()?;
    if let Some(url) = cli.backend_url {
        config.backend.use_remote(url);
        config.backend.validate();
    }
    // The local offset can only be read while the process is single-threaded.
    let formatter = config.display.formatter();

    if let Commands::Today(args) = &command {
        return commands::today(&formatter, args);
    }

    let gateway = gateway::connect(&config.backend)?;
    tracing::info!(backend = gateway.name(), "connected to note backend");
    let sources = ContentSources::from_config(&config.sources, config.backend.request_timeout())
        .context("building content source clients")?;

    match command {
        Commands::Tui => commands::run_tui(&config, gateway, sources, formatter),
        Commands::List(args) => commands::list_notes(gateway.as_ref(), &formatter, &args),
        Commands::New(args) => commands::new_note(gateway.as_ref(), args),
        Commands::Joke => commands::fetch_note(gateway.as_ref(), &sources, SourceKind::Joke),
        Commands::Quote => commands::fetch_note(gateway.as_ref(), &sources, SourceKind::Quote),
        Commands::Edit(args) => commands::edit_note(gateway.as_ref(), args),
        Commands::Delete(args) => commands::delete_note(gateway.as_ref(), &args),
        Commands::DeleteAll(args) => commands::delete_all_notes(gateway.as_ref(), &args),
        Commands::Today(args) => commands::today(&formatter, &args),
    }
}

fn init_tracing(level: &str, sink: LogSink<'_>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| -> Result<()> {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = fmt().with_env_filter(env_filter);
        match sink {
            LogSink::Stderr => builder.with_writer(std::io::stderr).init(),
            LogSink::File(path) => {
                let file = open_log_file(path)?;
                builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
        }
        Ok(())
    })
    .map(|_| ())
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
