//! Parcel Deck - Terminal front end for place-file conversions
//!
//! Picks an output folder and an input file, runs the converter, and
//! keeps a live view of its log.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{filter::Targets, fmt, fmt::writer::BoxMakeWriter, prelude::*, EnvFilter};

use parcel_deck::cli::{self, Cli, Commands, TuiArgs};
use parcel_deck::config::Config;
use parcel_deck::gateway::LogStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, load_error) = match &cli.config {
        Some(path) => (Config::load_from(path)?, None),
        None => Config::load(),
    };
    config.validate()?;

    let store = LogStore::new(config.logs.max_entries);
    let headless = matches!(cli.command, Some(Commands::Convert(_)));
    init_tracing(&config, &store, cli.verbose, headless)?;
    if let Some(e) = load_error {
        tracing::warn!("Using default settings, config not loaded: {:#}", e);
    }

    match cli.command {
        Some(Commands::Tui(args)) => {
            parcel_deck::tui::run_tui(args, &config, store).await?;
        }
        Some(Commands::Convert(args)) => {
            if !cli::convert::run_convert(args, &config, store).await? {
                std::process::exit(1);
            }
        }
        Some(Commands::Config(args)) => {
            cli::run_config(&args, cli.config.clone())?;
        }
        None => {
            // Default: run the TUI
            parcel_deck::tui::run_tui(TuiArgs::default(), &config, store).await?;
        }
    }

    Ok(())
}

/// Two sinks: the in-app log buffer, and a formatted stream for diagnostics.
///
/// The TUI owns the terminal, so its diagnostics go to `log_file` (or
/// nowhere). Headless runs print them to stderr with `--verbose`.
fn init_tracing(config: &Config, store: &LogStore, verbose: bool, headless: bool) -> Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    let filter = EnvFilter::from_default_env().add_directive(
        format!("parcel_deck={}", level)
            .parse()
            .with_context(|| format!("Invalid log level: {}", level))?,
    );

    let writer = if headless {
        verbose.then(|| BoxMakeWriter::new(std::io::stderr))
    } else if let Some(path) = &config.general.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        Some(BoxMakeWriter::new(Mutex::new(file)))
    } else {
        None
    };

    let diagnostics = writer.map(|writer| {
        fmt::layer()
            .with_target(false)
            .compact()
            .with_ansi(headless)
            .with_writer(writer)
            .with_filter(filter)
    });

    let capture = store
        .layer()
        .with_filter(Targets::new().with_target("parcel_deck", config.capture_filter()?));

    tracing_subscriber::registry()
        .with(diagnostics)
        .with(capture)
        .init();

    Ok(())
}
