//! CLI module - Command line interface definitions and handlers

pub mod convert;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::config::{generate_sample_config, Config};

/// Parcel Deck - Terminal front end for place-file conversions
///
/// Pick an output folder and an input file, run the converter, and watch
/// its log while it works.
#[derive(Parser, Debug)]
#[command(name = "parcel-deck")]
#[command(author = "Ryan Cashmoney <tunclon@proton.me>")]
#[command(version)]
#[command(about = "📦 Terminal front end for place-file conversions", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the terminal UI (default)
    Tui(TuiArgs),

    /// Convert one file without the UI
    Convert(ConvertArgs),

    /// Show or create the config file
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Default, Parser)]
pub struct TuiArgs {
    /// Pick paths with native OS dialogs instead of typed prompts
    #[cfg(feature = "dialogs")]
    #[arg(long)]
    pub native_dialogs: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Input file to convert
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output folder (defaults to `default_output_folder` from the config)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Converter program, overriding the config
    #[arg(long)]
    pub program: Option<String>,

    /// Output format (human, json)
    #[arg(long, value_enum, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Parser)]
pub struct ConfigArgs {
    /// Write a default config file if none exists
    #[arg(long)]
    pub init: bool,

    /// Print a commented sample config
    #[arg(long, conflicts_with = "init")]
    pub sample: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable (default)
    Human,
    /// JSON output
    Json,
}

/// Handle `parcel-deck config`
pub fn run_config(args: &ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    if args.sample {
        print!("{}", generate_sample_config());
        return Ok(());
    }

    if args.init {
        let path = match config_path {
            Some(path) => {
                if !path.exists() {
                    Config::default().save_to(&path)?;
                }
                path
            }
            None => Config::ensure_exists()?,
        };
        output::print_success(&format!("Config ready at {}", path.display()));
        return Ok(());
    }

    let path = config_path.unwrap_or_else(Config::default_path);
    let (config, state) = if path.exists() {
        (Config::load_from(&path)?, "found")
    } else {
        (Config::default(), "not found, showing defaults")
    };

    output::print_kv("Config", &format!("{} ({})", path.display(), state));
    println!("{}", "─".repeat(40).bright_black());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
