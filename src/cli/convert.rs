//! Headless conversion - drives the orchestrator without the TUI
//!
//! The selections come from the command line through a [`PresetPicker`],
//! so the run goes through the same state machine as the interactive UI:
//! pick folder, pick file, run, wait for the terminal status.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use super::output::{self, activity_spinner};
use super::{ConvertArgs, OutputFormat};
use crate::config::Config;
use crate::core::ConversionStatus;
use crate::gateway::{BackendGateway, ConversionWorker, LocalGateway, LogStore, PresetPicker};
use crate::orchestrator::{Orchestrator, OrchestratorHandle, Snapshot};

/// Printed with `--format json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertReport {
    pub success: bool,
    pub message: String,
    pub output_path: Option<PathBuf>,
}

impl ConvertReport {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output_path: None,
        }
    }

    /// Report for a snapshot that ended the run, if it did
    pub fn from_snapshot(snapshot: &Snapshot) -> Option<Self> {
        match &snapshot.status {
            ConversionStatus::Succeeded {
                output_path,
                message,
            } => Some(Self {
                success: true,
                message: message.clone(),
                output_path: Some(output_path.clone()),
            }),
            ConversionStatus::Failed { message } => Some(Self::failure(message.clone())),
            _ => None,
        }
    }
}

/// Run `parcel-deck convert`. Returns whether the conversion succeeded.
pub async fn run_convert(args: ConvertArgs, config: &Config, store: LogStore) -> Result<bool> {
    let output_folder = args
        .output
        .clone()
        .or_else(|| config.conversion.default_output_folder.clone())
        .context("No output folder: pass --output or set default_output_folder in the config")?;

    let mut worker_config = config.worker_config();
    if let Some(program) = args.program.clone() {
        worker_config.program = Some(program);
    }

    let picker = PresetPicker::new(Some(output_folder.clone()), Some(args.input.clone()));
    let gateway = LocalGateway::new(picker, store, ConversionWorker::new(worker_config));

    if args.format == OutputFormat::Human {
        output::print_header("Parcel Deck");
        output::print_kv("Input", &args.input.display().to_string());
        output::print_kv("Output folder", &output_folder.display().to_string());
    }

    let report = convert_with(gateway, config, args.format == OutputFormat::Human).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human if report.success => output::print_success(&report.message),
        OutputFormat::Human => output::print_error(&report.message),
    }

    Ok(report.success)
}

/// Walk one conversion through the orchestrator
pub async fn convert_with<G: BackendGateway>(
    gateway: G,
    config: &Config,
    show_progress: bool,
) -> Result<ConvertReport> {
    let (handle, task) = Orchestrator::spawn(Arc::new(gateway), config.cadence());

    let report = drive(&handle, show_progress).await;

    let _ = handle.shutdown();
    let _ = task.await;

    report
}

async fn drive(handle: &OrchestratorHandle, show_progress: bool) -> Result<ConvertReport> {
    handle.select_output_folder()?;
    let snapshot = handle
        .wait_for(|s| s.selection.output_folder.is_some() || s.notification.is_some())
        .await?;
    if let Some(notification) = snapshot.notification {
        return Ok(ConvertReport::failure(notification.message));
    }

    handle.select_input_file()?;
    let snapshot = handle
        .wait_for(|s| s.selection.input_file.is_some() || s.notification.is_some())
        .await?;
    if let Some(notification) = snapshot.notification {
        return Ok(ConvertReport::failure(notification.message));
    }

    if !snapshot.can_convert() {
        return Ok(ConvertReport::failure("Nothing to convert"));
    }

    let spinner = show_progress.then(|| activity_spinner("Starting conversion..."));
    let follower = spinner.clone().map(|pb| {
        let mut logs = handle.subscribe_logs();
        tokio::spawn(async move {
            while logs.changed().await.is_ok() {
                let latest = logs.borrow_and_update().last().map(|e| e.message.clone());
                if let Some(message) = latest {
                    pb.set_message(message);
                }
            }
        })
    });

    handle.run_conversion()?;
    debug!("Conversion submitted");
    let snapshot = handle
        .wait_for(|s| !s.is_converting && s.status.is_terminal())
        .await?;

    if let Some(follower) = follower {
        follower.abort();
    }
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    Ok(ConvertReport::from_snapshot(&snapshot)
        .unwrap_or_else(|| ConvertReport::failure("Conversion ended without a result")))
}
