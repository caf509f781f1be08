//! Conversion worker - runs the external converter program
//!
//! The worker:
//! - Checks the input extension and that the file opens
//! - Derives `<output folder>/<input stem>` and creates it
//! - Runs the configured program with `{input}`/`{output}` substituted
//! - Forwards every stdout/stderr line into the log via `tracing`

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use super::{ConversionRequest, GatewayError};
use crate::core::ConversionOutcome;

/// `tracing` target for lines echoed from the worker process
pub const WORKER_TARGET: &str = "parcel_deck::worker";

/// How to invoke the converter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Converter executable; `None` means conversions fail
    pub program: Option<String>,
    /// Argument templates; `{input}` and `{output}` are substituted
    pub args: Vec<String>,
    /// Accepted input extensions without dots (empty = any)
    pub accepted_extensions: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: vec!["{input}".to_string(), "{output}".to_string()],
            accepted_extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversionWorker {
    config: WorkerConfig,
}

impl ConversionWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Case-insensitive extension check against the accepted list
    pub fn check_extension(&self, path: &Path) -> Result<(), GatewayError> {
        let accepted = &self.config.accepted_extensions;
        if accepted.is_empty() {
            return Ok(());
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        match ext {
            Some(ext) if accepted.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(()),
            _ => Err(GatewayError::InvalidFileExtension {
                expected: accepted
                    .iter()
                    .map(|a| format!(".{}", a))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Run one conversion to completion
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionOutcome, GatewayError> {
        info!("Starting conversion...");
        info!("Input file: {}", request.input_path.display());
        info!("Output folder: {}", request.output_folder.display());

        if let Err(e) = self.check_extension(&request.input_path) {
            info!("Error: Invalid file extension");
            return Err(e);
        }

        let program = self
            .config
            .program
            .as_deref()
            .ok_or(GatewayError::WorkerNotConfigured)?;

        info!("Opening input file...");
        tokio::fs::File::open(&request.input_path)
            .await
            .map_err(|e| GatewayError::FileOpen(e.to_string()))?;

        let output_path = output_dir_for(&request.input_path, &request.output_folder);

        info!("Creating output directory: {}", output_path.display());
        tokio::fs::create_dir_all(&output_path)
            .await
            .map_err(|e| GatewayError::DirectoryCreate(e.to_string()))?;

        let args = expand_args(&self.config.args, &request.input_path, &output_path);
        info!("Running {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GatewayError::WorkerSpawn(e.to_string()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (_, _, status) = tokio::join!(
            forward_lines(stdout, false),
            forward_lines(stderr, true),
            child.wait()
        );
        let status = status.map_err(|e| GatewayError::Task(e.to_string()))?;

        if !status.success() {
            warn!("Conversion worker exited with {}", status);
            return Err(GatewayError::WorkerFailed {
                code: status.code(),
            });
        }

        info!("Conversion completed successfully!");
        info!("Output saved to: {}", output_path.display());

        Ok(ConversionOutcome {
            message: format!("Successfully converted to {}", output_path.display()),
            output_path,
        })
    }
}

/// `<output_folder>/<input stem>`, stem defaulting to `project`
pub fn output_dir_for(input: &Path, output_folder: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string());

    output_folder.join(stem)
}

fn expand_args(templates: &[String], input: &Path, output: &Path) -> Vec<String> {
    let input = input.to_string_lossy();
    let output = output.to_string_lossy();

    templates
        .iter()
        .map(|t| t.replace("{input}", &input).replace("{output}", &output))
        .collect()
}

async fn forward_lines<R>(stream: Option<R>, is_stderr: bool)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };

    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) if is_stderr => warn!(target: WORKER_TARGET, "{}", line),
            Ok(Some(line)) => info!(target: WORKER_TARGET, "{}", line),
            Ok(None) => break,
            Err(e) => {
                warn!("Lost worker output: {}", e);
                break;
            }
        }
    }
}
