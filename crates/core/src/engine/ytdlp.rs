//! yt-dlp based engine implementation.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use super::config::EngineConfig;
use super::error::EngineError;
use super::traits::Engine;
use super::types::{EngineRequest, ExtractedInfo, ProgressEvent, ProgressStatus};

/// Marker that starts every progress line we ask yt-dlp to print.
const PROGRESS_MARKER: &str = "linxgo-progress";

/// Progress template handed to `--progress-template`.
///
/// Fields yt-dlp does not know are rendered as `NA`.
const PROGRESS_TEMPLATE: &str = "download:linxgo-progress %(progress.status)s \
     %(progress.downloaded_bytes)s %(progress.total_bytes)s \
     %(progress.total_bytes_estimate)s %(progress.eta)s %(progress.speed)s";

/// Engine that shells out to the yt-dlp binary.
pub struct YtDlpEngine {
    config: EngineConfig,
}

/// What we collected from the engine's output streams.
#[derive(Debug, Default)]
struct EngineOutput {
    info_json: Option<String>,
    last_error: Option<String>,
}

impl YtDlpEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Builds yt-dlp arguments for a request.
    fn build_args(&self, request: &EngineRequest) -> Vec<String> {
        let output = request
            .output_dir
            .join(&request.output_template)
            .to_string_lossy()
            .to_string();

        let mut args = vec![
            "-f".to_string(),
            request.format.clone(),
            "-o".to_string(),
            output,
        ];

        if request.quiet {
            args.extend(["--quiet".to_string(), "--no-warnings".to_string()]);
        }

        // Progress must still be printed when quiet, one event per line.
        args.extend([
            "--progress".to_string(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
        ]);

        // Download for real and print the resolved metadata as one JSON line.
        args.extend(["--no-simulate".to_string(), "--dump-single-json".to_string()]);

        args.push(if request.playlist {
            "--yes-playlist".to_string()
        } else {
            "--no-playlist".to_string()
        });

        if request.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }

        for (name, value) in &request.http_headers {
            args.extend(["--add-headers".to_string(), format!("{}:{}", name, value)]);
        }

        args.extend(self.config.extra_args.iter().cloned());

        args.push("--".to_string());
        args.push(request.url.clone());

        args
    }

    /// Routes one output line to the progress callback or the collected output.
    fn handle_line(
        line: &str,
        on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
        output: &mut EngineOutput,
    ) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        if let Some(event) = parse_progress_line(trimmed) {
            on_progress(event);
        } else if trimmed.starts_with('{') {
            output.info_json = Some(trimmed.to_string());
        } else if trimmed.starts_with("ERROR:") {
            output.last_error = Some(trimmed.to_string());
        } else {
            debug!(line = trimmed, "yt-dlp output");
        }
    }
}

/// Parses a line printed through [`PROGRESS_TEMPLATE`].
fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.strip_prefix(PROGRESS_MARKER)?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() != 6 {
        return None;
    }

    fn number(field: &str) -> Option<f64> {
        match field {
            "NA" | "None" | "none" => None,
            value => value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0),
        }
    }

    Some(ProgressEvent {
        job_id: None,
        status: ProgressStatus::parse(fields[0]),
        downloaded_bytes: number(fields[1]).map(|v| v as u64).unwrap_or(0),
        total_bytes: number(fields[2]).map(|v| v as u64),
        total_bytes_estimate: number(fields[3]).map(|v| v as u64),
        eta: number(fields[4]).map(|v| v as u64),
        speed: number(fields[5]),
    })
}

#[async_trait]
impl Engine for YtDlpEngine {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn extract(
        &self,
        request: &EngineRequest,
        on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<ExtractedInfo, EngineError> {
        let args = self.build_args(request);
        debug!(?args, "Running yt-dlp");

        let mut child = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::BinaryNotFound {
                        path: self.config.ytdlp_path.clone(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::invalid_output("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::invalid_output("stderr was not captured"))?;

        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();
        let mut stdout_done = false;
        let mut stderr_done = false;
        let mut output = EngineOutput::default();

        // Drain both pipes on this task so progress callbacks stay in order.
        while !(stdout_done && stderr_done) {
            tokio::select! {
                line = stdout_lines.next_line(), if !stdout_done => match line? {
                    Some(line) => Self::handle_line(&line, on_progress, &mut output),
                    None => stdout_done = true,
                },
                line = stderr_lines.next_line(), if !stderr_done => match line? {
                    Some(line) => Self::handle_line(&line, on_progress, &mut output),
                    None => stderr_done = true,
                },
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            let message = output.last_error.unwrap_or_else(|| {
                format!("yt-dlp exited with code: {:?}", status.code())
            });
            warn!(url = %request.url, %message, "yt-dlp failed");
            return Err(EngineError::failed(message));
        }

        let json = output
            .info_json
            .ok_or_else(|| EngineError::invalid_output("yt-dlp printed no metadata"))?;
        serde_json::from_str(&json)
            .map_err(|e| EngineError::invalid_output(format!("invalid metadata JSON: {}", e)))
    }

    async fn validate(&self) -> Result<(), EngineError> {
        let output = Command::new(&self.config.ytdlp_path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::BinaryNotFound {
                        path: self.config.ytdlp_path.clone(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::failed(format!(
                "yt-dlp --version failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "yt-dlp available"
        );
        Ok(())
    }
}
