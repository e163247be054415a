//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::filter_graph::{FilterGraph, BASE_VIDEO_LABEL};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Number of trailing stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 20;

/// Optional audio mapping; `?` keeps sources without audio valid.
const AUDIO_PASSTHROUGH_MAP: &str = "0:a?";

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Command burning `graph` into `input`.
    ///
    /// With at least one stage the final stage's label is mapped and video is
    /// re-encoded with `video_codec`; a passthrough graph stream-copies the
    /// source so the output equals the input. Audio, when present, is always
    /// copied.
    pub fn overlay(
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        graph: &FilterGraph,
        video_codec: &str,
    ) -> Self {
        let cmd = Self::new(input, output);
        if graph.is_passthrough() {
            cmd.map(BASE_VIDEO_LABEL)
                .map(AUDIO_PASSTHROUGH_MAP)
                .stream_copy()
        } else {
            cmd.filter_complex(graph.expression())
                .map(graph.video_map())
                .map(AUDIO_PASSTHROUGH_MAP)
                .video_codec(video_codec)
                .audio_codec("copy")
        }
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Select a stream or filter output label for the output file.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy every mapped stream without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn input_path(&self) -> &Path {
        &self.input
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Executes FFmpeg commands.
#[async_trait]
pub trait VideoProcessor: Send + Sync {
    /// Run `cmd` to completion. A non-zero exit is an error.
    async fn process(&self, cmd: &FfmpegCommand) -> MediaResult<()>;

    /// Whether the processor can currently run commands.
    fn is_available(&self) -> bool;
}

/// Runs the FFmpeg binary as a child process.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: PathBuf,
}

impl FfmpegRunner {
    /// Create a runner for the binary at `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Create a runner from an optional configured location, falling back to
    /// `ffmpeg` on `PATH`.
    pub fn resolve(configured: Option<&str>) -> MediaResult<Self> {
        resolve_ffmpeg(configured).map(Self::new)
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run an FFmpeg command with a progress callback.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MediaError::ffmpeg_failed(format!("Failed to spawn FFmpeg: {}", e), None, None)
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("FFmpeg stderr not captured", None, None))?;
        let mut reader = BufReader::new(stderr).lines();

        // Progress lines are parsed; everything else is kept as a bounded tail
        let stderr_handle = tokio::spawn(async move {
            let mut current = FfmpegProgress::default();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                if is_progress_line(&line) {
                    if let Some(progress) = parse_progress_line(&line, &mut current) {
                        progress_callback(progress);
                    }
                } else if !line.trim().is_empty() {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }

            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let status = child.wait().await?;
        let stderr_tail = stderr_handle.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            warn!(
                exit_code = ?status.code(),
                stderr = %stderr_tail,
                "FFmpeg exited with non-zero status"
            );
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!stderr_tail.is_empty()).then_some(stderr_tail),
                status.code(),
            ))
        }
    }
}

#[async_trait]
impl VideoProcessor for FfmpegRunner {
    async fn process(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        info!(
            input = %cmd.input_path().display(),
            output = %cmd.output_path().display(),
            "Executing FFmpeg"
        );
        self.run_with_progress(cmd, |progress| {
            debug!(
                frame = progress.frame,
                out_time_ms = progress.out_time_ms,
                speed = progress.speed,
                complete = progress.is_complete,
                "FFmpeg progress"
            );
        })
        .await
    }

    fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }
}

/// Resolve the FFmpeg binary: an explicitly configured location wins,
/// otherwise `ffmpeg` is looked up on `PATH`.
pub fn resolve_ffmpeg(configured: Option<&str>) -> MediaResult<PathBuf> {
    match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(path) => which::which(path).map_err(|_| MediaError::FileNotFound(PathBuf::from(path))),
        None => check_ffmpeg(),
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caption_models::{CaptionStyle, Overlay, RunId};

    fn position(args: &[String], value: &str) -> usize {
        args.iter().position(|a| a == value).unwrap()
    }

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .video_codec("libx264")
            .audio_codec("copy");

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        assert!(position(&args, "-i") < position(&args, "-c:v"));
        assert_eq!(args[position(&args, "-c:v") + 1], "libx264");
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[tokio::test]
    async fn test_overlay_command_maps_final_label() {
        let root = tempfile::TempDir::new().unwrap();
        let mut ws = crate::TempWorkspace::create(root.path(), &RunId::new()).await.unwrap();
        let graph = crate::FilterGraphBuilder::new("/fonts/roboto.woff")
            .build(
                &[Overlay::new("one", 0.0, 1.0), Overlay::new("two", 1.0, 2.0)],
                CaptionStyle::FreezeResponse,
                &mut ws,
            )
            .await
            .unwrap();

        let args = FfmpegCommand::overlay("in.mp4", "out.mp4", &graph, "libx264").build_args();

        assert_eq!(args[position(&args, "-filter_complex") + 1], graph.expression());
        let maps: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[i - 1] == "-map")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(maps, vec!["[v1]", "0:a?"]);
        assert_eq!(args[position(&args, "-c:v") + 1], "libx264");
        assert_eq!(args[position(&args, "-c:a") + 1], "copy");
        assert_eq!(args.last().unwrap(), "out.mp4");
        ws.release().await;
    }

    #[test]
    fn test_passthrough_command_copies_streams() {
        let graph = FilterGraph::passthrough();
        let args = FfmpegCommand::overlay("in.mp4", "out.mp4", &graph, "libx264").build_args();

        assert!(!args.contains(&"-filter_complex".to_string()));
        assert!(!args.contains(&"libx264".to_string()));
        assert_eq!(args[position(&args, "-map") + 1], "0:v");
        assert_eq!(args[position(&args, "-c") + 1], "copy");
    }

    #[test]
    fn test_resolve_missing_configured_binary() {
        let err = resolve_ffmpeg(Some("/definitely/not/here/ffmpeg")).unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_runner_spawn_failure_is_ffmpeg_error() {
        let runner = FfmpegRunner::new("/definitely/not/here/ffmpeg");
        assert!(!runner.is_available());

        let err = runner
            .process(&FfmpegCommand::new("in.mp4", "out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FfmpegFailed { .. }));
    }
}
