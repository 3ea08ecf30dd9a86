use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::foundation::error::{ClipError, ClipResult, Stage};
use crate::transcode::backend::{AudioSettings, FrameSettings, Transcoder};

/// Environment variable overriding the ffmpeg binary.
pub const FFMPEG_ENV: &str = "CLIPDECODE_FFMPEG";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Transcoder that spawns the system `ffmpeg` once per stage.
#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        let program = std::env::var_os(FFMPEG_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        Self {
            program,
            timeout: None,
        }
    }
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific ffmpeg binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill an invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the configured binary runs at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn run(&self, stage: Stage, args: Vec<OsString>) -> ClipResult<()> {
        tracing::debug!(
            command = %display_args(self.program.as_os_str(), &args),
            %stage,
            "running ffmpeg"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            ClipError::transcode(
                stage,
                format!(
                    "failed to spawn '{}' (is it installed and on PATH?): {e}",
                    self.program.display()
                ),
            )
        })?;

        let (status, stderr) = match self.timeout {
            Some(timeout) => wait_with_timeout(child, timeout, stage)?,
            None => {
                let out = child.wait_with_output().map_err(|e| {
                    ClipError::transcode(stage, format!("failed to wait for ffmpeg: {e}"))
                })?;
                (out.status, out.stderr)
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(ClipError::transcode(
                stage,
                format!("ffmpeg exited with status {status}: {}", stderr.trim()),
            ));
        }
        Ok(())
    }
}

impl Transcoder for FfmpegTranscoder {
    fn extract_audio(
        &self,
        video: &Path,
        out_file: &Path,
        settings: &AudioSettings,
    ) -> ClipResult<()> {
        let args = audio_args(video, out_file, settings);
        self.run(Stage::AudioExtraction, args)
    }

    fn extract_frames(
        &self,
        video: &Path,
        out_dir: &Path,
        settings: &FrameSettings,
    ) -> ClipResult<()> {
        let args = frame_args(video, out_dir, settings);
        self.run(Stage::FrameExtraction, args)
    }
}

fn common_args(video: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(video.as_os_str().to_owned());
    args
}

fn push_all(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

/// Arguments for the audio stage: drop video, downmix, re-encode at a fixed bitrate.
pub fn audio_args(video: &Path, out_file: &Path, settings: &AudioSettings) -> Vec<OsString> {
    let mut args = common_args(video);
    push_all(
        &mut args,
        &[
            "-vn",
            "-ac",
            &settings.channels.to_string(),
            "-b:a",
            &settings.bitrate,
        ],
    );
    args.push(out_file.as_os_str().to_owned());
    args
}

/// Arguments for the frame stage: sample at `fps`, fit the longer edge, write numbered JPEGs.
pub fn frame_args(video: &Path, out_dir: &Path, settings: &FrameSettings) -> Vec<OsString> {
    let mut args = common_args(video);
    let filter = format!(
        "fps={},{}",
        settings.fps.as_filter_arg(),
        scale_filter(settings.max_edge)
    );
    push_all(
        &mut args,
        &["-an", "-vf", &filter, "-q:v", &settings.jpeg_quality.to_string()],
    );
    args.push(out_dir.join(FrameSettings::pattern()).into_os_string());
    args
}

/// Scale so the longer edge is `max_edge`; `-1` keeps the aspect ratio on the other axis.
pub fn scale_filter(max_edge: u32) -> String {
    let w = format!("if(gte(iw,ih),{max_edge},-1)");
    let h = format!("if(gt(ih,iw),{max_edge},-1)");
    format!("scale='{w}':'{h}'")
}

fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    stage: Stage,
) -> ClipResult<(std::process::ExitStatus, Vec<u8>)> {
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ClipError::transcode(stage, "failed to open ffmpeg stderr (unexpected)"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok::<_, std::io::Error>(stderr_bytes)
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stderr_drain.join();
                return Err(ClipError::transcode(
                    stage,
                    format!(
                        "ffmpeg timed out after {:.1}s and was killed",
                        timeout.as_secs_f64()
                    ),
                ));
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ClipError::transcode(
                    stage,
                    format!("failed to wait for ffmpeg: {e}"),
                ));
            }
        }
    };

    let stderr = match stderr_drain.join() {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            return Err(ClipError::transcode(
                stage,
                format!("failed to read ffmpeg stderr: {e}"),
            ));
        }
        Err(_) => {
            return Err(ClipError::transcode(stage, "ffmpeg stderr drain thread panicked"));
        }
    };
    Ok((status, stderr))
}

/// Render an argument list the way a shell user would type it, for logs and error text.
pub fn display_args(program: &OsStr, args: &[OsString]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(OsString::as_os_str))
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "../../tests/unit/transcode/ffmpeg.rs"]
mod tests;
