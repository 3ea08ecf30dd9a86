//! Video → (audio, frames) decode pipeline.
//!
//! One call runs two transcode stages strictly in sequence against a private workspace and hands
//! the encoded results back as a [`DecodedInput`], which owns the workspace until it is closed.

use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};

use crate::datauri::{self, AUDIO_MIME, DataUri, IMAGE_MIME};
use crate::foundation::core::Fps;
use crate::foundation::error::{ClipError, ClipResult, Stage};
use crate::transcode::backend::{
    AUDIO_FILE_NAME, AudioSettings, FrameSettings, Transcoder, parse_frame_number,
};
use crate::transcode::ffmpeg::FfmpegTranscoder;

const WORKSPACE_PREFIX: &str = "clipdecode-";

/// Where the video comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    /// Path to an existing video file.
    File(PathBuf),
    /// Video already inlined as a data URI.
    DataUri(DataUri),
}

impl VideoSource {
    /// Classify a caller-provided string: an existing file wins, otherwise it must be a data URI.
    pub fn resolve(source: &str) -> ClipResult<Self> {
        let path = Path::new(source);
        if path.is_file() {
            return Ok(Self::File(path.to_path_buf()));
        }
        if !datauri::is_data_uri(source.trim_start()) {
            return Err(ClipError::format(format!(
                "source is neither an existing file nor a data URI: '{}'",
                preview(source)
            )));
        }
        Ok(Self::DataUri(DataUri::parse(source)?))
    }

    /// Load into the in-memory data URI form the rest of the pipeline works on.
    fn into_data_uri(self, max_bytes: Option<u64>) -> ClipResult<DataUri> {
        match self {
            Self::File(path) => {
                if let Some(limit) = max_bytes {
                    let len = std::fs::metadata(&path)
                        .map_err(|e| ClipError::io(Stage::InputDecode, e))?
                        .len();
                    check_size(len, limit)?;
                }
                DataUri::from_file(&path)
            }
            Self::DataUri(uri) => {
                if let Some(limit) = max_bytes {
                    check_size(uri.data.len() as u64, limit)?;
                }
                Ok(uri)
            }
        }
    }
}

fn check_size(len: u64, limit: u64) -> ClipResult<()> {
    if len > limit {
        return Err(ClipError::validation(format!(
            "input is {len} bytes, larger than the configured limit of {limit} bytes"
        )));
    }
    Ok(())
}

fn preview(s: &str) -> String {
    const MAX: usize = 64;
    match s.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Options for a [`Decoder`].
#[derive(Clone, Debug, Default)]
pub struct DecodeOpts {
    /// Audio stage parameters (64 kbit/s mono by default).
    pub audio: AudioSettings,
    /// Frame stage parameters (2 fps, 512 px longer edge, q 20 by default).
    pub frames: FrameSettings,
    /// Parent directory for workspaces; the system temp dir when unset.
    pub workspace_root: Option<PathBuf>,
    /// Reject inputs larger than this many bytes.
    pub max_input_bytes: Option<u64>,
}

impl DecodeOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.frames.fps = fps;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn with_max_input_bytes(mut self, limit: u64) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }

    pub fn validate(&self) -> ClipResult<()> {
        let fps = self.frames.fps;
        if fps.num == 0 || fps.den == 0 {
            return Err(ClipError::validation("fps must be positive"));
        }
        if self.frames.max_edge == 0 {
            return Err(ClipError::validation("frame max_edge must be non-zero"));
        }
        if self.audio.channels == 0 {
            return Err(ClipError::validation("audio channels must be non-zero"));
        }
        if self.audio.bitrate.trim().is_empty() {
            return Err(ClipError::validation("audio bitrate must not be empty"));
        }
        Ok(())
    }
}

/// Result of a successful decode.
///
/// The encoded strings are self-contained; closing (or dropping) the value removes the backing
/// workspace without invalidating them.
#[derive(Debug)]
pub struct DecodedInput {
    audio: String,
    images: Vec<String>,
    frame_numbers: Vec<u32>,
    fps: Fps,
    workspace: TempDir,
}

impl DecodedInput {
    /// `data:audio/mpeg;base64,...`
    pub fn audio(&self) -> &str {
        &self.audio
    }

    /// `data:image/jpeg;base64,...` frames in capture order.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Sequence numbers of [`DecodedInput::images`], strictly increasing.
    pub fn frame_numbers(&self) -> &[u32] {
        &self.frame_numbers
    }

    /// Approximate capture time of each frame.
    pub fn frame_times_secs(&self) -> Vec<f64> {
        self.frame_numbers
            .iter()
            .map(|&n| self.fps.frames_to_secs(u64::from(n.saturating_sub(1))))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Backing workspace directory; gone once this value is closed or dropped.
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Remove the workspace, reporting a failed removal.
    pub fn close(self) -> ClipResult<()> {
        let Self { workspace, .. } = self;
        close_workspace(workspace)
    }

    /// Remove the workspace and keep the encoded artifacts.
    ///
    /// A failed removal is logged; the artifacts are returned either way.
    pub fn into_parts(self) -> (String, Vec<String>) {
        let Self { audio, images, workspace, .. } = self;
        let path = workspace.path().to_path_buf();
        if let Err(err) = close_workspace(workspace) {
            tracing::warn!(
                workspace = %path.display(),
                error = %err,
                "failed to remove workspace"
            );
        }
        (audio, images)
    }
}

fn close_workspace(workspace: TempDir) -> ClipResult<()> {
    tracing::debug!(workspace = %workspace.path().display(), "cleaning up workspace");
    workspace
        .close()
        .map_err(|e| ClipError::io(Stage::Cleanup, e))
}

/// Runs the decode pipeline against a [`Transcoder`].
#[derive(Clone, Debug)]
pub struct Decoder<T> {
    transcoder: T,
    opts: DecodeOpts,
}

impl Default for Decoder<FfmpegTranscoder> {
    fn default() -> Self {
        Self::new(FfmpegTranscoder::default(), DecodeOpts::default())
    }
}

impl<T: Transcoder> Decoder<T> {
    pub fn new(transcoder: T, opts: DecodeOpts) -> Self {
        Self { transcoder, opts }
    }

    pub fn opts(&self) -> &DecodeOpts {
        &self.opts
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// Decode a file path or data URI.
    pub fn decode(&self, source: &str) -> ClipResult<DecodedInput> {
        if let Some(limit) = self.opts.max_input_bytes
            && datauri::is_data_uri(source.trim_start())
            && !Path::new(source).is_file()
        {
            check_size(datauri::estimated_decoded_len(source)?, limit)?;
        }
        let source = VideoSource::resolve(source)?;
        self.decode_source(source)
    }

    #[tracing::instrument(skip_all, fields(fps = %self.opts.frames.fps))]
    pub fn decode_source(&self, source: VideoSource) -> ClipResult<DecodedInput> {
        self.opts.validate()?;
        let video = source.into_data_uri(self.opts.max_input_bytes)?;

        let workspace = self.create_workspace()?;
        tracing::debug!(
            workspace = %workspace.path().display(),
            mime = %video.mime,
            "created workspace"
        );

        match self.run_stages(video, workspace.path()) {
            Ok((audio, frames)) => {
                let (frame_numbers, images) = frames.into_iter().unzip();
                let decoded = DecodedInput {
                    audio,
                    images,
                    frame_numbers,
                    fps: self.opts.frames.fps,
                    workspace,
                };
                tracing::info!(
                    frames = decoded.len(),
                    audio_len = decoded.audio.len(),
                    "decoded input"
                );
                Ok(decoded)
            }
            Err(err) => {
                let path = workspace.path().to_path_buf();
                if let Err(cleanup) = workspace.close() {
                    tracing::warn!(
                        workspace = %path.display(),
                        error = %cleanup,
                        "failed to remove workspace after error"
                    );
                }
                Err(err)
            }
        }
    }

    fn create_workspace(&self) -> ClipResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match self.opts.workspace_root.as_deref() {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| ClipError::io(Stage::Workspace, e))
    }

    fn run_stages(&self, video: DataUri, dir: &Path) -> ClipResult<(String, Vec<(u32, String)>)> {
        let audio_path = dir.join(AUDIO_FILE_NAME);

        // The decoded video only has to outlive the two transcode calls.
        let video_file = video.to_tempfile_in(dir)?;
        drop(video);
        self.transcode(video_file.path(), &audio_path, dir)?;
        close_video(video_file)?;

        if !is_non_empty_file(&audio_path) {
            return Err(ClipError::transcode(
                Stage::AudioExtraction,
                "transcoder produced no audio output",
            ));
        }
        let frame_paths = collect_frames(dir)?;
        if frame_paths.is_empty() {
            return Err(ClipError::transcode(
                Stage::FrameExtraction,
                "transcoder produced no frames",
            ));
        }
        tracing::debug!(frames = frame_paths.len(), "collected frames");

        let audio = datauri::encode(&audio_path, AUDIO_MIME)?;
        let frames = frame_paths
            .into_iter()
            .map(|(n, path)| -> ClipResult<(u32, String)> {
                Ok((n, datauri::encode(&path, IMAGE_MIME)?))
            })
            .collect::<ClipResult<Vec<_>>>()?;
        Ok((audio, frames))
    }

    fn transcode(&self, video: &Path, audio_path: &Path, dir: &Path) -> ClipResult<()> {
        self.transcoder.extract_audio(video, audio_path, &self.opts.audio)?;
        self.transcoder.extract_frames(video, dir, &self.opts.frames)
    }
}

fn close_video(file: NamedTempFile) -> ClipResult<()> {
    file.close().map_err(|e| ClipError::io(Stage::Cleanup, e))
}

fn is_non_empty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Numbered frame files in `dir`, in capture order.
///
/// Sorted by the parsed sequence number, which matches name order for `%04d` names and stays
/// correct past 9999 frames.
fn collect_frames(dir: &Path) -> ClipResult<Vec<(u32, PathBuf)>> {
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| ClipError::io(Stage::FrameExtraction, e))? {
        let entry = entry.map_err(|e| ClipError::io(Stage::FrameExtraction, e))?;
        let name = entry.file_name();
        if let Some(n) = name.to_str().and_then(parse_frame_number) {
            frames.push((n, entry.path()));
        }
    }
    frames.sort();
    Ok(frames)
}

/// Decode `source` (file path or data URI) with the system ffmpeg, sampling at `fps`.
pub fn decode_input(source: &str, fps: Fps) -> ClipResult<DecodedInput> {
    Decoder::new(
        FfmpegTranscoder::default(),
        DecodeOpts::default().with_fps(fps),
    )
    .decode(source)
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
