use std::path::Path;

use crate::foundation::core::Fps;
use crate::foundation::error::ClipResult;

/// File name of the extracted audio track inside a workspace.
pub const AUDIO_FILE_NAME: &str = "audio.mp3";
/// Prefix shared by every sampled frame file.
pub const FRAME_PREFIX: &str = "frame-";
/// Extension of sampled frame files.
pub const FRAME_EXT: &str = "jpg";

/// Audio extraction parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioSettings {
    /// Target bitrate in ffmpeg notation (`64k`).
    pub bitrate: String,
    /// Output channel count.
    pub channels: u16,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            bitrate: "64k".to_string(),
            channels: 1,
        }
    }
}

/// Frame sampling parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSettings {
    /// Sampling rate.
    pub fps: Fps,
    /// Longer edge of every output frame, in pixels.
    pub max_edge: u32,
    /// JPEG quantizer (`-q:v`); lower is better quality.
    pub jpeg_quality: u8,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            max_edge: 512,
            jpeg_quality: 20,
        }
    }
}

impl FrameSettings {
    /// printf-style pattern for numbered frame files (`frame-%04d.jpg`).
    ///
    /// Fixed width keeps lexicographic order equal to capture order.
    pub fn pattern() -> String {
        format!("{FRAME_PREFIX}%04d.{FRAME_EXT}")
    }
}

/// Process-level media conversion used by the decode pipeline.
///
/// Both calls block until the work is done. Implementations must report failures as
/// [`crate::ClipError::Transcode`] so callers can tell them apart from filesystem errors.
pub trait Transcoder: Send + Sync {
    /// Extract the audio track of `video` into `out_file`.
    fn extract_audio(
        &self,
        video: &Path,
        out_file: &Path,
        settings: &AudioSettings,
    ) -> ClipResult<()>;

    /// Sample still frames of `video` into `out_dir` as numbered JPEG files.
    fn extract_frames(
        &self,
        video: &Path,
        out_dir: &Path,
        settings: &FrameSettings,
    ) -> ClipResult<()>;
}

impl<T: Transcoder + ?Sized> Transcoder for &T {
    fn extract_audio(
        &self,
        video: &Path,
        out_file: &Path,
        settings: &AudioSettings,
    ) -> ClipResult<()> {
        (**self).extract_audio(video, out_file, settings)
    }

    fn extract_frames(
        &self,
        video: &Path,
        out_dir: &Path,
        settings: &FrameSettings,
    ) -> ClipResult<()> {
        (**self).extract_frames(video, out_dir, settings)
    }
}

/// Parse the sequence number out of a frame file name (`frame-0007.jpg` -> 7).
pub fn parse_frame_number(file_name: &str) -> Option<u32> {
    let stem = file_name
        .strip_prefix(FRAME_PREFIX)?
        .strip_suffix(FRAME_EXT)?
        .strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

#[cfg(test)]
#[path = "../../tests/unit/transcode/backend.rs"]
mod tests;
