//! Transcoding backends.
//!
//! The decode pipeline only talks to a [`Transcoder`]; the real implementation shells out to the
//! system `ffmpeg`, tests plug in a fake.

/// Transcoder trait and per-stage settings.
pub mod backend;
/// `ffmpeg`-based transcoder (system binary).
pub mod ffmpeg;

pub use backend::{AudioSettings, FrameSettings, Transcoder};
pub use ffmpeg::FfmpegTranscoder;
