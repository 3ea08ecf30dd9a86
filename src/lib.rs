//! Split a short video clip into a mono audio track and a sparse sequence of JPEG frames.
//!
//! Inputs are a file path or a `data:` URI; outputs are self-contained data URIs, so callers can
//! hand audio and vision to separate consumers without touching video containers:
//!
//! - [`decode_input`] for the default ffmpeg-backed pipeline
//! - [`Decoder`] with a custom [`Transcoder`] or [`DecodeOpts`]
//! - [`datauri`] for the file/string codec on its own
#![forbid(unsafe_code)]

mod foundation;

pub mod datauri;
pub mod pipeline;
pub mod transcode;

pub use crate::datauri::{AUDIO_MIME, DataUri, IMAGE_MIME};
pub use crate::foundation::core::Fps;
pub use crate::foundation::error::{ClipError, ClipResult, Stage};
pub use crate::pipeline::{DecodeOpts, DecodedInput, Decoder, VideoSource, decode_input};
pub use crate::transcode::{AudioSettings, FfmpegTranscoder, FrameSettings, Transcoder};
