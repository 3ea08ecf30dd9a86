//! Conversion between files and self-describing `data:<mime>;base64,<payload>` strings.
//!
//! Used on both ends of the decode pipeline: to ingest a video that arrived inline, and to
//! package every extracted artifact so it no longer depends on a filesystem path.

use std::{io::Write as _, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tempfile::NamedTempFile;

use crate::foundation::error::{ClipError, ClipResult, Stage};

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const DEFAULT_MIME: &str = "text/plain";

/// MIME tag for extracted audio tracks.
pub const AUDIO_MIME: &str = "audio/mpeg";
/// MIME tag for extracted still frames.
pub const IMAGE_MIME: &str = "image/jpeg";

/// A parsed data URI: media type plus the decoded payload bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri {
    /// Media type, without parameters (e.g. `video/webm`).
    pub mime: String,
    /// Decoded payload.
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data,
        }
    }

    /// Parse a base64 data URI.
    ///
    /// The header may carry parameters, including comma-bearing ones like the
    /// `video/webm;codecs=vp8,opus` type that browser recorders emit.
    pub fn parse(uri: &str) -> ClipResult<Self> {
        let (mime, payload) = split_uri(uri)?;
        let data = decode_payload(payload)?;
        Ok(Self {
            mime: mime.to_string(),
            data,
        })
    }

    /// Read a file fully into memory, tagging it by extension.
    pub fn from_file(path: impl AsRef<Path>) -> ClipResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| ClipError::io(Stage::InputDecode, e))?;
        Ok(Self {
            mime: mime_for_path(path).to_string(),
            data,
        })
    }

    pub fn to_uri_string(&self) -> String {
        encode_bytes(&self.mime, &self.data)
    }

    /// Persist the payload to a fresh temporary file in the system temp dir.
    ///
    /// The file is removed when the returned handle is dropped or closed.
    pub fn to_tempfile(&self) -> ClipResult<NamedTempFile> {
        self.write_tempfile(None)
    }

    /// Like [`DataUri::to_tempfile`], but creates the file inside `dir`.
    pub fn to_tempfile_in(&self, dir: impl AsRef<Path>) -> ClipResult<NamedTempFile> {
        self.write_tempfile(Some(dir.as_ref()))
    }

    fn write_tempfile(&self, dir: Option<&Path>) -> ClipResult<NamedTempFile> {
        let suffix = format!(".{}", extension_for_mime(&self.mime));
        let mut builder = tempfile::Builder::new();
        builder.prefix("input-").suffix(&suffix);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| ClipError::io(Stage::InputDecode, e))?;

        file.write_all(&self.data)
            .and_then(|()| file.flush())
            .map_err(|e| ClipError::io(Stage::InputDecode, e))?;
        Ok(file)
    }
}

/// Encode a file as a data URI with an explicit MIME type.
pub fn encode(path: impl AsRef<Path>, mime: &str) -> ClipResult<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ClipError::io(Stage::OutputEncode, e))?;
    Ok(encode_bytes(mime, &bytes))
}

/// Encode a file as a data URI, inferring the MIME type from its extension.
pub fn encode_file(path: impl AsRef<Path>) -> ClipResult<String> {
    let path = path.as_ref();
    encode(path, mime_for_path(path))
}

pub fn encode_bytes(mime: &str, bytes: &[u8]) -> String {
    let payload = STANDARD.encode(bytes);
    let len = SCHEME.len() + mime.len() + BASE64_MARKER.len() + payload.len();
    let mut out = String::with_capacity(len);
    out.push_str(SCHEME);
    out.push_str(mime);
    out.push_str(BASE64_MARKER);
    out.push_str(&payload);
    out
}

/// Decode a data URI into a scoped temporary file.
pub fn decode_to_tempfile(uri: &str) -> ClipResult<NamedTempFile> {
    DataUri::parse(uri)?.to_tempfile()
}

/// Decoded payload size, computed without decoding.
///
/// Exact for padded base64; an upper bound otherwise.
pub fn estimated_decoded_len(uri: &str) -> ClipResult<u64> {
    let (_, payload) = split_uri(uri)?;
    let mut significant = 0u64;
    let mut padding = 0u64;
    for b in payload.bytes().filter(|b| !b.is_ascii_whitespace()) {
        significant += 1;
        if b == b'=' {
            padding += 1;
        }
    }
    Ok((significant.div_ceil(4) * 3).saturating_sub(padding.min(2)))
}

pub fn is_data_uri(s: &str) -> bool {
    s.get(..SCHEME.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(SCHEME))
}

fn split_uri(uri: &str) -> ClipResult<(&str, &str)> {
    let uri = uri.trim();
    if !is_data_uri(uri) {
        return Err(ClipError::format("not a data URI (missing 'data:' scheme)"));
    }
    let rest = &uri[SCHEME.len()..];
    let Some(marker) = find_base64_marker(rest) else {
        if rest.contains(',') {
            return Err(ClipError::format(
                "data URI payload must be base64-encoded (missing ';base64' marker)",
            ));
        }
        return Err(ClipError::format("data URI has no payload separator"));
    };

    let header = &rest[..marker];
    let payload = &rest[marker + BASE64_MARKER.len()..];
    let mime = header.split(';').next().unwrap_or_default().trim();
    if mime.is_empty() {
        return Ok((DEFAULT_MIME, payload));
    }
    if !mime.contains('/') || mime.contains(char::is_whitespace) {
        return Err(ClipError::format(format!("data URI has an invalid media type '{mime}'")));
    }
    Ok((mime, payload))
}

/// Byte offset of the first `;base64,`, matched ASCII case-insensitively.
fn find_base64_marker(rest: &str) -> Option<usize> {
    let marker = BASE64_MARKER.as_bytes();
    rest.as_bytes()
        .windows(marker.len())
        .position(|w| w.eq_ignore_ascii_case(marker))
}

fn decode_payload(payload: &str) -> ClipResult<Vec<u8>> {
    let decoded = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact)
    } else {
        STANDARD.decode(payload)
    };
    decoded.map_err(|e| ClipError::format(format!("data URI payload is not valid base64: {e}")))
}

/// MIME type for a file, by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => IMAGE_MIME,
        "png" => "image/png",
        "webp" => "image/webp",
        "mp3" => AUDIO_MIME,
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}

/// File extension used when a payload of `mime` is written to disk.
///
/// ffmpeg probes content, so this only has to be a reasonable hint.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.to_ascii_lowercase().as_str() {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        "video/x-msvideo" => "avi",
        "video/ogg" => "ogv",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    }
}

#[cfg(test)]
#[path = "../tests/unit/datauri.rs"]
mod tests;
