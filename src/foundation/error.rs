use std::fmt;

pub type ClipResult<T> = Result<T, ClipError>;

/// Step of the decode pipeline an error is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading the source file or decoding the input data URI.
    InputDecode,
    /// Creating the temporary workspace.
    Workspace,
    /// Extracting the audio track.
    AudioExtraction,
    /// Sampling still frames.
    FrameExtraction,
    /// Encoding outputs into data URIs.
    OutputEncode,
    /// Removing intermediate files.
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InputDecode => "input decode",
            Self::Workspace => "workspace setup",
            Self::AudioExtraction => "audio extraction",
            Self::FrameExtraction => "frame extraction",
            Self::OutputEncode => "output encode",
            Self::Cleanup => "cleanup",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ClipError {
    #[error("format error: {0}")]
    Format(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("transcode error during {stage}: {message}")]
    Transcode { stage: Stage, message: String },

    #[error("io error during {stage}: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClipError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transcode(stage: Stage, msg: impl Into<String>) -> Self {
        Self::Transcode {
            stage,
            message: msg.into(),
        }
    }

    pub fn io(stage: Stage, source: std::io::Error) -> Self {
        Self::Io { stage, source }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    pub fn is_transcode(&self) -> bool {
        matches!(self, Self::Transcode { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Pipeline stage the error was raised in, when it carries one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Transcode { stage, .. } | Self::Io { stage, .. } => Some(*stage),
            Self::Format(_) => Some(Stage::InputDecode),
            Self::Validation(_) | Self::Other(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
