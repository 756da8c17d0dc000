use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::HashConfig;

/// An error that prevented an analysis (or a single comparison) from completing.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// The frame source could not be opened or queried. Fatal to the whole analysis.
    #[error("Frame source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single frame could not be decoded. The engines skip such frames.
    #[error("Failed to decode frame {index}")]
    FrameDecodeGap { index: u64 },

    /// Two fingerprints created with different hash configurations were compared.
    #[error("Cannot compare fingerprints from different hash configurations ({left} vs {right})")]
    ConfigurationMismatch { left: HashConfig, right: HashConfig },

    /// Structural similarity could not be computed for a pair of images.
    #[error("Structural similarity failed: {0}")]
    ComparisonFailure(String),

    /// An option was outside of its permitted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why a single frame could not be returned by a [`crate::FrameSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameError {
    #[error("frame {index} is past the end of the video")]
    OutOfRange { index: u64 },

    #[error("failed to decode frame {index}: {reason}")]
    Decode { index: u64, reason: String },
}

impl FrameError {
    /// The index of the frame that could not be read.
    #[must_use]
    pub fn index(&self) -> u64 {
        match self {
            Self::OutOfRange { index } | Self::Decode { index, .. } => *index,
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::FrameDecodeGap { index: e.index() }
    }
}
