//! Error types for the `framesnap` crate.
//!
//! Failures are split by pipeline stage. [`MetadataError`] covers opening a
//! video and reading its geometry, [`SamplingError`] covers seeking and
//! decoding, and [`EncodeError`] covers writing a still image. The
//! orchestrator folds all of them into [`ExtractionError`], the single failure
//! value returned by [`FrameExtractor::extract`](crate::FrameExtractor::extract).
//!
//! Per-frame failures (a single missed seek, a single failed write) are
//! absorbed by the pipeline and logged; only failures that leave nothing to
//! return reach the caller.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// Opening a video or deriving its geometry failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetadataError {
    /// The file could not be opened as a media container.
    #[error("Cannot open video at {path}: {reason}")]
    CannotOpen {
        /// Path that was passed to the reader.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container opened but holds no decodable video stream.
    #[error("No video stream found in {path}")]
    NoVideoStream {
        /// Path of the opened container.
        path: PathBuf,
    },

    /// The stream reports a non-positive frame rate, so no duration or
    /// timestamp conversion can be derived.
    #[error("Invalid frame rate {fps} in {path}")]
    InvalidFps {
        /// Path of the opened container.
        path: PathBuf,
        /// The frame rate the stream reported.
        fps: f64,
    },
}

/// Seeking or decoding failed.
///
/// [`SamplingError::Decode`] describes a single missed frame and is usually
/// absorbed by the samplers. [`SamplingError::NoUsableFrames`] means a sampler
/// produced nothing at all.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SamplingError {
    /// The decode handle could not be (re)opened.
    #[error(transparent)]
    Open(#[from] MetadataError),

    /// A specific frame could not be sought to or decoded.
    #[error("Failed to decode frame {frame_index}: {reason}")]
    Decode {
        /// Frame index that was requested.
        frame_index: u64,
        /// Underlying decoder message.
        reason: String,
    },

    /// Not a single requested frame could be decoded.
    #[error("No usable frame could be decoded ({requested} requested)")]
    NoUsableFrames {
        /// How many frames the sampler tried to decode.
        requested: usize,
    },
}

impl SamplingError {
    /// Build a [`SamplingError::Decode`] for `frame_index`.
    pub fn decode(frame_index: u64, reason: impl ToString) -> Self {
        SamplingError::Decode {
            frame_index,
            reason: reason.to_string(),
        }
    }
}

/// A still image could not be written.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// Compressing or writing the image file failed (disk full, permission,
    /// unsupported pixel layout).
    #[error("Failed to write frame image {path}: {reason}")]
    WriteFailed {
        /// Destination path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },
}

/// The single failure value of an extraction request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// The request itself is unusable (e.g. a frame count of zero).
    #[error("Invalid extraction request: {0}")]
    InvalidRequest(String),

    /// The output directory could not be created or read.
    #[error("Output directory {path} is unusable: {reason}")]
    OutputDirectory {
        /// The configured output directory.
        path: PathBuf,
        /// Underlying I/O reason.
        reason: String,
    },

    /// The video could not be opened or has no usable frame rate.
    #[error("Failed to get video information: {0}")]
    MetadataUnavailable(#[from] MetadataError),

    /// Sampling and encoding finished with zero frames.
    #[error("No frames extracted: {reason}")]
    NoFramesExtracted {
        /// What eliminated the result set.
        reason: String,
    },
}

impl ExtractionError {
    pub(crate) fn output_directory(path: impl Into<PathBuf>, error: &IoError) -> Self {
        ExtractionError::OutputDirectory {
            path: path.into(),
            reason: error.to_string(),
        }
    }
}

/// Sampling runs after the metadata step succeeded, so every sampling
/// failure, including a failed reopen of the video, ends the request as
/// [`ExtractionError::NoFramesExtracted`].
impl From<SamplingError> for ExtractionError {
    fn from(error: SamplingError) -> Self {
        ExtractionError::NoFramesExtracted {
            reason: error.to_string(),
        }
    }
}
