//! Video geometry.
//!
//! [`VideoMetadataReader`] opens a video, reads its frame count, frame rate
//! and resolution, and closes the handle again before returning. The
//! resulting [`VideoMetadata`] is owned and independent of any decoder.

use std::path::Path;

use crate::error::MetadataError;
use crate::source::{FfmpegOpener, FrameSource, SourceOpener};

/// Geometry of a video stream.
///
/// Recomputed for every extraction request; nothing here is cached across
/// calls.
///
/// # Example
///
/// ```no_run
/// use framesnap::VideoMetadataReader;
///
/// let metadata = VideoMetadataReader::read("input.mp4")?;
/// println!("{} frames @ {:.2} fps ({})", metadata.total_frame_count, metadata.fps, metadata.duration_label());
/// # Ok::<(), framesnap::MetadataError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Number of frames in the stream (reported or estimated from duration).
    pub total_frame_count: u64,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub fps: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// `total_frame_count / fps`, or `0.0` when the frame rate is unusable.
    pub duration_seconds: f64,
}

impl VideoMetadata {
    /// Build metadata from raw stream geometry, deriving the duration.
    pub fn new(total_frame_count: u64, fps: f64, width: u32, height: u32) -> Self {
        let duration_seconds = if fps > 0.0 {
            total_frame_count as f64 / fps
        } else {
            0.0
        };
        Self {
            total_frame_count,
            fps,
            width,
            height,
            duration_seconds,
        }
    }

    /// Duration formatted as `H:MM:SS` (whole seconds).
    pub fn duration_label(&self) -> String {
        crate::encoder::timestamp_label(self.duration_seconds)
    }
}

/// Reads [`VideoMetadata`] with a scoped decode handle.
///
/// The handle opened for reading is dropped before `read` returns, on every
/// path.
pub struct VideoMetadataReader;

impl VideoMetadataReader {
    /// Read the geometry of the video at `path` using FFmpeg.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::CannotOpen`] if the file cannot be opened.
    /// - [`MetadataError::NoVideoStream`] if it has no video stream.
    /// - [`MetadataError::InvalidFps`] if the frame rate is not positive.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<VideoMetadata, MetadataError> {
        Self::read_with(&FfmpegOpener, path)
    }

    /// Read the geometry of the video at `path` through `opener`.
    ///
    /// # Errors
    ///
    /// Same as [`read`](VideoMetadataReader::read).
    pub fn read_with<O, P>(opener: &O, path: P) -> Result<VideoMetadata, MetadataError>
    where
        O: SourceOpener,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let metadata = {
            let source = opener.open(path)?;
            source.metadata().clone()
        };

        if metadata.fps.is_nan() || metadata.fps <= 0.0 {
            log::warn!(
                "Rejecting {}: frame rate {} is not positive",
                path.display(),
                metadata.fps
            );
            return Err(MetadataError::InvalidFps {
                path: path.to_path_buf(),
                fps: metadata.fps,
            });
        }

        log::debug!(
            "Read metadata for {}: {} frames, {:.2} fps, {}x{}, {:.2}s",
            path.display(),
            metadata.total_frame_count,
            metadata.fps,
            metadata.width,
            metadata.height,
            metadata.duration_seconds,
        );

        Ok(metadata)
    }
}
