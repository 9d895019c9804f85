//! Uniform time sampling.
//!
//! Picks evenly spaced timestamps across the "effective window" of a video,
//! the middle portion that skips intros and credits, and decodes the frame
//! nearest each one.

use std::sync::Arc;

use crate::configuration::DEFAULT_EDGE_TRIM_RATIO;
use crate::conversion::seconds_to_frame_index;
use crate::error::SamplingError;
use crate::metadata::VideoMetadata;
use crate::progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker};
use crate::selection::{DecodedFrame, SelectedFrame};
use crate::source::FrameSource;

/// Compute `frame_count` evenly spaced timestamps.
///
/// For `frame_count > 1` the points span
/// `[edge_trim_ratio · D, (1 - edge_trim_ratio) · D]` inclusive of both ends.
/// A single frame is always taken at `D / 2`, ignoring the trim.
///
/// ```
/// let timestamps = framesnap::uniform_timestamps(100.0, 4, 0.1);
/// assert_eq!(timestamps.len(), 4);
/// assert!((timestamps[0] - 10.0).abs() < 1e-9);
/// assert!((timestamps[3] - 90.0).abs() < 1e-9);
/// ```
pub fn uniform_timestamps(duration_seconds: f64, frame_count: usize, edge_trim_ratio: f64) -> Vec<f64> {
    match frame_count {
        0 => Vec::new(),
        1 => vec![duration_seconds / 2.0],
        _ => {
            let start = duration_seconds * edge_trim_ratio;
            let end = duration_seconds * (1.0 - edge_trim_ratio);
            let step = (end - start) / (frame_count - 1) as f64;
            (0..frame_count)
                .map(|position| start + step * position as f64)
                .collect()
        }
    }
}

/// Samples frames at uniform timestamps.
///
/// # Example
///
/// ```no_run
/// use framesnap::{FfmpegSource, FrameSource, UniformTimeSampler};
///
/// let mut source = FfmpegSource::open("input.mp4")?;
/// let metadata = source.metadata().clone();
/// let frames = UniformTimeSampler::new().sample(&mut source, &metadata, 4)?;
/// for decoded in &frames {
///     println!("#{} at {:.1}s", decoded.frame.ordinal, decoded.frame.timestamp_seconds);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct UniformTimeSampler {
    edge_trim_ratio: f64,
    progress: Arc<dyn ProgressCallback>,
}

impl Default for UniformTimeSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformTimeSampler {
    /// Create a sampler trimming the default 10% from each end.
    pub fn new() -> Self {
        Self {
            edge_trim_ratio: DEFAULT_EDGE_TRIM_RATIO,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the fraction trimmed from each end.
    #[must_use]
    pub fn with_edge_trim_ratio(mut self, ratio: f64) -> Self {
        self.edge_trim_ratio = ratio;
        self
    }

    /// Report decode progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The timestamps [`sample`](UniformTimeSampler::sample) would decode.
    pub fn timestamps(&self, metadata: &VideoMetadata, frame_count: usize) -> Vec<f64> {
        uniform_timestamps(metadata.duration_seconds, frame_count, self.edge_trim_ratio)
    }

    /// Decode one frame per uniform timestamp, in ascending order.
    ///
    /// A timestamp whose seek or decode fails is skipped, so the result may
    /// hold fewer than `frame_count` frames. Ordinals are assigned
    /// `1..=N` over the frames that did decode.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::NoUsableFrames`] when frames were requested
    /// but none could be decoded.
    pub fn sample<S>(
        &self,
        source: &mut S,
        metadata: &VideoMetadata,
        frame_count: usize,
    ) -> Result<Vec<DecodedFrame>, SamplingError>
    where
        S: FrameSource + ?Sized,
    {
        let timestamps = self.timestamps(metadata, frame_count);
        log::debug!(
            "Uniform sampling {} frame(s) over {:.2}s: {:?}",
            frame_count,
            metadata.duration_seconds,
            timestamps,
        );

        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.progress),
            OperationType::FrameDecoding,
            Some(timestamps.len() as u64),
        );

        let mut frames = Vec::with_capacity(timestamps.len());
        for timestamp_seconds in timestamps {
            let frame_index =
                seconds_to_frame_index(timestamp_seconds, metadata.fps, metadata.total_frame_count);
            match source.decode_frame(frame_index) {
                Ok(image) => frames.push(DecodedFrame {
                    frame: SelectedFrame {
                        ordinal: frames.len() as u32 + 1,
                        timestamp_seconds,
                        change_score: None,
                    },
                    frame_index,
                    image,
                }),
                Err(error) => log::warn!(
                    "Skipping frame at {timestamp_seconds:.2}s (index {frame_index}): {error}"
                ),
            }
            tracker.advance(Some(frame_index));
        }

        if frames.is_empty() && frame_count > 0 {
            return Err(SamplingError::NoUsableFrames {
                requested: frame_count,
            });
        }

        Ok(frames)
    }
}
