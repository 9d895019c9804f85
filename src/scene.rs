//! Scene-change detection.
//!
//! The detector samples one frame every `max(1, frames / divisor)` frames,
//! summarises each sample as a joint color histogram and scores it against
//! the previous sample. The highest-scoring points, kept apart by a minimum
//! temporal separation, become the selected frames. If that leaves the
//! request short, uniform time sampling fills the gap.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framesnap::{FfmpegOpener, SceneChangeDetector, VideoMetadataReader};
//!
//! let path = Path::new("lecture.mp4");
//! let metadata = VideoMetadataReader::read(path)?;
//! let frames = SceneChangeDetector::new().detect(&FfmpegOpener, path, &metadata, 6)?;
//! for decoded in &frames {
//!     println!(
//!         "#{} at {:.1}s (score {:?})",
//!         decoded.frame.ordinal, decoded.frame.timestamp_seconds, decoded.frame.change_score,
//!     );
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::Path,
    sync::Arc,
};

use crate::configuration::{DEFAULT_MIN_SCENE_SEPARATION_SECONDS, DEFAULT_SAMPLE_DIVISOR};
use crate::conversion::frame_index_to_seconds;
use crate::error::SamplingError;
use crate::histogram::ColorHistogram;
use crate::metadata::VideoMetadata;
use crate::progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker};
use crate::sampler::UniformTimeSampler;
use crate::selection::{DecodedFrame, SceneCandidate, SelectedFrame, decluster, merge_with_fallback};
use crate::source::{FrameSource, SourceOpener};

/// Finds representative frames at points of maximal visual change.
#[derive(Clone)]
pub struct SceneChangeDetector {
    sample_divisor: u64,
    min_separation_seconds: f64,
    fallback: UniformTimeSampler,
    progress: Arc<dyn ProgressCallback>,
}

impl Debug for SceneChangeDetector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SceneChangeDetector")
            .field("sample_divisor", &self.sample_divisor)
            .field("min_separation_seconds", &self.min_separation_seconds)
            .finish_non_exhaustive()
    }
}

impl Default for SceneChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneChangeDetector {
    /// Create a detector sampling 1% of frames with a 10-second minimum
    /// separation.
    pub fn new() -> Self {
        Self {
            sample_divisor: DEFAULT_SAMPLE_DIVISOR,
            min_separation_seconds: DEFAULT_MIN_SCENE_SEPARATION_SECONDS,
            fallback: UniformTimeSampler::new(),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the sampling divisor. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_sample_divisor(mut self, divisor: u64) -> Self {
        self.sample_divisor = divisor.max(1);
        self
    }

    /// Set the minimum distance between two selected frames.
    #[must_use]
    pub fn with_min_separation(mut self, seconds: f64) -> Self {
        self.min_separation_seconds = seconds;
        self
    }

    /// Use `sampler` to fill any shortfall.
    #[must_use]
    pub fn with_fallback(mut self, sampler: UniformTimeSampler) -> Self {
        self.fallback = sampler;
        self
    }

    /// Report analysis and decode progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Distance in frames between two analysed samples.
    pub fn sample_stride(&self, total_frame_count: u64) -> u64 {
        (total_frame_count / self.sample_divisor).max(1)
    }

    /// Frame indices visited by the analysis pass: `0, s, 2s, …` below the
    /// total frame count.
    pub fn sample_indices(&self, metadata: &VideoMetadata) -> Vec<u64> {
        let stride = self.sample_stride(metadata.total_frame_count) as usize;
        (0..metadata.total_frame_count).step_by(stride).collect()
    }

    /// Run the analysis pass over `source` and score every sample after the
    /// first against its predecessor.
    ///
    /// The pass stops at the first sample that cannot be decoded; everything
    /// scored up to that point is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::NoUsableFrames`] if not a single sample
    /// could be decoded.
    pub fn analyze<S>(
        &self,
        source: &mut S,
        metadata: &VideoMetadata,
    ) -> Result<Vec<SceneCandidate>, SamplingError>
    where
        S: FrameSource + ?Sized,
    {
        let indices = self.sample_indices(metadata);
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.progress),
            OperationType::SceneAnalysis,
            Some(indices.len() as u64),
        );

        let mut samples = Vec::with_capacity(indices.len());
        source.scan(&indices, &mut |frame_index, image| {
            samples.push((frame_index, ColorHistogram::from_image(&image)));
            tracker.advance(Some(frame_index));
        })?;

        self.finish_analysis(&samples, metadata, indices.len())
    }

    /// Full detection: analyse, de-cluster, decode the picks and top up
    /// with uniform samples.
    ///
    /// Selected frames are decoded through a fresh handle with one direct
    /// seek each. A pick that fails to decode is dropped and counted towards
    /// the shortfall. The result is in timestamp order with ordinals
    /// `1..=N`, `N <= frame_count`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::Open`] if `path` cannot be opened, or
    /// [`SamplingError::NoUsableFrames`] if neither detection nor the
    /// fallback produced a frame.
    pub fn detect<O>(
        &self,
        opener: &O,
        path: &Path,
        metadata: &VideoMetadata,
        frame_count: usize,
    ) -> Result<Vec<DecodedFrame>, SamplingError>
    where
        O: SourceOpener,
    {
        let candidates = self.analyze_path(opener, path, metadata)?;
        let picks = decluster(candidates, frame_count, self.min_separation_seconds);
        log::debug!(
            "Selected {} scene candidate(s) at {:?}",
            picks.len(),
            picks
                .iter()
                .map(|pick| pick.timestamp_seconds)
                .collect::<Vec<_>>(),
        );

        let mut source = opener.open(path)?;
        let scene_frames = self.decode_picks(&mut source, &picks);

        let frames = merge_with_fallback(scene_frames, frame_count, |count| {
            self.fallback
                .sample(&mut source, metadata, count)
                .unwrap_or_else(|error| {
                    log::warn!("Uniform fallback produced nothing: {error}");
                    Vec::new()
                })
        });

        if frames.is_empty() && frame_count > 0 {
            return Err(SamplingError::NoUsableFrames {
                requested: frame_count,
            });
        }
        Ok(frames)
    }

    #[cfg(not(feature = "rayon"))]
    fn analyze_path<O: SourceOpener>(
        &self,
        opener: &O,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<Vec<SceneCandidate>, SamplingError> {
        let mut source = opener.open(path)?;
        self.analyze(&mut source, metadata)
    }

    #[cfg(feature = "rayon")]
    fn analyze_path<O: SourceOpener>(
        &self,
        opener: &O,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<Vec<SceneCandidate>, SamplingError> {
        let indices = self.sample_indices(metadata);
        let samples =
            crate::parallel::parallel_histograms(opener, path, &indices, &self.progress)?;
        self.finish_analysis(&samples, metadata, indices.len())
    }

    fn finish_analysis(
        &self,
        samples: &[(u64, ColorHistogram)],
        metadata: &VideoMetadata,
        requested: usize,
    ) -> Result<Vec<SceneCandidate>, SamplingError> {
        if samples.is_empty() {
            return Err(SamplingError::NoUsableFrames { requested });
        }
        log::debug!(
            "Analysed {}/{} sample(s) with stride {}",
            samples.len(),
            requested,
            self.sample_stride(metadata.total_frame_count),
        );
        Ok(score_samples(samples, metadata.fps))
    }

    fn decode_picks<S>(&self, source: &mut S, picks: &[SceneCandidate]) -> Vec<DecodedFrame>
    where
        S: FrameSource + ?Sized,
    {
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.progress),
            OperationType::FrameDecoding,
            Some(picks.len() as u64),
        );

        let mut frames = Vec::with_capacity(picks.len());
        for pick in picks {
            match source.decode_frame(pick.frame_index) {
                Ok(image) => frames.push(DecodedFrame {
                    frame: SelectedFrame {
                        ordinal: 0,
                        timestamp_seconds: pick.timestamp_seconds,
                        change_score: Some(pick.change_score),
                    },
                    frame_index: pick.frame_index,
                    image,
                }),
                Err(error) => log::warn!(
                    "Dropping scene frame at {:.2}s: {error}",
                    pick.timestamp_seconds
                ),
            }
            tracker.advance(Some(pick.frame_index));
        }
        frames
    }
}

/// Score consecutive samples: each sample after the first becomes a
/// candidate whose score is `1 - correlation` with its predecessor.
pub fn score_samples(samples: &[(u64, ColorHistogram)], fps: f64) -> Vec<SceneCandidate> {
    samples
        .windows(2)
        .map(|pair| {
            let (_, previous) = &pair[0];
            let (frame_index, current) = &pair[1];
            SceneCandidate {
                frame_index: *frame_index,
                timestamp_seconds: frame_index_to_seconds(*frame_index, fps),
                change_score: current.change_score(previous),
            }
        })
        .collect()
}
