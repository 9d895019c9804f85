//! Extraction configuration.
//!
//! [`ExtractorConfig`] holds the engine-wide settings (output directory,
//! encoder quality, selection policy constants, progress reporting) and is
//! consumed once by [`FrameExtractor::new`](crate::FrameExtractor::new).
//! [`ExtractionRequest`] describes a single call.
//!
//! # Example
//!
//! ```no_run
//! use framesnap::{ExtractionMethod, ExtractionRequest, ExtractorConfig};
//!
//! let config = ExtractorConfig::new("frames")
//!     .with_jpeg_quality(90)
//!     .with_min_scene_separation(5.0);
//! let request = ExtractionRequest::new(ExtractionMethod::Auto, 6).with_title("Launch video");
//! ```

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use crate::error::ExtractionError;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "temp/extracted_frames";

/// Default JPEG quality on a 0–100 scale.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Videos longer than this (in seconds) use scene detection under
/// [`ExtractionMethod::Auto`].
pub const DEFAULT_AUTO_SCENE_THRESHOLD_SECONDS: f64 = 300.0;

/// Minimum distance in seconds between two scene-selected frames.
pub const DEFAULT_MIN_SCENE_SEPARATION_SECONDS: f64 = 10.0;

/// Scene analysis samples `1 / DEFAULT_SAMPLE_DIVISOR` of all frames.
pub const DEFAULT_SAMPLE_DIVISOR: u64 = 100;

/// Fraction trimmed from each end of the video for uniform sampling.
pub const DEFAULT_EDGE_TRIM_RATIO: f64 = 0.1;

/// Frame count used when a caller does not specify one.
pub const DEFAULT_FRAME_COUNT: u32 = 4;

/// How frames should be chosen, as requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtractionMethod {
    /// Evenly spaced timestamps across the middle of the video.
    Time,
    /// Points of maximal color-histogram change.
    Scene,
    /// Scene detection for long videos, uniform sampling otherwise.
    #[default]
    Auto,
}

impl Display for ExtractionMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            ExtractionMethod::Time => "time",
            ExtractionMethod::Scene => "scene",
            ExtractionMethod::Auto => "auto",
        })
    }
}

impl FromStr for ExtractionMethod {
    type Err = ExtractionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(ExtractionMethod::Time),
            "scene" => Ok(ExtractionMethod::Scene),
            "auto" => Ok(ExtractionMethod::Auto),
            other => Err(ExtractionError::InvalidRequest(format!(
                "unknown extraction method '{other}' (expected time, scene or auto)"
            ))),
        }
    }
}

/// The sampler that actually ran for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplingStrategy {
    /// Uniform time sampling.
    Time,
    /// Scene-change detection (possibly supplemented by uniform picks).
    Scene,
}

impl Display for SamplingStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            SamplingStrategy::Time => "time",
            SamplingStrategy::Scene => "scene",
        })
    }
}

/// A single extraction call.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ExtractionRequest {
    /// Requested selection method.
    pub method: ExtractionMethod,
    /// How many frames to return at most. Must be at least 1.
    pub frame_count: u32,
    /// Display title supplied by whoever fetched the video. Reporting only.
    pub title: Option<String>,
}

impl Default for ExtractionRequest {
    fn default() -> Self {
        Self::new(ExtractionMethod::Auto, DEFAULT_FRAME_COUNT)
    }
}

impl ExtractionRequest {
    /// Create a request for `frame_count` frames using `method`.
    pub fn new(method: ExtractionMethod, frame_count: u32) -> Self {
        Self {
            method,
            frame_count,
            title: None,
        }
    }

    /// Attach a display title that is echoed back in the report.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ExtractionError> {
        if self.frame_count == 0 {
            return Err(ExtractionError::InvalidRequest(
                "frame_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Engine-wide settings.
///
/// A default-constructed config writes 85-quality JPEGs to
/// [`DEFAULT_OUTPUT_DIR`] with unique file names.
#[derive(Clone)]
pub struct ExtractorConfig {
    pub(crate) output_dir: PathBuf,
    pub(crate) jpeg_quality: u8,
    pub(crate) auto_scene_threshold_seconds: f64,
    pub(crate) min_scene_separation_seconds: f64,
    pub(crate) sample_divisor: u64,
    pub(crate) edge_trim_ratio: f64,
    pub(crate) unique_file_names: bool,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ExtractorConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractorConfig")
            .field("output_dir", &self.output_dir)
            .field("jpeg_quality", &self.jpeg_quality)
            .field(
                "auto_scene_threshold_seconds",
                &self.auto_scene_threshold_seconds,
            )
            .field(
                "min_scene_separation_seconds",
                &self.min_scene_separation_seconds,
            )
            .field("sample_divisor", &self.sample_divisor)
            .field("edge_trim_ratio", &self.edge_trim_ratio)
            .field("unique_file_names", &self.unique_file_names)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl ExtractorConfig {
    /// Create a configuration writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            auto_scene_threshold_seconds: DEFAULT_AUTO_SCENE_THRESHOLD_SECONDS,
            min_scene_separation_seconds: DEFAULT_MIN_SCENE_SEPARATION_SECONDS,
            sample_divisor: DEFAULT_SAMPLE_DIVISOR,
            edge_trim_ratio: DEFAULT_EDGE_TRIM_RATIO,
            unique_file_names: true,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Set the JPEG quality. Clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set the duration above which [`ExtractionMethod::Auto`] picks scene
    /// detection. The comparison is strict.
    #[must_use]
    pub fn with_auto_scene_threshold(mut self, seconds: f64) -> Self {
        self.auto_scene_threshold_seconds = seconds.max(0.0);
        self
    }

    /// Set the minimum distance between scene-selected frames.
    #[must_use]
    pub fn with_min_scene_separation(mut self, seconds: f64) -> Self {
        self.min_scene_separation_seconds = seconds.max(0.0);
        self
    }

    /// Set the sampling divisor for scene analysis
    /// (`stride = max(1, frames / divisor)`). Clamped to a minimum of 1.
    #[must_use]
    pub fn with_sample_divisor(mut self, divisor: u64) -> Self {
        self.sample_divisor = divisor.max(1);
        self
    }

    /// Set the fraction trimmed from each end for uniform sampling.
    /// Clamped to `0.0..0.5`.
    #[must_use]
    pub fn with_edge_trim_ratio(mut self, ratio: f64) -> Self {
        self.edge_trim_ratio = ratio.clamp(0.0, 0.49);
        self
    }

    /// Insert a per-request token into file names so that concurrent
    /// requests on identically named videos never overwrite each other.
    /// Enabled by default.
    #[must_use]
    pub fn with_unique_file_names(mut self, unique: bool) -> Self {
        self.unique_file_names = unique;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The configured output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The configured JPEG quality.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Duration threshold for [`ExtractionMethod::Auto`].
    pub fn auto_scene_threshold(&self) -> f64 {
        self.auto_scene_threshold_seconds
    }

    /// Minimum distance between scene-selected frames.
    pub fn min_scene_separation(&self) -> f64 {
        self.min_scene_separation_seconds
    }

    /// Scene analysis sampling divisor.
    pub fn sample_divisor(&self) -> u64 {
        self.sample_divisor
    }

    /// Edge trim ratio used by uniform sampling.
    pub fn edge_trim_ratio(&self) -> f64 {
        self.edge_trim_ratio
    }

    /// Whether file names carry a per-request token.
    pub fn unique_file_names(&self) -> bool {
        self.unique_file_names
    }
}
