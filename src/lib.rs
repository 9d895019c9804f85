//! # framesnap
//!
//! Pick a handful of representative still frames from a video and write
//! them as JPEG files.
//!
//! Two selection strategies are available:
//!
//! - **Uniform time sampling** spreads `k` frames evenly across the middle
//!   80% of the video, skipping intros and credits.
//! - **Scene-change detection** samples about 1% of all frames, compares
//!   8×8×8 color histograms of neighbouring samples and keeps the largest
//!   visual jumps, at least 10 seconds apart. Shortfalls are filled with
//!   uniform samples.
//!
//! [`ExtractionMethod::Auto`] uses scene detection for videos longer than
//! five minutes and uniform sampling otherwise.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framesnap::{ExtractionMethod, ExtractionRequest, ExtractorConfig, FrameExtractor};
//!
//! let extractor = FrameExtractor::new(ExtractorConfig::new("frames"))?;
//! let report = extractor.extract("talk.mp4", &ExtractionRequest::new(ExtractionMethod::Auto, 4))?;
//! for frame in &report.frames {
//!     println!("{} at {} ({} bytes)", frame.file_name, frame.timestamp_label, frame.byte_size);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Housekeeping
//!
//! ```no_run
//! use framesnap::{ExtractorConfig, FrameExtractor};
//!
//! let extractor = FrameExtractor::new(ExtractorConfig::default())?;
//! let files = extractor.output_files()?;
//! let removed = extractor.delete(&files);
//! println!("removed {removed} of {} file(s)", files.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom decoders
//!
//! The pipeline decodes through the [`FrameSource`] and [`SourceOpener`]
//! traits. [`FfmpegOpener`] is the default; anything else that can seek to
//! a frame index and produce RGB8 pixels can be passed to
//! [`FrameExtractor::with_opener`].
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `FrameExtractor::extract_async` runs on Tokio's blocking pool |
//! | `rayon` | Scene analysis decodes on rayon workers, one source each |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
mod conversion;
pub mod encoder;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod histogram;
pub mod metadata;
#[cfg(feature = "rayon")]
mod parallel;
pub mod progress;
pub mod sampler;
pub mod scene;
pub mod selection;
pub mod source;
#[cfg(feature = "async")]
pub mod task;

pub use configuration::{
    DEFAULT_AUTO_SCENE_THRESHOLD_SECONDS, DEFAULT_EDGE_TRIM_RATIO, DEFAULT_FRAME_COUNT,
    DEFAULT_JPEG_QUALITY, DEFAULT_MIN_SCENE_SEPARATION_SECONDS, DEFAULT_OUTPUT_DIR,
    DEFAULT_SAMPLE_DIVISOR, ExtractionMethod, ExtractionRequest, ExtractorConfig,
    SamplingStrategy,
};
pub use conversion::{frame_index_to_seconds, seconds_to_frame_index};
pub use encoder::{ExtractedFrame, FrameEncoder, frame_file_name, timestamp_label};
pub use error::{EncodeError, ExtractionError, MetadataError, SamplingError};
pub use extractor::{
    ExtractionReport, ExtractionResult, FrameExtractor, delete_files, list_output_files,
    select_strategy,
};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use histogram::ColorHistogram;
pub use metadata::{VideoMetadata, VideoMetadataReader};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{UniformTimeSampler, uniform_timestamps};
pub use scene::{SceneChangeDetector, score_samples};
pub use selection::{
    DecodedFrame, SceneCandidate, SelectedFrame, decluster, merge_with_fallback, number_frames,
};
pub use source::{FfmpegOpener, FfmpegSource, FrameSource, SourceOpener};
#[cfg(feature = "async")]
pub use task::ExtractionFuture;
