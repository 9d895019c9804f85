//! Extraction orchestration.
//!
//! [`FrameExtractor`] is the entry point of the crate. One call to
//! [`extract`](FrameExtractor::extract) reads the video's metadata, picks a
//! sampler, decodes the selected frames, writes them as JPEG files and
//! returns an [`ExtractionReport`] describing everything it produced.
//!
//! An extractor holds no per-request state and can be shared between
//! threads; concurrent requests only share the output directory.
//!
//! # Example
//!
//! ```no_run
//! use framesnap::{ExtractionMethod, ExtractionRequest, ExtractorConfig, FrameExtractor};
//!
//! let extractor = FrameExtractor::new(ExtractorConfig::new("frames"))?;
//! let report = extractor.extract("talk.mp4", &ExtractionRequest::new(ExtractionMethod::Auto, 4))?;
//!
//! println!(
//!     "{} frame(s) via {} in {:.2}s",
//!     report.frames_extracted(),
//!     report.method_used,
//!     report.elapsed_seconds,
//! );
//! for frame in &report.frames {
//!     println!("{} @ {}", frame.file_name, frame.timestamp_label);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    collections::hash_map::DefaultHasher,
    fs,
    hash::{Hash, Hasher},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::configuration::{ExtractionMethod, ExtractionRequest, ExtractorConfig, SamplingStrategy};
use crate::encoder::{ExtractedFrame, FrameEncoder};
use crate::error::{ExtractionError, SamplingError};
use crate::metadata::{VideoMetadata, VideoMetadataReader};
use crate::progress::{OperationType, ProgressTracker};
use crate::sampler::UniformTimeSampler;
use crate::scene::SceneChangeDetector;
use crate::selection::DecodedFrame;
use crate::source::{FfmpegOpener, SourceOpener};

/// Outcome of a successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// The sampler that actually ran.
    pub method_used: SamplingStrategy,
    /// Wall-clock duration of the whole request.
    pub elapsed_seconds: f64,
    /// Geometry of the source video.
    pub metadata: VideoMetadata,
    /// Written frames in timestamp order, ordinals `1..=N`.
    pub frames: Vec<ExtractedFrame>,
    /// Sum of the written file sizes.
    pub total_bytes: u64,
    /// Title supplied with the request, if any.
    pub title: Option<String>,
}

impl ExtractionReport {
    /// Number of frames written.
    pub fn frames_extracted(&self) -> usize {
        self.frames.len()
    }
}

/// Result of [`FrameExtractor::extract`].
pub type ExtractionResult = Result<ExtractionReport, ExtractionError>;

/// Resolve a requested method against the video duration.
///
/// [`ExtractionMethod::Auto`] picks scene detection only when the duration
/// is strictly greater than `threshold_seconds`.
///
/// ```
/// use framesnap::{ExtractionMethod, SamplingStrategy, select_strategy};
///
/// assert_eq!(select_strategy(ExtractionMethod::Auto, 300.0, 300.0), SamplingStrategy::Time);
/// assert_eq!(select_strategy(ExtractionMethod::Auto, 301.0, 300.0), SamplingStrategy::Scene);
/// assert_eq!(select_strategy(ExtractionMethod::Scene, 5.0, 300.0), SamplingStrategy::Scene);
/// ```
pub fn select_strategy(
    method: ExtractionMethod,
    duration_seconds: f64,
    threshold_seconds: f64,
) -> SamplingStrategy {
    match method {
        ExtractionMethod::Time => SamplingStrategy::Time,
        ExtractionMethod::Scene => SamplingStrategy::Scene,
        ExtractionMethod::Auto if duration_seconds > threshold_seconds => SamplingStrategy::Scene,
        ExtractionMethod::Auto => SamplingStrategy::Time,
    }
}

/// Extracts representative frames from videos into one output directory.
#[derive(Debug, Clone)]
pub struct FrameExtractor<O: SourceOpener = FfmpegOpener> {
    config: ExtractorConfig,
    encoder: FrameEncoder,
    opener: O,
}

impl FrameExtractor<FfmpegOpener> {
    /// Create an FFmpeg-backed extractor, creating the output directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::OutputDirectory`] if the directory cannot
    /// be created.
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractionError> {
        Self::with_opener(config, FfmpegOpener)
    }
}

impl<O: SourceOpener> FrameExtractor<O> {
    /// Create an extractor that opens videos through `opener`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::OutputDirectory`] if the directory cannot
    /// be created.
    pub fn with_opener(config: ExtractorConfig, opener: O) -> Result<Self, ExtractionError> {
        fs::create_dir_all(&config.output_dir)
            .map_err(|error| ExtractionError::output_directory(&config.output_dir, &error))?;
        let encoder = FrameEncoder::new(&config.output_dir).with_quality(config.jpeg_quality);
        log::debug!("Frame extractor ready: {config:?}");
        Ok(Self {
            config,
            encoder,
            opener,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Directory frames are written to.
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Extract representative frames from `video_path`.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::InvalidRequest`] for a zero frame count.
    /// - [`ExtractionError::MetadataUnavailable`] if the video cannot be
    ///   opened or reports no usable frame rate. No file is written.
    /// - [`ExtractionError::NoFramesExtracted`] if the video cannot be
    ///   reopened for sampling, or every frame failed to decode or encode.
    pub fn extract<P: AsRef<Path>>(
        &self,
        video_path: P,
        request: &ExtractionRequest,
    ) -> ExtractionResult {
        let started = Instant::now();
        let video_path = video_path.as_ref();
        request.validate()?;

        log::info!(
            "Extracting {} frame(s) from {} (method: {})",
            request.frame_count,
            video_path.display(),
            request.method,
        );

        let metadata = VideoMetadataReader::read_with(&self.opener, video_path)?;
        let strategy = select_strategy(
            request.method,
            metadata.duration_seconds,
            self.config.auto_scene_threshold_seconds,
        );
        log::info!(
            "Video: {}x{}, {:.2} fps, {} ({} frames); using {} sampling",
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.duration_label(),
            metadata.total_frame_count,
            strategy,
        );

        let decoded = self.sample(strategy, video_path, &metadata, request.frame_count as usize)?;
        let video_name = self.output_name(video_path);
        let frames = self.encode_all(&video_name, decoded);
        if frames.is_empty() {
            return Err(ExtractionError::NoFramesExtracted {
                reason: "every selected frame failed to encode".to_string(),
            });
        }

        let total_bytes: u64 = frames.iter().map(|frame| frame.byte_size).sum();
        let elapsed_seconds = started.elapsed().as_secs_f64();
        log::info!(
            "Extracted {} frame(s) ({} bytes) in {:.2}s",
            frames.len(),
            total_bytes,
            elapsed_seconds,
        );

        Ok(ExtractionReport {
            method_used: strategy,
            elapsed_seconds,
            metadata,
            frames,
            total_bytes,
            title: request.title.clone(),
        })
    }

    fn sample(
        &self,
        strategy: SamplingStrategy,
        video_path: &Path,
        metadata: &VideoMetadata,
        frame_count: usize,
    ) -> Result<Vec<DecodedFrame>, SamplingError> {
        let uniform = UniformTimeSampler::new()
            .with_edge_trim_ratio(self.config.edge_trim_ratio)
            .with_progress(Arc::clone(&self.config.progress));

        match strategy {
            SamplingStrategy::Time => {
                let mut source = self.opener.open(video_path)?;
                uniform.sample(&mut source, metadata, frame_count)
            }
            SamplingStrategy::Scene => SceneChangeDetector::new()
                .with_sample_divisor(self.config.sample_divisor)
                .with_min_separation(self.config.min_scene_separation_seconds)
                .with_fallback(uniform)
                .with_progress(Arc::clone(&self.config.progress))
                .detect(&self.opener, video_path, metadata, frame_count),
        }
    }

    /// Encode in timestamp order. Ordinals are reassigned over the frames
    /// that actually get written so they stay contiguous.
    fn encode_all(&self, video_name: &str, decoded: Vec<DecodedFrame>) -> Vec<ExtractedFrame> {
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.config.progress),
            OperationType::FrameEncoding,
            Some(decoded.len() as u64),
        );

        let mut frames: Vec<ExtractedFrame> = Vec::with_capacity(decoded.len());
        for DecodedFrame {
            mut frame,
            frame_index,
            image,
        } in decoded
        {
            frame.ordinal = frames.len() as u32 + 1;
            match self.encoder.encode(&image, video_name, &frame) {
                Ok(extracted) => frames.push(extracted),
                Err(error) => log::warn!("Skipping frame {frame_index}: {error}"),
            }
            tracker.advance(Some(frame_index));
        }
        frames
    }

    fn output_name(&self, video_path: &Path) -> String {
        let stem = video_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "video".to_string());
        if self.config.unique_file_names {
            format!("{stem}-{}", request_token())
        } else {
            stem
        }
    }

    /// JPEG files currently in the output directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::OutputDirectory`] if the directory cannot
    /// be read.
    pub fn output_files(&self) -> Result<Vec<PathBuf>, ExtractionError> {
        list_output_files(&self.config.output_dir)
    }

    /// Delete the given files and return how many were actually removed.
    ///
    /// See [`delete_files`].
    pub fn delete<I, P>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        delete_files(paths)
    }

    /// Delete every JPEG file in the output directory.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::OutputDirectory`] if the directory cannot
    /// be read.
    pub fn purge(&self) -> Result<usize, ExtractionError> {
        let files = self.output_files()?;
        let removed = self.delete(&files);
        log::info!(
            "Purged {removed} file(s) from {}",
            self.config.output_dir.display()
        );
        Ok(removed)
    }
}

/// JPEG files in `output_dir`, sorted by name.
///
/// Only reads the directory; unlike [`FrameExtractor::new`] it never
/// creates it.
///
/// # Errors
///
/// Returns [`ExtractionError::OutputDirectory`] if the directory does not
/// exist or cannot be read.
pub fn list_output_files<P: AsRef<Path>>(output_dir: P) -> Result<Vec<PathBuf>, ExtractionError> {
    let output_dir = output_dir.as_ref();
    let entries = fs::read_dir(output_dir)
        .map_err(|error| ExtractionError::output_directory(output_dir, &error))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_jpeg_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

/// Delete `paths` and return how many files were actually removed.
///
/// Paths that do not exist are skipped silently. Other failures are logged
/// and not counted.
pub fn delete_files<I, P>(paths: I) -> usize
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut removed = 0;
    for path in paths {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => {
                log::debug!("Deleted {}", path.display());
                removed += 1;
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => log::warn!("Failed to delete {}: {error}", path.display()),
        }
    }
    removed
}

fn has_jpeg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extension.eq_ignore_ascii_case("jpg") || extension.eq_ignore_ascii_case("jpeg")
        })
}

/// Eight hex digits mixed from the process id, a call counter and the clock.
fn request_token() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    let mut hasher = DefaultHasher::new();
    (std::process::id(), sequence, nanos).hash(&mut hasher);
    format!("{:08x}", hasher.finish() as u32)
}
