//! Decode handles.
//!
//! A [`FrameSource`] is a stateful, seekable decoder over one video. It owns a
//! seek cursor and must only be driven from one caller at a time. Sources are
//! produced by a [`SourceOpener`], which lets the pipeline reopen the same
//! video whenever it needs an independent handle (metadata probing, the
//! scene-analysis pass, direct seeks for selected frames, parallel workers).
//!
//! [`FfmpegOpener`] / [`FfmpegSource`] are the production implementation.
//! Any other decoder (or a synthetic source in tests) can be plugged in by
//! implementing the two traits.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::conversion::{frame_index_to_seek_timestamp, frame_to_rgb_buffer, pts_to_frame_index};
use crate::error::{MetadataError, SamplingError};
use crate::metadata::VideoMetadata;

/// A seekable, single-threaded frame decoder over one video.
pub trait FrameSource {
    /// Geometry of the opened stream.
    fn metadata(&self) -> &VideoMetadata;

    /// Seek to `frame_index` and decode exactly one frame as RGB8.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::Decode`] if the frame cannot be reached.
    fn decode_frame(&mut self, frame_index: u64) -> Result<RgbImage, SamplingError>;

    /// Decode frames at ascending `frame_indices` in one forward pass.
    ///
    /// `visit` is called for every decoded frame. The pass ends at the first
    /// index that cannot be decoded (usually the real end of the stream when
    /// the reported frame count overshoots). Returns how many frames were
    /// visited.
    ///
    /// # Errors
    ///
    /// Implementations return an error only when the pass cannot start.
    fn scan(
        &mut self,
        frame_indices: &[u64],
        visit: &mut dyn FnMut(u64, RgbImage),
    ) -> Result<usize, SamplingError> {
        let mut visited = 0;
        for &frame_index in frame_indices {
            match self.decode_frame(frame_index) {
                Ok(image) => {
                    visit(frame_index, image);
                    visited += 1;
                }
                Err(error) => {
                    log::debug!("Scan stopped at frame {frame_index}: {error}");
                    break;
                }
            }
        }
        Ok(visited)
    }
}

/// Opens [`FrameSource`]s for a path.
///
/// Openers are shared across threads (parallel scene analysis opens one
/// source per worker), so they must be `Send + Sync`.
pub trait SourceOpener: Send + Sync {
    /// The decode handle this opener produces.
    type Source: FrameSource;

    /// Open a fresh, independent decode handle for `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`MetadataError`] if the video cannot be opened or has no
    /// video stream.
    fn open(&self, path: &Path) -> Result<Self::Source, MetadataError>;
}

/// Opens videos with FFmpeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl SourceOpener for FfmpegOpener {
    type Source = FfmpegSource;

    fn open(&self, path: &Path) -> Result<FfmpegSource, MetadataError> {
        FfmpegSource::open(path)
    }
}

/// FFmpeg-backed decode handle.
///
/// Holds the demuxer context for the best video stream. Every decode call
/// builds a fresh decoder, seeks to the nearest keyframe before the first
/// target and decodes forward. The demuxer is closed when the source is
/// dropped.
pub struct FfmpegSource {
    input_context: Input,
    stream_index: usize,
    metadata: VideoMetadata,
    path: PathBuf,
}

impl Debug for FfmpegSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegSource")
            .field("stream_index", &self.stream_index)
            .field("metadata", &self.metadata)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    /// Open `path` and read the geometry of its best video stream.
    ///
    /// The frame count comes from the stream header when present, otherwise
    /// it is estimated from the container duration and frame rate.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::CannotOpen`] or
    /// [`MetadataError::NoVideoStream`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref().to_path_buf();
        let cannot_open = |reason: String| MetadataError::CannotOpen {
            path: path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| cannot_open(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| cannot_open(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| MetadataError::NoVideoStream { path: path.clone() })?;
        let stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
            cannot_open(format!("Failed to read video codec parameters: {error}"))
        })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| cannot_open(format!("Failed to create video decoder: {error}")))?;

        let fps = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        let reported_frames = stream.frames();
        let total_frame_count = if reported_frames > 0 {
            reported_frames as u64
        } else {
            let duration_microseconds = input_context.duration();
            if duration_microseconds > 0 && fps > 0.0 {
                (duration_microseconds as f64 / 1_000_000.0 * fps) as u64
            } else {
                0
            }
        };

        let metadata = VideoMetadata::new(total_frame_count, fps, decoder.width(), decoder.height());

        log::debug!(
            "Opened {} (stream={}, {}x{}, {:.2} fps, {} frames)",
            path.display(),
            stream_index,
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frame_count,
        );

        Ok(Self {
            input_context,
            stream_index,
            metadata,
            path,
        })
    }

    /// Build a decoder and RGB24 scaler for the video stream.
    fn prepare(
        &self,
        frame_index: u64,
    ) -> Result<(VideoDecoder, ScalingContext, Rational), SamplingError> {
        let stream = self
            .input_context
            .stream(self.stream_index)
            .ok_or_else(|| SamplingError::decode(frame_index, "video stream disappeared"))?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| SamplingError::decode(frame_index, error))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| SamplingError::decode(frame_index, error))?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            self.metadata.width,
            self.metadata.height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| SamplingError::decode(frame_index, error))?;

        Ok((decoder, scaler, time_base))
    }

    /// Seek once to the first target and decode forward, handing each
    /// target's frame to `visit`.
    ///
    /// A target is satisfied by the first decoded frame at or after it.
    /// Targets the decoder steps over without landing on are skipped.
    fn decode_targets(
        &mut self,
        targets: &[u64],
        visit: &mut dyn FnMut(u64, RgbImage),
    ) -> Result<usize, SamplingError> {
        let Some(&first) = targets.first() else {
            return Ok(0);
        };

        let (mut decoder, mut scaler, time_base) = self.prepare(first)?;
        let fps = self.metadata.fps;
        let (width, height) = (self.metadata.width, self.metadata.height);
        let video_stream_index = self.stream_index;

        let seek_timestamp = frame_index_to_seek_timestamp(first, fps);
        self.input_context
            .seek(seek_timestamp, ..seek_timestamp)
            .map_err(|error| SamplingError::decode(first, error))?;

        let mut cursor = TargetCursor::new(targets);
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input_context.packets() {
            if cursor.is_done() {
                break;
            }
            if stream.index() != video_stream_index {
                continue;
            }

            if let Err(error) = decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {error}");
                continue;
            }

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.pts().unwrap_or(0);
                let current = pts_to_frame_index(pts, time_base, fps);
                if let Some(target) = cursor.accept(current) {
                    scaler
                        .run(&decoded_frame, &mut rgb_frame)
                        .map_err(|error| SamplingError::decode(target, error))?;
                    visit(target, rgb_frame_to_image(&rgb_frame, width, height, target)?);
                }
                if cursor.is_done() {
                    break;
                }
            }
        }

        // Flush frames still buffered in the decoder.
        if !cursor.is_done() {
            let _ = decoder.send_eof();
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.pts().unwrap_or(0);
                let current = pts_to_frame_index(pts, time_base, fps);
                if let Some(target) = cursor.accept(current) {
                    scaler
                        .run(&decoded_frame, &mut rgb_frame)
                        .map_err(|error| SamplingError::decode(target, error))?;
                    visit(target, rgb_frame_to_image(&rgb_frame, width, height, target)?);
                }
                if cursor.is_done() {
                    break;
                }
            }
        }

        Ok(cursor.visited)
    }
}

impl FrameSource for FfmpegSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn decode_frame(&mut self, frame_index: u64) -> Result<RgbImage, SamplingError> {
        let mut image = None;
        self.decode_targets(&[frame_index], &mut |_, decoded| image = Some(decoded))?;
        image.ok_or_else(|| {
            SamplingError::decode(frame_index, "frame not found in the video stream")
        })
    }

    fn scan(
        &mut self,
        frame_indices: &[u64],
        visit: &mut dyn FnMut(u64, RgbImage),
    ) -> Result<usize, SamplingError> {
        self.decode_targets(frame_indices, visit)
    }
}

/// Walks a sorted target list alongside the decoder's frame positions.
struct TargetCursor<'a> {
    targets: &'a [u64],
    next: usize,
    visited: usize,
}

impl<'a> TargetCursor<'a> {
    fn new(targets: &'a [u64]) -> Self {
        Self {
            targets,
            next: 0,
            visited: 0,
        }
    }

    fn is_done(&self) -> bool {
        self.next >= self.targets.len()
    }

    /// Returns the target satisfied by a frame decoded at `current`, if any.
    fn accept(&mut self, current: u64) -> Option<u64> {
        let target = *self.targets.get(self.next)?;
        if current < target {
            return None;
        }
        self.next += 1;
        self.visited += 1;
        while self
            .targets
            .get(self.next)
            .is_some_and(|&skipped| skipped <= current)
        {
            self.next += 1;
        }
        Some(target)
    }
}

fn rational_to_f64(rate: Rational) -> Option<f64> {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        None
    } else {
        Some(rate.numerator() as f64 / rate.denominator() as f64)
    }
}

/// Convert a scaled RGB24 video frame to an [`RgbImage`].
fn rgb_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
    frame_index: u64,
) -> Result<RgbImage, SamplingError> {
    let buffer = frame_to_rgb_buffer(rgb_frame, width, height);
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        SamplingError::decode(
            frame_index,
            "failed to construct RGB image from decoded frame data",
        )
    })
}
