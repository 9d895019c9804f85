//! JPEG output.
//!
//! [`FrameEncoder`] writes one decoded frame to
//! `{output_dir}/{video_name}_frame_{NN}_{SSS}s.jpg` and reports what it
//! wrote as an [`ExtractedFrame`].

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use image::{RgbImage, codecs::jpeg::JpegEncoder};

use crate::configuration::DEFAULT_JPEG_QUALITY;
use crate::error::EncodeError;
use crate::selection::SelectedFrame;

/// A frame written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFrame {
    /// 1-based position in timestamp order.
    pub ordinal: u32,
    /// Presentation time in seconds.
    pub timestamp_seconds: f64,
    /// `H:MM:SS` rendering of the whole-second timestamp.
    pub timestamp_label: String,
    /// File name inside the output directory.
    pub file_name: String,
    /// Full path of the written file.
    pub path: PathBuf,
    /// Size of the written file in bytes.
    pub byte_size: u64,
    /// Scene change score; `None` for uniformly sampled frames.
    pub change_score: Option<f64>,
}

/// Writes frames as baseline JPEG files.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    output_dir: PathBuf,
    quality: u8,
}

impl FrameEncoder {
    /// Create an encoder writing into `output_dir` at the default quality.
    /// The directory must already exist.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Set the JPEG quality (1–100).
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Directory files are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Configured JPEG quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Compress `image` and write it for `frame`.
    ///
    /// An existing file with the same name is overwritten. A partially
    /// written file is removed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::WriteFailed`] if the file cannot be created,
    /// compressed or flushed.
    pub fn encode(
        &self,
        image: &RgbImage,
        video_name: &str,
        frame: &SelectedFrame,
    ) -> Result<ExtractedFrame, EncodeError> {
        let file_name = frame_file_name(video_name, frame.ordinal, frame.timestamp_seconds);
        let path = self.output_dir.join(&file_name);

        if let Err(reason) = self.write_jpeg(image, &path) {
            let _ = fs::remove_file(&path);
            return Err(EncodeError::WriteFailed { path, reason });
        }

        let byte_size = fs::metadata(&path)
            .map(|metadata| metadata.len())
            .map_err(|error| EncodeError::WriteFailed {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        log::debug!(
            "Wrote {} ({} bytes, quality {})",
            path.display(),
            byte_size,
            self.quality
        );

        Ok(ExtractedFrame {
            ordinal: frame.ordinal,
            timestamp_seconds: frame.timestamp_seconds,
            timestamp_label: timestamp_label(frame.timestamp_seconds),
            file_name,
            path,
            byte_size,
            change_score: frame.change_score,
        })
    }

    fn write_jpeg(&self, image: &RgbImage, path: &Path) -> Result<(), String> {
        let file = File::create(path).map_err(|error| error.to_string())?;
        let mut writer = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, self.quality)
            .encode_image(image)
            .map_err(|error| error.to_string())?;
        writer.flush().map_err(|error| error.to_string())
    }
}

/// `{video_name}_frame_{NN}_{SSS}s.jpg`, with the ordinal padded to two
/// digits and the whole-second timestamp padded to three.
///
/// ```
/// assert_eq!(framesnap::frame_file_name("talk", 3, 125.9), "talk_frame_03_125s.jpg");
/// ```
pub fn frame_file_name(video_name: &str, ordinal: u32, timestamp_seconds: f64) -> String {
    format!(
        "{video_name}_frame_{ordinal:02}_{:03}s.jpg",
        whole_seconds(timestamp_seconds)
    )
}

/// Render the whole-second part of `seconds` as `H:MM:SS`.
///
/// Hours are not padded and keep growing past 24.
///
/// ```
/// assert_eq!(framesnap::timestamp_label(3725.4), "1:02:05");
/// assert_eq!(framesnap::timestamp_label(42.0), "0:00:42");
/// ```
pub fn timestamp_label(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!(
        "{}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}
