//! Internal conversion helpers.
//!
//! Timestamp arithmetic shared by the samplers and the FFmpeg decode handle,
//! plus copying decoded pixel rows out of padded FFmpeg planes.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an RGB24 FFmpeg frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3).
/// The padding is stripped so the result can be handed to
/// [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Map a timestamp in seconds to the nearest frame index.
///
/// Rounds to the nearest frame and clamps to the last frame of the stream
/// when `total_frames` is known (non-zero).
pub fn seconds_to_frame_index(seconds: f64, fps: f64, total_frames: u64) -> u64 {
    let index = (seconds.max(0.0) * fps).round() as u64;
    if total_frames > 0 {
        index.min(total_frames - 1)
    } else {
        index
    }
}

/// Map a frame index back to its presentation time in seconds.
pub fn frame_index_to_seconds(frame_index: u64, fps: f64) -> f64 {
    if fps > 0.0 {
        frame_index as f64 / fps
    } else {
        0.0
    }
}

/// Convert a frame index to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` (via `avformat_seek_file` with `stream_index = -1`) expects
/// container-level timestamps, not the stream time base.
pub(crate) fn frame_index_to_seek_timestamp(frame_index: u64, fps: f64) -> i64 {
    (frame_index_to_seconds(frame_index, fps) * 1_000_000.0) as i64
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a frame index.
pub(crate) fn pts_to_frame_index(pts: i64, time_base: Rational, fps: f64) -> u64 {
    (pts_to_seconds(pts, time_base).max(0.0) * fps).round() as u64
}
