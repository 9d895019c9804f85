//! Uniform time sampling tests.

mod common;

use common::{SyntheticOpener, SyntheticVideo, assert_close};
use framesnap::{SamplingError, SourceOpener, UniformTimeSampler, uniform_timestamps};

#[test]
fn four_frames_over_one_hundred_seconds() {
    let timestamps = uniform_timestamps(100.0, 4, 0.1);
    let expected = [10.0, 36.666_666_666, 63.333_333_333, 90.0];
    assert_eq!(timestamps.len(), 4);
    for (actual, expected) in timestamps.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-6, "{actual} vs {expected}");
    }
}

#[test]
fn single_frame_uses_midpoint() {
    assert_eq!(uniform_timestamps(100.0, 1, 0.1), vec![50.0]);
    assert_eq!(uniform_timestamps(7.0, 1, 0.3), vec![3.5]);
}

#[test]
fn zero_frames_yields_nothing() {
    assert!(uniform_timestamps(100.0, 0, 0.1).is_empty());
}

#[test]
fn endpoints_are_inclusive() {
    let timestamps = uniform_timestamps(200.0, 2, 0.1);
    assert_close(timestamps[0], 20.0);
    assert_close(timestamps[1], 180.0);
}

#[test]
fn timestamps_are_strictly_increasing() {
    let timestamps = uniform_timestamps(3600.0, 12, 0.1);
    assert!(timestamps.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn sample_decodes_one_frame_per_timestamp() {
    let opener = SyntheticOpener::new(SyntheticVideo::new(1000, 10.0));
    let mut source = opener.open("clip.mp4".as_ref()).unwrap();
    let metadata = opener.video.metadata.clone();

    let frames = UniformTimeSampler::new()
        .sample(&mut source, &metadata, 4)
        .unwrap();

    let indices: Vec<u64> = frames.iter().map(|f| f.frame_index).collect();
    assert_eq!(indices, vec![100, 367, 633, 900]);
    let ordinals: Vec<u32> = frames.iter().map(|f| f.frame.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4]);
    assert!(frames.iter().all(|f| f.frame.change_score.is_none()));
    assert_close(frames[1].frame.timestamp_seconds, 100.0 * 0.1 + 80.0 / 3.0);
}

#[test]
fn sample_skips_frames_that_fail_to_decode() {
    let video = SyntheticVideo::new(1000, 10.0).with_failing_frames([367]);
    let opener = SyntheticOpener::new(video);
    let mut source = opener.open("clip.mp4".as_ref()).unwrap();
    let metadata = opener.video.metadata.clone();

    let frames = UniformTimeSampler::new()
        .sample(&mut source, &metadata, 4)
        .unwrap();

    let indices: Vec<u64> = frames.iter().map(|f| f.frame_index).collect();
    assert_eq!(indices, vec![100, 633, 900]);
    let ordinals: Vec<u32> = frames.iter().map(|f| f.frame.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);
}

#[test]
fn sample_fails_when_nothing_decodes() {
    let video = SyntheticVideo::new(1000, 10.0).with_failing_frames(0..1000);
    let opener = SyntheticOpener::new(video);
    let mut source = opener.open("clip.mp4".as_ref()).unwrap();
    let metadata = opener.video.metadata.clone();

    let error = UniformTimeSampler::new()
        .sample(&mut source, &metadata, 3)
        .unwrap_err();
    assert!(matches!(error, SamplingError::NoUsableFrames { requested: 3 }));
}

#[test]
fn custom_trim_ratio_moves_the_window() {
    let opener = SyntheticOpener::new(SyntheticVideo::new(1000, 10.0));
    let metadata = opener.video.metadata.clone();
    let sampler = UniformTimeSampler::new().with_edge_trim_ratio(0.25);
    let timestamps = sampler.timestamps(&metadata, 3);
    assert_close(timestamps[0], 25.0);
    assert_close(timestamps[1], 50.0);
    assert_close(timestamps[2], 75.0);
}

#[test]
fn frame_index_is_clamped_to_the_last_frame() {
    // Ten frames at 1 fps: the 10 s endpoint maps one past the final frame.
    let opener = SyntheticOpener::new(SyntheticVideo::new(10, 1.0));
    let mut source = opener.open("tiny.mp4".as_ref()).unwrap();
    let metadata = opener.video.metadata.clone();

    let frames = UniformTimeSampler::new()
        .with_edge_trim_ratio(0.0)
        .sample(&mut source, &metadata, 2)
        .unwrap();
    let indices: Vec<u64> = frames.iter().map(|f| f.frame_index).collect();
    assert_eq!(indices, vec![0, 9]);
}
