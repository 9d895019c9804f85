//! Parallel scene analysis must select exactly what a sequential pass selects.

#![cfg(feature = "rayon")]

mod common;

use std::path::Path;

use common::{SyntheticOpener, SyntheticVideo, four_cut_video};
use framesnap::{SceneChangeDetector, SourceOpener, decluster};

fn clip() -> &'static Path {
    Path::new("talk.mp4")
}

/// Scene picks from a single sequential scan: `(frame_index, score)`.
fn sequential_picks(video: SyntheticVideo, frame_count: usize) -> Vec<(u64, f64)> {
    let opener = SyntheticOpener::new(video);
    let mut source = opener.open(clip()).unwrap();
    let metadata = opener.video.metadata.clone();
    let candidates = SceneChangeDetector::new()
        .analyze(&mut source, &metadata)
        .unwrap();
    decluster(candidates, frame_count, 10.0)
        .into_iter()
        .map(|candidate| (candidate.frame_index, candidate.change_score))
        .collect()
}

/// Scene picks from `detect` on a pool of `threads` workers.
fn parallel_picks(video: SyntheticVideo, frame_count: usize, threads: usize) -> Vec<(u64, f64)> {
    let opener = SyntheticOpener::new(video);
    let metadata = opener.video.metadata.clone();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .unwrap();
    let frames = pool
        .install(|| SceneChangeDetector::new().detect(&opener, clip(), &metadata, frame_count))
        .unwrap();

    assert!(
        frames
            .windows(2)
            .all(|pair| pair[0].frame.timestamp_seconds < pair[1].frame.timestamp_seconds)
    );
    frames
        .iter()
        .filter_map(|decoded| {
            decoded
                .frame
                .change_score
                .map(|score| (decoded.frame_index, score))
        })
        .collect()
}

#[test]
fn parallel_detect_matches_sequential_on_hard_cuts() {
    let expected = sequential_picks(four_cut_video(), 4);
    assert_eq!(
        expected.iter().map(|(index, _)| *index).collect::<Vec<_>>(),
        vec![600, 1200, 1800, 2400]
    );
    for threads in [1, 3, 8] {
        assert_eq!(parallel_picks(four_cut_video(), 4, threads), expected, "{threads} threads");
    }
}

#[test]
fn parallel_detect_truncates_where_sequential_scan_stops() {
    // A sample that cannot be decoded ends the pass; cuts after it are never scored.
    for failing in [90, 1500, 2910] {
        let video = || four_cut_video().with_failing_frames([failing]);
        let expected = sequential_picks(video(), 4);
        assert!(expected.iter().all(|(index, _)| *index < failing));
        for threads in [1, 3, 8] {
            assert_eq!(
                parallel_picks(video(), 4, threads),
                expected,
                "failing sample {failing}, {threads} threads"
            );
        }
    }
}

#[test]
fn parallel_detect_is_deterministic() {
    let first = parallel_picks(four_cut_video(), 6, 4);
    let second = parallel_picks(four_cut_video(), 6, 4);
    assert_eq!(first, second);
}
