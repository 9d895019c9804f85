//! Timestamp and frame index conversion tests.

use framesnap::{frame_index_to_seconds, seconds_to_frame_index};

#[test]
fn seconds_round_to_the_nearest_frame() {
    assert_eq!(seconds_to_frame_index(36.666_666, 10.0, 1000), 367);
    assert_eq!(seconds_to_frame_index(63.333_333, 10.0, 1000), 633);
    assert_eq!(seconds_to_frame_index(1.0, 29.97, 0), 30);
}

#[test]
fn frame_index_is_clamped_to_the_last_frame() {
    assert_eq!(seconds_to_frame_index(100.0, 10.0, 1000), 999);
    assert_eq!(seconds_to_frame_index(1e9, 25.0, 10), 9);
}

#[test]
fn unknown_frame_count_is_not_clamped() {
    assert_eq!(seconds_to_frame_index(100.0, 10.0, 0), 1000);
}

#[test]
fn negative_seconds_map_to_the_first_frame() {
    assert_eq!(seconds_to_frame_index(-5.0, 30.0, 100), 0);
}

#[test]
fn frame_index_to_seconds_divides_by_fps() {
    assert_eq!(frame_index_to_seconds(600, 10.0), 60.0);
    assert_eq!(frame_index_to_seconds(0, 24.0), 0.0);
    assert_eq!(frame_index_to_seconds(100, 0.0), 0.0);
}
