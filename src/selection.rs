//! Frame selection.
//!
//! Turns scored scene candidates into the final, ordered set of frames:
//! greedy temporal de-clustering of the highest-scoring candidates, merging
//! with uniform fallback picks when scene detection comes up short, and
//! numbering the result `1..=N` in timestamp order.
//!
//! Everything here is pure; the only I/O happens inside the fallback
//! closure handed to [`merge_with_fallback`].

use std::collections::HashSet;

use image::RgbImage;

/// A sampled point scored against the previous sample. Lives only for one
/// detection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneCandidate {
    /// Frame index of the sample.
    pub frame_index: u64,
    /// `frame_index / fps`.
    pub timestamp_seconds: f64,
    /// `1 - correlation` against the previous sample, in `[0, 2]`.
    pub change_score: f64,
}

/// A point chosen for decoding and encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedFrame {
    /// 1-based position in timestamp order.
    pub ordinal: u32,
    /// Presentation time in seconds.
    pub timestamp_seconds: f64,
    /// Present only for scene-derived frames.
    pub change_score: Option<f64>,
}

/// A selected frame together with its decoded pixels.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Where the frame sits in the final selection.
    pub frame: SelectedFrame,
    /// Frame index the pixels were decoded from.
    pub frame_index: u64,
    /// Decoded RGB8 pixels.
    pub image: RgbImage,
}

/// Greedily pick up to `frame_count` candidates by descending change score,
/// skipping any candidate closer than `min_separation_seconds` to one
/// already picked. The picks are returned in ascending timestamp order.
///
/// Equal scores are resolved in favour of the earlier timestamp so the
/// result is deterministic.
pub fn decluster(
    mut candidates: Vec<SceneCandidate>,
    frame_count: usize,
    min_separation_seconds: f64,
) -> Vec<SceneCandidate> {
    candidates.sort_by(|a, b| {
        b.change_score
            .total_cmp(&a.change_score)
            .then(a.timestamp_seconds.total_cmp(&b.timestamp_seconds))
    });

    let mut selected: Vec<SceneCandidate> = Vec::with_capacity(frame_count);
    for candidate in candidates {
        if selected.len() >= frame_count {
            break;
        }
        let too_close = selected.iter().any(|picked| {
            (picked.timestamp_seconds - candidate.timestamp_seconds).abs() < min_separation_seconds
        });
        if !too_close {
            selected.push(candidate);
        }
    }

    selected.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));
    selected
}

/// Top up `scene_frames` with fallback picks until `frame_count` is reached.
///
/// `fallback(n)` is asked for `n` frames and only runs when there is a
/// shortfall. Fallback frames landing on a frame index that is already
/// present do not count; when they leave slots empty the fallback is asked
/// again for a larger set, up to `shortfall + scene_frames.len()` frames,
/// since no more than that many can collide. Surplus fallback frames are
/// thinned evenly across time. The merged set is renumbered via
/// [`number_frames`] and holds fewer than `frame_count` frames only when the
/// fallback cannot decode enough distinct frames.
pub fn merge_with_fallback<F>(
    mut scene_frames: Vec<DecodedFrame>,
    frame_count: usize,
    mut fallback: F,
) -> Vec<DecodedFrame>
where
    F: FnMut(usize) -> Vec<DecodedFrame>,
{
    scene_frames.truncate(frame_count);
    let shortfall = frame_count - scene_frames.len();
    if shortfall == 0 {
        return number_frames(scene_frames);
    }

    log::info!(
        "Scene detection found only {} frame(s), supplementing {} with uniform sampling",
        scene_frames.len(),
        shortfall,
    );
    let taken: HashSet<u64> = scene_frames.iter().map(|f| f.frame_index).collect();
    let limit = shortfall + scene_frames.len();
    let mut request = shortfall;
    let fresh = loop {
        let candidates = fallback(request);
        let returned = candidates.len();
        let mut seen = taken.clone();
        let fresh: Vec<DecodedFrame> = candidates
            .into_iter()
            .filter(|frame| seen.insert(frame.frame_index))
            .collect();
        if fresh.len() >= shortfall || returned == 0 || request >= limit {
            break fresh;
        }
        request = (request + shortfall - fresh.len()).min(limit);
        log::debug!(
            "{} fallback frame(s) collided with existing picks, requesting {}",
            returned - fresh.len(),
            request,
        );
    };

    scene_frames.extend(spread(fresh, shortfall));
    number_frames(scene_frames)
}

/// Keep at most `count` frames, chosen evenly across `frames`.
fn spread(frames: Vec<DecodedFrame>, count: usize) -> Vec<DecodedFrame> {
    let total = frames.len();
    if total <= count {
        return frames;
    }
    let keep: HashSet<usize> = (0..count).map(|slot| slot * total / count).collect();
    frames
        .into_iter()
        .enumerate()
        .filter(|(position, _)| keep.contains(position))
        .map(|(_, frame)| frame)
        .collect()
}

/// Sort frames by timestamp and assign ordinals `1..=N`.
pub fn number_frames(mut frames: Vec<DecodedFrame>) -> Vec<DecodedFrame> {
    frames.sort_by(|a, b| {
        a.frame
            .timestamp_seconds
            .total_cmp(&b.frame.timestamp_seconds)
    });
    for (position, decoded) in frames.iter_mut().enumerate() {
        decoded.frame.ordinal = position as u32 + 1;
    }
    frames
}
