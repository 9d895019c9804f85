//! Synthetic videos for pipeline tests.
//!
//! A [`SyntheticVideo`] is a list of scenes, each a solid or striped color
//! starting at a given frame. Frames are rendered on demand as tiny RGB
//! images, so the whole pipeline can run without a real media file.

#![allow(dead_code)]

use std::{
    collections::HashSet,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use framesnap::{FrameSource, MetadataError, SamplingError, SourceOpener, VideoMetadata};
use image::{Rgb, RgbImage};

pub const FRAME_SIDE: u32 = 8;

pub const RED: [u8; 3] = [220, 20, 20];
pub const GREEN: [u8; 3] = [20, 220, 20];
pub const BLUE: [u8; 3] = [20, 20, 220];
pub const WHITE: [u8; 3] = [250, 250, 250];
pub const BLACK: [u8; 3] = [5, 5, 5];

/// A scene starting at `start_frame`, rendered as horizontal stripes.
#[derive(Debug, Clone)]
pub struct Scene {
    pub start_frame: u64,
    pub stripes: Vec<[u8; 3]>,
}

impl Scene {
    pub fn solid(start_frame: u64, color: [u8; 3]) -> Self {
        Self {
            start_frame,
            stripes: vec![color],
        }
    }

    pub fn striped(start_frame: u64, stripes: &[[u8; 3]]) -> Self {
        Self {
            start_frame,
            stripes: stripes.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticVideo {
    pub metadata: VideoMetadata,
    pub scenes: Vec<Scene>,
    pub failing_frames: HashSet<u64>,
    pub seek_failures: HashSet<u64>,
}

impl SyntheticVideo {
    /// A video of `total_frames` at `fps`, starting black.
    pub fn new(total_frames: u64, fps: f64) -> Self {
        Self {
            metadata: VideoMetadata::new(total_frames, fps, FRAME_SIDE, FRAME_SIDE),
            scenes: vec![Scene::solid(0, BLACK)],
            failing_frames: HashSet::new(),
            seek_failures: HashSet::new(),
        }
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self.scenes.sort_by_key(|scene| scene.start_frame);
        self
    }

    /// A hard cut to a solid `color` at `start_frame`.
    pub fn with_cut(self, start_frame: u64, color: [u8; 3]) -> Self {
        self.with_scene(Scene::solid(start_frame, color))
    }

    pub fn with_failing_frames(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.failing_frames.extend(frames);
        self
    }

    /// Frames that decode during a forward scan but not on a direct seek.
    pub fn with_seek_failures(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.seek_failures.extend(frames);
        self
    }

    pub fn render(&self, frame_index: u64) -> RgbImage {
        let scene = self
            .scenes
            .iter()
            .rev()
            .find(|scene| scene.start_frame <= frame_index)
            .unwrap_or(&self.scenes[0]);
        let stripes = scene.stripes.len() as u32;
        RgbImage::from_fn(FRAME_SIDE, FRAME_SIDE, |_, y| {
            let stripe = (y * stripes / FRAME_SIDE) as usize;
            Rgb(scene.stripes[stripe])
        })
    }
}

/// Decode handle over a [`SyntheticVideo`]. Counts decode calls.
pub struct SyntheticSource {
    video: Arc<SyntheticVideo>,
    decodes: Arc<AtomicUsize>,
}

impl SyntheticSource {
    fn read(&self, frame_index: u64, seeking: bool) -> Result<RgbImage, SamplingError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        if frame_index >= self.video.metadata.total_frame_count {
            return Err(SamplingError::decode(frame_index, "past end of stream"));
        }
        if self.video.failing_frames.contains(&frame_index) {
            return Err(SamplingError::decode(frame_index, "corrupt frame"));
        }
        if seeking && self.video.seek_failures.contains(&frame_index) {
            return Err(SamplingError::decode(frame_index, "seek failed"));
        }
        Ok(self.video.render(frame_index))
    }
}

impl FrameSource for SyntheticSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.video.metadata
    }

    fn decode_frame(&mut self, frame_index: u64) -> Result<RgbImage, SamplingError> {
        self.read(frame_index, true)
    }

    fn scan(
        &mut self,
        frame_indices: &[u64],
        visit: &mut dyn FnMut(u64, RgbImage),
    ) -> Result<usize, SamplingError> {
        let mut visited = 0;
        for &frame_index in frame_indices {
            match self.read(frame_index, false) {
                Ok(image) => {
                    visit(frame_index, image);
                    visited += 1;
                }
                Err(_) => break,
            }
        }
        Ok(visited)
    }
}

#[derive(Clone)]
pub struct SyntheticOpener {
    pub video: Arc<SyntheticVideo>,
    pub opens: Arc<AtomicUsize>,
    pub decodes: Arc<AtomicUsize>,
}

impl SyntheticOpener {
    pub fn new(video: SyntheticVideo) -> Self {
        Self {
            video: Arc::new(video),
            opens: Arc::new(AtomicUsize::new(0)),
            decodes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl SourceOpener for SyntheticOpener {
    type Source = SyntheticSource;

    fn open(&self, _path: &Path) -> Result<SyntheticSource, MetadataError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(SyntheticSource {
            video: Arc::clone(&self.video),
            decodes: Arc::clone(&self.decodes),
        })
    }
}

/// Refuses to open anything.
#[derive(Clone, Copy)]
pub struct UnopenableOpener;

impl SourceOpener for UnopenableOpener {
    type Source = SyntheticSource;

    fn open(&self, path: &Path) -> Result<SyntheticSource, MetadataError> {
        Err(MetadataError::CannotOpen {
            path: path.to_path_buf(),
            reason: "not a media file".to_string(),
        })
    }
}

/// Opens normally `allowed_opens` times, then refuses.
#[derive(Clone)]
pub struct ExhaustibleOpener {
    pub inner: SyntheticOpener,
    pub allowed_opens: usize,
}

impl SourceOpener for ExhaustibleOpener {
    type Source = SyntheticSource;

    fn open(&self, path: &Path) -> Result<SyntheticSource, MetadataError> {
        if self.inner.open_count() >= self.allowed_opens {
            return Err(MetadataError::CannotOpen {
                path: path.to_path_buf(),
                reason: "file vanished".to_string(),
            });
        }
        self.inner.open(path)
    }
}

/// 300 s at 10 fps with hard cuts at 60, 120, 180 and 240 seconds.
pub fn four_cut_video() -> SyntheticVideo {
    SyntheticVideo::new(3000, 10.0)
        .with_cut(600, RED)
        .with_cut(1200, GREEN)
        .with_cut(1800, BLUE)
        .with_cut(2400, WHITE)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
