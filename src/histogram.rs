//! Joint color histograms.
//!
//! Scene analysis summarises every sampled frame as an 8×8×8 joint RGB
//! histogram (512 bins, each channel's full 0–255 range split into 8 equal
//! bins) and compares neighbouring samples with the Pearson correlation of
//! their bin counts.

use image::RgbImage;

/// Bins per color channel.
pub const BINS_PER_CHANNEL: usize = 8;

/// Total number of bins in a joint histogram.
pub const TOTAL_BINS: usize = BINS_PER_CHANNEL * BINS_PER_CHANNEL * BINS_PER_CHANNEL;

/// Right shift that maps a 0–255 channel value onto its bin.
const BIN_SHIFT: u32 = 5;

/// A 512-bin joint RGB histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram {
    bins: Box<[u32; TOTAL_BINS]>,
}

impl ColorHistogram {
    /// Count every pixel of `image` into its joint bin.
    pub fn from_image(image: &RgbImage) -> Self {
        Self::from_rgb_bytes(image.as_raw())
    }

    /// Count tightly-packed RGB triples. Trailing bytes that do not form a
    /// full pixel are ignored.
    pub fn from_rgb_bytes(rgb: &[u8]) -> Self {
        let mut bins = Box::new([0u32; TOTAL_BINS]);
        for pixel in rgb.chunks_exact(3) {
            bins[bin_index(pixel[0], pixel[1], pixel[2])] += 1;
        }
        Self { bins }
    }

    /// Raw bin counts.
    pub fn bins(&self) -> &[u32; TOTAL_BINS] {
        &self.bins
    }

    /// Number of pixels counted.
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&count| count as u64).sum()
    }

    /// Pearson correlation between the two bin-count vectors, in `[-1, 1]`.
    ///
    /// When either histogram has zero variance the correlation is undefined;
    /// it is reported as `1.0` (no measurable change).
    pub fn correlation(&self, other: &ColorHistogram) -> f64 {
        let count = TOTAL_BINS as f64;
        let mean_a = self.total() as f64 / count;
        let mean_b = other.total() as f64 / count;

        let mut covariance = 0.0;
        let mut variance_a = 0.0;
        let mut variance_b = 0.0;
        for (&a, &b) in self.bins.iter().zip(other.bins.iter()) {
            let delta_a = a as f64 - mean_a;
            let delta_b = b as f64 - mean_b;
            covariance += delta_a * delta_b;
            variance_a += delta_a * delta_a;
            variance_b += delta_b * delta_b;
        }

        let scale = (variance_a * variance_b).sqrt();
        if scale.abs() > f64::EPSILON {
            (covariance / scale).clamp(-1.0, 1.0)
        } else {
            1.0
        }
    }

    /// `1 - correlation`, in `[0, 2]`. Higher means a bigger visual jump.
    pub fn change_score(&self, previous: &ColorHistogram) -> f64 {
        1.0 - self.correlation(previous)
    }
}

fn bin_index(red: u8, green: u8, blue: u8) -> usize {
    let r = (red >> BIN_SHIFT) as usize;
    let g = (green >> BIN_SHIFT) as usize;
    let b = (blue >> BIN_SHIFT) as usize;
    (r * BINS_PER_CHANNEL + g) * BINS_PER_CHANNEL + b
}
