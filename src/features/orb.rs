//! Oriented FAST + rotated BRIEF feature extraction
//!
//! Corners are found with imageproc's oriented FAST-9 on an image pyramid
//! (intensity-centroid orientation over a radius-15 window), thinned by 3x3
//! non-maximum suppression, and described by 256 pairwise intensity tests on a
//! box-smoothed copy of the level. The test pattern is rotated by the corner
//! orientation, which makes descriptors tolerant to in-plane rotation; the
//! pyramid adds tolerance to moderate scale change. imageproc's own BRIEF
//! does not steer its pattern, so the descriptor step lives here.

use super::descriptor::{Descriptor, Feature, Keypoint};
use crate::cancel::{CancelFlag, Cancelled};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::corners::oriented_fast;
use imageproc::filter::box_filter;
use imageproc::suppress::suppress_non_maximum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Radius of the disc the BRIEF sample points are drawn from.
const PATTERN_RADIUS: i32 = 13;
/// Half-size of the box filter applied before sampling.
const SMOOTHING_RADIUS: u32 = 2;
/// Corners closer than this to the level border are dropped, so every pixel
/// an orientation or descriptor reads lies inside the image.
const EDGE_MARGIN: u32 = 16;

const PATTERN_SEED: u64 = 0x5eed_0f_b71e;

#[derive(Debug, Clone)]
pub struct OrbConfig {
    /// Cap on features kept per image, strongest first
    pub max_keypoints: usize,
    /// FAST intensity threshold
    pub fast_threshold: u8,
    /// Pyramid levels including full resolution
    pub pyramid_levels: u8,
    /// Downscale factor between adjacent levels
    pub scale_factor: f32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            max_keypoints: 5000,
            fast_threshold: 20,
            pyramid_levels: 4,
            scale_factor: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TestPair {
    a: (i32, i32),
    b: (i32, i32),
}

/// Detector/descriptor pair. Building one fixes the sampling pattern, so the
/// same detector always produces the same features for the same image.
pub struct OrbDetector {
    config: OrbConfig,
    pattern: Vec<TestPair>,
}

impl OrbDetector {
    pub fn new(config: OrbConfig) -> Self {
        Self {
            config,
            pattern: sampling_pattern(),
        }
    }

    /// Detect up to `max_keypoints` features, strongest first.
    ///
    /// `cancel` is polled before each pyramid level.
    pub fn detect_and_compute(
        &self,
        image: &GrayImage,
        cancel: &CancelFlag,
    ) -> Result<Vec<Feature>, Cancelled> {
        let mut features = Vec::new();

        for (octave, (level, scale)) in self.build_pyramid(image).iter().enumerate() {
            cancel.check()?;
            let level_features = self.extract_level(level, octave as u8, *scale);
            log::trace!(
                "level {} ({}x{}): {} features",
                octave,
                level.width(),
                level.height(),
                level_features.len()
            );
            features.extend(level_features);
        }

        features.sort_by(|a, b| {
            b.keypoint
                .score
                .total_cmp(&a.keypoint.score)
                .then(a.keypoint.octave.cmp(&b.keypoint.octave))
                .then(a.keypoint.y.total_cmp(&b.keypoint.y))
                .then(a.keypoint.x.total_cmp(&b.keypoint.x))
        });
        features.truncate(self.config.max_keypoints);
        Ok(features)
    }

    /// Levels paired with their scale relative to the input image
    fn build_pyramid(&self, image: &GrayImage) -> Vec<(GrayImage, f32)> {
        let min_side = 2 * EDGE_MARGIN + 1;
        let mut pyramid = Vec::with_capacity(self.config.pyramid_levels as usize);
        if image.width() < min_side || image.height() < min_side {
            return pyramid;
        }
        pyramid.push((image.clone(), 1.0));

        let mut scale = 1.0f32;
        for _ in 1..self.config.pyramid_levels.max(1) {
            scale *= self.config.scale_factor;
            let width = (image.width() as f32 / scale).round() as u32;
            let height = (image.height() as f32 / scale).round() as u32;
            if width < min_side || height < min_side {
                break;
            }
            let level = imageops::resize(image, width, height, FilterType::Triangle);
            pyramid.push((level, scale));
        }

        pyramid
    }

    fn extract_level(&self, level: &GrayImage, octave: u8, scale: f32) -> Vec<Feature> {
        // One pixel of slack so suppression sees every neighbour of a kept corner
        let candidates = oriented_fast(
            level,
            Some(self.config.fast_threshold),
            usize::MAX,
            EDGE_MARGIN - 1,
            None,
        );
        if candidates.is_empty() {
            return Vec::new();
        }

        let (width, height) = level.dimensions();
        // FAST scores are whole numbers no lower than the threshold, so 0 marks "no corner"
        let mut scores = GrayImage::new(width, height);
        for c in &candidates {
            scores.put_pixel(c.corner.x, c.corner.y, Luma([c.corner.score as u8]));
        }
        let maxima = suppress_non_maximum(&scores, 1);

        let smoothed = box_filter(level, SMOOTHING_RADIUS, SMOOTHING_RADIUS);

        candidates
            .into_iter()
            .filter(|c| {
                let (x, y) = (c.corner.x, c.corner.y);
                x >= EDGE_MARGIN
                    && y >= EDGE_MARGIN
                    && x < width - EDGE_MARGIN
                    && y < height - EDGE_MARGIN
                    && maxima.get_pixel(x, y)[0] != 0
            })
            .map(|c| {
                let (x, y, angle) = (c.corner.x, c.corner.y, c.orientation);
                Feature {
                    keypoint: Keypoint {
                        x: x as f32 * scale,
                        y: y as f32 * scale,
                        score: c.corner.score,
                        angle,
                        octave,
                    },
                    descriptor: self.describe(&smoothed, x, y, angle),
                }
            })
            .collect()
    }

    fn describe(&self, smoothed: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
        let (sin, cos) = angle.sin_cos();
        let max_x = smoothed.width() as i32 - 1;
        let max_y = smoothed.height() as i32 - 1;
        let sample = |(dx, dy): (i32, i32)| -> u8 {
            let rx = (dx as f32 * cos - dy as f32 * sin).round() as i32;
            let ry = (dx as f32 * sin + dy as f32 * cos).round() as i32;
            let px = (x as i32 + rx).clamp(0, max_x) as u32;
            let py = (y as i32 + ry).clamp(0, max_y) as u32;
            smoothed.get_pixel(px, py)[0]
        };

        let mut descriptor = Descriptor::default();
        for (bit, pair) in self.pattern.iter().enumerate() {
            if sample(pair.a) < sample(pair.b) {
                descriptor.set_bit(bit);
            }
        }
        descriptor
    }
}

impl Default for OrbDetector {
    fn default() -> Self {
        Self::new(OrbConfig::default())
    }
}

/// 256 point pairs inside the pattern disc, drawn from a fixed seed
fn sampling_pattern() -> Vec<TestPair> {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    let mut point = || loop {
        let dx = rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
        let dy = rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
        if dx * dx + dy * dy <= PATTERN_RADIUS * PATTERN_RADIUS {
            return (dx, dy);
        }
    };

    let mut pattern = Vec::with_capacity(Descriptor::BITS);
    while pattern.len() < Descriptor::BITS {
        let a = point();
        let b = point();
        if a != b {
            pattern.push(TestPair { a, b });
        }
    }
    pattern
}
