/// Template matching implementation
///
/// Zero-mean normalized cross-correlation (Lewis, "Fast Normalized
/// Cross-Correlation"). The numerator for every position comes from one FFT
/// cross-correlation; window sums and sums of squares come from integral
/// images, so the cost no longer grows with the template area.

use super::types::Match;
use crate::cancel::{CancelFlag, Cancelled};
use image::GrayImage;
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};
use rayon::prelude::*;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Template matcher for locating a fragment inside a larger grayscale image
pub struct TemplateMatcher {
    /// Log scan phases at debug level
    report_progress: bool,
}

impl TemplateMatcher {
    /// Create a new matcher
    pub fn new() -> Self {
        Self {
            report_progress: false,
        }
    }

    pub fn with_progress(mut self, report_progress: bool) -> Self {
        self.report_progress = report_progress;
        self
    }

    /// Find the position of maximum correlation
    ///
    /// # Arguments
    /// * `image` - The image to search in
    /// * `template` - The fragment to look for
    /// * `cancel` - Polled between transforms and once per scanned row
    ///
    /// # Returns
    /// The first (row-major) position holding the maximum score, or `None`
    /// if the template is empty or does not fit inside the image. Windows or
    /// templates without intensity variation score 0.0.
    pub fn best_match(
        &self,
        image: &GrayImage,
        template: &GrayImage,
        cancel: &CancelFlag,
    ) -> Result<Option<Match>, Cancelled> {
        let (iw, ih) = (image.width() as usize, image.height() as usize);
        let (tw, th) = (template.width() as usize, template.height() as usize);
        if tw == 0 || th == 0 || tw > iw || th > ih {
            return Ok(None);
        }
        cancel.check()?;

        let mut best = Match {
            x: 0,
            y: 0,
            width: tw as u32,
            height: th as u32,
            correlation: 0.0,
        };

        let n = (tw * th) as f64;
        let template_mean = template.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
        let centered: Vec<f64> = template.pixels().map(|p| p[0] as f64 - template_mean).collect();
        let template_ss: f64 = centered.iter().map(|v| v * v).sum();
        if template_ss <= f64::EPSILON {
            // Every position scores 0, the first one wins
            return Ok(Some(best));
        }

        let cross = self.cross_correlation(image, &centered, tw, th, cancel)?;

        let sums = integral_image::<_, u64>(image);
        let squares = integral_squared_image::<_, u64>(image);
        let pixel_count = (tw * th) as u128;

        let x_positions = iw - tw + 1;
        let y_positions = ih - th + 1;

        let row_bests = (0..y_positions)
            .into_par_iter()
            .map(|y| -> Result<(usize, f64), Cancelled> {
                cancel.check()?;
                let mut row_best = (0usize, f64::NEG_INFINITY);
                for x in 0..x_positions {
                    let (left, top) = (x as u32, y as u32);
                    let (right, bottom) = ((x + tw - 1) as u32, (y + th - 1) as u32);
                    let s = sum_image_pixels(&sums, left, top, right, bottom)[0] as u128;
                    let ss = sum_image_pixels(&squares, left, top, right, bottom)[0] as u128;

                    // n * sum((I - mean)^2), exact in integers so flat windows are exactly 0
                    let scaled_window_ss = pixel_count * ss - s * s;
                    let score = if scaled_window_ss == 0 {
                        0.0
                    } else {
                        let window_ss = scaled_window_ss as f64 / pixel_count as f64;
                        (cross[y * iw + x] / (template_ss * window_ss).sqrt()).clamp(-1.0, 1.0)
                    };

                    if score > row_best.1 {
                        row_best = (x, score);
                    }
                }
                Ok(row_best)
            })
            .collect::<Result<Vec<_>, Cancelled>>()?;

        let mut best_score = f64::NEG_INFINITY;
        for (y, (x, score)) in row_bests.into_iter().enumerate() {
            if score > best_score {
                best_score = score;
                best.x = x as u32;
                best.y = y as u32;
            }
        }
        if self.report_progress {
            log::debug!("  ⏳ Correlation scanning: 100% ({} positions)", x_positions * y_positions);
        }

        best.correlation = best_score as f32;
        Ok(Some(best))
    }

    /// `sum(T' * I)` for every top-left offset, indexed `y * width + x`.
    ///
    /// Both signals are laid out row-major with the image width as stride in
    /// one buffer of `width * height` samples. For offsets where the template
    /// fits, every product index stays inside the buffer, so the circular
    /// correlation never wraps and no padding is needed.
    fn cross_correlation(
        &self,
        image: &GrayImage,
        centered_template: &[f64],
        tw: usize,
        th: usize,
        cancel: &CancelFlag,
    ) -> Result<Vec<f64>, Cancelled> {
        let (iw, ih) = (image.width() as usize, image.height() as usize);
        let len = iw * ih;

        // The template sums to zero, so removing the image mean leaves the
        // numerator unchanged and keeps the transform well conditioned
        let image_mean = image.pixels().map(|p| p[0] as f64).sum::<f64>() / len as f64;
        let mut signal: Vec<Complex<f64>> = image
            .pixels()
            .map(|p| Complex::new(p[0] as f64 - image_mean, 0.0))
            .collect();

        let mut kernel = vec![Complex::new(0.0, 0.0); len];
        for ty in 0..th {
            for tx in 0..tw {
                kernel[ty * iw + tx] = Complex::new(centered_template[ty * tw + tx], 0.0);
            }
        }

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);

        forward.process(&mut signal);
        cancel.check()?;
        forward.process(&mut kernel);
        cancel.check()?;
        if self.report_progress {
            log::debug!("  ⏳ Correlation scanning: spectra ready ({} samples)", len);
        }

        for (s, k) in signal.iter_mut().zip(kernel.iter()) {
            *s *= k.conj();
        }
        drop(kernel);

        inverse.process(&mut signal);
        cancel.check()?;

        let scale = 1.0 / len as f64;
        Ok(signal.into_iter().map(|c| c.re * scale).collect())
    }
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use image::imageops::crop_imm;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::time::{Duration, Instant};

    fn noise(width: u32, height: u32, seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        GrayImage::from_fn(width, height, |_, _| Luma([rng.random::<u8>()]))
    }

    fn best(image: &GrayImage, template: &GrayImage) -> Match {
        TemplateMatcher::new()
            .best_match(image, template, &CancelFlag::new())
            .unwrap()
            .unwrap()
    }

    /// Direct zero-mean NCC at one offset
    fn direct_score(image: &GrayImage, template: &GrayImage, x: u32, y: u32) -> f64 {
        let (tw, th) = template.dimensions();
        let n = (tw * th) as f64;
        let window: Vec<f64> = (0..th)
            .flat_map(|ty| (0..tw).map(move |tx| (tx, ty)))
            .map(|(tx, ty)| image.get_pixel(x + tx, y + ty)[0] as f64)
            .collect();
        let t: Vec<f64> = template.pixels().map(|p| p[0] as f64).collect();
        let wm = window.iter().sum::<f64>() / n;
        let tm = t.iter().sum::<f64>() / n;
        let num: f64 = window.iter().zip(&t).map(|(w, t)| (w - wm) * (t - tm)).sum();
        let wss: f64 = window.iter().map(|w| (w - wm) * (w - wm)).sum();
        let tss: f64 = t.iter().map(|t| (t - tm) * (t - tm)).sum();
        num / (wss * tss).sqrt()
    }

    #[test]
    fn test_exact_crop_scores_one() {
        let image = noise(80, 60, 1);
        let template = crop_imm(&image, 23, 17, 20, 15).to_image();

        let m = best(&image, &template);
        assert_eq!((m.x, m.y), (23, 17));
        assert!(m.correlation > 0.999, "got {}", m.correlation);
        assert_eq!(m.center(), (33, 24));
    }

    #[test]
    fn test_agrees_with_direct_computation() {
        let image = noise(45, 37, 10);
        let template = noise(9, 7, 11);

        let m = best(&image, &template);

        let mut expected = (0, 0, f64::NEG_INFINITY);
        for y in 0..=(37 - 7) {
            for x in 0..=(45 - 9) {
                let score = direct_score(&image, &template, x, y);
                if score > expected.2 {
                    expected = (x, y, score);
                }
            }
        }
        assert_eq!((m.x, m.y), (expected.0, expected.1));
        assert!((m.correlation as f64 - expected.2).abs() < 1e-4);
    }

    #[test]
    fn test_brightness_and_contrast_invariant() {
        let image = noise(60, 60, 2);
        let template = GrayImage::from_fn(12, 12, |x, y| {
            let v = image.get_pixel(30 + x, 8 + y)[0] as u32;
            Luma([(v / 2 + 40) as u8])
        });

        let m = best(&image, &template);
        assert_eq!((m.x, m.y), (30, 8));
        assert!(m.correlation > 0.99, "got {}", m.correlation);
    }

    #[test]
    fn test_unrelated_noise_scores_low() {
        let image = noise(120, 120, 3);
        let template = noise(30, 30, 4);

        let m = best(&image, &template);
        assert!(m.correlation < 0.5, "got {}", m.correlation);
    }

    #[test]
    fn test_flat_template_scores_zero() {
        let image = noise(40, 40, 5);
        let template = GrayImage::from_pixel(10, 10, Luma([200]));

        let m = best(&image, &template);
        assert_eq!(m.correlation, 0.0);
        assert_eq!((m.x, m.y), (0, 0));
    }

    #[test]
    fn test_flat_windows_score_zero() {
        // Textured strip on the left, flat everywhere else
        let image = GrayImage::from_fn(60, 20, |x, y| {
            if x < 10 { Luma([((x * 37 + y * 91) % 251) as u8]) } else { Luma([90]) }
        });
        let template = noise(8, 8, 12);

        let m = best(&image, &template);
        assert!(m.x < 10, "picked a flat window at x={}", m.x);
    }

    #[test]
    fn test_template_larger_than_image() {
        let image = noise(20, 20, 6);
        let template = noise(21, 10, 7);
        let found = TemplateMatcher::new()
            .best_match(&image, &template, &CancelFlag::new())
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_template_same_size_as_image() {
        let image = noise(16, 16, 8);
        let m = best(&image, &image);
        assert_eq!((m.x, m.y), (0, 0));
        assert!(m.correlation > 0.999);
    }

    #[test]
    fn test_cancelled_scan_stops() {
        let image = noise(64, 64, 9);
        let template = noise(16, 16, 10);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = TemplateMatcher::new().best_match(&image, &template, &cancel);
        assert_eq!(result, Err(Cancelled));
    }

    #[test]
    fn test_photo_sized_scan_is_fast() {
        let image = noise(800, 600, 13);
        let template = crop_imm(&image, 412, 287, 200, 200).to_image();

        let started = Instant::now();
        let m = best(&image, &template);

        assert_eq!((m.x, m.y), (412, 287));
        assert!(m.correlation > 0.999);
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "took {:?}",
            started.elapsed()
        );
    }
}
