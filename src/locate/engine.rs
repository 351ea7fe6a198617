//! Two-stage piece localization
//!
//! Stage 1 matches binary features between piece and puzzle and accepts the
//! mean matched position when enough matches agree on one tight cluster.
//! Stage 2 only runs when stage 1 has no answer: it slides the piece over
//! the puzzle and accepts the correlation peak if it clears the threshold.

use super::config::LocateConfig;
use super::types::{
    LocatedPiece, Localization, NoResultReason, Placement, Stage, StageOutcome, StageReport,
};
use crate::cancel::{CancelFlag, Cancelled};
use crate::error::{LocateError, LocateResult};
use crate::features::{DescriptorMatcher, OrbDetector};
use crate::image_io::luma_bt601;
use crate::overlay;
use crate::template_matching::TemplateMatcher;
use image::{GrayImage, RgbImage};

pub struct LocalizationEngine {
    config: LocateConfig,
    detector: OrbDetector,
    descriptor_matcher: DescriptorMatcher,
    template_matcher: TemplateMatcher,
}

impl LocalizationEngine {
    pub fn new(config: LocateConfig) -> Self {
        Self {
            detector: OrbDetector::new(config.features.clone()),
            descriptor_matcher: DescriptorMatcher::new(config.ratio_test),
            template_matcher: TemplateMatcher::new().with_progress(config.debug_enabled),
            config,
        }
    }

    /// Run the pipeline and return the placement, if any, with a stage trace.
    ///
    /// Stops early with `Cancelled` once `cancel` is raised.
    pub fn locate(
        &self,
        reference: &RgbImage,
        fragment: &RgbImage,
        cancel: &CancelFlag,
    ) -> Result<Localization, Cancelled> {
        let reference_gray = luma_bt601(reference);
        let fragment_gray = luma_bt601(fragment);

        let mut trace = Vec::with_capacity(2);

        let first = self.match_features(&reference_gray, &fragment_gray, cancel)?;
        let mut placement = Self::placement_of(&first);
        if let StageOutcome::NoResult(reason) = &first {
            log::debug!("Feature matching failed ({reason}), trying template correlation fallback");
        }
        trace.push(StageReport {
            stage: Stage::FeatureMatching,
            outcome: first,
        });

        if placement.is_none() {
            let second = self.correlate(&reference_gray, &fragment_gray, cancel)?;
            placement = Self::placement_of(&second);
            if let StageOutcome::NoResult(reason) = &second {
                log::debug!("Template correlation failed ({reason}), match failed both methods");
            }
            trace.push(StageReport {
                stage: Stage::TemplateCorrelation,
                outcome: second,
            });
        }

        Ok(Localization { placement, trace })
    }

    /// Locate the piece and render the overlay.
    ///
    /// Returns `MatchNotFound` when neither stage accepts and `Internal` when
    /// the overlay cannot be produced.
    pub fn locate_and_render(
        &self,
        reference: &RgbImage,
        fragment: &RgbImage,
        cancel: &CancelFlag,
    ) -> LocateResult<LocatedPiece> {
        let localization = self.locate(reference, fragment, cancel)?;
        let (Some(placement), Some(found_by)) = (localization.placement, localization.found_by())
        else {
            return Err(LocateError::MatchNotFound);
        };

        let overlay_png = overlay::render_png(reference, &placement, &self.config.overlay)?;
        Ok(LocatedPiece {
            placement,
            found_by,
            overlay_png,
        })
    }

    /// Stage 1: binary feature matching
    pub fn match_features(
        &self,
        reference: &GrayImage,
        fragment: &GrayImage,
        cancel: &CancelFlag,
    ) -> Result<StageOutcome, Cancelled> {
        let fragment_features = self.detector.detect_and_compute(fragment, cancel)?;
        let reference_features = self.detector.detect_and_compute(reference, cancel)?;
        log::debug!(
            "Features: fragment={} reference={}",
            fragment_features.len(),
            reference_features.len()
        );

        if fragment_features.is_empty() || reference_features.is_empty() {
            return Ok(StageOutcome::NoResult(NoResultReason::NoDescriptors {
                fragment: fragment_features.len(),
                reference: reference_features.len(),
            }));
        }

        cancel.check()?;
        let good = self
            .descriptor_matcher
            .match_features(&fragment_features, &reference_features);
        log::debug!("Ratio test kept {} of {} matches", good.len(), fragment_features.len());

        if good.len() < self.config.min_good_matches {
            return Ok(StageOutcome::NoResult(NoResultReason::TooFewMatches {
                good: good.len(),
                required: self.config.min_good_matches,
            }));
        }

        let points: Vec<(f64, f64)> = good
            .iter()
            .map(|m| {
                let kp = reference_features[m.train_idx].keypoint;
                (kp.x as f64, kp.y as f64)
            })
            .collect();
        let (mean_x, std_x) = mean_and_std(points.iter().map(|p| p.0));
        let (mean_y, std_y) = mean_and_std(points.iter().map(|p| p.1));
        log::debug!(
            "Match cluster mean=({:.1},{:.1}) std=({:.1},{:.1})",
            mean_x,
            mean_y,
            std_x,
            std_y
        );

        if std_x > self.config.max_spread_px || std_y > self.config.max_spread_px {
            return Ok(StageOutcome::NoResult(NoResultReason::Scattered {
                std_x,
                std_y,
                limit: self.config.max_spread_px,
            }));
        }

        Ok(StageOutcome::Found(Placement {
            center_x: mean_x as u32,
            center_y: mean_y as u32,
            width: fragment.width(),
            height: fragment.height(),
        }))
    }

    /// Stage 2: normalized cross-correlation fallback
    pub fn correlate(
        &self,
        reference: &GrayImage,
        fragment: &GrayImage,
        cancel: &CancelFlag,
    ) -> Result<StageOutcome, Cancelled> {
        let Some(best) = self
            .template_matcher
            .best_match(reference, fragment, cancel)?
        else {
            return Ok(StageOutcome::NoResult(
                NoResultReason::FragmentLargerThanReference,
            ));
        };
        log::debug!("Template match confidence: {:.4}", best.correlation);

        let outcome = if best.correlation > self.config.min_correlation {
            let (center_x, center_y) = best.center();
            StageOutcome::Found(Placement {
                center_x,
                center_y,
                width: best.width,
                height: best.height,
            })
        } else {
            StageOutcome::NoResult(NoResultReason::BelowThreshold {
                score: best.correlation,
                threshold: self.config.min_correlation,
            })
        };
        Ok(outcome)
    }

    fn placement_of(outcome: &StageOutcome) -> Option<Placement> {
        match outcome {
            StageOutcome::Found(placement) => Some(*placement),
            StageOutcome::NoResult(_) => None,
        }
    }
}

impl Default for LocalizationEngine {
    fn default() -> Self {
        Self::new(LocateConfig::default())
    }
}

/// Mean and population standard deviation
fn mean_and_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod stats_tests {
    use super::mean_and_std;

    #[test]
    fn test_population_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let (mean, std) = mean_and_std(values.iter().copied());
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(mean_and_std(std::iter::empty::<f64>()), (0.0, 0.0));
    }
}
