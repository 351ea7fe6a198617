//! Configuration for piece localization

use crate::features::OrbConfig;
use crate::overlay::OverlayStyle;

/// Tuning constants for both localization stages.
///
/// The defaults are empirical; callers relying on the exact accept/reject
/// behaviour should not change them.
#[derive(Debug, Clone)]
pub struct LocateConfig {
    /// Feature detector settings
    pub features: OrbConfig,
    /// Lowe ratio: keep a match only if best < ratio * second best
    pub ratio_test: f32,
    /// Minimum ratio-test survivors for the feature stage to answer
    pub min_good_matches: usize,
    /// Maximum per-axis standard deviation (pixels) of matched positions
    pub max_spread_px: f64,
    /// Correlation the fallback stage must exceed
    pub min_correlation: f32,
    /// Result box appearance
    pub overlay: OverlayStyle,
    /// Log correlation scan progress
    pub debug_enabled: bool,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            features: OrbConfig::default(),
            ratio_test: 0.75,
            min_good_matches: 15,
            max_spread_px: 40.0,
            min_correlation: 0.8,
            overlay: OverlayStyle::default(),
            debug_enabled: false,
        }
    }
}
