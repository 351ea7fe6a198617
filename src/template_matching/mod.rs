/// Template matching module for the correlation fallback
///
/// This module provides exhaustive template matching with:
/// - Zero-mean normalized cross-correlation (brightness/contrast invariant)
/// - Integral images for constant-time window statistics
/// - Optional progress reporting for long scans
pub mod matcher;
pub mod types;

pub use matcher::TemplateMatcher;
pub use types::Match;
