/// Binary feature detection and matching
///
/// This module provides the building blocks of the feature-matching stage:
/// - Oriented FAST corners on a small image pyramid
/// - Rotated BRIEF descriptors (256 bits)
/// - Brute-force Hamming k-nearest-neighbour matching with a ratio test
pub mod descriptor;
pub mod matcher;
pub mod orb;

pub use descriptor::{Descriptor, Feature, Keypoint};
pub use matcher::{DescriptorMatcher, FeatureMatch, Neighbor};
pub use orb::{OrbConfig, OrbDetector};
