//! Binary descriptors and keypoints

/// 256-bit rotated-BRIEF fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Descriptor(pub [u64; 4]);

impl Descriptor {
    pub const BITS: usize = 256;

    pub fn set_bit(&mut self, bit: usize) {
        self.0[bit / 64] |= 1 << (bit % 64);
    }

    #[cfg(test)]
    pub fn bit(&self, bit: usize) -> bool {
        self.0[bit / 64] & (1 << (bit % 64)) != 0
    }

    /// Number of differing bits
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// A detected corner, in full-resolution image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// FAST score used for ranking
    pub score: f32,
    /// Intensity-centroid orientation in radians
    pub angle: f32,
    /// Pyramid level the corner was found on
    pub octave: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_identical_is_zero() {
        let d = Descriptor([0xdead_beef, 7, u64::MAX, 0]);
        assert_eq!(d.hamming(&d), 0);
    }

    #[test]
    fn test_hamming_counts_all_words() {
        let a = Descriptor([0, 0, 0, 0]);
        let b = Descriptor([1, 0b11, 0, u64::MAX]);
        assert_eq!(a.hamming(&b), 1 + 2 + 64);
    }

    #[test]
    fn test_set_bit_spans_words() {
        let mut d = Descriptor::default();
        d.set_bit(0);
        d.set_bit(63);
        d.set_bit(64);
        d.set_bit(255);
        assert!(d.bit(0) && d.bit(63) && d.bit(64) && d.bit(255));
        assert!(!d.bit(1));
        assert_eq!(d.hamming(&Descriptor::default()), 4);
    }
}
