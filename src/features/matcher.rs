//! Brute-force Hamming matching with Lowe's ratio test

use super::descriptor::Feature;

/// One of the two nearest train descriptors for a query descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub train_idx: usize,
    pub distance: u32,
}

/// A query feature paired with its nearest train feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

pub struct DescriptorMatcher {
    ratio: f32,
}

impl DescriptorMatcher {
    pub fn new(ratio: f32) -> Self {
        Self { ratio }
    }

    /// Two nearest train features for every query feature.
    ///
    /// The second neighbour is `None` when `train` holds a single feature.
    /// Ties keep the lower train index.
    pub fn knn2(&self, query: &[Feature], train: &[Feature]) -> Vec<(Neighbor, Option<Neighbor>)> {
        if train.is_empty() {
            return Vec::new();
        }

        query
            .iter()
            .map(|q| {
                let mut best: Option<Neighbor> = None;
                let mut second: Option<Neighbor> = None;

                for (train_idx, t) in train.iter().enumerate() {
                    let candidate = Neighbor {
                        train_idx,
                        distance: q.descriptor.hamming(&t.descriptor),
                    };
                    match best {
                        Some(b) if candidate.distance >= b.distance => {
                            if second.is_none_or(|s| candidate.distance < s.distance) {
                                second = Some(candidate);
                            }
                        }
                        _ => {
                            second = best;
                            best = Some(candidate);
                        }
                    }
                }

                // train is non-empty so best is always set
                (best.unwrap_or(Neighbor { train_idx: 0, distance: u32::MAX }), second)
            })
            .collect()
    }

    /// Keep matches whose best distance is clearly below the runner-up
    pub fn match_features(&self, query: &[Feature], train: &[Feature]) -> Vec<FeatureMatch> {
        self.knn2(query, train)
            .into_iter()
            .enumerate()
            .filter_map(|(query_idx, (best, second))| {
                let second = second?;
                if (best.distance as f32) < self.ratio * second.distance as f32 {
                    Some(FeatureMatch {
                        query_idx,
                        train_idx: best.train_idx,
                        distance: best.distance,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::descriptor::{Descriptor, Keypoint};

    fn feature(bits: [u64; 4]) -> Feature {
        Feature {
            keypoint: Keypoint {
                x: 0.0,
                y: 0.0,
                score: 1.0,
                angle: 0.0,
                octave: 0,
            },
            descriptor: Descriptor(bits),
        }
    }

    #[test]
    fn test_knn2_orders_neighbours() {
        let matcher = DescriptorMatcher::new(0.75);
        let query = [feature([0, 0, 0, 0])];
        let train = [
            feature([0b111, 0, 0, 0]),
            feature([0b1, 0, 0, 0]),
            feature([0b11, 0, 0, 0]),
        ];

        let knn = matcher.knn2(&query, &train);
        assert_eq!(knn.len(), 1);
        let (best, second) = knn[0];
        assert_eq!(best, Neighbor { train_idx: 1, distance: 1 });
        assert_eq!(second, Some(Neighbor { train_idx: 2, distance: 2 }));
    }

    #[test]
    fn test_ratio_test_rejects_ambiguous() {
        let matcher = DescriptorMatcher::new(0.75);
        let query = [feature([0, 0, 0, 0])];
        // 4 vs 5: ratio 0.8, ambiguous
        let train = [feature([0xf, 0, 0, 0]), feature([0x1f, 0, 0, 0])];
        assert!(matcher.match_features(&query, &train).is_empty());
    }

    #[test]
    fn test_ratio_test_accepts_distinct() {
        let matcher = DescriptorMatcher::new(0.75);
        let query = [feature([0, 0, 0, 0])];
        let train = [feature([u64::MAX, 0, 0, 0]), feature([0, 0, 0, 0])];

        let matches = matcher.match_features(&query, &train);
        assert_eq!(
            matches,
            vec![FeatureMatch {
                query_idx: 0,
                train_idx: 1,
                distance: 0
            }]
        );
    }

    #[test]
    fn test_two_exact_duplicates_are_ambiguous() {
        let matcher = DescriptorMatcher::new(0.75);
        let query = [feature([5, 0, 0, 0])];
        let train = [feature([5, 0, 0, 0]), feature([5, 0, 0, 0])];
        assert!(matcher.match_features(&query, &train).is_empty());
    }

    #[test]
    fn test_single_train_feature_yields_no_match() {
        let matcher = DescriptorMatcher::new(0.75);
        let query = [feature([0, 0, 0, 0])];
        let train = [feature([0, 0, 0, 0])];
        assert!(matcher.match_features(&query, &train).is_empty());
    }

    #[test]
    fn test_empty_train_yields_nothing() {
        let matcher = DescriptorMatcher::new(0.75);
        let query = [feature([0, 0, 0, 0])];
        assert!(matcher.knn2(&query, &[]).is_empty());
    }
}
