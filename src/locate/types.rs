// Types for the two-stage localization pipeline
use crate::image_io;
use std::fmt;

/// Where a piece sits in the puzzle image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub center_x: u32,
    pub center_y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FeatureMatching,
    TemplateCorrelation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::FeatureMatching => write!(f, "feature matching"),
            Stage::TemplateCorrelation => write!(f, "template correlation"),
        }
    }
}

/// Why a stage gave no answer. None of these are failures of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum NoResultReason {
    /// One of the images yielded no descriptors at all
    NoDescriptors {
        fragment: usize,
        reference: usize,
    },
    /// Too few matches survived the ratio test
    TooFewMatches { good: usize, required: usize },
    /// Matches are too spread out to describe a single location
    Scattered { std_x: f64, std_y: f64, limit: f64 },
    /// The fragment cannot be slid over the reference
    FragmentLargerThanReference,
    /// Best correlation did not exceed the acceptance threshold
    BelowThreshold { score: f32, threshold: f32 },
}

impl fmt::Display for NoResultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoResultReason::NoDescriptors {
                fragment,
                reference,
            } => write!(
                f,
                "no descriptors (fragment {fragment}, reference {reference})"
            ),
            NoResultReason::TooFewMatches { good, required } => {
                write!(f, "{good} good matches, need {required}")
            }
            NoResultReason::Scattered {
                std_x,
                std_y,
                limit,
            } => write!(
                f,
                "matches scattered (std {std_x:.1}, {std_y:.1} > {limit:.0}px)"
            ),
            NoResultReason::FragmentLargerThanReference => {
                write!(f, "fragment larger than reference")
            }
            NoResultReason::BelowThreshold { score, threshold } => {
                write!(f, "confidence {score:.4} not above {threshold}")
            }
        }
    }
}

/// Tagged result of a single stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Found(Placement),
    NoResult(NoResultReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Outcome of running the pipeline: the placement, if any stage produced
/// one, and a report for every stage that ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Localization {
    pub placement: Option<Placement>,
    pub trace: Vec<StageReport>,
}

impl Localization {
    pub fn found(&self) -> bool {
        self.placement.is_some()
    }

    /// Stage that produced the placement
    pub fn found_by(&self) -> Option<Stage> {
        self.trace.iter().find_map(|report| match report.outcome {
            StageOutcome::Found(_) => Some(report.stage),
            StageOutcome::NoResult(_) => None,
        })
    }

    #[cfg(test)]
    pub fn ran(&self, stage: Stage) -> bool {
        self.trace.iter().any(|report| report.stage == stage)
    }
}

/// A located piece together with the rendered overlay
#[derive(Debug, Clone)]
pub struct LocatedPiece {
    pub placement: Placement,
    pub found_by: Stage,
    /// Puzzle image with the box drawn on it, PNG encoded
    pub overlay_png: Vec<u8>,
}

impl LocatedPiece {
    pub fn overlay_base64(&self) -> String {
        image_io::base64_encode(&self.overlay_png)
    }
}
