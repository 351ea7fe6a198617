//! Piece localization engine
//!
//! Finds a piece photo inside the puzzle image with feature matching first
//! and correlation as a fallback, then renders the result box.

pub mod config;
pub mod engine;
pub mod types;


pub use config::LocateConfig;
pub use engine::LocalizationEngine;
pub use types::{
    LocatedPiece, Localization, NoResultReason, Placement, Stage, StageOutcome, StageReport,
};
