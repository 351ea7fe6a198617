//! Transport-agnostic request handling
//!
//! `PuzzleService` owns the session store and the localization engine and
//! answers both operations with an `ApiResponse` that any front end can
//! serialize.

pub mod puzzle_service;
pub mod types;


pub use puzzle_service::{PuzzleService, ServiceConfig};
pub use types::{ApiResponse, LocatePieceRequest, RegisterPuzzleRequest, ResponseBody};
