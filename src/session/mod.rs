// Session module
// Binds uploaded puzzle images to the identifiers clients send with each piece.

pub mod store;

pub use store::{SessionId, SessionStore};
