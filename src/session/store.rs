//! In-memory puzzle sessions
//!
//! Sessions live until the process exits. There is no eviction: every
//! registered puzzle stays resident, so memory grows with each upload.

use crate::error::{ImageRole, LocateError, LocateResult};
use image::RgbImage;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Opaque identifier handed to the client after a puzzle upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random (UUID v4, 122 random bits) identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared mapping from session identifiers to reference images.
///
/// Cloning the store clones the handle; all clones see the same sessions.
/// Stored images are never mutated, so lookups hand out `Arc`s and drop
/// the lock before any matching work starts.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<RgbImage>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decoded puzzle image and return its new session identifier
    pub async fn create(&self, reference: RgbImage) -> LocateResult<SessionId> {
        if reference.width() == 0 || reference.height() == 0 {
            return Err(LocateError::InvalidImage {
                role: ImageRole::Puzzle,
                reason: format!(
                    "zero-sized image ({}x{})",
                    reference.width(),
                    reference.height()
                ),
            });
        }

        let session_id = SessionId::generate();
        let (width, height) = reference.dimensions();
        let total = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), Arc::new(reference));
            sessions.len()
        };

        log::info!(
            "🧩 Session {} created for {}x{} puzzle ({} sessions resident)",
            session_id,
            width,
            height,
            total
        );
        Ok(session_id)
    }

    /// Look up the puzzle image registered under `session_id`
    pub async fn get(&self, session_id: &str) -> LocateResult<Arc<RgbImage>> {
        let not_found = || LocateError::SessionNotFound {
            session_id: session_id.to_string(),
        };

        if session_id.is_empty() {
            return Err(not_found());
        }

        let sessions = self.sessions.read().await;
        sessions
            .get(&SessionId(session_id.to_string()))
            .cloned()
            .ok_or_else(not_found)
    }

    #[cfg(test)]
    pub async fn contains(&self, session_id: &str) -> bool {
        self.get(session_id).await.is_ok()
    }

    /// Number of resident sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
