//! Request boundary for puzzle registration and piece localization

use super::types::{ApiResponse, LocatePieceRequest, RegisterPuzzleRequest};
use crate::cancel::CancelFlag;
use crate::error::{ErrorKind, ImageRole, LocateError, LocateResult};
use crate::image_io;
use crate::locate::{LocateConfig, LocatedPiece, LocalizationEngine};
use crate::session::{SessionId, SessionStore};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub locate: LocateConfig,
    /// Upper bound on one localization; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            locate: LocateConfig::default(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Session store plus localization engine behind the two request operations.
///
/// Cheap to clone; clones share sessions.
#[derive(Clone)]
pub struct PuzzleService {
    sessions: SessionStore,
    engine: Arc<LocalizationEngine>,
    request_timeout: Option<Duration>,
}

impl PuzzleService {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            sessions: SessionStore::new(),
            engine: Arc::new(LocalizationEngine::new(config.locate)),
            request_timeout: config.request_timeout,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Decode and store a puzzle image, returning its session identifier
    pub async fn register(&self, puzzle: Option<&[u8]>) -> LocateResult<SessionId> {
        let bytes = puzzle.ok_or(LocateError::MissingImage {
            role: ImageRole::Puzzle,
        })?;
        let image = image_io::decode_rgb(bytes, ImageRole::Puzzle)?;
        self.sessions.create(image).await
    }

    /// Locate a piece inside the puzzle registered under `session_id`.
    ///
    /// The session is checked before the piece payload. Matching runs on the
    /// blocking pool; when the timeout fires the request fails and the
    /// matching task is told to stop at its next checkpoint.
    pub async fn locate(
        &self,
        session_id: Option<&str>,
        piece: Option<&[u8]>,
    ) -> LocateResult<LocatedPiece> {
        let reference = self.sessions.get(session_id.unwrap_or_default()).await?;

        let bytes = piece.ok_or(LocateError::MissingImage {
            role: ImageRole::Piece,
        })?;
        let fragment = image_io::decode_rgb(bytes, ImageRole::Piece)?;

        let engine = Arc::clone(&self.engine);
        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            engine.locate_and_render(&reference, &fragment, &worker_cancel)
        });

        let joined = match self.request_timeout {
            Some(duration) => match tokio::time::timeout(duration, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    cancel.cancel();
                    return Err(LocateError::Timeout { duration });
                }
            },
            None => task.await,
        };
        joined?
    }

    /// Register operation as seen by a transport: never fails, always
    /// answers with a status and body
    pub async fn register_puzzle(&self, request: RegisterPuzzleRequest) -> ApiResponse {
        match self.register(request.puzzle.as_deref()).await {
            Ok(session_id) => ApiResponse::registered(&session_id),
            Err(e) => Self::reject("register puzzle", &e),
        }
    }

    /// Locate operation as seen by a transport
    pub async fn locate_piece(&self, request: LocatePieceRequest) -> ApiResponse {
        let session_id = request.session_id.as_deref();
        match self.locate(session_id, request.piece.as_deref()).await {
            Ok(piece) => {
                log::info!(
                    "✅ Piece located at ({},{}) {}x{} by {}",
                    piece.placement.center_x,
                    piece.placement.center_y,
                    piece.placement.width,
                    piece.placement.height,
                    piece.found_by
                );
                ApiResponse::located(&piece)
            }
            Err(e) => Self::reject("locate piece", &e),
        }
    }

    fn reject(operation: &str, error: &LocateError) -> ApiResponse {
        match error.kind() {
            ErrorKind::InternalError => log::error!("❌ {operation}: {error}"),
            ErrorKind::MatchNotFound => log::info!("🔍 {operation}: {error}"),
            ErrorKind::InvalidImage | ErrorKind::SessionNotFound => {
                log::warn!("⚠️ {operation} rejected: {error}")
            }
        }
        ApiResponse::from_error(error)
    }
}

impl Default for PuzzleService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}
