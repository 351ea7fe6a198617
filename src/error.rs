use crate::cancel::Cancelled;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for puzzle localization operations.
pub type LocateResult<T> = Result<T, LocateError>;

/// Which uploaded image a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Puzzle,
    Piece,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Puzzle => write!(f, "puzzle"),
            ImageRole::Piece => write!(f, "piece"),
        }
    }
}

/// Client-visible classification of every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidImage,
    SessionNotFound,
    MatchNotFound,
    InternalError,
}

/// The error type for all session and localization operations.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("No {role} image received")]
    MissingImage { role: ImageRole },

    #[error("Invalid {role} image: {reason}")]
    InvalidImage { role: ImageRole, reason: String },

    #[error("Session '{session_id}' not found")]
    SessionNotFound { session_id: String },

    #[error("Piece not found by feature matching or correlation fallback")]
    MatchNotFound,

    #[error("Internal error: {description}")]
    Internal { description: String },

    #[error("Localization timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Localization cancelled")]
    Cancelled(#[from] Cancelled),

    #[error("Localization task failed to complete: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl LocateError {
    pub fn internal(description: impl Into<String>) -> Self {
        LocateError::Internal {
            description: description.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LocateError::MissingImage { .. } | LocateError::InvalidImage { .. } => {
                ErrorKind::InvalidImage
            }
            LocateError::SessionNotFound { .. } => ErrorKind::SessionNotFound,
            LocateError::MatchNotFound => ErrorKind::MatchNotFound,
            LocateError::Internal { .. }
            | LocateError::Timeout { .. }
            | LocateError::Cancelled(_)
            | LocateError::JoinError { .. } => ErrorKind::InternalError,
        }
    }

    /// HTTP-style status code reported at the request boundary
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidImage | ErrorKind::SessionNotFound => 400,
            ErrorKind::MatchNotFound => 404,
            ErrorKind::InternalError => 500,
        }
    }

    /// Text shown to the client. Internal failures stay opaque.
    pub fn client_message(&self) -> String {
        match self {
            LocateError::MissingImage {
                role: ImageRole::Puzzle,
            } => "Missing puzzle image".to_string(),
            LocateError::MissingImage {
                role: ImageRole::Piece,
            } => "No piece image received.".to_string(),
            LocateError::InvalidImage {
                role: ImageRole::Puzzle,
                ..
            } => "Invalid image format".to_string(),
            LocateError::InvalidImage {
                role: ImageRole::Piece,
                ..
            } => "Invalid piece image format.".to_string(),
            LocateError::SessionNotFound { .. } => "Please upload a puzzle first.".to_string(),
            LocateError::MatchNotFound => {
                "Match not found. Try holding the piece flatter or improving lighting.".to_string()
            }
            LocateError::Internal { .. }
            | LocateError::Timeout { .. }
            | LocateError::Cancelled(_)
            | LocateError::JoinError { .. } => {
                "An internal error occurred while processing the image.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_status_codes() {
        let missing = LocateError::MissingImage {
            role: ImageRole::Piece,
        };
        assert_eq!(missing.kind(), ErrorKind::InvalidImage);
        assert_eq!(missing.status_code(), 400);

        let unknown = LocateError::SessionNotFound {
            session_id: "nope".to_string(),
        };
        assert_eq!(unknown.status_code(), 400);
        assert_eq!(LocateError::MatchNotFound.status_code(), 404);
        assert_eq!(LocateError::internal("boom").status_code(), 500);
        assert_eq!(
            LocateError::Timeout {
                duration: Duration::from_secs(1)
            }
            .kind(),
            ErrorKind::InternalError
        );
        assert_eq!(LocateError::from(Cancelled).status_code(), 500);
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let err = LocateError::internal("png encoder exploded at offset 42");
        assert!(err.to_string().contains("offset 42"));
        assert!(!err.client_message().contains("offset 42"));
    }

    #[test]
    fn test_piece_and_puzzle_messages_differ() {
        let piece = LocateError::InvalidImage {
            role: ImageRole::Piece,
            reason: "bad magic".to_string(),
        };
        let puzzle = LocateError::InvalidImage {
            role: ImageRole::Puzzle,
            reason: "bad magic".to_string(),
        };
        assert_eq!(piece.client_message(), "Invalid piece image format.");
        assert_eq!(puzzle.client_message(), "Invalid image format");
    }
}
