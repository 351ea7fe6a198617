// Request and response shapes for the two service operations
use crate::error::LocateError;
use crate::locate::LocatedPiece;
use crate::session::SessionId;
use serde::Serialize;

/// Upload of the reference puzzle (form field `puzzle`)
#[derive(Debug, Clone, Default)]
pub struct RegisterPuzzleRequest {
    pub puzzle: Option<Vec<u8>>,
}

/// Upload of a piece to locate (form fields `session_id` and `piece`)
#[derive(Debug, Clone, Default)]
pub struct LocatePieceRequest {
    pub session_id: Option<String>,
    pub piece: Option<Vec<u8>>,
}

/// JSON body returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Registered {
        message: String,
        session_id: String,
    },
    Located {
        message: String,
        x: u32,
        y: u32,
        puzzle_image: String,
    },
    Failed {
        message: String,
    },
}

impl ResponseBody {
    pub fn message(&self) -> &str {
        match self {
            ResponseBody::Registered { message, .. }
            | ResponseBody::Located { message, .. }
            | ResponseBody::Failed { message } => message,
        }
    }
}

/// Status code plus body, ready for whatever transport carries it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn registered(session_id: &SessionId) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Registered {
                message: "Puzzle uploaded successfully".to_string(),
                session_id: session_id.to_string(),
            },
        }
    }

    pub fn located(piece: &LocatedPiece) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Located {
                message: "Piece located!".to_string(),
                x: piece.placement.center_x,
                y: piece.placement.center_y,
                puzzle_image: piece.overlay_base64(),
            },
        }
    }

    pub fn from_error(error: &LocateError) -> Self {
        Self {
            status: error.status_code(),
            body: ResponseBody::Failed {
                message: error.client_message(),
            },
        }
    }

    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Serialized body
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }
}
