pub mod cancel;
pub mod error;
pub mod features;
pub mod image_io;
pub mod locate;
pub mod overlay;
pub mod service;
pub mod session;
pub mod template_matching;

pub use cancel::{CancelFlag, Cancelled};
pub use error::{ErrorKind, LocateError, LocateResult};
pub use locate::{LocateConfig, LocatedPiece, LocalizationEngine, Placement};
pub use service::{ApiResponse, PuzzleService, ServiceConfig};
pub use session::{SessionId, SessionStore};
