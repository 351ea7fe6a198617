//! Cooperative cancellation for long-running matching work

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Returned by matching code that noticed its flag was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("matching cancelled")]
pub struct Cancelled;

/// Shared flag polled by the detector and the correlation scan.
///
/// Clones observe the same flag. Raising it is permanent.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the flag is raised
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
