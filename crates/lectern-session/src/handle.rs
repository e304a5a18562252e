//! A cloneable handle for cancelling a turn from outside the session.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// A cloneable handle for cancelling the in-flight turn.
///
/// The session swaps in a fresh token at the start of every turn, so an
/// abort issued while idle does not poison the next turn.
#[derive(Clone)]
pub struct TurnHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) is_streaming: Arc<AtomicBool>,
}

impl TurnHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            is_streaming: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the current turn. No-op when idle.
    pub fn abort(&self) {
        if self.is_streaming() {
            tracing::debug!("Turn abort requested");
        }
        self.cancel.lock().cancel();
    }

    /// Whether a turn is currently streaming
    pub fn is_streaming(&self) -> bool {
        self.is_streaming.load(Ordering::Acquire)
    }

    /// Install a fresh token for a new turn and return it
    pub(crate) fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        self.is_streaming.store(true, Ordering::Release);
        token
    }

    pub(crate) fn finish(&self) {
        self.is_streaming.store(false, Ordering::Release);
    }
}
