//! Progress and status notification interface.
//!
//! Loaders, savers and presenters report progress to an external
//! listener; the core never blocks on it. Cancellation is cooperative:
//! the loader checks a shared token at each record boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Classification of a status message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Ok,
    Warning,
    Error,
}

/// Receiver of human-readable progress and status notifications.
///
/// `fraction`, when present, is a load/save progress value in
/// `[0.0, 1.0]`.
pub trait ProgressListener {
    fn notify(&self, kind: MessageKind, msg: &str, fraction: Option<f64>);
}

/// A listener that discards all notifications.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullListener;

impl ProgressListener for NullListener {
    fn notify(&self, _: MessageKind, _: &str, _: Option<f64>) {}
}

/// Cooperative cancellation flag shared between a caller and a loader.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
