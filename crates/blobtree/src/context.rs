//! Call context threaded through every encode and decode frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CodecError, CodecResult};

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a handle kept by the caller can abort a
/// traversal running on another thread.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    /// A token in the "not cancelled" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Mark the token cancelled.
    ///
    /// Returns `true` if this call flipped the flag, `false` if it was
    /// already set.
    pub fn cancel(&self) -> bool {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Per-call context for [`Encoder`](crate::Encoder) and
/// [`Decoder`](crate::Decoder).
///
/// The codec checks the context before every store operation and before
/// descending into each child. Blobs already written when cancellation is
/// observed stay written; content addressing makes them harmless.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancellation: Cancellation,
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context observing `cancellation`.
    pub fn with_cancellation(cancellation: Cancellation) -> Self {
        Self { cancellation }
    }

    /// The cancellation token carried by this context.
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Fail with [`CodecError::Cancelled`] if the context was cancelled.
    pub fn check(&self) -> CodecResult<()> {
        if self.cancellation.is_cancelled() {
            Err(CodecError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_never_cancelled() {
        assert!(Context::background().check().is_ok());
    }

    #[test]
    fn cancel_is_seen_by_clones() {
        let token = Cancellation::new();
        let cx = Context::with_cancellation(token.clone());
        assert!(cx.check().is_ok());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(cx.cancellation().is_cancelled());
        assert!(matches!(cx.check(), Err(CodecError::Cancelled)));
    }
}
