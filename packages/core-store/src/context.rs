//! Call context carried through every backend call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::Error;

/// Ambient call context.
///
/// Carries a cooperative cancellation flag. Clones share the flag, so a
/// caller can keep one clone and cancel work running under another. The
/// coordinator only passes the context along; honoring it is up to each
/// backend.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_cancellation() {
        let cx = Context::new();
        let other = cx.clone();
        assert!(cx.check().is_ok());

        other.cancel();
        assert!(cx.is_cancelled());
        assert!(matches!(cx.check(), Err(Error::Cancelled)));
    }
}
