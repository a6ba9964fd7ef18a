//! A minimal cooperative cancellation signal.
//!
//! The runtime checks this at every node boundary (a suspension point per the
//! concurrency model, §5) rather than aborting a node mid-flight, so state is never
//! corrupted by a cancellation arriving while a node holds it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
