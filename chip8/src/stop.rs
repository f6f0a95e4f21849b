use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag used to ask a running machine to stop.
///
/// The run loop checks it between instructions and adapters check it while blocked on a key read.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
