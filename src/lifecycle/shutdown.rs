//! Stop signal shared between the binary and the engine event loop.

use tokio::sync::broadcast;

/// One-shot stop signal.
///
/// The built-in engine holds one per bootstrap to end its receive loop. The
/// binary holds another that fires on SIGINT/SIGTERM, and that a non
/// stay-alive engine shutdown may also fire. Cloning shares the signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver that resolves once [`trigger`](Self::trigger) is called.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Does nothing when no one is waiting.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
