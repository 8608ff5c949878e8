//! Shutdown coordination for the host process.

use tokio::sync::broadcast;

/// Coordinator for shutdown.
///
/// Provides a broadcast channel the binary and long-running tasks can
/// subscribe to; the signal handler triggers it once.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Wait until shutdown is triggered.
    pub async fn triggered(&self) {
        let mut rx = self.subscribe();
        let _ = rx.recv().await;
    }

    /// Clone the underlying sender for use in a spawned task.
    pub fn clone_sender(&self) -> broadcast::Sender<()> {
        self.tx.clone()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.trigger();
        assert!(rx.recv().await.is_ok());
    }
}
