//! OS signal handling.

use crate::lifecycle::shutdown::Shutdown;

/// Wait for a termination signal (Ctrl+C, or SIGTERM on unix).
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
    tracing::info!("Shutdown signal received");
}

/// Spawn a task that triggers the shutdown coordinator on the first
/// termination signal.
pub fn trigger_on_signal(shutdown: &Shutdown) {
    let tx = shutdown.clone_sender();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(());
    });
}
