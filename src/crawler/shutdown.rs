//! Termination signal handling
//!
//! SIGINT and SIGTERM both lead to the same graceful path: the frontier controller
//! saves its checkpoint and the process exits successfully.

use tokio::signal;

/// Resolves once the process receives an interrupt or terminate signal
///
/// If a signal handler cannot be installed, that signal is simply never observed;
/// the other one still works.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for interrupt signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for terminate signal: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => tracing::info!("Received interrupt signal"),
        _ = terminate => tracing::info!("Received terminate signal"),
    }
}
