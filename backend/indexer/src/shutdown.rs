//! Graceful shutdown: the first SIGINT/SIGTERM cancels a shared token that
//! the poll loop and the HTTP server both watch.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancel `token` on the first shutdown signal, or when something else
/// cancels it first.
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        _ = wait_for_signal() => token.cancel(),
        _ = token.cancelled() => {}
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(int), Ok(term)) => (int, term),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("cannot install signal handlers ({e}), falling back to Ctrl+C");
                    return ctrl_c().await;
                }
            };

        tokio::select! {
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        // Without any handler, wait forever; the token can still be cancelled.
        Err(e) => {
            warn!("cannot listen for Ctrl+C: {e}");
            std::future::pending::<()>().await
        }
    }
}
