//! Interrupt handling while a deployment is in flight

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Installs SIGTERM + SIGINT handlers that cancel the given token.
///
/// Cancelling stops the wait for confirmation; a broadcast transaction cannot be
/// recalled.
pub fn setup_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!(error = %e, "failed to register SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "failed to listen for SIGINT");
                        return;
                    }
                    info!("received SIGINT");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for SIGINT");
                return;
            }
            info!("received SIGINT");
        }

        cancel.cancel();
    });
}
