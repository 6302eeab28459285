use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// A shutdown signal shared between the OS signal listener and the server.
///
/// Triggering is idempotent; waiters that subscribe after the trigger return
/// immediately.
#[derive(Debug)]
pub struct ShutdownSignal {
    triggered: watch::Sender<bool>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal in the non-shutdown state.
    pub fn new() -> Self {
        let (triggered, _) = watch::channel(false);
        Self { triggered }
    }

    /// Trigger the shutdown signal, waking all waiters.
    pub fn trigger(&self) {
        self.triggered.send_replace(true);
    }

    /// Check if shutdown has been triggered.
    pub fn is_shutdown(&self) -> bool {
        *self.triggered.borrow()
    }

    /// Wait until shutdown is triggered.
    pub async fn wait(&self) {
        let mut rx = self.triggered.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Trigger this signal on Ctrl-C or SIGTERM.
    pub fn listen_for_os_signals(self: &Arc<Self>) {
        let signal = Arc::clone(self);
        tokio::spawn(async move {
            os_signal().await;
            if !signal.is_shutdown() {
                signal.trigger();
            }
        });
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn os_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Received interrupt, shutting down"),
        _ = terminate => info!("Received terminate, shutting down"),
    }
}
