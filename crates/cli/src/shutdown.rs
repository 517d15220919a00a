use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Owns the process-wide cancellation token. The first SIGINT or SIGTERM
/// cancels it; in-flight loads stop at the next chunk boundary and clean
/// up their scratch files.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn register_handlers(&self) {
        let token = self.token.clone();
        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            warn!(signal, "Shutdown requested, cancelling in-flight loads");
            token.cancel();
        });
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Resolves with the name of the first termination signal received. A
/// listener that cannot be installed never resolves.
async fn wait_for_signal() -> &'static str {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!("Cannot listen for SIGINT: {e}");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {e}");
                std::future::pending().await
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// A command failed, or a backfill finished with failed partitions.
    GeneralError = 1,
    ShutdownRequested = 130, // 128 + SIGINT
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
