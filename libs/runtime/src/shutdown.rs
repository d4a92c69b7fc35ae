use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Resolves on SIGTERM/SIGINT (Ctrl+C on Windows, plus console close/break).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("shutdown: SIGTERM received"),
            _ = sigint.recv() => tracing::info!("shutdown: SIGINT received"),
        }
    }

    #[cfg(windows)]
    {
        use tokio::signal::windows::{ctrl_break, ctrl_c, ctrl_close};
        let mut c = ctrl_c()?;
        let mut br = ctrl_break()?;
        let mut cl = ctrl_close()?;
        tokio::select! {
            _ = c.recv() => {},
            _ = br.recv() => {},
            _ = cl.recv() => {},
        }
        tracing::info!("shutdown: console signal received");
    }

    Ok(())
}

/// Spawn a task that cancels `token` once a shutdown signal arrives.
/// The task also ends quietly if the token is cancelled by someone else first.
pub fn cancel_on_shutdown(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            res = wait_for_shutdown() => {
                if let Err(e) = res {
                    tracing::error!(error = %e, "failed to install signal handlers; shutting down");
                }
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}
