use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::error;

/// Wait for the first SIGINT or SIGTERM and return its name.
///
/// The first signal is the drain trigger and is consumed exactly once; a
/// second signal while draining gets the operating system's default
/// treatment.
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Spawn the signal waiter and return the watch channel the server drains on.
///
/// The channel value is the signal name, logged at the shutdown transition.
pub fn spawn_signal_listener() -> watch::Receiver<&'static str> {
    let (tx, rx) = watch::channel("");
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(name) => {
                let _ = tx.send(name);
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handlers");
            }
        }
    });
    rx
}
