// ABOUTME: HTTP server setup and lifecycle for the callback service
// ABOUTME: Loads the directory once, binds the listener, and shuts down on SIGINT/SIGTERM

use crate::dispatcher::Dispatcher;
use anyhow::{Context, Result};
use sshhook_core::config::normalize_listen;
use sshhook_core::{Config, Directory, Resolver, Validator};
use std::future::{Future, IntoFuture};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// How long in-flight callbacks may run after a shutdown signal.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Load the config file, build the directory and serve until a signal arrives.
///
/// Any configuration problem is returned before the listener is bound, so the
/// service never answers callbacks from a partially loaded directory.
pub async fn run(config_path: &Path, listen_override: Option<String>) -> Result<()> {
    info!("Loading config from {}", config_path.display());
    let Config {
        listen,
        clusters,
        users,
    } = Config::load(config_path).context("loading config")?;

    let directory = Arc::new(Directory::build(users, clusters).context("building directory")?);
    info!(
        users = directory.user_count(),
        clusters = directory.cluster_count(),
        "Directory loaded"
    );

    let dispatcher = Dispatcher::new(
        Validator::new(directory.clone()),
        Resolver::new(directory),
    );

    let addr = normalize_listen(listen_override.as_deref().unwrap_or(&listen));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Webhook server started on {}", listener.local_addr()?);

    serve(listener, dispatcher, shutdown_signal()).await?;

    info!("Server shut down");
    Ok(())
}

/// Serve callbacks on `listener` until `shutdown` resolves, then give
/// in-flight requests [`SHUTDOWN_TIMEOUT`] to finish.
pub async fn serve<F>(listener: TcpListener, dispatcher: Dispatcher, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, dispatcher.router())
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = stopping_tx.send(true);
        })
        .into_future();

    let deadline = async move {
        if stopping_rx.wait_for(|stopping| *stopping).await.is_ok() {
            tokio::time::sleep(SHUTDOWN_TIMEOUT).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result.context("running HTTP server")?,
        _ = deadline => warn!("Timed out waiting for in-flight callbacks"),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn dispatcher() -> Dispatcher {
        let directory = Arc::new(Directory::default());
        Dispatcher::new(Validator::new(directory.clone()), Resolver::new(directory))
    }

    #[tokio::test]
    async fn test_serve_answers_and_shuts_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(serve(listener, dispatcher(), async move {
            let _ = stop_rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
        assert!(response.contains(r#""status":"ok""#));

        stop_tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("server should stop promptly")
            .expect("server task should not panic");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_config() {
        let result = run(Path::new("/nonexistent/webhook.yaml"), None).await;
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("loading config"));
    }

    #[tokio::test]
    async fn test_run_fails_on_invalid_directory() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"users:\n  - username: alice\n    password: a\n  - username: alice\n    password: b\n",
        )
        .unwrap();

        let err = run(file.path(), Some("127.0.0.1:0".to_string()))
            .await
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("building directory"));
        assert!(message.contains("duplicate user: alice"));
    }
}
