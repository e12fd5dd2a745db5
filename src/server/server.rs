//! HTTP server
//!
//! One router served on every configured listen address. An address with a
//! `:` is a TCP `host:port`; anything else is a unix socket path.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinSet;

use super::handlers::{self, AppState};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};

/// Build the router with every route and its state, without binding.
pub fn build_router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route(
            "/key/{*name}",
            get(handlers::get_key)
                .put(handlers::put_key)
                .delete(handlers::delete_key),
        )
        .route("/iterate", get(handlers::iterate))
        .route("/batch", post(handlers::batch))
        .route("/property/{name}", get(handlers::property))
        .route("/snapshot", post(handlers::snapshot))
        // Values and batches have no size cap
        .layer(DefaultBodyLimit::disable())
        .with_state(AppState { engine })
}

/// HTTP server for RangeKV
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            engine,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Start the server (blocking) until Ctrl+C or [`Server::shutdown`]
    pub fn run(&self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async {
            let shutdown = Arc::clone(&self.shutdown);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Received Ctrl+C, initiating shutdown...");
                    shutdown.send_replace(true);
                }
            });

            self.serve().await
        })
    }

    /// Serve every listen address until shutdown is signaled
    pub async fn serve(&self) -> Result<()> {
        let router = build_router(Arc::clone(&self.engine));
        let mut listeners = JoinSet::new();

        for addr in &self.config.listen_addrs {
            let router = router.clone();
            let stop = self.shutdown.subscribe();

            if addr.contains(':') {
                let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
                tracing::info!("Listening on http://{}", listener.local_addr()?);
                listeners.spawn(serve_on(listener, router, stop));
            } else {
                let listener = bind_unix(Path::new(addr))?;
                tracing::info!("Listening on unix:{}", addr);
                listeners.spawn(serve_on(listener, router, stop));
            }
        }

        let mut outcome = Ok(());
        while let Some(joined) = listeners.join_next().await {
            let result = match joined {
                Ok(served) => served.map_err(KvError::from),
                Err(e) => Err(KvError::Unexpected(format!("listener task failed: {e}"))),
            };
            if let Err(e) = result {
                tracing::error!("Listener stopped: {}", e);
                // Take the other listeners down with it
                self.shutdown();
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }

        tracing::info!("Server stopped");
        outcome
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

async fn serve_on<L>(
    listener: L,
    router: Router,
    mut stop: watch::Receiver<bool>,
) -> std::io::Result<()>
where
    L: axum::serve::Listener,
    L::Addr: Debug,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = stop.wait_for(|stop| *stop).await;
        })
        .await
}

#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<tokio::net::UnixListener> {
    // A socket file left by an earlier run would make bind fail
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(tokio::net::UnixListener::bind(path)?)
}

#[cfg(not(unix))]
fn bind_unix(path: &Path) -> Result<tokio::net::TcpListener> {
    Err(KvError::Config(format!(
        "unix socket listen addresses are not supported here: {}",
        path.display()
    )))
}
