//! Replay server listener
//!
//! Binds the HTTP listener, spawns the replay driver and serves viewer
//! upgrades until shut down.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::hub::Hub;
use crate::record::Normalizer;
use crate::replay::ReplayDriver;
use crate::server::config::ServerConfig;
use crate::server::connection::{self, AppState};
use crate::source::RecordSource;
use crate::stats::ReplayMetrics;

/// Replay server for one line
pub struct ReplayServer<S: RecordSource> {
    config: ServerConfig,
    source: S,
    hub: Arc<Hub>,
    metrics: Arc<ReplayMetrics>,
}

impl<S: RecordSource> ReplayServer<S> {
    /// Create a new server replaying `source`
    pub fn new(config: ServerConfig, source: S) -> Self {
        let hub = Arc::new(Hub::with_config(config.hub.clone()));

        Self {
            config,
            source,
            hub,
            metrics: Arc::new(ReplayMetrics::new()),
        }
    }

    /// Get a reference to the viewer hub
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    pub fn metrics(&self) -> &Arc<ReplayMetrics> {
        &self.metrics
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// HTTP routes: the viewer endpoint plus health and stats
    pub fn router(&self) -> Router {
        let state = AppState {
            hub: Arc::clone(&self.hub),
            metrics: Arc::clone(&self.metrics),
        };

        Router::new()
            .route(&self.config.endpoint_path, get(connection::handle_upgrade))
            .route("/health", get(connection::health))
            .route("/stats", get(connection::stats))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let router = self.router();

        tracing::info!(
            addr = %addr,
            endpoint = %self.config.endpoint_path,
            "Replay server listening"
        );

        let Self {
            config,
            source,
            hub,
            metrics,
        } = self;

        let normalizer = Normalizer::new(config.normalize.clone());
        let driver = ReplayDriver::new(source, normalizer, Arc::clone(&hub), config.replay.clone())
            .with_metrics(metrics)
            .spawn();

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        // Stop the driver and release every connection task
        driver.abort();
        hub.disconnect_all().await;

        result?;
        Ok(())
    }
}
