//! Web server for mediashelf.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::asset::AssetStore;
use crate::config::{AssetsConfig, WebConfig};
use crate::{MediaError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the asset API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Web configuration.
    web_config: WebConfig,
}

impl WebServer {
    /// Create a new web server.
    ///
    /// Opens (and creates if needed) the asset root from `assets`.
    pub fn new(config: &WebConfig, assets: &AssetsConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| MediaError::Config(format!("invalid web server address: {e}")))?;

        let store = AssetStore::from_config(assets)?;
        tracing::info!("Asset root initialized at: {}", store.root().display());

        Ok(Self::with_state(
            addr,
            AppState::from_config(store, assets),
            config,
        ))
    }

    /// Create a web server around an existing state.
    pub fn with_state(addr: SocketAddr, app_state: AppState, config: &WebConfig) -> Self {
        Self {
            addr,
            app_state: Arc::new(app_state),
            web_config: config.clone(),
        }
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(self) -> Router {
        create_router(self.app_state, &self.web_config.cors_origins)
            .merge(create_health_router())
            .layer(CompressionLayer::new())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let addr = self.addr;
        let router = self.build_router();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let addr = self.addr;
        let router = self.build_router();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
