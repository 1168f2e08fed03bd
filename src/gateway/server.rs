//! Gateway server.
//!
//! Wires a [`ProviderClient`] into the [`router`] and serves it with axum.
//!
//! # Example
//!
//! ```rust,no_run
//! use greenapi_gateway::gateway::server::GatewayServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = GatewayServer::new("127.0.0.1:8080", "https://api.green-api.com")?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::gateway::client::ProviderClient;
use crate::gateway::error::GatewayError;
use crate::gateway::event::{EventHandler, GatewayEvent};
use crate::gateway::handler::{router, GatewayState};

/// A configured, not yet listening, gateway.
pub struct GatewayServer {
    addr: String,
    client: Arc<ProviderClient>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl GatewayServer {
    /// Create a server that will listen on `addr` and forward to `base_url`.
    ///
    /// Fails with [`GatewayError::Config`] when the address is blank or the
    /// base URL is not a valid `http`/`https` URL.
    pub fn new(addr: &str, base_url: &str) -> Result<Self, GatewayError> {
        let client = ProviderClient::new(base_url)
            .map_err(|e| GatewayError::Config(format!("init green api client: {}", e)))?;
        Self::with_client(addr, Arc::new(client))
    }

    /// Create a server around an existing client (custom transport, tests).
    pub fn with_client(addr: &str, client: Arc<ProviderClient>) -> Result<Self, GatewayError> {
        let addr = addr.trim();
        if addr.is_empty() {
            return Err(GatewayError::Config(
                "server address is required".to_string(),
            ));
        }

        Ok(Self {
            addr: addr.to_string(),
            client,
            event_handler: None,
        })
    }

    /// Attach an event handler that receives every [`GatewayEvent`].
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Configured listen address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    fn state(&self) -> GatewayState {
        let state = GatewayState::new(self.client.clone());
        match self.event_handler {
            Some(ref handler) => state.with_event_handler(handler.clone()),
            None => state,
        }
    }

    async fn bind(&self) -> Result<(TcpListener, SocketAddr), GatewayError> {
        let listener = TcpListener::bind(self.addr.as_str())
            .await
            .map_err(|e| GatewayError::Config(format!("listen on {}: {}", self.addr, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Config(format!("listen on {}: {}", self.addr, e)))?;

        if let Some(ref handler) = self.event_handler {
            handler
                .on_gateway_event(&GatewayEvent::ServerStarted {
                    addr: addr.to_string(),
                })
                .await;
        }
        info!("greenapi_gateway::server: listening on http://{}", addr);
        Ok((listener, addr))
    }

    /// Bind and serve in a background task.
    pub async fn start(self) -> Result<GatewayInstance, GatewayError> {
        let (listener, addr) = self.bind().await?;
        let app = router(self.state());
        let handle = tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(GatewayInstance { addr, handle })
    }

    /// Bind and serve until Ctrl-C, then shut down gracefully.
    pub async fn run(self) -> Result<(), GatewayError> {
        let (listener, _) = self.bind().await?;
        let app = router(self.state());
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(tokio::signal::ctrl_c()))
            .await
            .map_err(|e| GatewayError::Transport(format!("listen and serve: {}", e)))
    }
}

/// Resolve when `signal` fires. If the signal handler could not be installed,
/// never resolve, so the server keeps running instead of exiting right after
/// start-up.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("greenapi_gateway::server: shutting down"),
        Err(e) => {
            error!("greenapi_gateway::server: install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// A gateway serving in the background.
pub struct GatewayInstance {
    addr: SocketAddr,
    handle: JoinHandle<std::io::Result<()>>,
}

impl GatewayInstance {
    /// Address the listener is actually bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop serving. In-flight requests are dropped.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}
