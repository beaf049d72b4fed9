//! MCP HTTP server

mod health;
mod router;
mod rpc;

pub use health::HealthReport;
pub use router::{SESSION_HEADER, create_router};
pub use rpc::{Reply, call_result, dispatch, parse_message};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::client::{GatewayApi, GatewayClient, Service};
use crate::config::Config;
use crate::tools::ToolCatalog;
use crate::{Error, Result};

/// Shared application state
pub struct AppState {
    /// Registered tools
    pub catalog: Arc<ToolCatalog>,
    /// Gateway used by every tool call and the health probe
    pub gateway: Arc<dyn GatewayApi>,
}

/// OrcheSight MCP server
pub struct Server {
    config: Config,
    state: Arc<AppState>,
}

impl Server {
    /// Create a server with the standard catalog and a reqwest gateway client
    pub fn new(config: Config) -> Result<Self> {
        let client = GatewayClient::new(&config.gateway)?;
        for service in Service::ALL {
            info!(service = %service, base = %client.routes().base(service), "Service route");
        }
        let state = Arc::new(AppState {
            catalog: Arc::new(ToolCatalog::standard()),
            gateway: Arc::new(client),
        });
        Ok(Self { config, state })
    }

    /// Create a server around existing state
    pub fn with_state(config: Config, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Serve until Ctrl-C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = create_router(Arc::clone(&self.state), &self.config.server);
        let listener = TcpListener::bind(addr).await?;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            host = %self.config.server.host,
            port = self.config.server.port,
            tools = self.state.catalog.len(),
            "MCP endpoint at POST /mcp"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
