//! Test server wrapper that starts Bulwark on a random port

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use bulwark_config::Config;
use bulwark_server::{LogSink, Server};
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server with the harness routes and a `tracing` sink
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        Self::serve(Server::new(&config, super::routes::router())).await
    }

    /// Start a test server whose log records go to `sink`
    pub async fn start_with_sink(config: Config, sink: Arc<dyn LogSink>) -> anyhow::Result<Self> {
        Self::serve(Server::with_sink(&config, super::routes::router(), sink)).await
    }

    /// Start an already assembled server
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn serve(server: Server) -> anyhow::Result<Self> {
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router: Router = server.into_router();

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self { addr, shutdown, client })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
