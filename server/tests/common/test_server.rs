use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use clicker_server::db::PlayerStore;
use clicker_server::db::memory::MemoryPlayerStore;
use clicker_server::http_server::{AppState, run_http_server_with_listener};

/// HTTP server on an ephemeral local port, stopped on drop
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    cancellation_token: CancellationToken,
    handle: Option<JoinHandle<Result<()>>>,
}

impl TestServer {
    /// Start against a fresh in-memory store, returning the store for seeding
    pub async fn start_with_memory() -> Result<(Self, MemoryPlayerStore)> {
        let store = MemoryPlayerStore::new();
        let server = Self::start(Arc::new(store.clone())).await?;
        Ok((server, store))
    }

    pub async fn start(store: Arc<dyn PlayerStore>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let cancellation_token = CancellationToken::new();

        let handle = tokio::spawn(run_http_server_with_listener(
            listener,
            AppState::new(store),
            cancellation_token.clone(),
        ));

        Ok(Self {
            addr,
            client: reqwest::Client::new(),
            cancellation_token,
            handle: Some(handle),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.cancellation_token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.await??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
