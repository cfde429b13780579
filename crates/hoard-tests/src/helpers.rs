//! Test helper functions and utilities.

use hoard_api::{AppState, RouterOptions, create_router};
use hoard_cache::CacheCoordinator;
use hoard_core::ports::BlobStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Start an API server for testing and return its address.
pub async fn start_test_server(
    coordinator: CacheCoordinator,
    blobs: Arc<dyn BlobStore>,
    upload_dir: &Path,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let state = Arc::new(AppState::new(Arc::new(coordinator), blobs, upload_dir));
    let app = create_router(state, RouterOptions::default());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Test server failed");
        }
    });

    // Give server time to start
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    Ok((addr, handle))
}

/// Create an HTTP client for testing.
pub fn test_client() -> anyhow::Result<Client> {
    Ok(Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

/// API test client with base URL.
pub struct ApiTestClient {
    client: Client,
    base_url: String,
}

impl ApiTestClient {
    pub fn new(addr: SocketAddr) -> anyhow::Result<Self> {
        Ok(Self {
            client: test_client()?,
            base_url: format!("http://{}", addr),
        })
    }

    pub async fn health(&self) -> anyhow::Result<bool> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Upload `data` as `file_name` and return the download link.
    pub async fn upload(&self, file_name: &str, data: Vec<u8>) -> anyhow::Result<String> {
        let form = Form::new().part("files", Part::bytes(data).file_name(file_name.to_string()));
        let resp = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        body["download_link"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("response has no download_link: {}", body))
    }

    /// Fetch a download link.
    pub async fn download(&self, link: &str) -> anyhow::Result<Vec<u8>> {
        let resp = self.client.get(link).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}
