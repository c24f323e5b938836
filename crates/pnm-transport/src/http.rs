//! HTTP connector.
//!
//! The one connector implementation that ships in-tree: the capture file
//! server exposes uploaded files over plain GET, so reqwest covers the
//! whole protocol surface.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use pnm_core::ConnectionParams;

use crate::remote::RemoteConnector;

/// Fetches capture files over HTTP GET.
pub struct HttpConnector {
    client: reqwest::Client,
    base_url: RwLock<Option<String>>,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: RwLock::new(None),
        }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteConnector for HttpConnector {
    async fn connect(&self, params: &ConnectionParams) -> Result<()> {
        let base = match params.port {
            Some(port) => format!("http://{}:{}", params.host, port),
            None => format!("http://{}", params.host),
        };
        debug!(%base, "http connector configured");
        *self.base_url.write() = Some(base);
        Ok(())
    }

    async fn download(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        let base = self
            .base_url
            .read()
            .clone()
            .context("http connector used before connect")?;
        let url = format!("{}/{}", base, remote_path.trim_start_matches('/'));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let bytes = response.bytes().await.context("reading response body")?;

        tokio::fs::write(local_path, &bytes)
            .await
            .with_context(|| format!("writing {}", local_path.display()))?;
        Ok(())
    }

    async fn disconnect(&self) {
        *self.base_url.write() = None;
    }
}
