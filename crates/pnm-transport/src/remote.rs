//! Remote-file transport drivers.
//!
//! One [`RemoteFetcher`] per supported remote protocol, all sharing the
//! same shape: reachability precheck, then connect/download/disconnect
//! through a [`RemoteConnector`]. Any connector failure is normalized to
//! the protocol's single fetch-error code so the orchestrator never
//! inspects protocol-level error types.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use pnm_core::{CaptureFilename, ConnectionParams, RetrievalMethod};

use crate::precheck::HostPrecheck;
use crate::{Fetcher, TransportError};

/// Wire-protocol connector, one implementation per remote protocol.
///
/// The protocol implementations are external collaborators; this crate
/// ships only the HTTP one (see [`crate::http::HttpConnector`]).
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    /// Establish a session with the remote endpoint.
    async fn connect(&self, params: &ConnectionParams) -> Result<()>;

    /// Download one remote file to a local path.
    async fn download(&self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// Tear the session down. Infallible; failures are logged internally.
    async fn disconnect(&self);
}

/// Precheck-then-connector driver shared by TFTP, HTTP, and SFTP.
pub struct RemoteFetcher {
    method: RetrievalMethod,
    params: ConnectionParams,
    save_dir: PathBuf,
    precheck: HostPrecheck,
    connector: Arc<dyn RemoteConnector>,
}

impl RemoteFetcher {
    pub fn new(
        method: RetrievalMethod,
        params: ConnectionParams,
        save_dir: PathBuf,
        precheck: HostPrecheck,
        connector: Arc<dyn RemoteConnector>,
    ) -> Self {
        Self {
            method,
            params,
            save_dir,
            precheck,
            connector,
        }
    }

    fn fetch_error(&self, filename: &CaptureFilename, detail: impl std::fmt::Display) -> TransportError {
        TransportError::Fetch {
            method: self.method,
            filename: filename.as_str().to_string(),
            detail: detail.to_string(),
        }
    }

    fn remote_path(&self, filename: &CaptureFilename) -> String {
        let dir = self.params.remote_dir.trim_end_matches('/');
        format!("{}/{}", dir, filename.as_str())
    }
}

#[async_trait]
impl Fetcher for RemoteFetcher {
    fn method(&self) -> RetrievalMethod {
        self.method
    }

    async fn fetch(&self, filename: &CaptureFilename) -> Result<PathBuf, TransportError> {
        if !self.precheck.reachable(&self.params.host).await {
            warn!(method = %self.method, host = %self.params.host, "host unreachable, skipping transfer");
            return Err(TransportError::HostUnreachable {
                method: self.method,
                host: self.params.host.clone(),
            });
        }

        let local_path = self.save_dir.join(filename.as_str());
        tokio::fs::create_dir_all(&self.save_dir)
            .await
            .map_err(|err| self.fetch_error(filename, err))?;

        if let Err(err) = self.connector.connect(&self.params).await {
            return Err(self.fetch_error(filename, err));
        }

        let remote_path = self.remote_path(filename);
        let download = self.connector.download(&remote_path, &local_path).await;
        self.connector.disconnect().await;
        download.map_err(|err| self.fetch_error(filename, err))?;

        info!(method = %self.method, %filename, dest = %local_path.display(), "capture file retrieved");
        Ok(local_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precheck::Pinger;
    use parking_lot::Mutex;
    use pnm_core::ServiceStatus;
    use std::net::IpAddr;
    use std::time::Duration;

    struct ScriptedConnector {
        connect_ok: bool,
        download_ok: bool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedConnector {
        fn new(connect_ok: bool, download_ok: bool) -> Self {
            Self {
                connect_ok,
                download_ok,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RemoteConnector for ScriptedConnector {
        async fn connect(&self, _params: &ConnectionParams) -> Result<()> {
            self.calls.lock().push("connect".to_string());
            if self.connect_ok {
                Ok(())
            } else {
                anyhow::bail!("auth rejected")
            }
        }

        async fn download(&self, remote_path: &str, local_path: &Path) -> Result<()> {
            self.calls.lock().push(format!("download {remote_path}"));
            if self.download_ok {
                tokio::fs::write(local_path, b"bytes").await?;
                Ok(())
            } else {
                anyhow::bail!("transfer aborted")
            }
        }

        async fn disconnect(&self) {
            self.calls.lock().push("disconnect".to_string());
        }
    }

    struct NeverReachable;

    #[async_trait]
    impl Pinger for NeverReachable {
        async fn ping(&self, _addr: IpAddr, _timeout: Duration) -> bool {
            false
        }
    }

    fn params(host: &str) -> ConnectionParams {
        ConnectionParams {
            host: host.to_string(),
            port: None,
            username: None,
            password: None,
            key_path: None,
            remote_dir: "/pnm/".to_string(),
        }
    }

    fn fetcher(
        method: RetrievalMethod,
        host: &str,
        connector: Arc<ScriptedConnector>,
        dir: &Path,
    ) -> RemoteFetcher {
        RemoteFetcher::new(
            method,
            params(host),
            dir.to_path_buf(),
            HostPrecheck::new(Duration::from_secs(1)),
            connector,
        )
    }

    #[tokio::test]
    async fn test_successful_fetch_runs_full_connector_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(ScriptedConnector::new(true, true));
        let f = fetcher(RetrievalMethod::Sftp, "127.0.0.1", connector.clone(), dir.path());

        let path = f.fetch(&CaptureFilename::from_raw("cap.bin")).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
        assert_eq!(
            *connector.calls.lock(),
            vec!["connect", "download /pnm/cap.bin", "disconnect"]
        );
    }

    #[tokio::test]
    async fn test_connect_failure_normalizes_to_protocol_code() {
        let dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(ScriptedConnector::new(false, true));
        let f = fetcher(RetrievalMethod::Tftp, "127.0.0.1", connector, dir.path());

        let err = f.fetch(&CaptureFilename::from_raw("cap.bin")).await.unwrap_err();
        assert_eq!(err.code(), ServiceStatus::TftpFetchError);
    }

    #[tokio::test]
    async fn test_download_failure_still_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(ScriptedConnector::new(true, false));
        let f = fetcher(RetrievalMethod::Http, "127.0.0.1", connector.clone(), dir.path());

        let err = f.fetch(&CaptureFilename::from_raw("cap.bin")).await.unwrap_err();
        assert_eq!(err.code(), ServiceStatus::HttpFetchError);
        assert_eq!(connector.calls.lock().last().unwrap(), "disconnect");
    }

    #[tokio::test]
    async fn test_unreachable_host_skips_connector() {
        let dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(ScriptedConnector::new(true, true));
        let f = RemoteFetcher::new(
            RetrievalMethod::Sftp,
            params("192.0.2.55"),
            dir.path().to_path_buf(),
            HostPrecheck::with_pinger(Arc::new(NeverReachable), Duration::from_secs(1)),
            connector.clone(),
        );

        let err = f.fetch(&CaptureFilename::from_raw("cap.bin")).await.unwrap_err();
        assert_eq!(err.code(), ServiceStatus::SftpHostUnreachable);
        assert!(connector.calls.lock().is_empty());
    }
}
