//! Transport drivers for retrieving completed capture files.
//!
//! Six interchangeable drivers implement the one-method [`Fetcher`]
//! contract: copy a named capture file into the local save directory.
//! Exactly one driver is active per process, selected by
//! [`RetrievalConfig`]; the orchestrator never branches on transport type.
//!
//! - [`local::LocalFetcher`] — copies from a directory on this host
//! - TFTP / HTTP / SFTP — [`remote::RemoteFetcher`] instances that run the
//!   reachability precheck, then delegate to a per-protocol
//!   [`remote::RemoteConnector`]
//! - SCP / FTPS — deliberate [`stub::StubFetcher`] stubs
//!
//! Every driver failure is normalized to a single
//! [`ServiceStatus`](pnm_core::ServiceStatus) code per protocol via
//! [`TransportError::code`]; callers never inspect protocol-level error
//! types.

pub mod http;
pub mod local;
pub mod precheck;
pub mod remote;
pub mod stub;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use pnm_core::{
    AppResult, CaptureFilename, PnmError, RetrievalConfig, RetrievalMethod, ServiceStatus,
};

use crate::http::HttpConnector;
use crate::local::LocalFetcher;
use crate::precheck::HostPrecheck;
use crate::remote::{RemoteConnector, RemoteFetcher};
use crate::stub::StubFetcher;

/// Failure of one fetch attempt, tagged with the active protocol.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Reachability precheck failed; no transfer was attempted.
    #[error("{method} host '{host}' unreachable")]
    HostUnreachable {
        method: RetrievalMethod,
        host: String,
    },

    /// Connect, authentication, or transfer failure, normalized.
    #[error("{method} fetch of '{filename}' failed: {detail}")]
    Fetch {
        method: RetrievalMethod,
        filename: String,
        detail: String,
    },

    /// The local source file never appeared within the configured ceiling.
    #[error("timed out waiting for '{filename}' in {dir}")]
    LocalWaitTimeout { filename: String, dir: PathBuf },

    /// The configured transport is a deliberate stub.
    #[error("{method} transport is not implemented")]
    NotImplemented { method: RetrievalMethod },
}

impl TransportError {
    /// Flat status code surfaced to the batch caller.
    pub fn code(&self) -> ServiceStatus {
        match self {
            TransportError::HostUnreachable { method, .. } => match method {
                RetrievalMethod::Tftp => ServiceStatus::TftpHostUnreachable,
                RetrievalMethod::Http => ServiceStatus::HttpHostUnreachable,
                RetrievalMethod::Sftp => ServiceStatus::SftpHostUnreachable,
                RetrievalMethod::Local => ServiceStatus::LocalFetchError,
                RetrievalMethod::Scp | RetrievalMethod::Ftps => ServiceStatus::NotImplemented,
            },
            TransportError::Fetch { method, .. } => match method {
                RetrievalMethod::Tftp => ServiceStatus::TftpFetchError,
                RetrievalMethod::Http => ServiceStatus::HttpFetchError,
                RetrievalMethod::Sftp => ServiceStatus::SftpFetchError,
                RetrievalMethod::Local => ServiceStatus::LocalFetchError,
                RetrievalMethod::Scp | RetrievalMethod::Ftps => ServiceStatus::NotImplemented,
            },
            TransportError::LocalWaitTimeout { .. } => ServiceStatus::LocalFetchError,
            TransportError::NotImplemented { .. } => ServiceStatus::NotImplemented,
        }
    }
}

/// "Fetch named file into local store."
///
/// Success implies the named file now exists at the returned path with
/// bytes identical to the remote copy.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// The retrieval method this driver implements.
    fn method(&self) -> RetrievalMethod;

    /// Retrieve one capture file into the local save directory.
    async fn fetch(&self, filename: &CaptureFilename) -> Result<PathBuf, TransportError>;
}

/// Injected connector implementations for the remote protocols.
///
/// The wire protocols themselves are external collaborators; the HTTP
/// connector ships in-tree, TFTP and SFTP must be supplied by the caller.
#[derive(Default)]
pub struct ConnectorSet {
    pub tftp: Option<Arc<dyn RemoteConnector>>,
    pub http: Option<Arc<dyn RemoteConnector>>,
    pub sftp: Option<Arc<dyn RemoteConnector>>,
}

impl ConnectorSet {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build the single active driver for this process.
pub fn build_fetcher(config: &RetrievalConfig, connectors: ConnectorSet) -> AppResult<Arc<dyn Fetcher>> {
    config.validate()?;
    let ceilings = config.ceilings;
    let ping_timeout = Duration::from_secs(ceilings.ping_timeout_secs);

    let fetcher: Arc<dyn Fetcher> = match config.method {
        RetrievalMethod::Local => {
            let source = config.local_source_dir.clone().ok_or_else(|| {
                PnmError::Configuration("local retrieval requires local_source_dir".to_string())
            })?;
            Arc::new(LocalFetcher::new(
                source,
                config.save_dir.clone(),
                Duration::from_secs(ceilings.local_wait_secs),
            ))
        }
        RetrievalMethod::Http => {
            let connector = connectors
                .http
                .unwrap_or_else(|| Arc::new(HttpConnector::new()));
            remote(config, RetrievalMethod::Http, connector, ping_timeout)?
        }
        RetrievalMethod::Tftp => {
            let connector = connectors.tftp.ok_or_else(|| {
                PnmError::Configuration("no TFTP connector registered".to_string())
            })?;
            remote(config, RetrievalMethod::Tftp, connector, ping_timeout)?
        }
        RetrievalMethod::Sftp => {
            let connector = connectors.sftp.ok_or_else(|| {
                PnmError::Configuration("no SFTP connector registered".to_string())
            })?;
            remote(config, RetrievalMethod::Sftp, connector, ping_timeout)?
        }
        RetrievalMethod::Scp => Arc::new(StubFetcher::new(RetrievalMethod::Scp)),
        RetrievalMethod::Ftps => Arc::new(StubFetcher::new(RetrievalMethod::Ftps)),
    };
    Ok(fetcher)
}

fn remote(
    config: &RetrievalConfig,
    method: RetrievalMethod,
    connector: Arc<dyn RemoteConnector>,
    ping_timeout: Duration,
) -> AppResult<Arc<dyn Fetcher>> {
    let params = config.connection.clone().ok_or_else(|| {
        PnmError::Configuration(format!("retrieval method '{method}' requires [connection]"))
    })?;
    Ok(Arc::new(RemoteFetcher::new(
        method,
        params,
        config.save_dir.clone(),
        HostPrecheck::new(ping_timeout),
        connector,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnm_core::config::{ConnectionParams, PollCeilings};

    fn http_config() -> RetrievalConfig {
        RetrievalConfig {
            method: RetrievalMethod::Http,
            connection: Some(ConnectionParams {
                host: "192.0.2.50".to_string(),
                port: Some(8080),
                username: None,
                password: None,
                key_path: None,
                remote_dir: "/pnm".to_string(),
            }),
            save_dir: std::env::temp_dir(),
            local_source_dir: None,
            ceilings: PollCeilings::default(),
        }
    }

    #[test]
    fn test_error_codes_are_per_protocol() {
        let err = TransportError::HostUnreachable {
            method: RetrievalMethod::Sftp,
            host: "example".to_string(),
        };
        assert_eq!(err.code(), ServiceStatus::SftpHostUnreachable);

        let err = TransportError::Fetch {
            method: RetrievalMethod::Tftp,
            filename: "f.bin".to_string(),
            detail: "timeout".to_string(),
        };
        assert_eq!(err.code(), ServiceStatus::TftpFetchError);
    }

    #[test]
    fn test_build_http_fetcher_uses_default_connector() {
        let fetcher = build_fetcher(&http_config(), ConnectorSet::new()).unwrap();
        assert_eq!(fetcher.method(), RetrievalMethod::Http);
    }

    #[test]
    fn test_build_tftp_without_connector_fails() {
        let mut config = http_config();
        config.method = RetrievalMethod::Tftp;
        let Err(err) = build_fetcher(&config, ConnectorSet::new()) else {
            panic!("expected configuration error");
        };
        assert!(matches!(err, PnmError::Configuration(_)));
    }

    #[test]
    fn test_build_stub_fetchers() {
        let mut config = http_config();
        config.method = RetrievalMethod::Scp;
        let fetcher = build_fetcher(&config, ConnectorSet::new()).unwrap();
        assert_eq!(fetcher.method(), RetrievalMethod::Scp);
    }
}
