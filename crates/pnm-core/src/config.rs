//! Retrieval configuration.
//!
//! One [`RetrievalConfig`] is read per orchestrator construction and passed
//! in explicitly; nothing here is ambient process state, so independent
//! orchestrations against different devices can run with independent
//! transports in one process.
//!
//! Loading goes through figment (TOML file merged with `PNM_`-prefixed
//! environment overrides). Parse failures surface as
//! [`PnmError::Config`]; values that parse but make no sense surface as
//! [`PnmError::Configuration`] from [`RetrievalConfig::validate`].

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppResult, PnmError};

/// The transport used to retrieve completed capture files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    /// Copy from a directory on this host.
    Local,
    Tftp,
    Http,
    Sftp,
    /// Declared but not implemented.
    Scp,
    /// Declared but not implemented.
    Ftps,
}

impl RetrievalMethod {
    /// True for methods that reach a remote endpoint.
    pub fn is_remote(&self) -> bool {
        !matches!(self, RetrievalMethod::Local)
    }
}

impl std::fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RetrievalMethod::Local => "local",
            RetrievalMethod::Tftp => "tftp",
            RetrievalMethod::Http => "http",
            RetrievalMethod::Sftp => "sftp",
            RetrievalMethod::Scp => "scp",
            RetrievalMethod::Ftps => "ftps",
        };
        write!(f, "{label}")
    }
}

/// Connection parameters for a remote retrieval method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Private key path for key-based authentication.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    /// Directory on the remote endpoint where the device uploads.
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,
}

fn default_remote_dir() -> String {
    "/".to_string()
}

/// Ceilings for the polling loops that the source behavior left unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCeilings {
    /// Maximum seconds to wait for the control register to reach ready.
    #[serde(default = "default_control_wait")]
    pub control_wait_secs: u64,
    /// Maximum seconds the local transport waits for the file to appear.
    #[serde(default = "default_local_wait")]
    pub local_wait_secs: u64,
    /// Per-probe timeout for the reachability ping.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,
}

fn default_control_wait() -> u64 {
    300
}

fn default_local_wait() -> u64 {
    60
}

fn default_ping_timeout() -> u64 {
    3
}

impl Default for PollCeilings {
    fn default() -> Self {
        Self {
            control_wait_secs: default_control_wait(),
            local_wait_secs: default_local_wait(),
            ping_timeout_secs: default_ping_timeout(),
        }
    }
}

/// Active transport plus its parameters. Read once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub method: RetrievalMethod,
    /// Required when `method` is remote.
    #[serde(default)]
    pub connection: Option<ConnectionParams>,
    /// Where retrieved files land on this host.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
    /// Source directory for the local method.
    #[serde(default)]
    pub local_source_dir: Option<PathBuf>,
    #[serde(default)]
    pub ceilings: PollCeilings,
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("captures")
}

impl RetrievalConfig {
    /// Load from a TOML file merged with `PNM_` environment overrides.
    pub fn load(path: &Path) -> AppResult<Self> {
        let config: RetrievalConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PNM_").split("__"))
            .extract()?;
        config.validate()?;
        info!(method = %config.method, "loaded retrieval configuration");
        Ok(config)
    }

    /// Semantic validation beyond what deserialization checks.
    pub fn validate(&self) -> AppResult<()> {
        if self.method.is_remote() {
            let conn = self.connection.as_ref().ok_or_else(|| {
                PnmError::Configuration(format!(
                    "retrieval method '{}' requires a [connection] section",
                    self.method
                ))
            })?;
            if conn.host.trim().is_empty() {
                return Err(PnmError::Configuration(
                    "connection.host must not be empty".to_string(),
                ));
            }
        } else if self.local_source_dir.is_none() {
            return Err(PnmError::Configuration(
                "local retrieval requires local_source_dir".to_string(),
            ));
        }
        Ok(())
    }

    /// Endpoint address the device's bulk uploads are pointed at.
    ///
    /// The local method keeps uploads on this host.
    pub fn bulk_destination(&self) -> (String, String) {
        match (&self.method, &self.connection) {
            (RetrievalMethod::Local, _) => (
                "127.0.0.1".to_string(),
                self.local_source_dir
                    .as_deref()
                    .unwrap_or_else(|| Path::new("."))
                    .display()
                    .to_string(),
            ),
            (_, Some(conn)) => (conn.host.clone(), conn.remote_dir.clone()),
            // validate() rejects this shape; fall back to loopback.
            (_, None) => ("127.0.0.1".to_string(), default_remote_dir()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn local_config(dir: &Path) -> RetrievalConfig {
        RetrievalConfig {
            method: RetrievalMethod::Local,
            connection: None,
            save_dir: dir.join("out"),
            local_source_dir: Some(dir.join("src")),
            ceilings: PollCeilings::default(),
        }
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrieval.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
method = "tftp"
save_dir = "/tmp/captures"

[connection]
host = "192.0.2.50"
remote_dir = "/pnm"
"#
        )
        .unwrap();

        let config = RetrievalConfig::load(&path).unwrap();
        assert_eq!(config.method, RetrievalMethod::Tftp);
        let conn = config.connection.unwrap();
        assert_eq!(conn.host, "192.0.2.50");
        assert_eq!(conn.remote_dir, "/pnm");
        assert_eq!(config.ceilings.control_wait_secs, 300);
    }

    #[test]
    fn test_remote_method_requires_connection() {
        let config = RetrievalConfig {
            method: RetrievalMethod::Sftp,
            connection: None,
            save_dir: default_save_dir(),
            local_source_dir: None,
            ceilings: PollCeilings::default(),
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PnmError::Configuration(_)));
    }

    #[test]
    fn test_empty_host_rejected() {
        let config = RetrievalConfig {
            method: RetrievalMethod::Http,
            connection: Some(ConnectionParams {
                host: "  ".to_string(),
                port: None,
                username: None,
                password: None,
                key_path: None,
                remote_dir: default_remote_dir(),
            }),
            save_dir: default_save_dir(),
            local_source_dir: None,
            ceilings: PollCeilings::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_local_method_requires_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = local_config(dir.path());
        assert!(config.validate().is_ok());
        config.local_source_dir = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bulk_destination_local_is_loopback() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());
        let (host, _) = config.bulk_destination();
        assert_eq!(host, "127.0.0.1");
    }
}
