//! Local-directory transport driver.
//!
//! Used when the device uploads to a directory reachable from this host
//! (shared mount, loopback TFTP server writing locally). The device-side
//! upload may still be in flight when the orchestrator gets here, so an
//! absent file is polled for, one-second spacing, bounded by the
//! configured ceiling.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use pnm_core::{CaptureFilename, RetrievalMethod};

use crate::{Fetcher, TransportError};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Copies capture files from a source directory into the save directory.
pub struct LocalFetcher {
    source_dir: PathBuf,
    save_dir: PathBuf,
    wait_ceiling: Duration,
}

impl LocalFetcher {
    pub fn new(source_dir: PathBuf, save_dir: PathBuf, wait_ceiling: Duration) -> Self {
        Self {
            source_dir,
            save_dir,
            wait_ceiling,
        }
    }
}

#[async_trait]
impl Fetcher for LocalFetcher {
    fn method(&self) -> RetrievalMethod {
        RetrievalMethod::Local
    }

    async fn fetch(&self, filename: &CaptureFilename) -> Result<PathBuf, TransportError> {
        let source = self.source_dir.join(filename.as_str());
        let dest = self.save_dir.join(filename.as_str());
        let deadline = Instant::now() + self.wait_ceiling;

        loop {
            if tokio::fs::try_exists(&source).await.unwrap_or(false) {
                break;
            }
            if Instant::now() >= deadline {
                return Err(TransportError::LocalWaitTimeout {
                    filename: filename.as_str().to_string(),
                    dir: self.source_dir.clone(),
                });
            }
            debug!(%filename, "capture file not present yet, waiting");
            sleep(POLL_INTERVAL).await;
        }

        tokio::fs::create_dir_all(&self.save_dir)
            .await
            .map_err(|err| local_error(filename, &err))?;
        tokio::fs::copy(&source, &dest)
            .await
            .map_err(|err| local_error(filename, &err))?;

        info!(%filename, dest = %dest.display(), "capture file copied");
        Ok(dest)
    }
}

fn local_error(filename: &CaptureFilename, err: &std::io::Error) -> TransportError {
    TransportError::Fetch {
        method: RetrievalMethod::Local,
        filename: filename.as_str().to_string(),
        detail: err.to_string(),
    }
}
