//! Deliberately unimplemented transport stubs.
//!
//! SCP and FTPS are part of the configuration contract but have no
//! implementation; selecting one always fails fast with
//! `NOT_IMPLEMENTED` rather than half-working.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use pnm_core::{CaptureFilename, RetrievalMethod};

use crate::{Fetcher, TransportError};

/// Always returns `NotImplemented` for its configured method.
pub struct StubFetcher {
    method: RetrievalMethod,
}

impl StubFetcher {
    pub fn new(method: RetrievalMethod) -> Self {
        Self { method }
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    fn method(&self) -> RetrievalMethod {
        self.method
    }

    async fn fetch(&self, filename: &CaptureFilename) -> Result<PathBuf, TransportError> {
        warn!(method = %self.method, %filename, "transport not implemented");
        Err(TransportError::NotImplemented {
            method: self.method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnm_core::ServiceStatus;

    #[tokio::test]
    async fn test_stub_always_fails_with_not_implemented() {
        for method in [RetrievalMethod::Scp, RetrievalMethod::Ftps] {
            let fetcher = StubFetcher::new(method);
            let err = fetcher
                .fetch(&CaptureFilename::from_raw("cap.bin"))
                .await
                .unwrap_err();
            assert_eq!(err.code(), ServiceStatus::NotImplemented);
        }
    }
}
