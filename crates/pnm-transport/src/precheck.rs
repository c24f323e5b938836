//! Host reachability precheck.
//!
//! Runs before any remote transfer attempt. Three outcomes:
//!
//! - Resolution failure → treated as reachable. The transfer step will
//!   fail with its own protocol code, giving the caller one specific
//!   error instead of two overlapping ones.
//! - All resolved addresses loopback → reachable without pinging.
//!   Loopback ICMP frequently fails in sandboxed environments.
//! - Otherwise → one ping decides.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::lookup_host;
use tracing::{debug, warn};

/// One ICMP echo probe. Seam for tests; production uses [`SystemPinger`].
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, addr: IpAddr, timeout: Duration) -> bool;
}

/// Pings via the system `ping` binary (no raw-socket privileges needed).
pub struct SystemPinger;

#[async_trait]
impl Pinger for SystemPinger {
    async fn ping(&self, addr: IpAddr, timeout: Duration) -> bool {
        let timeout_secs = timeout.as_secs().max(1).to_string();
        let result = tokio::process::Command::new("ping")
            .arg("-c")
            .arg("1")
            .arg("-W")
            .arg(&timeout_secs)
            .arg(addr.to_string())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await;
        match result {
            Ok(status) => status.success(),
            Err(err) => {
                warn!(%addr, %err, "failed to spawn ping");
                false
            }
        }
    }
}

/// Resolves a host and decides whether a transfer attempt is worthwhile.
pub struct HostPrecheck {
    pinger: Arc<dyn Pinger>,
    ping_timeout: Duration,
}

impl HostPrecheck {
    pub fn new(ping_timeout: Duration) -> Self {
        Self {
            pinger: Arc::new(SystemPinger),
            ping_timeout,
        }
    }

    /// Swap the pinger implementation (tests).
    pub fn with_pinger(pinger: Arc<dyn Pinger>, ping_timeout: Duration) -> Self {
        Self {
            pinger,
            ping_timeout,
        }
    }

    /// True when a transfer attempt against `host` should proceed.
    pub async fn reachable(&self, host: &str) -> bool {
        let addrs: Vec<IpAddr> = match lookup_host((host, 0u16)).await {
            Ok(resolved) => resolved.map(|sa| sa.ip()).collect(),
            Err(err) => {
                debug!(%host, %err, "resolution failed, deferring to transfer step");
                return true;
            }
        };

        if addrs.is_empty() {
            debug!(%host, "resolved to no addresses, deferring to transfer step");
            return true;
        }

        if addrs.iter().all(|a| a.is_loopback()) {
            debug!(%host, "loopback host, skipping ping");
            return true;
        }

        let addr = addrs[0];
        let reachable = self.pinger.ping(addr, self.ping_timeout).await;
        debug!(%host, %addr, reachable, "ping precheck");
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingPinger {
        calls: AtomicU32,
        answer: bool,
    }

    impl CountingPinger {
        fn new(answer: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                answer,
            }
        }
    }

    #[async_trait]
    impl Pinger for CountingPinger {
        async fn ping(&self, _addr: IpAddr, _timeout: Duration) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    #[tokio::test]
    async fn test_loopback_host_never_pings() {
        let pinger = Arc::new(CountingPinger::new(false));
        let precheck = HostPrecheck::with_pinger(pinger.clone(), Duration::from_secs(1));
        assert!(precheck.reachable("127.0.0.1").await);
        assert_eq!(pinger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolution_failure_defers_to_transfer() {
        let pinger = Arc::new(CountingPinger::new(false));
        let precheck = HostPrecheck::with_pinger(pinger.clone(), Duration::from_secs(1));
        assert!(precheck.reachable("no-such-host.invalid").await);
        assert_eq!(pinger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_loopback_host_is_pinged() {
        let pinger = Arc::new(CountingPinger::new(false));
        let precheck = HostPrecheck::with_pinger(pinger.clone(), Duration::from_secs(1));
        // TEST-NET-1 address parses without DNS and is not loopback.
        assert!(!precheck.reachable("192.0.2.55").await);
        assert_eq!(pinger.calls.load(Ordering::SeqCst), 1);
    }
}
