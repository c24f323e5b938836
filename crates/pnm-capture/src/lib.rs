//! End-to-end orchestration of one PNM capture run.
//!
//! The pipeline per channel target, in order:
//!
//! ```text
//! RESOLVE → TRIGGER → AWAIT_CONTROL_READY → AWAIT_SAMPLE_READY
//!        → (per generated filename) AWAIT_UPLOAD_COMPLETE → FETCH → CORRELATE
//! ```
//!
//! Channels are processed strictly sequentially: the device exposes one
//! shared control-status register, so concurrent triggers would corrupt
//! in-flight captures. Every sleep in the pollers is a suspension point
//! and no state holds a lock across an await, so a run can be cancelled
//! between any two states via its `CancellationToken`
//! (already-registered transaction ids are left intact).

pub mod orchestrator;
pub mod poll;
pub mod resolver;
pub mod trigger;

pub use orchestrator::CaptureOrchestrator;

use pnm_core::ServiceStatus;

/// One failed orchestration stage: the flat code surfaced to the caller
/// plus the device-side detail preserved for logs.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {detail}")]
pub struct StageFailure {
    pub code: ServiceStatus,
    pub detail: String,
}

impl StageFailure {
    pub fn new(code: ServiceStatus, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    /// Management-protocol communication failure mid-run.
    pub(crate) fn comm(err: anyhow::Error) -> Self {
        Self::new(ServiceStatus::DeviceCommFailure, err.to_string())
    }
}
