//! Status pollers.
//!
//! Three registers drive the pipeline: the device-wide control status, the
//! per-channel measurement status, and the per-filename upload status. All
//! three poll on a fixed one-second interval. The two per-channel pollers
//! are bounded by the caller-supplied `max_wait_count`; the control poller
//! is bounded by a configured ceiling and a cancellation token (an
//! unbounded control poll would hang the orchestrator on a stuck device).

use std::time::Duration;

use pnm_core::{
    CaptureFilename, CaptureKind, CmDevice, ControlStatus, MeasurementStatus, ServiceStatus,
    UploadStatus,
};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::StageFailure;

/// Spacing between consecutive status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll the device-wide control register until it reports ready.
///
/// `IN_PROGRESS` keeps polling; `READY` proceeds; rejection states map to
/// their distinct codes with the device detail preserved; an ambiguous
/// `OTHER` is terminal.
pub async fn await_control_ready(
    device: &dyn CmDevice,
    ceiling: Duration,
    cancel: &CancellationToken,
) -> Result<(), StageFailure> {
    let deadline = Instant::now() + ceiling;
    loop {
        let status = device.control_status().await.map_err(StageFailure::comm)?;
        match status {
            ControlStatus::Ready => return Ok(()),
            ControlStatus::InProgress => {
                debug!("control status in progress");
            }
            ControlStatus::TempReject => {
                return Err(StageFailure::new(
                    ServiceStatus::ControlTempReject,
                    "device temporarily rejected the capture request",
                ));
            }
            ControlStatus::ProtocolError => {
                return Err(StageFailure::new(
                    ServiceStatus::ControlProtocolError,
                    "device reported a control protocol error",
                ));
            }
            ControlStatus::Other => {
                return Err(StageFailure::new(
                    ServiceStatus::ControlAmbiguous,
                    "device control status is ambiguous",
                ));
            }
        }
        if Instant::now() >= deadline {
            warn!(?ceiling, "control status never reached ready");
            return Err(StageFailure::new(
                ServiceStatus::ControlTimeout,
                format!("control status not ready within {}s", ceiling.as_secs()),
            ));
        }
        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(StageFailure::new(
                    ServiceStatus::Cancelled,
                    "run cancelled while awaiting control ready",
                ));
            }
            _ = sleep(POLL_INTERVAL) => {}
        }
    }
}

/// Poll the per-channel measurement register until sample-ready.
pub async fn await_sample_ready(
    device: &dyn CmDevice,
    kind: CaptureKind,
    if_index: u32,
    max_wait_count: u32,
) -> Result<(), StageFailure> {
    for attempt in 1..=max_wait_count {
        let status = device
            .measurement_status(kind, if_index)
            .await
            .map_err(StageFailure::comm)?;
        match status {
            MeasurementStatus::SampleReady => return Ok(()),
            s if s.is_error() => {
                return Err(StageFailure::new(
                    ServiceStatus::MeasurementFailure,
                    format!("measurement status {s:?}"),
                ));
            }
            s => debug!(attempt, ?s, "measurement not ready"),
        }
        if attempt < max_wait_count {
            sleep(POLL_INTERVAL).await;
        }
    }
    Err(StageFailure::new(
        ServiceStatus::NotReadyAfterCapture,
        format!("no sample after {max_wait_count} polls"),
    ))
}

/// Poll the per-filename upload register until the upload completes.
///
/// `COMPLETED` is the only success terminal; `ERROR` fails immediately
/// without exhausting remaining attempts.
pub async fn await_upload_complete(
    device: &dyn CmDevice,
    filename: &CaptureFilename,
    max_wait_count: u32,
) -> Result<(), StageFailure> {
    for attempt in 1..=max_wait_count {
        let status = device
            .upload_status(filename)
            .await
            .map_err(StageFailure::comm)?;
        match status {
            UploadStatus::Completed => return Ok(()),
            UploadStatus::Error => {
                return Err(StageFailure::new(
                    ServiceStatus::UploadFailure,
                    format!("device reported upload error for {filename}"),
                ));
            }
            s => debug!(attempt, ?s, %filename, "upload not complete"),
        }
        if attempt < max_wait_count {
            sleep(POLL_INTERVAL).await;
        }
    }
    Err(StageFailure::new(
        ServiceStatus::UploadFailure,
        format!("upload of {filename} not complete after {max_wait_count} polls"),
    ))
}

/// Poll the spectrum value-present check (direct-value sub-mode).
pub async fn await_spectrum_value(
    device: &dyn CmDevice,
    max_wait_count: u32,
) -> Result<(), StageFailure> {
    for attempt in 1..=max_wait_count {
        if device
            .spectrum_value_ready()
            .await
            .map_err(StageFailure::comm)?
        {
            return Ok(());
        }
        debug!(attempt, "spectrum amplitude data not ready");
        if attempt < max_wait_count {
            sleep(POLL_INTERVAL).await;
        }
    }
    Err(StageFailure::new(
        ServiceStatus::NotReadyAfterCapture,
        format!("spectrum values not present after {max_wait_count} polls"),
    ))
}
