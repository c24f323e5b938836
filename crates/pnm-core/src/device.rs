//! Device control-plane capability trait.
//!
//! [`CmDevice`] models the management surface of the remote device the
//! pipeline coordinates against. The wire protocol behind it is an
//! external collaborator; the orchestrator only ever sees these methods.
//!
//! Following the capability-trait pattern used across the codebase, the
//! trait is:
//! - async (`#[async_trait]`)
//! - thread-safe (`Send + Sync`)
//! - fallible via `anyhow::Result` (a method error means the management
//!   protocol itself failed, not that the device said "no")

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capture::{Direction, FecSummaryWindow};
use crate::filename::CaptureFilename;
use crate::status::{ControlStatus, MeasurementStatus, UploadStatus};

/// One concrete (interface, channel) capture target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelTarget {
    /// Interface table index on the device.
    pub if_index: u32,
    /// Channel id within that interface's direction.
    pub channel_id: u32,
}

impl ChannelTarget {
    /// Synthetic target used by device-wide capture kinds.
    pub const DEVICE_WIDE: ChannelTarget = ChannelTarget {
        if_index: 0,
        channel_id: 0,
    };

    pub fn new(if_index: u32, channel_id: u32) -> Self {
        Self {
            if_index,
            channel_id,
        }
    }
}

impl std::fmt::Display for ChannelTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "if={} ch={}", self.if_index, self.channel_id)
    }
}

/// Identity of the device, folded into generated filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// MAC address, any common separator style.
    pub mac: String,
    /// Management address (IP or hostname).
    pub address: String,
}

impl DeviceIdentity {
    pub fn new(mac: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            address: address.into(),
        }
    }

    /// MAC as lowercase hex with separators stripped.
    pub fn mac_hex(&self) -> String {
        self.mac
            .chars()
            .filter(|c| c.is_ascii_hexdigit())
            .collect::<String>()
            .to_ascii_lowercase()
    }
}

/// Kind-specific control configuration issued to start a capture.
///
/// Sealed: one variant per triggerable capture kind, carrying exactly the
/// parameter shape that kind's control message needs. Built by the trigger
/// layer, consumed by device drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    RxMer {
        if_index: u32,
        filename: CaptureFilename,
        averages: u32,
    },
    ChannelEstimate {
        if_index: u32,
        filename: CaptureFilename,
    },
    Constellation {
        if_index: u32,
        filename: CaptureFilename,
        modulation_offset: u32,
        sample_count: u32,
    },
    Histogram {
        filename: CaptureFilename,
        timeout_s: u32,
    },
    FecSummary {
        if_index: u32,
        filename: CaptureFilename,
        window: FecSummaryWindow,
    },
    ModulationProfile {
        if_index: u32,
        filename: CaptureFilename,
    },
    UsPreEq {
        if_index: u32,
        filename: CaptureFilename,
        last_filename: CaptureFilename,
    },
    SpectrumScan {
        /// `None` in direct-value mode; no file is ever written.
        filename: Option<CaptureFilename>,
        first_segment_freq_hz: u64,
        last_segment_freq_hz: u64,
        bins_per_segment: u32,
    },
}

impl ControlRequest {
    /// Filenames this request tells the device to write, in order.
    pub fn filenames(&self) -> Vec<&CaptureFilename> {
        match self {
            ControlRequest::RxMer { filename, .. }
            | ControlRequest::ChannelEstimate { filename, .. }
            | ControlRequest::Constellation { filename, .. }
            | ControlRequest::Histogram { filename, .. }
            | ControlRequest::FecSummary { filename, .. }
            | ControlRequest::ModulationProfile { filename, .. } => vec![filename],
            ControlRequest::UsPreEq {
                filename,
                last_filename,
                ..
            } => vec![filename, last_filename],
            ControlRequest::SpectrumScan { filename, .. } => {
                filename.iter().collect()
            }
        }
    }
}

/// Control-plane capabilities of the remote device.
///
/// Methods returning `bool` report whether the device accepted the
/// request; `Err` means the management protocol itself failed.
#[async_trait]
pub trait CmDevice: Send + Sync {
    /// Device identity used for filename derivation.
    fn identity(&self) -> &DeviceIdentity;

    /// One ICMP-level reachability probe.
    async fn ping_reachable(&self) -> Result<bool>;

    /// One management-protocol reachability probe.
    async fn protocol_reachable(&self) -> Result<bool>;

    /// Point bulk uploads at the transport endpoint.
    async fn set_bulk_destination(&self, address: &str, remote_path: &str) -> Result<bool>;

    /// Issue the kind-specific control configuration that starts a capture.
    async fn apply_control(&self, request: &ControlRequest) -> Result<bool>;

    /// Read the device-wide capture control status register.
    async fn control_status(&self) -> Result<ControlStatus>;

    /// Read the per-channel measurement status register.
    async fn measurement_status(
        &self,
        kind: crate::capture::CaptureKind,
        if_index: u32,
    ) -> Result<MeasurementStatus>;

    /// Read the per-filename bulk upload status register.
    async fn upload_status(&self, filename: &CaptureFilename) -> Result<UploadStatus>;

    /// Full (interface, channel) stack for one direction, in device order.
    async fn channel_stack(&self, direction: Direction) -> Result<Vec<ChannelTarget>>;

    /// Whether spectrum amplitude data is ready for inline readback.
    async fn spectrum_value_ready(&self) -> Result<bool>;

    /// Read inline spectrum amplitude bytes (direct-value sub-mode).
    async fn read_spectrum_values(&self) -> Result<Vec<u8>>;
}
