//! Flat status-code taxonomy and batch outcomes.
//!
//! Every orchestration failure surfaces as exactly one [`ServiceStatus`]
//! code; callers never see protocol-level or device-level error types.
//! Display renders the wire-stable SCREAMING_SNAKE_CASE labels.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::device::ChannelTarget;
use crate::filename::CaptureFilename;
use crate::txn::TransactionId;

/// Discriminated success/failure code for a capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Success,
    /// Device did not answer an ICMP echo before any control message.
    UnreachablePing,
    /// Device did not answer on the management protocol.
    UnreachableProtocol,
    /// Setting the bulk upload destination was rejected.
    BulkDestSetFail,
    /// The device reports no channels of the requested direction.
    NoChannelsOfKind,
    /// Kind-specific control configuration was rejected.
    FileSetFail,
    /// Measurement status never reached sample-ready within the bound.
    NotReadyAfterCapture,
    /// Measurement status reported an explicit error value.
    MeasurementFailure,
    /// Upload failed, was cancelled, or never completed within the bound.
    UploadFailure,
    /// A filename generated this run has no registered transaction id.
    TransactionIdNotFound,
    /// Control status reported a temporary rejection.
    ControlTempReject,
    /// Control status reported a protocol error.
    ControlProtocolError,
    /// Control status reported an ambiguous state.
    ControlAmbiguous,
    /// Control status never reached ready within the configured ceiling.
    ControlTimeout,
    /// The run was cancelled between states.
    Cancelled,
    /// The requested capture kind is declared but not supported.
    TestNotSupported,
    /// Management-protocol communication failed mid-run.
    DeviceCommFailure,
    LocalFetchError,
    TftpHostUnreachable,
    TftpFetchError,
    HttpHostUnreachable,
    HttpFetchError,
    SftpHostUnreachable,
    SftpFetchError,
    /// The configured transport is a deliberate stub.
    NotImplemented,
}

impl ServiceStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ServiceStatus::Success)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ServiceStatus::Success => "SUCCESS",
            ServiceStatus::UnreachablePing => "UNREACHABLE_PING",
            ServiceStatus::UnreachableProtocol => "UNREACHABLE_PROTOCOL",
            ServiceStatus::BulkDestSetFail => "BULK_DEST_SET_FAIL",
            ServiceStatus::NoChannelsOfKind => "NO_CHANNELS_OF_KIND",
            ServiceStatus::FileSetFail => "FILE_SET_FAIL",
            ServiceStatus::NotReadyAfterCapture => "NOT_READY_AFTER_CAPTURE",
            ServiceStatus::MeasurementFailure => "MEASUREMENT_FAILURE",
            ServiceStatus::UploadFailure => "UPLOAD_FAILURE",
            ServiceStatus::TransactionIdNotFound => "TRANSACTION_ID_NOT_FOUND",
            ServiceStatus::ControlTempReject => "CONTROL_TEMP_REJECT",
            ServiceStatus::ControlProtocolError => "CONTROL_PROTOCOL_ERROR",
            ServiceStatus::ControlAmbiguous => "CONTROL_AMBIGUOUS",
            ServiceStatus::ControlTimeout => "CONTROL_TIMEOUT",
            ServiceStatus::Cancelled => "CANCELLED",
            ServiceStatus::TestNotSupported => "TEST_NOT_SUPPORTED",
            ServiceStatus::DeviceCommFailure => "DEVICE_COMM_FAILURE",
            ServiceStatus::LocalFetchError => "LOCAL_FETCH_ERROR",
            ServiceStatus::TftpHostUnreachable => "TFTP_HOST_UNREACHABLE",
            ServiceStatus::TftpFetchError => "TFTP_FETCH_ERROR",
            ServiceStatus::HttpHostUnreachable => "HTTP_HOST_UNREACHABLE",
            ServiceStatus::HttpFetchError => "HTTP_FETCH_ERROR",
            ServiceStatus::SftpHostUnreachable => "SFTP_HOST_UNREACHABLE",
            ServiceStatus::SftpFetchError => "SFTP_FETCH_ERROR",
            ServiceStatus::NotImplemented => "NOT_IMPLEMENTED",
        };
        write!(f, "{label}")
    }
}

/// Everything captured for one channel target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCapture {
    pub target: ChannelTarget,
    /// Generated capture filenames, in generation order.
    pub filenames: Vec<CaptureFilename>,
    /// Transaction ids, parallel to `filenames`.
    pub transactions: Vec<TransactionId>,
    /// Local paths of the retrieved files, parallel to `filenames`.
    pub local_paths: Vec<PathBuf>,
}

/// Result of one capture run over a set of channel targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every channel completed; one entry per target.
    Success { captures: Vec<ChannelCapture> },
    /// Spectrum direct-value run; amplitude bytes returned inline.
    DirectValues { amplitudes: Vec<u8> },
    /// The batch aborted at the first failing channel.
    Failed {
        code: ServiceStatus,
        /// Channel being processed when the failure occurred, if any.
        failed_at: Option<ChannelTarget>,
    },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, BatchOutcome::Failed { .. })
    }

    /// Failure code, or `Success` for the success variants.
    pub fn code(&self) -> ServiceStatus {
        match self {
            BatchOutcome::Failed { code, .. } => *code,
            _ => ServiceStatus::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_labels() {
        assert_eq!(
            ServiceStatus::UnreachablePing.to_string(),
            "UNREACHABLE_PING"
        );
        assert_eq!(
            ServiceStatus::TftpHostUnreachable.to_string(),
            "TFTP_HOST_UNREACHABLE"
        );
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&ServiceStatus::FileSetFail).unwrap();
        assert_eq!(json, "\"FILE_SET_FAIL\"");
    }

    #[test]
    fn test_outcome_code() {
        let failed = BatchOutcome::Failed {
            code: ServiceStatus::UploadFailure,
            failed_at: None,
        };
        assert!(!failed.is_success());
        assert_eq!(failed.code(), ServiceStatus::UploadFailure);

        let ok = BatchOutcome::Success { captures: vec![] };
        assert!(ok.is_success());
        assert_eq!(ok.code(), ServiceStatus::Success);
    }
}
