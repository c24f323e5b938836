//! Device-side status registers polled during a capture.
//!
//! The integer codes follow the device MIB coding, so drivers can map raw
//! register values straight through `from_code`. Unknown codes decode to
//! the `Other` variant rather than failing: an ambiguous register value is
//! a device state the poller must decide about, not a parse error.

use serde::{Deserialize, Serialize};

/// Device-wide capture control status. Polled only, never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    /// Ambiguous or unrecognized state.
    Other,
    /// Device is idle and ready to run or report a capture.
    Ready,
    /// A capture is running.
    InProgress,
    /// Device temporarily refused the request.
    TempReject,
    /// Control request was malformed or unsupported.
    ProtocolError,
}

impl ControlStatus {
    /// Decode a raw register value; unknown codes map to `Other`.
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => ControlStatus::Ready,
            3 => ControlStatus::InProgress,
            4 => ControlStatus::TempReject,
            5 => ControlStatus::ProtocolError,
            _ => ControlStatus::Other,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ControlStatus::Other => 1,
            ControlStatus::Ready => 2,
            ControlStatus::InProgress => 3,
            ControlStatus::TempReject => 4,
            ControlStatus::ProtocolError => 5,
        }
    }
}

/// Per-channel measurement status.
///
/// `SampleReady` is the only proceed value. `Error` and
/// `ResourceUnavailable` abort; everything else means keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementStatus {
    Other,
    Inactive,
    Busy,
    SampleReady,
    Error,
    ResourceUnavailable,
    SampleTruncated,
}

impl MeasurementStatus {
    /// Decode a raw register value; unknown codes map to `Other`.
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => MeasurementStatus::Inactive,
            3 => MeasurementStatus::Busy,
            4 => MeasurementStatus::SampleReady,
            5 => MeasurementStatus::Error,
            6 => MeasurementStatus::ResourceUnavailable,
            7 => MeasurementStatus::SampleTruncated,
            _ => MeasurementStatus::Other,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            MeasurementStatus::Other => 1,
            MeasurementStatus::Inactive => 2,
            MeasurementStatus::Busy => 3,
            MeasurementStatus::SampleReady => 4,
            MeasurementStatus::Error => 5,
            MeasurementStatus::ResourceUnavailable => 6,
            MeasurementStatus::SampleTruncated => 7,
        }
    }

    /// True for the explicit error values that abort polling.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            MeasurementStatus::Error | MeasurementStatus::ResourceUnavailable
        )
    }
}

/// Per-filename bulk upload status.
///
/// `Completed` is the only success terminal; `Error` the only failure
/// terminal. All other values mean the upload is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Other,
    Available,
    InProgress,
    Completed,
    Pending,
    Cancelled,
    Error,
}

impl UploadStatus {
    /// Decode a raw register value; unknown codes map to `Other`.
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => UploadStatus::Available,
            3 => UploadStatus::InProgress,
            4 => UploadStatus::Completed,
            5 => UploadStatus::Pending,
            6 => UploadStatus::Cancelled,
            7 => UploadStatus::Error,
            _ => UploadStatus::Other,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            UploadStatus::Other => 1,
            UploadStatus::Available => 2,
            UploadStatus::InProgress => 3,
            UploadStatus::Completed => 4,
            UploadStatus::Pending => 5,
            UploadStatus::Cancelled => 6,
            UploadStatus::Error => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_status_codes_round_trip() {
        for code in 1..=5 {
            assert_eq!(ControlStatus::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_unknown_codes_decode_to_other() {
        assert_eq!(ControlStatus::from_code(0), ControlStatus::Other);
        assert_eq!(ControlStatus::from_code(99), ControlStatus::Other);
        assert_eq!(MeasurementStatus::from_code(42), MeasurementStatus::Other);
        assert_eq!(UploadStatus::from_code(-1), UploadStatus::Other);
    }

    #[test]
    fn test_measurement_error_values() {
        assert!(MeasurementStatus::Error.is_error());
        assert!(MeasurementStatus::ResourceUnavailable.is_error());
        assert!(!MeasurementStatus::Busy.is_error());
        assert!(!MeasurementStatus::SampleTruncated.is_error());
    }
}
