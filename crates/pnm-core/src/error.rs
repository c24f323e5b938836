//! Error types for the PNM capture pipeline.
//!
//! `PnmError` consolidates the error sources the orchestration layers can
//! hit. The split between [`PnmError::Config`] (parse failures from the
//! configuration provider) and [`PnmError::Configuration`] (values that
//! parse but are semantically wrong, e.g. a remote retrieval method with no
//! host) keeps "fix your TOML" and "fix your values" diagnostics distinct.
//!
//! Orchestration failures that must surface a flat status code to callers
//! travel as [`PnmError::Status`]; the code itself lives in
//! [`crate::outcome::ServiceStatus`].

use thiserror::Error;

use crate::outcome::ServiceStatus;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, PnmError>;

/// Primary error type for the PNM capture pipeline.
#[derive(Error, Debug)]
pub enum PnmError {
    /// Configuration file parsing failed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Standard I/O failure (file copy, directory creation).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Control-plane communication with the device failed outright.
    ///
    /// This is a transport-level failure of the management protocol itself
    /// (timeout, malformed response), not a rejected control request.
    #[error("Device error: {0}")]
    Device(String),

    /// An orchestration stage failed with a flat status code.
    #[error("Capture failed: {0}")]
    Status(ServiceStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PnmError::Device("control channel timeout".to_string());
        assert_eq!(err.to_string(), "Device error: control channel timeout");
    }

    #[test]
    fn test_status_error_carries_code() {
        let err = PnmError::Status(ServiceStatus::NoChannelsOfKind);
        assert!(err.to_string().contains("NO_CHANNELS_OF_KIND"));
    }
}
