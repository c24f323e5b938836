//! Core types and traits for PNM capture orchestration.
//!
//! This crate defines the shared vocabulary of the capture pipeline:
//!
//! - [`capture::CaptureKind`] — the closed set of diagnostic capture types
//! - [`status`] — the three device-side status registers the pipeline polls
//! - [`device::CmDevice`] — the control-plane capability trait a device
//!   driver implements
//! - [`txn::TransactionStore`] — filename → transaction-id correlation
//! - [`config::RetrievalConfig`] — which transport retrieves capture files
//!   and with what parameters
//! - [`outcome`] — the flat status-code taxonomy surfaced to callers
//!
//! Higher layers (`pnm-transport`, `pnm-capture`) depend only on these
//! types; nothing here talks to hardware or the network.

pub mod capture;
pub mod config;
pub mod device;
pub mod error;
pub mod filename;
pub mod outcome;
pub mod status;
pub mod txn;

pub use capture::{
    CaptureKind, CaptureOptions, Direction, FecSummaryWindow, SpectrumOptions, SpectrumRetrieval,
};
pub use config::{ConnectionParams, RetrievalConfig, RetrievalMethod};
pub use device::{ChannelTarget, CmDevice, ControlRequest, DeviceIdentity};
pub use error::{AppResult, PnmError};
pub use filename::CaptureFilename;
pub use outcome::{BatchOutcome, ChannelCapture, ServiceStatus};
pub use status::{ControlStatus, MeasurementStatus, UploadStatus};
pub use txn::{MemoryTransactionStore, TransactionId, TransactionStore};
