//! Scripted mock device for testing the capture pipeline.
//!
//! [`MockCmDevice`] answers each status poll from a scripted sequence and
//! falls back to a configurable default once the script is exhausted, so
//! tests can assert exact poll counts:
//!
//! ```rust,ignore
//! let device = MockCmDevice::builder()
//!     .upload_sequence([UploadStatus::Available, UploadStatus::InProgress, UploadStatus::Completed])
//!     .build();
//! // ... run the poller ...
//! assert_eq!(device.upload_polls(), 3);
//! ```
//!
//! Every control-plane call is appended to a shareable event log, which
//! lets tests assert ordering across collaborators (e.g. that a
//! transaction id is registered before the control message is issued; see
//! [`RecordingStore`]).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use pnm_core::{
    CaptureFilename, CaptureKind, ChannelTarget, CmDevice, ControlRequest, ControlStatus,
    DeviceIdentity, Direction, MeasurementStatus, TransactionId, TransactionStore, UploadStatus,
};

/// Shared, ordered log of calls across mock collaborators.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Fresh shared event log.
pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Builder for [`MockCmDevice`].
pub struct MockCmDeviceBuilder {
    device: MockCmDevice,
}

impl MockCmDeviceBuilder {
    pub fn ping_reachable(mut self, answer: bool) -> Self {
        self.device.ping_ok = answer;
        self
    }

    pub fn protocol_reachable(mut self, answer: bool) -> Self {
        self.device.protocol_ok = answer;
        self
    }

    pub fn bulk_destination_accepted(mut self, answer: bool) -> Self {
        self.device.bulk_ok = answer;
        self
    }

    /// Make `apply_control` reject every request.
    pub fn reject_control(mut self) -> Self {
        self.device.control_accepted = false;
        self
    }

    /// Script the control-status register; default once exhausted.
    pub fn control_sequence(mut self, statuses: impl IntoIterator<Item = ControlStatus>) -> Self {
        self.device.control_seq = Mutex::new(statuses.into_iter().collect());
        self
    }

    pub fn control_default(mut self, status: ControlStatus) -> Self {
        self.device.control_default = status;
        self
    }

    /// Script the measurement-status register; default once exhausted.
    pub fn measurement_sequence(
        mut self,
        statuses: impl IntoIterator<Item = MeasurementStatus>,
    ) -> Self {
        self.device.measurement_seq = Mutex::new(statuses.into_iter().collect());
        self
    }

    pub fn measurement_default(mut self, status: MeasurementStatus) -> Self {
        self.device.measurement_default = status;
        self
    }

    /// Script the upload-status register; default once exhausted.
    pub fn upload_sequence(mut self, statuses: impl IntoIterator<Item = UploadStatus>) -> Self {
        self.device.upload_seq = Mutex::new(statuses.into_iter().collect());
        self
    }

    pub fn upload_default(mut self, status: UploadStatus) -> Self {
        self.device.upload_default = status;
        self
    }

    /// Channel stack the device reports for one direction.
    pub fn channel_stack(
        mut self,
        direction: Direction,
        targets: impl IntoIterator<Item = (u32, u32)>,
    ) -> Self {
        self.device.stacks.insert(
            direction,
            targets
                .into_iter()
                .map(|(i, c)| ChannelTarget::new(i, c))
                .collect(),
        );
        self
    }

    /// Number of `spectrum_value_ready` polls answered `false` before `true`.
    pub fn spectrum_ready_after(mut self, polls: u32) -> Self {
        self.device.spectrum_not_ready = AtomicU32::new(polls);
        self
    }

    pub fn spectrum_values(mut self, values: Vec<u8>) -> Self {
        self.device.spectrum_values = values;
        self
    }

    /// Share an event log with other mock collaborators.
    pub fn event_log(mut self, log: EventLog) -> Self {
        self.device.events = log;
        self
    }

    /// Write a dummy capture file into `dir` for every filename that
    /// `apply_control` accepts, simulating the device-side bulk upload.
    pub fn write_uploads_to(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.device.upload_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> MockCmDevice {
        self.device
    }
}

/// Mock control-plane device with scripted status registers.
pub struct MockCmDevice {
    identity: DeviceIdentity,
    ping_ok: bool,
    protocol_ok: bool,
    bulk_ok: bool,
    control_accepted: bool,
    control_seq: Mutex<VecDeque<ControlStatus>>,
    control_default: ControlStatus,
    measurement_seq: Mutex<VecDeque<MeasurementStatus>>,
    measurement_default: MeasurementStatus,
    upload_seq: Mutex<VecDeque<UploadStatus>>,
    upload_default: UploadStatus,
    stacks: HashMap<Direction, Vec<ChannelTarget>>,
    upload_dir: Option<std::path::PathBuf>,
    spectrum_not_ready: AtomicU32,
    spectrum_values: Vec<u8>,
    events: EventLog,
    control_polls: AtomicU32,
    measurement_polls: AtomicU32,
    upload_polls: AtomicU32,
}

impl MockCmDevice {
    pub fn builder() -> MockCmDeviceBuilder {
        MockCmDeviceBuilder {
            device: MockCmDevice {
                identity: DeviceIdentity::new("aa:bb:cc:dd:ee:ff", "192.0.2.10"),
                ping_ok: true,
                protocol_ok: true,
                bulk_ok: true,
                control_accepted: true,
                control_seq: Mutex::new(VecDeque::new()),
                control_default: ControlStatus::Ready,
                measurement_seq: Mutex::new(VecDeque::new()),
                measurement_default: MeasurementStatus::SampleReady,
                upload_seq: Mutex::new(VecDeque::new()),
                upload_default: UploadStatus::Completed,
                stacks: HashMap::new(),
                upload_dir: None,
                spectrum_not_ready: AtomicU32::new(0),
                spectrum_values: Vec::new(),
                events: Arc::new(Mutex::new(Vec::new())),
                control_polls: AtomicU32::new(0),
                measurement_polls: AtomicU32::new(0),
                upload_polls: AtomicU32::new(0),
            },
        }
    }

    pub fn control_polls(&self) -> u32 {
        self.control_polls.load(Ordering::SeqCst)
    }

    pub fn measurement_polls(&self) -> u32 {
        self.measurement_polls.load(Ordering::SeqCst)
    }

    pub fn upload_polls(&self) -> u32 {
        self.upload_polls.load(Ordering::SeqCst)
    }

    /// Snapshot of the ordered call log.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }
}

#[async_trait]
impl CmDevice for MockCmDevice {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn ping_reachable(&self) -> Result<bool> {
        self.record("ping_reachable");
        Ok(self.ping_ok)
    }

    async fn protocol_reachable(&self) -> Result<bool> {
        self.record("protocol_reachable");
        Ok(self.protocol_ok)
    }

    async fn set_bulk_destination(&self, address: &str, remote_path: &str) -> Result<bool> {
        self.record(format!("set_bulk_destination {address} {remote_path}"));
        Ok(self.bulk_ok)
    }

    async fn apply_control(&self, request: &ControlRequest) -> Result<bool> {
        for filename in request.filenames() {
            self.record(format!("apply_control {filename}"));
            if self.control_accepted {
                if let Some(dir) = &self.upload_dir {
                    tokio::fs::create_dir_all(dir).await?;
                    tokio::fs::write(dir.join(filename.as_str()), b"mock capture data").await?;
                }
            }
        }
        if request.filenames().is_empty() {
            self.record("apply_control <inline>");
        }
        Ok(self.control_accepted)
    }

    async fn control_status(&self) -> Result<ControlStatus> {
        self.control_polls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .control_seq
            .lock()
            .pop_front()
            .unwrap_or(self.control_default);
        self.record(format!("control_status -> {status:?}"));
        Ok(status)
    }

    async fn measurement_status(
        &self,
        _kind: CaptureKind,
        _if_index: u32,
    ) -> Result<MeasurementStatus> {
        self.measurement_polls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .measurement_seq
            .lock()
            .pop_front()
            .unwrap_or(self.measurement_default);
        self.record(format!("measurement_status -> {status:?}"));
        Ok(status)
    }

    async fn upload_status(&self, filename: &CaptureFilename) -> Result<UploadStatus> {
        self.upload_polls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .upload_seq
            .lock()
            .pop_front()
            .unwrap_or(self.upload_default);
        self.record(format!("upload_status {filename} -> {status:?}"));
        Ok(status)
    }

    async fn channel_stack(&self, direction: Direction) -> Result<Vec<ChannelTarget>> {
        self.record(format!("channel_stack {direction:?}"));
        Ok(self.stacks.get(&direction).cloned().unwrap_or_default())
    }

    async fn spectrum_value_ready(&self) -> Result<bool> {
        let remaining = self.spectrum_not_ready.load(Ordering::SeqCst);
        if remaining > 0 {
            self.spectrum_not_ready.store(remaining - 1, Ordering::SeqCst);
            self.record("spectrum_value_ready -> false");
            Ok(false)
        } else {
            self.record("spectrum_value_ready -> true");
            Ok(true)
        }
    }

    async fn read_spectrum_values(&self) -> Result<Vec<u8>> {
        self.record("read_spectrum_values");
        Ok(self.spectrum_values.clone())
    }
}

/// Transaction store that appends to a shared [`EventLog`].
///
/// Wraps any inner store; pair it with a device built via
/// [`MockCmDeviceBuilder::event_log`] to assert register-before-configure
/// ordering.
pub struct RecordingStore<S> {
    inner: S,
    events: EventLog,
}

impl<S: TransactionStore> RecordingStore<S> {
    pub fn new(inner: S, events: EventLog) -> Self {
        Self { inner, events }
    }
}

impl<S: TransactionStore> TransactionStore for RecordingStore<S> {
    fn register(
        &self,
        device: &DeviceIdentity,
        kind: CaptureKind,
        filename: &CaptureFilename,
    ) -> Result<TransactionId> {
        self.events.lock().push(format!("register {filename}"));
        self.inner.register(device, kind, filename)
    }

    fn lookup(&self, filename: &CaptureFilename) -> Option<TransactionId> {
        self.inner.lookup(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_sequence_then_default() {
        let device = MockCmDevice::builder()
            .upload_sequence([UploadStatus::Available, UploadStatus::InProgress])
            .upload_default(UploadStatus::Completed)
            .build();

        let f = CaptureFilename::from_raw("cap.bin");
        assert_eq!(device.upload_status(&f).await.unwrap(), UploadStatus::Available);
        assert_eq!(device.upload_status(&f).await.unwrap(), UploadStatus::InProgress);
        assert_eq!(device.upload_status(&f).await.unwrap(), UploadStatus::Completed);
        assert_eq!(device.upload_polls(), 3);
    }

    #[tokio::test]
    async fn test_spectrum_ready_countdown() {
        let device = MockCmDevice::builder().spectrum_ready_after(2).build();
        assert!(!device.spectrum_value_ready().await.unwrap());
        assert!(!device.spectrum_value_ready().await.unwrap());
        assert!(device.spectrum_value_ready().await.unwrap());
    }

    #[tokio::test]
    async fn test_event_log_records_calls_in_order() {
        let device = MockCmDevice::builder().build();
        device.ping_reachable().await.unwrap();
        device.set_bulk_destination("192.0.2.1", "/pnm").await.unwrap();
        let events = device.events();
        assert_eq!(events[0], "ping_reachable");
        assert!(events[1].starts_with("set_bulk_destination"));
    }
}
