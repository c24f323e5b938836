//! Capture trigger: kind-specific control configuration.
//!
//! [`KindTrigger`] is a sealed variant type with one case per triggerable
//! capture kind. The orchestrator depends only on the single
//! [`KindTrigger::trigger`] entry point; no kind-specific branching leaks
//! outside this module.
//!
//! Ordering here is load-bearing: filenames are generated and registered
//! with the transaction store *before* the control message is issued, so a
//! transaction id exists from the first instant the device could start
//! writing the file.

use pnm_core::{
    CaptureFilename, CaptureKind, CaptureOptions, ChannelTarget, CmDevice, ControlRequest,
    FecSummaryWindow, ServiceStatus, SpectrumOptions, SpectrumRetrieval, TransactionStore,
};
use tracing::{debug, info};

use crate::StageFailure;

/// Sealed per-kind trigger dispatch.
#[derive(Debug, Clone)]
pub enum KindTrigger {
    RxMer { averages: u32 },
    ChannelEstimate,
    Constellation { offset: u32, samples: u32 },
    Histogram { timeout_s: u32 },
    FecSummary { window: FecSummaryWindow },
    ModulationProfile,
    UsPreEq,
    SpectrumScan { options: SpectrumOptions },
}

impl KindTrigger {
    /// Build the trigger for a requested kind.
    ///
    /// Stub kinds are rejected here with `TEST_NOT_SUPPORTED` so nothing
    /// downstream needs to know they exist.
    pub fn for_kind(kind: CaptureKind, options: &CaptureOptions) -> Result<Self, StageFailure> {
        match kind {
            CaptureKind::RxMer => Ok(KindTrigger::RxMer {
                averages: options.rxmer_averages,
            }),
            CaptureKind::ChannelEstimate => Ok(KindTrigger::ChannelEstimate),
            CaptureKind::Constellation => Ok(KindTrigger::Constellation {
                offset: options.constellation_offset,
                samples: options.constellation_samples,
            }),
            CaptureKind::Histogram => Ok(KindTrigger::Histogram {
                timeout_s: options.histogram_timeout_s,
            }),
            CaptureKind::FecSummary(window) => Ok(KindTrigger::FecSummary { window }),
            CaptureKind::ModulationProfile => Ok(KindTrigger::ModulationProfile),
            CaptureKind::UsPreEq => Ok(KindTrigger::UsPreEq),
            CaptureKind::SpectrumScan => Ok(KindTrigger::SpectrumScan {
                options: options.spectrum,
            }),
            CaptureKind::LatencyReport | CaptureKind::SymbolCapture => Err(StageFailure::new(
                ServiceStatus::TestNotSupported,
                format!("{kind:?} is declared but not implemented"),
            )),
        }
    }

    /// The capture kind this trigger starts.
    pub fn kind(&self) -> CaptureKind {
        match self {
            KindTrigger::RxMer { .. } => CaptureKind::RxMer,
            KindTrigger::ChannelEstimate => CaptureKind::ChannelEstimate,
            KindTrigger::Constellation { .. } => CaptureKind::Constellation,
            KindTrigger::Histogram { .. } => CaptureKind::Histogram,
            KindTrigger::FecSummary { window } => CaptureKind::FecSummary(*window),
            KindTrigger::ModulationProfile => CaptureKind::ModulationProfile,
            KindTrigger::UsPreEq => CaptureKind::UsPreEq,
            KindTrigger::SpectrumScan { .. } => CaptureKind::SpectrumScan,
        }
    }

    /// Generate and register output filenames, then issue the control
    /// configuration for this kind against one channel target.
    ///
    /// Returns the generated filenames in generation order; empty for the
    /// spectrum direct-value sub-mode, where no file is ever written.
    pub async fn trigger(
        &self,
        device: &dyn CmDevice,
        store: &dyn TransactionStore,
        target: ChannelTarget,
        file_suffix: Option<&str>,
    ) -> Result<Vec<CaptureFilename>, StageFailure> {
        let kind = self.kind();
        let identity = device.identity().clone();

        let generate = |suffix: Option<&str>| -> Result<CaptureFilename, StageFailure> {
            let filename = CaptureFilename::generate(kind, &identity, suffix);
            store
                .register(&identity, kind, &filename)
                .map_err(|err| {
                    StageFailure::new(ServiceStatus::TransactionIdNotFound, err.to_string())
                })?;
            debug!(%filename, ?kind, "registered capture filename");
            Ok(filename)
        };

        let request = match self {
            KindTrigger::RxMer { averages } => ControlRequest::RxMer {
                if_index: target.if_index,
                filename: generate(file_suffix)?,
                averages: *averages,
            },
            KindTrigger::ChannelEstimate => ControlRequest::ChannelEstimate {
                if_index: target.if_index,
                filename: generate(file_suffix)?,
            },
            KindTrigger::Constellation { offset, samples } => ControlRequest::Constellation {
                if_index: target.if_index,
                filename: generate(file_suffix)?,
                modulation_offset: *offset,
                sample_count: *samples,
            },
            KindTrigger::Histogram { timeout_s } => ControlRequest::Histogram {
                filename: generate(file_suffix)?,
                timeout_s: *timeout_s,
            },
            KindTrigger::FecSummary { window } => ControlRequest::FecSummary {
                if_index: target.if_index,
                filename: generate(file_suffix)?,
                window: *window,
            },
            KindTrigger::ModulationProfile => ControlRequest::ModulationProfile {
                if_index: target.if_index,
                filename: generate(file_suffix)?,
            },
            KindTrigger::UsPreEq => ControlRequest::UsPreEq {
                if_index: target.if_index,
                filename: generate(file_suffix)?,
                last_filename: generate(Some("last"))?,
            },
            KindTrigger::SpectrumScan { options } => {
                let filename = match options.retrieval {
                    SpectrumRetrieval::File => Some(generate(file_suffix)?),
                    SpectrumRetrieval::DirectValue => None,
                };
                ControlRequest::SpectrumScan {
                    filename,
                    first_segment_freq_hz: options.first_segment_freq_hz,
                    last_segment_freq_hz: options.last_segment_freq_hz,
                    bins_per_segment: options.bins_per_segment,
                }
            }
        };

        let filenames: Vec<CaptureFilename> =
            request.filenames().into_iter().cloned().collect();

        let accepted = device
            .apply_control(&request)
            .await
            .map_err(StageFailure::comm)?;
        if !accepted {
            return Err(StageFailure::new(
                ServiceStatus::FileSetFail,
                format!("device rejected {kind:?} control configuration for {target}"),
            ));
        }

        info!(?kind, %target, files = filenames.len(), "capture triggered");
        Ok(filenames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnm_core::MemoryTransactionStore;
    use pnm_device_mock::{new_event_log, MockCmDevice, RecordingStore};

    fn options() -> CaptureOptions {
        CaptureOptions::default()
    }

    #[tokio::test]
    async fn test_stub_kinds_are_rejected() {
        for kind in [CaptureKind::LatencyReport, CaptureKind::SymbolCapture] {
            let err = KindTrigger::for_kind(kind, &options()).unwrap_err();
            assert_eq!(err.code, ServiceStatus::TestNotSupported);
        }
    }

    #[tokio::test]
    async fn test_registration_happens_before_control_message() {
        let log = new_event_log();
        let device = MockCmDevice::builder().event_log(log.clone()).build();
        let store = RecordingStore::new(MemoryTransactionStore::new(), log.clone());

        let trigger = KindTrigger::for_kind(CaptureKind::RxMer, &options()).unwrap();
        let files = trigger
            .trigger(&device, &store, ChannelTarget::new(3, 1), None)
            .await
            .unwrap();
        assert_eq!(files.len(), 1);

        let events = log.lock().clone();
        let register_pos = events
            .iter()
            .position(|e| e.starts_with("register"))
            .unwrap();
        let apply_pos = events
            .iter()
            .position(|e| e.starts_with("apply_control"))
            .unwrap();
        assert!(
            register_pos < apply_pos,
            "transaction must be registered before the control message: {events:?}"
        );
    }

    #[tokio::test]
    async fn test_us_pre_eq_generates_two_registered_files() {
        let device = MockCmDevice::builder().build();
        let store = MemoryTransactionStore::new();

        let trigger = KindTrigger::for_kind(CaptureKind::UsPreEq, &options()).unwrap();
        let files = trigger
            .trigger(&device, &store, ChannelTarget::new(4, 2), None)
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[1].as_str().contains("_last_"));
        for file in &files {
            assert!(store.lookup(file).is_some());
        }
    }

    #[tokio::test]
    async fn test_control_rejection_is_file_set_fail() {
        let device = MockCmDevice::builder().reject_control().build();
        let store = MemoryTransactionStore::new();

        let trigger = KindTrigger::for_kind(CaptureKind::ChannelEstimate, &options()).unwrap();
        let err = trigger
            .trigger(&device, &store, ChannelTarget::new(3, 1), None)
            .await
            .unwrap_err();

        assert_eq!(err.code, ServiceStatus::FileSetFail);
        // The id was still registered first; a cancelled/failed trigger
        // leaves the mapping intact.
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_spectrum_file_mode_registers_one_filename() {
        let device = MockCmDevice::builder().build();
        let store = MemoryTransactionStore::new();

        let mut opts = options();
        opts.spectrum = SpectrumOptions {
            first_segment_freq_hz: 200_000_000,
            last_segment_freq_hz: 900_000_000,
            bins_per_segment: 512,
            retrieval: SpectrumRetrieval::File,
        };
        let trigger = KindTrigger::for_kind(CaptureKind::SpectrumScan, &opts).unwrap();
        let files = trigger
            .trigger(&device, &store, ChannelTarget::DEVICE_WIDE, None)
            .await
            .unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].as_str().starts_with("spectrum_"));
        assert!(store.lookup(&files[0]).is_some());
    }

    #[tokio::test]
    async fn test_spectrum_direct_value_registers_nothing() {
        let device = MockCmDevice::builder().build();
        let store = MemoryTransactionStore::new();

        let mut opts = options();
        opts.spectrum.retrieval = SpectrumRetrieval::DirectValue;
        let trigger = KindTrigger::for_kind(CaptureKind::SpectrumScan, &opts).unwrap();
        let files = trigger
            .trigger(&device, &store, ChannelTarget::DEVICE_WIDE, None)
            .await
            .unwrap();

        assert!(files.is_empty());
        assert!(store.is_empty());
    }
}
