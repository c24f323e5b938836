//! Capture kinds and per-run options.
//!
//! [`CaptureKind`] is the closed enumeration of diagnostic captures the
//! device can perform. Each kind maps onto a distinct control-message shape
//! (see [`crate::device::ControlRequest`]); the trigger layer owns that
//! mapping, everything else dispatches on the common surface here.

use serde::{Deserialize, Serialize};

/// Traffic direction of a per-channel capture.
///
/// Used as the key when querying the device for its channel stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Device receive path (OFDM downstream channels).
    Downstream,
    /// Device transmit path (OFDMA upstream channels).
    Upstream,
}

/// Accumulation window of a forward-error-correction summary capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FecSummaryWindow {
    /// Rolling ten-minute window, one bucket per second.
    TenMinute,
    /// Rolling twenty-four-hour window, one bucket per minute.
    TwentyFourHour,
}

/// How a spectrum scan returns its data.
///
/// Selected by per-run options, not by capture kind: the same scan can
/// either write a capture file retrieved over the bulk transport, or hand
/// the amplitude data back inline over the control plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumRetrieval {
    /// Normal pipeline: capture file written and uploaded.
    #[default]
    File,
    /// Amplitude bytes read back inline; no file is ever written.
    DirectValue,
}

/// Closed enumeration of supported capture types.
///
/// Immutable per run. `LatencyReport` and `SymbolCapture` are declared for
/// contract completeness but not triggerable; see
/// [`CaptureKind::is_stub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    /// Per-subcarrier receive modulation-error-ratio (signal quality).
    RxMer,
    /// OFDM channel-estimation coefficients.
    ChannelEstimate,
    /// Soft-decision constellation display samples.
    Constellation,
    /// Device-wide time-domain histogram.
    Histogram,
    /// FEC codeword summary over a rolling window.
    FecSummary(FecSummaryWindow),
    /// Downstream modulation profile usage.
    ModulationProfile,
    /// Upstream pre-equalization coefficients (produces two files).
    UsPreEq,
    /// Full-band spectrum scan (file or direct-value retrieval).
    SpectrumScan,
    /// Round-trip latency report. Declared but not implemented.
    LatencyReport,
    /// Upstream symbol capture. Declared but not implemented.
    SymbolCapture,
}

impl CaptureKind {
    /// Direction of the channel stack this kind operates on, or `None`
    /// for device-wide kinds.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            CaptureKind::RxMer
            | CaptureKind::ChannelEstimate
            | CaptureKind::Constellation
            | CaptureKind::FecSummary(_)
            | CaptureKind::ModulationProfile => Some(Direction::Downstream),
            CaptureKind::UsPreEq => Some(Direction::Upstream),
            CaptureKind::Histogram
            | CaptureKind::SpectrumScan
            | CaptureKind::LatencyReport
            | CaptureKind::SymbolCapture => None,
        }
    }

    /// True for kinds that target the whole device rather than a channel.
    pub fn is_device_wide(&self) -> bool {
        self.direction().is_none()
    }

    /// True for kinds declared in the contract but not triggerable.
    pub fn is_stub(&self) -> bool {
        matches!(self, CaptureKind::LatencyReport | CaptureKind::SymbolCapture)
    }

    /// Whether the orchestrator polls the measurement-status register for
    /// this kind before waiting on the upload.
    ///
    /// FEC summary windows signal readiness through the uploaded file
    /// itself; their measurement register never reports sample-ready.
    pub fn awaits_sample_ready(&self) -> bool {
        !matches!(self, CaptureKind::FecSummary(_))
    }

    /// Short tag embedded in generated capture filenames.
    pub fn file_tag(&self) -> &'static str {
        match self {
            CaptureKind::RxMer => "ds_rxmer_per_subcar",
            CaptureKind::ChannelEstimate => "ds_chan_est",
            CaptureKind::Constellation => "ds_constellation",
            CaptureKind::Histogram => "histogram",
            CaptureKind::FecSummary(FecSummaryWindow::TenMinute) => "ds_fec_summary_10min",
            CaptureKind::FecSummary(FecSummaryWindow::TwentyFourHour) => "ds_fec_summary_24hr",
            CaptureKind::ModulationProfile => "ds_mod_profile",
            CaptureKind::UsPreEq => "us_pre_eq",
            CaptureKind::SpectrumScan => "spectrum",
            CaptureKind::LatencyReport => "latency_report",
            CaptureKind::SymbolCapture => "symbol_capture",
        }
    }
}

/// Spectrum scan window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumOptions {
    /// Centre frequency of the first segment, Hz.
    pub first_segment_freq_hz: u64,
    /// Centre frequency of the last segment, Hz.
    pub last_segment_freq_hz: u64,
    /// FFT bins per segment.
    pub bins_per_segment: u32,
    /// File or direct-value retrieval.
    #[serde(default)]
    pub retrieval: SpectrumRetrieval,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        Self {
            first_segment_freq_hz: 108_000_000,
            last_segment_freq_hz: 1_002_000_000,
            bins_per_segment: 256,
            retrieval: SpectrumRetrieval::File,
        }
    }
}

/// Kind-specific knobs for one capture run.
///
/// Fields not relevant to the requested kind are ignored by the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// Optional suffix folded into generated filenames.
    #[serde(default)]
    pub file_suffix: Option<String>,
    /// Number of symbol averages for RxMER captures.
    #[serde(default = "default_averages")]
    pub rxmer_averages: u32,
    /// Modulation-order offset for constellation captures.
    #[serde(default)]
    pub constellation_offset: u32,
    /// Soft-decision sample count for constellation captures.
    #[serde(default = "default_sample_count")]
    pub constellation_samples: u32,
    /// Histogram dwell time in seconds.
    #[serde(default = "default_histogram_timeout")]
    pub histogram_timeout_s: u32,
    /// Spectrum scan window and retrieval sub-mode.
    #[serde(default)]
    pub spectrum: SpectrumOptions,
}

fn default_averages() -> u32 {
    1
}

fn default_sample_count() -> u32 {
    8192
}

fn default_histogram_timeout() -> u32 {
    10
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            file_suffix: None,
            rxmer_averages: default_averages(),
            constellation_offset: 0,
            constellation_samples: default_sample_count(),
            histogram_timeout_s: default_histogram_timeout(),
            spectrum: SpectrumOptions::default(),
        }
    }
}
