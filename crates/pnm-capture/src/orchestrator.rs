//! Root orchestration state machine.
//!
//! Sequences one capture run end to end: connectivity preamble, channel
//! resolution, then per channel trigger → control poll → measurement poll
//! → per-file upload poll → fetch → correlate. The first failure anywhere
//! aborts the whole batch; remaining channels are never triggered because
//! the device's control register is shared across all of them.

use std::sync::Arc;
use std::time::Duration;

use pnm_core::{
    BatchOutcome, CaptureKind, CaptureOptions, ChannelCapture, ChannelTarget, CmDevice,
    RetrievalConfig, ServiceStatus, SpectrumRetrieval, TransactionStore,
};
use pnm_transport::Fetcher;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::poll;
use crate::resolver;
use crate::trigger::KindTrigger;
use crate::StageFailure;

/// Orchestrates capture runs against one device over one transport.
///
/// All collaborators are injected; independent orchestrators (different
/// devices, different transports) coexist in one process without shared
/// state beyond the transaction store, which is append-only and keyed by
/// globally-unique filenames.
pub struct CaptureOrchestrator {
    device: Arc<dyn CmDevice>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn TransactionStore>,
    config: RetrievalConfig,
    cancel: CancellationToken,
}

impl CaptureOrchestrator {
    pub fn new(
        device: Arc<dyn CmDevice>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn TransactionStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            device,
            fetcher,
            store,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels an in-flight run between any two states.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one capture batch.
    ///
    /// Never panics and never leaks device or transport error types; every
    /// failure comes back as a flat [`ServiceStatus`] code plus the channel
    /// at which it occurred.
    pub async fn run(
        &self,
        kind: CaptureKind,
        channel_filter: Option<&[u32]>,
        options: &CaptureOptions,
        max_wait_count: u32,
    ) -> BatchOutcome {
        match self
            .run_inner(kind, channel_filter, options, max_wait_count)
            .await
        {
            Ok(outcome) => outcome,
            Err((failure, failed_at)) => {
                error!(code = %failure.code, detail = %failure.detail, ?failed_at, "capture batch failed");
                BatchOutcome::Failed {
                    code: failure.code,
                    failed_at,
                }
            }
        }
    }

    async fn run_inner(
        &self,
        kind: CaptureKind,
        channel_filter: Option<&[u32]>,
        options: &CaptureOptions,
        max_wait_count: u32,
    ) -> Result<BatchOutcome, (StageFailure, Option<ChannelTarget>)> {
        let trigger = KindTrigger::for_kind(kind, options).map_err(|f| (f, None))?;

        self.preamble().await.map_err(|f| (f, None))?;

        // Spectrum direct-value sub-mode bypasses the file pipeline
        // entirely: no filename, no upload poll, no fetch.
        if kind == CaptureKind::SpectrumScan
            && options.spectrum.retrieval == SpectrumRetrieval::DirectValue
        {
            return self
                .run_direct_value(&trigger, max_wait_count)
                .await
                .map_err(|f| (f, Some(ChannelTarget::DEVICE_WIDE)));
        }

        let targets = resolver::resolve(self.device.as_ref(), kind, channel_filter)
            .await
            .map_err(|f| (f, None))?;

        let mut captures = Vec::with_capacity(targets.len());
        for target in targets {
            let capture = self
                .run_channel(&trigger, kind, target, options, max_wait_count)
                .await
                .map_err(|f| (f, Some(target)))?;
            captures.push(capture);
        }

        info!(?kind, channels = captures.len(), "capture batch complete");
        Ok(BatchOutcome::Success { captures })
    }

    /// Connectivity preamble: ping, protocol probe, bulk destination.
    ///
    /// All three run before any control message, so connectivity failures
    /// can never leave a capture half-started.
    async fn preamble(&self) -> Result<(), StageFailure> {
        if !self
            .device
            .ping_reachable()
            .await
            .map_err(StageFailure::comm)?
        {
            return Err(StageFailure::new(
                ServiceStatus::UnreachablePing,
                "device did not answer ping",
            ));
        }
        if !self
            .device
            .protocol_reachable()
            .await
            .map_err(StageFailure::comm)?
        {
            return Err(StageFailure::new(
                ServiceStatus::UnreachableProtocol,
                "device did not answer on the management protocol",
            ));
        }

        let (address, remote_path) = self.config.bulk_destination();
        if !self
            .device
            .set_bulk_destination(&address, &remote_path)
            .await
            .map_err(StageFailure::comm)?
        {
            return Err(StageFailure::new(
                ServiceStatus::BulkDestSetFail,
                format!("device rejected bulk destination {address}:{remote_path}"),
            ));
        }
        Ok(())
    }

    async fn run_channel(
        &self,
        trigger: &KindTrigger,
        kind: CaptureKind,
        target: ChannelTarget,
        options: &CaptureOptions,
        max_wait_count: u32,
    ) -> Result<ChannelCapture, StageFailure> {
        info!(?kind, %target, "starting channel capture");

        let filenames = trigger
            .trigger(
                self.device.as_ref(),
                self.store.as_ref(),
                target,
                options.file_suffix.as_deref(),
            )
            .await?;

        poll::await_control_ready(self.device.as_ref(), self.control_ceiling(), &self.cancel)
            .await?;

        if kind.awaits_sample_ready() {
            poll::await_sample_ready(self.device.as_ref(), kind, target.if_index, max_wait_count)
                .await?;
        }

        let mut transactions = Vec::with_capacity(filenames.len());
        let mut local_paths = Vec::with_capacity(filenames.len());
        for filename in &filenames {
            poll::await_upload_complete(self.device.as_ref(), filename, max_wait_count).await?;

            let path = self.fetcher.fetch(filename).await.map_err(|err| {
                warn!(%filename, %err, "transport fetch failed");
                StageFailure::new(err.code(), err.to_string())
            })?;

            let txn = self.store.lookup(filename).ok_or_else(|| {
                StageFailure::new(
                    ServiceStatus::TransactionIdNotFound,
                    format!("no transaction registered for {filename}"),
                )
            })?;

            transactions.push(txn);
            local_paths.push(path);
        }

        Ok(ChannelCapture {
            target,
            filenames,
            transactions,
            local_paths,
        })
    }

    async fn run_direct_value(
        &self,
        trigger: &KindTrigger,
        max_wait_count: u32,
    ) -> Result<BatchOutcome, StageFailure> {
        trigger
            .trigger(
                self.device.as_ref(),
                self.store.as_ref(),
                ChannelTarget::DEVICE_WIDE,
                None,
            )
            .await?;

        poll::await_control_ready(self.device.as_ref(), self.control_ceiling(), &self.cancel)
            .await?;
        poll::await_spectrum_value(self.device.as_ref(), max_wait_count).await?;

        let amplitudes = self
            .device
            .read_spectrum_values()
            .await
            .map_err(StageFailure::comm)?;

        info!(bytes = amplitudes.len(), "spectrum amplitude data read inline");
        Ok(BatchOutcome::DirectValues { amplitudes })
    }

    fn control_ceiling(&self) -> Duration {
        Duration::from_secs(self.config.ceilings.control_wait_secs)
    }
}
