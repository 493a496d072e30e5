//! The upload workflow: one attempt through presign, upload, poll and present.
//!
//! ## State machine
//!
//! ```text
//! Idle ─▶ Presigning ─▶ Uploading ─▶ Polling ─┬▶ Displayed
//!              │             │           │     └▶ PendingProcessing
//!              └─────────────┴───────────┴──────▶ Failed
//! ```
//!
//! Transitions only move forward and every attempt ends in exactly one of
//! the three terminal states. The whole attempt is single-shot: errors are
//! not retried, they end the attempt in `Failed` with an `Error: <message>`
//! status, and the user starts a new attempt.

use crate::config::{AttemptPolicy, UploadConfig};
use crate::display::DisplaySurface;
use crate::error::AutoPdfError;
use crate::output::{AttemptReport, Metadata};
use crate::pipeline::input::FileHandle;
use crate::pipeline::poll::{Delay, MetadataPoller, PollOutcome, PollSchedule};
use crate::pipeline::present::{PresentOutcome, ResultPresenter};
use crate::pipeline::presign::PresignClient;
use crate::pipeline::upload;
use crate::progress::{NoopObserver, WorkflowObserver};
use crate::store::ResultStore;
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Status line while presigning.
pub const STATUS_PRESIGNING: &str = "Requesting upload URL…";
/// Status line while uploading.
pub const STATUS_UPLOADING: &str = "Uploading file…";
/// Status line while polling.
pub const STATUS_POLLING: &str = "Upload complete! Fetching metadata…";

/// Where an upload attempt is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttemptState {
    Idle,
    Presigning,
    Uploading,
    Polling,
    /// Metadata stored and displayed.
    Displayed,
    /// Poll budget ran out; the upload itself succeeded.
    PendingProcessing,
    Failed,
}

impl AttemptState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AttemptState::Displayed | AttemptState::PendingProcessing | AttemptState::Failed
        )
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(self, next: AttemptState) -> bool {
        use AttemptState::*;
        match (self, next) {
            (Idle, Presigning)
            | (Presigning, Uploading)
            | (Uploading, Polling)
            | (Polling, Displayed)
            | (Polling, PendingProcessing) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Mutable bookkeeping for the attempt being driven.
struct Attempt<'a> {
    id: u64,
    state: AttemptState,
    key: Option<String>,
    poll_attempts: u32,
    observer: &'a dyn WorkflowObserver,
}

impl<'a> Attempt<'a> {
    fn new(id: u64, observer: &'a dyn WorkflowObserver) -> Self {
        Self {
            id,
            state: AttemptState::Idle,
            key: None,
            poll_attempts: 0,
            observer,
        }
    }

    fn advance(&mut self, next: AttemptState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} → {:?}",
            self.state,
            next
        );
        self.observer.on_state_change(self.id, self.state, next);
        self.state = next;
    }

    fn status(&self, message: &str) {
        self.observer.on_status(self.id, message);
    }
}

/// Releases the in-flight slot when the attempt ends or its future is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Drives upload attempts against one backend.
pub struct UploadWorkflow {
    config: UploadConfig,
    client: reqwest::Client,
    presign: PresignClient,
    poller: MetadataPoller,
    presenter: ResultPresenter,
    cancel: CancellationToken,
    in_flight: AtomicUsize,
    next_attempt: AtomicU64,
}

impl UploadWorkflow {
    /// Build a workflow that persists into `store` and displays on `surface`.
    pub fn new(
        config: UploadConfig,
        store: Arc<dyn ResultStore>,
        surface: Arc<dyn DisplaySurface>,
    ) -> Result<Self, AutoPdfError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AutoPdfError::Internal(format!("building HTTP client: {e}")))?;

        let cancel = CancellationToken::new();
        let presign = PresignClient::new(
            client.clone(),
            config.presign_url.clone(),
            config.strategy,
            config.request_timeout_secs,
        );
        let poller = MetadataPoller::new(
            client.clone(),
            config.metadata_url.clone(),
            PollSchedule::new(
                config.poll_attempts,
                Duration::from_millis(config.poll_interval_ms),
            ),
            config.request_timeout_secs,
        )
        .with_cancellation(cancel.clone());

        Ok(Self {
            presenter: ResultPresenter::new(store, surface),
            config,
            client,
            presign,
            poller,
            cancel,
            in_flight: AtomicUsize::new(0),
            next_attempt: AtomicU64::new(0),
        })
    }

    /// Replace the wait between poll attempts.
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.poller = self.poller.with_delay(delay);
        self
    }

    /// Token that stops the running attempt before its next request. Cancelling
    /// it affects every later attempt too, so treat it as a shutdown signal.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Attempts currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Open the display surface on the stored result without uploading.
    pub fn show_last(&self) -> Result<(), AutoPdfError> {
        self.presenter.reopen()
    }

    /// Run one upload attempt for `file`.
    ///
    /// # Returns
    /// `Ok(AttemptReport)` once the attempt reached a terminal state, including
    /// `Failed`; check `report.state`.
    ///
    /// # Errors
    /// Only for attempts that never start:
    /// - [`AutoPdfError::OversizeFile`] — checked before any request
    /// - [`AutoPdfError::AttemptInProgress`] — under [`AttemptPolicy::Reject`]
    pub async fn run(&self, file: &FileHandle) -> Result<AttemptReport, AutoPdfError> {
        file.check_size(self.config.max_file_bytes)?;
        let _guard = self.enter()?;

        let id = self.next_attempt.fetch_add(1, Ordering::SeqCst) + 1;
        let observer: &dyn WorkflowObserver = match self.config.observer {
            Some(ref o) => o.as_ref(),
            None => &NoopObserver,
        };
        let start = Instant::now();
        info!("Attempt {}: uploading '{}'", id, file.name());

        let mut attempt = Attempt::new(id, observer);
        let (metadata, status, error) = match self.drive(&mut attempt, file).await {
            Ok((metadata, status)) => (metadata, status, None),
            Err(e) => {
                warn!("Attempt {} failed: {}", id, e);
                let status = format!("Error: {e}");
                attempt.status(&status);
                attempt.advance(AttemptState::Failed);
                (None, status, Some(e.to_string()))
            }
        };

        Ok(AttemptReport {
            attempt_id: id,
            state: attempt.state,
            key: attempt.key,
            metadata,
            status,
            error,
            poll_attempts: attempt.poll_attempts,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn enter(&self) -> Result<InFlightGuard<'_>, AutoPdfError> {
        match self.config.attempt_policy {
            AttemptPolicy::Reject => {
                self.in_flight
                    .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                    .map_err(|_| AutoPdfError::AttemptInProgress)?;
            }
            AttemptPolicy::Allow => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Run `step` unless the token fires first. An already-cancelled token
    /// wins before `step` is polled, so no request goes out.
    async fn until_cancelled<T>(
        &self,
        step: impl Future<Output = Result<T, AutoPdfError>>,
    ) -> Result<T, AutoPdfError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AutoPdfError::Cancelled),
            r = step => r,
        }
    }

    async fn drive(
        &self,
        attempt: &mut Attempt<'_>,
        file: &FileHandle,
    ) -> Result<(Option<Metadata>, String), AutoPdfError> {
        attempt.advance(AttemptState::Presigning);
        attempt.status(STATUS_PRESIGNING);
        let descriptor = self
            .until_cancelled(self.presign.request_upload_descriptor(file.name()))
            .await?;

        // The key stays fixed for the rest of the attempt.
        let key = descriptor.storage_key.clone();
        attempt.key = Some(key.clone());

        attempt.advance(AttemptState::Uploading);
        attempt.status(STATUS_UPLOADING);
        self.until_cancelled(upload::upload(
            &self.client,
            descriptor,
            file,
            self.config.request_timeout_secs,
        ))
        .await?;

        attempt.advance(AttemptState::Polling);
        attempt.status(STATUS_POLLING);
        let outcome = self.poller.poll(&key, attempt.id, attempt.observer).await?;
        attempt.poll_attempts = outcome.attempts();
        if let PollOutcome::Cancelled { .. } = outcome {
            return Err(AutoPdfError::Cancelled);
        }

        let metadata = outcome.into_metadata();
        match self
            .presenter
            .present_blocking(attempt.id, &key, metadata.clone())
            .await?
        {
            PresentOutcome::Displayed => {
                let status = format!("Metadata for {key} displayed.");
                attempt.advance(AttemptState::Displayed);
                attempt.status(&status);
                Ok((metadata, status))
            }
            PresentOutcome::Pending { message } => {
                attempt.advance(AttemptState::PendingProcessing);
                attempt.status(&message);
                Ok((None, message))
            }
        }
    }
}

/// Upload the PDF at `path` with a one-off workflow.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use autopdf_upload::{upload_pdf, ConsoleSurface, JsonFileStore, UploadConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = UploadConfig::builder()
///         .presign_url("https://api.example.com/prod/presign")
///         .metadata_url("https://api.example.com/prod/metadata")
///         .build()?;
///     let store = Arc::new(JsonFileStore::new(JsonFileStore::default_path()));
///     let report = upload_pdf("paper.pdf", config, store, Arc::new(ConsoleSurface::stdout())).await?;
///     eprintln!("{}", report.status);
///     Ok(())
/// }
/// ```
pub async fn upload_pdf(
    path: impl AsRef<Path>,
    config: UploadConfig,
    store: Arc<dyn ResultStore>,
    surface: Arc<dyn DisplaySurface>,
) -> Result<AttemptReport, AutoPdfError> {
    let file = FileHandle::open(path).await?;
    UploadWorkflow::new(config, store, surface)?.run(&file).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttemptState::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(Idle.can_transition_to(Presigning));
        assert!(Presigning.can_transition_to(Uploading));
        assert!(Uploading.can_transition_to(Polling));
        assert!(Polling.can_transition_to(Displayed));
        assert!(Polling.can_transition_to(PendingProcessing));
        for s in [Presigning, Uploading, Polling] {
            assert!(s.can_transition_to(Failed), "{s:?} → Failed");
        }
    }

    #[test]
    fn backward_and_skipping_transitions_rejected() {
        assert!(!Uploading.can_transition_to(Presigning));
        assert!(!Polling.can_transition_to(Uploading));
        assert!(!Idle.can_transition_to(Polling));
        assert!(!Presigning.can_transition_to(Displayed));
    }

    #[test]
    fn terminal_states_are_final() {
        for t in [Displayed, PendingProcessing, Failed] {
            assert!(t.is_terminal());
            for next in [Idle, Presigning, Uploading, Polling, Displayed, PendingProcessing, Failed] {
                assert!(!t.can_transition_to(next), "{t:?} → {next:?}");
            }
        }
    }

    #[tokio::test]
    async fn oversize_file_rejected_before_network() {
        let config = UploadConfig::builder()
            .presign_url("http://127.0.0.1:1/presign")
            .metadata_url("http://127.0.0.1:1/metadata")
            .max_file_bytes(4)
            .build()
            .unwrap();
        let wf = UploadWorkflow::new(
            config,
            Arc::new(crate::store::MemoryStore::new()),
            Arc::new(crate::display::ConsoleSurface::new(Vec::new())),
        )
        .unwrap();

        let file = FileHandle::from_bytes("big.pdf", vec![0u8; 5]);
        let err = wf.run(&file).await.unwrap_err();
        assert!(matches!(err, AutoPdfError::OversizeFile { size: 5, limit: 4 }));
        assert_eq!(wf.in_flight(), 0);
    }
}
