//! Metadata poller: wait for the backend to finish processing an upload.
//!
//! ## Schedule
//!
//! A fixed number of attempts, each preceded by the same fixed wait (the
//! first one included, since the backend never has metadata the instant the
//! upload returns). With the defaults that is 10 × 1 s. No backoff, no jitter.
//!
//! Any non-2xx answer costs one attempt, whether it means "still processing"
//! (404) or a transient backend fault (5xx). The first 2xx ends the poll; a
//! `null` body there means "no metadata" rather than an error. Transport
//! failures and any other 2xx body that is not metadata are real errors.
//!
//! The wait goes through the [`Delay`] trait so tests can run the full loop
//! without sleeping, and every wait races a [`CancellationToken`] so a caller
//! that goes away stops the loop before its next request.

use crate::error::AutoPdfError;
use crate::output::Metadata;
use crate::pipeline::input::endpoint_url;
use crate::progress::{NoopObserver, WorkflowObserver};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Source of the wait between poll attempts.
pub trait Delay: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Real wall-clock waits via `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Attempt budget and fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollSchedule {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Total time spent waiting if every attempt misses (request latency excluded).
    pub fn worst_case_wait(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The endpoint answered 2xx on attempt `attempts`. A `null` body ends
    /// the poll too, but carries no metadata.
    Ready {
        metadata: Option<Metadata>,
        attempts: u32,
    },
    /// Every attempt missed.
    Exhausted { attempts: u32 },
    /// The token fired after `attempts` requests were sent (an interrupted
    /// in-flight request counts).
    Cancelled { attempts: u32 },
}

impl PollOutcome {
    /// Requests made before the poll ended.
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. }
            | PollOutcome::Exhausted { attempts }
            | PollOutcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn into_metadata(self) -> Option<Metadata> {
        match self {
            PollOutcome::Ready { metadata, .. } => metadata,
            _ => None,
        }
    }
}

/// Polls `GET <endpoint>?key=<key>` on a fixed schedule.
#[derive(Clone)]
pub struct MetadataPoller {
    client: reqwest::Client,
    endpoint: String,
    schedule: PollSchedule,
    delay: Arc<dyn Delay>,
    cancel: CancellationToken,
    timeout_secs: u64,
}

impl MetadataPoller {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        schedule: PollSchedule,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            schedule,
            delay: Arc::new(TokioDelay),
            cancel: CancellationToken::new(),
            timeout_secs,
        }
    }

    /// Replace the wait source (tests inject an instant one).
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    /// Stop polling when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    /// Poll until metadata arrives or the budget runs out.
    ///
    /// Returns `Ok(None)` on exhaustion.
    ///
    /// # Errors
    /// [`AutoPdfError::Cancelled`] if the token fired, plus transport and
    /// invalid-response errors.
    pub async fn poll_metadata(&self, key: &str) -> Result<Option<Metadata>, AutoPdfError> {
        match self.poll(key, 0, &NoopObserver).await? {
            PollOutcome::Cancelled { .. } => Err(AutoPdfError::Cancelled),
            outcome => Ok(outcome.into_metadata()),
        }
    }

    /// Poll, reporting every attempt to `observer`.
    pub async fn poll(
        &self,
        key: &str,
        attempt_id: u64,
        observer: &dyn WorkflowObserver,
    ) -> Result<PollOutcome, AutoPdfError> {
        let url = endpoint_url(&self.endpoint, "key", key);
        let max = self.schedule.attempts;
        info!(
            "Polling metadata for '{}' (up to {} attempts, {:?} apart)",
            key, max, self.schedule.interval
        );

        for attempt in 1..=max {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Ok(PollOutcome::Cancelled { attempts: attempt - 1 });
                }
                _ = self.delay.sleep(self.schedule.interval) => {}
            }

            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Ok(PollOutcome::Cancelled { attempts: attempt });
                }
                r = self.client.get(&url).send() => {
                    r.map_err(|e| AutoPdfError::from_transport(&url, self.timeout_secs, e))?
                }
            };

            let status = response.status();
            observer.on_poll_attempt(attempt_id, attempt, max, status.as_u16());

            if status.is_success() {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| AutoPdfError::from_transport(&url, self.timeout_secs, e))?;
                let metadata: Option<Metadata> =
                    serde_json::from_slice(&body).map_err(|e| AutoPdfError::InvalidResponse {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;
                match metadata {
                    Some(_) => info!("Metadata for '{}' ready after {} attempts", key, attempt),
                    None => info!("Metadata endpoint answered null for '{}'", key),
                }
                return Ok(PollOutcome::Ready {
                    metadata,
                    attempts: attempt,
                });
            }

            debug!("Attempt {}/{}: metadata not ready ({})", attempt, max, status);
        }

        info!("Metadata for '{}' still pending after {} attempts", key, max);
        Ok(PollOutcome::Exhausted { attempts: max })
    }
}
