//! Observer trait for upload-workflow events.
//!
//! Inject an [`Arc<dyn WorkflowObserver>`] via
//! [`crate::config::UploadConfigBuilder::observer`] to receive events as an
//! attempt moves through presign, upload and polling. The CLI uses this to
//! drive its spinner; a GUI front end would use it to update a status label.
//!
//! # Example
//!
//! ```rust
//! use autopdf_upload::{UploadConfig, WorkflowObserver};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct StatusLog(Mutex<Vec<String>>);
//!
//! impl WorkflowObserver for StatusLog {
//!     fn on_status(&self, _attempt_id: u64, message: &str) {
//!         self.0.lock().unwrap().push(message.to_string());
//!     }
//! }
//!
//! let config = UploadConfig::builder()
//!     .presign_url("https://api.example.com/presign")
//!     .metadata_url("https://api.example.com/metadata")
//!     .observer(Arc::new(StatusLog::default()))
//!     .build()
//!     .unwrap();
//! ```

use crate::workflow::AttemptState;
use std::sync::Arc;

/// Called by the workflow as an attempt progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. With [`crate::config::AttemptPolicy::Allow`] several
/// attempts may report concurrently; tell them apart by `attempt_id`.
pub trait WorkflowObserver: Send + Sync {
    /// Called when the upload action becomes enabled (a valid file was
    /// selected while none was). Not repeated for further valid selections.
    fn on_upload_enabled(&self) {}

    /// Called when the selection is cleared or rejected and the upload action
    /// becomes disabled.
    fn on_upload_disabled(&self) {}

    /// Called on every state-machine transition.
    fn on_state_change(&self, attempt_id: u64, from: AttemptState, to: AttemptState) {
        let _ = (attempt_id, from, to);
    }

    /// Called with the human-readable status line for the current step.
    fn on_status(&self, attempt_id: u64, message: &str) {
        let _ = (attempt_id, message);
    }

    /// Called after each metadata poll request.
    ///
    /// # Arguments
    /// * `attempt`  — 1-indexed poll attempt
    /// * `max`      — poll budget
    /// * `status`   — HTTP status the metadata endpoint answered with
    fn on_poll_attempt(&self, attempt_id: u64, attempt: u32, max: u32, status: u16) {
        let _ = (attempt_id, attempt, max, status);
    }
}

/// A no-op implementation for callers that don't need workflow events.
///
/// This is the default when no observer is configured.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::UploadConfig`].
pub type Observer = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        transitions: AtomicUsize,
        polls: AtomicUsize,
    }

    impl WorkflowObserver for CountingObserver {
        fn on_state_change(&self, _id: u64, _from: AttemptState, _to: AttemptState) {
            self.transitions.fetch_add(1, Ordering::SeqCst);
        }

        fn on_poll_attempt(&self, _id: u64, _attempt: u32, _max: u32, _status: u16) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_upload_enabled();
        o.on_upload_disabled();
        o.on_state_change(1, AttemptState::Idle, AttemptState::Presigning);
        o.on_status(1, "Requesting upload URL…");
        o.on_poll_attempt(1, 1, 10, 404);
    }

    #[test]
    fn arc_dyn_observer_receives_events() {
        let counter = Arc::new(CountingObserver::default());
        let o: Observer = counter.clone();
        o.on_state_change(7, AttemptState::Idle, AttemptState::Presigning);
        o.on_state_change(7, AttemptState::Presigning, AttemptState::Uploading);
        o.on_poll_attempt(7, 1, 10, 404);
        assert_eq!(counter.transitions.load(Ordering::SeqCst), 2);
        assert_eq!(counter.polls.load(Ordering::SeqCst), 1);
    }
}
