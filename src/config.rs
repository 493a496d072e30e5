//! Configuration types for the upload workflow.
//!
//! All workflow behaviour is controlled through [`UploadConfig`], built via
//! its [`UploadConfigBuilder`]. The two endpoint URLs have no sensible
//! defaults, so `build()` refuses a config without them.

use crate::error::AutoPdfError;
use crate::pipeline::input::is_url;
use crate::progress::Observer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest file accepted for upload: 5 MiB.
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Default number of metadata poll attempts.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;

/// Default wait before each metadata poll attempt, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Configuration for an upload workflow.
///
/// # Example
/// ```rust
/// use autopdf_upload::{PresignStrategy, UploadConfig};
///
/// let config = UploadConfig::builder()
///     .presign_url("https://api.example.com/prod/presign")
///     .metadata_url("https://api.example.com/prod/metadata")
///     .strategy(PresignStrategy::Post)
///     .build()
///     .unwrap();
/// assert_eq!(config.poll_attempts, 10);
/// ```
#[derive(Clone)]
pub struct UploadConfig {
    /// Presign endpoint, queried as `GET <presign_url>?filename=<name>`.
    pub presign_url: String,

    /// Metadata endpoint, queried as `GET <metadata_url>?key=<key>`.
    pub metadata_url: String,

    /// Which presign response contract the deployed backend speaks. Default: [`PresignStrategy::Put`].
    pub strategy: PresignStrategy,

    /// Upload size limit in bytes. Default: [`MAX_FILE_BYTES`].
    pub max_file_bytes: u64,

    /// Metadata poll attempts before giving up. Default: 10.
    pub poll_attempts: u32,

    /// Fixed wait before every poll attempt, first one included. Default: 1000 ms.
    ///
    /// There is no backoff and no jitter: the backend answers "not ready" and
    /// "transient failure" the same way, so every miss simply costs one slot.
    pub poll_interval_ms: u64,

    /// Per-request HTTP timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// What to do when `run` is called while another attempt is in flight.
    /// Default: [`AttemptPolicy::Reject`].
    pub attempt_policy: AttemptPolicy,

    /// Receives state changes and status lines. Default: none.
    pub observer: Option<Observer>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            presign_url: String::new(),
            metadata_url: String::new(),
            strategy: PresignStrategy::default(),
            max_file_bytes: MAX_FILE_BYTES,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: 60,
            attempt_policy: AttemptPolicy::default(),
            observer: None,
        }
    }
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("presign_url", &self.presign_url)
            .field("metadata_url", &self.metadata_url)
            .field("strategy", &self.strategy)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("poll_attempts", &self.poll_attempts)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("attempt_policy", &self.attempt_policy)
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<dyn WorkflowObserver>"),
            )
            .finish()
    }
}

impl UploadConfig {
    /// Create a new builder for `UploadConfig`.
    pub fn builder() -> UploadConfigBuilder {
        UploadConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`UploadConfig`].
#[derive(Debug)]
pub struct UploadConfigBuilder {
    config: UploadConfig,
}

impl UploadConfigBuilder {
    pub fn presign_url(mut self, url: impl Into<String>) -> Self {
        self.config.presign_url = url.into();
        self
    }

    pub fn metadata_url(mut self, url: impl Into<String>) -> Self {
        self.config.metadata_url = url.into();
        self
    }

    pub fn strategy(mut self, strategy: PresignStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn poll_attempts(mut self, n: u32) -> Self {
        self.config.poll_attempts = n;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn attempt_policy(mut self, policy: AttemptPolicy) -> Self {
        self.config.attempt_policy = policy;
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<UploadConfig, AutoPdfError> {
        let c = &self.config;
        if !is_url(&c.presign_url) {
            return Err(AutoPdfError::InvalidConfig(format!(
                "presign URL must be an http(s) URL, got '{}'",
                c.presign_url
            )));
        }
        if !is_url(&c.metadata_url) {
            return Err(AutoPdfError::InvalidConfig(format!(
                "metadata URL must be an http(s) URL, got '{}'",
                c.metadata_url
            )));
        }
        if c.poll_attempts == 0 {
            return Err(AutoPdfError::InvalidConfig(
                "poll attempts must be ≥ 1".into(),
            ));
        }
        if c.max_file_bytes == 0 {
            return Err(AutoPdfError::InvalidConfig(
                "max file size must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The presign protocol variant spoken by the deployed backend.
///
/// The two variants are not interchangeable: a PUT-style backend returns
/// `{url, key}` and expects a raw-body PUT, a POST-style backend returns
/// `{url, fields, key}` and expects a multipart form carrying every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresignStrategy {
    /// `{url, key}` → `PUT <url>` with the raw file as body. (default)
    #[default]
    Put,
    /// `{url, fields, key}` → `POST <url>` with a multipart form.
    Post,
}

/// Policy for a second `run` while an attempt is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptPolicy {
    /// Refuse the second attempt with [`AutoPdfError::AttemptInProgress`]. (default)
    #[default]
    Reject,
    /// Let attempts overlap; each is tracked under its own attempt id and the
    /// result store keeps whichever finishes last.
    Allow,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> UploadConfigBuilder {
        UploadConfig::builder()
            .presign_url("https://api.example.com/presign")
            .metadata_url("https://api.example.com/metadata")
    }

    #[test]
    fn defaults_match_protocol() {
        let c = base().build().unwrap();
        assert_eq!(c.max_file_bytes, 5 * 1024 * 1024);
        assert_eq!(c.poll_attempts, 10);
        assert_eq!(c.poll_interval_ms, 1000);
        assert_eq!(c.strategy, PresignStrategy::Put);
        assert_eq!(c.attempt_policy, AttemptPolicy::Reject);
    }

    #[test]
    fn missing_urls_rejected() {
        let err = UploadConfig::builder().build().unwrap_err();
        assert!(matches!(err, AutoPdfError::InvalidConfig(_)));

        let err = UploadConfig::builder()
            .presign_url("https://api.example.com/presign")
            .metadata_url("ftp://nope")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("metadata URL"));
    }

    #[test]
    fn zero_poll_attempts_rejected() {
        assert!(base().poll_attempts(0).build().is_err());
    }

    #[test]
    fn request_timeout_floor() {
        let c = base().request_timeout_secs(0).build().unwrap();
        assert_eq!(c.request_timeout_secs, 1);
    }

    #[test]
    fn strategy_serde_names() {
        assert_eq!(
            serde_json::to_string(&PresignStrategy::Post).unwrap(),
            "\"post\""
        );
        let p: AttemptPolicy = serde_json::from_str("\"allow\"").unwrap();
        assert_eq!(p, AttemptPolicy::Allow);
    }
}
