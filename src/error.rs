//! Error types for the autopdf-upload library.
//!
//! Every failure surfaces as an [`AutoPdfError`]. Inside an upload attempt the
//! workflow catches these and turns them into a terminal `Failed` state with an
//! `Error: <message>` status line, so the `Display` text of each variant is
//! what the user ends up reading.
//!
//! Poll exhaustion is deliberately absent from this enum: running out of poll
//! attempts resolves to "no metadata yet", not to an error.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the autopdf-upload library.
#[derive(Debug, Error)]
pub enum AutoPdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The selected file does not exist.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is larger than the upload limit. Checked before any request.
    #[error("File is {size} bytes, which exceeds the {limit}-byte upload limit")]
    OversizeFile { size: u64, limit: u64 },

    // ── Protocol errors ───────────────────────────────────────────────────
    /// The presign endpoint answered with a non-2xx status.
    #[error("Presign failed ({status})")]
    Presign { status: u16 },

    /// The storage endpoint rejected the upload with a non-2xx status.
    #[error("Upload failed ({status})")]
    Upload { status: u16 },

    /// The request never produced an HTTP response (DNS, TLS, connection reset …).
    #[error("Request to '{url}' failed: {reason}\nCheck your internet connection.")]
    RequestFailed { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Request to '{url}' timed out after {secs}s\nIncrease --request-timeout.")]
    RequestTimeout { url: String, secs: u64 },

    /// A 2xx response carried a body that does not match the expected contract.
    #[error("Unexpected response from '{url}': {reason}")]
    InvalidResponse { url: String, reason: String },

    // ── Attempt control ───────────────────────────────────────────────────
    /// Another upload attempt is still running and the policy forbids overlap.
    #[error("An upload is already in progress; wait for it to finish")]
    AttemptInProgress,

    /// The attempt was cancelled before it reached a terminal state.
    #[error("Upload attempt was cancelled")]
    Cancelled,

    // ── Result store / display ────────────────────────────────────────────
    /// Could not read the persisted result.
    #[error("Failed to read result store '{path}': {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the persisted result.
    #[error("Failed to write result store '{path}': {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The result store exists but does not hold a valid record.
    #[error("Result store '{path}' is corrupt: {detail}\nDelete the file to reset it.")]
    StoreCorrupt { path: PathBuf, detail: String },

    /// The display surface could not be opened.
    #[error("Failed to open display: {0}")]
    DisplayFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutoPdfError {
    /// Map a transport-level `reqwest` failure for `url` onto the matching variant.
    pub(crate) fn from_transport(url: &str, timeout_secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AutoPdfError::RequestTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AutoPdfError::RequestFailed {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// HTTP status carried by the error, if it came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AutoPdfError::Presign { status } | AutoPdfError::Upload { status } => Some(*status),
            _ => None,
        }
    }
}
