//! Output types: backend metadata, the persisted result record, and the
//! per-attempt report returned by [`crate::workflow::UploadWorkflow::run`].

use crate::workflow::AttemptState;
use serde::{Deserialize, Serialize};

/// Descriptive information the backend derived from an uploaded PDF.
///
/// Every field is optional: PDFs frequently lack a title or author, and the
/// upload timestamp is only present on newer backend deployments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Page count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
    /// First characters of page-one text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// The record kept in the result store.
///
/// Serialised with the `lastMetadata` / `lastKey` key names so a store file
/// stays readable by other front ends of the same backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedResult {
    #[serde(default)]
    pub last_metadata: Option<Metadata>,
    pub last_key: String,
    /// Attempt that wrote this record. `0` for records written by other tools.
    #[serde(default)]
    pub attempt_id: u64,
}

/// Summary of one upload attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub attempt_id: u64,
    /// Terminal state: `Displayed`, `PendingProcessing` or `Failed`.
    pub state: AttemptState,
    /// Storage key, once presign succeeded.
    pub key: Option<String>,
    pub metadata: Option<Metadata>,
    /// Final status line, e.g. `Error: Presign failed (403)`.
    pub status: String,
    /// Display text of the error that ended a failed attempt.
    pub error: Option<String>,
    /// Metadata poll requests made.
    pub poll_attempts: u32,
    pub duration_ms: u64,
}

impl AttemptReport {
    pub fn is_success(&self) -> bool {
        self.state == AttemptState::Displayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_tolerates_nulls_and_missing_fields() {
        let m: Metadata =
            serde_json::from_str(r#"{"title":"X","author":null,"pages":3}"#).unwrap();
        assert_eq!(m.title.as_deref(), Some("X"));
        assert_eq!(m.author, None);
        assert_eq!(m.pages, Some(3));
        assert_eq!(m.uploaded, None);
        assert_eq!(m.preview, None);
    }

    #[test]
    fn persisted_result_uses_camel_case_keys() {
        let r = PersistedResult {
            last_metadata: Some(Metadata {
                title: Some("T".into()),
                ..Default::default()
            }),
            last_key: "doc.pdf".into(),
            attempt_id: 4,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["lastKey"], "doc.pdf");
        assert_eq!(json["lastMetadata"]["title"], "T");
        assert_eq!(json["attemptId"], 4);
    }

    #[test]
    fn persisted_result_without_attempt_id() {
        let r: PersistedResult =
            serde_json::from_str(r#"{"lastMetadata":{"pages":2},"lastKey":"a.pdf"}"#).unwrap();
        assert_eq!(r.attempt_id, 0);
        assert_eq!(r.last_metadata.unwrap().pages, Some(2));
    }
}
