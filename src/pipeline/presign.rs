//! Presign client: obtain a one-time upload descriptor for a filename.
//!
//! The backend hands out either a bare PUT target (`{url, key}`) or a
//! presigned POST form (`{url, fields, key}`). Which one is configured, not
//! sniffed: a POST backend that forgot its `fields` must fail loudly rather
//! than silently degrade into a PUT the bucket policy will refuse.

use crate::config::PresignStrategy;
use crate::error::AutoPdfError;
use crate::pipeline::input::endpoint_url;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// How the payload must be transferred to the destination URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadMode {
    /// `PUT <url>` with the raw file as body.
    Put,
    /// `POST <url>` multipart form: every field in order, then `file`.
    PostMultipart { fields: Vec<(String, String)> },
}

/// Everything needed to perform one upload.
///
/// Produced once per attempt; [`crate::pipeline::upload::upload`] takes it by
/// value so it cannot be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    pub destination_url: String,
    pub mode: UploadMode,
    pub storage_key: String,
}

#[derive(Deserialize)]
struct PutResponse {
    url: String,
    key: String,
}

#[derive(Deserialize)]
struct PostResponse {
    url: String,
    fields: Map<String, Value>,
    key: String,
}

/// Requests upload descriptors from the presign endpoint.
#[derive(Clone)]
pub struct PresignClient {
    client: reqwest::Client,
    endpoint: String,
    strategy: PresignStrategy,
    timeout_secs: u64,
}

impl PresignClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        strategy: PresignStrategy,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            strategy,
            timeout_secs,
        }
    }

    /// `GET <endpoint>?filename=<percent-encoded filename>` and decode the
    /// response according to the configured strategy.
    ///
    /// # Errors
    /// - [`AutoPdfError::Presign`] on a non-2xx status
    /// - [`AutoPdfError::InvalidResponse`] when a 2xx body does not match the strategy
    /// - transport errors from the request itself
    pub async fn request_upload_descriptor(
        &self,
        filename: &str,
    ) -> Result<UploadDescriptor, AutoPdfError> {
        let url = endpoint_url(&self.endpoint, "filename", filename);
        info!("Requesting {:?} presign for '{}'", self.strategy, filename);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AutoPdfError::from_transport(&url, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AutoPdfError::Presign {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AutoPdfError::from_transport(&url, self.timeout_secs, e))?;

        let descriptor = decode_descriptor(self.strategy, &body).map_err(|reason| {
            AutoPdfError::InvalidResponse {
                url: url.clone(),
                reason,
            }
        })?;
        debug!(
            "Presigned key '{}' → {}",
            descriptor.storage_key, descriptor.destination_url
        );
        Ok(descriptor)
    }
}

/// Decode a presign response body for the given strategy.
fn decode_descriptor(strategy: PresignStrategy, body: &[u8]) -> Result<UploadDescriptor, String> {
    match strategy {
        PresignStrategy::Put => {
            let r: PutResponse = serde_json::from_slice(body).map_err(|e| e.to_string())?;
            Ok(UploadDescriptor {
                destination_url: r.url,
                mode: UploadMode::Put,
                storage_key: r.key,
            })
        }
        PresignStrategy::Post => {
            let r: PostResponse = serde_json::from_slice(body).map_err(|e| e.to_string())?;
            let fields = r
                .fields
                .into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, v)
                })
                .collect();
            Ok(UploadDescriptor {
                destination_url: r.url,
                mode: UploadMode::PostMultipart { fields },
                storage_key: r.key,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_put_variant() {
        let d = decode_descriptor(
            PresignStrategy::Put,
            br#"{"url":"https://bucket.s3/abc?sig=1","key":"report.pdf"}"#,
        )
        .unwrap();
        assert_eq!(d.mode, UploadMode::Put);
        assert_eq!(d.storage_key, "report.pdf");
        assert_eq!(d.destination_url, "https://bucket.s3/abc?sig=1");
    }

    #[test]
    fn decode_post_variant_preserves_field_order() {
        let d = decode_descriptor(
            PresignStrategy::Post,
            br#"{"url":"https://bucket.s3/","key":"k.pdf",
                 "fields":{"key":"k.pdf","policy":"abc","x-amz-signature":"def","b":"2","a":"1"}}"#,
        )
        .unwrap();
        let UploadMode::PostMultipart { fields } = d.mode else {
            panic!("expected multipart mode");
        };
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["key", "policy", "x-amz-signature", "b", "a"]);
        assert_eq!(fields[4], ("a".to_string(), "1".to_string()));
    }

    #[test]
    fn decode_post_stringifies_non_string_fields() {
        let d = decode_descriptor(
            PresignStrategy::Post,
            br#"{"url":"u","key":"k","fields":{"n":5,"flag":true}}"#,
        )
        .unwrap();
        let UploadMode::PostMultipart { fields } = d.mode else {
            panic!("expected multipart mode");
        };
        assert_eq!(fields[0].1, "5");
        assert_eq!(fields[1].1, "true");
    }

    #[test]
    fn post_strategy_requires_fields() {
        let err = decode_descriptor(PresignStrategy::Post, br#"{"url":"u","key":"k"}"#).unwrap_err();
        assert!(err.contains("fields"), "got: {err}");
    }

    #[test]
    fn put_strategy_requires_key() {
        assert!(decode_descriptor(PresignStrategy::Put, br#"{"url":"u"}"#).is_err());
    }
}
