//! Input resolution: load the user-selected file and build endpoint URLs.
//!
//! The whole payload is read into memory up front. Files are capped at
//! 5 MiB, and holding the bytes lets the size check run before any request
//! and lets the same buffer back both upload strategies without re-reading.

use crate::error::AutoPdfError;
use bytes::Bytes;
use std::path::Path;
use tracing::debug;

/// MIME type declared for selected files unless the caller overrides it.
pub const DEFAULT_MIME: &str = "application/pdf";

/// The user-selected payload for one upload attempt.
///
/// Cloning is cheap: the bytes are reference-counted.
#[derive(Clone)]
pub struct FileHandle {
    name: String,
    bytes: Bytes,
    mime: String,
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

impl FileHandle {
    /// Wrap an in-memory payload, declared as `application/pdf`.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            mime: DEFAULT_MIME.to_string(),
        }
    }

    /// Override the declared MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Read a local file into a handle.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AutoPdfError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AutoPdfError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => AutoPdfError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => AutoPdfError::FileRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Reject the file when it is larger than `limit` bytes.
    pub fn check_size(&self, limit: u64) -> Result<(), AutoPdfError> {
        if self.size() > limit {
            return Err(AutoPdfError::OversizeFile {
                size: self.size(),
                limit,
            });
        }
        Ok(())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Append `param=<percent-encoded value>` to an endpoint URL.
pub fn endpoint_url(base: &str, param: &str, value: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{param}={}", urlencoding::encode(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/presign"));
        assert!(is_url("http://localhost:9000/metadata"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn endpoint_url_percent_encodes() {
        assert_eq!(
            endpoint_url("https://api.test/presign", "filename", "my report#1.pdf"),
            "https://api.test/presign?filename=my%20report%231.pdf"
        );
        assert_eq!(
            endpoint_url("https://api.test/metadata?stage=prod", "key", "a/b.pdf"),
            "https://api.test/metadata?stage=prod&key=a%2Fb.pdf"
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        let limit = 5 * 1024 * 1024;
        let at_limit = FileHandle::from_bytes("a.pdf", vec![0u8; limit as usize]);
        assert!(at_limit.check_size(limit).is_ok());

        let over = FileHandle::from_bytes("b.pdf", vec![0u8; limit as usize + 1]);
        assert!(matches!(
            over.check_size(limit),
            Err(AutoPdfError::OversizeFile { size, .. }) if size == limit + 1
        ));
    }

    #[test]
    fn default_mime_is_pdf() {
        let f = FileHandle::from_bytes("x.pdf", &b"%PDF-1.7"[..]);
        assert_eq!(f.mime(), "application/pdf");
        assert_eq!(f.with_mime("application/octet-stream").mime(), "application/octet-stream");
    }

    #[tokio::test]
    async fn open_missing_file() {
        let err = FileHandle::open("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, AutoPdfError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn open_reads_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.4 hello").unwrap();

        let f = FileHandle::open(&path).await.unwrap();
        assert_eq!(f.name(), "paper.pdf");
        assert_eq!(f.size(), 14);
        assert_eq!(&f.bytes()[..], b"%PDF-1.4 hello");
    }
}
