//! Upload executor: transfer the payload to object storage.
//!
//! Exactly one request per call and no retry. A failed upload is terminal for
//! the attempt; the user re-triggers the whole workflow.

use crate::error::AutoPdfError;
use crate::pipeline::input::FileHandle;
use crate::pipeline::presign::{UploadDescriptor, UploadMode};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tracing::info;

/// Send `file` to `descriptor.destination_url` using the descriptor's mode.
///
/// The descriptor is consumed: presigned targets are single-use.
///
/// # Errors
/// - [`AutoPdfError::Upload`] on a non-2xx status
/// - transport errors from the request itself
pub async fn upload(
    client: &reqwest::Client,
    descriptor: UploadDescriptor,
    file: &FileHandle,
    timeout_secs: u64,
) -> Result<(), AutoPdfError> {
    let UploadDescriptor {
        destination_url: url,
        mode,
        storage_key,
    } = descriptor;

    let request = match mode {
        UploadMode::Put => client
            .put(&url)
            .header(CONTENT_TYPE, file.mime())
            .body(file.bytes().clone()),
        UploadMode::PostMultipart { fields } => {
            client.post(&url).multipart(build_form(fields, file)?)
        }
    };

    info!(
        "Uploading '{}' ({} bytes) as '{}'",
        file.name(),
        file.size(),
        storage_key
    );

    let response = request
        .send()
        .await
        .map_err(|e| AutoPdfError::from_transport(&url, timeout_secs, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AutoPdfError::Upload {
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Multipart body: one text part per presigned field, in order, then `file`.
///
/// Object stores evaluate the POST policy against the fields that precede the
/// file part and ignore anything after it, so `file` must come last.
fn build_form(fields: Vec<(String, String)>, file: &FileHandle) -> Result<Form, AutoPdfError> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }

    // Known length keeps a Content-Length on the form; presigned POST refuses chunked bodies.
    let part = Part::stream_with_length(file.bytes().clone(), file.size())
        .file_name(file.name().to_string())
        .mime_str(file.mime())
        .map_err(|e| {
            AutoPdfError::Internal(format!("invalid MIME type '{}': {}", file.mime(), e))
        })?;

    Ok(form.part("file", part))
}
