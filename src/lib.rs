//! # autopdf-upload
//!
//! Upload a PDF to object storage through a presigned URL, wait for the
//! backend to extract its metadata, and show the result.
//!
//! ## Workflow Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Select   size check (≤ 5 MiB) before anything touches the network
//!  ├─ 2. Presign  GET  <presign-url>?filename=…   → {url, key} | {url, fields, key}
//!  ├─ 3. Upload   PUT  <url> (raw body)  or  POST <url> (multipart form)
//!  ├─ 4. Poll     GET  <metadata-url>?key=…      up to 10× at 1 s intervals
//!  └─ 5. Present  store {lastMetadata, lastKey} and open the display surface
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autopdf_upload::{
//!     AttemptState, ConsoleSurface, FileHandle, JsonFileStore, UploadConfig, UploadWorkflow,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UploadConfig::builder()
//!         .presign_url("https://api.example.com/prod/presign")
//!         .metadata_url("https://api.example.com/prod/metadata")
//!         .build()?;
//!     let workflow = UploadWorkflow::new(
//!         config,
//!         Arc::new(JsonFileStore::new(JsonFileStore::default_path())),
//!         Arc::new(ConsoleSurface::stdout()),
//!     )?;
//!
//!     let file = FileHandle::open("paper.pdf").await?;
//!     let report = workflow.run(&file).await?;
//!     if report.state != AttemptState::Displayed {
//!         eprintln!("{}", report.status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `autopdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Presign strategies
//!
//! | Strategy | Presign response | Upload request |
//! |----------|------------------|----------------|
//! | `put`    | `{url, key}`     | `PUT <url>`, `Content-Type: application/pdf`, raw body |
//! | `post`   | `{url, fields, key}` | `POST <url>`, multipart: every field in order, then `file` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod display;
pub mod error;
pub mod form;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AttemptPolicy, PresignStrategy, UploadConfig, UploadConfigBuilder, MAX_FILE_BYTES};
pub use display::{ConsoleSurface, DisplaySurface, HtmlFileSurface};
pub use error::AutoPdfError;
pub use form::UploadForm;
pub use output::{AttemptReport, Metadata, PersistedResult};
pub use pipeline::input::FileHandle;
pub use pipeline::poll::{Delay, MetadataPoller, PollOutcome, PollSchedule, TokioDelay};
pub use pipeline::present::{PresentOutcome, ResultPresenter};
pub use pipeline::presign::{PresignClient, UploadDescriptor, UploadMode};
pub use pipeline::upload::upload;
pub use progress::{NoopObserver, Observer, WorkflowObserver};
pub use store::{JsonFileStore, MemoryStore, ResultStore};
pub use workflow::{upload_pdf, AttemptState, UploadWorkflow};
