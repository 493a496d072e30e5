//! Pipeline stages of one upload attempt.
//!
//! Each submodule implements exactly one step, so each can be tested against
//! a mock server on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ presign ──▶ upload ──▶ poll ──▶ present
//! (file)    (GET)       (PUT/POST) (GET×N)  (store + display)
//! ```
//!
//! 1. [`input`]   — load the selected file, build endpoint URLs
//! 2. [`presign`] — fetch the one-time [`presign::UploadDescriptor`]
//! 3. [`upload`]  — transfer the payload once, no retry
//! 4. [`poll`]    — fixed-interval, bounded metadata poll
//! 5. [`present`] — persist present metadata and open the display surface

pub mod input;
pub mod poll;
pub mod present;
pub mod presign;
pub mod upload;
