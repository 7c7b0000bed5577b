//! # webav
//!
//! An async client for the WebAV file scanning service.
//!
//! ## Overview
//!
//! Files are scanned asynchronously by the service: a submission returns a
//! job identifier straight away and the verdict arrives later. This crate
//! lets you:
//!
//! - Submit a file by upload, from base64 text, bytes, a byte stream, a
//!   reader or a path, all normalized into one multipart payload
//! - Submit a file by URL for the service to fetch itself
//! - Query a job's status or list recent jobs page by page
//! - Block until a job reaches a terminal status, with a bounded wait
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use webav::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WebAv::new(WebAvConfig::new("my-api-key"))?;
//!
//!     let input = FileInput::from_bytes(b"file content".to_vec());
//!     let queued = client.scan_by_upload(input, "document.txt").await?;
//!
//!     let result = client.wait_for(&queued.id).await?;
//!     if result.is_clean() {
//!         println!("File is clean!");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Core**: status types, file inputs, payload normalization, the
//!   `Transport` trait and errors
//! - **Backends**: `Transport` implementations (HTTPS and mock)
//! - **Client**: configuration, the `WebAv` client and the status poller

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
pub mod client;
pub mod core;

// Re-export commonly used types at the crate root
pub use crate::core::{
    get_status_label, normalize, ApiRequest, ApiResponse, FileInput, FileStatus, PaginatedFiles,
    RequestBody, Transport, UploadPayload, VirusStatus, WebAvError, WebAvResult,
};

pub use crate::backends::{HttpTransport, MockTransport};
pub use crate::client::{
    Clock, CredentialPlacement, PollConfig, Poller, TokioClock, WebAv, WebAvConfig,
};

/// Prelude module for convenient imports.
///
/// ```rust
/// use webav::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::{CredentialPlacement, PollConfig, WebAv, WebAvConfig};
    pub use crate::core::{
        get_status_label, FileInput, FileStatus, PaginatedFiles, VirusStatus, WebAvError,
        WebAvResult,
    };
}
