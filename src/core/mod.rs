//! Core types and traits for the webav client.
//!
//! - [`status`] - `VirusStatus`, `FileStatus`, `PaginatedFiles` and labels
//! - [`input`] - the `FileInput` union accepted for uploads
//! - [`payload`] - normalization of inputs into upload payloads
//! - [`traits`] - the `Transport` trait and request/response types
//! - [`error`] - structured error types

pub mod error;
pub mod input;
pub mod payload;
pub mod status;
pub mod traits;

pub use error::{WebAvError, WebAvResult};
pub use input::{ByteStream, FileInput};
pub use payload::{normalize, UploadPayload};
pub use status::{get_status_label, FileStatus, PaginatedFiles, VirusStatus, VIRUS_STATUS_LABELS};
pub use traits::{ApiRequest, ApiResponse, ArcTransport, BoxedTransport, RequestBody, Transport};
