//! Transport implementations.
//!
//! - [`http`] - `reqwest`-based HTTPS transport used in production
//! - [`mock`] - scripted in-memory transport for tests
//!
//! ## Implementing a Custom Transport
//!
//! Wrap another HTTP stack, add request signing, or route through a proxy by
//! implementing the `Transport` trait:
//!
//! ```rust,ignore
//! use webav::core::{ApiRequest, ApiResponse, Transport, WebAvResult};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct SignedTransport {
//!     inner: webav::backends::HttpTransport,
//! }
//!
//! #[async_trait]
//! impl Transport for SignedTransport {
//!     async fn execute(&self, request: ApiRequest) -> WebAvResult<ApiResponse> {
//!         let request = request.with_header("X-Signature", "...");
//!         self.inner.execute(request).await
//!     }
//! }
//! ```

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;
