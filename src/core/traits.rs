//! The transport seam between the client and the network.
//!
//! The client builds an [`ApiRequest`], hands it to a [`Transport`] and
//! interprets the raw [`ApiResponse`] itself, so status mapping and decoding
//! behave identically for every transport implementation.

use crate::core::error::{WebAvError, WebAvResult};
use crate::core::payload::UploadPayload;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use std::fmt::Debug;

/// Executes requests against the scanning service.
///
/// Implementations own connection handling, TLS and timeouts. They return
/// every HTTP response they receive, whatever its status, and only fail for
/// network-layer problems.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use webav::core::{ApiRequest, ApiResponse, Transport, WebAvResult};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct Offline;
///
/// #[async_trait]
/// impl Transport for Offline {
///     async fn execute(&self, _request: ApiRequest) -> WebAvResult<ApiResponse> {
///         Err(webav::WebAvError::transport("offline"))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Sends one request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns `Transport` when no response could be obtained.
    async fn execute(&self, request: ApiRequest) -> WebAvResult<ApiResponse>;
}

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,

    /// A JSON document.
    Json(serde_json::Value),

    /// A multipart form: the `file` part plus extra text fields.
    Multipart {
        /// The normalized upload.
        payload: UploadPayload,
        /// Additional text fields, in order.
        fields: Vec<(String, String)>,
    },
}

/// A request addressed relative to the service base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP verb. Only GET and POST are accepted.
    pub method: Method,

    /// Path relative to the base URL, without a leading slash.
    pub path: String,

    /// Query parameters, in order.
    pub query: Vec<(String, String)>,

    /// Extra request headers.
    pub headers: Vec<(String, String)>,

    /// Request body.
    pub body: RequestBody,
}

impl ApiRequest {
    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a request with an arbitrary verb.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Checks that the verb is supported and that the body suits it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for verbs other than GET and POST, and for
    /// GET requests carrying a body.
    pub fn validate(&self) -> WebAvResult<()> {
        if self.method == Method::GET {
            if self.body != RequestBody::Empty {
                return Err(WebAvError::invalid_argument("GET requests cannot have a body"));
            }
            Ok(())
        } else if self.method == Method::POST {
            Ok(())
        } else {
            Err(WebAvError::invalid_argument(format!(
                "invalid method: {}",
                self.method
            )))
        }
    }
}

/// A raw response from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body.
    pub body: Bytes,
}

impl ApiResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a response with a JSON body.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A boxed transport for type-erased storage.
pub type BoxedTransport = Box<dyn Transport>;

/// An arc-wrapped transport for shared ownership.
pub type ArcTransport = std::sync::Arc<dyn Transport>;

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: ApiRequest) -> WebAvResult<ApiResponse> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: ApiRequest) -> WebAvResult<ApiResponse> {
        (**self).execute(request).await
    }
}
