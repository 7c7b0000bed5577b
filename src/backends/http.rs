//! HTTP transport backed by `reqwest`.
//!
//! Requests are resolved against a base URL, JSON bodies are sent with
//! `Content-Type: application/json`, and uploads become multipart forms with
//! the normalized file in the `file` part.

use crate::core::{
    ApiRequest, ApiResponse, RequestBody, Transport, UploadPayload, WebAvError, WebAvResult,
};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Method};
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport that talks to the service over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> WebAvResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebAvError::transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Creates a transport around an existing `reqwest` client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: normalize_base_url(&base_url.into()),
        }
    }

    /// Returns the base URL, always ending in exactly one `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replaces the base URL.
    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = normalize_base_url(base_url);
    }

    /// Joins a relative path onto the base URL.
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build_form(payload: UploadPayload, fields: Vec<(String, String)>) -> WebAvResult<Form> {
        let UploadPayload::Multipart {
            data,
            file_name,
            media_type,
        } = payload
        else {
            return Err(WebAvError::invalid_argument(
                "URL submissions cannot be sent as multipart uploads",
            ));
        };

        let length = data.len() as u64;
        let mut part = Part::stream_with_length(data, length).file_name(file_name);
        if let Some(media_type) = media_type {
            part = part.mime_str(&media_type).map_err(|e| {
                WebAvError::invalid_argument(format!("invalid media type '{media_type}': {e}"))
            })?;
        }

        let form = fields
            .into_iter()
            .fold(Form::new().part("file", part), |form, (name, value)| {
                form.text(name, value)
            });
        Ok(form)
    }
}

/// Trims trailing slashes and appends exactly one.
pub fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> WebAvResult<ApiResponse> {
        request.validate()?;

        let url = self.build_url(&request.path);
        let method = request.method.clone();
        let mut builder = if method == Method::GET {
            self.client.get(&url)
        } else {
            self.client.post(&url)
        };

        builder = builder.header(header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { payload, fields } => {
                builder.multipart(Self::build_form(payload, fields)?)
            }
        };

        tracing::debug!(%method, path = %request.path, "Sending request");

        let response = builder.send().await.map_err(WebAvError::from)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(WebAvError::from)?;

        tracing::debug!(%method, path = %request.path, status, bytes = body.len(), "Received response");

        Ok(ApiResponse { status, body })
    }
}
