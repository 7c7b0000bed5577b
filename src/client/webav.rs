//! The WebAV client.

use crate::backends::http::{normalize_base_url, HttpTransport};
use crate::client::config::{CredentialPlacement, WebAvConfig, API_KEY_FIELD, API_KEY_HEADER};
use crate::client::poller::{Clock, PollConfig, Poller};
use crate::core::{
    normalize, ApiRequest, ApiResponse, FileInput, FileStatus, PaginatedFiles, RequestBody,
    Transport, UploadPayload, WebAvError, WebAvResult,
};

use reqwest::Method;
use serde::de::DeserializeOwned;

const SCAN_PATH: &str = "webav/scan";
const STATUS_PATH: &str = "webav/status";

/// Longest response body echoed into a transport error.
const MAX_ERROR_BODY: usize = 512;

/// Client for the WebAV scanning service.
///
/// Submit a file by upload or URL, then either poll with
/// [`get_status`](Self::get_status) or block with [`wait_for`](Self::wait_for).
///
/// Every operation checks for an API key before building a request and
/// fails with `MissingCredential` without touching the transport.
///
/// # Example
///
/// ```rust,ignore
/// use webav::prelude::*;
///
/// let client = WebAv::new(WebAvConfig::new("my-api-key"))?;
///
/// let queued = client.scan_by_url("https://example.com/report.pdf").await?;
/// let done = client.wait_for(&queued.id).await?;
/// println!("{}", done.virus_status_label);
/// ```
#[derive(Debug)]
pub struct WebAv<T: Transport = HttpTransport> {
    config: WebAvConfig,
    transport: T,
}

impl WebAv<HttpTransport> {
    /// Creates a client talking HTTPS to the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn new(config: WebAvConfig) -> WebAvResult<Self> {
        let transport = HttpTransport::new(config.base_url.clone(), config.request_timeout)?;
        Ok(Self { config, transport })
    }

    /// Creates a client from `WEBAV_API_KEY` and `WEBAV_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if no key is set in the environment.
    pub fn from_env() -> WebAvResult<Self> {
        Self::new(WebAvConfig::from_env()?)
    }

    /// Replaces the base URL. Trailing slashes collapse to exactly one.
    pub fn set_base_path(&mut self, base_url: &str) {
        self.config.base_url = normalize_base_url(base_url);
        self.transport.set_base_url(base_url);
    }
}

impl<T: Transport> WebAv<T> {
    /// Creates a client over a custom transport.
    ///
    /// The transport owns connection settings, so `config.base_url` and
    /// `config.request_timeout` have no effect here and are only reported
    /// back by [`config`](Self::config). Configure them on the transport
    /// itself, e.g. [`HttpTransport::with_client`].
    pub fn with_transport(config: WebAvConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WebAvConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replaces the API key.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.config = std::mem::take(&mut self.config).with_api_key(api_key);
    }

    /// Uploads a file for scanning.
    ///
    /// The input is normalized to a single buffer first; URL inputs are
    /// forwarded to [`scan_by_url`](Self::scan_by_url).
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no API key is configured.
    /// - `InvalidArgument` or `Stream` if the input cannot be normalized.
    /// - `FileTooLarge` if the service rejects the upload size.
    /// - `Transport` / `Decode` for other failures.
    pub async fn scan_by_upload(&self, input: FileInput, file_name: &str) -> WebAvResult<FileStatus> {
        let api_key = self.config.credential()?;

        let (data, file_name, media_type) = match normalize(input, file_name).await? {
            UploadPayload::RemoteUrl(url) => return self.scan_by_url(&url).await,
            UploadPayload::Multipart {
                data,
                file_name,
                media_type,
            } => (data, file_name, media_type),
        };

        tracing::info!(file_name = %file_name, bytes = data.len(), "Uploading file for scanning");

        let fields = vec![("file_name".to_string(), file_name.clone())];
        let request = ApiRequest::post(SCAN_PATH).with_body(RequestBody::Multipart {
            payload: UploadPayload::Multipart {
                data,
                file_name,
                media_type,
            },
            fields,
        });

        let status: FileStatus = self.send(request, api_key).await?;
        tracing::info!(job_id = %status.id, status = %status.virus_status, "File queued for scanning");
        Ok(status)
    }

    /// Asks the service to fetch and scan a file by URL.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no API key is configured.
    /// - `InvalidArgument` if the URL is empty.
    /// - `Transport` / `Decode` for request failures.
    pub async fn scan_by_url(&self, file_url: &str) -> WebAvResult<FileStatus> {
        let api_key = self.config.credential()?;
        if file_url.trim().is_empty() {
            return Err(WebAvError::invalid_argument("file URL must not be empty"));
        }

        tracing::info!(file_url, "Submitting URL for scanning");

        let request = ApiRequest::post(SCAN_PATH)
            .with_body(RequestBody::Json(serde_json::json!({ "file_url": file_url })));

        let status: FileStatus = self.send(request, api_key).await?;
        tracing::info!(job_id = %status.id, status = %status.virus_status, "URL queued for scanning");
        Ok(status)
    }

    /// Returns the current status of a job. Never cached.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no API key is configured.
    /// - `InvalidArgument` if the job id is empty.
    /// - `Transport` / `Decode` for request failures.
    pub async fn get_status(&self, job_id: &str) -> WebAvResult<FileStatus> {
        let api_key = self.config.credential()?;
        if job_id.is_empty() {
            return Err(WebAvError::invalid_argument("job id must not be empty"));
        }

        let path = format!("{STATUS_PATH}/{}", urlencoding::encode(job_id));
        self.send(ApiRequest::get(path), api_key).await
    }

    /// Lists recently scanned files, optionally for a given 1-based page.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no API key is configured.
    /// - `InvalidArgument` for page `0`.
    /// - `Transport` / `Decode` for request failures.
    pub async fn get_recent_statuses(&self, page: Option<u32>) -> WebAvResult<PaginatedFiles> {
        let api_key = self.config.credential()?;

        let mut request = ApiRequest::get(STATUS_PATH);
        if let Some(page) = page {
            if page == 0 {
                return Err(WebAvError::invalid_argument("page numbers start at 1"));
            }
            request = request.with_query("page", page.to_string());
        }

        self.send(request, api_key).await
    }

    /// Waits for a job to finish using the configured [`PollConfig`].
    ///
    /// # Errors
    ///
    /// - `Timeout` if the job is still pending after the configured timeout.
    /// - Any error from [`get_status`](Self::get_status).
    pub async fn wait_for(&self, job_id: &str) -> WebAvResult<FileStatus> {
        self.wait_for_with(job_id, self.config.poll).await
    }

    /// Waits for a job to finish with per-call timing.
    pub async fn wait_for_with(&self, job_id: &str, poll: PollConfig) -> WebAvResult<FileStatus> {
        self.wait_with_poller(job_id, &Poller::new(poll)).await
    }

    /// Waits for a job to finish using a caller-supplied poller and clock.
    pub async fn wait_with_poller<C: Clock>(
        &self,
        job_id: &str,
        poller: &Poller<C>,
    ) -> WebAvResult<FileStatus> {
        self.config.credential()?;
        poller.wait_for(job_id, || self.get_status(job_id)).await
    }

    /// Uploads a file and waits for its scan to finish.
    pub async fn scan_and_wait(&self, input: FileInput, file_name: &str) -> WebAvResult<FileStatus> {
        let queued = self.scan_by_upload(input, file_name).await?;
        if queued.is_terminal() {
            return Ok(queued);
        }
        self.wait_for(&queued.id).await
    }

    /// Attaches the credential, sends the request and decodes the response.
    async fn send<R: DeserializeOwned>(&self, request: ApiRequest, api_key: &str) -> WebAvResult<R> {
        let request = self.authorize(request, api_key);
        request.validate()?;

        let method = request.method.clone();
        let path = request.path.clone();
        tracing::debug!(%method, %path, "Calling WebAV");

        let response = self.transport.execute(request).await?;
        decode_response(&method, &path, response)
    }

    fn authorize(&self, request: ApiRequest, api_key: &str) -> ApiRequest {
        match self.config.credential_placement {
            CredentialPlacement::Header => request.with_header(API_KEY_HEADER, api_key),
            CredentialPlacement::Inline => {
                if request.method == Method::GET {
                    return request.with_query(API_KEY_FIELD, api_key);
                }

                let mut request = request;
                request.body = match request.body {
                    RequestBody::Empty => {
                        RequestBody::Json(serde_json::json!({ API_KEY_FIELD: api_key }))
                    }
                    RequestBody::Json(mut value) => {
                        if let Some(object) = value.as_object_mut() {
                            object.insert(API_KEY_FIELD.to_string(), api_key.into());
                        }
                        RequestBody::Json(value)
                    }
                    RequestBody::Multipart {
                        payload,
                        mut fields,
                    } => {
                        fields.push((API_KEY_FIELD.to_string(), api_key.to_string()));
                        RequestBody::Multipart { payload, fields }
                    }
                };
                request
            }
        }
    }
}

/// Maps the HTTP status and decodes a JSON body.
fn decode_response<R: DeserializeOwned>(
    method: &Method,
    path: &str,
    response: ApiResponse,
) -> WebAvResult<R> {
    if response.status == 413 {
        tracing::warn!(%method, path, "Upload rejected as too large");
        return Err(WebAvError::FileTooLarge {
            status: response.status,
        });
    }

    if !response.is_success() {
        let mut message = response.text();
        if message.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| message.is_char_boundary(*i))
                .unwrap_or(0);
            message.truncate(cut);
        }
        tracing::warn!(%method, path, status = response.status, "WebAV request failed");
        return Err(WebAvError::http_status(response.status, message));
    }

    serde_json::from_slice(&response.body).map_err(|e| WebAvError::decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockTransport;
    use crate::client::poller::TokioClock;
    use crate::core::{BoxedTransport, VirusStatus};
    use bytes::Bytes;
    use futures::stream;
    use serde_json::{json, Value};
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;

    fn status_json(id: &str, code: i64) -> Value {
        json!({
            "id": id,
            "virus_status": code,
            "virus_status_label": crate::core::get_status_label(code).unwrap(),
            "created_at": "2024-03-01T10:00:00.000000Z",
            "updated_at": "2024-03-01T10:00:01.000000Z"
        })
    }

    fn client(transport: MockTransport) -> WebAv<MockTransport> {
        WebAv::with_transport(WebAvConfig::new("test-key"), transport)
    }

    fn unauthenticated(transport: MockTransport) -> WebAv<MockTransport> {
        WebAv::with_transport(WebAvConfig::default(), transport)
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_calls() {
        let av = unauthenticated(MockTransport::new().with_default_json(200, status_json("a", 1)));

        let results = [
            av.scan_by_upload(FileInput::from_bytes(vec![1u8]), "a.bin").await.err(),
            av.scan_by_url("https://example.com/a").await.err(),
            av.get_status("a").await.err(),
            av.wait_for("a").await.err(),
        ];
        for err in results {
            assert!(matches!(err, Some(WebAvError::MissingCredential)));
        }
        assert!(matches!(
            av.get_recent_statuses(None).await,
            Err(WebAvError::MissingCredential)
        ));

        assert_eq!(av.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_boxed_transport() {
        let mock = Arc::new(MockTransport::new().with_json(200, status_json("a", 1)));
        let transport: BoxedTransport = Box::new(Arc::clone(&mock));
        let av = WebAv::with_transport(WebAvConfig::new("test-key"), transport);

        let status = av.get_status("a").await.unwrap();
        assert!(status.is_clean());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_leaves_stream_unread() {
        let av = unauthenticated(MockTransport::new());
        let chunks = stream::iter(vec![Err::<Vec<u8>, _>(io::Error::new(
            io::ErrorKind::Other,
            "must not be polled",
        ))]);

        let err = av
            .scan_by_upload(FileInput::from_stream(chunks), "a.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, WebAvError::MissingCredential));
    }

    #[tokio::test]
    async fn test_set_api_key_enables_calls() {
        let mut av = unauthenticated(MockTransport::new().with_json(200, status_json("a", 1)));
        av.set_api_key("late-key");

        let status = av.get_status("a").await.unwrap();
        assert!(status.is_clean());
        assert_eq!(av.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_scan_by_upload_builds_multipart() {
        let av = client(MockTransport::new().with_json(200, status_json("job-1", 0)));

        let status = av
            .scan_by_upload(FileInput::from_base64("SGVsbG8=").with_media_type("text/plain"), "hello.txt")
            .await
            .unwrap();
        assert_eq!(status.id, "job-1");
        assert!(status.is_pending());

        let request = av.transport().last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "webav/scan");
        match request.body {
            RequestBody::Multipart { payload, fields } => {
                assert_eq!(
                    payload,
                    UploadPayload::Multipart {
                        data: Bytes::from_static(b"Hello"),
                        file_name: "hello.txt".into(),
                        media_type: Some("text/plain".into()),
                    }
                );
                assert_eq!(
                    fields,
                    vec![
                        ("file_name".to_string(), "hello.txt".to_string()),
                        ("api_key".to_string(), "test-key".to_string()),
                    ]
                );
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scan_by_upload_with_stream() {
        let av = client(MockTransport::new().with_json(200, status_json("job-2", 0)));
        let chunks = stream::iter(vec![Ok::<_, io::Error>(vec![0x01u8, 0x02]), Ok(vec![0x03u8])]);

        av.scan_by_upload(FileInput::from_stream(chunks), "chunks.bin")
            .await
            .unwrap();

        let request = av.transport().last_request().unwrap();
        match request.body {
            RequestBody::Multipart { payload, .. } => assert_eq!(payload.len(), 3),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_failure_makes_no_calls() {
        let av = client(MockTransport::new().with_default_json(200, status_json("a", 0)));
        let chunks = stream::iter(vec![
            Ok(vec![1u8]),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")),
        ]);

        let err = av
            .scan_by_upload(FileInput::from_stream(chunks), "a.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, WebAvError::Stream(_)));
        assert_eq!(av.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_media_type_makes_no_calls() {
        let av = client(MockTransport::new().with_default_json(200, status_json("a", 0)));
        let err = av
            .scan_by_upload(FileInput::from_bytes(vec![1u8]).with_media_type("bogus"), "a.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, WebAvError::InvalidArgument { .. }));
        assert_eq!(av.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let av = client(MockTransport::new().with_response(ApiResponse::new(413, "<html>Too Large</html>")));
        let err = av
            .scan_by_upload(FileInput::from_bytes(vec![0u8; 1024]), "big.bin")
            .await
            .unwrap_err();

        assert!(matches!(err, WebAvError::FileTooLarge { status: 413 }));
        assert!(err.is_retryable_by_url());
    }

    #[tokio::test]
    async fn test_scan_by_url_sends_json() {
        let av = client(MockTransport::new().with_json(200, status_json("job-3", 0)));
        let status = av.scan_by_url("https://link.testfile.org/15MB").await.unwrap();
        assert_eq!(status.virus_status_label, "Pending");

        let request = av.transport().last_request().unwrap();
        assert_eq!(request.path, "webav/scan");
        assert_eq!(
            request.body,
            RequestBody::Json(json!({
                "file_url": "https://link.testfile.org/15MB",
                "api_key": "test-key"
            }))
        );
    }

    #[tokio::test]
    async fn test_url_input_routes_to_scan_by_url() {
        let av = client(MockTransport::new().with_json(200, status_json("job-4", 0)));
        av.scan_by_upload(FileInput::from_url("https://example.com/a.zip"), "ignored")
            .await
            .unwrap();

        let request = av.transport().last_request().unwrap();
        assert!(matches!(request.body, RequestBody::Json(_)));
    }

    #[tokio::test]
    async fn test_get_status_path_and_query() {
        let av = client(MockTransport::new().with_json(200, status_json("a b/c", 2)));
        let status = av.get_status("a b/c").await.unwrap();
        assert!(status.is_infected());

        let request = av.transport().last_request().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "webav/status/a%20b%2Fc");
        assert_eq!(request.query, vec![("api_key".to_string(), "test-key".to_string())]);
        assert_eq!(request.body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn test_header_placement() {
        let av = WebAv::with_transport(
            WebAvConfig::new("hdr-key").with_credential_placement(CredentialPlacement::Header),
            MockTransport::new().with_json(200, status_json("a", 1)),
        );
        av.get_status("a").await.unwrap();

        let request = av.transport().last_request().unwrap();
        assert!(request.query.is_empty());
        assert_eq!(request.headers, vec![("X-API-Key".to_string(), "hdr-key".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_arguments_rejected() {
        let av = client(MockTransport::new());
        assert!(matches!(
            av.get_status("").await,
            Err(WebAvError::InvalidArgument { .. })
        ));
        assert!(matches!(
            av.scan_by_url(" ").await,
            Err(WebAvError::InvalidArgument { .. })
        ));
        assert!(matches!(
            av.get_recent_statuses(Some(0)).await,
            Err(WebAvError::InvalidArgument { .. })
        ));
        assert_eq!(av.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_recent_statuses_empty_page() {
        let av = client(MockTransport::new().with_json(
            200,
            json!({
                "data": [],
                "last_page": 1,
                "per_page": 1,
                "current_page": 1,
                "total": 0
            }),
        ));

        let page = av.get_recent_statuses(None).await.unwrap();
        assert_eq!(
            page,
            PaginatedFiles {
                data: Vec::new(),
                current_page: 1,
                per_page: 1,
                last_page: 1,
                total: 0,
                from: None,
                to: None,
            }
        );
    }

    #[tokio::test]
    async fn test_recent_statuses_page_param() {
        let av = client(MockTransport::new().with_json(
            200,
            json!({
                "data": [status_json("x", 1), status_json("y", 4)],
                "last_page": 3,
                "per_page": 2,
                "current_page": 2,
                "total": 6,
                "from": 3,
                "to": 4
            }),
        ));

        let page = av.get_recent_statuses(Some(2)).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1].virus_status, VirusStatus::Skipped);
        assert_eq!(page.next_page(), Some(3));

        let request = av.transport().last_request().unwrap();
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("api_key".to_string(), "test-key".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_failure() {
        let av = client(MockTransport::new().with_response(ApiResponse::new(401, "Unauthenticated.")));
        let err = av.get_status("a").await.unwrap_err();
        match err {
            WebAvError::Transport { status, message } => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "Unauthenticated.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_long_error_body_is_truncated() {
        let body = "é".repeat(MAX_ERROR_BODY);
        let av = client(MockTransport::new().with_response(ApiResponse::new(500, body)));
        match av.get_status("a").await.unwrap_err() {
            WebAvError::Transport { message, .. } => assert!(message.len() <= MAX_ERROR_BODY),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        let av = client(MockTransport::new().with_response(ApiResponse::new(200, "<html></html>")));
        assert!(matches!(
            av.get_status("a").await,
            Err(WebAvError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_network_failure_propagates() {
        let av = client(MockTransport::new().with_failure("connection refused"));
        let err = av.get_status("a").await.unwrap_err();
        assert!(err.is_transport_failure());
        assert_eq!(av.transport().call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_pending_then_passed() {
        let av = client(
            MockTransport::new()
                .with_json(200, status_json("job", 0))
                .with_json(200, status_json("job", 1))
                .with_default_json(200, status_json("job", 2)),
        );

        let status = av.wait_for("job").await.unwrap();
        assert_eq!(status.virus_status, VirusStatus::Passed);
        assert_eq!(av.transport().call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out() {
        let av = client(MockTransport::new().with_default_json(200, status_json("job", 0)));

        let err = av
            .wait_for_with("job", PollConfig::from_secs_f64(0.2, 0.05))
            .await
            .unwrap_err();

        match err {
            WebAvError::Timeout { timeout, .. } => assert_eq!(timeout, Duration::from_millis(200)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(av.transport().call_count() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_with_custom_poller() {
        let av = client(
            MockTransport::new()
                .with_json(200, status_json("job", 0))
                .with_json(200, status_json("job", 0))
                .with_json(200, status_json("job", 3)),
        );
        let poller = Poller::with_clock(
            PollConfig::new().with_poll_interval(Duration::from_secs(1)),
            TokioClock,
        );

        let status = av.wait_with_poller("job", &poller).await.unwrap();
        assert_eq!(status.virus_status, VirusStatus::Unable);
        assert_eq!(av.transport().call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_and_wait() {
        let av = client(
            MockTransport::new()
                .with_json(200, status_json("job", 0))
                .with_json(200, status_json("job", 0))
                .with_json(200, status_json("job", 1)),
        );

        let status = av
            .scan_and_wait(FileInput::from_bytes(b"clean file".to_vec()), "clean.txt")
            .await
            .unwrap();
        assert!(status.is_clean());

        let requests = av.transport().requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].method, Method::POST);
        assert!(requests[1..].iter().all(|r| r.path == "webav/status/job"));
    }
}
