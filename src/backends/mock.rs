//! Mock transport for testing.
//!
//! `MockTransport` replays scripted responses in order, records every
//! request it receives and counts calls, so tests can assert exactly how
//! much network traffic an operation would have produced.

use crate::core::{ApiRequest, ApiResponse, Transport, WebAvError, WebAvResult};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A scripted reply.
#[derive(Debug, Clone)]
enum Reply {
    Response(ApiResponse),
    Failure(String),
}

impl Reply {
    fn into_result(self) -> WebAvResult<ApiResponse> {
        match self {
            Self::Response(response) => Ok(response),
            Self::Failure(message) => Err(WebAvError::transport(message)),
        }
    }
}

/// A transport that never touches the network.
///
/// # Examples
///
/// ```rust
/// use webav::backends::MockTransport;
/// use serde_json::json;
///
/// // Two scripted replies, then every further call gets the default.
/// let transport = MockTransport::new()
///     .with_json(200, json!({"id": "a", "virus_status": 0}))
///     .with_json(200, json!({"id": "a", "virus_status": 1}))
///     .with_default_status(404);
/// assert_eq!(transport.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Replies consumed in order.
    queue: Mutex<VecDeque<Reply>>,
    /// Reply used once the queue is empty.
    default_reply: Mutex<Option<Reply>>,
    /// Every request received, in order.
    requests: Mutex<Vec<ApiRequest>>,
    /// Counter for execute calls.
    call_count: AtomicU64,
}

impl MockTransport {
    /// Creates a mock with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw response.
    pub fn with_response(self, response: ApiResponse) -> Self {
        self.push_response(response);
        self
    }

    /// Queues a JSON response.
    pub fn with_json(self, status: u16, body: serde_json::Value) -> Self {
        self.push_response(ApiResponse::json(status, &body));
        self
    }

    /// Queues a network-layer failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        lock(&self.queue).push_back(Reply::Failure(message.into()));
        self
    }

    /// Sets the JSON response returned once the queue is exhausted.
    pub fn with_default_json(self, status: u16, body: serde_json::Value) -> Self {
        *lock(&self.default_reply) = Some(Reply::Response(ApiResponse::json(status, &body)));
        self
    }

    /// Sets an empty-bodied response returned once the queue is exhausted.
    pub fn with_default_status(self, status: u16) -> Self {
        *lock(&self.default_reply) = Some(Reply::Response(ApiResponse::new(status, "")));
        self
    }

    /// Queues a raw response (shared-reference version).
    pub fn push_response(&self, response: ApiResponse) {
        lock(&self.queue).push_back(Reply::Response(response));
    }

    /// Returns the number of requests executed.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Returns a copy of every request received.
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    /// Returns the most recent request, if any.
    pub fn last_request(&self) -> Option<ApiRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Returns the number of queued replies not yet consumed.
    pub fn pending_replies(&self) -> usize {
        lock(&self.queue).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> WebAvResult<ApiResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request);

        let scripted = lock(&self.queue).pop_front();
        let reply = match scripted {
            Some(reply) => reply,
            None => lock(&self.default_reply)
                .clone()
                .unwrap_or_else(|| Reply::Failure("mock transport has no scripted response".into())),
        };
        reply.into_result()
    }
}
