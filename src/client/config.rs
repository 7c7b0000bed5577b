//! Client configuration.

use crate::backends::http::{normalize_base_url, DEFAULT_REQUEST_TIMEOUT};
use crate::client::poller::PollConfig;
use crate::core::{WebAvError, WebAvResult};

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Service endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.webtender.host/api/";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "WEBAV_API_KEY";

/// Fallback variable for the API key, used when `WEBAV_API_KEY` is unset.
pub const FALLBACK_API_KEY_ENV: &str = "WEBTENDER_API_KEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "WEBAV_BASE_URL";

/// Header used when the key travels as a header.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Request field used when the key travels inline.
pub const API_KEY_FIELD: &str = "api_key";

/// Where the API key is attached to outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialPlacement {
    /// `api_key` query parameter on GET, `api_key` body field on POST.
    #[default]
    Inline,

    /// `X-API-Key` request header.
    Header,
}

/// Configuration for a [`WebAv`](crate::client::WebAv) client.
#[derive(Debug, Clone)]
pub struct WebAvConfig {
    /// API key (kept secret). Empty keys count as missing.
    pub api_key: Option<SecretString>,

    /// Base URL of the service, ending in exactly one `/`.
    pub base_url: String,

    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,

    /// How the API key is attached.
    pub credential_placement: CredentialPlacement,

    /// Default timing for `wait_for`.
    pub poll: PollConfig,
}

impl Default for WebAvConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            credential_placement: CredentialPlacement::default(),
            poll: PollConfig::default(),
        }
    }
}

impl WebAvConfig {
    /// Creates a configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    /// Reads `WEBAV_API_KEY` (falling back to `WEBTENDER_API_KEY`) and, if
    /// set, `WEBAV_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if neither key variable holds a value.
    pub fn from_env() -> WebAvResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> WebAvResult<Self> {
        let api_key = [API_KEY_ENV, FALLBACK_API_KEY_ENV]
            .into_iter()
            .filter_map(|name| lookup(name))
            .find(|key| !key.is_empty())
            .ok_or(WebAvError::MissingCredential)?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|url| !url.is_empty()) {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into().into_boxed_str()));
        self
    }

    /// Sets the base URL, normalizing trailing slashes to exactly one.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets where the API key is attached.
    pub fn with_credential_placement(mut self, placement: CredentialPlacement) -> Self {
        self.credential_placement = placement;
        self
    }

    /// Sets the default wait timing.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Returns `true` if a non-empty API key is configured.
    pub fn has_credential(&self) -> bool {
        self.credential().is_ok()
    }

    /// Returns the API key.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if no non-empty key is configured.
    pub(crate) fn credential(&self) -> WebAvResult<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.is_empty())
            .ok_or(WebAvError::MissingCredential)
    }
}
