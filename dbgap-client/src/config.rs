//! Client configuration for NCBI E-utilities access
//!
//! NCBI asks every E-utilities caller to identify itself with `tool` and
//! `email` parameters, and applies a stricter rate limit to callers without
//! an API key. [`ClientConfig`] collects those settings and derives the
//! effective values the client uses.

use std::time::Duration;

use crate::rate_limit::RateLimiter;

/// Default E-utilities endpoint
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Default `tool` parameter sent to NCBI
pub const DEFAULT_TOOL: &str = "dbgap-client";

/// ESummary refuses to return more than 500 records per request in JSON mode
pub const MAX_JSON_PAGE_SIZE: usize = 500;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`GapClient`](crate::GapClient)
///
/// # Example
///
/// ```
/// use dbgap_client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_email("researcher@university.edu")
///     .with_api_key("your_api_key_here");
///
/// assert_eq!(config.effective_rate_limit(), 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// NCBI API key; raises the rate limit to 10 requests/second
    pub api_key: Option<String>,
    /// Contact email sent with each request
    pub email: Option<String>,
    /// Tool name sent with each request
    pub tool: Option<String>,
    /// Override for the E-utilities endpoint (used by tests)
    pub base_url: Option<String>,
    /// Explicit requests per second, overriding the NCBI defaults
    pub rate_limit: Option<f64>,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Records per ESummary page
    pub page_size: Option<usize>,
    /// Custom User-Agent header
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            email: None,
            tool: None,
            base_url: None,
            rate_limit: None,
            timeout: DEFAULT_TIMEOUT,
            page_size: None,
            user_agent: None,
        }
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tool<S: Into<String>>(mut self, tool: S) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: f64) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_seconds(self, seconds: u64) -> Self {
        self.with_timeout(Duration::from_secs(seconds))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Requests per second: explicit value, else 10 with an API key, else 3
    pub fn effective_rate_limit(&self) -> f64 {
        match (self.rate_limit, &self.api_key) {
            (Some(rate), _) => rate,
            (None, Some(_)) => 10.0,
            (None, None) => 3.0,
        }
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("dbgap-client/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn effective_tool(&self) -> &str {
        self.tool.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    /// Page size clamped to `1..=MAX_JSON_PAGE_SIZE`
    pub fn effective_page_size(&self) -> usize {
        self.page_size
            .unwrap_or(MAX_JSON_PAGE_SIZE)
            .clamp(1, MAX_JSON_PAGE_SIZE)
    }

    /// Identification parameters appended to every E-utilities request
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(api_key) = &self.api_key {
            params.push(("api_key".to_string(), api_key.clone()));
        }

        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }

        params.push(("tool".to_string(), self.effective_tool().to_string()));

        params
    }

    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_rate_limit())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
