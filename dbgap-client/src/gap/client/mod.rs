mod search;
mod summary;

use crate::config::ClientConfig;
use crate::error::{GapError, Result};
use crate::rate_limit::RateLimiter;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

/// Client for the dbGaP (`db=gap`) E-utilities endpoints
#[derive(Clone)]
pub struct GapClient {
    client: Client,
    pub(crate) base_url: String,
    rate_limiter: RateLimiter,
    config: ClientConfig,
}

impl GapClient {
    /// Create a client with default configuration
    ///
    /// NCBI asks callers to identify themselves; prefer
    /// [`with_config`](Self::with_config) with an email set.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::new())
    }

    /// Create a client from a configuration
    ///
    /// # Example
    ///
    /// ```
    /// use dbgap_client::{ClientConfig, GapClient};
    ///
    /// let config = ClientConfig::new().with_email("researcher@university.edu");
    /// let client = GapClient::with_config(config).unwrap();
    /// ```
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.effective_user_agent())
            .timeout(config.timeout)
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        let rate_limiter = config.create_rate_limiter();
        let base_url = config.effective_base_url().to_string();

        Self {
            client,
            base_url,
            rate_limiter,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue a rate-limited GET with the identification parameters appended
    ///
    /// `params` are the endpoint-specific query pairs. Each call is a single
    /// attempt: the first transport or status failure is returned as-is.
    pub(crate) async fn make_request(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Response> {
        let url = self.build_url(endpoint, params);

        self.rate_limiter.acquire().await;
        debug!("Making API request to: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("NCBI rate limit exceeded");
            return Err(GapError::RateLimitExceeded);
        }

        if !status.is_success() {
            warn!("API request failed with status: {}", status);
            return Err(GapError::ApiError {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        Ok(response)
    }

    fn build_url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let api_params = self.config.build_api_params();

        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .chain(api_params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();

        format!("{}/{}?{}", self.base_url, endpoint, query.join("&"))
    }
}
